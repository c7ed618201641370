//! Queue service clients for Liftoff
//!
//! The build-orchestration queue is an external collaborator. This crate
//! defines the [`QueueService`] seam the submitter talks to, plus two
//! implementations:
//!
//! - [`HttpQueue`]: the REST API, reached through the worker proxy
//! - [`InMemoryQueue`]: a recording stand-in used for dry runs and tests

pub mod error;
pub mod http;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::QueueError;
pub use http::{HttpQueue, HttpQueueConfig};
pub use memory::InMemoryQueue;
pub use traits::QueueService;
pub use types::{IndexedTask, QueueCall};
