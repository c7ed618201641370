//! Liftoff Core - shared foundations for the decision task
//!
//! This crate provides error handling, configuration, the immutable run
//! context and the build-variant decoder used by the task graph engine.

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod variant;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{load_config, load_config_or_default, Config};
pub use context::{Priority, RunContext, RunContextBuilder};
pub use error::{ConfigError, ContextError, LiftoffError, Result, VariantError};
pub use variant::{camel_to_kebab, decode, Architecture, BuildKind, Variant};
