//! Exit codes for the CLI

use liftoff_core::{ConfigError, ContextError, LiftoffError, VariantError};
use liftoff_queue::QueueError;
use liftoff_tasks::TaskError;

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Configuration or run-parameter error
pub const CONFIG_ERROR: i32 = 2;

/// Queue lookup or submission error
pub const QUEUE_ERROR: i32 = 3;

/// Variant could not be decoded or classified
pub const UNSUPPORTED_VARIANT: i32 = 4;

/// Map an error onto an exit code by the first recognised cause
pub fn for_error(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        let code = if let Some(e) = cause.downcast_ref::<TaskError>() {
            task_code(e)
        } else if let Some(e) = cause.downcast_ref::<LiftoffError>() {
            core_code(e)
        } else if cause.is::<VariantError>() {
            Some(UNSUPPORTED_VARIANT)
        } else if cause.is::<ConfigError>() || cause.is::<ContextError>() {
            Some(CONFIG_ERROR)
        } else if cause.is::<QueueError>() {
            Some(QUEUE_ERROR)
        } else {
            None
        };

        if let Some(code) = code {
            return code;
        }
    }
    ERROR
}

fn core_code(err: &LiftoffError) -> Option<i32> {
    match err {
        LiftoffError::Variant(_) => Some(UNSUPPORTED_VARIANT),
        LiftoffError::Config(_) | LiftoffError::Context(_) => Some(CONFIG_ERROR),
        _ => None,
    }
}

fn task_code(err: &TaskError) -> Option<i32> {
    match err {
        TaskError::Variant(_) => Some(UNSUPPORTED_VARIANT),
        TaskError::Queue(_)
        | TaskError::QueueSubmission { .. }
        | TaskError::HarnessRevisionMissing(_) => Some(QUEUE_ERROR),
        TaskError::HarnessRequired => Some(CONFIG_ERROR),
        TaskError::Core(inner) => core_code(inner),
        TaskError::Graph(_) | TaskError::Io(_) | TaskError::Json(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_errors_map_to_unsupported_variant() {
        let err: anyhow::Error = TaskError::from(VariantError::UnsupportedArchitecture(
            "mipsDebug".to_string(),
        ))
        .into();
        assert_eq!(for_error(&err), UNSUPPORTED_VARIANT);
    }

    #[test]
    fn test_submission_errors_map_to_queue_error() {
        let err: anyhow::Error = TaskError::QueueSubmission {
            task_id: "a".to_string(),
            source: QueueError::TaskNotFound("a".to_string()),
        }
        .into();
        assert_eq!(for_error(&err), QUEUE_ERROR);
    }

    #[test]
    fn test_context_errors_map_to_config_error() {
        let err: anyhow::Error = ContextError::InvalidTrustLevel(9).into();
        assert_eq!(for_error(&err), CONFIG_ERROR);

        let err: anyhow::Error = LiftoffError::from(ConfigError::InvalidValue {
            field: "project.name".to_string(),
            message: "empty".to_string(),
        })
        .into();
        assert_eq!(for_error(&err), CONFIG_ERROR);
    }

    #[test]
    fn test_other_errors_are_general() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(for_error(&err), ERROR);
    }
}
