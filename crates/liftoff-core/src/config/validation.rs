//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::variant::Variant;

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_project(config)?;
    validate_secrets(config)?;
    validate_publish(config)?;
    validate_pipeline(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> crate::error::LiftoffError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
    .into()
}

fn validate_project(config: &Config) -> Result<()> {
    let project = &config.project;

    if project.name.is_empty() {
        return Err(invalid("project.name", "project name cannot be empty"));
    }

    if project.image.is_empty() {
        return Err(invalid("project.image", "docker image cannot be empty"));
    }

    if project.max_run_time == 0 {
        return Err(invalid("project.max_run_time", "must be greater than zero"));
    }

    if project.perf_max_run_time == 0 {
        return Err(invalid("project.perf_max_run_time", "must be greater than zero"));
    }

    Ok(())
}

fn validate_secrets(config: &Config) -> Result<()> {
    for (i, secret) in config.effective_secrets().iter().enumerate() {
        if secret.name.is_empty() || secret.key.is_empty() || secret.target.is_empty() {
            return Err(invalid(
                format!("secrets[{}]", i),
                "name, key and target are required",
            ));
        }
    }

    Ok(())
}

fn validate_publish(config: &Config) -> Result<()> {
    if config.publish.enabled && config.publish.track.is_empty() {
        return Err(invalid("publish.track", "track cannot be empty"));
    }

    Ok(())
}

fn validate_pipeline(config: &Config) -> Result<()> {
    let pipeline = &config.pipeline;

    if pipeline.architectures.is_empty() {
        return Err(invalid(
            "pipeline.architectures",
            "at least one architecture is required",
        ));
    }

    if pipeline.build_type.is_empty() {
        return Err(invalid("pipeline.build_type", "build type cannot be empty"));
    }

    let mut variants = vec![(
        "pipeline.check_variant".to_string(),
        pipeline.check_variant.as_str(),
    )];
    variants.extend(
        pipeline
            .extra_variants
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("pipeline.extra_variants[{}]", i), v.as_str())),
    );

    for (field, name) in variants {
        let variant = Variant::decode(name).map_err(|e| invalid(field.clone(), e.to_string()))?;
        variant.kind().map_err(|e| invalid(field, e.to_string()))?;
    }

    for (i, test) in pipeline.performance_tests.iter().enumerate() {
        if test.test.is_empty() || test.symbol.is_empty() {
            return Err(invalid(
                format!("pipeline.performance_tests[{}]", i),
                "test name and symbol are required",
            ));
        }
        if !pipeline.architectures.contains(&test.architecture) {
            return Err(invalid(
                format!("pipeline.performance_tests[{}].architecture", i),
                format!("{} is not built by the release build", test.architecture),
            ));
        }
    }

    if !pipeline.performance_tests.is_empty() && pipeline.harness_index_path.is_empty() {
        return Err(invalid(
            "pipeline.harness_index_path",
            "required when performance tests are configured",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PerformanceTestConfig;
    use crate::variant::Architecture;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_project_name() {
        let mut config = Config::default();
        config.project.name = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_unknown_check_variant() {
        let mut config = Config::default();
        config.pipeline.check_variant = "mipsDebug".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("pipeline.check_variant"));
    }

    #[test]
    fn test_validate_unmapped_extra_variant() {
        let mut config = Config::default();
        config.pipeline.extra_variants = vec!["armCanary".to_string()];
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("pipeline.extra_variants[0]"));
    }

    #[test]
    fn test_validate_no_architectures() {
        let mut config = Config::default();
        config.pipeline.architectures.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_performance_test_requires_symbol() {
        let mut config = Config::default();
        config.pipeline.performance_tests.push(PerformanceTestConfig {
            test: "raptor-speedometer".to_string(),
            architecture: Architecture::Arm,
            symbol: String::new(),
            force_64bit: false,
            extra_options: Vec::new(),
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_performance_test_architecture_must_be_built() {
        let mut config = Config::default();
        config.pipeline.architectures = vec![Architecture::Aarch64];
        config.pipeline.performance_tests.push(PerformanceTestConfig {
            test: "raptor-speedometer".to_string(),
            architecture: Architecture::Arm,
            symbol: "sp".to_string(),
            force_64bit: false,
            extra_options: Vec::new(),
        });
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("performance_tests[0].architecture"));
    }
}
