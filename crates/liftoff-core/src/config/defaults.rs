//! Default configuration values

use super::types::Config;

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "liftoff.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "liftoff.yaml";

/// Directory searched in addition to each directory itself
pub const CONFIG_SUBDIR: &str = ".taskcluster";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".liftoff.toml",
        ".liftoff.yaml",
    ]
}

/// Generate default configuration TOML
pub fn default_config_toml() -> String {
    toml::to_string_pretty(&Config::default()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_toml_round_trips() {
        let rendered = default_config_toml();
        assert!(rendered.contains("[project]"));

        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.project.name, "fenix");
        assert_eq!(parsed.queue.timeout_secs, 60);
    }
}
