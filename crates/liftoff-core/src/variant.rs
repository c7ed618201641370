//! Build variant decoding
//!
//! A variant name such as `aarch64NightlyRelease` encodes the target
//! architecture followed by the build type. Decoding is a pure prefix match
//! against the supported architectures, checked in a fixed priority order.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::VariantError;

/// Target CPU architecture of an APK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// 64-bit ARM
    Aarch64,
    /// 32-bit ARM
    Arm,
    /// 32-bit Intel
    X86,
}

impl Architecture {
    /// Supported architectures in prefix-matching priority order
    pub const ALL: [Architecture; 3] = [Architecture::Aarch64, Architecture::Arm, Architecture::X86];

    /// Token used in variant names and artifact paths
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Aarch64 => "aarch64",
            Architecture::Arm => "arm",
            Architecture::X86 => "x86",
        }
    }

    /// Platform name shown on the reporting dashboard
    pub fn platform(&self) -> &'static str {
        match self {
            Architecture::Aarch64 => "android-aarch64",
            Architecture::Arm => "android-arm",
            Architecture::X86 => "android-x86",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = VariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Architecture::ALL
            .into_iter()
            .find(|arch| arch.as_str() == s)
            .ok_or_else(|| VariantError::UnsupportedArchitecture(s.to_string()))
    }
}

/// Classification of a build type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildKind {
    Debug,
    Nightly,
    Beta,
    Release,
    Performance,
}

impl BuildKind {
    /// Classify a decoded build type, `None` for unmapped build types
    pub fn classify(build_type: &str) -> Option<Self> {
        match build_type {
            "debug" => Some(BuildKind::Debug),
            "nightly" | "nightlyRelease" => Some(BuildKind::Nightly),
            "beta" => Some(BuildKind::Beta),
            "release" | "production" => Some(BuildKind::Release),
            "raptor" | "performanceTest" => Some(BuildKind::Performance),
            _ => None,
        }
    }

    /// Group symbol used on the reporting dashboard
    pub fn group_symbol(&self) -> &'static str {
        match self {
            BuildKind::Debug => "debug",
            BuildKind::Nightly => "nightly",
            BuildKind::Beta => "beta",
            BuildKind::Release => "release",
            BuildKind::Performance => "performance",
        }
    }

    /// Dashboard collection (`debug` or `opt`)
    pub fn collection(&self) -> &'static str {
        match self {
            BuildKind::Debug => "debug",
            _ => "opt",
        }
    }
}

/// A decoded build variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Original variant name (e.g. `aarch64NightlyRelease`)
    pub name: String,
    /// Target architecture
    pub architecture: Architecture,
    /// Build type with its first character lower-cased (e.g. `nightlyRelease`)
    pub build_type: String,
}

impl Variant {
    /// Decode a variant name into architecture and build type
    pub fn decode(name: &str) -> Result<Self, VariantError> {
        let (architecture, build_type) = decode(name)?;
        Ok(Self {
            name: name.to_string(),
            architecture,
            build_type,
        })
    }

    /// Build a variant from its parts
    pub fn from_parts(architecture: Architecture, build_type: &str) -> Self {
        let build_type = lower_first(build_type);
        Self {
            name: format!("{}{}", architecture.as_str(), capitalize(&build_type)),
            architecture,
            build_type,
        }
    }

    /// Classify the build type
    pub fn kind(&self) -> Result<BuildKind, VariantError> {
        BuildKind::classify(&self.build_type).ok_or_else(|| VariantError::UnsupportedBuildType {
            variant: self.name.clone(),
            build_type: self.build_type.clone(),
        })
    }

    /// Variant name as it appears in gradle task names (`assembleAarch64Debug`)
    pub fn gradle_name(&self) -> String {
        capitalize(&self.name)
    }

    /// Kebab-case label (`aarch64-nightly-release`)
    pub fn label(&self) -> String {
        camel_to_kebab(&self.name)
    }

    /// Path of the unsigned APK this variant produces, relative to `apk_root`
    pub fn apk_path(&self, apk_root: &str) -> String {
        format!(
            "{}/{}/{}/app-{}-{}-unsigned.apk",
            apk_root.trim_end_matches('/'),
            self.architecture,
            self.build_type,
            self.architecture,
            self.build_type
        )
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Split a variant name into its architecture and build type.
///
/// The architecture is the first supported token the name starts with; the
/// build type is the remainder with its first character lower-cased.
pub fn decode(variant: &str) -> Result<(Architecture, String), VariantError> {
    let architecture = Architecture::ALL
        .into_iter()
        .find(|arch| variant.starts_with(arch.as_str()))
        .ok_or_else(|| VariantError::UnsupportedArchitecture(variant.to_string()))?;

    let remainder = &variant[architecture.as_str().len()..];
    Ok((architecture, lower_first(remainder)))
}

/// Convert a camelCase identifier into kebab-case
pub fn camel_to_kebab(s: &str) -> String {
    static WORDS: OnceLock<Regex> = OnceLock::new();
    static BOUNDARIES: OnceLock<Regex> = OnceLock::new();

    let words = WORDS.get_or_init(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("valid regex"));
    let boundaries = BOUNDARIES.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));

    let first_pass = words.replace_all(s, "${1}-${2}");
    boundaries
        .replace_all(&first_pass, "${1}-${2}")
        .to_lowercase()
}

/// Upper-case the first character
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_nightly_release() {
        let (arch, build_type) = decode("aarch64NightlyRelease").unwrap();
        assert_eq!(arch, Architecture::Aarch64);
        assert_eq!(build_type, "nightlyRelease");
    }

    #[test]
    fn test_decode_x86_debug() {
        assert_eq!(
            decode("x86Debug").unwrap(),
            (Architecture::X86, "debug".to_string())
        );
    }

    #[test]
    fn test_decode_unknown_architecture() {
        assert_eq!(
            decode("unknownDebug"),
            Err(VariantError::UnsupportedArchitecture("unknownDebug".to_string()))
        );
    }

    #[test]
    fn test_decode_all_architectures() {
        for arch in Architecture::ALL {
            for build_type in ["debug", "nightly", "raptor", "nightlyRelease"] {
                let name = format!("{}{}", arch, capitalize(build_type));
                assert_eq!(decode(&name).unwrap(), (arch, build_type.to_string()));
            }
        }
    }

    #[test]
    fn test_decode_bare_architecture() {
        assert_eq!(decode("arm").unwrap(), (Architecture::Arm, String::new()));
    }

    #[test]
    fn test_variant_kind() {
        assert_eq!(
            Variant::decode("armNightly").unwrap().kind().unwrap(),
            BuildKind::Nightly
        );
        assert_eq!(
            Variant::decode("x86Debug").unwrap().kind().unwrap(),
            BuildKind::Debug
        );

        let err = Variant::decode("x86Canary").unwrap().kind().unwrap_err();
        assert!(matches!(err, VariantError::UnsupportedBuildType { .. }));
    }

    #[test]
    fn test_variant_from_parts() {
        let variant = Variant::from_parts(Architecture::Arm, "Raptor");
        assert_eq!(variant.name, "armRaptor");
        assert_eq!(variant.build_type, "raptor");
        assert_eq!(variant.gradle_name(), "ArmRaptor");
    }

    #[test]
    fn test_apk_path() {
        let variant = Variant::decode("aarch64Nightly").unwrap();
        assert_eq!(
            variant.apk_path("/opt/fenix/app/build/outputs/apk/"),
            "/opt/fenix/app/build/outputs/apk/aarch64/nightly/app-aarch64-nightly-unsigned.apk"
        );
    }

    #[test]
    fn test_camel_to_kebab() {
        assert_eq!(camel_to_kebab("aarch64NightlyRelease"), "aarch64-nightly-release");
        assert_eq!(camel_to_kebab("x86Debug"), "x86-debug");
        assert_eq!(camel_to_kebab("armHTTPServer"), "arm-http-server");
    }

    #[test]
    fn test_architecture_from_str() {
        assert_eq!("arm".parse::<Architecture>().unwrap(), Architecture::Arm);
        assert!("mips".parse::<Architecture>().is_err());
    }
}
