//! # Docker Registry Module
//!
//! Holds the custom docker registry prefix that is prepended to every image
//! reference in generated files. The value travels inside
//! `GenerationContext` instead of living in process-wide state.
//!
//! ## Normalization Rules
//!
//! - absent or empty input means "use the default registry" and is stored
//!   as the empty string
//! - a value starting with `http` (any scheme) is rejected
//! - anything else is stored with exactly one trailing slash, so that
//!   `format!("{}image", registry)` is always a valid image reference
//!
//! ```text
//! None                      -> ""
//! "example.com"             -> "example.com/"
//! "example.com///"          -> "example.com/"
//! "http://example.com"      -> ValidationError
//! ```

use crate::config::ValidationError;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized docker registry prefix
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerRegistry(String);

impl DockerRegistry {
    /// Validate and normalize a user-supplied registry
    pub fn parse(registry: Option<&str>) -> Result<Self, ValidationError> {
        let registry = match registry.map(str::trim) {
            None | Some("") => return Ok(Self::default()),
            Some(value) => value,
        };

        if registry.starts_with("http") {
            return Err(ValidationError::RegistryScheme(registry.to_string()));
        }

        let normalized = format!("{}/", registry.trim_end_matches('/'));
        info!("Using custom docker registry: {}", normalized);
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when no custom registry is configured
    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }

    /// Prefix an image reference with the registry
    pub fn image(&self, image: &str) -> String {
        format!("{}{}", self.0, image)
    }
}

impl fmt::Display for DockerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_adds_trailing_slash() {
        let registry = DockerRegistry::parse(Some("example.com")).unwrap();
        assert_eq!(registry.as_str(), "example.com/");
        assert!(!registry.is_default());
    }

    #[test]
    fn test_registry_keeps_single_slash() {
        assert_eq!(DockerRegistry::parse(Some("example.com/")).unwrap().as_str(), "example.com/");
        assert_eq!(DockerRegistry::parse(Some("example.com///")).unwrap().as_str(), "example.com/");
        assert_eq!(
            DockerRegistry::parse(Some("registry.local:5000/team")).unwrap().as_str(),
            "registry.local:5000/team/"
        );
    }

    #[test]
    fn test_registry_rejects_scheme() {
        assert!(matches!(
            DockerRegistry::parse(Some("http://example.com")),
            Err(ValidationError::RegistryScheme(_))
        ));
        assert!(DockerRegistry::parse(Some("https://example.com")).is_err());
    }

    #[test]
    fn test_registry_absent_is_empty() {
        assert_eq!(DockerRegistry::parse(None).unwrap().as_str(), "");
        assert_eq!(DockerRegistry::parse(Some("")).unwrap().as_str(), "");
        assert!(DockerRegistry::parse(None).unwrap().is_default());
    }

    #[test]
    fn test_registry_image() {
        let registry = DockerRegistry::parse(Some("example.com")).unwrap();
        assert_eq!(registry.image("quorumengineering/quorum:2.6.0"), "example.com/quorumengineering/quorum:2.6.0");
        assert_eq!(DockerRegistry::default().image("busybox"), "busybox");
    }
}
