//! Engine configuration (weave.toml)
//!
//! ```toml
//! trace_invocations = true
//!
//! [naming]
//! namespace = "Weave"
//! suffix = "Proxy"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Environment override could not be parsed
    #[error("Invalid value for {var}: {value}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },
}

/// Naming scheme for synthesized types: `{namespace}.{Original}{suffix}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamingConfig {
    /// Namespace prefix (default: "Weave")
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Suffix appended to the original name (default: "Proxy")
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

fn default_namespace() -> String {
    "Weave".to_string()
}

fn default_suffix() -> String {
    "Proxy".to_string()
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            suffix: default_suffix(),
        }
    }
}

impl NamingConfig {
    /// Name given to the proxy of `original`
    pub fn proxy_name(&self, original: &str) -> String {
        if self.namespace.is_empty() {
            format!("{}{}", original, self.suffix)
        } else {
            format!("{}.{}{}", self.namespace, original, self.suffix)
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Synthesized type naming
    #[serde(default)]
    pub naming: NamingConfig,

    /// Emit a trace event for every intercepted invocation
    #[serde(default)]
    pub trace_invocations: bool,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Apply `WEAVE_NAMESPACE`, `WEAVE_SUFFIX` and `WEAVE_TRACE_INVOCATIONS`
    pub fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(self)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(ns) = lookup("WEAVE_NAMESPACE") {
            self.naming.namespace = ns;
        }
        if let Some(suffix) = lookup("WEAVE_SUFFIX") {
            self.naming.suffix = suffix;
        }
        if let Some(raw) = lookup("WEAVE_TRACE_INVOCATIONS") {
            self.trace_invocations = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        var: "WEAVE_TRACE_INVOCATIONS",
                        value: raw,
                    })
                }
            };
        }
        Ok(())
    }
}

impl FromStr for EngineConfig {
    type Err = ConfigError;

    /// Parse configuration from a TOML string
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: EngineConfig = toml::from_str(content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.naming.namespace, "Weave");
        assert_eq!(config.naming.suffix, "Proxy");
        assert!(!config.trace_invocations);
        assert_eq!(config.naming.proxy_name("Test"), "Weave.TestProxy");
    }

    #[test]
    fn test_parse_partial() {
        let config: EngineConfig = r#"
            [naming]
            suffix = "AOPClass"
            "#
        .parse()
        .unwrap();
        assert_eq!(config.naming.namespace, "Weave");
        assert_eq!(config.naming.proxy_name("Test"), "Weave.TestAOPClass");
    }

    #[test]
    fn test_empty_namespace() {
        let naming = NamingConfig {
            namespace: String::new(),
            suffix: "Proxy".into(),
        };
        assert_eq!(naming.proxy_name("Test"), "TestProxy");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "trace_invocations = true").unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert!(config.trace_invocations);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            "trace_invocations = \"maybe\"".parse::<EngineConfig>(),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let mut config = EngineConfig::default();
        config
            .apply_overrides(|var| match var {
                "WEAVE_NAMESPACE" => Some("Aop".into()),
                "WEAVE_TRACE_INVOCATIONS" => Some("on".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.naming.namespace, "Aop");
        assert!(config.trace_invocations);

        let err = config
            .apply_overrides(|var| (var == "WEAVE_TRACE_INVOCATIONS").then(|| "sometimes".into()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }
}
