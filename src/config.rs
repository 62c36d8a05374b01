use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cache::DEFAULT_CAPACITY;
use crate::conflict::ConflictPolicy;
use crate::errors::{AnalyzerError, Result};
use crate::fuzzy::DEFAULT_THRESHOLD;
use crate::resolver::{default_exemptions, ResolutionExemption};

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Variant separator
    pub separator: String,

    /// Which diagnostics are produced
    pub diagnostics: DiagnosticOptions,

    /// Capacity of the resolver caches
    pub cache_capacity: usize,

    /// Minimum fuzzy score for a suggestion, in `[0, 1]`
    pub fuzzy_threshold: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            separator: ":".to_string(),
            diagnostics: DiagnosticOptions::default(),
            cache_capacity: DEFAULT_CAPACITY,
            fuzzy_threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Diagnostic switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticOptions {
    pub conflict: ConflictPolicy,

    /// Report variants or groups with nothing after them
    pub empty_group: bool,

    /// Report stray separators and important markers
    pub empty_class: bool,

    /// Report leaves the design system cannot resolve
    pub report_unresolved: bool,

    /// Unresolved class names never reported
    pub exemptions: Vec<ResolutionExemption>,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self {
            conflict: ConflictPolicy::Strict,
            empty_group: true,
            empty_class: true,
            report_unresolved: false,
            exemptions: default_exemptions(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AnalyzerError::ConfigError {
                message: format!("Failed to read config file {}: {}", path.display(), e),
            })?;

        serde_yaml::from_str(&content)
            .map_err(|e| AnalyzerError::ConfigError {
                message: format!("Failed to parse YAML config: {}", e),
            })
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AnalyzerError::ConfigError {
                message: format!("Failed to read config file {}: {}", path.display(), e),
            })?;

        serde_json::from_str(&content)
            .map_err(|e| AnalyzerError::ConfigError {
                message: format!("Failed to parse JSON config: {}", e),
            })
    }

    /// Load configuration from a file (auto-detect format)
    pub fn from_file(path: &Path) -> Result<Self> {
        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path)?,
            Some("json") => Self::from_json_file(path)?,
            _ => {
                return Err(AnalyzerError::ConfigError {
                    message: format!(
                        "Unsupported config file format: {}. Use .yaml, .yml, or .json",
                        path.display()
                    ),
                })
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.separator.is_empty() {
            return Err(AnalyzerError::ConfigError {
                message: "separator must not be empty".to_string(),
            });
        }
        if self.separator.chars().any(|c| c.is_whitespace() || "[]()!".contains(c)) {
            return Err(AnalyzerError::ConfigError {
                message: format!("separator {:?} collides with expression syntax", self.separator),
            });
        }
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(AnalyzerError::ConfigError {
                message: format!("fuzzy_threshold must be within [0, 1], got {}", self.fuzzy_threshold),
            });
        }
        if self.cache_capacity == 0 {
            return Err(AnalyzerError::ConfigError {
                message: "cache_capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.separator, ":");
        assert_eq!(config.diagnostics.conflict, ConflictPolicy::Strict);
        assert!(!config.diagnostics.report_unresolved);
        assert_eq!(config.diagnostics.exemptions.len(), 2);
        assert_eq!(config.cache_capacity, 16000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_partial_config() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "separator: \"_\"\ndiagnostics:\n  conflict: loose\n  empty_class: false").unwrap();
        let config = AnalyzerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.separator, "_");
        assert_eq!(config.diagnostics.conflict, ConflictPolicy::Loose);
        assert!(!config.diagnostics.empty_class);
        assert!(config.diagnostics.empty_group);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = Builder::new().suffix(".toml").tempfile().unwrap();
        let err = AnalyzerConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported config file format"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "fuzzy_threshold": 1.5 }}"#).unwrap();
        assert!(AnalyzerConfig::from_file(file.path()).is_err());

        let config = AnalyzerConfig {
            separator: " ".to_string(),
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
