use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{DocGraphError, Result};

/// Top-level configuration for graph building, reference detection,
/// resolution and quality scoring.
///
/// Every section falls back to its defaults when omitted from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocGraphConfig {
    /// Schema version of the configuration.
    pub version: u32,
    pub matcher: MatcherConfig,
    pub builder: BuilderConfig,
    pub resolution: ResolutionConfig,
    pub validation: ValidationThresholds,
    pub accuracy: AccuracyConfig,
}

impl Default for DocGraphConfig {
    fn default() -> Self {
        Self {
            version: 1,
            matcher: MatcherConfig::default(),
            builder: BuilderConfig::default(),
            resolution: ResolutionConfig::default(),
            validation: ValidationThresholds::default(),
            accuracy: AccuracyConfig::default(),
        }
    }
}

/// Reference matcher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Characters of surrounding text captured on each side of a match.
    pub context_window: usize,
    /// Input longer than this many bytes is truncated before matching.
    pub max_text_bytes: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            context_window: 50,
            max_text_bytes: 1_000_000,
        }
    }
}

/// Graph builder heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Height of ordinary body text.
    pub body_text_height: f64,
    /// Text taller than this is treated as a heading candidate.
    pub heading_height_threshold: f64,
    /// Fixed line height used for the line-start heuristic.
    pub line_height: f64,
    /// How close to a line boundary `y` must be to count as a line start.
    pub line_start_tolerance: f64,
    /// Headings longer than this many characters are rejected.
    pub max_heading_length: usize,
    /// Maximum number of paragraphs a heading is linked to.
    pub max_section_children: usize,
    pub follows_weight: f64,
    pub hierarchy_weight: f64,
    /// Labels longer than this are truncated with an ellipsis.
    pub max_label_length: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            body_text_height: 12.0,
            heading_height_threshold: 14.0,
            line_height: 20.0,
            line_start_tolerance: 2.0,
            max_heading_length: 100,
            max_section_children: 5,
            follows_weight: 0.8,
            hierarchy_weight: 0.9,
            max_label_length: 100,
        }
    }
}

/// Reference resolution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Resolutions below this confidence do not become `references` edges.
    pub min_edge_confidence: f64,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            min_edge_confidence: 0.5,
        }
    }
}

/// Thresholds that turn quality metrics into issues and recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationThresholds {
    pub min_precision: f64,
    pub min_recall: f64,
    pub min_average_confidence: f64,
    /// Fraction of detected references that should resolve.
    pub min_resolution_rate: f64,
    pub min_connectivity: f64,
    pub max_density: f64,
    /// Reference-edge density above which the overall score is penalised.
    pub density_penalty_threshold: f64,
    pub slow_build_ms: u64,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            min_precision: 0.6,
            min_recall: 0.7,
            min_average_confidence: 0.5,
            min_resolution_rate: 0.5,
            min_connectivity: 0.3,
            max_density: 2.0,
            density_penalty_threshold: 1.5,
            slow_build_ms: 1000,
        }
    }
}

/// Accuracy suite settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccuracyConfig {
    /// Minimum overall score for a test case to pass.
    pub min_score: f64,
}

impl Default for AccuracyConfig {
    fn default() -> Self {
        Self { min_score: 0.7 }
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("toml")
}

/// Loads the configuration from a JSON or TOML file (chosen by extension).
///
/// If the file does not exist, returns the default configuration.
pub fn load_config(path: &Path) -> Result<DocGraphConfig> {
    if !path.exists() {
        return Ok(DocGraphConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(|e| DocGraphError::Config {
        message: format!("failed to read config file '{}': {}", path.display(), e),
    })?;

    let parsed: std::result::Result<DocGraphConfig, String> = if is_toml(path) {
        toml::from_str(&contents).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&contents).map_err(|e| e.to_string())
    };

    parsed.map_err(|e| DocGraphError::Config {
        message: format!("failed to parse config file '{}': {}", path.display(), e),
    })
}

/// Saves the configuration using an atomic write.
///
/// Writes to a temporary file first and then renames it to the final location,
/// so a partial write never corrupts the configuration.
pub fn save_config(path: &Path, config: &DocGraphConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DocGraphError::Config {
            message: format!(
                "failed to create config directory '{}': {}",
                parent.display(),
                e
            ),
        })?;
    }

    let serialized = if is_toml(path) {
        toml::to_string_pretty(config).map_err(|e| e.to_string())
    } else {
        serde_json::to_string_pretty(config).map_err(|e| e.to_string())
    }
    .map_err(|e| DocGraphError::Config {
        message: format!("failed to serialize config: {}", e),
    })?;

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, &serialized).map_err(|e| DocGraphError::Config {
        message: format!(
            "failed to write temporary config file '{}': {}",
            tmp_path.display(),
            e
        ),
    })?;

    fs::rename(&tmp_path, path).map_err(|e| DocGraphError::Config {
        message: format!(
            "failed to rename temporary config file '{}' to '{}': {}",
            tmp_path.display(),
            path.display(),
            e
        ),
    })?;

    Ok(())
}
