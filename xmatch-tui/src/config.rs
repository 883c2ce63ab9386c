//! Configuration loading for the XMATCH operator interface.
//!
//! One TOML file describes every field (its map and catalogue paths), the
//! catalogue column bindings, default cutout radii, and the start row.
//! All fields are required; `validate()` rejects anything the run cannot
//! work with.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use xmatch_storage::ColumnBindings;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Per-field file paths, keyed by field name (e.g. "cdfs").
    pub fields: BTreeMap<String, FieldConfig>,
    pub columns: ColumnConfig,
    pub cutout: CutoutConfig,
    /// Row index the run starts from (manual inspection aid).
    pub start_index: usize,
    /// Root under which output/ (or demo_output/) trees are created.
    pub output_root: PathBuf,
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub radio_continuum: PathBuf,
    pub radio_rms: PathBuf,
    pub infrared_mosaic: PathBuf,
    pub radio_catalogue: PathBuf,
    pub infrared_catalogue: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnConfig {
    pub radio_id: String,
    pub radio_ra: String,
    pub radio_dec: String,
    pub infrared_id: String,
    pub infrared_ra: String,
    pub infrared_dec: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CutoutConfig {
    pub infrared_radius_px: u32,
    pub radio_radius_px: u32,
}

/// Preferred screen position of the identification window.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowConfig {
    pub horizontal: i32,
    pub vertical: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or XMATCH_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("Unknown field {name:?}; configured fields: {known:?}")]
    UnknownField { name: String, known: Vec<String> },
}

impl AppConfig {
    pub fn load(override_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = override_path
            .map(Path::to_path_buf)
            .or_else(config_path_from_env)
            .ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fields.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "fields",
                reason: "at least one field must be configured".to_string(),
            });
        }
        for (name, field) in &self.fields {
            for (label, path) in [
                ("radio_continuum", &field.radio_continuum),
                ("radio_rms", &field.radio_rms),
                ("infrared_mosaic", &field.infrared_mosaic),
                ("radio_catalogue", &field.radio_catalogue),
                ("infrared_catalogue", &field.infrared_catalogue),
            ] {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "fields",
                        reason: format!("{name}.{label} must not be empty"),
                    });
                }
            }
        }
        for (label, value) in [
            ("columns.radio_id", &self.columns.radio_id),
            ("columns.radio_ra", &self.columns.radio_ra),
            ("columns.radio_dec", &self.columns.radio_dec),
            ("columns.infrared_id", &self.columns.infrared_id),
            ("columns.infrared_ra", &self.columns.infrared_ra),
            ("columns.infrared_dec", &self.columns.infrared_dec),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "columns",
                    reason: format!("{label} must not be empty"),
                });
            }
        }
        if self.cutout.infrared_radius_px == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cutout.infrared_radius_px",
                reason: "must be > 0".to_string(),
            });
        }
        if self.cutout.radio_radius_px == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cutout.radio_radius_px",
                reason: "must be > 0".to_string(),
            });
        }
        if self.output_root.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output_root",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Result<&FieldConfig, ConfigError> {
        self.fields
            .get(name)
            .ok_or_else(|| ConfigError::UnknownField {
                name: name.to_string(),
                known: self.fields.keys().cloned().collect(),
            })
    }

    pub fn radio_bindings(&self) -> ColumnBindings {
        ColumnBindings {
            id: self.columns.radio_id.clone(),
            ra: self.columns.radio_ra.clone(),
            dec: self.columns.radio_dec.clone(),
        }
    }

    pub fn infrared_bindings(&self) -> ColumnBindings {
        ColumnBindings {
            id: self.columns.infrared_id.clone(),
            ra: self.columns.infrared_ra.clone(),
            dec: self.columns.infrared_dec.clone(),
        }
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("XMATCH_CONFIG").ok().map(PathBuf::from)
}

// ============================================================================
// TESTS
// ============================================================================
