use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_DATA_PATH: &str = "Marine Pollution data.xlsx";
pub const DEFAULT_SHEET: &str = "ENV_Marine_Pollution_Obs_data_v";

// ---------------------------------------------------------------------------
// Top-level configuration
// ---------------------------------------------------------------------------

/// Dashboard configuration, read from an optional JSON file.
///
/// Every field has a built-in default, so `{}` is a valid file and a partial
/// file only overrides what it names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub source: SourceConfig,
    pub normalization: NormalizationRules,
    pub display: DisplayConfig,
}

impl DashboardConfig {
    /// Read and parse a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Where the incident spreadsheet lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub path: PathBuf,
    /// Worksheet name; ignored for CSV, JSON and Parquet sources.
    pub sheet: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATA_PATH),
            sheet: DEFAULT_SHEET.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization rules
// ---------------------------------------------------------------------------

/// Tables driving `pollution_type` normalization. Compiled into a
/// [`Normalizer`](crate::data::normalize::Normalizer) before use.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizationRules {
    /// Values meaning "no information", compared after trim + case-fold.
    pub noise_tokens: BTreeSet<String>,
    /// Source spelling → canonical category, compared after trim + case-fold.
    pub synonyms: BTreeMap<String, String>,
    /// Sentinel for undeterminable pollution types, rendered verbatim.
    pub unknown_label: String,
    /// Sentinel used when the source has no `pollution_type` column at all.
    pub missing_column_label: String,
    /// Columns whose name starts with this prefix are dropped on load.
    pub note_prefix: String,
}

impl Default for NormalizationRules {
    fn default() -> Self {
        let noise_tokens = ["", "-", "0", "null", "n/a", "no data", "nan"]
            .into_iter()
            .map(String::from)
            .collect();
        let synonyms = [
            ("oil spill", "tumpahan minyak"),
            ("oil spills", "tumpahan minyak"),
            ("waste dumped overboard", "limbah dibuang ke laut"),
            ("plastic waste", "limbah plastik"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            noise_tokens,
            synonyms,
            unknown_label: "Unknown".to_string(),
            missing_column_label: "Unknown (missing column)".to_string(),
            note_prefix: "Note".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Display settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// How many categories the pollution-type ranking keeps.
    pub top_n: usize,
    /// Height of the incident table in the UI, in points.
    pub table_height: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            table_height: 300.0,
        }
    }
}
