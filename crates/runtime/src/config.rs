use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gpu::LayerToggles;
use layers::{GeometryExtractor, StyleColor, StyleTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PROCEDURAL_KEYWORD: &str = "procedural";
pub const DEFAULT_MODEL_RESOLUTION: u32 = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("style {id:?}: expected [r, g, b] or \"procedural\", got {value:?}")]
    InvalidStyle { id: String, value: String },
}

/// A style entry as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleSpec {
    Rgb([f32; 3]),
    Keyword(String),
}

impl StyleSpec {
    pub fn to_color(&self, id: &str) -> Result<StyleColor, ConfigError> {
        match self {
            StyleSpec::Rgb(rgb) if rgb.iter().all(|c| (0.0..=1.0).contains(c)) => {
                Ok(StyleColor::Fixed(*rgb))
            }
            StyleSpec::Keyword(k) if k == PROCEDURAL_KEYWORD => Ok(StyleColor::Procedural),
            other => Err(ConfigError::InvalidStyle {
                id: id.to_string(),
                value: format!("{other:?}"),
            }),
        }
    }
}

/// Viewer settings read from JSON. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<PathBuf>,
    /// Multiplier on the base 32 x 16 sphere tessellation.
    pub model_resolution: u32,
    pub point_latitude_bias_deg: f64,
    /// Added to, or replacing, the built-in style table.
    pub styles: BTreeMap<String, StyleSpec>,
    pub layers: LayerToggles,
    pub frame_rate: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            document: None,
            model_resolution: DEFAULT_MODEL_RESOLUTION,
            point_latitude_bias_deg: 0.0,
            styles: BTreeMap::new(),
            layers: LayerToggles::default(),
            frame_rate: 60,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.style_table()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn style_table(&self) -> Result<StyleTable, ConfigError> {
        let mut table = StyleTable::builtin();
        for (id, spec) in &self.styles {
            table.insert(id.clone(), spec.to_color(id)?);
        }
        Ok(table)
    }

    pub fn extractor(&self) -> Result<GeometryExtractor, ConfigError> {
        Ok(GeometryExtractor::new(self.style_table()?)
            .with_point_latitude_bias(self.point_latitude_bias_deg))
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;

    use super::{ConfigError, StyleSpec, ViewerConfig};
    use layers::StyleColor;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ViewerConfig::from_json("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.model_resolution, 4);
        assert_eq!(config.frame_rate, 60);
        assert!(config.layers.show_orbits);
    }

    #[test]
    fn partial_layers_keep_other_toggles_on() {
        let config = ViewerConfig::from_json(r#"{"layers": {"enable_blending": false}}"#).unwrap();
        assert!(!config.layers.enable_blending);
        assert!(config.layers.show_earth);
    }

    #[test]
    fn style_overrides_round_trip_through_a_file() {
        let mut styles = BTreeMap::new();
        styles.insert("red_line".to_string(), StyleSpec::Rgb([0.5, 0.0, 0.0]));
        styles.insert("beacon".to_string(), StyleSpec::Keyword("procedural".to_string()));
        let config = ViewerConfig {
            model_resolution: 1,
            point_latitude_bias_deg: -45.0,
            styles,
            ..ViewerConfig::default()
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.json");
        fs::write(&path, config.to_json().unwrap()).unwrap();
        let loaded = ViewerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        let table = loaded.style_table().unwrap();
        assert_eq!(table.color("red_line"), [0.5, 0.0, 0.0]);
        assert_eq!(table.lookup("beacon"), Some(StyleColor::Procedural));
        assert_eq!(table.color("green_line"), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn rejects_unknown_style_keyword() {
        let err = ViewerConfig::from_json(r#"{"styles": {"x": "sparkly"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStyle { ref id, .. } if id == "x"));
    }

    #[test]
    fn rejects_out_of_range_channels() {
        let err = ViewerConfig::from_json(r#"{"styles": {"x": [2.0, 0.0, 0.0]}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStyle { .. }));
    }

    #[test]
    fn reports_missing_file_and_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ViewerConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));

        let bad = ViewerConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(bad, ConfigError::Parse(_)));
    }

    #[test]
    fn extractor_carries_bias() {
        let config = ViewerConfig {
            point_latitude_bias_deg: 3.5,
            ..ViewerConfig::default()
        };
        assert_eq!(config.extractor().unwrap().point_latitude_bias_deg(), 3.5);
    }
}
