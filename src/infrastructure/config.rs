use crate::application::metric_repository::FieldType;
use serde::Deserialize;
use std::time::Duration;

const ENV_PREFIX: &str = "MTR";

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxConfig {
    pub influx: InfluxSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxSettings {
    pub host: String,
    pub token: String,
    pub database: String,
    pub retention_policy: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlotsConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub query: QuerySettings,
    /// Colours handed out in turn to series without a fixed colour.
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
    #[serde(default)]
    pub catalog: FieldCatalog,
}

impl Default for PlotsConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            query: QuerySettings::default(),
            palette: default_palette(),
            catalog: FieldCatalog::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuerySettings {
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

impl QuerySettings {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline_secs(),
        }
    }
}

/// Field device metadata that does not live in the time-series store.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FieldCatalog {
    #[serde(default)]
    pub types: Vec<FieldTypeConfig>,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
    #[serde(default)]
    pub thresholds: Vec<ThresholdConfig>,
    #[serde(default)]
    pub tags: Vec<TagConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FieldTypeConfig {
    pub type_id: String,
    pub display: String,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    pub device_id: String,
    pub model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThresholdConfig {
    pub device_id: String,
    pub type_id: String,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TagConfig {
    pub device_id: String,
    pub type_id: String,
    pub tags: Vec<String>,
}

impl FieldCatalog {
    pub fn field_type(&self, type_id: &str) -> Option<FieldType> {
        self.types
            .iter()
            .find(|t| t.type_id == type_id)
            .map(|t| FieldType {
                type_id: t.type_id.clone(),
                display: t.display.clone(),
                scale: t.scale,
            })
    }

    pub fn device_model(&self, device_id: &str) -> Option<String> {
        self.devices
            .iter()
            .find(|d| d.device_id == device_id)
            .map(|d| d.model.clone())
    }

    pub fn threshold(&self, device_id: &str, type_id: &str) -> Option<(f64, f64)> {
        self.thresholds
            .iter()
            .find(|t| t.device_id == device_id && t.type_id == type_id)
            .map(|t| (t.lower, t.upper))
    }

    pub fn tags(&self, device_id: &str, type_id: &str) -> Vec<String> {
        let mut tags: Vec<String> = self
            .tags
            .iter()
            .filter(|t| t.device_id == device_id && t.type_id == type_id)
            .flat_map(|t| t.tags.iter().cloned())
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_deadline_secs() -> u64 {
    20
}

fn default_scale() -> f64 {
    1.0
}

fn default_palette() -> Vec<String> {
    [
        "#a6cee3", "#1f78b4", "#b2df8a", "#33a02c", "#fb9a99", "#e31a1c", "#fdbf6f", "#ff7f00",
        "#cab2d6", "#6a3d9a", "#ffff99", "#b15928",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX).separator("__")
}

pub fn load_influx_config() -> anyhow::Result<InfluxConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/influx"))
        .add_source(environment())
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_plots_config() -> anyhow::Result<PlotsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/plots").required(false))
        .add_source(environment())
        .build()?;

    Ok(settings.try_deserialize()?)
}
