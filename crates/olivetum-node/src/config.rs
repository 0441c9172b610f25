//! Node configuration.

use anyhow::{Context, Result};
use olivetum_consensus::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node name, for logs and peers.
    #[serde(default = "default_node_name")]
    pub node_name: String,
    /// Data directory for chain-local indices.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Engine tunables.
    #[serde(default)]
    pub engine: EngineSection,
    /// API configuration.
    #[serde(default)]
    pub api: ApiConfig,
    /// Sealing configuration.
    #[serde(default)]
    pub sealing: SealingConfig,
}

fn default_node_name() -> String {
    "olivetum-node".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("olivetum-data")
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_name: default_node_name(),
            data_dir: default_data_dir(),
            engine: EngineSection::default(),
            api: ApiConfig::default(),
            sealing: SealingConfig::default(),
        }
    }
}

/// Engine tunables; zeros fall back to network defaults.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngineSection {
    #[serde(default)]
    pub epoch_length: u64,
    #[serde(default)]
    pub dataset_init_bytes: u64,
    #[serde(default)]
    pub dataset_growth_bytes: u64,
    #[serde(default)]
    pub mix_rounds: u64,
}

impl EngineSection {
    pub fn to_engine_config(self) -> EngineConfig {
        EngineConfig {
            epoch_length: self.epoch_length,
            dataset_init_bytes: self.dataset_init_bytes,
            dataset_growth_bytes: self.dataset_growth_bytes,
            mix_rounds: self.mix_rounds,
        }
        .resolve()
    }
}

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP bind address.
    pub bind_address: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8547".to_string(),
        }
    }
}

/// Sealing configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SealingConfig {
    /// Worker threads: 0 auto-detects, negative disables local sealing.
    pub threads: i64,
}

impl Default for SealingConfig {
    fn default() -> Self {
        Self { threads: -1 }
    }
}

impl NodeConfig {
    /// Loads the configuration file, falling back to defaults when the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }
}
