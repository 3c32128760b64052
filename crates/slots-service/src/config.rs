//! Service configuration document
//!
//! JSON or YAML, every section optional:
//!
//! ```yaml
//! supply:
//!   low_water_mark: 100
//!   max_per_request: 20
//!   domain_low: 1
//!   domain_high: 100
//!   block_amount: 2000
//!   replenish_on_start: true
//! source:
//!   profile: Production
//!   api_key: "..."
//! player_default: guest
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use slots_core::{MachineKind, ReelLayout, SlotError, SlotResult};
use slots_supply::{SourceConfig, SupplyConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotsConfig {
    /// Defaults to [`SlotsConfig::machine_supply`] when the section is absent
    #[serde(default = "SlotsConfig::machine_supply")]
    pub supply: SupplyConfig,
    #[serde(default)]
    pub source: SourceConfig,
    /// Player recorded on machines created without one
    #[serde(default = "SlotsConfig::default_player")]
    pub player_default: String,
}

impl Default for SlotsConfig {
    fn default() -> Self {
        Self {
            supply: Self::machine_supply(),
            source: SourceConfig::default(),
            player_default: Self::default_player(),
        }
    }
}

impl SlotsConfig {
    /// Supply that fits the stock machines: the stock layout's domain and
    /// room for the largest grid in one request
    pub fn machine_supply() -> SupplyConfig {
        let largest = MachineKind::ALL
            .iter()
            .map(MachineKind::cell_count)
            .max()
            .unwrap_or(1);
        let (domain_low, domain_high) = ReelLayout::classic()
            .map(|l| (l.domain_low(), l.domain_high()))
            .unwrap_or((1, 100));

        SupplyConfig {
            max_per_request: largest,
            domain_low,
            domain_high,
            ..SupplyConfig::default()
        }
    }

    fn default_player() -> String {
        "guest".to_string()
    }

    pub fn from_json(json: &str) -> SlotResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> SlotResult<Self> {
        let config: Self =
            serde_yml::from_str(yaml).map_err(|e| SlotError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load by extension: `.json`, or `.yaml`/`.yml`
    pub fn from_path(path: impl AsRef<Path>) -> SlotResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SlotError::InvalidArgument(format!("Cannot read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text),
            Some("yaml") | Some("yml") => Self::from_yaml(&text),
            _ => Err(SlotError::InvalidArgument(format!(
                "Unsupported config format: {}",
                path.display()
            ))),
        }
    }

    pub fn validate(&self) -> SlotResult<()> {
        self.supply.validate()?;
        self.source.validate()?;
        if self.player_default.trim().is_empty() {
            return Err(SlotError::invalid_argument("player_default must not be blank"));
        }
        Ok(())
    }
}
