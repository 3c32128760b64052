//! Composition root

use std::sync::Arc;

use slots_core::SlotResult;
use slots_supply::{NumberSource, RandomSupplyCache, ReplenishOutcome, source_for};

use crate::config::SlotsConfig;
use crate::service::MachineService;

/// One supply cache and the service drawing from it
pub struct SlotsRuntime {
    config: SlotsConfig,
    service: MachineService,
}

impl SlotsRuntime {
    /// Build the source its profile names, then the cache and service
    pub async fn from_config(config: SlotsConfig) -> SlotResult<Self> {
        config.validate()?;
        let source = source_for(&config.source)?;
        Self::with_source(config, source).await
    }

    /// Same as [`from_config`](Self::from_config) with an explicit source
    pub async fn with_source(
        config: SlotsConfig,
        source: Arc<dyn NumberSource>,
    ) -> SlotResult<Self> {
        config.validate()?;
        let supply = RandomSupplyCache::new(config.supply.clone(), source)?;

        match supply.start().await {
            Some(ReplenishOutcome::Appended(n)) => {
                log::info!("[Service] Supply primed with {} numbers", n)
            }
            Some(other) => log::warn!("[Service] Supply not primed on start: {:?}", other),
            None => {}
        }

        let service = MachineService::in_memory(supply)
            .with_default_player(config.player_default.clone());
        Ok(Self { config, service })
    }

    pub fn service(&self) -> &MachineService {
        &self.service
    }

    pub fn supply(&self) -> &Arc<RandomSupplyCache> {
        self.service.supply()
    }

    pub fn config(&self) -> &SlotsConfig {
        &self.config
    }
}
