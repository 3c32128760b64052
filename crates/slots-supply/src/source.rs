//! Number source capability

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use slots_core::SlotResult;
use thiserror::Error;

use crate::config::{SourceConfig, SourceProfile};
use crate::local::LocalNumberSource;
use crate::random_org::RandomOrgSource;

/// Why a block could not be fetched
///
/// Only the replenish path ever sees these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Request or bit allowance used up
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Network failure, unexpected status, timeout
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response arrived but could not be understood
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// One fetched block plus the quota the source reported with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberBlock {
    /// Request id echoed by the source
    pub id: String,
    pub numbers: Vec<i32>,
    pub bits_used: u64,
    pub bits_left: u64,
    pub requests_left: u64,
}

#[async_trait]
pub trait NumberSource: Send + Sync {
    /// Fetch `amount` integers in `[min, max]`
    async fn fetch_block(
        &self,
        amount: usize,
        min: i32,
        max: i32,
    ) -> Result<NumberBlock, SourceError>;

    fn name(&self) -> &str;
}

/// Pick the source for a profile
pub fn source_for(config: &SourceConfig) -> SlotResult<Arc<dyn NumberSource>> {
    config.validate()?;

    let source: Arc<dyn NumberSource> = match config.profile {
        SourceProfile::Local => Arc::new(LocalNumberSource::new()),
        SourceProfile::Production => Arc::new(RandomOrgSource::from_config(config)?),
    };
    log::info!("[Supply] Using {} number source ({} profile)", source.name(), config.profile);
    Ok(source)
}
