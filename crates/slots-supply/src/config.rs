//! Supply and source configuration

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use slots_core::{SlotError, SlotResult};

/// Default JSON-RPC endpoint of random.org
pub const RANDOM_ORG_ENDPOINT: &str = "https://api.random.org/json-rpc/1/invoke";

/// Buffer sizing and the number range drawn
///
/// Every field is optional in a config document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyConfig {
    /// Replenish once the buffer holds this many numbers or fewer
    pub low_water_mark: usize,
    /// Most numbers a single `request` may take
    pub max_per_request: usize,
    /// Lowest number drawn (inclusive)
    pub domain_low: i32,
    /// Highest number drawn (inclusive)
    pub domain_high: i32,
    /// Numbers fetched per replenish
    pub block_amount: usize,
    /// Fill the buffer as soon as the cache starts
    pub replenish_on_start: bool,
    /// Upper bound on a single source fetch
    pub fetch_timeout_ms: u64,
}

impl Default for SupplyConfig {
    fn default() -> Self {
        Self {
            low_water_mark: 100,
            max_per_request: 10,
            domain_low: 1,
            domain_high: 1000,
            block_amount: 2000,
            replenish_on_start: false,
            fetch_timeout_ms: 10_000,
        }
    }
}

impl SupplyConfig {
    pub fn validate(&self) -> SlotResult<()> {
        if self.max_per_request == 0 {
            return Err(SlotError::invalid_argument("max_per_request must be at least 1"));
        }
        if self.block_amount == 0 {
            return Err(SlotError::invalid_argument("block_amount must be at least 1"));
        }
        if self.domain_low >= self.domain_high {
            return Err(SlotError::InvalidArgument(format!(
                "domain_low {} must be smaller than domain_high {}",
                self.domain_low, self.domain_high
            )));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(SlotError::invalid_argument("fetch_timeout_ms must be at least 1"));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

/// Which number source backs the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceProfile {
    /// In-process pseudo random numbers
    #[default]
    Local,
    /// random.org
    Production,
}

impl SourceProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::Production => "Production",
        }
    }
}

impl FromStr for SourceProfile {
    type Err = std::convert::Infallible;

    /// Anything but "production" (any case) selects the local source.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("production") {
            Ok(Self::Production)
        } else {
            Ok(Self::Local)
        }
    }
}

impl From<String> for SourceProfile {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(profile) => profile,
            Err(never) => match never {},
        }
    }
}

impl From<SourceProfile> for String {
    fn from(p: SourceProfile) -> Self {
        p.as_str().to_string()
    }
}

impl fmt::Display for SourceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub profile: SourceProfile,
    /// Required for [`SourceProfile::Production`]
    pub api_key: Option<String>,
    pub endpoint: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            profile: SourceProfile::Local,
            api_key: None,
            endpoint: RANDOM_ORG_ENDPOINT.to_string(),
        }
    }
}

impl SourceConfig {
    pub fn validate(&self) -> SlotResult<()> {
        if self.profile == SourceProfile::Production {
            let has_key = self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
            if !has_key {
                return Err(SlotError::invalid_argument(
                    "The production source requires an api_key",
                ));
            }
            if self.endpoint.trim().is_empty() {
                return Err(SlotError::invalid_argument(
                    "The production source requires an endpoint",
                ));
            }
        }
        Ok(())
    }
}
