//! Reel layout — which drawn number resolves to which symbol
//!
//! A layout declares an inclusive numeric domain `[from, to]` and a list of
//! [`SymbolConfig`]s. It is *valid* once the configs cover every number in
//! the domain exactly once. Overlaps are rejected as configs are added, so a
//! layout can only ever be incomplete, never ambiguous.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::symbols::{Symbol, SymbolConfig, pays};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ReelLayoutRepr")]
pub struct ReelLayout {
    from: i32,
    to: i32,
    configs: Vec<SymbolConfig>,
    /// number → index into `configs`
    #[serde(skip)]
    index: HashMap<i32, usize>,
}

#[derive(Deserialize)]
struct ReelLayoutRepr {
    from: i32,
    to: i32,
    #[serde(default)]
    configs: Vec<SymbolConfig>,
}

impl TryFrom<ReelLayoutRepr> for ReelLayout {
    type Error = SlotError;

    fn try_from(repr: ReelLayoutRepr) -> Result<Self, Self::Error> {
        let mut layout = Self::new(repr.from, repr.to)?;
        for cfg in repr.configs {
            layout.add_config(cfg)?;
        }
        Ok(layout)
    }
}

impl ReelLayout {
    /// Empty layout over `[from, to]`
    pub fn new(from: i32, to: i32) -> SlotResult<Self> {
        if from >= to {
            return Err(SlotError::InvalidArgument(format!(
                "Layout start {} must be smaller than end {}",
                from, to
            )));
        }
        if from < 1 {
            return Err(SlotError::InvalidArgument(format!(
                "Layout domain must start at 1 or higher, got {}",
                from
            )));
        }

        Ok(Self {
            from,
            to,
            configs: Vec::new(),
            index: HashMap::new(),
        })
    }

    /// Add a config. Fails if any of its numbers is already assigned.
    pub fn add_config(&mut self, cfg: SymbolConfig) -> SlotResult<&mut Self> {
        if let Some(taken) = cfg.numbers().iter().find(|n| self.index.contains_key(n)) {
            return Err(SlotError::InvalidArgument(format!(
                "Number {} is already mapped to {}",
                taken,
                self.configs[self.index[taken]].symbol()
            )));
        }

        let slot = self.configs.len();
        self.index.extend(cfg.numbers().iter().map(|&n| (n, slot)));
        self.configs.push(cfg);
        Ok(self)
    }

    /// Consuming variant of [`add_config`](Self::add_config) for chained construction
    pub fn with_config(mut self, cfg: SymbolConfig) -> SlotResult<Self> {
        self.add_config(cfg)?;
        Ok(self)
    }

    /// True iff the configs cover `[from, to]` exactly, with nothing outside it.
    pub fn is_valid(&self) -> bool {
        if self.configs.is_empty() {
            return false;
        }
        let domain_size = i64::from(self.to) - i64::from(self.from) + 1;
        // index keys are unique, so equal size + all in range means equal sets
        self.index.len() as i64 == domain_size
            && self.index.keys().all(|n| (self.from..=self.to).contains(n))
    }

    /// The config covering `number`
    ///
    /// On a valid layout this only fails for numbers outside the domain,
    /// which points at a misconfigured number supply.
    pub fn symbol_for(&self, number: i32) -> SlotResult<&SymbolConfig> {
        self.index
            .get(&number)
            .map(|&i| &self.configs[i])
            .ok_or_else(|| {
                SlotError::InvalidArgument(format!(
                    "Number {} is not assigned to any symbol (domain {}..={})",
                    number, self.from, self.to
                ))
            })
    }

    pub fn domain_low(&self) -> i32 {
        self.from
    }

    pub fn domain_high(&self) -> i32 {
        self.to
    }

    pub fn configs(&self) -> &[SymbolConfig] {
        &self.configs
    }

    /// Stock three-reel layout over `[1, 100]`
    pub fn classic() -> SlotResult<Self> {
        let table: [(Symbol, i32, i32, &[i64]); 10] = [
            (Symbol::Seven, 1, 13, &[100, 250, 600]),
            (Symbol::TwoSevens, 13, 23, &[160, 400, 950]),
            (Symbol::ThreeSevens, 23, 26, &[200, 500, 1200]),
            (Symbol::Cherry, 26, 40, &[80, 200, 480]),
            (Symbol::TwoCherries, 40, 49, &[180, 450, 1000]),
            (Symbol::ThreeCherries, 49, 51, &[240, 600, 1400]),
            (Symbol::Bell, 51, 64, &[90, 220, 520]),
            (Symbol::TwoBells, 64, 75, &[190, 480, 1100]),
            (Symbol::ThreeBells, 75, 76, &[260, 650, 1500]),
            (Symbol::Empty, 76, 101, &[]),
        ];

        let mut layout = Self::new(1, 100)?;
        for (symbol, from, to, values) in table {
            layout.add_config(SymbolConfig::create_range(symbol, from, to, pays(values))?)?;
        }
        Ok(layout)
    }
}
