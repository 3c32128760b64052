//! In-process number source

use async_trait::async_trait;
use rand::Rng;
use uuid::Uuid;

use crate::source::{NumberBlock, NumberSource, SourceError};

/// Pseudo random numbers from the thread RNG. Never runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalNumberSource;

impl LocalNumberSource {
    pub fn new() -> Self {
        Self
    }

    fn generate(amount: usize, min: i32, max: i32) -> Result<Vec<i32>, SourceError> {
        if min > max {
            return Err(SourceError::Malformed(format!("Empty range {}..={}", min, max)));
        }
        let mut rng = rand::rng();
        Ok((0..amount).map(|_| rng.random_range(min..=max)).collect())
    }
}

#[async_trait]
impl NumberSource for LocalNumberSource {
    async fn fetch_block(
        &self,
        amount: usize,
        min: i32,
        max: i32,
    ) -> Result<NumberBlock, SourceError> {
        log::debug!("[Supply] Generating {} local numbers in {}..={}", amount, min, max);
        let numbers = Self::generate(amount, min, max)?;

        Ok(NumberBlock {
            id: Uuid::new_v4().to_string(),
            numbers,
            bits_used: 0,
            bits_left: u64::MAX,
            requests_left: u64::MAX,
        })
    }

    fn name(&self) -> &str {
        "local"
    }
}
