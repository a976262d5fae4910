/// Pool registry collaborator
///
/// The list of farmable pools is produced outside the farming core and handed to
/// the orchestrator. An empty list is a valid state, not an error.
use async_trait::async_trait;

use crate::error::Error;
use crate::farming::types::PoolAsset;

/// Source of farmable pools, in display order
#[async_trait]
pub trait PoolRegistry: Send + Sync {
    async fn pools(&self) -> Result<Vec<PoolAsset>, Error>;
}

/// Registry over a fixed list of pools
#[derive(Debug, Clone, Default)]
pub struct StaticPoolRegistry {
    pools: Vec<PoolAsset>,
}

impl StaticPoolRegistry {
    pub fn new(pools: Vec<PoolAsset>) -> Self {
        Self { pools }
    }
}

#[async_trait]
impl PoolRegistry for StaticPoolRegistry {
    async fn pools(&self) -> Result<Vec<PoolAsset>, Error> {
        Ok(self.pools.clone())
    }
}
