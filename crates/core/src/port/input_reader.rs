// Input Reader Port - fills the pool during the READ stage

use async_trait::async_trait;

use crate::domain::ProcessPool;
use crate::error::Result;

/// Parses request input into `pool.data`
///
/// Implementations must merge without overwriting keys already present
/// (see `ProcessPool::merge_data`).
#[async_trait]
pub trait InputReader: Send + Sync {
    async fn read(&self, pool: &mut ProcessPool) -> Result<()>;
}

pub mod mocks {
    use super::*;

    /// Reader that leaves the pool untouched
    pub struct NoInput;

    #[async_trait]
    impl InputReader for NoInput {
        async fn read(&self, _pool: &mut ProcessPool) -> Result<()> {
            Ok(())
        }
    }
}
