// Handler Port - in-process targets for CGI jobs

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ProcessPool;
use crate::error::Result;

/// A named handler class exposing callable methods
#[async_trait]
pub trait Handler: Send + Sync {
    /// Invoke one method; the returned value becomes the job result
    ///
    /// # Errors
    /// - GatewayError::Config for unknown methods
    /// - any error the method itself raises
    async fn call(&self, method: &str, pool: &mut ProcessPool) -> Result<Value>;
}
