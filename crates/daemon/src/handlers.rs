// Built-in `system` handler: liveness and host identity for operators

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use portico_core::domain::ProcessPool;
use portico_core::error::{GatewayError, Result};
use portico_core::port::{Handler, OsAdapter, TimeProvider};

pub const SYSTEM_HANDLER: &str = "system";

/// Methods: `ping`, `version`, `ip`, `time`, `fingerprint`
pub struct SystemHandler {
    os_adapter: Arc<dyn OsAdapter>,
    time_provider: Arc<dyn TimeProvider>,
}

impl SystemHandler {
    pub fn new(os_adapter: Arc<dyn OsAdapter>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            os_adapter,
            time_provider,
        }
    }
}

#[async_trait]
impl Handler for SystemHandler {
    async fn call(&self, method: &str, pool: &mut ProcessPool) -> Result<Value> {
        match method {
            "ping" => Ok(json!("pong")),
            "version" => Ok(json!(portico_core::VERSION)),
            "ip" => Ok(json!(pool.client_address)),
            "time" => Ok(json!(self.time_provider.now_millis())),
            "fingerprint" => Ok(json!(self.os_adapter.fingerprint().await?)),
            other => Err(GatewayError::Config(format!(
                "\"{SYSTEM_HANDLER}\" has no method \"{other}\""
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::domain::RequestEnv;
    use portico_core::port::os_adapter::mocks::MockOsAdapter;
    use portico_core::port::time_provider::SystemTimeProvider;

    fn handler() -> SystemHandler {
        SystemHandler::new(
            Arc::new(MockOsAdapter::new("/usr/bin/portico")),
            Arc::new(SystemTimeProvider),
        )
    }

    #[tokio::test]
    async fn test_ping_and_fingerprint() {
        let mut pool = ProcessPool::new(&RequestEnv::cli());
        let handler = handler();

        assert_eq!(handler.call("ping", &mut pool).await.unwrap(), json!("pong"));
        assert_eq!(
            handler.call("fingerprint", &mut pool).await.unwrap(),
            json!("0123456789abcdef0123456789abcdef")
        );
    }

    #[tokio::test]
    async fn test_ip_reads_pool_address() {
        let mut env = RequestEnv::http();
        env.remote_addr = Some("192.0.2.10".into());
        let mut pool = ProcessPool::new(&env);

        assert_eq!(handler().call("ip", &mut pool).await.unwrap(), json!("192.0.2.10"));
    }

    #[tokio::test]
    async fn test_unknown_method_is_config_error() {
        let mut pool = ProcessPool::new(&RequestEnv::cli());
        let err = handler().call("reboot", &mut pool).await.unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }
}
