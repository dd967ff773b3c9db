// Handler Registry - in-process CGI targets and dependency initializers

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::constants::METHOD_SEPARATOR;
use crate::domain::{CgiJob, ProcessPool, RequestEnv};
use crate::error::{GatewayError, Result};
use crate::port::{CgiExecutor, DependencyExecutor, Handler};

/// Named handlers, built once at startup and shared by every request
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `class`, replacing any previous entry
    pub fn register(mut self, class: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.handlers.insert(class.into(), handler);
        self
    }

    pub fn contains(&self, class: &str) -> bool {
        self.handlers.contains_key(class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    fn lookup(&self, class: &str) -> Result<&Arc<dyn Handler>> {
        self.handlers
            .get(class)
            .ok_or_else(|| GatewayError::Config(format!("handler \"{class}\" NOT registered")))
    }
}

#[async_trait]
impl CgiExecutor for HandlerRegistry {
    /// Methods run in order; one failing method does not skip the rest,
    /// a stop request does
    async fn exec_cgi(&self, pool: &mut ProcessPool, jobs: Vec<CgiJob>) -> Result<()> {
        for job in jobs {
            let handler = match self.lookup(&job.handler_class) {
                Ok(handler) => handler,
                Err(e) => {
                    pool.push_error(&e);
                    continue;
                }
            };

            for method in &job.methods {
                match handler.call(method, pool).await {
                    Ok(value) => {
                        debug!(handler = %job.handler_class, method = %method, "CGI method done");
                        pool.set_result(job.result_key(method), value);
                    }
                    Err(e) => {
                        warn!(handler = %job.handler_class, method = %method, error = %e, "CGI method failed");
                        pool.push_error(&e);
                    }
                }

                if pool.stop_requested() {
                    debug!(
                        handler = %job.handler_class,
                        method = %method,
                        "Stop requested, skipping remaining CGI work"
                    );
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DependencyExecutor for HandlerRegistry {
    /// Entries read `class-method[-method...]`; the first failure aborts
    async fn exec_dependencies(&self, list: &[String]) -> Result<()> {
        let mut scratch = ProcessPool::new(&RequestEnv::cli());

        for entry in list {
            let mut parts = entry.split(METHOD_SEPARATOR).filter(|p| !p.is_empty());
            let class = parts
                .next()
                .ok_or_else(|| GatewayError::Config(format!("empty dependency entry \"{entry}\"")))?;
            let handler = self.lookup(class)?;

            for method in parts {
                handler.call(method, &mut scratch).await?;
                debug!(dependency = %entry, method = %method, "Dependency initialized");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Echoes the method name; `fail` errors, `halt` requests a stop; records every call
    #[derive(Default)]
    struct EchoHandler {
        calls: Mutex<Vec<String>>,
    }

    impl EchoHandler {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Handler for EchoHandler {
        async fn call(&self, method: &str, pool: &mut ProcessPool) -> Result<Value> {
            self.calls.lock().unwrap().push(method.to_string());
            match method {
                "fail" => Err(GatewayError::Execution("boom".into())),
                "user" => Ok(pool.data.get("user").cloned().unwrap_or(Value::Null)),
                "halt" => {
                    pool.request_stop();
                    Ok(json!("halted"))
                }
                _ => Ok(json!(method)),
            }
        }
    }

    fn registry(handler: Arc<EchoHandler>) -> HandlerRegistry {
        HandlerRegistry::new().register("echo", handler)
    }

    #[tokio::test]
    async fn test_results_keyed_by_class_and_method() {
        let registry = registry(Arc::new(EchoHandler::default()));
        let mut pool = ProcessPool::new(&RequestEnv::cli());
        pool.data.insert("user".into(), json!("ada"));

        registry
            .exec_cgi(&mut pool, vec![CgiJob::new("echo", ["a", "user"])])
            .await
            .unwrap();

        assert_eq!(Value::Object(pool.results), json!({"echo/a": "a", "echo/user": "ada"}));
        assert!(pool.errors.is_empty());
    }

    #[tokio::test]
    async fn test_failing_method_does_not_skip_siblings() {
        let handler = Arc::new(EchoHandler::default());
        let registry = registry(handler.clone());
        let mut pool = ProcessPool::new(&RequestEnv::cli());

        registry
            .exec_cgi(&mut pool, vec![CgiJob::new("echo", ["fail", "b"])])
            .await
            .unwrap();

        assert_eq!(handler.calls(), vec!["fail", "b"]);
        assert_eq!(pool.errors.len(), 1);
        assert_eq!(pool.results.get("echo/b"), Some(&json!("b")));
    }

    #[tokio::test]
    async fn test_stop_request_skips_remaining_methods_and_jobs() {
        let handler = Arc::new(EchoHandler::default());
        let registry = registry(handler.clone());
        let mut pool = ProcessPool::new(&RequestEnv::cli());

        registry
            .exec_cgi(
                &mut pool,
                vec![CgiJob::new("echo", ["a", "halt", "b"]), CgiJob::new("echo", ["c"])],
            )
            .await
            .unwrap();

        assert_eq!(handler.calls(), vec!["a", "halt"]);
        assert_eq!(
            Value::Object(pool.results),
            json!({"echo/a": "a", "echo/halt": "halted"})
        );
    }

    #[tokio::test]
    async fn test_unknown_handler_is_pool_error() {
        let registry = HandlerRegistry::new();
        let mut pool = ProcessPool::new(&RequestEnv::cli());

        registry
            .exec_cgi(&mut pool, vec![CgiJob::new("ghost", ["x"])])
            .await
            .unwrap();

        assert_eq!(pool.errors.len(), 1);
        assert_eq!(pool.errors[0].code, crate::error::code::CONFIG_ERROR);
    }

    #[tokio::test]
    async fn test_dependencies_run_in_order() {
        let handler = Arc::new(EchoHandler::default());
        let registry = registry(handler.clone());

        registry
            .exec_dependencies(&["echo-open".into(), "echo-warm-ready".into()])
            .await
            .unwrap();

        assert_eq!(handler.calls(), vec!["open", "warm", "ready"]);
    }

    #[tokio::test]
    async fn test_dependency_failure_aborts_list() {
        let handler = Arc::new(EchoHandler::default());
        let registry = registry(handler.clone());

        let err = registry
            .exec_dependencies(&["echo-fail".into(), "echo-never".into()])
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Execution(_)));
        assert_eq!(handler.calls(), vec!["fail"]);
    }

    #[tokio::test]
    async fn test_unregistered_dependency_is_config_error() {
        let err = HandlerRegistry::new()
            .exec_dependencies(&["db-open".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }
}
