// Gateway - process-wide wiring shared by every request

use std::sync::Arc;

use portico_core::application::{
    Collaborators, Controller, DelimitedCommandPreparer, HandlerRegistry, JsonInputReader,
};
use portico_core::config::GatewayConfig;
use portico_core::domain::RequestEnv;
use portico_core::port::id_provider::UuidProvider;
use portico_core::port::time_provider::SystemTimeProvider;
use portico_core::port::{OsAdapter, ResponseSink, TimeProvider, TracingErrorReporter};
use portico_infra_system::{SubprocessCliExecutor, DEFAULT_ENV_ALLOWLIST};

use crate::handlers::{SystemHandler, SYSTEM_HANDLER};

/// Built once at startup; hands a fresh controller to each request
#[derive(Clone)]
pub struct Gateway {
    config: Arc<GatewayConfig>,
    ports: Collaborators,
}

impl Gateway {
    /// Wire production adapters around `config`
    ///
    /// `registry` holds application handlers; the built-in `system`
    /// handler is added to it.
    pub fn new(
        config: GatewayConfig,
        registry: HandlerRegistry,
        os_adapter: Arc<dyn OsAdapter>,
    ) -> Self {
        let config = Arc::new(config);
        let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);

        let registry = Arc::new(registry.register(
            SYSTEM_HANDLER,
            Arc::new(SystemHandler::new(os_adapter.clone(), time_provider.clone())),
        ));

        let ports = Collaborators {
            input_reader: Arc::new(JsonInputReader::default()),
            command_preparer: Arc::new(DelimitedCommandPreparer::new(
                registry.clone(),
                config.clone(),
            )),
            cgi_executor: registry.clone(),
            cli_executor: Arc::new(SubprocessCliExecutor::new(
                time_provider,
                DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
            )),
            dependency_executor: registry,
            error_reporter: Arc::new(TracingErrorReporter),
            os_adapter,
            id_provider: Arc::new(UuidProvider),
        };

        Self { config, ports }
    }

    /// Replace collaborators wholesale (tests, embedding)
    pub fn with_ports(config: Arc<GatewayConfig>, ports: Collaborators) -> Self {
        Self { config, ports }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn os_adapter(&self) -> Arc<dyn OsAdapter> {
        self.ports.os_adapter.clone()
    }

    /// Controller for one request reading `input`
    pub fn controller<S: ResponseSink>(
        &self,
        env: RequestEnv,
        input: JsonInputReader,
        sink: S,
    ) -> Controller<S> {
        let ports = self.ports.clone().with_input_reader(Arc::new(input));
        Controller::new(self.config.clone(), ports, env, sink)
    }
}
