// Port Layer - Interfaces for request collaborators

pub mod command_preparer;
pub mod dependency_executor;
pub mod error_reporter;
pub mod handler;
pub mod id_provider; // For deterministic testing
pub mod input_reader;
pub mod job_executor;
pub mod os_adapter;
pub mod response_sink;
pub mod time_provider;

// Re-exports
pub use command_preparer::CommandPreparer;
pub use dependency_executor::DependencyExecutor;
pub use error_reporter::{ErrorReporter, TracingErrorReporter};
pub use handler::Handler;
pub use id_provider::IdProvider;
pub use input_reader::InputReader;
pub use job_executor::{CgiExecutor, CliExecutor};
pub use os_adapter::{OsAdapter, ProbeError, ShellCommand};
pub use response_sink::{BufferedResponse, ResponseSink};
pub use time_provider::TimeProvider;
