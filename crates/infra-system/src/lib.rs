// Portico Infrastructure - System Adapters
// Implements: OsAdapter, CliExecutor

pub mod cli_executor;
pub mod os;
pub mod shell;

pub use cli_executor::{SubprocessCliExecutor, DEFAULT_ENV_ALLOWLIST};
pub use os::{detect, DarwinAdapter, GenericAdapter, LinuxAdapter, WindowsAdapter};
