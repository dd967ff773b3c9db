// Domain Layer - Per-request state and pure gateway rules

pub mod address;
pub mod cors;
pub mod env;
pub mod job;
pub mod pool;
pub mod stage;

// Re-exports
pub use address::{get_ip, resolve_client_address};
pub use cors::{CorsDecision, CorsPolicy};
pub use env::{RequestEnv, RunMode};
pub use job::{CgiJob, CliJob, CliOptions, JobQueue, PreparedJob};
pub use pool::{ErrorEntry, ProcessPool};
pub use stage::Stage;
