// Application Layer - Request lifecycle and default collaborators

pub mod constants;
pub mod controller;
pub mod input;
pub mod output;
pub mod preparer;
pub mod registry;

// Re-exports
pub use controller::{BootOutcome, Collaborators, Controller, Halt};
pub use input::JsonInputReader;
pub use output::OutputFormatter;
pub use preparer::DelimitedCommandPreparer;
pub use registry::HandlerRegistry;
