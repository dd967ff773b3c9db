// Generic adapter: in-process inventory via sysinfo for unknown platforms

use async_trait::async_trait;
use sysinfo::System;

use portico_core::port::{OsAdapter, ProbeError};

use super::fingerprint_digest;

const PLATFORM: &str = "generic";

pub struct GenericAdapter;

impl GenericAdapter {
    /// Stable host facts only; load figures would change the digest
    fn inventory() -> Vec<String> {
        let sys = System::new_all();

        let mut lines = vec![
            format!("os: {}", System::name().unwrap_or_default()),
            format!("kernel: {}", System::kernel_version().unwrap_or_default()),
            format!("host: {}", System::host_name().unwrap_or_default()),
            format!("memory: {}", sys.total_memory()),
            format!("swap: {}", sys.total_swap()),
        ];
        lines.extend(
            sys.cpus()
                .iter()
                .map(|cpu| format!("cpu: {} {}", cpu.vendor_id(), cpu.brand())),
        );
        lines
    }
}

#[async_trait]
impl OsAdapter for GenericAdapter {
    fn platform(&self) -> &'static str {
        PLATFORM
    }

    async fn fingerprint(&self) -> Result<String, ProbeError> {
        let lines = tokio::task::spawn_blocking(Self::inventory)
            .await
            .map_err(|e| ProbeError::SpawnFailed(e.to_string()))?;
        fingerprint_digest(lines)
    }

    async fn interpreter_path(&self) -> Result<String, ProbeError> {
        std::env::current_exe()
            .map(|p| p.display().to_string())
            .map_err(|e| ProbeError::SpawnFailed(e.to_string()))
    }

    fn decorate_background(&self, command: &str) -> String {
        command.to_string()
    }

    fn decorate_environment(&self, command: &str) -> String {
        command.to_string()
    }
}
