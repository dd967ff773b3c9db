// Darwin adapter: system_profiler inventory, lsof exe lookup

use async_trait::async_trait;

use portico_core::port::{OsAdapter, ProbeError};

use super::{absolute_path, fingerprint_digest, run_probe};

const PLATFORM: &str = "darwin";

const INVENTORY: &str = "system_profiler SPHardwareDataType SPMemoryDataType SPPCIDataType";

pub struct DarwinAdapter;

#[async_trait]
impl OsAdapter for DarwinAdapter {
    fn platform(&self) -> &'static str {
        PLATFORM
    }

    async fn fingerprint(&self) -> Result<String, ProbeError> {
        let lines = run_probe(PLATFORM, INVENTORY).await?;
        fingerprint_digest(lines)
    }

    /// Fifth `lsof -Fn` record is the text segment of the process image
    async fn interpreter_path(&self) -> Result<String, ProbeError> {
        let line = format!(
            "lsof -p {} -Fn | awk 'NR==5{{print}}' | sed 's/^n\\//\\//'",
            std::process::id()
        );
        absolute_path(run_probe(PLATFORM, &line).await?)
    }

    fn decorate_background(&self, command: &str) -> String {
        format!("screen {command} > /dev/null 2>&1 &")
    }

    fn decorate_environment(&self, command: &str) -> String {
        format!("source /etc/profile && {command}")
    }
}
