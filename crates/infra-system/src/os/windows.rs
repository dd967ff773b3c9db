// Windows adapter: wmic inventory, `start /B` backgrounding

use async_trait::async_trait;

use portico_core::port::{OsAdapter, ProbeError};

use super::{fingerprint_digest, run_probe};

const PLATFORM: &str = "windows";

const INVENTORY: &str =
    "wmic cpu get Name,ProcessorId && wmic memorychip get Capacity,SerialNumber && wmic baseboard get SerialNumber";

pub struct WindowsAdapter;

#[async_trait]
impl OsAdapter for WindowsAdapter {
    fn platform(&self) -> &'static str {
        PLATFORM
    }

    async fn fingerprint(&self) -> Result<String, ProbeError> {
        let lines = run_probe(PLATFORM, INVENTORY).await?;
        // wmic pads columns with trailing spaces and emits CRLF
        fingerprint_digest(lines.into_iter().map(|l| l.trim_end().to_string()))
    }

    async fn interpreter_path(&self) -> Result<String, ProbeError> {
        let line = format!(
            "wmic process where ProcessId={} get ExecutablePath /value",
            std::process::id()
        );
        executable_path(run_probe(PLATFORM, &line).await?)
    }

    fn decorate_background(&self, command: &str) -> String {
        format!("start \"\" /B {command} > NUL 2>&1")
    }

    /// Windows has no profile script; the process env is inherited as-is
    fn decorate_environment(&self, command: &str) -> String {
        command.to_string()
    }
}

/// Value of the `ExecutablePath=` line in `wmic ... /value` output
fn executable_path(lines: Vec<String>) -> Result<String, ProbeError> {
    let path = lines
        .iter()
        .find_map(|l| l.trim().strip_prefix("ExecutablePath="))
        .map(str::to_string)
        .ok_or_else(|| ProbeError::Unparsable(lines.join(" ").trim().to_string()))?;

    if path.is_empty() {
        return Err(ProbeError::Unparsable("ExecutablePath is empty".to_string()));
    }
    Ok(path)
}
