// OS Adapters - platform strategies selected once at startup

mod darwin;
mod generic;
mod linux;
mod windows;

pub use darwin::DarwinAdapter;
pub use generic::GenericAdapter;
pub use linux::LinuxAdapter;
pub use windows::WindowsAdapter;

use md5::{Digest, Md5};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use portico_core::port::{OsAdapter, ProbeError};

use crate::shell::shell_command;

/// Pick the adapter for the platform this binary was built for
pub fn detect() -> Arc<dyn OsAdapter> {
    let adapter: Arc<dyn OsAdapter> = match std::env::consts::OS {
        "linux" => Arc::new(LinuxAdapter),
        "macos" => Arc::new(DarwinAdapter),
        "windows" => Arc::new(WindowsAdapter),
        _ => Arc::new(GenericAdapter),
    };
    info!(os = std::env::consts::OS, platform = adapter.platform(), "OS adapter selected");
    adapter
}

/// Run an inventory utility through the shell and collect stdout lines
pub(crate) async fn run_probe(platform: &'static str, line: &str) -> Result<Vec<String>, ProbeError> {
    debug!(platform, utility = %line, "Running probe");

    let output = shell_command(line)
        .output()
        .await
        .map_err(|e| ProbeError::SpawnFailed(format!("{line}: {e}")))?;

    if !output.status.success() {
        return Err(ProbeError::NonZeroExit {
            platform,
            utility: line.to_string(),
            status: output.status.code().unwrap_or(-1),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect())
}

/// First probe line, which must be an absolute path
pub(crate) fn absolute_path(lines: Vec<String>) -> Result<String, ProbeError> {
    let first = lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .find(|l| !l.is_empty())
        .ok_or_else(|| ProbeError::Unparsable("empty output".to_string()))?;

    if std::path::Path::new(&first).is_absolute() {
        Ok(first)
    } else {
        Err(ProbeError::Unparsable(first))
    }
}

/// md5 hex of the JSON array of non-empty, first-seen-unique lines
///
/// Order is kept, so identical inventories always give the same digest.
pub fn fingerprint_digest<I>(lines: I) -> Result<String, ProbeError>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let unique: Vec<String> = lines
        .into_iter()
        .filter(|l| !l.is_empty())
        .filter(|l| seen.insert(l.clone()))
        .collect();

    let encoded =
        serde_json::to_vec(&unique).map_err(|e| ProbeError::Unparsable(e.to_string()))?;
    Ok(hex::encode(Md5::digest(&encoded)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_digest_ignores_blanks_and_duplicates() {
        let a = fingerprint_digest(lines(&["cpu: x", "", "mem: 8G", "cpu: x"])).unwrap();
        let b = fingerprint_digest(lines(&["cpu: x", "mem: 8G"])).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_digest_is_order_sensitive() {
        let a = fingerprint_digest(lines(&["a", "b"])).unwrap();
        let b = fingerprint_digest(lines(&["b", "a"])).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_digest_of_empty_inventory() {
        // md5("[]")
        assert_eq!(
            fingerprint_digest(Vec::new()).unwrap(),
            "d751713988987e9331980363e24189ce"
        );
    }

    #[test]
    fn test_absolute_path_takes_first_line() {
        let path = absolute_path(lines(&["", "  /usr/bin/portico ", "junk"])).unwrap();
        assert_eq!(path, "/usr/bin/portico");
    }

    #[test]
    fn test_relative_path_is_unparsable() {
        assert!(matches!(
            absolute_path(lines(&["portico"])),
            Err(ProbeError::Unparsable(_))
        ));
        assert!(matches!(absolute_path(Vec::new()), Err(ProbeError::Unparsable(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_failure_reports_status() {
        let err = run_probe("test", "exit 3").await.unwrap_err();
        match err {
            ProbeError::NonZeroExit { status, utility, .. } => {
                assert_eq!(status, 3);
                assert_eq!(utility, "exit 3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_detect_matches_build_target() {
        let adapter = detect();
        let expected = match std::env::consts::OS {
            "linux" => "linux",
            "macos" => "darwin",
            "windows" => "windows",
            _ => "generic",
        };
        assert_eq!(adapter.platform(), expected);
    }
}
