// Linux adapter: lscpu + meminfo + lspci inventory, /proc exe lookup

use async_trait::async_trait;

use portico_core::port::{OsAdapter, ProbeError};

use super::{absolute_path, fingerprint_digest, run_probe};

const PLATFORM: &str = "linux";

const INVENTORY: &str = "lscpu && grep -E '^(MemTotal|SwapTotal)' /proc/meminfo && lspci";

pub struct LinuxAdapter;

#[async_trait]
impl OsAdapter for LinuxAdapter {
    fn platform(&self) -> &'static str {
        PLATFORM
    }

    async fn fingerprint(&self) -> Result<String, ProbeError> {
        let lines = run_probe(PLATFORM, INVENTORY).await?;
        fingerprint_digest(lines)
    }

    async fn interpreter_path(&self) -> Result<String, ProbeError> {
        let line = format!("readlink -f /proc/{}/exe", std::process::id());
        absolute_path(run_probe(PLATFORM, &line).await?)
    }

    fn decorate_background(&self, command: &str) -> String {
        format!("screen {command} > /dev/null 2>&1 &")
    }

    fn decorate_environment(&self, command: &str) -> String {
        format!("source /etc/profile && {command}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::port::ShellCommand;

    #[test]
    fn test_decorators_compose() {
        let line = ShellCommand::new(&LinuxAdapter, "worker --once")
            .background()
            .with_environment()
            .into_string();
        assert_eq!(
            line,
            "source /etc/profile && screen worker --once > /dev/null 2>&1 &"
        );
    }

    #[test]
    fn test_inventory_covers_cpu_memory_and_pci() {
        assert!(INVENTORY.starts_with("lscpu"));
        assert!(INVENTORY.contains("/proc/meminfo"));
        assert!(INVENTORY.ends_with("lspci"));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_interpreter_path_is_current_exe() {
        let path = LinuxAdapter.interpreter_path().await.unwrap();
        let exe = std::env::current_exe().unwrap().canonicalize().unwrap();
        assert_eq!(std::path::PathBuf::from(path), exe);
    }
}
