// Platform shell invocation shared by probes and CLI jobs

use tokio::process::Command;

/// `sh -c <line>` on Unix, `cmd /C <line>` on Windows
pub fn shell_command(line: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(line);
        cmd
    }

    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(line);
        cmd
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_line_is_interpreted_by_shell() {
        let output = shell_command("echo a | tr a b").output().await.unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "b");
    }
}
