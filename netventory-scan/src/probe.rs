// ---------------------------------------------------------------------------
// Supervised scanner process
// ---------------------------------------------------------------------------
//
// One external nmap invocation per host, with captured stdout and explicit
// kill-on-cancel. The trait seam exists so the engine and parser can be
// exercised against scripted output without a real scanner binary.

use std::process::Stdio;

use async_trait::async_trait;
use netventory_types::Intensity;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};

/// Name of the external scanner binary.
pub const SCANNER_PROGRAM: &str = "nmap";

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to launch scanner for {host}: {source}")]
    Launch {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("scanner stdout was not captured")]
    NoStdout,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fixed argument template for one host probe.
///
/// Full TCP port range, SYN scan, service/version probing, OS detection with
/// aggressive guessing and a capped retry count, a fixed host timeout and
/// version intensity, the standard script set, the caller's timing template,
/// and the target host last.
pub fn probe_args(host: &str, intensity: Intensity) -> Vec<String> {
    [
        "-p",
        "1-65535",
        "-sS",
        "-sV",
        "-O",
        "-A",
        "--osscan-guess",
        "--max-os-tries",
        "2",
        intensity.flag(),
        "--host-timeout",
        "60s",
        "--version-intensity",
        "7",
        "--script=banner,http-title,ssl-cert,ssh-hostkey,snmp-info,smb-os-discovery",
        host,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// A running probe: a stream of output lines plus kill/wait control.
#[async_trait]
pub trait ProbeHandle: Send {
    /// Next stdout line, or `None` once the stream is exhausted.
    async fn next_line(&mut self) -> Result<Option<String>, ProbeError>;

    /// Terminate the underlying process immediately.
    async fn kill(&mut self) -> Result<(), ProbeError>;

    /// Wait for the process to exit and return its exit code, when one exists.
    async fn wait(&mut self) -> Result<Option<i32>, ProbeError>;
}

/// Launches one probe per host.
#[async_trait]
pub trait ProbeLauncher: Send + Sync {
    async fn launch(
        &self,
        host: &str,
        intensity: Intensity,
    ) -> Result<Box<dyn ProbeHandle>, ProbeError>;
}

/// The real launcher: spawns the nmap binary.
#[derive(Debug, Clone, Default)]
pub struct NmapLauncher;

#[async_trait]
impl ProbeLauncher for NmapLauncher {
    async fn launch(
        &self,
        host: &str,
        intensity: Intensity,
    ) -> Result<Box<dyn ProbeHandle>, ProbeError> {
        let mut child = Command::new(SCANNER_PROGRAM)
            .args(probe_args(host, intensity))
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProbeError::Launch {
                host: host.to_string(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or(ProbeError::NoStdout)?;
        Ok(Box::new(NmapProbe {
            child,
            lines: BufReader::new(stdout).lines(),
        }))
    }
}

struct NmapProbe {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
}

#[async_trait]
impl ProbeHandle for NmapProbe {
    async fn next_line(&mut self) -> Result<Option<String>, ProbeError> {
        Ok(self.lines.next_line().await?)
    }

    async fn kill(&mut self) -> Result<(), ProbeError> {
        self.child.kill().await?;
        Ok(())
    }

    async fn wait(&mut self) -> Result<Option<i32>, ProbeError> {
        let status = self.child.wait().await?;
        Ok(status.code())
    }
}
