//! Transports that carry agent requests

use super::agent;
use super::protocol::AgentCommand;
use super::RemoteCredentials;
use crate::executor::copy_file_atomic;
use crate::types::SyncError;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info};

/// ssh reserves this exit status for its own failures
const SSH_FAILURE_STATUS: i32 = 255;

/// One connection to the host that answers agent requests
///
/// Implementations hold at most one live connection; `disconnect` followed by
/// `connect` replaces it.
pub trait Channel {
    /// Host name used in logs and catalog identity
    fn host(&self) -> &str;

    fn connect(&mut self) -> Result<(), SyncError>;

    fn disconnect(&mut self);

    /// Run one agent request and return its complete standard output
    fn execute(&mut self, command: &AgentCommand) -> Result<String, SyncError>;

    /// Transfer a local file to `remote_path`, preserving its modification time
    fn upload(&mut self, local: &Path, remote_path: &str) -> Result<(), SyncError>;
}

/// Channel over the system `ssh` and `scp` binaries
///
/// `connect` starts a ControlMaster so each request reuses one authenticated
/// connection instead of negotiating a new one.
pub struct SshChannel {
    credentials: RemoteCredentials,
    control_path: PathBuf,
    connected: bool,
}

impl SshChannel {
    pub fn new(credentials: RemoteCredentials) -> Self {
        let control_path = std::env::temp_dir().join(format!(
            "syncat-{}-{}.sock",
            std::process::id(),
            credentials.host
        ));
        Self {
            credentials,
            control_path,
            connected: false,
        }
    }

    pub fn credentials(&self) -> &RemoteCredentials {
        &self.credentials
    }

    fn base_options(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "ConnectTimeout=10".to_string(),
            "-o".to_string(),
            format!("ControlPath={}", self.control_path.display()),
        ];
        if let Some(identity) = &self.credentials.identity_file {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        args
    }

    fn ssh(&self) -> Command {
        let mut command = Command::new("ssh");
        command
            .arg("-p")
            .arg(self.credentials.port.to_string())
            .args(self.base_options());
        command
    }

    /// `scp` invocation copying `local` to `remote_path`
    ///
    /// `-O` selects the legacy protocol, where the remote shell expands the
    /// target path; the quoting relies on that.
    fn scp(&self, local: &Path, remote_path: &str) -> Command {
        let mut command = Command::new("scp");
        command
            .args(["-O", "-p", "-P"])
            .arg(self.credentials.port.to_string())
            .args(self.base_options())
            .arg(local)
            .arg(format!(
                "{}:{}",
                self.credentials.destination(),
                shell_quote(remote_path)
            ));
        command
    }

    /// Whether the control connection still answers
    fn master_alive(&self) -> bool {
        self.ssh()
            .args(["-O", "check"])
            .arg(self.credentials.destination())
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn remote_command_line(&self, command: &AgentCommand) -> String {
        let mut words = vec![shell_quote(&self.credentials.agent_path)];
        words.extend(command.to_args().iter().map(|arg| shell_quote(arg)));
        words.join(" ")
    }
}

impl Channel for SshChannel {
    fn host(&self) -> &str {
        &self.credentials.host
    }

    fn connect(&mut self) -> Result<(), SyncError> {
        info!(
            "Connecting to {}:{}",
            self.credentials.destination(),
            self.credentials.port
        );
        let output = self
            .ssh()
            .args(["-M", "-N", "-f", "-o", "ControlMaster=yes"])
            .arg(self.credentials.destination())
            .output()
            .map_err(|e| SyncError::Connection(format!("failed to run ssh: {}", e)))?;

        if !output.status.success() {
            return Err(SyncError::Connection(format!(
                "ssh to {} failed: {}",
                self.credentials.destination(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        let result = self
            .ssh()
            .args(["-O", "exit"])
            .arg(self.credentials.destination())
            .output();
        if let Err(e) = result {
            debug!("Closing ssh control connection failed: {}", e);
        }
        self.connected = false;
    }

    fn execute(&mut self, command: &AgentCommand) -> Result<String, SyncError> {
        let remote_command = self.remote_command_line(command);
        debug!(request = command.name(), "ssh {}", remote_command);

        let output = self
            .ssh()
            .arg(self.credentials.destination())
            .arg(remote_command)
            .output()
            .map_err(|e| SyncError::Connection(format!("failed to run ssh: {}", e)))?;

        reply_from_output(command, output)
    }

    fn upload(&mut self, local: &Path, remote_path: &str) -> Result<(), SyncError> {
        let output = self
            .scp(local, remote_path)
            .output()
            .map_err(|e| SyncError::Connection(format!("failed to run scp: {}", e)))?;
        if output.status.success() {
            return Ok(());
        }

        // scp exits 1 both for remote write errors and for a dropped link
        let status = output.status.code();
        let transport_failed =
            matches!(status, Some(SSH_FAILURE_STATUS) | None) || !self.master_alive();
        Err(upload_failure(
            remote_path,
            status,
            transport_failed,
            &String::from_utf8_lossy(&output.stderr),
        ))
    }
}

impl Drop for SshChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn reply_from_output(command: &AgentCommand, output: Output) -> Result<String, SyncError> {
    let stderr = String::from_utf8_lossy(&output.stderr);
    match output.status.code() {
        Some(0) => {}
        Some(SSH_FAILURE_STATUS) | None => {
            return Err(SyncError::Connection(format!(
                "{} request failed: {}",
                command.name(),
                stderr.trim()
            )));
        }
        Some(status) => {
            return Err(SyncError::Io(std::io::Error::other(format!(
                "remote {} exited with status {}: {}",
                command.name(),
                status,
                stderr.trim()
            ))));
        }
    }

    String::from_utf8(output.stdout)
        .map_err(|_| SyncError::Decode(format!("{} reply is not UTF-8", command.name())))
}

fn upload_failure(
    remote_path: &str,
    status: Option<i32>,
    transport_failed: bool,
    stderr: &str,
) -> SyncError {
    let detail = match status {
        Some(code) => format!(
            "scp to {} exited with status {}: {}",
            remote_path,
            code,
            stderr.trim()
        ),
        None => format!("scp to {} was killed: {}", remote_path, stderr.trim()),
    };
    if transport_failed {
        SyncError::Connection(detail)
    } else {
        SyncError::Io(std::io::Error::other(detail))
    }
}

/// Quote one word for a POSIX shell
pub fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=,:@%+".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Channel that answers agent requests in-process against this machine
///
/// Behaves like a remote host whose filesystem happens to be the local one.
#[derive(Debug)]
pub struct LocalAgentChannel {
    host: String,
    connected: bool,
    connects: usize,
}

impl LocalAgentChannel {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            connected: false,
            connects: 0,
        }
    }

    /// Number of successful `connect` calls so far
    pub fn connects(&self) -> usize {
        self.connects
    }

    fn ensure_connected(&self) -> Result<(), SyncError> {
        if self.connected {
            Ok(())
        } else {
            Err(SyncError::Connection(format!("not connected to {}", self.host)))
        }
    }
}

impl Channel for LocalAgentChannel {
    fn host(&self) -> &str {
        &self.host
    }

    fn connect(&mut self) -> Result<(), SyncError> {
        self.connected = true;
        self.connects += 1;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn execute(&mut self, command: &AgentCommand) -> Result<String, SyncError> {
        self.ensure_connected()?;
        agent::handle(command)
    }

    fn upload(&mut self, local: &Path, remote_path: &str) -> Result<(), SyncError> {
        self.ensure_connected()?;
        copy_file_atomic(local, Path::new(remote_path)).map(|bytes| {
            debug!(bytes, "uploaded {}", remote_path);
        })
    }
}
