//! Remote Execution Bridge
//!
//! The remote host runs `syncat-agent`; every request is one agent invocation
//! over a [`Channel`], and its buffered output is decoded by [`protocol`].

pub mod agent;
mod bridge;
mod channel;
pub mod protocol;

pub use bridge::RemoteBridge;
pub use channel::{shell_quote, Channel, LocalAgentChannel, SshChannel};
pub use protocol::{AgentCli, AgentCommand};

use std::path::PathBuf;

pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_AGENT_PATH: &str = "syncat-agent";

/// How to reach and authenticate against the remote host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Private key handed to ssh with `-i`; the agent or ssh config is used when absent
    pub identity_file: Option<PathBuf>,
    /// Location of `syncat-agent` on the remote host
    pub agent_path: String,
}

impl RemoteCredentials {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            user: user.into(),
            identity_file: None,
            agent_path: DEFAULT_AGENT_PATH.to_string(),
        }
    }

    /// `user@host` destination for ssh and scp
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}
