use super::channel::Channel;
use super::protocol::{
    decode_fingerprint, decode_probe, decode_scan, decode_separator, part_path, AgentCommand,
};
use crate::scanner::{ExtensionPolicy, ScanListing};
use crate::types::{join_path, normalize_relative, SyncError};
use std::path::Path;
use tracing::{debug, info};

/// Typed requests against one remote host
///
/// Owns the single connection for the run. The remote separator is queried
/// once at connect time and used for every remote path join afterwards.
pub struct RemoteBridge<C: Channel> {
    channel: C,
    separator: String,
    generation: u64,
}

impl<C: Channel> RemoteBridge<C> {
    /// Open the channel and learn the remote path separator
    ///
    /// Any failure here leaves nothing to synchronize against and is reported
    /// as a connection error.
    pub fn connect(mut channel: C) -> Result<Self, SyncError> {
        channel.connect()?;
        let reply = channel.execute(&AgentCommand::Sep).map_err(|e| match e {
            SyncError::Io(e) => SyncError::Connection(format!("agent unavailable: {}", e)),
            other => other,
        })?;
        let separator = decode_separator(&reply)?;
        info!(
            "Connected to {} (path separator {:?})",
            channel.host(),
            separator
        );
        Ok(Self {
            channel,
            separator,
            generation: 0,
        })
    }

    pub fn host(&self) -> &str {
        self.channel.host()
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Incremented every time the connection is replaced
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn probe(&mut self, path: &str) -> Result<bool, SyncError> {
        let reply = self.channel.execute(&AgentCommand::Probe {
            path: path.to_string(),
            create: false,
        })?;
        decode_probe(&reply)
    }

    /// Create a remote directory (mode 0755) unless it already exists
    pub fn ensure_dir(&mut self, path: &str) -> Result<(), SyncError> {
        let reply = self.channel.execute(&AgentCommand::Probe {
            path: path.to_string(),
            create: true,
        })?;
        if decode_probe(&reply)? {
            Ok(())
        } else {
            Err(SyncError::Io(std::io::Error::other(format!(
                "could not create remote directory {}",
                path
            ))))
        }
    }

    pub fn scan(
        &mut self,
        root: &str,
        policy: &ExtensionPolicy,
    ) -> Result<ScanListing, SyncError> {
        let reply = self.channel.execute(&AgentCommand::Scan {
            root: root.to_string(),
            accept: policy.accept_arg(),
            reject: policy.reject_arg(),
        })?;
        let mut listing = decode_scan(&reply)?;
        for file in &mut listing.files {
            file.relative_path = normalize_relative(&file.relative_path, &self.separator);
        }
        debug!(
            "{} eligible files under {}:{}",
            listing.files.len(),
            self.host(),
            root
        );
        Ok(listing)
    }

    pub fn fingerprint(&mut self, directory: &str, name: &str) -> Result<String, SyncError> {
        let reply = self.channel.execute(&AgentCommand::Hash {
            dir: directory.to_string(),
            file: name.to_string(),
        })?;
        decode_fingerprint(&reply)
    }

    /// Transfer a local file into `directory` under `name`
    ///
    /// The bytes land in `<name>.part` and are renamed by the agent only once
    /// the transfer finished, so an interrupted upload never leaves a
    /// truncated file under the real name.
    pub fn upload(&mut self, local: &Path, directory: &str, name: &str) -> Result<(), SyncError> {
        let remote_path = join_path(directory, name, &self.separator);
        if let Err(e) = self.channel.upload(local, &part_path(&remote_path)) {
            self.discard(&remote_path);
            return Err(e);
        }

        let reply = self.channel.execute(&AgentCommand::Commit {
            path: remote_path.clone(),
        })?;
        if decode_probe(&reply)? {
            Ok(())
        } else {
            Err(SyncError::Io(std::io::Error::other(format!(
                "could not commit upload of {}",
                remote_path
            ))))
        }
    }

    /// Remove what an interrupted upload left behind, if the host still answers
    fn discard(&mut self, remote_path: &str) {
        let result = self.channel.execute(&AgentCommand::Discard {
            path: remote_path.to_string(),
        });
        match result.and_then(|reply| decode_probe(&reply)) {
            Ok(true) => debug!("Removed partial upload of {}", remote_path),
            Ok(false) => {}
            Err(e) => debug!("Partial upload of {} left in place: {}", remote_path, e),
        }
    }

    /// Tear down the current connection and open a fresh one
    pub fn reconnect(&mut self) -> Result<(), SyncError> {
        info!("Reconnecting to {}", self.channel.host());
        self.channel.disconnect();
        self.channel.connect()?;
        self.generation += 1;
        Ok(())
    }
}

impl<C: Channel> Drop for RemoteBridge<C> {
    fn drop(&mut self) {
        self.channel.disconnect();
    }
}
