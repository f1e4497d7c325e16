// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

//! Remote execution on cluster nodes over SSH.
//!
//! Every operation is a shell command on a fresh channel of one session. File
//! operations ([`RemoteFsExt`]) are built out of `test`, `ls`, `stat` and `cat`.

mod channel;
mod fs;
mod session;
#[cfg(feature = "testing")]
pub mod testing;

pub use crate::{
    fs::{parse_stat, quote, FileStat, RemoteFsExt},
    session::{connect, Auth, Client, ClientError},
};
use futures::{future::BoxFuture, FutureExt};
use std::{io, path::PathBuf, string::FromUtf8Error};
pub use thrussh::client::{Channel, Handle};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    ClientError(#[from] ClientError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    FromUtf8(#[from] FromUtf8Error),
    #[error(transparent)]
    SshError(#[from] thrussh::Error),
    #[error(transparent)]
    SshKeyError(#[from] thrussh_keys::Error),
    #[error("SSH Authentication Failed")]
    AuthenticationFailed,
    #[error("No home directory found")]
    NoHomeDir,
    #[error("No .ssh directory found")]
    NoSshDir,
    #[error("Command Failed. Exit Code: {0}. Message: {1}")]
    FailedCmd(u32, String),
    #[error("Could not parse remote output: {0}")]
    Parse(String),
}

/// Exit status and buffered output of a remote command
#[derive(Debug, Clone, Default)]
pub struct Output {
    pub exit_status: Option<u32>,
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    pub fn success(&self) -> bool {
        self.exit_status == Some(0)
    }
    /// Collapse into the `(status, text)` pair the remote helpers hand back.
    /// A failed command carries stderr, or stdout when stderr is empty.
    pub fn into_pair(self) -> (bool, String) {
        if self.success() {
            (true, self.stdout)
        } else if self.stderr.trim().is_empty() {
            (false, self.stdout)
        } else {
            (false, self.stderr)
        }
    }
    /// Output split into lines. Falls back to stderr when stdout is empty.
    pub fn lines(&self) -> Vec<String> {
        let text = if self.stdout.is_empty() {
            &self.stderr
        } else {
            &self.stdout
        };

        text.lines().map(|x| x.to_string()).collect()
    }
}

impl From<Output> for Result<Output, Error> {
    fn from(o: Output) -> Result<Output, Error> {
        if o.success() {
            Ok(o)
        } else {
            Err(Error::FailedCmd(o.exit_status.unwrap_or(1), o.stderr))
        }
    }
}

/// Something that can run a command on a remote node.
///
/// Implemented for an SSH session handle. Every call opens a fresh channel, so calls
/// are independent of each other.
pub trait RemoteExec: Send {
    /// Run `cmd` and buffer its output and exit status
    fn exec_cmd(&mut self, cmd: &str) -> BoxFuture<'_, Result<Output, Error>>;
    /// Send the given bytes to the remote path, creating the parent directory first.
    fn stream_file(&mut self, data: Vec<u8>, to: PathBuf) -> BoxFuture<'_, Result<(), Error>>;
    /// Send a local file to the remote path
    fn push_file(&mut self, from: PathBuf, to: PathBuf) -> BoxFuture<'_, Result<(), Error>> {
        async move {
            let data = tokio::fs::read(&from).await?;

            self.stream_file(data, to).await
        }
        .boxed()
    }
}

impl RemoteExec for Handle<Client> {
    fn exec_cmd(&mut self, cmd: &str) -> BoxFuture<'_, Result<Output, Error>> {
        let cmd = cmd.to_string();

        async move {
            let mut ch = self.channel_open_session().await?;

            channel::exec(&mut ch, &cmd).await
        }
        .boxed()
    }
    fn stream_file(&mut self, data: Vec<u8>, to: PathBuf) -> BoxFuture<'_, Result<(), Error>> {
        async move {
            let parent = to
                .parent()
                .map(|x| x.to_string_lossy().to_string())
                .filter(|x| !x.is_empty());

            if let Some(dir) = parent {
                let out = self.exec_cmd(&format!("mkdir -p {}", quote(&dir))).await?;

                Result::<Output, Error>::from(out)?;
            }

            let mut ch = self.channel_open_session().await?;

            channel::upload(&mut ch, &data, &to).await
        }
        .boxed()
    }
}
