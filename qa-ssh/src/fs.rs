// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

//! File operations on a remote node, expressed as shell commands on an exec channel.

use crate::{Error, Output, RemoteExec};
use futures::{future::BoxFuture, FutureExt};

/// Modification time (seconds since the epoch) and size of a remote file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub mtime: i64,
    pub size: u64,
}

/// Single-quote `s` for a POSIX shell.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r#"'\''"#))
}

/// Parse the output of `stat -c '%Y %s'`.
pub fn parse_stat(x: &str) -> Result<FileStat, Error> {
    let mut xs = x.split_whitespace();

    let mtime = xs
        .next()
        .and_then(|x| x.parse().ok())
        .ok_or_else(|| Error::Parse(format!("no mtime in stat output {:?}", x)))?;

    let size = xs
        .next()
        .and_then(|x| x.parse().ok())
        .ok_or_else(|| Error::Parse(format!("no size in stat output {:?}", x)))?;

    Ok(FileStat { mtime, size })
}

fn checked(o: Output) -> Result<Output, Error> {
    o.into()
}

pub trait RemoteFsExt: RemoteExec {
    /// Does `path` exist on the remote node
    fn path_exists<'a>(&'a mut self, path: &'a str) -> BoxFuture<'a, Result<bool, Error>> {
        async move {
            let out = self.exec_cmd(&format!("test -e {}", quote(path))).await?;

            Ok(out.success())
        }
        .boxed()
    }
    /// Create `path` and any missing parents. Returns whether the path exists afterwards.
    fn make_dir<'a>(&'a mut self, path: &'a str) -> BoxFuture<'a, Result<bool, Error>> {
        async move {
            let out = self.exec_cmd(&format!("mkdir -p {}", quote(path))).await?;

            if !out.success() {
                tracing::warn!("mkdir {} failed: {}", path, out.stderr.trim());

                return Ok(false);
            }

            self.path_exists(path).await
        }
        .boxed()
    }
    /// Entry names of a remote directory, hidden entries included.
    fn list_dir<'a>(&'a mut self, path: &'a str) -> BoxFuture<'a, Result<Vec<String>, Error>> {
        async move {
            let out = checked(self.exec_cmd(&format!("ls -1A {}", quote(path))).await?)?;

            Ok(out
                .stdout
                .lines()
                .map(str::trim)
                .filter(|x| !x.is_empty())
                .map(|x| x.to_string())
                .collect())
        }
        .boxed()
    }
    fn stat<'a>(&'a mut self, path: &'a str) -> BoxFuture<'a, Result<FileStat, Error>> {
        async move {
            let out = checked(
                self.exec_cmd(&format!("stat -L -c '%Y %s' {}", quote(path)))
                    .await?,
            )?;

            parse_stat(&out.stdout)
        }
        .boxed()
    }
    fn read_file<'a>(&'a mut self, path: &'a str) -> BoxFuture<'a, Result<String, Error>> {
        async move {
            let out = checked(self.exec_cmd(&format!("cat {}", quote(path))).await?)?;

            Ok(out.stdout)
        }
        .boxed()
    }
    /// Recursively remove `path`.
    fn remove_path<'a>(&'a mut self, path: &'a str) -> BoxFuture<'a, Result<bool, Error>> {
        async move {
            let out = self.exec_cmd(&format!("rm -rf {}", quote(path))).await?;

            Ok(out.success())
        }
        .boxed()
    }
    /// Run `cmd` and hand back its status and output lines.
    fn exec_lines<'a>(&'a mut self, cmd: &'a str) -> BoxFuture<'a, Result<(bool, Vec<String>), Error>> {
        async move {
            let out = self.exec_cmd(cmd).await?;

            Ok((out.success(), out.lines()))
        }
        .boxed()
    }
}

impl<T: RemoteExec + ?Sized> RemoteFsExt for T {}
