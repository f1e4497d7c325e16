// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

use crate::{quote, Error, Output};
use std::path::Path;
use thrussh::{client::Channel, ChannelMsg};

/// Read `ch` until the remote side closes it
async fn collect(ch: &mut Channel) -> Result<Output, Error> {
    let mut stdout = vec![];
    let mut stderr = vec![];
    let mut exit_status = None;

    while let Some(msg) = ch.wait().await {
        match msg {
            ChannelMsg::Data { ref data } => {
                data.write_all_from(0, &mut stdout)?;
            }
            ChannelMsg::ExtendedData { ref data, ext: 1 } => {
                data.write_all_from(0, &mut stderr)?;
            }
            ChannelMsg::ExitStatus { exit_status: x } => {
                exit_status = Some(x);
            }
            x => {
                tracing::trace!("Ignoring {:?}", x);
            }
        }
    }

    Ok(Output {
        exit_status,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    })
}

#[tracing::instrument(skip(ch))]
pub(crate) async fn exec(ch: &mut Channel, cmd: &str) -> Result<Output, Error> {
    ch.exec(true, cmd).await?;

    let out = collect(ch).await?;

    tracing::debug!(exit_status = ?out.exit_status);

    Ok(out)
}

/// Write `data` to `to` through a remote `cat`
#[tracing::instrument(skip(ch, data))]
pub(crate) async fn upload(ch: &mut Channel, data: &[u8], to: &Path) -> Result<(), Error> {
    let target = to.to_string_lossy();

    ch.exec(true, format!("cat - > {}", quote(&target))).await?;
    ch.data(data).await?;
    ch.eof().await?;

    let out = collect(ch).await?;

    if out.success() {
        return Ok(());
    }

    Err(Error::FailedCmd(
        out.exit_status.unwrap_or(1),
        format!("Could not stream data to {}. Error: {}", target, out.stderr),
    ))
}
