// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

use crate::{commands, RasError};
use qa_ssh::RemoteExec;

/// Restart a pacemaker resource
pub async fn restart_pcs_resource<E: RemoteExec + ?Sized>(
    exec: &mut E,
    resource: &str,
) -> Result<(bool, String), RasError> {
    tracing::info!("Restarting pcs resource {}", resource);

    let out = exec
        .exec_cmd(&commands::pcs_resource_restart(resource))
        .await?;

    Ok(out.into_pair())
}

/// Is `service` active and running according to `systemctl status`.
/// The status text is handed back either way.
pub async fn get_service_status<E: RemoteExec + ?Sized>(
    exec: &mut E,
    service: &str,
) -> Result<(bool, String), RasError> {
    let out = exec.exec_cmd(&commands::systemctl_status(service)).await?;

    let running = out.success() && out.stdout.contains(commands::ACTIVE_RUNNING);

    tracing::debug!("{} running: {}", service, running);

    let (_, text) = out.into_pair();

    Ok((running, text))
}
