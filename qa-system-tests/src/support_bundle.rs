// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

use crate::TestError;
use futures::future::try_join_all;
use qa_config::{fill_template, BundleCase, SupportBundleConfig};
use qa_ras::{commands, health};
use qa_ssh::{quote, RemoteExec, RemoteFsExt};
use std::{collections::BTreeMap, path::Path, time::Duration};

/// Archive name the bundle script writes for `bundle_name`
pub fn bundle_tar_name(bundle_name: &str, postfix: &str) -> String {
    format!("s3_{}.{}", bundle_name, postfix)
}

/// Join like a POSIX path, an absolute `rest` replaces `base`
fn join(base: &str, rest: &str) -> String {
    if rest.is_empty() {
        return base.to_string();
    }

    Path::new(base).join(rest).to_string_lossy().to_string()
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Where a bundle of a case is written and unpacked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePaths {
    /// Directory handed to the bundle script
    pub dest_dir: String,
    /// Directory holding the archive, also where it gets unpacked
    pub tar_dest_dir: String,
    pub tar_file: String,
    pub extracted_dir: String,
}

impl BundlePaths {
    pub fn new(cfg: &SupportBundleConfig, case: &BundleCase, bundle_name: &str) -> Self {
        let dest = case
            .remote_dest_dir
            .as_deref()
            .unwrap_or(&cfg.remote_default_dir);

        let dest_dir = join(&case.common_dir, dest);
        let tar_dest_dir = join(&dest_dir, &case.common_dir);
        let tar_file = join(
            &tar_dest_dir,
            &bundle_tar_name(bundle_name, &case.tar_postfix),
        );
        let extracted_dir = join(&tar_dest_dir, bundle_name);

        Self {
            dest_dir,
            tar_dest_dir,
            tar_file,
            extracted_dir,
        }
    }
}

async fn run_bundle_cmd<E: RemoteExec + ?Sized>(
    exec: &mut E,
    cfg: &SupportBundleConfig,
    bundle_name: &str,
    dest_dir: &str,
) -> Result<(bool, String), TestError> {
    let cmd = format!("{} {} {}", cfg.bundle_cmd, bundle_name, dest_dir);

    tracing::info!("Command to execute : {}", cmd);

    let out = exec.exec_cmd(&cmd).await?;

    let created = out.success() && out.stdout.contains(&cfg.success_msg);

    let (_, text) = out.into_pair();

    Ok((created, text))
}

/// Trigger one bundle per connection at the same time and collect every result.
/// `execs` and `bundle_names` pair up by position.
pub async fn create_support_bundles_parallel<E: RemoteExec>(
    execs: &mut [E],
    cfg: &SupportBundleConfig,
    bundle_names: &[String],
    dest_dir: &str,
) -> Result<Vec<(bool, String)>, TestError> {
    if execs.len() != bundle_names.len() {
        return Err(TestError::Setup(format!(
            "{} connections for {} bundles",
            execs.len(),
            bundle_names.len()
        )));
    }

    let xs = execs
        .iter_mut()
        .zip(bundle_names)
        .map(|(exec, name)| run_bundle_cmd(exec, cfg, name, dest_dir));

    try_join_all(xs).await
}

/// Support bundle collection and inspection on a single node
pub struct SupportBundle<E> {
    host: String,
    exec: E,
    config: SupportBundleConfig,
}

impl<E: RemoteExec> SupportBundle<E> {
    pub fn new(host: impl ToString, exec: E, config: SupportBundleConfig) -> Self {
        Self {
            host: host.to_string(),
            exec,
            config,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn config(&self) -> &SupportBundleConfig {
        &self.config
    }

    pub fn exec(&mut self) -> &mut E {
        &mut self.exec
    }

    pub fn into_inner(self) -> E {
        self.exec
    }

    pub fn case(&self, name: &str) -> Result<BundleCase, TestError> {
        self.config
            .case(name)
            .cloned()
            .ok_or_else(|| TestError::Setup(format!("No case {} in the support bundle config", name)))
    }

    pub fn paths(&self, case: &BundleCase, bundle_name: &str) -> BundlePaths {
        BundlePaths::new(&self.config, case, bundle_name)
    }

    async fn settle(&self) {
        let secs = self.config.cluster_settle_secs;

        if secs > 0 {
            tracing::debug!("Waiting {}s for the cluster", secs);

            tokio::time::sleep(Duration::from_secs(secs)).await;
        }
    }

    /// Run `cmd` on the node
    pub async fn run(&mut self, cmd: &str) -> Result<(bool, String), TestError> {
        tracing::debug!("Running {} on {}", cmd, self.host);

        let out = self.exec.exec_cmd(cmd).await?;

        Ok(out.into_pair())
    }

    pub async fn make_dir(&mut self, path: &str) -> Result<bool, TestError> {
        Ok(self.exec.make_dir(path).await?)
    }

    pub async fn path_exists(&mut self, path: &str) -> Result<bool, TestError> {
        Ok(self.exec.path_exists(path).await?)
    }

    /// Run the bundle script. Passes when it exits cleanly and reports success.
    pub async fn create_support_bundle(
        &mut self,
        bundle_name: &str,
        dest_dir: &str,
    ) -> Result<(bool, String), TestError> {
        run_bundle_cmd(&mut self.exec, &self.config, bundle_name, dest_dir).await
    }

    /// Unpack `tar_file` into `dest_dir` with the case's commands
    pub async fn extract_bundle(
        &mut self,
        case: &BundleCase,
        tar_file: &str,
        dest_dir: &str,
    ) -> Result<(bool, String), TestError> {
        self.run(&fill_template(&case.mkdir_cmd, &[dest_dir]))
            .await?;

        self.run(&fill_template(&case.tar_cmd, &[tar_file, dest_dir]))
            .await
    }

    /// Map every s3server instance directory under `abs_path` to its files
    /// containing `check_file`. Fails as soon as an instance has none.
    pub async fn get_s3_instances_and_m0_exists(
        &mut self,
        abs_path: &str,
        check_file: &str,
    ) -> Result<(bool, BTreeMap<String, Vec<String>>), TestError> {
        let mut instances = BTreeMap::new();

        let prefix = self.config.s3server_prefix.clone();

        let dirs = self.exec.list_dir(abs_path).await?;

        for dir in dirs.iter().filter(|x| x.contains(&prefix)) {
            let abs_dir = join(abs_path, dir);

            let files: Vec<_> = self
                .exec
                .list_dir(&abs_dir)
                .await?
                .into_iter()
                .filter(|x| x.contains(check_file))
                .collect();

            let found = !files.is_empty();

            instances.insert(abs_dir.clone(), files);

            if !found {
                tracing::info!("No {} in {}", check_file, abs_dir);

                return Ok((false, instances));
            }
        }

        Ok((true, instances))
    }

    /// Do both files carry the same modification time
    pub async fn validate_time_stamp(
        &mut self,
        org_file_path: &str,
        ext_file_path: &str,
    ) -> Result<bool, TestError> {
        tracing::info!(
            "Validating the time stamp of : {} with {}",
            org_file_path,
            ext_file_path
        );

        let org = self.exec.stat(org_file_path).await?;
        let ext = self.exec.stat(ext_file_path).await?;

        Ok(org.mtime == ext.mtime)
    }

    async fn md5sum(&mut self, path: &str) -> Result<Option<String>, TestError> {
        let cmd = fill_template(&self.config.md5_cmd, &[&quote(path)]);

        let out = self.exec.exec_cmd(&cmd).await?;

        if !out.success() {
            tracing::info!("{} failed: {}", cmd, out.stderr.trim());

            return Ok(None);
        }

        Ok(out.stdout.split_whitespace().next().map(|x| x.to_string()))
    }

    /// Checksums of files sharing a name and a timestamp must agree
    pub async fn validate_file_checksum(
        &mut self,
        org_file_lst: &[String],
        ext_file_lst: &[String],
    ) -> Result<bool, TestError> {
        for org in org_file_lst {
            for ext in ext_file_lst
                .iter()
                .filter(|x| file_name(x) == file_name(org))
            {
                if !self.validate_time_stamp(org, ext).await? {
                    continue;
                }

                let org_sum = self.md5sum(org).await?;
                let ext_sum = self.md5sum(ext).await?;

                match (org_sum, ext_sum) {
                    (Some(a), Some(b)) if a == b => {}
                    (a, b) => {
                        tracing::info!(
                            "Failed Checksum: {}:{:?} and {}:{:?}",
                            org,
                            a,
                            ext,
                            b
                        );

                        return Ok(false);
                    }
                }
            }
        }

        Ok(true)
    }

    /// Compare the traces of each s3server instance under `remote_path` with
    /// the copies listed in `ext_path_map` (as returned by
    /// [`get_s3_instances_and_m0_exists`](Self::get_s3_instances_and_m0_exists)).
    pub async fn compare_files(
        &mut self,
        remote_path: &str,
        ext_path_map: &BTreeMap<String, Vec<String>>,
    ) -> Result<(bool, Vec<String>), TestError> {
        let mut ext_files = vec![];

        let prefix = self.config.s3server_prefix.clone();
        let postfix = self.config.m0_postfix.clone();

        for name in self.exec.list_dir(remote_path).await? {
            if !name.contains(&prefix) {
                continue;
            }

            let rpath = join(remote_path, &name);

            let org_files: Vec<_> = self
                .exec
                .list_dir(&rpath)
                .await?
                .into_iter()
                .filter(|x| x.contains(&postfix))
                .map(|x| join(&rpath, &x))
                .collect();

            for (dir, files) in ext_path_map.iter().filter(|(d, _)| file_name(d) == name) {
                ext_files = files.iter().map(|x| join(dir, x)).collect();

                if !self.validate_file_checksum(&org_files, &ext_files).await? {
                    return Ok((false, org_files));
                }
            }
        }

        Ok((true, ext_files))
    }

    /// Start or stop the cluster, then check `status_cmd` does not report it down
    pub async fn pcs_start_stop_cluster(
        &mut self,
        start_stop_cmd: &str,
        status_cmd: &str,
    ) -> Result<(bool, Vec<String>), TestError> {
        let (_, out) = self.run(start_stop_cmd).await?;

        tracing::debug!("{} resp: {}", start_stop_cmd, out);

        self.settle().await;

        let (_, lines) = self.exec.exec_lines(status_cmd).await?;

        let down = lines
            .iter()
            .any(|l| l.contains(&self.config.cluster_down_msg));

        Ok((!down, lines))
    }

    /// Run a `systemctl` style `command`, then report whether `service` is running
    pub async fn start_stop_service(
        &mut self,
        command: &str,
        service: &str,
    ) -> Result<(bool, String), TestError> {
        self.run(command).await?;

        Ok(health::get_service_status(&mut self.exec, service).await?)
    }

    /// Stop the cluster with hctl and check it reports itself stopped
    pub async fn hctl_stop_cmd(&mut self) -> Result<(bool, Vec<String>), TestError> {
        let stop_cmd = self.config.cluster_stop_cmd.clone();
        let status_cmd = self.config.hctl_status.clone();

        let resp = self.run(&stop_cmd).await?;

        tracing::info!("hctl Stop resp : {:?}", resp);

        self.settle().await;

        let (_, lines) = self.exec.exec_lines(&status_cmd).await?;

        let stopped = lines
            .first()
            .map(|l| l.trim().contains(&self.config.cluster_stopped_msg))
            .unwrap_or(false);

        Ok((stopped, lines))
    }

    /// Does `path` exist with a non zero size. The size, or the error, comes back as text.
    pub async fn is_file_size(&mut self, path: &str) -> (bool, String) {
        match self.exec.stat(path).await {
            Ok(x) => (x.size > 0, x.size.to_string()),
            Err(e) => {
                tracing::error!("is_file_size {}: {}", path, e);

                (false, e.to_string())
            }
        }
    }

    /// Re-enable the s3server instances and bring the cluster back if asked,
    /// then remove `file_list` and the temporary bundle directories.
    ///
    /// Every step is attempted. The first error is returned once all of them ran.
    pub async fn teardown(
        &mut self,
        file_list: &[String],
        restart_cluster: bool,
    ) -> Result<(), TestError> {
        let mut first_err = None;

        if restart_cluster {
            tracing::info!("Starting cluster");

            let enable = commands::pcs_resource("enable", &self.config.s3server_resource);

            match self.run(&enable).await {
                Ok((true, _)) => {}
                Ok((false, out)) => tracing::warn!("{} failed: {}", enable, out),
                Err(e) => {
                    tracing::error!("{} failed: {}", enable, e);

                    first_err.get_or_insert(e);
                }
            }

            let start = self.config.cluster_start_cmd.clone();
            let status = self.config.cluster_status_cmd.clone();

            match self.pcs_start_stop_cluster(&start, &status).await {
                Ok((true, _)) => {}
                Ok((false, _)) => tracing::warn!("Cluster on {} did not come back", self.host),
                Err(e) => {
                    tracing::error!("{} failed: {}", start, e);

                    first_err.get_or_insert(e);
                }
            }
        }

        for path in file_list {
            tracing::info!("Deleting {}", path);

            match self.exec.remove_path(path).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::error!("Could not delete {}", path);

                    first_err.get_or_insert(TestError::Check(format!("Could not delete {}", path)));
                }
                Err(e) => {
                    tracing::error!("Could not delete {}: {}", path, e);

                    first_err.get_or_insert(e.into());
                }
            }
        }

        let rm = self.config.rm_tmp_bundle_cmd.clone();

        if let Err(e) = self.run(&rm).await {
            first_err.get_or_insert(e);
        }

        tracing::info!("Deleted all the files");

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Run [`teardown`](Self::teardown) after a scenario, whatever its `result`.
    /// The scenario's own error wins over a teardown error.
    pub async fn finish(
        &mut self,
        result: Result<(), TestError>,
        file_list: &[String],
        restart_cluster: bool,
    ) -> Result<(), TestError> {
        if let Err(e) = &result {
            tracing::error!("Scenario failed: {}", e);
        }

        tracing::info!("STARTED: Teardown operations");

        let cleaned = self.teardown(file_list, restart_cluster).await;

        tracing::info!("ENDED: Teardown operations");

        result.and(cleaned)
    }
}
