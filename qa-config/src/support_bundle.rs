// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

use std::collections::BTreeMap;

fn default_bundle_cmd() -> String {
    "sh /opt/seagate/cortx/s3/scripts/s3_bundle_generate.sh".to_string()
}

fn default_success_msg() -> String {
    "S3 support bundle generated successfully".to_string()
}

fn default_md5_cmd() -> String {
    "md5sum {}".to_string()
}

fn default_s3server_prefix() -> String {
    "s3server".to_string()
}

fn default_s3server_resource() -> String {
    "s3server".to_string()
}

fn default_m0_postfix() -> String {
    "m0trace".to_string()
}

fn default_cluster_stopped_msg() -> String {
    "Cluster is not running".to_string()
}

fn default_cluster_down_msg() -> String {
    "Error: cluster is not currently running on this node".to_string()
}

fn default_cluster_start_cmd() -> String {
    "pcs cluster start --all".to_string()
}

fn default_cluster_stop_cmd() -> String {
    "hctl shutdown".to_string()
}

fn default_cluster_status_cmd() -> String {
    "pcs status".to_string()
}

fn default_hctl_status() -> String {
    "hctl status".to_string()
}

fn default_rm_tmp_bundle_cmd() -> String {
    "rm -rf /tmp/s3_support_bundle_*".to_string()
}

fn default_remote_dir() -> String {
    "/var/log/seagate/support_bundle".to_string()
}

fn default_settle_secs() -> u64 {
    30
}

fn default_tar_postfix() -> String {
    "tar.gz".to_string()
}

fn default_tar_cmd() -> String {
    "tar -zxvf {} -C {}".to_string()
}

fn default_mkdir_cmd() -> String {
    "mkdir -p {}".to_string()
}

fn default_count() -> usize {
    1
}

/// Settings of a single support bundle test
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BundleCase {
    pub bundle_prefix: String,
    #[serde(default)]
    pub common_dir: String,
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default = "default_tar_postfix")]
    pub tar_postfix: String,
    /// Extract command, `{}` placeholders are the tar file and the destination
    #[serde(default = "default_tar_cmd")]
    pub tar_cmd: String,
    #[serde(default = "default_mkdir_cmd")]
    pub mkdir_cmd: String,
    #[serde(default)]
    pub remote_dest_dir: Option<String>,
    #[serde(default)]
    pub var_path: Option<String>,
    #[serde(default)]
    pub tmp_dir: Option<String>,
    #[serde(default)]
    pub extracted_m0trace_path: Option<String>,
    #[serde(default)]
    pub s3server_pre: Option<String>,
    #[serde(default)]
    pub stat_files_dir: Option<String>,
    #[serde(default)]
    pub stat_dir_name: Option<String>,
    #[serde(default)]
    pub stat_files: Vec<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub network_service: Option<String>,
    #[serde(default)]
    pub cluster_up_delay: u64,
}

impl BundleCase {
    /// Name of the `i`th bundle of this case
    pub fn bundle_name(&self, i: impl std::fmt::Display) -> String {
        format!("{}_{}", self.bundle_prefix, i)
    }
}

/// Support bundle collection settings shared by all cases
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SupportBundleConfig {
    #[serde(default = "default_bundle_cmd")]
    pub bundle_cmd: String,
    #[serde(default = "default_success_msg")]
    pub success_msg: String,
    /// Checksum command, `{}` is the file
    #[serde(default = "default_md5_cmd")]
    pub md5_cmd: String,
    #[serde(default = "default_s3server_prefix")]
    pub s3server_prefix: String,
    /// Pacemaker resource of the s3server instances
    #[serde(default = "default_s3server_resource")]
    pub s3server_resource: String,
    #[serde(default = "default_m0_postfix")]
    pub m0_postfix: String,
    /// First line of `hctl status` once the cluster is stopped
    #[serde(default = "default_cluster_stopped_msg")]
    pub cluster_stopped_msg: String,
    /// Marker in `pcs status` while pacemaker is down
    #[serde(default = "default_cluster_down_msg")]
    pub cluster_down_msg: String,
    #[serde(default = "default_cluster_start_cmd")]
    pub cluster_start_cmd: String,
    #[serde(default = "default_cluster_stop_cmd")]
    pub cluster_stop_cmd: String,
    #[serde(default = "default_cluster_status_cmd")]
    pub cluster_status_cmd: String,
    #[serde(default = "default_hctl_status")]
    pub hctl_status: String,
    #[serde(default = "default_rm_tmp_bundle_cmd")]
    pub rm_tmp_bundle_cmd: String,
    /// Directory bundles are written to when none is given
    #[serde(default = "default_remote_dir")]
    pub remote_default_dir: String,
    #[serde(default = "default_settle_secs")]
    pub cluster_settle_secs: u64,
    /// Configuration files every bundle must carry
    #[serde(default)]
    pub cfg_files: Vec<String>,
    #[serde(default)]
    pub cases: BTreeMap<String, BundleCase>,
}

impl Default for SupportBundleConfig {
    fn default() -> Self {
        Self {
            bundle_cmd: default_bundle_cmd(),
            success_msg: default_success_msg(),
            md5_cmd: default_md5_cmd(),
            s3server_prefix: default_s3server_prefix(),
            s3server_resource: default_s3server_resource(),
            m0_postfix: default_m0_postfix(),
            cluster_stopped_msg: default_cluster_stopped_msg(),
            cluster_down_msg: default_cluster_down_msg(),
            cluster_start_cmd: default_cluster_start_cmd(),
            cluster_stop_cmd: default_cluster_stop_cmd(),
            cluster_status_cmd: default_cluster_status_cmd(),
            hctl_status: default_hctl_status(),
            rm_tmp_bundle_cmd: default_rm_tmp_bundle_cmd(),
            remote_default_dir: default_remote_dir(),
            cluster_settle_secs: default_settle_secs(),
            cfg_files: vec![],
            cases: BTreeMap::new(),
        }
    }
}

impl SupportBundleConfig {
    pub fn case(&self, name: &str) -> Option<&BundleCase> {
        self.cases.get(name)
    }
}

/// Fill the `{}` placeholders of a command template in order.
pub fn fill_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;

    while let Some(idx) = rest.find("{}") {
        out.push_str(&rest[..idx]);

        match args.next() {
            Some(a) => out.push_str(a),
            None => out.push_str("{}"),
        }

        rest = &rest[idx + 2..];
    }

    out.push_str(rest);

    out
}
