// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

//! Shell commands sent to cluster nodes.

use qa_ssh::quote;

pub static PCS_STATUS: &str = "pcs status";
pub static SEL_INFO: &str = "ipmitool sel info";
pub static IPMI_SDR_LIST: &str = "ipmitool sdr list";
pub static GET_CLUSTER_ID: &str = "salt-call grains.get cluster_id";
pub static INSTALL_SCREEN: &str = "yum install -y screen";
pub static SCREEN_INSTALLED: &str = "rpm -qa | grep screen";

/// Marker `systemctl status` prints for a running unit
pub static ACTIVE_RUNNING: &str = "active (running)";

pub fn truncate(path: &str) -> String {
    format!("truncate -s 0 {}", quote(path))
}

pub fn copy_file(from: &str, to: &str) -> String {
    format!("cp -f {} {}", quote(from), quote(to))
}

pub fn make_executable(path: &str) -> String {
    format!("chmod +x {}", quote(path))
}

/// Run `cmd` detached inside a logging `screen` session
pub fn screen(cmd: &str) -> String {
    format!("screen -d -m -L -S screen_RMQ {}", cmd)
}

pub fn rabbitmq_reader(script: &str, exchange: &str, key: &str, pass: &str) -> String {
    format!(
        "python3 {} {} {} {}",
        quote(script),
        quote(exchange),
        quote(key),
        quote(pass)
    )
}

pub fn update_status_file(path: &str) -> String {
    format!("echo 'state=active' > {}", quote(path))
}

pub fn read_status_file(path: &str) -> String {
    format!("cat {}", quote(path))
}

pub fn encrypt_password(script: &str, password: &str, cluster_id: &str) -> String {
    format!(
        "python3 {} {} {}",
        quote(script),
        quote(password),
        quote(cluster_id)
    )
}

pub fn kv_put(consul: &str, kv_path: &str, field: &str, val: &str) -> String {
    format!("{} kv put {}/{} {}", consul, kv_path, field, quote(val))
}

pub fn kv_get(consul: &str, kv_path: &str, field: &str) -> String {
    format!("{} kv get {}/{}", consul, kv_path, field)
}

/// Value of the `suffix:` entry of the primary (`line_to_drop` = 2) or
/// secondary (`line_to_drop` = 1) controller in `storage_enclosure.sls`
pub fn enclosure_value(sls: &str, suffix: &str, line_to_drop: u8) -> String {
    format!(
        "sed '/{}:/!d' {} | sed '{}d' | awk '{{print $2}}'",
        suffix,
        quote(sls),
        line_to_drop
    )
}

pub fn mdadm(args: &[&str]) -> String {
    format!("mdadm {}", args.join(" "))
}

pub fn pcs_resource(op: &str, resource: &str) -> String {
    format!("pcs resource {} {}", op, resource)
}

pub fn pcs_resource_restart(resource: &str) -> String {
    pcs_resource("restart", resource)
}

pub fn systemctl_status(service: &str) -> String {
    format!("systemctl status {}", service)
}

/// Copy the lines of `log` containing `pattern` into `out`
pub fn extract_log(log: &str, pattern: &str, out: &str) -> String {
    format!("grep {} {} > {}", quote(pattern), quote(log), quote(out))
}
