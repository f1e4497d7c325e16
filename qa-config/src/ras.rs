// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

fn default_consul_path() -> String {
    "/opt/seagate/cortx/hare/bin/consul".to_string()
}

fn default_kv_store_path() -> String {
    "sspl/config/STORAGE_ENCLOSURE".to_string()
}

fn default_storage_enclosure_path() -> String {
    "/opt/seagate/cortx/provisioner/pillar/components/storage_enclosure.sls".to_string()
}

fn default_encryptor_local() -> String {
    "scripts/encryptor_updated.py".to_string()
}

fn default_encryptor_remote() -> String {
    "/root/encryptor_updated.py".to_string()
}

fn default_rabbitmq_local() -> String {
    "scripts/read_rabbitmq_msg.py".to_string()
}

fn default_rabbitmq_remote() -> String {
    "/root/rabbitmq_reader.py".to_string()
}

fn default_service_status_path() -> String {
    "/var/cortx/sspl/data/state.txt".to_string()
}

fn default_pcs_sspl_section() -> String {
    "Master/Slave Set: sspl-master [sspl]".to_string()
}

fn default_restart_settle() -> u64 {
    60
}

fn default_enable_disable_settle() -> u64 {
    30
}

fn default_screen_settle() -> u64 {
    5
}

fn default_sspl_resource_id() -> String {
    "sspl-master".to_string()
}

fn default_sleep_val() -> u64 {
    120
}

fn default_sspl_service() -> String {
    "sspl-ll.service".to_string()
}

fn default_rabbitmq_service() -> String {
    "rabbitmq-server.service".to_string()
}

fn default_screen_log() -> String {
    "/root/screenlog.0".to_string()
}

fn default_alert_log_file() -> String {
    "/root/alert.log".to_string()
}

fn default_extracted_alert_file() -> String {
    "/root/extracted_alert.log".to_string()
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SsplAlertServices {
    #[serde(default = "default_sspl_service")]
    pub sspl_service: String,
    #[serde(default = "default_rabbitmq_service")]
    pub rabbitmq_service: String,
}

impl Default for SsplAlertServices {
    fn default() -> Self {
        Self {
            sspl_service: default_sspl_service(),
            rabbitmq_service: default_rabbitmq_service(),
        }
    }
}

/// Files the alert reader writes and the validation reads back
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SsplAlertFiles {
    /// Output of the rabbitmq reader running inside `screen`
    #[serde(default = "default_screen_log")]
    pub screen_log: String,
    #[serde(default = "default_alert_log_file")]
    pub alert_log_file: String,
    #[serde(default = "default_extracted_alert_file")]
    pub extracted_alert_file: String,
}

impl Default for SsplAlertFiles {
    fn default() -> Self {
        Self {
            screen_log: default_screen_log(),
            alert_log_file: default_alert_log_file(),
            extracted_alert_file: default_extracted_alert_file(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SsplAlertConfig {
    #[serde(default = "default_sspl_resource_id")]
    pub sspl_resource_id: String,
    /// Seconds to wait for alerts to land after a restart
    #[serde(default = "default_sleep_val")]
    pub sleep_val: u64,
    #[serde(default)]
    pub service: SsplAlertServices,
    #[serde(default)]
    pub file: SsplAlertFiles,
}

impl Default for SsplAlertConfig {
    fn default() -> Self {
        Self {
            sspl_resource_id: default_sspl_resource_id(),
            sleep_val: default_sleep_val(),
            service: SsplAlertServices::default(),
            file: SsplAlertFiles::default(),
        }
    }
}

/// Paths and settle times used by the RAS helpers
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RasConfig {
    #[serde(default = "default_consul_path")]
    pub consul_path: String,
    #[serde(default = "default_kv_store_path")]
    pub kv_store_path: String,
    #[serde(default = "default_storage_enclosure_path")]
    pub storage_enclosure_path: String,
    /// Local copy of the password encryptor script
    #[serde(default = "default_encryptor_local")]
    pub encryptor_local_path: String,
    #[serde(default = "default_encryptor_remote")]
    pub encryptor_remote_path: String,
    #[serde(default = "default_rabbitmq_local")]
    pub rabbitmq_reader_local_path: String,
    #[serde(default = "default_rabbitmq_remote")]
    pub rabbitmq_reader_remote_path: String,
    #[serde(default = "default_service_status_path")]
    pub service_status_path: String,
    /// Header line of the sspl block in `pcs status`
    #[serde(default = "default_pcs_sspl_section")]
    pub pcs_sspl_section: String,
    #[serde(default = "default_restart_settle")]
    pub restart_settle_secs: u64,
    #[serde(default = "default_enable_disable_settle")]
    pub enable_disable_settle_secs: u64,
    #[serde(default = "default_screen_settle")]
    pub screen_settle_secs: u64,
    #[serde(default)]
    pub sspl_alert: SsplAlertConfig,
}

impl Default for RasConfig {
    fn default() -> Self {
        Self {
            consul_path: default_consul_path(),
            kv_store_path: default_kv_store_path(),
            storage_enclosure_path: default_storage_enclosure_path(),
            encryptor_local_path: default_encryptor_local(),
            encryptor_remote_path: default_encryptor_remote(),
            rabbitmq_reader_local_path: default_rabbitmq_local(),
            rabbitmq_reader_remote_path: default_rabbitmq_remote(),
            service_status_path: default_service_status_path(),
            pcs_sspl_section: default_pcs_sspl_section(),
            restart_settle_secs: default_restart_settle(),
            enable_disable_settle_secs: default_enable_disable_settle(),
            screen_settle_secs: default_screen_settle(),
            sspl_alert: SsplAlertConfig::default(),
        }
    }
}

impl RasConfig {
    /// Same settings with every wait set to zero
    pub fn without_waits(mut self) -> Self {
        self.restart_settle_secs = 0;
        self.enable_disable_settle_secs = 0;
        self.screen_settle_secs = 0;
        self.sspl_alert.sleep_val = 0;

        self
    }
}
