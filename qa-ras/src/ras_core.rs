// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

use crate::{
    commands, health,
    parse::{self, KvValue, SsplState},
    RasError,
};
use qa_config::RasConfig;
use qa_ssh::{RemoteExec, RemoteFsExt};
use std::{path::Path, time::Duration};

async fn settle(secs: u64) {
    if secs > 0 {
        tracing::debug!("Waiting {}s", secs);

        tokio::time::sleep(Duration::from_secs(secs)).await;
    }
}

/// RAS and system level operations on a single node
pub struct RasCoreLib<E> {
    host: String,
    exec: E,
    config: RasConfig,
}

impl<E: RemoteExec> RasCoreLib<E> {
    pub fn new(host: impl ToString, exec: E, config: RasConfig) -> Self {
        Self {
            host: host.to_string(),
            exec,
            config,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn exec(&mut self) -> &mut E {
        &mut self.exec
    }

    pub fn into_inner(self) -> E {
        self.exec
    }

    async fn run(&mut self, cmd: &str) -> Result<(bool, String), RasError> {
        tracing::debug!("Running {} on {}", cmd, self.host);

        let out = self.exec.exec_cmd(cmd).await?;

        Ok(out.into_pair())
    }

    async fn run_lines(&mut self, cmd: &str) -> Result<(bool, Vec<String>), RasError> {
        tracing::debug!("Running {} on {}", cmd, self.host);

        Ok(self.exec.exec_lines(cmd).await?)
    }

    /// Make sure the parent directories of `file_path` exist
    pub async fn create_remote_dir_recursive(&mut self, file_path: &str) -> Result<bool, RasError> {
        if self.exec.path_exists(file_path).await? {
            return Ok(true);
        }

        let parent = match Path::new(file_path).parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_string_lossy().to_string(),
            _ => return Ok(true),
        };

        Ok(self.exec.make_dir(&parent).await?)
    }

    /// Empty a remote file
    pub async fn truncate_file(&mut self, file_path: &str) -> Result<(bool, String), RasError> {
        self.run(&commands::truncate(file_path)).await
    }

    pub async fn cp_file(&mut self, path: &str, backup_path: &str) -> Result<(bool, String), RasError> {
        self.run(&commands::copy_file(path, backup_path)).await
    }

    pub async fn change_file_mode(&mut self, path: &str) -> Result<(bool, String), RasError> {
        self.run(&commands::make_executable(path)).await
    }

    pub async fn install_screen_on_machine(&mut self) -> Result<(bool, String), RasError> {
        tracing::info!("Installing screen on {}", self.host);

        self.run(commands::INSTALL_SCREEN).await
    }

    /// Run `cmd` inside a detached `screen`, installing screen first when missing
    pub async fn run_cmd_on_screen(&mut self, cmd: &str) -> Result<(bool, String), RasError> {
        let (installed, _) = self.run(commands::SCREEN_INSTALLED).await?;

        if !installed {
            self.install_screen_on_machine().await?;
        }

        settle(self.config.screen_settle_secs).await;

        self.run(&commands::screen(cmd)).await
    }

    /// Push the rabbitmq reader to the node and start it inside `screen`
    pub async fn start_rabbitmq_reader_cmd(
        &mut self,
        sspl_exchange: &str,
        sspl_key: &str,
        sspl_pass: &str,
    ) -> Result<bool, RasError> {
        let remote = self.config.rabbitmq_reader_remote_path.clone();
        let local = self.config.rabbitmq_reader_local_path.clone();

        if !self.create_remote_dir_recursive(&remote).await? {
            return Ok(false);
        }

        tracing::debug!("Copying {} to {}:{}", local, self.host, remote);

        self.exec.push_file(local.into(), remote.clone().into()).await?;

        if !self.exec.path_exists(&remote).await? {
            tracing::debug!("Failed to copy the reader to {}", remote);

            return Ok(false);
        }

        self.change_file_mode(&remote).await?;

        let cmd = commands::rabbitmq_reader(&remote, sspl_exchange, sspl_key, sspl_pass);

        let (ok, _) = self.run_cmd_on_screen(&cmd).await?;

        Ok(ok)
    }

    /// Mark sspl active in its state file
    pub async fn check_status_file(&mut self) -> Result<(bool, String), RasError> {
        tracing::info!("Creating/Updating sspl status file");

        let cmd = commands::update_status_file(&self.config.service_status_path);

        self.run(&cmd).await
    }

    pub async fn get_cluster_id(&mut self) -> Result<(bool, String), RasError> {
        self.run(commands::GET_CLUSTER_ID).await
    }

    pub async fn encrypt_pwd(&mut self, password: &str, cluster_id: &str) -> Result<(bool, String), RasError> {
        let cmd =
            commands::encrypt_password(&self.config.encryptor_remote_path, password, cluster_id);

        self.run(&cmd).await
    }

    /// `consul kv put <kv_path>/<field> <val>`
    pub async fn kv_put(&mut self, field: &str, val: &str, kv_path: &str) -> Result<(bool, String), RasError> {
        tracing::info!("Putting value {} of {} to {}", val, field, kv_path);

        let cmd = commands::kv_put(&self.config.consul_path, kv_path, field, val);

        self.run(&cmd).await
    }

    /// `consul kv get <kv_path>/<field>`
    pub async fn kv_get(&mut self, field: &str, kv_path: &str) -> Result<(bool, String), RasError> {
        let cmd = commands::kv_get(&self.config.consul_path, kv_path, field);

        self.run(&cmd).await
    }

    async fn ensure_encryptor(&mut self) -> Result<bool, RasError> {
        let remote = self.config.encryptor_remote_path.clone();

        if self.exec.path_exists(&remote).await? {
            return Ok(true);
        }

        let local = self.config.encryptor_local_path.clone();

        self.exec.push_file(local.into(), remote.clone().into()).await?;

        if !self.exec.path_exists(&remote).await? {
            tracing::debug!("Failed to copy the encryptor to {}", remote);

            return Ok(false);
        }

        self.change_file_mode(&remote).await?;

        Ok(true)
    }

    /// Value for `field` as `storage_enclosure.sls` (or the given credentials) define it
    async fn enclosure_field_value(
        &mut self,
        username: &str,
        pwd: &str,
        field: &str,
    ) -> Result<Option<String>, RasError> {
        match field {
            "user" => Ok(Some(username.to_string())),
            "password" | "secret" => {
                if !self.ensure_encryptor().await? {
                    return Ok(None);
                }

                tracing::info!("Getting cluster id");

                let (_, out) = self.get_cluster_id().await?;

                let cluster_id = parse::parse_cluster_id(&out).ok_or_else(|| {
                    RasError::Parse(format!("cluster id out of {:?}", out))
                })?;

                tracing::info!("Encrypting the password");

                let (_, out) = self.encrypt_pwd(pwd, &cluster_id).await?;

                let x = parse::parse_encrypted_pwd(&out).ok_or_else(|| {
                    RasError::Parse(format!("encrypted password out of {:?}", out))
                })?;

                Ok(Some(x))
            }
            _ => {
                let line_to_drop = match field.split('_').next() {
                    Some("primary") => 2,
                    Some("secondary") => 1,
                    _ => {
                        tracing::debug!("Unexpected field {}", field);

                        return Ok(None);
                    }
                };

                let suffix = field.rsplit('_').next().unwrap_or(field);

                tracing::info!("Getting value of {} from storage_enclosure.sls", field);

                let cmd = commands::enclosure_value(
                    &self.config.storage_enclosure_path,
                    suffix,
                    line_to_drop,
                );

                let (_, out) = self.run(&cmd).await?;

                Ok(Some(parse::collapse_ws(&out)))
            }
        }
    }

    /// Write the enclosure `field` into the KV store and read it back.
    ///
    /// `user` takes `username`, `password`/`secret` take `pwd` encrypted for the
    /// cluster, `primary_*`/`secondary_*` are read out of `storage_enclosure.sls`.
    pub async fn put_kv_store(&mut self, username: &str, pwd: &str, field: &str) -> Result<bool, RasError> {
        let sls = self.config.storage_enclosure_path.clone();

        if !self.exec.path_exists(&sls).await? {
            tracing::info!("Please check path of storage_enclosure.sls: {}", sls);

            return Ok(false);
        }

        let val = match self.enclosure_field_value(username, pwd, field).await? {
            Some(x) => x,
            None => return Ok(false),
        };

        let kv_path = self.config.kv_store_path.clone();

        self.kv_put(field, &val, &kv_path).await?;

        tracing::info!("Validating the value");

        let (_, resp) = self.kv_get(field, &kv_path).await?;

        let written = parse::collapse_ws(&resp) == val;

        tracing::debug!("Wrote {} correctly: {}", field, written);

        Ok(written)
    }

    /// Optionally write `value` to `<kv_store_path>/<field>`, then check the stored value
    pub async fn update_threshold_values(
        &mut self,
        kv_store_path: &str,
        field: &str,
        value: KvValue,
        update: bool,
    ) -> Result<bool, RasError> {
        if update {
            self.kv_put(field, &value.to_string(), kv_store_path).await?;
        }

        tracing::info!("Getting value of {} from {}", field, kv_store_path);

        let (_, resp) = self.kv_get(field, kv_store_path).await?;

        let written = value.matches(&resp);

        tracing::debug!("{} holds {}: {}", field, value, written);

        Ok(written)
    }

    pub async fn run_mdadm_cmd(&mut self, args: &[&str]) -> Result<(bool, String), RasError> {
        let cmd = commands::mdadm(args);

        tracing::info!("Executing {} on host {}", cmd, self.host);

        self.run(&cmd).await
    }

    /// State recorded in the sspl state file. Passes when it is `active`.
    pub async fn get_sspl_state(&mut self) -> Result<(bool, String), RasError> {
        let cmd = commands::read_status_file(&self.config.service_status_path);

        let (_, out) = self.run(&cmd).await?;

        let state = parse::parse_sspl_state(&out);

        tracing::debug!("SSPL state resp: {}", state);

        Ok((state == "active", state))
    }

    /// Where the sspl master and slave run according to `pcs status`
    pub async fn get_sspl_state_pcs(&mut self) -> Result<SsplState, RasError> {
        let (_, lines) = self.run_lines(commands::PCS_STATUS).await?;

        parse::parse_sspl_state_pcs(&lines, &self.config.pcs_sspl_section).ok_or_else(|| {
            RasError::Parse(format!(
                "no {:?} section in pcs status",
                self.config.pcs_sspl_section
            ))
        })
    }

    /// Used SEL space in percent, 0 when `ipmitool` fails
    pub async fn cal_sel_space(&mut self) -> Result<u32, RasError> {
        let (ok, lines) = self.run_lines(commands::SEL_INFO).await?;

        if !ok {
            return Ok(0);
        }

        parse::parse_sel_percent_used(&lines)
            .ok_or_else(|| RasError::Parse("no Percent Used in sel info".into()))
    }

    /// Run a `logger` style command that raises an alert
    pub async fn generate_log_err_alert(&mut self, logger_alert_cmd: &str) -> Result<(bool, String), RasError> {
        tracing::info!("Logger cmd: {}", logger_alert_cmd);

        self.run(logger_alert_cmd).await
    }

    /// First fan sensor of the node
    pub async fn get_fan_name(&mut self) -> Result<Option<String>, RasError> {
        let (ok, lines) = self.run_lines(commands::IPMI_SDR_LIST).await?;

        if !ok {
            return Ok(None);
        }

        Ok(parse::parse_fan_name(&lines))
    }

    pub fn validate_exec_time(time_str: &str) -> (bool, String) {
        tracing::debug!("Time taken to restart: {}", time_str);

        (parse::validate_exec_time(time_str), time_str.to_string())
    }

    /// Restart the pcs resource `service_name` and report whether it came back
    pub async fn restart_service(&mut self, service_name: &str) -> Result<(bool, String), RasError> {
        tracing::info!("Service to be restarted is: {}", service_name);

        health::restart_pcs_resource(&mut self.exec, service_name).await?;

        settle(self.config.restart_settle_secs).await;

        health::get_service_status(&mut self.exec, service_name).await
    }

    /// `pcs resource <operation> <service>`, then the service status
    pub async fn enable_disable_service(
        &mut self,
        operation: &str,
        service: &str,
    ) -> Result<(bool, String), RasError> {
        self.run_lines(&commands::pcs_resource(operation, service))
            .await?;

        settle(self.config.enable_disable_settle_secs).await;

        health::get_service_status(&mut self.exec, service).await
    }

    /// Check the alert log for `string_list`.
    ///
    /// The first string selects the alert lines, every string must then appear in them.
    pub async fn alert_validation(
        &mut self,
        string_list: &[&str],
        restart: bool,
    ) -> Result<(bool, String), RasError> {
        let cfg = self.config.sspl_alert.clone();

        if restart {
            tracing::info!("Restarting sspl services and waiting some time");

            health::restart_pcs_resource(&mut self.exec, &cfg.sspl_resource_id).await?;

            settle(cfg.sleep_val).await;
        }

        tracing::info!("Checking status of sspl and rabbitmq services");

        let resp = health::get_service_status(&mut self.exec, &cfg.service.sspl_service).await?;

        if !resp.0 {
            return Ok(resp);
        }

        let resp =
            health::get_service_status(&mut self.exec, &cfg.service.rabbitmq_service).await?;

        if !resp.0 {
            return Ok(resp);
        }

        settle(cfg.sleep_val).await;

        tracing::info!("Fetching sspl alert response");

        let resp = self
            .cp_file(&cfg.file.screen_log, &cfg.file.alert_log_file)
            .await?;

        if !resp.0 {
            return Ok(resp);
        }

        match self.exec.read_file(&cfg.file.alert_log_file).await {
            Ok(x) => tracing::debug!("{}: {}", cfg.file.alert_log_file, x),
            Err(e) => tracing::debug!("Could not read {}: {}", cfg.file.alert_log_file, e),
        }

        let first = match string_list.first() {
            Some(x) => *x,
            None => return Ok((false, "no alert strings given".into())),
        };

        let cmd = commands::extract_log(&cfg.file.alert_log_file, first, &cfg.file.extracted_alert_file);

        let resp = self.run(&cmd).await?;

        if !resp.0 {
            return Ok(resp);
        }

        let resp = self
            .validate_alert_msg(&cfg.file.extracted_alert_file, string_list)
            .await?;

        if !resp.0 {
            return Ok(resp);
        }

        tracing::info!("Fetched sspl alerts");

        Ok((true, "Fetched alerts successfully".into()))
    }

    /// Every pattern must occur in the remote file. Fails with the first missing
    /// pattern, passes with the last one.
    pub async fn validate_alert_msg(
        &mut self,
        remote_file_path: &str,
        pattern_lst: &[&str],
    ) -> Result<(bool, String), RasError> {
        let text = self.exec.read_file(remote_file_path).await?;

        let mut found = String::new();

        for pattern in pattern_lst {
            if !text.contains(pattern) {
                tracing::info!("Match not found: {}", pattern);

                return Ok((false, pattern.to_string()));
            }

            tracing::info!("Match found: {}", pattern);

            found = pattern.to_string();
        }

        Ok((true, found))
    }
}
