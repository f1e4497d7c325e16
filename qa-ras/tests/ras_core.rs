use qa_config::RasConfig;
use qa_ras::{KvValue, RasCoreLib, RasError, SsplState};
use qa_ssh::testing::ScriptedExec;
use std::path::PathBuf;

static PCS_STATUS_FIXTURE: &str = include_str!("../src/fixtures/pcs_status.txt");
static SEL_INFO_FIXTURE: &str = include_str!("../src/fixtures/ipmitool_sel_info.txt");
static SDR_LIST_FIXTURE: &str = include_str!("../src/fixtures/ipmitool_sdr_list.txt");

const SLS: &str = "/opt/seagate/cortx/provisioner/pillar/components/storage_enclosure.sls";
const KV_GET: &str = "consul kv get sspl/config/STORAGE_ENCLOSURE";

fn ras(exec: ScriptedExec) -> RasCoreLib<ScriptedExec> {
    qa_tracing::init();

    RasCoreLib::new("srvnode-1", exec, RasConfig::default().without_waits())
}

#[tokio::test]
async fn test_put_kv_store_user() -> Result<(), RasError> {
    let mut x = ras(ScriptedExec::new().on(KV_GET, 0, "manage\n"));

    assert!(x.put_kv_store("manage", "!manage", "user").await?);

    let exec = x.into_inner();

    assert_eq!(
        exec.sent_matching("kv put"),
        vec!["/opt/seagate/cortx/hare/bin/consul kv put sspl/config/STORAGE_ENCLOSURE/user 'manage'"]
    );

    Ok(())
}

#[tokio::test]
async fn test_put_kv_store_enclosure_fields() -> Result<(), RasError> {
    let mut x = ras(ScriptedExec::new()
        .on("sed '/ip:/!d'", 0, "10.0.0.2\n")
        .on(KV_GET, 0, " 10.0.0.2 \n"));

    assert!(x.put_kv_store("manage", "!manage", "primary_ip").await?);

    let exec = x.into_inner();

    assert_eq!(
        exec.sent_matching("sed"),
        vec![format!(
            "sed '/ip:/!d' '{}' | sed '2d' | awk '{{print $2}}'",
            SLS
        )]
    );

    // stale value in the store
    let mut x = ras(ScriptedExec::new()
        .on("sed '/ip:/!d'", 0, "10.0.0.3\n")
        .on(KV_GET, 0, "10.0.0.2\n"));

    assert!(!x.put_kv_store("manage", "!manage", "secondary_ip").await?);
    assert_eq!(x.exec().sent_matching("sed '1d'").len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_put_kv_store_rejects_unknown_field() -> Result<(), RasError> {
    let mut x = ras(ScriptedExec::new());

    assert!(!x.put_kv_store("manage", "!manage", "tertiary_ip").await?);
    assert!(x.exec().sent_matching("kv put").is_empty());

    Ok(())
}

#[tokio::test]
async fn test_put_kv_store_without_sls() -> Result<(), RasError> {
    let mut x = ras(ScriptedExec::new().on("test -e", 1, ""));

    assert!(!x.put_kv_store("manage", "!manage", "user").await?);
    assert_eq!(x.exec().sent.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_put_kv_store_encrypts_secret() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let encryptor = tmp.path().join("encryptor_updated.py");

    std::fs::write(&encryptor, "print('encrypted')")?;

    let mut cfg = RasConfig::default().without_waits();
    cfg.encryptor_local_path = encryptor.to_string_lossy().to_string();

    let exec = ScriptedExec::new()
        .on_once("test -e '/root/encryptor_updated.py'", 1, "")
        .on(
            "salt-call grains.get cluster_id",
            0,
            "local:\n    5c427765-ff70-4e38-a1bb-8ab3f6a5bb8c\n",
        )
        .on(
            "python3 '/root/encryptor_updated.py'",
            0,
            "b'gAAAAABgIjs9Zx=='\n",
        )
        .on(KV_GET, 0, "gAAAAABgIjs9Zx==\n");

    let mut x = RasCoreLib::new("srvnode-1", exec, cfg);

    assert!(x.put_kv_store("manage", "!manage", "secret").await?);

    let exec = x.into_inner();

    assert_eq!(
        exec.files[&PathBuf::from("/root/encryptor_updated.py")],
        b"print('encrypted')"
    );
    assert_eq!(exec.sent_matching("chmod +x").len(), 1);
    assert_eq!(
        exec.sent_matching("python3"),
        vec!["python3 '/root/encryptor_updated.py' '!manage' '5c427765-ff70-4e38-a1bb-8ab3f6a5bb8c'"]
    );
    assert_eq!(
        exec.sent_matching("kv put"),
        vec!["/opt/seagate/cortx/hare/bin/consul kv put sspl/config/STORAGE_ENCLOSURE/secret 'gAAAAABgIjs9Zx=='"]
    );

    Ok(())
}

#[tokio::test]
async fn test_update_threshold_values() -> Result<(), RasError> {
    let mut x = ras(ScriptedExec::new()
        .on("kv get sspl/config/STORAGE_ENCLOSURE/threshold", 0, "90\n")
        .on("kv get sspl/config/SYSTEM_INFORMATION/log_level", 0, "INFO\n"));

    assert!(
        x.update_threshold_values("sspl/config/STORAGE_ENCLOSURE", "threshold", KvValue::Int(90), true)
            .await?
    );
    assert!(
        !x.update_threshold_values("sspl/config/STORAGE_ENCLOSURE", "threshold", KvValue::Int(80), false)
            .await?
    );
    assert!(
        x.update_threshold_values("sspl/config/SYSTEM_INFORMATION", "log_level", "INFO".into(), false)
            .await?
    );

    assert_eq!(
        x.exec().sent_matching("kv put"),
        vec!["/opt/seagate/cortx/hare/bin/consul kv put sspl/config/STORAGE_ENCLOSURE/threshold '90'"]
    );

    Ok(())
}

#[tokio::test]
async fn test_sspl_state() -> Result<(), RasError> {
    let mut x = ras(ScriptedExec::new()
        .on_once("cat '/var/cortx/sspl/data/state.txt'", 0, "state=active\n")
        .on("cat '/var/cortx/sspl/data/state.txt'", 0, "state=degraded\n")
        .on("pcs status", 0, PCS_STATUS_FIXTURE));

    assert_eq!(x.get_sspl_state().await?, (true, "active".to_string()));
    assert_eq!(x.get_sspl_state().await?, (false, "degraded".to_string()));
    assert_eq!(
        x.get_sspl_state_pcs().await?,
        SsplState {
            masters: "srvnode-1".into(),
            slaves: "srvnode-2".into()
        }
    );

    Ok(())
}

#[tokio::test]
async fn test_sspl_state_pcs_without_section() {
    let mut x = ras(ScriptedExec::new().on("pcs status", 0, "Cluster name: cortxcluster\n"));

    assert!(matches!(x.get_sspl_state_pcs().await, Err(RasError::Parse(_))));
}

#[tokio::test]
async fn test_ipmitool_helpers() -> Result<(), RasError> {
    let mut x = ras(ScriptedExec::new()
        .on("ipmitool sel info", 0, SEL_INFO_FIXTURE)
        .on("ipmitool sdr list", 0, SDR_LIST_FIXTURE));

    assert_eq!(x.cal_sel_space().await?, 23);
    assert_eq!(x.get_fan_name().await?, Some("SYS FAN1".to_string()));

    let mut x = ras(ScriptedExec::new().fail("ipmitool", 1, "Could not open device\n"));

    assert_eq!(x.cal_sel_space().await?, 0);
    assert_eq!(x.get_fan_name().await?, None);

    Ok(())
}

#[tokio::test]
async fn test_restart_service() -> Result<(), RasError> {
    let mut x = ras(ScriptedExec::new().on(
        "systemctl status sspl-ll.service",
        0,
        "● sspl-ll.service - SSPL-LL\n   Active: active (running) since Tue 2021-02-09 07:01:12 UTC; 12s ago\n",
    ));

    let (ok, text) = x.restart_service("sspl-ll.service").await?;

    assert!(ok);
    assert!(text.contains("active (running)"));
    assert_eq!(
        x.exec().sent,
        vec![
            "pcs resource restart sspl-ll.service",
            "systemctl status sspl-ll.service"
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_enable_disable_service() -> Result<(), RasError> {
    let mut x = ras(ScriptedExec::new().on(
        "systemctl status kibana",
        3,
        "● kibana.service - Kibana\n   Active: inactive (dead)\n",
    ));

    let (ok, text) = x.enable_disable_service("disable", "kibana").await?;

    assert!(!ok);
    assert!(text.contains("inactive (dead)"));
    assert_eq!(x.exec().sent[0], "pcs resource disable kibana");

    Ok(())
}

const RUNNING: &str = "Active: active (running)\n";

const ALERT: &str = r#"{"username": "sspl-ll", "message": {"sensor_response_type": {"info": {"resource_type": "enclosure:fru:fan", "event_time": "1612854096"}, "alert_type": "fault", "severity": "critical"}}}"#;

#[tokio::test]
async fn test_alert_validation() -> Result<(), RasError> {
    let mut x = ras(ScriptedExec::new()
        .on("systemctl status", 0, RUNNING)
        .on("cat '/root/extracted_alert.log'", 0, ALERT));

    let r = x
        .alert_validation(&["enclosure:fru:fan", "fault", "critical"], true)
        .await?;

    assert_eq!(r, (true, "Fetched alerts successfully".to_string()));

    let exec = x.into_inner();

    assert_eq!(
        exec.sent,
        vec![
            "pcs resource restart sspl-master",
            "systemctl status sspl-ll.service",
            "systemctl status rabbitmq-server.service",
            "cp -f '/root/screenlog.0' '/root/alert.log'",
            "cat '/root/alert.log'",
            "grep 'enclosure:fru:fan' '/root/alert.log' > '/root/extracted_alert.log'",
            "cat '/root/extracted_alert.log'",
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_alert_validation_missing_pattern() -> Result<(), RasError> {
    let mut x = ras(ScriptedExec::new()
        .on("systemctl status", 0, RUNNING)
        .on("cat '/root/extracted_alert.log'", 0, ALERT));

    let r = x
        .alert_validation(&["enclosure:fru:fan", "fault_resolved"], false)
        .await?;

    assert_eq!(r, (false, "fault_resolved".to_string()));
    assert!(x.exec().sent_matching("pcs resource restart").is_empty());

    Ok(())
}

#[tokio::test]
async fn test_alert_validation_service_down() -> Result<(), RasError> {
    let mut x = ras(ScriptedExec::new()
        .on("systemctl status rabbitmq-server.service", 3, "Active: failed\n")
        .on("systemctl status", 0, RUNNING));

    let (ok, text) = x.alert_validation(&["enclosure:fru:fan"], false).await?;

    assert!(!ok);
    assert_eq!(text, "Active: failed\n");
    assert!(x.exec().sent_matching("cp -f").is_empty());

    Ok(())
}

#[tokio::test]
async fn test_validate_alert_msg() -> Result<(), RasError> {
    let mut x = ras(ScriptedExec::new().on("cat '/root/alert.log'", 0, ALERT));

    assert_eq!(
        x.validate_alert_msg("/root/alert.log", &["enclosure:fru:fan", "critical"])
            .await?,
        (true, "critical".to_string())
    );
    assert_eq!(
        x.validate_alert_msg("/root/alert.log", &["enclosure:fru:psu", "critical"])
            .await?,
        (false, "enclosure:fru:psu".to_string())
    );

    Ok(())
}

#[tokio::test]
async fn test_screen_and_rabbitmq_reader() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let reader = tmp.path().join("read_rabbitmq_msg.py");

    std::fs::write(&reader, "import pika")?;

    let mut cfg = RasConfig::default().without_waits();
    cfg.rabbitmq_reader_local_path = reader.to_string_lossy().to_string();

    let exec = ScriptedExec::new()
        .fail("rpm -qa | grep screen", 1, "")
        .on_once("test -e '/root/rabbitmq_reader.py'", 1, "");

    let mut x = RasCoreLib::new("srvnode-1", exec, cfg);

    assert!(
        x.start_rabbitmq_reader_cmd("sspl-out", "sensor-key", "sspl4ever")
            .await?
    );

    let exec = x.into_inner();

    assert_eq!(exec.files[&PathBuf::from("/root/rabbitmq_reader.py")], b"import pika");
    assert_eq!(exec.sent_matching("yum install -y screen").len(), 1);
    assert_eq!(
        exec.sent_matching("screen -d -m"),
        vec!["screen -d -m -L -S screen_RMQ python3 '/root/rabbitmq_reader.py' 'sspl-out' 'sensor-key' 'sspl4ever'"]
    );

    Ok(())
}

#[tokio::test]
async fn test_create_remote_dir_recursive() -> Result<(), RasError> {
    let mut x = ras(ScriptedExec::new().on("test -e '/root/a/b/c.py'", 1, ""));

    assert!(x.create_remote_dir_recursive("/root/a/b/c.py").await?);
    assert_eq!(x.exec().sent_matching("mkdir"), vec!["mkdir -p '/root/a/b'"]);

    Ok(())
}

#[tokio::test]
async fn test_simple_commands() -> Result<(), RasError> {
    let mut x = ras(ScriptedExec::new()
        .fail("truncate", 1, "truncate: cannot open '/nope/x'\n")
        .on("mdadm --detail", 0, "/dev/md0:\n   Raid Level : raid1\n"));

    assert_eq!(
        x.truncate_file("/nope/x").await?,
        (false, "truncate: cannot open '/nope/x'\n".to_string())
    );
    assert!(x.cp_file("/etc/a", "/etc/a.bak").await?.0);
    assert!(x.check_status_file().await?.0);

    let (ok, out) = x.run_mdadm_cmd(&["--detail", "/dev/md0"]).await?;

    assert!(ok);
    assert!(out.contains("raid1"));

    assert!(x.generate_log_err_alert("logger -i -p local3.err IEC: 038002001").await?.0);

    assert_eq!(
        x.exec().sent_matching("state=active"),
        vec!["echo 'state=active' > '/var/cortx/sspl/data/state.txt'"]
    );

    assert_eq!(
        RasCoreLib::<ScriptedExec>::validate_exec_time("3min 1.5s ago"),
        (false, "3min 1.5s ago".to_string())
    );

    Ok(())
}
