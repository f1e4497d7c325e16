mod common;

use qa_ssh::{RemoteExec as _, RemoteFsExt as _};

#[tokio::test]
async fn test_successful_remote_command() -> Result<(), Box<dyn std::error::Error>> {
    qa_tracing::init();

    let port = common::start_server().await?;

    let mut handle = common::connect(port).await?;

    let out = handle.exec_cmd("echo This is a test!").await?;

    assert!(out.success());
    assert_eq!(out.stdout, "This is a test!\n");

    Ok(())
}

#[tokio::test]
async fn test_remote_command_errored() -> Result<(), Box<dyn std::error::Error>> {
    let port = common::start_server().await?;

    let mut handle = common::connect(port).await?;

    let out = handle.exec_cmd("ls /unknown-file-for-qa-ssh").await?;

    assert!(!out.success());

    let (ok, msg) = out.into_pair();

    assert!(!ok);
    assert!(msg.contains("unknown-file-for-qa-ssh"));

    Ok(())
}

#[tokio::test]
async fn test_bad_password_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let port = common::start_server().await?;

    let r = qa_ssh::connect(
        "127.0.0.1",
        port,
        "root",
        qa_ssh::Auth::Password("wrong".into()),
    )
    .await;

    assert!(matches!(r, Err(qa_ssh::Error::AuthenticationFailed)));

    Ok(())
}

#[tokio::test]
async fn test_remote_fs_operations() -> Result<(), Box<dyn std::error::Error>> {
    let port = common::start_server().await?;
    let tmp = tempfile::tempdir()?;
    let root = tmp.path().to_string_lossy().to_string();

    let mut handle = common::connect(port).await?;

    let bundle_dir = format!("{}/var/log/seagate/support_bundle", root);

    assert!(!handle.path_exists(&bundle_dir).await?);
    assert!(handle.make_dir(&bundle_dir).await?);
    assert!(handle.path_exists(&bundle_dir).await?);

    std::fs::write(format!("{}/s3_bundle_0.tar.gz", bundle_dir), b"0123456789")?;
    std::fs::write(format!("{}/.hidden", bundle_dir), b"")?;

    let mut xs = handle.list_dir(&bundle_dir).await?;
    xs.sort();

    assert_eq!(xs, vec![".hidden", "s3_bundle_0.tar.gz"]);

    let file = format!("{}/s3_bundle_0.tar.gz", bundle_dir);

    let stat = handle.stat(&file).await?;

    assert_eq!(stat.size, 10);
    assert!(stat.mtime > 0);

    assert_eq!(handle.read_file(&file).await?, "0123456789");

    let (ok, lines) = handle.exec_lines(&format!("ls -1 {}", bundle_dir)).await?;

    assert!(ok);
    assert_eq!(lines, vec!["s3_bundle_0.tar.gz"]);

    assert!(handle.remove_path(&format!("{}/var", root)).await?);
    assert!(!handle.path_exists(&bundle_dir).await?);

    assert!(handle.list_dir(&bundle_dir).await.is_err());

    Ok(())
}
