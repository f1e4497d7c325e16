// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

//! YAML driven configuration for the QA harness.
//!
//! Every suite reads its settings from a directory of YAML files. The directory is
//! taken from `QA_CONFIG_DIR`, falling back to `config/`.

pub mod cluster;
pub mod csm;
pub mod ras;
pub mod support_bundle;

pub use cluster::{ClusterConfig, NodeConfig};
pub use csm::{CsmConfig, LoginUser, S3AccountUser};
pub use ras::{RasConfig, SsplAlertConfig, SsplAlertFiles, SsplAlertServices};
pub use support_bundle::{fill_template, BundleCase, SupportBundleConfig};

use serde::de::DeserializeOwned;
use std::{
    env, io,
    path::{Path, PathBuf},
};

pub const CLUSTER_FILE: &str = "cluster.yaml";
pub const CSM_FILE: &str = "csm.yaml";
pub const RAS_FILE: &str = "ras.yaml";
pub const SUPPORT_BUNDLE_FILE: &str = "support_bundle.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not read {0}: {1}")]
    Io(PathBuf, #[source] io::Error),
    #[error("Could not parse {0}: {1}")]
    Yaml(PathBuf, #[source] serde_yaml::Error),
    #[error("{0} environment variable is required.")]
    MissingVar(String),
    #[error("{0}")]
    Invalid(String),
}

/// Get the environment variable
pub fn get_var(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

/// Get the SSH port from `QA_SSH_PORT` or fall back to 22
pub fn get_ssh_port() -> u16 {
    get_var("QA_SSH_PORT")
        .ok()
        .and_then(|x| x.parse().ok())
        .unwrap_or(22)
}

/// Directory holding the YAML files
pub fn get_config_dir() -> PathBuf {
    env::var("QA_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"))
}

pub fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();

    tracing::debug!("Reading config {}", path.display());

    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.into(), e))?;

    serde_yaml::from_str(&raw).map_err(|e| ConfigError::Yaml(path.into(), e))
}

/// Load `file_name` out of the configured directory
pub fn load_from_dir<T: DeserializeOwned>(file_name: &str) -> Result<T, ConfigError> {
    load_yaml(get_config_dir().join(file_name))
}

pub fn cluster() -> Result<ClusterConfig, ConfigError> {
    load_from_dir(CLUSTER_FILE)
}

pub fn csm() -> Result<CsmConfig, ConfigError> {
    load_from_dir(CSM_FILE)
}

pub fn ras() -> Result<RasConfig, ConfigError> {
    load_from_dir(RAS_FILE)
}

pub fn support_bundle() -> Result<SupportBundleConfig, ConfigError> {
    load_from_dir(SUPPORT_BUNDLE_FILE)
}
