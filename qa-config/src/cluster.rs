// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

use crate::ConfigError;

fn default_port() -> u16 {
    crate::get_ssh_port()
}

fn default_user() -> String {
    "root".to_string()
}

/// A node of the cluster under test
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeConfig {
    pub host: String,
    /// SSH port
    #[serde(default = "default_port")]
    pub port: u16,
    /// SSH user
    #[serde(default = "default_user")]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Private key used instead of a password
    #[serde(default)]
    pub key_path: Option<String>,
    #[serde(default)]
    pub key_passphrase: Option<String>,
}

impl From<&NodeConfig> for qa_ssh::Auth {
    fn from(cfg: &NodeConfig) -> Self {
        if let Some(pw) = &cfg.password {
            Self::Password(pw.to_string())
        } else if let Some(key_path) = &cfg.key_path {
            Self::Key {
                key_path: key_path.to_string(),
                password: cfg.key_passphrase.as_ref().map(|x| x.to_string()),
            }
        } else {
            Self::Auto
        }
    }
}

impl NodeConfig {
    /// Open an SSH session to this node
    pub async fn connect(&self) -> Result<qa_ssh::Handle<qa_ssh::Client>, qa_ssh::Error> {
        qa_ssh::connect(&self.host, self.port, &self.username, self.into()).await
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClusterConfig {
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

impl ClusterConfig {
    /// The node tests run against by default
    pub fn primary(&self) -> Result<&NodeConfig, ConfigError> {
        self.node(0)
    }

    pub fn node(&self, idx: usize) -> Result<&NodeConfig, ConfigError> {
        self.nodes.get(idx).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "cluster config has {} node(s), node {} was requested",
                self.nodes.len(),
                idx
            ))
        })
    }
}
