// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

use std::collections::BTreeMap;

fn default_base_url() -> String {
    "https://localhost:28100".to_string()
}

fn default_login_endpoint() -> String {
    "/api/v1/login".to_string()
}

fn default_s3accounts_endpoint() -> String {
    "/api/v1/s3accounts".to_string()
}

fn default_delete_success_msg() -> String {
    "Account Deleted Successfully.".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_email_domain() -> String {
    "seagate.com".to_string()
}

/// Credentials of a management console user
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LoginUser {
    pub username: String,
    pub password: String,
}

/// The pre-defined S3 account used by `pre-define` payloads
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct S3AccountUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Settings for the management console REST client
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CsmConfig {
    /// Console root. Endpoints are appended to its path, so a proxy prefix is kept.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_login_endpoint")]
    pub login_endpoint: String,
    #[serde(default = "default_s3accounts_endpoint")]
    pub s3accounts_endpoint: String,
    #[serde(default)]
    pub test_s3account_password: String,
    #[serde(default)]
    pub s3account_user: S3AccountUser,
    /// Domain used for generated account emails
    #[serde(default = "default_email_domain")]
    pub email_domain: String,
    /// Login users keyed by the name tests refer to them with, e.g. `csm_admin_user`
    #[serde(default)]
    pub users: BTreeMap<String, LoginUser>,
    #[serde(default = "default_delete_success_msg")]
    pub delete_success_msg: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Test clusters run with self signed certificates
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
}

impl Default for CsmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_endpoint: default_login_endpoint(),
            s3accounts_endpoint: default_s3accounts_endpoint(),
            test_s3account_password: String::new(),
            s3account_user: S3AccountUser::default(),
            email_domain: default_email_domain(),
            users: BTreeMap::new(),
            delete_success_msg: default_delete_success_msg(),
            timeout_secs: default_timeout_secs(),
            accept_invalid_certs: true,
        }
    }
}

impl CsmConfig {
    /// Record (or replace) a login user. Used when a test creates an account and
    /// later logs in as it.
    pub fn update_user(&mut self, key: &str, username: &str, password: &str) {
        self.users.insert(
            key.to_string(),
            LoginUser {
                username: username.to_string(),
                password: password.to_string(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_gets_defaults() {
        let cfg: CsmConfig = serde_yaml::from_str(
            r#"
base_url: https://10.230.246.58:28100
test_s3account_password: Seagate@1
users:
  csm_admin_user:
    username: admin
    password: Seagate@1
"#,
        )
        .unwrap();

        assert_eq!(cfg.s3accounts_endpoint, "/api/v1/s3accounts");
        assert_eq!(cfg.delete_success_msg, "Account Deleted Successfully.");
        assert_eq!(cfg.timeout_secs, 60);
        assert!(cfg.accept_invalid_certs);
        assert_eq!(cfg.users["csm_admin_user"].username, "admin");
    }

    #[test]
    fn test_update_user() {
        let mut cfg = CsmConfig::default();

        cfg.update_user("new_s3_account_user", "test1612345678", "Seagate@1");
        cfg.update_user("new_s3_account_user", "test1612345679", "Seagate@2");

        assert_eq!(cfg.users.len(), 1);
        assert_eq!(
            cfg.users["new_s3_account_user"],
            LoginUser {
                username: "test1612345679".into(),
                password: "Seagate@2".into()
            }
        );
    }
}
