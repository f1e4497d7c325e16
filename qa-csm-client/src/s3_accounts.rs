// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

use crate::{create_url, get_client, CsmClientError, TestError};
use qa_config::CsmConfig;
use reqwest::{
    header::{self, HeaderMap},
    Client, Response, StatusCode,
};
use serde_json::{json, Value};
use std::{
    fmt,
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

/// Login user every call uses unless told otherwise
pub const CSM_ADMIN_USER: &str = "csm_admin_user";
/// Key under which a freshly created account is remembered as a login user
pub const NEW_S3_ACCOUNT_USER: &str = "new_s3_account_user";

const S3_ACCOUNTS: &str = "s3_accounts";
const ACC_NAME: &str = "account_name";
const ACC_EMAIL: &str = "account_email";
const ACCESS_KEY: &str = "access_key";
const SECRET_KEY: &str = "secret_key";

/// Kind of account payload to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserType {
    PreDefine,
    Valid,
    Duplicate,
    Missing,
    Invalid,
    InvalidForUi,
}

impl UserType {
    /// Types `create_and_verify_s3account` knows how to check
    fn verifiable(self) -> bool {
        matches!(
            self,
            Self::Valid | Self::Duplicate | Self::Invalid | Self::Missing
        )
    }
}

impl FromStr for UserType {
    type Err = CsmClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre-define" => Ok(Self::PreDefine),
            "valid" => Ok(Self::Valid),
            "duplicate" => Ok(Self::Duplicate),
            "missing" => Ok(Self::Missing),
            "invalid" => Ok(Self::Invalid),
            "invalid_for_ui" => Ok(Self::InvalidForUi),
            x => Err(CsmClientError::UnknownPayloadType(x.to_string())),
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let x = match self {
            Self::PreDefine => "pre-define",
            Self::Valid => "valid",
            Self::Duplicate => "duplicate",
            Self::Missing => "missing",
            Self::Invalid => "invalid",
            Self::InvalidForUi => "invalid_for_ui",
        };

        write!(f, "{}", x)
    }
}

/// Kind of PATCH payload to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPayloadType {
    Valid,
    UnchangedAccess,
    OnlyResetAccessKey,
    OnlyPassword,
    NoPayload,
}

impl FromStr for EditPayloadType {
    type Err = CsmClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "valid" => Ok(Self::Valid),
            "unchanged_access" => Ok(Self::UnchangedAccess),
            "only_reset_access_key" => Ok(Self::OnlyResetAccessKey),
            "only_password" => Ok(Self::OnlyPassword),
            "no_payload" => Ok(Self::NoPayload),
            x => Err(CsmClientError::UnknownPayloadType(x.to_string())),
        }
    }
}

/// Does `actual` hold every key of `expected` with an equal value
pub fn verify_json_response(actual: &Value, expected: &Value) -> bool {
    match (actual.as_object(), expected.as_object()) {
        (Some(actual), Some(expected)) => expected
            .iter()
            .all(|(k, v)| actual.get(k).map(|x| x == v).unwrap_or(false)),
        _ => false,
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn has_key(v: &Value, k: &str) -> bool {
    v.get(k).is_some()
}

/// Check a create response against the payload that produced it
fn check_created_account(created: &Value, resp: &Value) -> bool {
    if !has_key(resp, ACCESS_KEY) && !has_key(resp, SECRET_KEY) {
        tracing::debug!("secret key and access key are not present");

        return false;
    }

    if resp.get(ACC_NAME) != created.get(ACC_NAME) {
        tracing::debug!("Mismatched account name");

        return false;
    }

    if resp.get(ACC_EMAIL) != created.get(ACC_EMAIL) {
        tracing::debug!("Mismatched email address");

        return false;
    }

    true
}

/// S3 account operations against the management console
pub struct RestS3User {
    config: CsmConfig,
    client: Client,
    headers: HeaderMap,
    /// Payload of the last account this client tried to create
    pub recently_created_s3_account_user: Option<Value>,
    /// Payload of the last PATCH this client sent
    pub recent_patch_payload: Option<Value>,
}

impl RestS3User {
    pub fn new(config: CsmConfig) -> Result<Self, TestError> {
        let client = get_client(&config).map_err(TestError::authentication)?;

        Ok(Self {
            config,
            client,
            headers: HeaderMap::new(),
            recently_created_s3_account_user: None,
            recent_patch_payload: None,
        })
    }

    pub fn config(&self) -> &CsmConfig {
        &self.config
    }

    /// Log in as the configured user `login_as` and keep the returned
    /// `Authorization` header for the following calls.
    pub async fn authenticate_and_login(&mut self, login_as: &str) -> Result<(), TestError> {
        self.login(login_as)
            .await
            .map_err(TestError::authentication)
    }

    async fn login(&mut self, login_as: &str) -> Result<(), CsmClientError> {
        let user = self
            .config
            .users
            .get(login_as)
            .ok_or_else(|| CsmClientError::UnknownUser(login_as.to_string()))?;

        let url = create_url(&self.config.base_url, &self.config.login_endpoint)?;

        tracing::debug!("Logging in as {} at {}", login_as, url);

        let resp = self
            .client
            .post(url)
            .json(&json!({
                "username": user.username,
                "password": user.password,
            }))
            .send()
            .await?;

        let token = resp
            .headers()
            .get(header::AUTHORIZATION)
            .ok_or(CsmClientError::MissingAuthHeader)?
            .clone();

        self.headers.clear();
        self.headers.insert(header::AUTHORIZATION, token);

        Ok(())
    }

    fn accounts_path(&self, username: Option<&str>) -> String {
        match username {
            Some(u) => format!("{}/{}", self.config.s3accounts_endpoint, u),
            None => self.config.s3accounts_endpoint.to_string(),
        }
    }

    /// Build the account payload for `user_type`.
    ///
    /// `Duplicate` creates a valid account first and hands back its payload.
    pub async fn create_payload_for_new_s3_account(
        &mut self,
        user_type: UserType,
    ) -> Result<Value, TestError> {
        self.payload_for(user_type)
            .await
            .map_err(TestError::verification)
    }

    async fn payload_for(&mut self, user_type: UserType) -> Result<Value, CsmClientError> {
        let password = self.config.test_s3account_password.clone();

        let x = match user_type {
            UserType::PreDefine => {
                tracing::debug!("Creating s3 account pre-defined in config");

                let u = &self.config.s3account_user;

                json!({
                    ACC_NAME: u.username,
                    ACC_EMAIL: u.email,
                    "password": u.password,
                })
            }
            UserType::Valid => self.valid_payload(),
            UserType::Duplicate => {
                let payload = self.valid_payload();

                self.post_account(payload, false, CSM_ADMIN_USER).await?;

                self.recently_created_s3_account_user
                    .clone()
                    .unwrap_or(Value::Null)
            }
            UserType::Missing => json!({ "password": password }),
            UserType::Invalid => json!({
                "user_name": "xys",
                "mail": "abc@email.com",
                "pass_word": "password",
            }),
            UserType::InvalidForUi => json!({
                ACC_NAME: "*ask%^*&",
                ACC_EMAIL: "seagate*mail-com",
                "password": "password",
            }),
        };

        Ok(x)
    }

    fn valid_payload(&self) -> Value {
        let ts = epoch_secs();

        json!({
            ACC_NAME: format!("test{}", ts),
            ACC_EMAIL: format!("test{}@{}", ts, self.config.email_domain),
            "password": self.config.test_s3account_password,
        })
    }

    /// PATCH payload for `payload_type`. `reset_access_key` is sent as a string.
    pub fn edit_user_payload(&self, payload_type: EditPayloadType) -> Value {
        let password = &self.config.test_s3account_password;

        match payload_type {
            EditPayloadType::Valid => json!({
                "password": password,
                "reset_access_key": "true",
            }),
            EditPayloadType::UnchangedAccess => json!({
                "password": password,
                "reset_access_key": "false",
            }),
            EditPayloadType::OnlyResetAccessKey => json!({ "reset_access_key": "true" }),
            EditPayloadType::OnlyPassword => json!({ "password": password }),
            EditPayloadType::NoPayload => json!({}),
        }
    }

    /// Remember `payload`, optionally as the `new_s3_account_user` login, and POST it.
    async fn post_account(
        &mut self,
        payload: Value,
        save_new_user: bool,
        login_as: &str,
    ) -> Result<Response, CsmClientError> {
        self.login(login_as).await?;

        tracing::debug!("Payload for s3 accounts is {}", payload);

        if save_new_user {
            let name = payload.get(ACC_NAME).and_then(Value::as_str).unwrap_or("");
            let password = payload
                .get("password")
                .and_then(Value::as_str)
                .unwrap_or("");

            tracing::debug!("Saving s3 account {} as {}", name, NEW_S3_ACCOUNT_USER);

            self.config.update_user(NEW_S3_ACCOUNT_USER, name, password);
        }

        self.recently_created_s3_account_user = Some(payload.clone());

        let url = create_url(&self.config.base_url, self.accounts_path(None))?;

        let resp = self
            .client
            .post(url)
            .headers(self.headers.clone())
            .json(&payload)
            .send()
            .await?;

        tracing::debug!("Resp: {:?}", resp);

        Ok(resp)
    }

    async fn create(
        &mut self,
        user_type: UserType,
        save_new_user: bool,
        login_as: &str,
    ) -> Result<Response, CsmClientError> {
        let payload = self.payload_for(user_type).await?;

        self.post_account(payload, save_new_user, login_as).await
    }

    /// Create a new s3 account from the `user_type` payload, logged in as `login_as`
    pub async fn create_s3_account(
        &mut self,
        user_type: UserType,
        save_new_user: bool,
        login_as: &str,
    ) -> Result<Response, TestError> {
        self.create(user_type, save_new_user, login_as)
            .await
            .map_err(TestError::authentication)
    }

    async fn list(&mut self, login_as: &str) -> Result<Response, CsmClientError> {
        self.login(login_as).await?;

        let url = create_url(&self.config.base_url, self.accounts_path(None))?;

        tracing::debug!("GET to {}", url);

        let resp = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await?;

        Ok(resp)
    }

    /// List every s3 account, logged in as `login_as`
    pub async fn list_all_created_s3account(
        &mut self,
        login_as: &str,
    ) -> Result<Response, TestError> {
        self.list(login_as)
            .await
            .map_err(TestError::authentication)
    }

    async fn patch(
        &mut self,
        username: &str,
        payload: Value,
        login_as: &str,
    ) -> Result<Response, CsmClientError> {
        self.login(login_as).await?;

        let url = create_url(&self.config.base_url, self.accounts_path(Some(username)))?;

        tracing::debug!("PATCH to {} with {}", url, payload);

        self.recent_patch_payload = Some(payload.clone());

        let resp = self
            .client
            .patch(url)
            .headers(self.headers.clone())
            .json(&payload)
            .send()
            .await?;

        Ok(resp)
    }

    /// Edit `username` with the `payload_type` payload, logged in as `login_as`
    pub async fn edit_s3_account_user(
        &mut self,
        username: &str,
        payload_type: EditPayloadType,
        login_as: &str,
    ) -> Result<Response, TestError> {
        let payload = self.edit_user_payload(payload_type);

        self.patch(username, payload, login_as)
            .await
            .map_err(TestError::authentication)
    }

    /// Edit `username` with an arbitrary payload, as the admin user
    pub async fn edit_s3_account_user_invalid_password(
        &mut self,
        username: &str,
        payload: Value,
    ) -> Result<Response, TestError> {
        self.patch(username, payload, CSM_ADMIN_USER)
            .await
            .map_err(TestError::authentication)
    }

    async fn delete(&mut self, username: &str, login_as: &str) -> Result<Response, CsmClientError> {
        self.login(login_as).await?;

        let url = create_url(&self.config.base_url, self.accounts_path(Some(username)))?;

        tracing::debug!("DELETE to {}", url);

        let resp = self
            .client
            .delete(url)
            .headers(self.headers.clone())
            .send()
            .await?;

        Ok(resp)
    }

    pub async fn delete_s3_account_user(
        &mut self,
        username: &str,
        login_as: &str,
    ) -> Result<Response, TestError> {
        self.delete(username, login_as)
            .await
            .map_err(TestError::authentication)
    }

    /// List accounts and check each one carries a name and an email.
    ///
    /// With `expect_no_user`, or when the list is empty, passes only if both hold.
    pub async fn verify_list_s3account_details(
        &mut self,
        expect_no_user: bool,
    ) -> Result<bool, TestError> {
        self.verify_list(expect_no_user)
            .await
            .map_err(TestError::verification)
    }

    async fn verify_list(&mut self, expect_no_user: bool) -> Result<bool, CsmClientError> {
        let resp = self.list(CSM_ADMIN_USER).await?;

        if resp.status() != StatusCode::OK {
            tracing::debug!("Response is not 200");

            return Ok(false);
        }

        let body: Value = resp.json().await?;

        let accounts = match body.get(S3_ACCOUNTS).and_then(Value::as_array) {
            Some(xs) => xs,
            None => {
                tracing::error!("No {} in response", S3_ACCOUNTS);

                return Ok(false);
            }
        };

        if accounts.is_empty() || expect_no_user {
            tracing::warn!("Accounts present: {}", accounts.len());

            return Ok(accounts.is_empty() && expect_no_user);
        }

        Ok(accounts
            .iter()
            .all(|x| has_key(x, ACC_NAME) && has_key(x, ACC_EMAIL)))
    }

    /// Create a `user_type` account and check the response.
    ///
    /// Only valid, duplicate, invalid and missing are accepted. Anything other than
    /// valid is judged on the status code alone.
    pub async fn create_and_verify_s3account(
        &mut self,
        user_type: UserType,
        expected_status: u16,
    ) -> Result<bool, TestError> {
        self.create_and_verify(user_type, expected_status)
            .await
            .map_err(TestError::verification)
    }

    async fn create_and_verify(
        &mut self,
        user_type: UserType,
        expected_status: u16,
    ) -> Result<bool, CsmClientError> {
        if !user_type.verifiable() {
            tracing::error!("Invalid user type {}", user_type);

            return Ok(false);
        }

        let resp = self.create(user_type, false, CSM_ADMIN_USER).await?;

        if user_type != UserType::Valid {
            tracing::debug!("verify status code for user {}", user_type);

            return Ok(resp.status().as_u16() == expected_status);
        }

        if resp.status().as_u16() != expected_status {
            tracing::debug!("Response is not {}", expected_status);

            return Ok(false);
        }

        let body: Value = resp.json().await?;

        let created = self
            .recently_created_s3_account_user
            .clone()
            .unwrap_or(Value::Null);

        if !check_created_account(&created, &body) {
            return Ok(false);
        }

        tracing::debug!("verifying newly created account data in created list");

        let expected = json!({
            ACC_EMAIL: body.get(ACC_EMAIL),
            ACC_NAME: body.get(ACC_NAME),
        });

        let listed: Value = self.list(CSM_ADMIN_USER).await?.json().await?;

        Ok(listed
            .get(S3_ACCOUNTS)
            .and_then(Value::as_array)
            .map(|xs| xs.iter().any(|x| verify_json_response(x, &expected)))
            .unwrap_or(false))
    }

    /// Create a fresh account, then edit it as itself with the `payload_type` payload.
    pub async fn edit_and_verify_s3_account_user(
        &mut self,
        payload_type: EditPayloadType,
    ) -> Result<bool, TestError> {
        self.edit_and_verify(payload_type)
            .await
            .map_err(TestError::verification)
    }

    fn recent_account_name(&self) -> String {
        self.recently_created_s3_account_user
            .as_ref()
            .and_then(|x| x.get(ACC_NAME))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    async fn edit_and_verify(&mut self, payload_type: EditPayloadType) -> Result<bool, CsmClientError> {
        self.create(UserType::Valid, true, CSM_ADMIN_USER).await?;

        let account_name = self.recent_account_name();

        tracing::debug!("editing user {} with {:?}", account_name, payload_type);

        let payload = self.edit_user_payload(payload_type);

        let resp = self
            .patch(&account_name, payload, NEW_S3_ACCOUNT_USER)
            .await?;

        let status = resp.status();

        match payload_type {
            EditPayloadType::UnchangedAccess | EditPayloadType::OnlyPassword => {
                if status != StatusCode::OK {
                    tracing::debug!("Response is not 200");

                    return Ok(false);
                }

                let body: Value = resp.json().await?;

                Ok(body.get(ACC_NAME).and_then(Value::as_str) == Some(account_name.as_str())
                    && !has_key(&body, ACCESS_KEY)
                    && !has_key(&body, SECRET_KEY))
            }
            EditPayloadType::OnlyResetAccessKey | EditPayloadType::NoPayload => {
                tracing::debug!("verify status code for payload {:?}", payload_type);

                Ok(status == StatusCode::BAD_REQUEST)
            }
            EditPayloadType::Valid => {
                if status != StatusCode::OK {
                    tracing::debug!("Response is not 200");

                    return Ok(false);
                }

                let body: Value = resp.json().await?;

                if !has_key(&body, ACCESS_KEY) && !has_key(&body, SECRET_KEY) {
                    tracing::debug!("secret key and access key are not present");

                    return Ok(false);
                }

                Ok(body.get(ACC_NAME).and_then(Value::as_str) == Some(account_name.as_str()))
            }
        }
    }

    /// Create a fresh account and delete it as itself
    pub async fn delete_and_verify_s3_account_user(&mut self) -> Result<bool, TestError> {
        self.delete_and_verify()
            .await
            .map_err(TestError::verification)
    }

    async fn delete_and_verify(&mut self) -> Result<bool, CsmClientError> {
        self.create(UserType::Valid, true, CSM_ADMIN_USER).await?;

        let account_name = self.recent_account_name();

        tracing::debug!("deleting new s3 account {}", account_name);

        let resp = self.delete(&account_name, NEW_S3_ACCOUNT_USER).await?;

        if resp.status() != StatusCode::OK {
            tracing::debug!("Response is not 200");

            return Ok(false);
        }

        let body: Value = resp.json().await?;

        Ok(body.get("message").and_then(Value::as_str)
            == Some(self.config.delete_success_msg.as_str()))
    }
}
