// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

//! REST client for the management console.
//!
//! [`RestS3User`] wraps the S3 account endpoints. Every call that talks to the
//! console logs in first and fails with a [`TestError`] tagged with an [`ErrorCode`].

mod s3_accounts;

pub use reqwest::{header, Client, Response, StatusCode, Url};
pub use s3_accounts::{
    verify_json_response, EditPayloadType, RestS3User, UserType, CSM_ADMIN_USER,
    NEW_S3_ACCOUNT_USER,
};

use qa_config::CsmConfig;
use std::{fmt, time::Duration};

#[derive(Debug, thiserror::Error)]
pub enum CsmClientError {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    InvalidHeaderValue(#[from] header::InvalidHeaderValue),
    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),
    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("No login user named {0} is configured")]
    UnknownUser(String),
    #[error("Login response did not contain an Authorization header")]
    MissingAuthHeader,
    #[error("Unknown payload type: {0}")]
    UnknownPayloadType(String),
}

/// Category of a failed REST step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The request itself could not be made
    CsmRestAuthenticationError,
    /// A verification helper could not complete
    CsmRestVerificationFailed,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::CsmRestAuthenticationError => write!(f, "CSM_REST_AUTHENTICATION_ERROR"),
            Self::CsmRestVerificationFailed => write!(f, "CSM_REST_VERIFICATION_FAILED"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{code}: {source}")]
pub struct TestError {
    pub code: ErrorCode,
    #[source]
    pub source: CsmClientError,
}

impl TestError {
    pub fn authentication(source: impl Into<CsmClientError>) -> Self {
        Self {
            code: ErrorCode::CsmRestAuthenticationError,
            source: source.into(),
        }
    }
    pub fn verification(source: impl Into<CsmClientError>) -> Self {
        Self {
            code: ErrorCode::CsmRestVerificationFailed,
            source: source.into(),
        }
    }
}

/// Get a client for the console. Test clusters usually run with self signed
/// certificates, so `accept_invalid_certs` is honoured.
pub fn get_client(config: &CsmConfig) -> Result<Client, CsmClientError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
        .map_err(CsmClientError::Reqwest)
}

/// Given a path, constructs a url under `base_url`.
/// A path prefix on `base_url`, e.g. behind a reverse proxy, is kept.
pub fn create_url(base_url: &str, path: impl ToString) -> Result<Url, CsmClientError> {
    let path = path.to_string();

    let mut base = Url::parse(base_url)?;

    if !base.path().ends_with('/') {
        let prefixed = format!("{}/", base.path());

        base.set_path(&prefixed);
    }

    Ok(base.join(path.trim_start_matches('/'))?)
}
