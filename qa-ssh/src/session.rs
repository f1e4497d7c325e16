// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

//! Opening and authenticating an SSH session.

use crate::Error;
use std::{path::Path, sync::Arc, time::Duration};
use thrussh::client::{self, Handle};
use thrussh_keys::{agent::client::AgentClient, key::PublicKey};

const DEFAULT_PORT: u16 = 22;

/// Key files tried by [`Auth::Auto`], in order
const DEFAULT_KEYS: &[&str] = &["id_rsa", "id_ed25519"];

/// How the client proves who it is
#[derive(Debug, Clone)]
pub enum Auth {
    /// Every identity the running ssh-agent offers
    Agent,
    Password(String),
    /// A private key file, optionally encrypted
    Key {
        key_path: String,
        password: Option<String>,
    },
    /// The default key files under `~/.ssh`
    Auto,
}

/// Session handler bound to one node
pub struct Client {
    pub host: String,
    pub port: Option<u16>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Ssh(#[from] thrussh::Error),
}

/// Unknown host keys are accepted with a warning, changed ones are refused.
fn accept_host_key(host: &str, port: u16, key: &PublicKey) -> bool {
    match thrussh_keys::check_known_hosts(host, port, key) {
        Ok(true) => true,
        Ok(false) => {
            tracing::warn!("{} is not in known_hosts, accepting its key", host);

            true
        }
        Err(thrussh_keys::Error::KeyChanged { line }) => {
            tracing::error!(
                "Host key of {} changed, see line {} of known_hosts",
                host,
                line
            );

            false
        }
        Err(e) => {
            tracing::warn!("Could not check the host key of {}: {}", host, e);

            true
        }
    }
}

impl client::Handler for Client {
    type Error = ClientError;
    type FutureUnit = futures::future::Ready<Result<(Self, client::Session), Self::Error>>;
    type FutureBool = futures::future::Ready<Result<(Self, bool), Self::Error>>;

    fn finished_bool(self, b: bool) -> Self::FutureBool {
        futures::future::ready(Ok((self, b)))
    }
    fn finished(self, session: client::Session) -> Self::FutureUnit {
        futures::future::ready(Ok((self, session)))
    }
    fn check_server_key(self, key: &PublicKey) -> Self::FutureBool {
        let accepted = accept_host_key(&self.host, self.port.unwrap_or(DEFAULT_PORT), key);

        self.finished_bool(accepted)
    }
}

async fn with_key_file(
    session: &mut Handle<Client>,
    user: &str,
    path: &Path,
    passphrase: Option<&str>,
) -> Result<bool, Error> {
    let key = thrussh_keys::load_secret_key(path, passphrase)?;

    Ok(session.authenticate_publickey(user, Arc::new(key)).await?)
}

async fn with_agent(session: &mut Handle<Client>, user: &str) -> Result<bool, Error> {
    let mut agent = AgentClient::connect_env().await?;

    for identity in agent.request_identities().await? {
        let (returned, authed) = session.authenticate_future(user, identity, agent).await;

        agent = returned;

        if authed.map_err(|_| Error::AuthenticationFailed)? {
            return Ok(true);
        }
    }

    Ok(false)
}

async fn with_default_keys(session: &mut Handle<Client>, user: &str) -> Result<bool, Error> {
    let dir = dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".ssh");

    if tokio::fs::metadata(&dir).await.is_err() {
        return Err(Error::NoSshDir);
    }

    for name in DEFAULT_KEYS {
        let path = dir.join(name);

        if tokio::fs::metadata(&path).await.is_err() {
            continue;
        }

        tracing::debug!("Trying {}", path.display());

        if with_key_file(session, user, &path, None).await? {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Open a session to `host` and authenticate as `user`.
///
/// `port` defaults to 22. The connection attempt gives up after 60 seconds.
pub async fn connect(
    host: impl ToString,
    port: impl Into<Option<u16>>,
    user: impl ToString,
    auth: Auth,
) -> Result<Handle<Client>, Error> {
    let host = host.to_string();
    let user = user.to_string();
    let port = port.into();

    let cfg = Arc::new(client::Config {
        connection_timeout: Some(Duration::from_secs(60)),
        ..Default::default()
    });

    let address = format!("{}:{}", host, port.unwrap_or(DEFAULT_PORT));

    tracing::debug!("Connecting to {} as {}", address, user);

    let mut session = client::connect(cfg, address, Client { host, port }).await?;

    let authed = match auth {
        Auth::Password(password) => session.authenticate_password(&user, password).await?,
        Auth::Key { key_path, password } => {
            with_key_file(&mut session, &user, Path::new(&key_path), password.as_deref()).await?
        }
        Auth::Agent => with_agent(&mut session, &user).await?,
        Auth::Auto => with_default_keys(&mut session, &user).await?,
    };

    if !authed {
        return Err(Error::AuthenticationFailed);
    }

    Ok(session)
}
