// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

use tokio::signal::unix::{signal, SignalKind};
pub use tracing;
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// Initialize logging by reading the `RUST_LOG` environment variable.
/// When called inside a tokio runtime, signal handlers are set up as well:
///
/// - `SIGUSR1` will set log level to info.
/// - `SIGUSR2` will set log level to debug.
///
/// Returns `false` if a global subscriber was already installed. Suites call this
/// from every test, so a second call is not an error.
pub fn init() -> bool {
    let builder = Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_filter_reloading();

    let handle = builder.reload_handle();

    if builder.try_init().is_err() {
        return false;
    }

    if tokio::runtime::Handle::try_current().is_err() {
        return true;
    }

    let handle2 = handle.clone();

    tokio::spawn(async move {
        let mut stream = match signal(SignalKind::user_defined1()) {
            Ok(x) => x,
            Err(e) => {
                tracing::warn!("Could not listen to SIGUSR1: {}", e);
                return;
            }
        };

        while stream.recv().await.is_some() {
            if let Err(e) = handle2.reload("info") {
                tracing::warn!("Could not reload log filter: {}", e);
            }
        }
    });

    tokio::spawn(async move {
        let mut stream = match signal(SignalKind::user_defined2()) {
            Ok(x) => x,
            Err(e) => {
                tracing::warn!("Could not listen to SIGUSR2: {}", e);
                return;
            }
        };

        while stream.recv().await.is_some() {
            if let Err(e) = handle.reload("debug") {
                tracing::warn!("Could not reload log filter: {}", e);
            }
        }
    });

    true
}

#[cfg(test)]
mod tests {
    #[tokio::test]
    async fn test_init_twice() {
        super::init();

        assert!(!super::init());
    }
}
