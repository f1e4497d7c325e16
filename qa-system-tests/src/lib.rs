// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

//! Helpers for the support bundle system tests.
//!
//! The suites themselves live under `tests/` and need a live cluster, so they
//! are ignored by default. Run them with `cargo test -- --ignored` once
//! `QA_CONFIG_DIR` points at a real cluster config.

pub mod support_bundle;

pub use support_bundle::{
    bundle_tar_name, create_support_bundles_parallel, BundlePaths, SupportBundle,
};

#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error(transparent)]
    Ssh(#[from] qa_ssh::Error),
    #[error(transparent)]
    Ras(#[from] qa_ras::RasError),
    #[error(transparent)]
    Config(#[from] qa_config::ConfigError),
    #[error("{0}")]
    Setup(String),
    /// A scenario check did not hold
    #[error("{0}")]
    Check(String),
}
