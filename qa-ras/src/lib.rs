// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

//! RAS helpers: KV store updates, sspl health and alert checks on a cluster node.

pub mod commands;
pub mod health;
pub mod parse;
mod ras_core;

pub use crate::ras_core::RasCoreLib;
pub use parse::{KvValue, SsplState};

#[derive(Debug, thiserror::Error)]
pub enum RasError {
    #[error(transparent)]
    Ssh(#[from] qa_ssh::Error),
    #[error("Could not parse {0}")]
    Parse(String),
}
