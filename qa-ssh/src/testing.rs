// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

//! A [`RemoteExec`] that answers from a script instead of a node.

use crate::{Error, Output, RemoteExec};
use futures::{future::BoxFuture, FutureExt};
use std::{collections::BTreeMap, path::PathBuf};

struct Rule {
    needle: String,
    output: Output,
    once: bool,
}

/// Answers each command with the output of the first rule whose needle the
/// command contains. Unmatched commands succeed with no output.
#[derive(Default)]
pub struct ScriptedExec {
    rules: Vec<Rule>,
    /// Every command received, in order
    pub sent: Vec<String>,
    /// Files streamed to the "remote" side
    pub files: BTreeMap<PathBuf, Vec<u8>>,
}

impl ScriptedExec {
    pub fn new() -> Self {
        Self::default()
    }
    fn rule(mut self, needle: &str, output: Output, once: bool) -> Self {
        self.rules.push(Rule {
            needle: needle.to_string(),
            output,
            once,
        });

        self
    }
    /// Answer commands containing `needle` with `stdout` and exit status `code`
    pub fn on(self, needle: &str, code: u32, stdout: &str) -> Self {
        self.rule(
            needle,
            Output {
                exit_status: Some(code),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
            false,
        )
    }
    /// Like [`on`](Self::on), but the rule is used up by the first match
    pub fn on_once(self, needle: &str, code: u32, stdout: &str) -> Self {
        self.rule(
            needle,
            Output {
                exit_status: Some(code),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
            true,
        )
    }
    /// Fail commands containing `needle` with `stderr`
    pub fn fail(self, needle: &str, code: u32, stderr: &str) -> Self {
        self.rule(
            needle,
            Output {
                exit_status: Some(code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
            false,
        )
    }
    /// Commands received that contain `needle`
    pub fn sent_matching(&self, needle: &str) -> Vec<&str> {
        self.sent
            .iter()
            .filter(|x| x.contains(needle))
            .map(|x| x.as_str())
            .collect()
    }
    fn answer(&mut self, cmd: &str) -> Output {
        let idx = self.rules.iter().position(|r| cmd.contains(&r.needle));

        match idx {
            Some(i) if self.rules[i].once => self.rules.remove(i).output,
            Some(i) => self.rules[i].output.clone(),
            None => Output {
                exit_status: Some(0),
                ..Output::default()
            },
        }
    }
}

impl RemoteExec for ScriptedExec {
    fn exec_cmd(&mut self, cmd: &str) -> BoxFuture<'_, Result<Output, Error>> {
        self.sent.push(cmd.to_string());

        let out = self.answer(cmd);

        async move { Ok(out) }.boxed()
    }
    fn stream_file(&mut self, data: Vec<u8>, to: PathBuf) -> BoxFuture<'_, Result<(), Error>> {
        self.files.insert(to, data);

        async move { Ok(()) }.boxed()
    }
}
