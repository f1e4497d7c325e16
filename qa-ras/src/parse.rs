// Copyright (c) 2021 DDN. All rights reserved.
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file.

//! Pure parsers for the text the RAS commands print.

use std::fmt;

/// sspl placement reported by `pcs status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsplState {
    pub masters: String,
    pub slaves: String,
}

/// A value stored in the KV store, compared the way it was written
#[derive(Debug, Clone, PartialEq)]
pub enum KvValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for KvValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Int(x) => write!(f, "{}", x),
            Self::Float(x) => write!(f, "{}", x),
            Self::Str(x) => write!(f, "{}", x),
        }
    }
}

impl From<i64> for KvValue {
    fn from(x: i64) -> Self {
        Self::Int(x)
    }
}

impl From<f64> for KvValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for KvValue {
    fn from(x: &str) -> Self {
        Self::Str(x.to_string())
    }
}

impl KvValue {
    /// Does the raw `kv get` output hold this value.
    /// Numbers must parse, strings are compared trimmed.
    pub fn matches(&self, raw: &str) -> bool {
        let raw = raw.trim();

        match self {
            Self::Int(x) => raw.parse::<i64>().map(|r| r == *x).unwrap_or(false),
            Self::Float(x) => raw
                .parse::<f64>()
                .map(|r| (r - x).abs() < f64::EPSILON)
                .unwrap_or(false),
            Self::Str(x) => x.trim() == raw,
        }
    }
}

/// Collapse every run of whitespace into one space and trim the ends
pub fn collapse_ws(x: &str) -> String {
    x.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The last whitespace separated token
pub fn last_token(x: &str) -> Option<&str> {
    x.split_whitespace().last()
}

/// Cluster id out of `salt-call grains.get cluster_id`
pub fn parse_cluster_id(x: &str) -> Option<String> {
    last_token(x).map(|x| x.to_string())
}

/// Encrypted secret out of the encryptor output. The script prints a python
/// bytes literal, so a `b'...'` wrapper and any quotes are dropped.
pub fn parse_encrypted_pwd(x: &str) -> Option<String> {
    let token = last_token(x)?;

    let token = if token.starts_with("b'") && token.ends_with('\'') && token.len() >= 3 {
        &token[2..token.len() - 1]
    } else {
        token
    };

    Some(token.replace('\'', ""))
}

/// State out of the sspl `state=<x>` file
pub fn parse_sspl_state(x: &str) -> String {
    x.trim().split('=').last().unwrap_or_default().to_string()
}

fn bracketed(x: &str) -> Option<String> {
    let start = x.find('[')?;
    let end = x.rfind(']')?;

    if end <= start {
        return None;
    }

    Some(collapse_ws(&x[start + 1..end]))
}

/// Master and slave nodes listed under `section` in `pcs status` output
pub fn parse_sspl_state_pcs(lines: &[String], section: &str) -> Option<SsplState> {
    let idx = lines.iter().position(|l| l.trim() == section.trim())?;

    let masters = bracketed(lines.get(idx + 1)?)?;
    let slaves = bracketed(lines.get(idx + 2)?)?;

    Some(SsplState { masters, slaves })
}

/// Used SEL space in percent out of `ipmitool sel info`
pub fn parse_sel_percent_used(lines: &[String]) -> Option<u32> {
    let line = lines.iter().find(|l| l.contains("Percent Used"))?;

    line.split(':')
        .last()?
        .trim()
        .trim_end_matches('%')
        .parse()
        .ok()
}

/// First fan sensor out of `ipmitool sdr list`
pub fn parse_fan_name(lines: &[String]) -> Option<String> {
    let line = lines.iter().find(|l| l.contains("FAN"))?;

    line.split('|').next().map(|x| x.trim().to_string())
}

/// Did a restart finish in time. `time_str` is the elapsed time as printed by
/// systemd, e.g. `2min 35.124s`. Short strings always pass, otherwise the
/// leading digit must be below 3.
pub fn validate_exec_time(time_str: &str) -> bool {
    let xs: Vec<_> = time_str.split_whitespace().collect();

    if xs.len() < 3 {
        return true;
    }

    xs[0]
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .map(|d| d < 3)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_debug_snapshot;

    static PCS_STATUS_FIXTURE: &str = include_str!("./fixtures/pcs_status.txt");
    static SEL_INFO_FIXTURE: &str = include_str!("./fixtures/ipmitool_sel_info.txt");
    static SDR_LIST_FIXTURE: &str = include_str!("./fixtures/ipmitool_sdr_list.txt");

    fn lines(x: &str) -> Vec<String> {
        x.lines().map(|x| x.to_string()).collect()
    }

    #[test]
    fn test_parse_sspl_state_pcs() {
        let x = parse_sspl_state_pcs(
            &lines(PCS_STATUS_FIXTURE),
            "Master/Slave Set: sspl-master [sspl]",
        );

        assert_debug_snapshot!(x, @r###"
        Some(
            SsplState {
                masters: "srvnode-1",
                slaves: "srvnode-2",
            },
        )
        "###);
    }

    #[test]
    fn test_parse_sspl_state_pcs_missing_section() {
        let x = parse_sspl_state_pcs(&lines(PCS_STATUS_FIXTURE), "Master/Slave Set: nope [x]");

        assert_eq!(x, None);

        let x = parse_sspl_state_pcs(
            &lines(" Master/Slave Set: sspl-master [sspl]\n     Masters: [ srvnode-1 ]"),
            "Master/Slave Set: sspl-master [sspl]",
        );

        assert_eq!(x, None);
    }

    #[test]
    fn test_parse_sel_percent_used() {
        assert_eq!(parse_sel_percent_used(&lines(SEL_INFO_FIXTURE)), Some(23));
        assert_eq!(parse_sel_percent_used(&lines("Entries : 0")), None);
    }

    #[test]
    fn test_parse_fan_name() {
        assert_eq!(
            parse_fan_name(&lines(SDR_LIST_FIXTURE)),
            Some("SYS FAN1".to_string())
        );
        assert_eq!(parse_fan_name(&lines("CPU1 Temp | 42 degrees C | ok")), None);
    }

    #[test]
    fn test_parse_sspl_state() {
        assert_eq!(parse_sspl_state("state=active\n"), "active");
        assert_eq!(parse_sspl_state("state=degraded"), "degraded");
        assert_eq!(parse_sspl_state(""), "");
    }

    #[test]
    fn test_parse_cluster_id_and_pwd() {
        assert_eq!(
            parse_cluster_id("local:\n    5c427765-ff70-4e38-a1bb-8ab3f6a5bb8c\n"),
            Some("5c427765-ff70-4e38-a1bb-8ab3f6a5bb8c".to_string())
        );
        assert_eq!(parse_cluster_id("  \n"), None);

        assert_eq!(
            parse_encrypted_pwd("Encrypted password: b'gAAAAABgIjs9Zx=='\n"),
            Some("gAAAAABgIjs9Zx==".to_string())
        );
        assert_eq!(
            parse_encrypted_pwd("gAAAAABgIjs9Zx=="),
            Some("gAAAAABgIjs9Zx==".to_string())
        );
    }

    #[test]
    fn test_collapse_ws() {
        assert_eq!(collapse_ws("  10.0.0.2 \n"), "10.0.0.2");
        assert_eq!(collapse_ws("a\t b\n\nc"), "a b c");
    }

    #[test]
    fn test_validate_exec_time() {
        assert!(validate_exec_time("35.124s"));
        assert!(validate_exec_time("1min 5s"));
        assert!(validate_exec_time("2min 35.124s ago"));
        assert!(!validate_exec_time("3min 1.001s ago"));
        assert!(!validate_exec_time("x 1 2"));
    }

    #[test]
    fn test_kv_value_matches() {
        assert!(KvValue::Int(90).matches("90\n"));
        assert!(!KvValue::Int(90).matches("90.5"));
        assert!(KvValue::Float(0.5).matches(" 0.5"));
        assert!(!KvValue::Float(0.5).matches("abc"));
        assert!(KvValue::from(" INFO ").matches("INFO\n"));
        assert_eq!(KvValue::from(80_i64).to_string(), "80");
    }
}
