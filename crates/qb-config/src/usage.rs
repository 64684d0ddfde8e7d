//! Unused-key guard.
//!
//! Each consumer declares the JSON-pointer prefixes it actually reads. A leaf
//! pointer under any consumed prefix counts as consumed; everything else is
//! reported. Callers pick `Warn` or `Fail`.
//!
//! - prefix `/backend` consumes `/backend/url` and `/backend/cookie_env`
//! - `/a/b` consumes `/a/b/c` but not `/a/bc`

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Which binary surface is reading the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigConsumer {
    /// `qb-daemon`: backend, stream and the HTTP bind address.
    Daemon,
    /// `qb watch`: backend and stream only.
    Watch,
}

impl ConfigConsumer {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigConsumer::Daemon => "DAEMON",
            ConfigConsumer::Watch => "WATCH",
        }
    }

    /// Must reflect what [`BoardConfig`](crate::BoardConfig) actually reads
    /// for this consumer.
    pub fn consumed_pointers(&self) -> &'static [&'static str] {
        match self {
            ConfigConsumer::Daemon => &[
                "/backend/url",
                "/backend/snapshot_path",
                "/backend/stream_path",
                "/backend/cookie_env",
                "/stream/retry_ms",
                "/stream/channel_capacity",
                "/daemon/bind",
            ],
            ConfigConsumer::Watch => &[
                "/backend/url",
                "/backend/snapshot_path",
                "/backend/stream_path",
                "/backend/cookie_env",
                "/stream/retry_ms",
                "/stream/channel_capacity",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    pub consumer: String,
    /// Sorted, unique.
    pub consumed_prefixes: Vec<String>,
    /// Sorted.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// With `Fail`, errors when any unused leaf exists; with `Warn`, always `Ok`.
pub fn report_unused_keys(
    consumer: ConfigConsumer,
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let consumed: BTreeSet<String> = consumer
        .consumed_pointers()
        .iter()
        .map(|p| normalize_pointer(p))
        .collect();
    let consumed_prefixes: Vec<String> = consumed.into_iter().collect();

    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|leaf| !consumed_prefixes.iter().any(|cp| is_prefix_pointer(cp, leaf)))
        // An empty root object has a single "/" leaf; nothing is configured.
        .filter(|leaf| leaf != "/" || !config_json.is_object())
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        consumer: consumer.as_str().to_string(),
        consumed_prefixes,
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS (consumer={}): {} unused config leaf key(s) detected. \
            Remove them or update the consumed registry. First few: {}",
            report.consumer,
            report.unused_leaf_pointers.len(),
            preview_list(&report.unused_leaf_pointers, 12)
        );
    }

    Ok(report)
}

fn normalize_pointer(p: &str) -> String {
    let mut s = p.trim().to_string();
    if s.is_empty() {
        return "/".to_string();
    }
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    while s.ends_with('/') && s.len() > 1 {
        s.pop();
    }
    s
}

fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" || leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

pub(crate) fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) if !map.is_empty() => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) if !arr.is_empty() => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            let p = if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            };
            out.push(p);
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn preview_list(items: &[String], n: usize) -> String {
    let take = items.iter().take(n).cloned().collect::<Vec<_>>();
    format!("{:?}", take)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_respects_segment_boundary() {
        assert!(is_prefix_pointer("/backend", "/backend/url"));
        assert!(is_prefix_pointer("/backend/url", "/backend/url"));
        assert!(!is_prefix_pointer("/backend", "/backends/url"));
        assert!(is_prefix_pointer("/", "/anything"));
    }

    #[test]
    fn pointer_tokens_are_escaped() {
        let v = serde_json::json!({"a/b": {"c~d": 1}});
        let mut leaves = Vec::new();
        collect_leaf_pointers(&v, "", &mut leaves);
        assert_eq!(leaves, vec!["/a~1b/c~0d".to_string()]);
    }

    #[test]
    fn normalize_adds_leading_and_strips_trailing_slash() {
        assert_eq!(normalize_pointer("daemon/bind/"), "/daemon/bind");
        assert_eq!(normalize_pointer(""), "/");
    }
}
