//! Annotation-driven local port overrides.
//!
//! A service can ask for one of its ports to be exposed locally on a
//! different number by carrying an annotation of the form
//!
//! ```text
//! localizer.jaredallard.github.com/remap-<port name>: "<local port>"
//! ```
//!
//! Port names are compared case-insensitively. Values that don't parse, or
//! that resolve to 0, are ignored and the port keeps its remote number.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::model::ServicePort;

/// Annotation key prefix marking a local port override.
pub const REMAP_ANNOTATION_PREFIX: &str = "localizer.jaredallard.github.com/remap-";

/// A port as declared on the cluster resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredPort {
    /// Port name, possibly empty for single-port services.
    pub name: String,
    /// Declared (remote) port number.
    pub port: u16,
}

impl DeclaredPort {
    /// Create a declared port.
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
        }
    }
}

/// Parse an override value as an unsigned port number.
///
/// Accepts decimal, `0x` hex, `0o` octal, `0b` binary and a bare leading
/// `0` as octal, with `_` allowed between digits. Returns `None` for
/// anything unparseable, out of the port range, or zero.
pub fn parse_port_override(value: &str) -> Option<u16> {
    let value = value.trim();
    let (digits, radix) = split_radix(value);

    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
        || !digits.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return None;
    }

    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    match u16::from_str_radix(&cleaned, radix) {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

fn split_radix(value: &str) -> (&str, u32) {
    let lower = value.get(..2).map(str::to_ascii_lowercase);
    match lower.as_deref() {
        Some("0x") => (&value[2..], 16),
        Some("0o") => (&value[2..], 8),
        Some("0b") => (&value[2..], 2),
        _ if value.len() > 1 && value.starts_with('0') => (&value[1..], 8),
        _ => (value, 10),
    }
}

/// Collect valid overrides keyed by lower-cased port name.
///
/// Annotations are visited in key order; when several keys collapse to the
/// same port name the last valid one wins.
pub fn remap_overrides(annotations: &BTreeMap<String, String>) -> HashMap<String, u16> {
    let mut overrides = HashMap::new();

    for (key, value) in annotations {
        let Some(port_name) = key.strip_prefix(REMAP_ANNOTATION_PREFIX) else {
            continue;
        };

        match parse_port_override(value) {
            Some(port) => {
                overrides.insert(port_name.to_lowercase(), port);
            }
            None => {
                trace!(annotation = %key, value = %value, "Ignoring invalid port remap");
            }
        }
    }

    overrides
}

/// Resolve the final port list for a service, keeping declared order.
pub fn resolve_ports(
    declared: &[DeclaredPort],
    annotations: &BTreeMap<String, String>,
) -> Vec<ServicePort> {
    let overrides = remap_overrides(annotations);

    declared
        .iter()
        .map(|p| {
            let local_port = overrides
                .get(&p.name.to_lowercase())
                .copied()
                .unwrap_or(p.port);
            ServicePort {
                remote_port: p.port,
                local_port,
            }
        })
        .collect()
}
