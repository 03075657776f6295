//! Parsers for tshark's `-D` and `-G protocols` listings.

use log::debug;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceEntry {
    pub name: String,
    pub description: String,
}

fn interface_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*\d+\.\s+(?P<name>.+?)(?:\s+[\(\[](?P<description>.*)[\)\]])?\s*$")
            .expect("interface pattern is valid")
    })
}

/// Parses `N. name (description)` lines; `[description]` is accepted too.
/// Lines that are not numbered entries are skipped.
pub fn parse_interfaces(lines: &[String]) -> Vec<InterfaceEntry> {
    lines
        .iter()
        .filter_map(|line| match interface_line().captures(line) {
            Some(caps) => Some(InterfaceEntry {
                name: caps["name"].trim().to_string(),
                description: caps
                    .name("description")
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default(),
            }),
            None => {
                debug!("Skipping unrecognised interface line: {}", line);
                None
            }
        })
        .collect()
}

/// Keeps the filter name (third tab-separated column) of each protocol line;
/// a line without tabs is kept whole.
pub fn parse_protocols(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| {
            let columns: Vec<&str> = line.split('\t').map(str::trim).collect();
            let name = match columns.as_slice() {
                [_, _, filter_name, ..] => *filter_name,
                _ => line.trim(),
            };
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}
