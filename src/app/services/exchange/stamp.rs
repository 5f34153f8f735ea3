//! Identifier line stamps (`BOTTLE,20200101ABCDEF`)

use crate::{Error, Result};
use chrono::Local;
use regex::Regex;

/// Pattern matching `<identifier>,<YYYYMMDD><division><institution><person>`
pub fn stamp_pattern(identifier: &str) -> Result<Regex> {
    Regex::new(&format!(r"^{},(\d{{8}}\w+)", regex::escape(identifier)))
        .map_err(|e| Error::configuration(format!("Invalid file identifier '{}': {}", identifier, e)))
}

/// Extract the stamp from an identifier line
pub fn parse_stamp_line(pattern: &Regex, line: &str) -> Option<String> {
    pattern
        .captures(line.trim_end())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Stamp for today's date
pub fn generate_stamp(institution: &str, person: &str) -> String {
    format!("{}{}{}", Local::now().format("%Y%m%d"), institution, person)
}
