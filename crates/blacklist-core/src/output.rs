//! Rendering of the retained address list

use std::fmt;
use std::str::FromStr;

use alloy_primitives::Address;

/// How the final address list is printed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// `0xAb..,0xCd..`
    Csv,
    /// `KEY=0xAb..,0xCd..`, ready to drop into an env file
    Env { key: String },
    /// JSON array of checksummed strings
    Json,
    /// One address per line
    Lines,
}

impl OutputFormat {
    pub fn env(key: impl Into<String>) -> Self {
        OutputFormat::Env { key: key.into() }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    /// Parses `csv`, `json`, `lines`, `env` or `env:KEY`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "lines" => Ok(OutputFormat::Lines),
            "env" => Ok(OutputFormat::env("BLACKLISTED_GAMES")),
            other => match other.strip_prefix("env:") {
                Some(key) if !key.is_empty() => Ok(OutputFormat::env(key)),
                _ => Err(format!(
                    "unknown output format {other:?} (expected csv, json, lines, env or env:KEY)"
                )),
            },
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Env { key } => write!(f, "env:{key}"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Lines => write!(f, "lines"),
        }
    }
}

/// Render addresses in EIP-55 form, preserving input order
pub fn render_addresses(addresses: &[Address], format: &OutputFormat) -> String {
    let checksummed: Vec<String> = addresses.iter().map(|a| a.to_checksum(None)).collect();
    match format {
        OutputFormat::Csv => checksummed.join(","),
        OutputFormat::Env { key } => format!("{key}={}", checksummed.join(",")),
        OutputFormat::Json => serde_json::Value::from(checksummed).to_string(),
        OutputFormat::Lines => checksummed.join("\n"),
    }
}
