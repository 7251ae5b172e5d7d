//! Plain-text sample protocol
//!
//! One sample per line, fields separated by whitespace:
//!
//! ```text
//! <key> <value> [timestamp_ms]
//! a 1 1700000000000
//! b -4
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. A missing timestamp
//! is filled with the caller-supplied default (the server uses "now").

use metricdb_core::{MetricKey, Sample, Timestamp};

/// Parse a single-character metric key
pub fn parse_key(raw: &str) -> Result<MetricKey, String> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(key), None) => Ok(key),
        _ => Err(format!("Metric key must be exactly one character, got {:?}", raw)),
    }
}

/// Parse a request body into samples
pub fn parse_samples(data: &str, default_timestamp: Timestamp) -> Result<Vec<Sample>, String> {
    let mut samples = Vec::new();

    for (number, line) in data.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let sample = parse_line(line, default_timestamp)
            .map_err(|e| format!("line {}: {}", number + 1, e))?;
        samples.push(sample);
    }

    Ok(samples)
}

fn parse_line(line: &str, default_timestamp: Timestamp) -> Result<Sample, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err("expected '<key> <value> [timestamp]'".to_string());
    }

    let key = parse_key(parts[0])?;
    let value = parts[1]
        .parse::<i32>()
        .map_err(|_| format!("Invalid value: {}", parts[1]))?;
    let timestamp = match parts.get(2) {
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| format!("Invalid timestamp: {}", raw))?,
        None => default_timestamp,
    };

    Ok(Sample::new(timestamp, key, value))
}
