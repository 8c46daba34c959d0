// Version extraction from free-form agent status responses

use std::sync::LazyLock;

use regex::Regex;

// Labeled text form the sandbox emits: " VERSION : 1.0.0"
static LABELED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)VERSION\s*:\s*([0-9.\-a-zA-Z]+)").unwrap());

// JSON field form: {"version":"1.0.0"}
static JSON_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)"version"\s*:\s*"([^"]+)""#).unwrap());

// Generic key/value form: version=1.0.0, version: 1.0.0, version 1.0.0
static GENERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)version["\s]*[:=\s]+["\s]*([0-9.\-a-zA-Z]+)"#).unwrap());

// Bare semver-shaped token, only trusted when the body mentions repeater
static SEMVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+\.[0-9]+\.[0-9]+(?:-[a-zA-Z0-9]+)?)").unwrap());

/// Extract a version string from an agent status/detail response body.
///
/// Patterns are tried in strict priority order, stopping at the first
/// match. When the body mentions the repeater module but carries no
/// version-shaped token at all, `"1.0.0"` is assumed; when the keyword is
/// absent too, the version is `"unknown"`. This function never fails.
pub fn resolve_version(response_body: &str) -> String {
    if response_body.is_empty() {
        return "unknown".to_string();
    }

    if let Some(captures) = LABELED.captures(response_body) {
        return captures[1].to_string();
    }
    if let Some(captures) = JSON_FIELD.captures(response_body) {
        return captures[1].to_string();
    }
    if let Some(captures) = GENERIC.captures(response_body) {
        return captures[1].to_string();
    }

    if response_body.to_lowercase().contains("repeater") {
        if let Some(captures) = SEMVER.captures(response_body) {
            return captures[1].to_string();
        }
        // Module is present but announces no version; assume the baseline.
        return "1.0.0".to_string();
    }

    "unknown".to_string()
}
