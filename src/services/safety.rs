// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretMatch {
    pub pattern_name: String,
    /// 1-based
    pub line: usize,
}

static SECRET_PATTERNS: LazyLock<Vec<(&str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "API Key",
            Regex::new(r#"(?i)(api[_-]?key|apikey)\s*[:=]\s*["']?[a-zA-Z0-9_-]{20,}"#).unwrap(),
        ),
        ("AWS Key", Regex::new(r"AKIA[0-9A-Z]{16}").unwrap()),
        (
            "Private Key",
            Regex::new(r"-----BEGIN .* PRIVATE KEY-----").unwrap(),
        ),
        ("OpenAI Key", Regex::new(r"sk-[a-zA-Z0-9]{48}").unwrap()),
        (
            "Anthropic Key",
            Regex::new(r"sk-ant-[a-zA-Z0-9-]{80,}").unwrap(),
        ),
        (
            "Generic Secret",
            Regex::new(r#"(?i)(password|secret|token)\s*[:=]\s*["'][^"']{8,}["']"#).unwrap(),
        ),
        (
            "Connection String",
            Regex::new(r"(?i)(mongodb|postgres|mysql|redis)://[^\s]+").unwrap(),
        ),
    ]
});

/// Scan file content line by line; at most one match per line.
pub fn scan_content(content: &str) -> Vec<SecretMatch> {
    let mut found = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        for (name, pattern) in SECRET_PATTERNS.iter() {
            if pattern.is_match(line) {
                found.push(SecretMatch {
                    pattern_name: name.to_string(),
                    line: idx + 1,
                });
                break;
            }
        }
    }

    found
}

/// "API Key (line 3), AWS Key (line 9)"
pub fn describe(matches: &[SecretMatch]) -> String {
    matches
        .iter()
        .map(|m| format!("{} (line {})", m.pattern_name, m.line))
        .collect::<Vec<_>>()
        .join(", ")
}
