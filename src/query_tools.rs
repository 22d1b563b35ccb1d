use std::ops::Range;

use serde::Serialize;
use sqlformat::{FormatOptions, Indent, QueryParams};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LintSeverity {
    Info,
    Warning,
    Error,
}

/// One heuristic finding. Lints never block execution; they ride back to the
/// UI as-is.
#[derive(Clone, Debug, Serialize)]
pub struct LintMessage {
    pub severity: LintSeverity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Range<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Keywords allowed to lead a statement in read-only mode.
const READ_KEYWORDS: &[&str] = &["SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN"];

/// Drop leading `--`, `#`, and `/* ... */` comments plus surrounding blanks.
pub fn strip_leading_comments(sql: &str) -> &str {
    let mut rest = sql.trim_start();
    loop {
        if rest.starts_with("--") || rest.starts_with('#') {
            match rest.find('\n') {
                Some(pos) => rest = rest[pos + 1..].trim_start(),
                None => return "",
            }
        } else if rest.starts_with("/*") {
            match rest.find("*/") {
                Some(pos) => rest = rest[pos + 2..].trim_start(),
                None => return "",
            }
        } else {
            return rest;
        }
    }
}

/// Uppercased first word of the statement, comments skipped.
pub fn leading_keyword(sql: &str) -> Option<String> {
    let body = strip_leading_comments(sql);
    let word: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if word.is_empty() {
        None
    } else {
        Some(word.to_ascii_uppercase())
    }
}

/// Lexical check used by read-only mode. Only the leading keyword counts:
/// CTE-led statements (`WITH ... SELECT`) do not pass even when the body is
/// a plain read.
pub fn is_read_statement(sql: &str) -> bool {
    match leading_keyword(sql) {
        Some(keyword) => READ_KEYWORDS.contains(&keyword.as_str()),
        None => false,
    }
}

fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    let hay_lower = haystack.to_ascii_lowercase();
    let needle_lower = needle.to_ascii_lowercase();
    hay_lower.find(&needle_lower)
}

pub fn lint_sql(sql: &str) -> Vec<LintMessage> {
    let mut messages = Vec::new();
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return messages;
    }

    if let Some(idx) = find_case_insensitive(trimmed, "SELECT *") {
        messages.push(LintMessage {
            severity: LintSeverity::Warning,
            message: "Avoid SELECT * to minimize payload and leverage indexes.".to_string(),
            span: Some(idx..idx + "SELECT *".len()),
            hint: Some("Enumerate the columns you actually need.".to_string()),
        });
    }

    // Keyword checks look past leading comments so an annotated DELETE still
    // gets its warning
    let upper = strip_leading_comments(trimmed).to_ascii_uppercase();
    if upper.starts_with("DELETE") && !upper.contains("WHERE") {
        messages.push(LintMessage {
            severity: LintSeverity::Warning,
            message: "DELETE without a WHERE clause will remove every row.".to_string(),
            span: None,
            hint: Some("Add a WHERE clause or run inside a transaction.".to_string()),
        });
    }
    if upper.starts_with("UPDATE") && !upper.contains("WHERE") {
        messages.push(LintMessage {
            severity: LintSeverity::Warning,
            message: "UPDATE without a WHERE clause will touch every row.".to_string(),
            span: None,
            hint: Some("Add a WHERE clause to scope the update.".to_string()),
        });
    }
    if upper.contains("DROP TABLE")
        && !upper.contains("IF EXISTS")
        && let Some(idx) = find_case_insensitive(trimmed, "DROP TABLE")
    {
        messages.push(LintMessage {
            severity: LintSeverity::Info,
            message: "DROP TABLE without IF EXISTS may fail if the table is missing.".to_string(),
            span: Some(idx..idx + "DROP TABLE".len()),
            hint: Some("Consider DROP TABLE IF EXISTS ...".to_string()),
        });
    }

    messages
}

/// Pretty-print a statement with the shared formatting profile.
pub fn format_sql(sql: &str) -> String {
    sqlformat::format(sql, &QueryParams::default(), &default_sqlformat_options())
}

// Centralized sqlformat options shared by the format endpoint and the UI
pub fn default_sqlformat_options() -> FormatOptions<'static> {
    FormatOptions {
        joins_as_top_level: true,
        indent: Indent::Spaces(6),
        uppercase: Some(true),
        lines_between_queries: 2,
        inline: false,
        max_inline_block: 50, // characters allowed to keep a parenthesized block inline
        max_inline_arguments: Some(40),
        max_inline_top_level: Some(40),
        ..Default::default()
    }
}
