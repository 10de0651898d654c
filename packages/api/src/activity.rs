// ABOUTME: Activity feed events emitted after successful mutations
// ABOUTME: Fire-and-forget observability; password-like fields are redacted

use tracing::info;

const SENSITIVE_FIELDS: [&str; 5] = [
    "password",
    "new_password",
    "current_password",
    "confirm_password",
    "hashed_password",
];

const MAX_VALUE_LEN: usize = 20;

/// Records one activity event. `changes` lists the touched fields as
/// key/value pairs; sensitive keys are dropped and long values truncated.
pub fn record(user: &str, action: &str, target: &str, status: u16, changes: &[(&str, String)]) {
    let summary: Vec<String> = changes
        .iter()
        .filter(|(key, _)| !SENSITIVE_FIELDS.contains(key))
        .map(|(key, value)| format!("{}={}", key, shorten(value)))
        .collect();
    let summary = if summary.is_empty() {
        "-".to_string()
    } else {
        summary.join(", ")
    };

    info!(
        target: "taskhive::activity",
        user, action, status,
        entity = target,
        changes = %summary,
    );
}

fn shorten(value: &str) -> String {
    if value.chars().count() <= MAX_VALUE_LEN {
        value.to_string()
    } else {
        let head: String = value.chars().take(MAX_VALUE_LEN - 1).collect();
        format!("{head}…")
    }
}
