//! Small helpers shared by the Murmur CLI and TUI.

mod path_processing;
pub mod preferences;

pub use path_processing::{expand_tilde, state_dir};
pub use preferences::{PreferencesError, PreferencesPayload, UserPreferences};

use once_cell::sync::Lazy;
use regex::Regex;

static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(authorization:\s*(?:bearer\s+)?)([\w\-\.=:/+]+)",
        r"(?i)([A-Z0-9_]*?(?:TOKEN|SECRET|PASSWORD)=)([^\s;]+)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Redacts values that look like secrets in a string.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for re in SECRET_PATTERNS.iter() {
        redacted = re
            .replace_all(&redacted, |caps: &regex::Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{}<redacted>", prefix)
            })
            .to_string();
    }
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_bearer_tokens_and_env_assignments() {
        let line = "Authorization: Bearer abc.def-123";
        assert_eq!(redact_sensitive(line), "Authorization: Bearer <redacted>");

        let env = "MURMUR_TOKEN=s3cr3t other=value";
        assert_eq!(redact_sensitive(env), "MURMUR_TOKEN=<redacted> other=value");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(redact_sensitive("GET /api/v4/users/me"), "GET /api/v4/users/me");
    }
}
