use dirs_next::{data_local_dir, home_dir};
use std::path::PathBuf;

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let p = path.trim();
    if p == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = p.strip_prefix("~/").or_else(|| p.strip_prefix("~\\")) {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(p)
}

/// Directory for runtime state such as the log file (`<data-local>/murmur`).
pub fn state_dir() -> PathBuf {
    data_local_dir().unwrap_or_else(|| PathBuf::from(".")).join("murmur")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_tilde_paths_are_untouched() {
        assert_eq!(expand_tilde(" /tmp/prefs.json "), PathBuf::from("/tmp/prefs.json"));
    }

    #[test]
    fn tilde_prefix_expands_to_home() {
        if let Some(home) = home_dir() {
            assert_eq!(expand_tilde("~/murmur/prefs.json"), home.join("murmur/prefs.json"));
            assert_eq!(expand_tilde("~"), home);
        }
    }
}
