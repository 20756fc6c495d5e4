//! Path helpers

use std::path::PathBuf;

/// Resolve a user-supplied path to an absolute one
///
/// `~` and `~/...` resolve against the home directory; anything relative
/// resolves against the working directory. Surrounding whitespace is ignored
/// and an empty string means the working directory.
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    let home_relative = match path {
        "~" => dirs::home_dir(),
        _ => path
            .strip_prefix("~/")
            .and_then(|rest| dirs::home_dir().map(|home| home.join(rest))),
    };
    let expanded = home_relative.unwrap_or_else(|| PathBuf::from(path));

    if expanded.is_absolute() {
        return expanded;
    }

    match std::env::current_dir() {
        Ok(cwd) => cwd.join(expanded),
        Err(_) => expanded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_absolute_unchanged() {
        assert_eq!(expand_path("/srv/files"), PathBuf::from("/srv/files"));
        assert_eq!(expand_path("  /srv/files  "), PathBuf::from("/srv/files"));
    }

    #[test]
    fn test_relative_joins_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(expand_path("data/files"), cwd.join("data/files"));
        assert_eq!(expand_path("./querykit.db"), cwd.join("./querykit.db"));
        assert_eq!(expand_path(".."), cwd.join(".."));
    }

    #[test]
    fn test_empty_is_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(expand_path(""), cwd.join(""));
        assert!(expand_path("   ").is_absolute());
    }

    #[test]
    fn test_tilde() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_path("~"), home);
        assert_eq!(expand_path("~/.querykit"), home.join(".querykit"));
    }

    #[test]
    fn test_tilde_user_form_is_relative() {
        // `~bob` is not expanded
        let result = expand_path("~bob/data");
        assert!(result.ends_with("~bob/data"));
    }
}
