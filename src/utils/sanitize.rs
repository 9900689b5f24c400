//! Filename sanitization for network names.

use regex::Regex;
use std::sync::LazyLock;

/// Longest name kept, in bytes
const MAX_NAME_BYTES: usize = 255;

static ILLEGAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[/\?<>\\:\*\|"]"#).expect("static regex"));
static CONTROL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\x00-\x1f\x80-\x9f]").expect("static regex"));
static RESERVED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\.+$").expect("static regex"));
static WINDOWS_RESERVED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(con|prn|aux|nul|com[0-9]|lpt[0-9])(\..*)?$").expect("static regex")
});
static WINDOWS_TRAILING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\. ]+$").expect("static regex"));

/// Strip everything that cannot appear in a directory name.
///
/// Removes path separators, shell/Windows-reserved characters and control
/// characters, then rejects names that are only dots, Windows device names
/// and trailing dots or spaces. The result may be empty; callers decide
/// whether that is an error.
pub fn sanitize_name(input: &str) -> String {
    let mut name = ILLEGAL.replace_all(input, "").into_owned();
    name = CONTROL.replace_all(&name, "").into_owned();
    name = RESERVED.replace(&name, "").into_owned();
    name = WINDOWS_RESERVED.replace(&name, "").into_owned();
    name = WINDOWS_TRAILING.replace(&name, "").into_owned();

    truncate_bytes(&name, MAX_NAME_BYTES).to_string()
}

fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_plain_names() {
        assert_eq!(sanitize_name("3-nodes-raft-tessera-bash"), "3-nodes-raft-tessera-bash");
    }

    #[test]
    fn test_sanitize_strips_separators() {
        assert_eq!(sanitize_name("../my/net"), "..mynet");
        assert_eq!(sanitize_name("a:b*c?"), "abc");
        assert_eq!(sanitize_name("net. . "), "net");
    }

    #[test]
    fn test_sanitize_is_stable_across_calls() {
        for _ in 0..3 {
            assert_eq!(sanitize_name("con.txt"), "");
            assert_eq!(sanitize_name("net\u{7}work"), "network");
        }
    }

    #[test]
    fn test_sanitize_can_yield_empty() {
        assert_eq!(sanitize_name("///"), "");
        assert_eq!(sanitize_name(".."), "");
        assert_eq!(sanitize_name("CON"), "");
        assert_eq!(sanitize_name(""), "");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "a".repeat(300);
        assert_eq!(sanitize_name(&long).len(), MAX_NAME_BYTES);
    }
}
