//! Named validation patterns
//!
//! Parameter declarations may reference a predefined pattern by name
//! (`matching semver`). The parser stores the name untouched; this registry
//! is where the executor (and the CLI diagnostics) resolve names to compiled
//! regexes.

use std::collections::HashMap;

use regex_lite::Regex;

lazy_static::lazy_static! {
    static ref PATTERNS: HashMap<&'static str, Regex> = {
        let mut m = HashMap::new();
        for (name, pattern) in PATTERN_SOURCES {
            if let Ok(re) = Regex::new(pattern) {
                m.insert(*name, re);
            }
        }
        m
    };
}

/// Name → regex source for every predefined pattern
pub const PATTERN_SOURCES: &[(&str, &str)] = &[
    ("semver", r"^\d+\.\d+\.\d+$"),
    (
        "semver_extended",
        r"^\d+\.\d+\.\d+(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$",
    ),
    (
        "uuid",
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    ),
    ("url", r"^https?://[^\s/$.?#].[^\s]*$"),
    (
        "ipv4",
        r"^((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)$",
    ),
    ("slug", r"^[a-z0-9]+(-[a-z0-9]+)*$"),
    (
        "docker_tag",
        r"^[a-z0-9]+((\.|_|__|-+)[a-z0-9]+)*(/[a-z0-9]+((\.|_|__|-+)[a-z0-9]+)*)*(:[A-Za-z0-9_][A-Za-z0-9_.-]{0,127})?$",
    ),
    ("git_branch", r"^[^\s~^:?*\[\\]+$"),
    (
        "email",
        r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$",
    ),
];

/// Look up a predefined pattern by name
pub fn lookup_pattern(name: &str) -> Option<&'static Regex> {
    PATTERNS.get(name)
}

/// Every registered pattern name, for diagnostics
pub fn pattern_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = PATTERNS.keys().copied().collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_source_compiles() {
        assert_eq!(PATTERNS.len(), PATTERN_SOURCES.len());
    }

    #[test]
    fn test_semver() {
        let re = lookup_pattern("semver").unwrap();
        assert!(re.is_match("1.2.3"));
        assert!(!re.is_match("1.2"));
        let ext = lookup_pattern("semver_extended").unwrap();
        assert!(ext.is_match("1.2.3-rc.1+build.5"));
    }

    #[test]
    fn test_uuid_and_ipv4() {
        assert!(lookup_pattern("uuid")
            .unwrap()
            .is_match("123e4567-e89b-12d3-a456-426614174000"));
        assert!(lookup_pattern("ipv4").unwrap().is_match("192.168.0.1"));
        assert!(!lookup_pattern("ipv4").unwrap().is_match("256.1.1.1"));
    }

    #[test]
    fn test_slug_and_email() {
        assert!(lookup_pattern("slug").unwrap().is_match("my-app-2"));
        assert!(!lookup_pattern("slug").unwrap().is_match("My App"));
        assert!(lookup_pattern("email").unwrap().is_match("dev@example.com"));
    }

    #[test]
    fn test_unknown_name() {
        assert!(lookup_pattern("nope").is_none());
    }
}
