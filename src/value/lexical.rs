//! Lexical rules for name and path tokens

use regex::Regex;
use std::sync::OnceLock;

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^(?:[A-Za-z_][A-Za-z0-9_.\-]*:)?[^/:\[\]*|'"\s](?:[^/:\[\]*|'"]*[^/:\[\]*|'"\s])?$"#,
        )
        .expect("name regex must compile")
    })
}

fn path_element_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?)(?:\[([1-9][0-9]*)\])?$").expect("path element regex must compile"))
}

/// Returns true if `s` is a valid `[prefix:]local` name.
pub fn is_valid_name(s: &str) -> bool {
    s != "." && s != ".." && name_re().is_match(s)
}

fn is_valid_path_element(element: &str) -> bool {
    if element == "." || element == ".." {
        return true;
    }
    match path_element_re().captures(element) {
        Some(caps) => is_valid_name(&caps[1]),
        None => false,
    }
}

/// Returns true if `s` is a valid absolute or relative path.
pub fn is_valid_path(s: &str) -> bool {
    if s == "/" {
        return true;
    }
    let relative = s.strip_prefix('/').unwrap_or(s);
    !relative.is_empty() && relative.split('/').all(is_valid_path_element)
}

/// Returns the normalized form of a valid path: `.` elements dropped,
/// `[1]` indexes removed and `..` folded into its parent.
///
/// Returns `None` for an invalid path or an absolute path that climbs
/// above the root.
pub fn normalize_path(s: &str) -> Option<String> {
    if !is_valid_path(s) {
        return None;
    }
    let absolute = s.starts_with('/');
    let relative = s.strip_prefix('/').unwrap_or(s);

    let mut elements: Vec<&str> = Vec::new();
    for element in relative.split('/').filter(|e| !e.is_empty()) {
        match element {
            "." => {}
            ".." => match elements.last() {
                Some(last) if *last != ".." => {
                    elements.pop();
                }
                _ if absolute => return None,
                _ => elements.push(".."),
            },
            _ => elements.push(element.strip_suffix("[1]").unwrap_or(element)),
        }
    }

    let joined = elements.join("/");
    Some(match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    })
}

/// Returns the single name a path denotes, if it is one non-indexed
/// relative element.
pub fn path_as_name(s: &str) -> Option<&str> {
    if s.starts_with('/') || s.contains('/') {
        return None;
    }
    if is_valid_name(s) {
        Some(s)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        for ok in ["title", "jcr:title", "my name", "a.b", "x-y_z", "nt:unstructured"] {
            assert!(is_valid_name(ok), "{} should be a name", ok);
        }
        for bad in ["", ".", "..", "a/b", "a:b:c", "a[1]", " lead", "trail ", "*", "1x:y"] {
            assert!(!is_valid_name(bad), "{} should not be a name", bad);
        }
    }

    #[test]
    fn test_paths() {
        for ok in ["/", "/a", "/a/b[2]/c", "a/b", "./a", "../x:y", "jcr:content"] {
            assert!(is_valid_path(ok), "{} should be a path", ok);
        }
        for bad in ["", "//", "/a/", "a//b", "/a[0]", "/a[x]", "/a b/ c"] {
            assert!(!is_valid_path(bad), "{} should not be a path", bad);
        }
    }

    #[test]
    fn test_normalize_path() {
        let cases = [
            ("/", "/"),
            ("/a[1]/b", "/a/b"),
            ("/a/./b[2]", "/a/b[2]"),
            ("/a/b/../c", "/a/c"),
            ("/a/..", "/"),
            ("./a", "a"),
            ("../x:y", "../x:y"),
            ("a/..", "."),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_path(input).as_deref(), Some(expected), "{}", input);
        }
        assert_eq!(normalize_path("/.."), None);
        assert_eq!(normalize_path("a//b"), None);
    }

    #[test]
    fn test_path_as_name() {
        assert_eq!(path_as_name("jcr:title"), Some("jcr:title"));
        assert_eq!(path_as_name("/jcr:title"), None);
        assert_eq!(path_as_name("a/b"), None);
        assert_eq!(path_as_name("a[2]"), None);
        assert_eq!(path_as_name(".."), None);
    }
}
