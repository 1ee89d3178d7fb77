//! Tag name handling shared by the repository and the CLI.
//!
//! Tag names are case-sensitive as stored. The only normalization applied is
//! trimming surrounding whitespace; blank names are dropped.

/// Trim tag names, drop blanks, and collapse duplicates.
///
/// The first occurrence of each name wins, so the relative order of the
/// caller's tags is preserved.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let name = tag.as_ref().trim();
        if name.is_empty() || out.iter().any(|t| t == name) {
            continue;
        }
        out.push(name.to_string());
    }
    out
}

/// Split a comma-separated tag list such as `"rust, cli,notes"`.
pub fn parse_tag_list(input: &str) -> Vec<String> {
    let parts: Vec<&str> = input.split(',').collect();
    normalize_tags(&parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_drops_blank() {
        let tags = normalize_tags(&["  rust ", "", "   ", "cli"]);
        assert_eq!(tags, vec!["rust", "cli"]);
    }

    #[test]
    fn test_normalize_dedupes_keeping_first() {
        let tags = normalize_tags(&["b", "a", " b", "a"]);
        assert_eq!(tags, vec!["b", "a"]);
    }

    #[test]
    fn test_normalize_is_case_sensitive() {
        let tags = normalize_tags(&["Rust", "rust"]);
        assert_eq!(tags, vec!["Rust", "rust"]);
    }

    #[test]
    fn test_parse_tag_list() {
        assert_eq!(parse_tag_list("rust, cli,notes"), vec!["rust", "cli", "notes"]);
        assert_eq!(parse_tag_list("a,,b, "), vec!["a", "b"]);
        assert!(parse_tag_list("").is_empty());
    }
}
