/// Turn a user-typed site address into an absolute URL.
///
/// Bare hostnames get `https://www.`, `www.` hosts get `https://`, and inputs
/// that already carry an http(s) scheme are kept. Anything else that looks like
/// a path or free text is returned as typed so the caller can flag it.
/// An empty result means there was no input.
pub fn normalize(raw: &str) -> String {
    let url = raw
        .trim_start()
        .trim_end_matches(|c: char| c == '/' || c.is_whitespace());
    if url.is_empty() {
        return String::new();
    }

    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else if url.starts_with("www.") {
        format!("https://{}", url)
    } else if !url.contains(&['/', ' ', '\n', '\t'][..]) {
        format!("https://www.{}", url)
    } else {
        url.to_string()
    }
}

/// Whether a normalized value can be handed to the agent as a website address.
pub fn looks_fetchable(normalized: &str) -> bool {
    let host = normalized
        .strip_prefix("https://")
        .or_else(|| normalized.strip_prefix("http://"));
    matches!(host, Some(rest) if !rest.is_empty() && !rest.contains(char::is_whitespace))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t"), "");
        assert_eq!(normalize("///"), "");
    }

    #[test]
    fn test_bare_hostname() {
        assert_eq!(normalize("example.com"), "https://www.example.com");
        assert_eq!(normalize("  example.com/  "), "https://www.example.com");
        assert_eq!(normalize("example.com /"), "https://www.example.com");
        assert_eq!(normalize("example.com/ /\n"), "https://www.example.com");
    }

    #[test]
    fn test_www_hostname() {
        assert_eq!(normalize("www.example.com"), "https://www.example.com");
    }

    #[test]
    fn test_scheme_kept() {
        assert_eq!(normalize("https://example.com/"), "https://example.com");
        assert_eq!(normalize("http://example.com///"), "http://example.com");
        assert_eq!(
            normalize("https://example.com/about/"),
            "https://example.com/about"
        );
    }

    #[test]
    fn test_unrecognized_input_unchanged() {
        assert_eq!(normalize("not a url"), "not a url");
        assert_eq!(normalize("example.com/about"), "example.com/about");
        assert_eq!(normalize("ftp://example.com"), "ftp://example.com");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "example.com",
            "www.example.com",
            "https://example.com/",
            "http://example.com///",
            "not a url",
            "example.com/about/",
            " sub.example.org ",
            "example.com /",
            "example.com/ /",
            "not a url / ",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_looks_fetchable() {
        assert!(looks_fetchable(&normalize("example.com")));
        assert!(looks_fetchable("http://localhost:8080"));
        assert!(!looks_fetchable(&normalize("not a url")));
        assert!(!looks_fetchable(""));
        assert!(!looks_fetchable("https://"));
    }
}
