//! Site identifier normalization.
//!
//! The website list and the scanner do not agree on how a site is written
//! (`a.com` vs `https://www.a.com/`), so results are matched on a
//! normalized key instead of the raw string.

const SCHEMES: [&str; 2] = ["https://", "http://"];
const WWW_PREFIX: &str = "www.";

/// Normalize a site identifier: strip surrounding whitespace, an `http://`
/// or `https://` scheme, a leading `www.` and any trailing slashes.
///
/// No case folding is applied.
pub fn normalize_site_key(identifier: &str) -> String {
    let trimmed = identifier.trim();

    let without_scheme = SCHEMES
        .iter()
        .find_map(|scheme| trimmed.strip_prefix(scheme))
        .unwrap_or(trimmed);

    let without_www = without_scheme
        .strip_prefix(WWW_PREFIX)
        .unwrap_or(without_scheme);

    without_www.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_www_and_trailing_slash_share_a_key() {
        let variants = [
            "a.com",
            "a.com/",
            "http://a.com",
            "https://a.com/",
            "www.a.com",
            "https://www.a.com//",
            "  http://www.a.com/ ",
        ];
        for variant in variants {
            assert_eq!(normalize_site_key(variant), "a.com", "variant {variant:?}");
        }
    }

    #[test]
    fn paths_are_preserved() {
        assert_eq!(
            normalize_site_key("https://news.example.org/world/"),
            "news.example.org/world"
        );
    }

    #[test]
    fn only_leading_www_is_stripped() {
        assert_eq!(normalize_site_key("https://wwwx.com"), "wwwx.com");
        assert_eq!(normalize_site_key("blog.www.com"), "blog.www.com");
    }

    #[test]
    fn case_is_not_folded() {
        assert_ne!(normalize_site_key("A.com"), normalize_site_key("a.com"));
    }

    #[test]
    fn empty_identifier_stays_empty() {
        assert_eq!(normalize_site_key(""), "");
        assert_eq!(normalize_site_key("https://"), "");
    }
}
