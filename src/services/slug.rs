//! URL slug generation

/// Generate a URL-friendly slug from a title or name.
///
/// Converts to lowercase, replaces spaces and ASCII punctuation with
/// hyphens, collapses consecutive hyphens, and trims hyphens from both
/// ends. Non-ASCII characters are kept as-is.
pub fn generate_slug(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c
            } else if c == ' ' || c == '_' || c == '-' {
                '-'
            } else if !c.is_ascii() {
                c
            } else {
                '-'
            }
        })
        .collect();

    let mut result = String::new();
    let mut prev_hyphen = false;

    for c in slug.chars() {
        if c == '-' {
            if !prev_hyphen && !result.is_empty() {
                result.push(c);
                prev_hyphen = true;
            }
        } else {
            result.push(c);
            prev_hyphen = false;
        }
    }

    result.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_slug_simple() {
        assert_eq!(generate_slug("Hello World"), "hello-world");
    }

    #[test]
    fn test_generate_slug_special_chars() {
        assert_eq!(generate_slug("New Office: Now Open!"), "new-office-now-open");
        assert_eq!(generate_slug("Q3/Q4 Results"), "q3-q4-results");
    }

    #[test]
    fn test_generate_slug_collapses_hyphens() {
        assert_eq!(generate_slug("a  --  b"), "a-b");
    }

    #[test]
    fn test_generate_slug_trims_edges() {
        assert_eq!(generate_slug("  padded title  "), "padded-title");
        assert_eq!(generate_slug("!!bang!!"), "bang");
    }

    #[test]
    fn test_generate_slug_keeps_non_ascii() {
        assert_eq!(generate_slug("Café Reopening"), "café-reopening");
    }

    #[test]
    fn test_generate_slug_empty_for_punctuation_only() {
        assert_eq!(generate_slug("!!!"), "");
    }
}
