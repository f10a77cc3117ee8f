//! URL slug derivation.

/// Derive a URL-safe slug from free text.
///
/// Lowercases ASCII alphanumerics and collapses every other run of
/// characters into a single hyphen. Leading and trailing hyphens are
/// trimmed. The result may be empty for input with no alphanumerics;
/// callers decide how to handle that (the photo repository appends a
/// random suffix on slug collisions).
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn test_basic() {
        assert_eq!(slugify("Sunset over the bay"), "sunset-over-the-bay");
    }

    #[test]
    fn test_punctuation_collapses() {
        assert_eq!(slugify("Black & White, 35mm!"), "black-white-35mm");
    }

    #[test]
    fn test_leading_trailing_trimmed() {
        assert_eq!(slugify("  --hello--  "), "hello");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }
}
