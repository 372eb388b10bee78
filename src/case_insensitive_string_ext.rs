pub trait CaseInsensitiveStrExt {
    fn strip_prefix_ignore_ascii_case<'a>(&'a self, prefix: &str) -> Option<&'a str>;

    /// Unicode-aware, case-insensitive substring test. An empty needle always matches.
    fn contains_ignore_case(&self, needle: &str) -> bool;
}

impl CaseInsensitiveStrExt for str {
    fn strip_prefix_ignore_ascii_case<'a>(&'a self, prefix: &str) -> Option<&'a str> {
        let my_prefix = self.get(..prefix.len())?;

        if my_prefix.eq_ignore_ascii_case(prefix) {
            Some(&self[prefix.len()..])
        } else {
            None
        }
    }

    fn contains_ignore_case(&self, needle: &str) -> bool {
        self.to_lowercase().contains(&needle.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::CaseInsensitiveStrExt;

    #[test]
    fn strips_scheme_in_any_case() {
        assert_eq!("Bearer abc".strip_prefix_ignore_ascii_case("bearer "), Some("abc"));
        assert_eq!("BEARER abc".strip_prefix_ignore_ascii_case("bearer "), Some("abc"));
        assert_eq!("Basic abc".strip_prefix_ignore_ascii_case("bearer "), None);
        assert_eq!("Bear".strip_prefix_ignore_ascii_case("bearer "), None);
    }

    #[test]
    fn does_not_split_multibyte_characters() {
        assert_eq!("Beärer x".strip_prefix_ignore_ascii_case("bearer "), None);
    }

    #[test]
    fn substring_match_ignores_case() {
        assert!("J.K. Rowling".contains_ignore_case("rowling"));
        assert!("The Hobbit".contains_ignore_case("HOBB"));
        assert!("Anything".contains_ignore_case(""));
        assert!(!"George Orwell".contains_ignore_case("tolkien"));
    }
}
