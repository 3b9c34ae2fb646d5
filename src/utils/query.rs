//! Search-term sanitizing for openFDA's Lucene-like `search` parameter.
//!
//! openFDA answers HTTP 500 for many ordinary punctuation characters, so
//! instead of escaping we whitelist `[A-Za-z0-9-]` and collapse everything
//! else into single spaces.

const BOOLEAN_AND: &str = " AND ";

fn is_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-'
}

/// Returns true iff `input` is exactly one character from `[A-Za-z0-9-]`.
///
/// `None`, empty strings, multi-character strings, whitespace and punctuation
/// are all unsafe.
pub fn is_safe_char<'a>(input: impl Into<Option<&'a str>>) -> bool {
    let Some(input) = input.into() else {
        return false;
    };
    let mut chars = input.chars();
    matches!((chars.next(), chars.next()), (Some(ch), None) if is_safe(ch))
}

/// True when every character of a non-empty identifier is in the safe alphabet.
pub(crate) fn is_safe_term(value: &str) -> bool {
    !value.is_empty() && value.chars().all(is_safe)
}

/// Converts free text into an uppercase, query-safe search term.
///
/// Runs of unsafe characters become one space, leading and trailing runs are
/// dropped, and the standalone word `AND` is removed so it cannot act as a
/// boolean operator in the upstream query.
pub fn sanitize<'a>(input: impl Into<Option<&'a str>>) -> String {
    let Some(input) = input.into().filter(|s| !s.is_empty()) else {
        return String::new();
    };

    let upper = input.to_uppercase();
    let (scanned, _) = upper.chars().fold(
        (String::with_capacity(upper.len()), true),
        |(mut out, last_space), ch| {
            if is_safe(ch) {
                out.push(ch);
                (out, false)
            } else if !last_space {
                out.push(' ');
                (out, true)
            } else {
                (out, last_space)
            }
        },
    );

    scanned.trim().replace(BOOLEAN_AND, " ")
}

#[cfg(test)]
mod tests {
    use super::{is_safe_char, is_safe_term, sanitize};

    #[test]
    fn sanitize_returns_empty_for_missing_input() {
        assert_eq!(sanitize(None), "");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn sanitize_uppercases() {
        assert_eq!(sanitize("xarelto"), "XARELTO");
    }

    #[test]
    fn sanitize_strips_boolean_and() {
        assert_eq!(sanitize("foo and bar"), "FOO BAR");
    }

    #[test]
    fn sanitize_collapses_unsafe_runs() {
        assert_eq!(sanitize("s&fl!fG-!"), "S FL FG-");
        assert_eq!(sanitize("  ((tylenol))  pm "), "TYLENOL PM");
        assert_eq!(sanitize("!!!"), "");
    }

    #[test]
    fn sanitize_never_emits_query_syntax() {
        let out = sanitize(r#"a:b (c) & "d" | e\f"#);
        assert_eq!(out, "A B C D E F");
        assert!(!out.contains(['(', ')', ':', '&', '"']));
    }

    #[test]
    fn sanitize_keeps_and_inside_words_and_alone() {
        assert_eq!(sanitize("sandostatin"), "SANDOSTATIN");
        assert_eq!(sanitize("and"), "AND");
        // Replacement is non-overlapping, so one of two adjacent ANDs survives.
        assert_eq!(sanitize("foo and and bar"), "FOO AND BAR");
    }

    #[test]
    fn is_safe_char_accepts_letters_digits_and_dash() {
        assert!(is_safe_char("a"));
        assert!(is_safe_char("3"));
        assert!(is_safe_char("-"));
    }

    #[test]
    fn is_safe_char_rejects_everything_else() {
        assert!(!is_safe_char(None));
        assert!(!is_safe_char(""));
        assert!(!is_safe_char(r#""""#));
        assert!(!is_safe_char(" "));
        assert!(!is_safe_char("ab"));
        assert!(!is_safe_char("é"));
    }

    #[test]
    fn is_safe_term_requires_non_empty_safe_alphabet() {
        assert!(is_safe_term("9ndf7jz4m3"));
        assert!(!is_safe_term(""));
        assert!(!is_safe_term("12/../34"));
    }

    #[test]
    fn crate_root_exposes_the_query_sanitizer() {
        assert_eq!(crate::sanitize("xarelto (oral)"), sanitize("xarelto (oral)"));
        assert_eq!(crate::sanitize(None), "");
        assert_eq!(crate::is_safe_char("-"), is_safe_char("-"));
    }
}
