//! Email text sanitization.
//!
//! Two distinct operations with distinct names: Unicode normalization for
//! text that may have been pasted from anywhere, and a charset restriction
//! matching what the backend accepts. Callers wanting both apply
//! [`sanitize_email`].

use unicode_normalization::UnicodeNormalization;

const BIDI_CONTROLS: &[char] = &[
    '\u{200E}', '\u{200F}', '\u{202A}', '\u{202B}', '\u{202C}', '\u{202D}', '\u{202E}',
    '\u{2066}', '\u{2067}', '\u{2068}', '\u{2069}', '\u{061C}',
];

const ZERO_WIDTH: &[char] = &[
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}', '\u{2060}', '\u{180E}',
];

/// Normalizes an email-like string: NFKC normalization, strips
/// bidirectional-control and zero-width characters, removes whitespace
/// (including NBSP), trims surrounding quote characters, lower-cases.
pub fn normalize_email(value: &str) -> String {
    let normalized: String = value.nfkc().collect();
    let stripped: String = normalized
        .chars()
        .filter(|c| !BIDI_CONTROLS.contains(c) && !ZERO_WIDTH.contains(c))
        .filter(|c| !c.is_whitespace())
        .collect();
    stripped
        .trim_matches(|c| c == '"' || c == '\'')
        .to_lowercase()
}

/// Restricts an email-like string to the character set the backend accepts:
/// ASCII alphanumerics plus `@ . _ -`. Everything else is dropped.
pub fn restrict_email_charset(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '-'))
        .collect()
}

/// Full pipeline applied before an email leaves the client: normalization
/// first, then the charset restriction.
pub fn sanitize_email(value: &str) -> String {
    restrict_email_charset(&normalize_email(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_direction_marks_and_zero_width_characters() {
        let pasted = "\u{202B}user\u{200B}@\u{200E}example.com\u{202C}";
        assert_eq!(normalize_email(pasted), "user@example.com");
    }

    #[test]
    fn removes_whitespace_including_nbsp_and_trims_quotes() {
        assert_eq!(
            normalize_email("\"User\u{00A0}Name @ Example.COM\""),
            "username@example.com"
        );
    }

    #[test]
    fn nfkc_folds_fullwidth_forms() {
        // Fullwidth "ｕｓｅｒ＠ａ．ｃｏｍ" folds to plain ASCII under NFKC.
        assert_eq!(
            normalize_email("\u{FF55}\u{FF53}\u{FF45}\u{FF52}\u{FF20}\u{FF41}\u{FF0E}\u{FF43}\u{FF4F}\u{FF4D}"),
            "user@a.com"
        );
    }

    #[test]
    fn charset_restriction_drops_everything_else() {
        assert_eq!(
            restrict_email_charset("us*er+tag@exa!mple.com"),
            "usertag@example.com"
        );
        assert_eq!(restrict_email_charset("مستخدم@مثال.com"), "@.com");
    }

    #[test]
    fn full_pipeline_composes_both_steps() {
        assert_eq!(
            sanitize_email(" \u{200F}\"User+One@Example.com\" "),
            "userone@example.com"
        );
    }
}
