//! Repair of escaped quotes inside template directives.
//!
//! A directive such as `{{ trimAll "@example.com" .BuildAuthorEmail }}`
//! lives inside a JSON string, so once the message is serialized its string
//! literal quotes arrive as `\"`. The template engine cannot lex a backslash
//! inside a directive, so those escapes are collapsed back to plain quotes
//! before rendering.
//!
//! The repair is a pattern match, not a parser. A `{{ ... }}` span is only
//! touched when it holds at least two escaped quotes (the opening and closing
//! quote of a string literal); a lone escaped quote is indistinguishable from
//! quoted message content and is left alone. Spans are matched lazily and
//! leftmost-first, so a span may reach across an earlier `}}` to find its
//! second escaped quote. That over-reach is part of the observable behavior
//! and is pinned by the tests below.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::bytes::{Captures, NoExpand, Regex};

/// A directive span containing at least two escaped quotes.
static DIRECTIVE_WITH_QUOTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{.*?(\\").*?(\\").*?\}\}"#).expect("directive regex is valid")
});

/// A single backslash-escaped quote.
static ESCAPED_QUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\\""#).expect("escaped quote regex is valid"));

/// Collapse every `\"` to `"` inside directive spans that contain two or more
/// of them. Everything else is returned byte-for-byte.
pub fn normalize_escaped_quotes(input: &[u8]) -> Cow<'_, [u8]> {
    DIRECTIVE_WITH_QUOTES.replace_all(input, |caps: &Captures<'_>| {
        ESCAPED_QUOTE
            .replace_all(&caps[0], NoExpand(b"\""))
            .into_owned()
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn normalize(input: &str) -> String {
        String::from_utf8(normalize_escaped_quotes(input.as_bytes()).into_owned()).unwrap()
    }

    #[test]
    fn collapses_string_literal_inside_directive() {
        let input = r#"{"text":"<@{{ trimAll \"@company.com\" .BuildAuthorEmail | lower }}>"}"#;
        assert_eq!(
            normalize(input),
            r#"{"text":"<@{{ trimAll "@company.com" .BuildAuthorEmail | lower }}>"}"#
        );
    }

    #[test]
    fn leaves_escaped_json_without_directives_alone() {
        let input = r#"{"text":"{\"hello\": \"world\", \"urls\": {\"url_one\": \"https://github.com\"}}"}"#;
        assert!(matches!(
            normalize_escaped_quotes(input.as_bytes()),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn single_escaped_quote_in_directive_is_untouched() {
        let input = r#"{"text":"{{ .BuildTitle \" }}"}"#;
        assert_eq!(normalize(input), input);
    }

    #[test]
    fn escaped_quotes_outside_directives_are_untouched() {
        let input = r#"{"text":"say \"hi\" to {{ .BuildAuthor }}"}"#;
        assert_eq!(normalize(input), input);
    }

    #[test]
    fn collapses_every_escape_in_span_with_more_than_two() {
        let input = r#"{{ ternary \"yes\" \"no\" .X }}"#;
        assert_eq!(normalize(input), r#"{{ ternary "yes" "no" .X }}"#);
    }

    #[test]
    fn double_escaped_quote_loses_one_backslash() {
        let input = r#"{{ f \\\"a\\\" }}"#;
        assert_eq!(normalize(input), r#"{{ f \\"a\\" }}"#);
    }

    #[test]
    fn span_reaches_across_earlier_directive() {
        // Leftmost-first lazy matching starts at the first `{{` and extends
        // until two escaped quotes and a closing `}}` have been seen.
        let input = r#"{{ .A }} \"x\" {{ .B }}"#;
        assert_eq!(normalize(input), r#"{{ .A }} "x" {{ .B }}"#);
    }

    #[test]
    fn spans_do_not_cross_newlines() {
        let input = "{{ .A \\\"\n\\\" }}";
        assert_eq!(normalize(input), input);
    }

    #[test]
    fn unterminated_directive_is_untouched() {
        let input = r#"{{ f \"a\" "#;
        assert_eq!(normalize(input), input);
    }

    proptest! {
        #[test]
        fn no_escaped_quotes_is_identity(s in r#"[a-zA-Z0-9 {}."|:,\\]*"#) {
            prop_assume!(!s.contains("\\\""));
            prop_assert_eq!(normalize(&s), s);
        }

        #[test]
        fn one_escaped_quote_is_identity(
            before in "[a-z {}.]*",
            after in "[a-z {}.]*",
        ) {
            let s = format!("{before}\\\"{after}");
            prop_assert_eq!(normalize(&s), s);
        }

        #[test]
        fn matched_pair_in_directive_collapses(
            head in "[a-zA-Z .|]*",
            literal in "[a-zA-Z0-9@. ]*",
            tail in "[a-zA-Z .|]*",
        ) {
            let input = format!("{{{{{head}\\\"{literal}\\\"{tail}}}}}");
            let expected = format!("{{{{{head}\"{literal}\"{tail}}}}}");
            prop_assert_eq!(normalize(&input), expected);
        }

        #[test]
        fn text_outside_spans_is_preserved(
            prefix in "[a-z ]*",
            suffix in "[a-z ]*",
        ) {
            let input = format!("{prefix}{{{{ f \\\"a\\\" }}}}{suffix}");
            let expected = format!("{prefix}{{{{ f \"a\" }}}}{suffix}");
            prop_assert_eq!(normalize(&input), expected);
        }
    }
}
