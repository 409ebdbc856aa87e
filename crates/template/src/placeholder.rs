//! Literal substitution of numeric placeholders.
//!
//! Integer fields usually sit in numeric JSON positions such as
//! `"ts": {{ .BuildCreated }}`. Such a document is not valid JSON until the
//! placeholder is replaced, so these tokens are swapped for their decimal
//! value as raw text before the document is parsed. Every other reference is
//! left for the template pass.

use herald_core::{BuildContext, ContextValue};

/// Integer fields substituted ahead of JSON parsing.
pub const NUMERIC_FIELDS: [&str; 7] = [
    "BuildCreated",
    "BuildEnqueued",
    "BuildFinished",
    "BuildNumber",
    "BuildParent",
    "BuildStarted",
    "RepositoryTimeout",
];

/// The exact token replaced for `field`, e.g. `{{ .BuildNumber }}`.
pub fn placeholder_token(field: &str) -> String {
    format!("{{{{ .{field} }}}}")
}

/// Replace every numeric placeholder token in `document` with the decimal
/// value of its field.
pub fn substitute_numeric(document: &str, ctx: &BuildContext) -> String {
    let mut out = document.to_owned();
    for field in NUMERIC_FIELDS {
        let Some(ContextValue::Number(value)) = ctx.get(field) else {
            continue;
        };
        let token = placeholder_token(field);
        if out.contains(&token) {
            out = out.replace(&token, &value.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use herald_core::{BuildInfo, RepositoryInfo};

    use super::*;

    fn ctx() -> BuildContext {
        BuildContext::new(
            BuildInfo {
                number: 42,
                created: 1_700_000_000,
                parent: 41,
                ..BuildInfo::default()
            },
            RepositoryInfo {
                timeout: 30,
                ..RepositoryInfo::default()
            },
        )
    }

    #[test]
    fn numeric_fields_are_numbers_in_context() {
        let ctx = BuildContext::default();
        for field in NUMERIC_FIELDS {
            assert!(matches!(ctx.get(field), Some(ContextValue::Number(_))));
        }
    }

    #[test]
    fn build_number_becomes_bare_literal() {
        let doc = r##"{"attachments":[{"title":"#{{ .BuildNumber }}","ts":{{ .BuildNumber }}}]}"##;
        assert_eq!(
            substitute_numeric(doc, &ctx()),
            r##"{"attachments":[{"title":"#42","ts":42}]}"##
        );
    }

    #[test]
    fn all_occurrences_are_replaced() {
        let doc = "{{ .BuildCreated }} {{ .BuildParent }} {{ .BuildCreated }} {{ .RepositoryTimeout }}";
        assert_eq!(
            substitute_numeric(doc, &ctx()),
            "1700000000 41 1700000000 30"
        );
    }

    #[test]
    fn zero_values_still_substitute() {
        assert_eq!(
            substitute_numeric("{{ .BuildFinished }}", &BuildContext::default()),
            "0"
        );
    }

    #[test]
    fn other_references_are_left_for_rendering() {
        let doc = r#"{"text":"{{ .BuildAuthor }} {{.BuildNumber}} {{ .RepoTimeout }}"}"#;
        assert_eq!(substitute_numeric(doc, &ctx()), doc);
    }
}
