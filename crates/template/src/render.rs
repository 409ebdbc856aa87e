//! Template rendering against a [`BuildContext`].

use herald_core::BuildContext;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use tracing::debug;

use crate::context::ContextObject;
use crate::error::TemplateError;
use crate::{dialect, functions};

/// Maximum rendered output size (1 MB).
pub const MAX_RENDERED_BYTES: usize = 1_024 * 1_024;

/// Fuel limit for template evaluation.
const FUEL_LIMIT: u64 = 100_000;

/// Renders message documents with the helper function library installed.
///
/// Referencing a name the context does not define is an error. Output is
/// never escaped and trailing newlines are kept, so a document without
/// directives renders to itself.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_fuel(Some(FUEL_LIMIT));
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        functions::register(&mut env);
        Self { env }
    }

    /// Render `source` with every context field in scope.
    pub fn render(&self, source: &str, ctx: &BuildContext) -> Result<String, TemplateError> {
        let rendered = self.render_engine(&dialect::translate(source), ctx)?;

        if rendered.len() > MAX_RENDERED_BYTES {
            return Err(TemplateError::TooLarge {
                limit: MAX_RENDERED_BYTES,
            });
        }

        debug!(
            input_bytes = source.len(),
            output_bytes = rendered.len(),
            "rendered template"
        );
        Ok(rendered)
    }

    /// Render source that is already in engine syntax.
    fn render_engine(&self, source: &str, ctx: &BuildContext) -> Result<String, TemplateError> {
        Ok(self.env.render_str(source, ContextObject::into_value(ctx))?)
    }

    /// Render a UTF-8 byte buffer.
    pub fn render_bytes(&self, source: &[u8], ctx: &BuildContext) -> Result<String, TemplateError> {
        self.render(std::str::from_utf8(source)?, ctx)
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("fuel", &FUEL_LIMIT)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use herald_core::{BuildInfo, RepositoryInfo};
    use proptest::prelude::*;

    use super::*;

    fn ctx() -> BuildContext {
        BuildContext::new(
            BuildInfo {
                author: "octocat".into(),
                author_email: "Jane@Example.com".into(),
                branch: "main".into(),
                event: "push".into(),
                number: 42,
                ..BuildInfo::default()
            },
            RepositoryInfo {
                full_name: "octo/hello".into(),
                ..RepositoryInfo::default()
            },
        )
    }

    fn render(source: &str) -> String {
        TemplateRenderer::new().render(source, &ctx()).unwrap()
    }

    #[test]
    fn lowercases_author_email_through_pipeline() {
        assert_eq!(render("{{ .BuildAuthorEmail | lower }}"), "jane@example.com");
    }

    #[test]
    fn field_references_in_json_document() {
        let doc = r#"{"text":"{{ .RepositoryFullName }}#{{ .BuildNumber }} by {{ .BuildAuthor }}"}"#;
        assert_eq!(render(doc), r#"{"text":"octo/hello#42 by octocat"}"#);
    }

    #[test]
    fn legacy_alias_renders_same_value() {
        assert_eq!(render("{{ .RepoFullName }}={{ .RepositoryFullName }}"), "octo/hello=octo/hello");
    }

    #[test]
    fn empty_fields_render_empty() {
        assert_eq!(render("[{{ .BuildTag }}]"), "[]");
    }

    #[test]
    fn unknown_field_is_a_render_error() {
        let err = TemplateRenderer::new()
            .render("x{{ .NoSuchField }}y", &ctx())
            .unwrap_err();
        assert!(matches!(err, TemplateError::Render(_)), "{err}");
    }

    #[test]
    fn bare_unknown_name_is_a_render_error() {
        let err = TemplateRenderer::new()
            .render("x{{ nosuch }}y", &ctx())
            .unwrap_err();
        assert!(matches!(err, TemplateError::Render(_)), "{err}");
    }

    #[test]
    fn engine_tag_openers_render_literally() {
        assert_eq!(render("coverage {% of lines"), "coverage {% of lines");
        assert_eq!(
            render("see issue {#42} for {{ .BuildAuthor }}"),
            "see issue {#42} for octocat"
        );
        assert_eq!(render("{% if x %}{# c #}"), "{% if x %}{# c #}");
    }

    #[test]
    fn go_comments_render_nothing() {
        assert_eq!(render("a {{- /* #} */ -}} b{{/* x */}}"), "ab");
    }

    #[test]
    fn conditionals() {
        let source = r#"{{ if eq .BuildEvent "push" }}pushed {{ .BuildBranch }}{{ else }}other{{ end }}"#;
        assert_eq!(render(source), "pushed main");
    }

    #[test]
    fn native_syntax_is_accepted() {
        assert_eq!(render("{{ BuildBranch | upper }}"), "MAIN");
        assert_eq!(render(r#"{{ BuildBranch | trimPrefix("ma") }}"#), "in");
    }

    #[test]
    fn unknown_function_is_a_render_error() {
        let err = TemplateRenderer::new()
            .render("{{ nosuch(.BuildAuthor) }}", &ctx())
            .unwrap_err();
        assert!(matches!(err, TemplateError::Render(_)), "{err}");
    }

    #[test]
    fn unterminated_block_is_a_syntax_error() {
        let err = TemplateRenderer::new()
            .render("{{ if .BuildTag }}never closed", &ctx())
            .unwrap_err();
        assert!(matches!(err, TemplateError::Syntax(_)), "{err}");
    }

    #[test]
    fn runaway_loops_run_out_of_fuel() {
        let err = TemplateRenderer::new()
            .render_engine("{% for i in range(100000) %}{% for j in range(100000) %}{% endfor %}{% endfor %}", &ctx())
            .unwrap_err();
        assert!(matches!(err, TemplateError::Render(_)));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = TemplateRenderer::new()
            .render_bytes(&[0xff, 0xfe], &ctx())
            .unwrap_err();
        assert!(matches!(err, TemplateError::Encoding(_)));
    }

    #[test]
    fn trailing_newline_is_kept() {
        assert_eq!(render("{{ .BuildBranch }}\n"), "main\n");
    }

    proptest! {
        #[test]
        fn text_without_directives_renders_unchanged(
            s in r#"[a-zA-Z0-9 ,.:"\[\]\n\\@#%{}-]*"#.prop_filter("no directive opener", |s: &String| !s.contains("{{"))
        ) {
            prop_assert_eq!(render(&s), s);
        }
    }
}
