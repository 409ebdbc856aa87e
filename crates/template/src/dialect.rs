//! Translation of pipeline-style directives into engine syntax.
//!
//! CI templates are commonly written in the Go `text/template` style:
//! dotted field references, space-separated command arguments and `|`
//! pipelines that feed the previous value in as the last argument:
//!
//! ```text
//! {{ .BuildAuthorEmail | trimAll "@example.com" | lower }}
//! {{ if eq .BuildEvent "push" }}pushed{{ else }}other{{ end }}
//! ```
//!
//! Each `{{ ... }}` directive in that style is rewritten into nested
//! function calls (`lower(trimAll("@example.com", BuildAuthorEmail))`) and
//! `if` / `else if` / `else` / `end` become block tags. Directives that are
//! not in the pipeline style are passed through with only their `.Field`
//! references rewritten, so native engine expressions keep working. Engine
//! block and comment tags are not directives; they render as written.

use std::borrow::Cow;

use herald_core::BuildContext;

use crate::functions;

/// Rewrite every directive in `source`.
///
/// Only `{{` opens a directive. The engine's own block and comment openers
/// (`{%`, `{#`) are plain text here and are re-emitted as string literals.
pub fn translate(source: &str) -> Cow<'_, str> {
    if !source.contains("{{") && !has_engine_opener(source) {
        return Cow::Borrowed(source);
    }

    let mut translator = Translator::default();
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        push_text(&mut out, &rest[..start]);
        let body_start = start + 2;

        let Some(len) = find_close(&rest[body_start..], "}}") else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };

        out.push_str(&translator.directive(&rest[body_start..body_start + len]));
        rest = &rest[body_start + len + 2..];
    }
    push_text(&mut out, rest);

    Cow::Owned(out)
}

fn has_engine_opener(s: &str) -> bool {
    s.contains("{%") || s.contains("{#")
}

/// Copy literal text, quoting anything the engine would read as a tag.
fn push_text(out: &mut String, text: &str) {
    if !has_engine_opener(text) {
        out.push_str(text);
        return;
    }
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('{', Some(&next @ ('%' | '#'))) => {
                out.push_str("{{ \"{");
                out.push(next);
                out.push_str("\" }}");
                chars.next();
            }
            _ => out.push(c),
        }
    }
}

/// Offset of `close` in `body`, skipping over quoted string literals.
fn find_close(body: &str, close: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => i = skip_quoted(bytes, i)?,
            b'`' => i = i + 1 + body[i + 1..].find('`')? + 1,
            _ if bytes[i..].starts_with(close.as_bytes()) => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Index just past the closing quote of the literal starting at `start`.
fn skip_quoted(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

#[derive(Default)]
struct Translator {
    open_ifs: usize,
}

impl Translator {
    fn directive(&mut self, body: &str) -> String {
        let (trim_left, inner, trim_right) = split_trim_markers(body);
        let l = if trim_left { "-" } else { "" };
        let r = if trim_right { "-" } else { "" };
        let inner = inner.trim();

        if inner.starts_with("/*") && inner.ends_with("*/") {
            return format!("{{#{l} {r}#}}");
        }

        if let Some(tokens) = tokenize(inner) {
            if let Some(tag) = self.block_tag(&tokens) {
                return format!("{{%{l} {tag} {r}%}}");
            }
            if let Some(expr) = pipeline(&tokens) {
                return format!("{{{{{l} {expr} {r}}}}}");
            }
        }

        format!("{{{{{}}}}}", strip_field_dots(body))
    }

    fn block_tag(&mut self, tokens: &[Token]) -> Option<String> {
        match tokens {
            [Token::Ident(kw), cond @ ..] if kw == "if" && !cond.is_empty() => {
                let expr = pipeline(cond)?;
                self.open_ifs += 1;
                Some(format!("if {expr}"))
            }
            [Token::Ident(kw)] if kw == "else" && self.open_ifs > 0 => Some("else".to_owned()),
            [Token::Ident(kw), Token::Ident(kw2), cond @ ..]
                if kw == "else" && kw2 == "if" && self.open_ifs > 0 && !cond.is_empty() =>
            {
                pipeline(cond).map(|expr| format!("elif {expr}"))
            }
            [Token::Ident(kw)] if kw == "end" && self.open_ifs > 0 => {
                self.open_ifs -= 1;
                Some("endif".to_owned())
            }
            _ => None,
        }
    }
}

/// Split `{{- ... -}}` whitespace-trim markers off a directive body.
fn split_trim_markers(body: &str) -> (bool, &str, bool) {
    let (left, body) = match body.strip_prefix('-') {
        Some(rest) if rest.starts_with(char::is_whitespace) => (true, rest),
        _ => (false, body),
    };
    let (right, body) = match body.strip_suffix('-') {
        Some(rest) if rest.ends_with(char::is_whitespace) => (true, rest),
        _ => (false, body),
    };
    (left, body, right)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// `.Name` or `.Name.Sub`, stored without the leading dot.
    Field(String),
    Ident(String),
    /// A double-quoted literal, stored with its quotes.
    Str(String),
    Number(String),
    Pipe,
    Open,
    Close,
}

/// Split a directive into pipeline tokens. Returns `None` for anything that
/// is not plain pipeline syntax.
fn tokenize(s: &str) -> Option<Vec<Token>> {
    let bytes = s.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,
            b'|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            b'(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            b')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            b'"' => {
                let end = skip_quoted(bytes, i)?;
                tokens.push(Token::Str(s[i..end].to_owned()));
                i = end;
            }
            b'`' => {
                let len = s[i + 1..].find('`')?;
                let raw = &s[i + 1..i + 1 + len];
                let escaped = raw.replace('\\', "\\\\").replace('"', "\\\"");
                tokens.push(Token::Str(format!("\"{escaped}\"")));
                i += len + 2;
            }
            b'.' => {
                let end = scan_while(bytes, i, |b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.');
                let path = &s[i + 1..end];
                if path.is_empty() || !path.split('.').all(is_ident) {
                    return None;
                }
                tokens.push(Token::Field(path.to_owned()));
                i = end;
            }
            b'-' | b'0'..=b'9' => {
                let end = scan_while(bytes, i + 1, |b| b.is_ascii_digit() || b == b'.');
                let number = &s[i..end];
                if number == "-" {
                    return None;
                }
                tokens.push(Token::Number(number.to_owned()));
                i = end;
            }
            _ if c.is_ascii_alphabetic() || c == b'_' => {
                let end = scan_while(bytes, i, |b| b.is_ascii_alphanumeric() || b == b'_');
                // `name(` is native call syntax, not a pipeline command.
                if bytes.get(end) == Some(&b'(') {
                    return None;
                }
                tokens.push(Token::Ident(s[i..end].to_owned()));
                i = end;
            }
            _ => return None,
        }
    }

    Some(tokens)
}

fn scan_while(bytes: &[u8], start: usize, pred: impl Fn(u8) -> bool) -> usize {
    let mut end = start;
    while end < bytes.len() && pred(bytes[end]) {
        end += 1;
    }
    end
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Translate `cmd | cmd | ...` into a single expression.
fn pipeline(tokens: &[Token]) -> Option<String> {
    let mut stages = Vec::new();
    let mut depth = 0usize;
    let mut stage_start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Open => depth += 1,
            Token::Close => depth = depth.checked_sub(1)?,
            Token::Pipe if depth == 0 => {
                stages.push(&tokens[stage_start..i]);
                stage_start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    stages.push(&tokens[stage_start..]);

    let mut piped: Option<String> = None;
    for stage in stages {
        let operands = operands(stage)?;
        piped = Some(command(&operands, piped)?);
    }
    piped
}

/// Group a command's tokens into operand expressions, recursing into
/// parenthesized sub-pipelines.
fn operands(tokens: &[Token]) -> Option<Vec<Operand>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            Token::Open => {
                let mut depth = 0usize;
                let mut j = i;
                loop {
                    match tokens.get(j)? {
                        Token::Open => depth += 1,
                        Token::Close => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    j += 1;
                }
                out.push(Operand::Expr(format!("({})", pipeline(&tokens[i + 1..j])?)));
                i = j + 1;
            }
            Token::Field(path) => {
                out.push(Operand::Expr(path.clone()));
                i += 1;
            }
            Token::Ident(name) => {
                out.push(Operand::Ident(name.clone()));
                i += 1;
            }
            Token::Str(lit) | Token::Number(lit) => {
                out.push(Operand::Expr(lit.clone()));
                i += 1;
            }
            Token::Pipe | Token::Close => return None,
        }
    }
    Some(out)
}

enum Operand {
    Ident(String),
    Expr(String),
}

impl Operand {
    fn expr(&self) -> String {
        match self {
            Self::Expr(e) => e.clone(),
            Self::Ident(name) => match name.as_str() {
                "nil" => "none".to_owned(),
                "true" | "false" => name.clone(),
                n if BuildContext::FIELD_NAMES.contains(&n) => n.to_owned(),
                // Anything else is a call, so unknown names fail as functions.
                n => format!("{n}()"),
            },
        }
    }
}

/// Translate one command. The piped value, if any, becomes the final
/// argument.
fn command(operands: &[Operand], piped: Option<String>) -> Option<String> {
    let (head, rest) = operands.split_first()?;

    let name = match head {
        Operand::Ident(name) if is_operator(name) || functions::is_function(name) => name,
        _ if rest.is_empty() && piped.is_none() => return Some(head.expr()),
        _ => return None,
    };

    let mut args: Vec<String> = rest.iter().map(Operand::expr).collect();
    args.extend(piped);

    Some(match name.as_str() {
        "and" | "or" if !args.is_empty() => {
            let sep = format!(" {name} ");
            format!("({})", args.join(sep.as_str()))
        }
        "not" if args.len() == 1 => format!("(not {})", args[0]),
        "and" | "or" | "not" => return None,
        _ => format!("{name}({})", args.join(", ")),
    })
}

/// Logical builtins that are keywords in the engine's expression grammar.
fn is_operator(name: &str) -> bool {
    matches!(name, "and" | "or" | "not")
}

/// Drop the leading dot of `.Field` references outside string literals.
fn strip_field_dots(body: &str) -> Cow<'_, str> {
    if !body.contains('.') {
        return Cow::Borrowed(body);
    }

    let bytes = body.as_bytes();
    let mut out = String::with_capacity(body.len());
    let mut i = 0;
    let mut copied = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                let quote = bytes[i];
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    i += if bytes[i] == b'\\' { 2 } else { 1 };
                }
                i += 1;
            }
            b'.' => {
                let prev = i.checked_sub(1).map(|p| bytes[p]);
                let follows_value =
                    prev.is_some_and(|p| p.is_ascii_alphanumeric() || matches!(p, b'_' | b')' | b']' | b'.'));
                let next_is_ident = bytes
                    .get(i + 1)
                    .is_some_and(|n| n.is_ascii_alphabetic() || *n == b'_');
                if !follows_value && next_is_ident {
                    out.push_str(&body[copied..i]);
                    copied = i + 1;
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    out.push_str(&body[copied.min(body.len())..]);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_without_directives_is_borrowed() {
        let json = r#"{"text":"hello","attachments":[{"title":"x"}]}"#;
        assert!(matches!(translate(json), Cow::Borrowed(_)));
    }

    #[test]
    fn field_reference() {
        assert_eq!(translate("{{ .BuildAuthor }}"), "{{ BuildAuthor }}");
        assert_eq!(translate("{{.BuildAuthor}}"), "{{ BuildAuthor }}");
    }

    #[test]
    fn pipeline_feeds_last_argument() {
        assert_eq!(
            translate(r#"{{ .BuildAuthorEmail | trimAll "@example.com" | lower }}"#),
            r#"{{ lower(trimAll("@example.com", BuildAuthorEmail)) }}"#
        );
    }

    #[test]
    fn command_with_arguments() {
        assert_eq!(
            translate(r#"<@{{ trimAll "@company.com" .BuildAuthorEmail | lower }}>"#),
            r#"<@{{ lower(trimAll("@company.com", BuildAuthorEmail)) }}>"#
        );
    }

    #[test]
    fn parenthesized_sub_pipeline() {
        assert_eq!(
            translate(r#"{{ printf "%s-%d" (.BuildBranch | upper) .BuildNumber }}"#),
            r#"{{ printf("%s-%d", (upper(BuildBranch)), BuildNumber) }}"#
        );
    }

    #[test]
    fn conditionals_become_block_tags() {
        let src = r#"{{ if eq .BuildEvent "push" }}P{{ else if .BuildTag }}T{{ else }}O{{ end }}"#;
        assert_eq!(
            translate(src),
            r#"{% if eq(BuildEvent, "push") %}P{% elif BuildTag %}T{% else %}O{% endif %}"#
        );
    }

    #[test]
    fn logical_builtins_become_operators() {
        assert_eq!(
            translate("{{ if and .BuildTag (not .BuildBranch) }}x{{ end }}"),
            "{% if (BuildTag and ((not BuildBranch))) %}x{% endif %}"
        );
    }

    #[test]
    fn trim_markers_are_kept() {
        assert_eq!(translate("a {{- .BuildAuthor -}} b"), "a {{- BuildAuthor -}} b");
    }

    #[test]
    fn comments_are_translated() {
        assert_eq!(translate("{{/* note */}}"), "{# #}");
        assert_eq!(translate("a {{- /* #} */ -}} b"), "a {#- -#} b");
    }

    #[test]
    fn native_syntax_only_loses_field_dots() {
        assert_eq!(
            translate(r#"{{ .BuildTag if .BuildTag else "none" }}"#),
            r#"{{ BuildTag if BuildTag else "none" }}"#
        );
        assert_eq!(
            translate(r#"{{ BuildAuthor|replace("a", "b") }}"#),
            r#"{{ BuildAuthor|replace("a", "b") }}"#
        );
    }

    #[test]
    fn native_filter_pipeline_is_equivalent() {
        assert_eq!(
            translate("{{ BuildAuthorEmail | lower }}"),
            "{{ lower(BuildAuthorEmail) }}"
        );
    }

    #[test]
    fn dots_inside_string_literals_are_kept() {
        assert_eq!(
            translate(r#"{{ trimSuffix ".com" .BuildHost }}"#),
            r#"{{ trimSuffix(".com", BuildHost) }}"#
        );
        assert_eq!(
            translate(r#"{{ BuildHost ~ " .x" }}"#),
            r#"{{ BuildHost ~ " .x" }}"#
        );
    }

    #[test]
    fn engine_tag_openers_are_quoted_as_text() {
        assert_eq!(translate("coverage {% of lines"), r#"coverage {{ "{%" }} of lines"#);
        assert_eq!(
            translate("see issue {#42} for {{ .BuildAuthor }}"),
            r#"see issue {{ "{#" }}42} for {{ BuildAuthor }}"#
        );
        assert_eq!(
            translate("{% if .BuildTag %}t{% endif %}"),
            r#"{{ "{%" }} if .BuildTag %}t{{ "{%" }} endif %}"#
        );
    }

    #[test]
    fn closing_tag_text_is_untouched() {
        assert!(matches!(translate("50%} and #}"), Cow::Borrowed(_)));
    }

    #[test]
    fn bare_names_outside_the_context_become_calls() {
        assert_eq!(translate("{{ nosuch }}"), "{{ nosuch() }}");
        assert_eq!(translate("{{ BuildAuthor }}"), "{{ BuildAuthor }}");
        assert_eq!(translate("{{ if true }}x{{ end }}"), "{% if true %}x{% endif %}");
        assert_eq!(translate("{{ default nosuch .BuildTag }}"), "{{ default(nosuch(), BuildTag) }}");
    }

    #[test]
    fn unterminated_directive_is_copied() {
        assert_eq!(translate("a {{ .BuildAuthor"), "a {{ .BuildAuthor");
    }

    #[test]
    fn closing_braces_inside_literals_do_not_end_directive() {
        assert_eq!(
            translate(r#"{{ default "}}" .BuildTag }}"#),
            r#"{{ default("}}", BuildTag) }}"#
        );
    }

    #[test]
    fn end_without_open_if_is_left_alone() {
        assert_eq!(translate("{{ end }}"), "{{ end }}");
    }

    #[test]
    fn raw_string_literal_is_requoted() {
        assert_eq!(
            translate(r#"{{ trimAll `"` .BuildTitle }}"#),
            r#"{{ trimAll("\"", BuildTitle) }}"#
        );
    }

    #[test]
    fn unknown_command_head_is_passed_through() {
        assert_eq!(translate("{{ .BuildAuthor .BuildTag }}"), "{{ BuildAuthor BuildTag }}");
    }
}
