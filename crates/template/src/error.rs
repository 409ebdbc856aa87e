use thiserror::Error;

/// Errors produced while rendering a message template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template could not be parsed.
    #[error("template syntax error: {0}")]
    Syntax(String),

    /// Evaluation failed, e.g. an unknown function or a failing helper.
    #[error("template render error: {0}")]
    Render(String),

    /// The rendered output exceeded the size limit.
    #[error("rendered output exceeds maximum size of {limit} bytes")]
    TooLarge { limit: usize },

    /// The template input was not valid UTF-8.
    #[error("template is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        match err.kind() {
            minijinja::ErrorKind::SyntaxError => Self::Syntax(err.to_string()),
            _ => Self::Render(err.to_string()),
        }
    }
}
