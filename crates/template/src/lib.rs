//! Message templating for Herald.
//!
//! A message document passes through three text transformations here:
//!
//! 1. [`substitute_numeric`] swaps numeric placeholders for literal digits so
//!    the raw document parses as JSON.
//! 2. [`normalize_escaped_quotes`] collapses the `\"` escapes that
//!    serialization leaves inside directives.
//! 3. [`TemplateRenderer::render`] evaluates every directive against a
//!    [`herald_core::BuildContext`].

mod context;
pub mod dialect;
pub mod error;
pub mod escape;
pub mod functions;
pub mod placeholder;
pub mod render;

pub use error::TemplateError;
pub use escape::normalize_escaped_quotes;
pub use placeholder::{NUMERIC_FIELDS, placeholder_token, substitute_numeric};
pub use render::{MAX_RENDERED_BYTES, TemplateRenderer};
