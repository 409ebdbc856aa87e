//! Exposes a [`BuildContext`] to the engine as a dynamic object.

use std::sync::Arc;

use herald_core::{BuildContext, ContextValue};
use minijinja::value::{Enumerator, Object, Value};

/// Attribute-style view of a [`BuildContext`]. Every template-visible name
/// resolves through [`BuildContext::get`], so lookups stay type checked on
/// the host side.
#[derive(Debug)]
pub(crate) struct ContextObject(pub(crate) BuildContext);

impl ContextObject {
    pub(crate) fn into_value(ctx: &BuildContext) -> Value {
        Value::from_object(Self(ctx.clone()))
    }
}

impl Object for ContextObject {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let value = self.0.get(key.as_str()?)?;
        Some(match value {
            ContextValue::Text(s) => Value::from(s),
            ContextValue::Number(n) => Value::from(n),
        })
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(BuildContext::FIELD_NAMES)
    }
}
