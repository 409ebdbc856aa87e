//! The helper function library available to templates.
//!
//! Functions take their arguments in pipeline order: the value being
//! transformed is always the last argument, so `{{ .X | trimPrefix "v" }}`
//! and `trimPrefix("v", X)` are the same call. The few helpers that are
//! commonly written value-first in native syntax are also registered as
//! filters.

use chrono::{DateTime, Utc};
use minijinja::value::{Rest, Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind};

/// Every function name registered by [`register`].
pub const FUNCTION_NAMES: &[&str] = &[
    "add",
    "atoi",
    "cat",
    "coalesce",
    "contains",
    "date",
    "default",
    "empty",
    "eq",
    "ge",
    "gt",
    "hasPrefix",
    "hasSuffix",
    "join",
    "le",
    "len",
    "lower",
    "lt",
    "ne",
    "nospace",
    "printf",
    "quote",
    "repeat",
    "replace",
    "splitList",
    "squote",
    "sub",
    "ternary",
    "title",
    "toString",
    "trim",
    "trimAll",
    "trimPrefix",
    "trimSuffix",
    "trunc",
    "upper",
];

/// Whether `name` is a library function.
pub fn is_function(name: &str) -> bool {
    FUNCTION_NAMES.contains(&name)
}

/// Install the library into `env`.
pub fn register(env: &mut Environment<'_>) {
    env.add_function("lower", |s: String| s.to_lowercase());
    env.add_function("upper", |s: String| s.to_uppercase());
    env.add_function("title", |s: String| title(&s));
    env.add_function("trim", |s: String| s.trim().to_owned());
    env.add_function("trimAll", |cutset: String, s: String| trim_all(&s, &cutset));
    env.add_function("trimPrefix", |prefix: String, s: String| {
        trim_prefix(&s, &prefix)
    });
    env.add_function("trimSuffix", |suffix: String, s: String| {
        trim_suffix(&s, &suffix)
    });
    env.add_function("trunc", |n: i64, s: String| trunc(&s, n));
    env.add_function("replace", |old: String, new: String, s: String| {
        s.replace(&old, &new)
    });
    env.add_function("repeat", repeat);
    env.add_function("nospace", |s: String| {
        s.chars().filter(|c| !c.is_whitespace()).collect::<String>()
    });
    env.add_function("contains", |needle: String, s: String| s.contains(&needle));
    env.add_function("hasPrefix", |prefix: String, s: String| {
        s.starts_with(&prefix)
    });
    env.add_function("hasSuffix", |suffix: String, s: String| s.ends_with(&suffix));
    env.add_function("quote", |args: Rest<Value>| quote_each(&args, go_quote));
    env.add_function("squote", |args: Rest<Value>| {
        quote_each(&args, |s| format!("'{s}'"))
    });
    env.add_function("cat", |args: Rest<Value>| {
        args.iter()
            .filter(|v| !v.is_none() && !v.is_undefined())
            .map(text)
            .collect::<Vec<_>>()
            .join(" ")
    });
    env.add_function("default", |fallback: Value, given: Option<Value>| {
        match given {
            Some(v) if !is_empty(&v) => v,
            _ => fallback,
        }
    });
    env.add_function("empty", |v: Option<Value>| v.as_ref().is_none_or(is_empty));
    env.add_function("coalesce", |args: Rest<Value>| {
        args.iter()
            .find(|v| !is_empty(v))
            .cloned()
            .unwrap_or(Value::from(()))
    });
    env.add_function("ternary", |yes: Value, no: Value, cond: bool| {
        if cond { yes } else { no }
    });
    env.add_function("toString", |v: Value| text(&v));
    env.add_function("atoi", |s: String| s.trim().parse::<i64>().unwrap_or(0));
    env.add_function("add", |args: Rest<Value>| -> Result<i64, Error> {
        args.iter().try_fold(0i64, |sum, v| {
            sum.checked_add(to_int(v)?).ok_or_else(overflow)
        })
    });
    env.add_function("sub", |a: Value, b: Value| -> Result<i64, Error> {
        to_int(&a)?.checked_sub(to_int(&b)?).ok_or_else(overflow)
    });
    env.add_function("join", join);
    env.add_function("splitList", |sep: String, s: String| {
        s.split(sep.as_str()).map(str::to_owned).collect::<Vec<_>>()
    });
    env.add_function("len", |v: Value| -> Result<usize, Error> {
        v.len().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidOperation,
                format!("len of {} value", v.kind()),
            )
        })
    });
    env.add_function("printf", |format: String, args: Rest<Value>| {
        sprintf(&format, &args)
    });
    env.add_function("date", date);
    env.add_function("eq", |a: Value, others: Rest<Value>| {
        others.iter().any(|b| *b == a)
    });
    env.add_function("ne", |a: Value, b: Value| a != b);
    env.add_function("lt", |a: Value, b: Value| ordered(&a, &b).map(|o| o.is_lt()));
    env.add_function("le", |a: Value, b: Value| ordered(&a, &b).map(|o| o.is_le()));
    env.add_function("gt", |a: Value, b: Value| ordered(&a, &b).map(|o| o.is_gt()));
    env.add_function("ge", |a: Value, b: Value| ordered(&a, &b).map(|o| o.is_ge()));

    env.add_filter("trimAll", |s: String, cutset: String| trim_all(&s, &cutset));
    env.add_filter("trimPrefix", |s: String, prefix: String| {
        trim_prefix(&s, &prefix)
    });
    env.add_filter("trimSuffix", |s: String, suffix: String| {
        trim_suffix(&s, &suffix)
    });
}

/// String form of a value; undefined and none are empty.
fn text(v: &Value) -> String {
    if v.is_undefined() || v.is_none() {
        String::new()
    } else {
        v.to_string()
    }
}

fn is_empty(v: &Value) -> bool {
    match v.kind() {
        ValueKind::Undefined | ValueKind::None => true,
        ValueKind::Bool | ValueKind::Number => !v.is_true(),
        _ => v.len() == Some(0),
    }
}

fn title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    out
}

/// Strip every leading and trailing character found in `cutset`.
fn trim_all(s: &str, cutset: &str) -> String {
    s.trim_matches(|c| cutset.contains(c)).to_owned()
}

fn trim_prefix(s: &str, prefix: &str) -> String {
    s.strip_prefix(prefix).unwrap_or(s).to_owned()
}

fn trim_suffix(s: &str, suffix: &str) -> String {
    s.strip_suffix(suffix).unwrap_or(s).to_owned()
}

/// First `n` characters, or the last `-n` when `n` is negative.
fn trunc(s: &str, n: i64) -> String {
    let count = s.chars().count();
    let keep = usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX);
    if keep >= count {
        return s.to_owned();
    }
    if n >= 0 {
        s.chars().take(keep).collect()
    } else {
        s.chars().skip(count - keep).collect()
    }
}

fn repeat(count: i64, s: String) -> Result<String, Error> {
    let count = usize::try_from(count).map_err(|_| {
        Error::new(ErrorKind::InvalidOperation, "repeat count must not be negative")
    })?;
    if s.len().saturating_mul(count) > crate::render::MAX_RENDERED_BYTES {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            "repeat result exceeds the rendered output limit",
        ));
    }
    Ok(s.repeat(count))
}

fn join(sep: String, list: Value) -> Result<String, Error> {
    if let Some(s) = list.as_str() {
        return Ok(s.to_owned());
    }
    let items: Vec<String> = list.try_iter()?.map(|v| text(&v)).collect();
    Ok(items.join(&sep))
}

fn quote_each(args: &[Value], quote: impl Fn(&str) -> String) -> String {
    args.iter()
        .filter(|v| !v.is_none() && !v.is_undefined())
        .map(|v| quote(&text(v)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Double-quoted literal with backslash escapes.
fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn to_int(v: &Value) -> Result<i64, Error> {
    if let Some(s) = v.as_str() {
        return s.trim().parse().map_err(|_| {
            Error::new(ErrorKind::InvalidOperation, format!("{s:?} is not an integer"))
        });
    }
    i64::try_from(v.clone())
}

fn overflow() -> Error {
    Error::new(ErrorKind::InvalidOperation, "integer overflow")
}

fn ordered(a: &Value, b: &Value) -> Result<std::cmp::Ordering, Error> {
    let comparable = matches!(
        (a.kind(), b.kind()),
        (ValueKind::Number, ValueKind::Number)
            | (ValueKind::String, ValueKind::String)
            | (ValueKind::Bool, ValueKind::Bool)
    );
    if !comparable {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("cannot compare {} with {}", a.kind(), b.kind()),
        ));
    }
    Ok(a.cmp(b))
}

/// Format with `%s`, `%d`, `%v`, `%q`, `%t` and `%%` verbs.
fn sprintf(format: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut args = args.iter();
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        let Some(arg) = args.next() else {
            out.push_str(&format!("%!{verb}(MISSING)"));
            continue;
        };
        match verb {
            's' | 'v' | 'd' | 't' => out.push_str(&text(arg)),
            'q' => out.push_str(&go_quote(&text(arg))),
            other => out.push_str(&format!("%!{other}({arg})")),
        }
    }
    out
}

/// Format an epoch-seconds timestamp with a reference-time layout such as
/// `2006-01-02 15:04:05`. Times are rendered in UTC.
fn date(layout: String, when: Value) -> Result<String, Error> {
    let seconds = to_int(&when)?;
    let time: DateTime<Utc> = DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("timestamp {seconds} is out of range"),
        )
    })?;
    Ok(time.format(&strftime_layout(&layout)).to_string())
}

/// Reference-time layout elements, longest first so that prefixes do not
/// shadow longer elements.
const LAYOUT_ELEMENTS: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Monday", "%A"),
    ("2006", "%Y"),
    ("-07:00", "%:z"),
    ("-0700", "%z"),
    ("Jan", "%b"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("_2", "%e"),
    ("01", "%m"),
    ("02", "%d"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("15", "%H"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
];

fn strftime_layout(layout: &str) -> String {
    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;
    'outer: while let Some(c) = rest.chars().next() {
        for (element, spec) in LAYOUT_ELEMENTS {
            if let Some(tail) = rest.strip_prefix(element) {
                out.push_str(spec);
                rest = tail;
                continue 'outer;
            }
        }
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}
