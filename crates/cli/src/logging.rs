use tracing_subscriber::{EnvFilter, fmt};

/// Install the stderr subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(level)));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Map a configured level name or its first letter to a filter directive.
/// Unknown values fall back to `info`; `fatal` and `panic` map to `error`.
fn directive(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "t" | "trace" => "trace",
        "d" | "debug" => "debug",
        "w" | "warn" => "warn",
        "e" | "error" | "f" | "fatal" | "p" | "panic" => "error",
        _ => "info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_long_names() {
        assert_eq!(directive("t"), "trace");
        assert_eq!(directive("DEBUG"), "debug");
        assert_eq!(directive("Warn"), "warn");
        assert_eq!(directive("e"), "error");
        assert_eq!(directive("i"), "info");
    }

    #[test]
    fn fatal_and_panic_are_errors() {
        assert_eq!(directive("fatal"), "error");
        assert_eq!(directive("P"), "error");
    }

    #[test]
    fn unknown_level_is_info() {
        assert_eq!(directive("verbose"), "info");
        assert_eq!(directive(""), "info");
    }
}
