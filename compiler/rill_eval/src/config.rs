//! Execution context configuration.

/// Default ceiling for a context's stack segment (16 MiB).
pub const DEFAULT_STACK_LIMIT: u32 = 16 * 1024 * 1024;

/// Default maximum nesting of script calls.
pub const DEFAULT_MAX_CALL_DEPTH: u32 = 10_000;

/// Limits and policies of an execution context.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ContextConfig {
    /// Largest size the stack segment may grow to, in bytes.
    pub stack_limit: u32,
    /// Deepest call nesting before `StackOverflow`. Bounds recursion through
    /// functions whose frames are too small to exhaust the stack limit.
    pub max_call_depth: u32,
    /// Whether `restart` zeroes the stack segment.
    pub zero_on_restart: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            stack_limit: DEFAULT_STACK_LIMIT,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            zero_on_restart: true,
        }
    }
}

impl ContextConfig {
    /// Defaults, overridden by `RILL_STACK_LIMIT` and `RILL_MAX_CALL_DEPTH`.
    ///
    /// Unparsable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = ContextConfig::default();
        if let Some(limit) = env_value("RILL_STACK_LIMIT", parse_size) {
            config.stack_limit = limit;
        }
        if let Some(depth) = env_value("RILL_MAX_CALL_DEPTH", parse_count) {
            config.max_call_depth = depth;
        }
        config
    }
}

fn env_value(name: &str, parse: fn(&str) -> Option<u32>) -> Option<u32> {
    let raw = std::env::var(name).ok()?;
    parse(&raw).or_else(|| {
        tracing::warn!(variable = name, value = %raw, "ignoring invalid configuration value");
        None
    })
}

/// Parse a byte count with an optional `K`/`M` suffix (powers of 1024).
pub(crate) fn parse_size(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    let (digits, scale) = match raw.as_bytes().last().copied()? {
        b'k' | b'K' => (&raw[..raw.len() - 1], 1024),
        b'm' | b'M' => (&raw[..raw.len() - 1], 1024 * 1024),
        _ => (raw, 1),
    };
    digits.parse::<u32>().ok()?.checked_mul(scale)
}

/// Parse a plain decimal count.
pub(crate) fn parse_count(raw: &str) -> Option<u32> {
    raw.trim().parse().ok()
}
