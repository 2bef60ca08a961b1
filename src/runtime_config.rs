//! # Runtime Configuration
//!
//! Coroutine runtime settings read from the environment at startup.
//!
//! ## `RAMLR_STACK_SIZE`
//!
//! Stack size for handler and connection coroutines, decimal (`32768`) or hex (`0x8000`).
//! Default `0x8000` (32 KB). Memory cost is roughly `stack_size × live coroutines`.
//!
//! ```bash
//! export RAMLR_STACK_SIZE=0x10000
//! ramlrouter serve --raml conf/default.raml
//! ```

use std::env;

pub const DEFAULT_STACK_SIZE: usize = 0x8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl RuntimeConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = env::var("RAMLR_STACK_SIZE")
            .ok()
            .and_then(|v| parse_size(&v))
            .unwrap_or(DEFAULT_STACK_SIZE);
        Self { stack_size }
    }

    /// Apply to the global `may` scheduler. Call once, before any coroutine is spawned.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
    }
}

fn parse_size(value: &str) -> Option<usize> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
    .filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::parse_size;

    #[test]
    fn parses_decimal_and_hex() {
        assert_eq!(parse_size("16384"), Some(16384));
        assert_eq!(parse_size("0x4000"), Some(0x4000));
        assert_eq!(parse_size(" 0X10 "), Some(16));
        assert_eq!(parse_size("zero"), None);
        assert_eq!(parse_size("0"), None);
    }
}
