//! Process-wide configuration for assertion evaluation.
//!
//! Settings are read once from the environment the first time an
//! assertion needs them and never change afterwards:
//!
//! | Variable              | Meaning                                     | Default  |
//! |-----------------------|---------------------------------------------|----------|
//! | `ATTEST_SOURCE`       | recover the failing source expression       | on       |
//! | `ATTEST_LOCATOR`      | `caller` or `backtrace`                     | `caller` |
//! | `ATTEST_DIFF_CONTEXT` | unchanged lines shown around a diff hunk    | 2        |
//! | `ATTEST_MAX_DEPTH`    | nesting limit for structural comparison     | 64       |

use std::str::FromStr;

use once_cell::sync::Lazy;

/// How the call site of a failing assertion is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocatorKind {
    /// Use the location captured by `#[track_caller]`.
    #[default]
    Caller,
    /// Walk the live stack with the `backtrace` crate.
    Backtrace,
}

impl FromStr for LocatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "caller" => Ok(LocatorKind::Caller),
            "backtrace" => Ok(LocatorKind::Backtrace),
            other => Err(format!("unknown locator '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source_lookup: bool,
    pub locator: LocatorKind,
    pub diff_context: usize,
    pub max_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_lookup: true,
            locator: LocatorKind::Caller,
            diff_context: 2,
            max_depth: 64,
        }
    }
}

static GLOBAL: Lazy<Settings> = Lazy::new(Settings::from_env);

impl Settings {
    /// The process-wide settings, initialised from the environment on first use.
    pub fn global() -> &'static Settings {
        &GLOBAL
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup. Invalid values are
    /// reported and the default is kept.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Settings::default();

        if let Some(raw) = lookup("ATTEST_SOURCE") {
            match parse_switch(&raw) {
                Some(on) => settings.source_lookup = on,
                None => tracing::warn!(value = %raw, "ignoring invalid ATTEST_SOURCE"),
            }
        }
        if let Some(raw) = lookup("ATTEST_LOCATOR") {
            match raw.parse() {
                Ok(kind) => settings.locator = kind,
                Err(reason) => tracing::warn!(%reason, "ignoring invalid ATTEST_LOCATOR"),
            }
        }
        if let Some(raw) = lookup("ATTEST_DIFF_CONTEXT") {
            match raw.trim().parse() {
                Ok(n) => settings.diff_context = n,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid ATTEST_DIFF_CONTEXT"),
            }
        }
        if let Some(raw) = lookup("ATTEST_MAX_DEPTH") {
            match raw.trim().parse() {
                Ok(n) if n > 0 => settings.max_depth = n,
                _ => tracing::warn!(value = %raw, "ignoring invalid ATTEST_MAX_DEPTH"),
            }
        }

        settings
    }
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        assert_eq!(settings_from(&[]), Settings::default());
    }

    #[test]
    fn test_reads_all_variables() {
        let settings = settings_from(&[
            ("ATTEST_SOURCE", "off"),
            ("ATTEST_LOCATOR", "Backtrace"),
            ("ATTEST_DIFF_CONTEXT", "5"),
            ("ATTEST_MAX_DEPTH", "12"),
        ]);
        assert!(!settings.source_lookup);
        assert_eq!(settings.locator, LocatorKind::Backtrace);
        assert_eq!(settings.diff_context, 5);
        assert_eq!(settings.max_depth, 12);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let settings = settings_from(&[
            ("ATTEST_SOURCE", "maybe"),
            ("ATTEST_LOCATOR", "dwarf"),
            ("ATTEST_DIFF_CONTEXT", "-1"),
            ("ATTEST_MAX_DEPTH", "0"),
        ]);
        assert_eq!(settings, Settings::default());
    }
}
