//! Equivalence options for structural comparison.
//!
//! Options are assembled once, with builder methods, and then only read
//! for the duration of a comparison.

use std::fmt;
use std::sync::Arc;

use crate::errors::ValueError;
use crate::settings::Settings;
use crate::structural::path::{Path, PathPattern};
use crate::structural::value::Value;

/// Custom equality for values of one type.
pub type EqualityFn = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Decides whether a path is left out of the comparison.
pub type IgnorePredicate = Arc<dyn Fn(&Path, &Value) -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub struct EquivalenceOptions {
    ignored_paths: Vec<PathPattern>,
    invalid_paths: Vec<ValueError>,
    ignored_fields: Vec<(String, String)>,
    predicates: Vec<IgnorePredicate>,
    equalities: Vec<(String, EqualityFn)>,
    float_margin: Option<f64>,
    include_internal: bool,
    settings: Option<Settings>,
}

impl EquivalenceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaves out every path matching `pattern`, e.g. `items[*].id`.
    ///
    /// An invalid pattern does not panic here; the comparison using these
    /// options fails with a message naming it.
    pub fn ignore_path(mut self, pattern: &str) -> Self {
        match PathPattern::parse(pattern) {
            Ok(pattern) => self.ignored_paths.push(pattern),
            Err(err) => self.invalid_paths.push(err),
        }
        self
    }

    /// Leaves out field `field` of every struct named `type_name`.
    pub fn ignore_field(mut self, type_name: &str, field: &str) -> Self {
        self.ignored_fields
            .push((type_name.to_string(), field.to_string()));
        self
    }

    /// Leaves out every path for which `predicate` holds on either side.
    pub fn ignore_where(mut self, predicate: impl Fn(&Path, &Value) -> bool + Send + Sync + 'static) -> Self {
        self.predicates.push(Arc::new(predicate));
        self
    }

    /// Compares values whose type descriptor is `type_name` with `equal`
    /// instead of recursing into them.
    pub fn with_equality(
        mut self,
        type_name: &str,
        equal: impl Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.equalities.push((type_name.to_string(), Arc::new(equal)));
        self
    }

    /// Treats floats within `margin` of each other as equal.
    pub fn approximate_floats(mut self, margin: f64) -> Self {
        self.float_margin = Some(margin.abs());
        self
    }

    /// Includes fields whose name starts with `_`.
    pub fn include_internal(mut self) -> Self {
        self.include_internal = true;
        self
    }

    /// Uses `settings` for the nesting limit and diff context instead of
    /// the process-wide settings.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub(crate) fn settings(&self) -> &Settings {
        self.settings.as_ref().unwrap_or_else(|| Settings::global())
    }

    pub(crate) fn invalid_paths(&self) -> &[ValueError] {
        &self.invalid_paths
    }

    pub(crate) fn skips_field(&self, type_name: &str, field: &str) -> bool {
        (!self.include_internal && field.starts_with('_'))
            || self
                .ignored_fields
                .iter()
                .any(|(ty, f)| ty == type_name && f == field)
    }

    /// Whether `path` is ignored, given the values on either side of it.
    pub(crate) fn skips_path(&self, path: &Path, x: Option<&Value>, y: Option<&Value>) -> bool {
        self.ignored_paths.iter().any(|p| p.matches(path))
            || self.predicates.iter().any(|predicate| {
                x.is_some_and(|v| predicate(path, v)) || y.is_some_and(|v| predicate(path, v))
            })
    }

    pub(crate) fn equality_for(&self, type_name: &str) -> Option<&EqualityFn> {
        self.equalities
            .iter()
            .rev()
            .find(|(ty, _)| ty == type_name)
            .map(|(_, f)| f)
    }

    pub(crate) fn floats_equal(&self, a: f64, b: f64) -> bool {
        if a == b || (a.is_nan() && b.is_nan()) {
            return true;
        }
        self.float_margin.is_some_and(|margin| (a - b).abs() <= margin)
    }
}

impl fmt::Debug for EquivalenceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let equalities: Vec<&str> = self.equalities.iter().map(|(ty, _)| ty.as_str()).collect();
        f.debug_struct("EquivalenceOptions")
            .field("ignored_paths", &self.ignored_paths)
            .field("invalid_paths", &self.invalid_paths)
            .field("ignored_fields", &self.ignored_fields)
            .field("predicates", &self.predicates.len())
            .field("equalities", &equalities)
            .field("float_margin", &self.float_margin)
            .field("include_internal", &self.include_internal)
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structural::path::PathStep;

    #[test]
    fn test_internal_fields_skipped_by_default() {
        let options = EquivalenceOptions::new();
        assert!(options.skips_field("User", "_cache"));
        assert!(!options.skips_field("User", "name"));
        assert!(!options.include_internal().skips_field("User", "_cache"));
    }

    #[test]
    fn test_ignore_field_is_per_type() {
        let options = EquivalenceOptions::new().ignore_field("User", "id");
        assert!(options.skips_field("User", "id"));
        assert!(!options.skips_field("Group", "id"));
    }

    #[test]
    fn test_invalid_path_is_kept_for_reporting() {
        let options = EquivalenceOptions::new().ignore_path("a[");
        assert_eq!(options.invalid_paths().len(), 1);
    }

    #[test]
    fn test_predicate_applies_to_either_side() {
        let options =
            EquivalenceOptions::new().ignore_where(|_, v| v.as_str() == Some("volatile"));
        let path = Path(vec![PathStep::Field("note")]);
        let volatile = Value::Str("volatile".into());
        let other = Value::Str("stable".into());
        assert!(options.skips_path(&path, Some(&other), Some(&volatile)));
        assert!(!options.skips_path(&path, Some(&other), None));
    }

    #[test]
    fn test_float_margin() {
        let exact = EquivalenceOptions::new();
        assert!(!exact.floats_equal(0.1 + 0.2, 0.3));
        assert!(exact.floats_equal(f64::NAN, f64::NAN));
        assert!(EquivalenceOptions::new()
            .approximate_floats(1e-9)
            .floats_equal(0.1 + 0.2, 0.3));
    }
}
