//! Attest: test assertions that explain themselves.
//!
//! A failing assertion recovers the source text of its own call, so
//! `check(&mut t, total != 10, &[])` reports `total is 10`. Values are
//! diffed line by line when they span several lines, and structures are
//! compared field by field with every differing path listed.
//!
//! ```rust
//! use attest::host::Recorder;
//! use attest::{cmp, EquivalenceOptions};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct User {
//!     name: &'static str,
//!     id: u32,
//! }
//!
//! let mut t = Recorder::new();
//! let got = User { name: "ada", id: 7 };
//! let want = User { name: "ada", id: 1 };
//! let options = EquivalenceOptions::new().ignore_path("id");
//! attest::deep_equal(&mut t, &got, &want, &options);
//! attest::assert(&mut t, cmp::equal(&got.name, &want.name), &[]);
//! assert!(!t.failed);
//! ```

pub use crate::assert::{
    assert, check, deep_equal, equal, error, error_contains, error_is, error_type, nil_error,
};
pub use crate::comparison::{Comparison, Operand, Outcome};
pub use crate::condition::{Condition, ErrorValue};
pub use crate::engine::{Evaluation, Evaluator, OnFailure};
pub use crate::errors::{ContractViolation, SourceError, ValueError};
pub use crate::host::TestingT;
pub use crate::settings::Settings;
pub use crate::structural::EquivalenceOptions;

pub mod assert;
pub mod cmp;
pub mod comparison;
pub mod condition;
pub mod diff;
pub mod engine;
pub mod errors;
pub mod host;
pub mod message;
pub mod settings;
pub mod source;
pub mod structural;
