//! Source locators find the call site of a failing assertion.

use std::panic::Location;
use std::path::Path;

use crate::errors::SourceError;
use crate::settings::LocatorKind;
use crate::source::CallSite;

/// Finds the call site `skip_frames` frames above the assertion entry point.
pub trait SourceLocator {
    fn locate(&self, skip_frames: usize) -> Result<CallSite, SourceError>;
}

/// Locates the call through a `#[track_caller]` location.
///
/// The location already names the caller of the outermost tracked
/// function, so this locator knows exactly one frame: any non-zero skip
/// count is reported as `NotFound`.
#[derive(Debug, Clone, Copy)]
pub struct CallerLocator {
    location: &'static Location<'static>,
}

impl CallerLocator {
    #[track_caller]
    pub fn here() -> Self {
        Self {
            location: Location::caller(),
        }
    }

    pub fn new(location: &'static Location<'static>) -> Self {
        Self { location }
    }
}

impl SourceLocator for CallerLocator {
    fn locate(&self, skip_frames: usize) -> Result<CallSite, SourceError> {
        if skip_frames > 0 {
            return Err(SourceError::not_found(format!(
                "caller location cannot skip {skip_frames} frames"
            )));
        }
        CallSite::read(
            Path::new(self.location.file()),
            self.location.line(),
            self.location.column(),
        )
    }
}

/// Locates the call by walking the live stack.
///
/// Frames belonging to attest itself, to the standard library, to the
/// test harness or to `backtrace` are dropped; `skip_frames` then counts
/// the remaining frames outward from the assertion's caller. Frames
/// without debug info cannot be resolved and end the search.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceLocator;

const INTERNAL_PREFIXES: &[&str] = &[
    "attest::",
    "backtrace::",
    "std::",
    "core::",
    "alloc::",
    "test::",
    "__rust",
];

impl BacktraceLocator {
    fn is_internal(name: &str) -> bool {
        let name = name.trim_start_matches('<');
        if name.starts_with("attest::") && name.contains("::tests::") {
            // attest's own unit tests are callers like any other.
            return false;
        }
        INTERNAL_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
    }
}

impl SourceLocator for BacktraceLocator {
    fn locate(&self, skip_frames: usize) -> Result<CallSite, SourceError> {
        let trace = backtrace::Backtrace::new();
        let mut external = trace
            .frames()
            .iter()
            .flat_map(|frame| frame.symbols())
            .filter(|symbol| {
                symbol
                    .name()
                    .map(|name| !Self::is_internal(&format!("{name:#}")))
                    .unwrap_or(false)
            });
        let symbol = external.nth(skip_frames).ok_or_else(|| {
            SourceError::not_found(format!("stack has no caller frame at depth {skip_frames}"))
        })?;

        let (Some(file), Some(line)) = (symbol.filename(), symbol.lineno()) else {
            return Err(SourceError::not_found("caller frame has no debug info"));
        };
        CallSite::read(file, line, symbol.colno().unwrap_or(1))
    }
}

/// Returns a preset call site. For hosts that know the call site already
/// and for tests.
#[derive(Debug, Clone, Default)]
pub struct FixedLocator {
    site: Option<CallSite>,
}

impl FixedLocator {
    pub fn new(site: CallSite) -> Self {
        Self { site: Some(site) }
    }

    /// A locator that never finds anything.
    pub fn none() -> Self {
        Self { site: None }
    }
}

impl SourceLocator for FixedLocator {
    fn locate(&self, skip_frames: usize) -> Result<CallSite, SourceError> {
        match (&self.site, skip_frames) {
            (Some(site), 0) => Ok(site.clone()),
            (Some(_), n) => Err(SourceError::not_found(format!(
                "fixed call site cannot skip {n} frames"
            ))),
            (None, _) => Err(SourceError::not_found("no call site configured")),
        }
    }
}

/// The locator configured by `kind`, anchored at `location`.
pub fn locator_for(kind: LocatorKind, location: &'static Location<'static>) -> Box<dyn SourceLocator> {
    match kind {
        LocatorKind::Caller => Box::new(CallerLocator::new(location)),
        LocatorKind::Backtrace => Box::new(BacktraceLocator),
    }
}
