//! Read-through cache of source file contents.
//!
//! Each distinct path is read at most once per process. Entries are never
//! changed after they are filled, including entries recording that a file
//! could not be read.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use once_cell::sync::{Lazy, OnceCell};

type Entry = Arc<OnceCell<Option<Arc<str>>>>;

static CACHE: Lazy<Mutex<HashMap<PathBuf, Entry>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Returns the contents of `path`, reading it on first request.
pub fn read(path: &Path) -> Option<Arc<str>> {
    let entry = {
        let mut cache = CACHE.lock().ok()?;
        Arc::clone(cache.entry(path.to_path_buf()).or_default())
    };
    // The map lock is released; concurrent readers of the same path block
    // on the cell, not on each other.
    entry.get_or_init(|| load(path)).clone()
}

fn load(path: &Path) -> Option<Arc<str>> {
    for candidate in candidates(path) {
        if let Ok(text) = std::fs::read_to_string(&candidate) {
            tracing::debug!(path = %candidate.display(), "loaded source file");
            return Some(Arc::from(text));
        }
    }
    tracing::debug!(path = %path.display(), "source file is not readable");
    None
}

/// The path as given, then relative paths resolved against the package
/// directory and its ancestors (covers workspace-relative paths).
fn candidates(path: &Path) -> Vec<PathBuf> {
    let mut out = vec![path.to_path_buf()];
    if path.is_absolute() {
        return out;
    }
    if let Some(dir) = std::env::var_os("CARGO_MANIFEST_DIR") {
        let dir = PathBuf::from(dir);
        out.extend(dir.ancestors().map(|base| base.join(path)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_and_caches() {
        let path = std::env::temp_dir().join(format!("attest-cache-{}.rs", std::process::id()));
        std::fs::write(&path, "first").unwrap();
        let first = read(&path).unwrap();
        std::fs::write(&path, "second").unwrap();
        let again = read(&path).unwrap();
        assert_eq!(&*first, "first");
        assert!(Arc::ptr_eq(&first, &again));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_none() {
        assert!(read(Path::new("definitely/not/here.rs")).is_none());
    }

    #[test]
    fn test_concurrent_readers_share_entry() {
        let path = Path::new(file!());
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(move || read(path)))
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let first = results[0].clone().expect("this file is readable");
        for other in &results {
            assert!(Arc::ptr_eq(&first, other.as_ref().unwrap()));
        }
    }
}
