//! Incremental filter
//!
//! Skips source files whose output is already up to date. A source is kept when
//! its destination file does not exist or is strictly older than the source.
//! Only the filesystem timestamps at call time are consulted; nothing is cached
//! between calls.

use std::io::ErrorKind;
use std::path::Path;

use crate::sources::SourceFile;
use crate::types::{SluiceError, SluiceResult};

/// Keep the sources that are newer than their counterpart under `destination`.
///
/// The counterpart of a source is `destination.join(source.relative)`. A
/// missing destination directory keeps every source.
pub fn filter_newer(sources: Vec<SourceFile>, destination: &Path) -> SluiceResult<Vec<SourceFile>> {
    if !destination.is_dir() {
        return Ok(sources);
    }

    let mut newer = Vec::with_capacity(sources.len());
    for source in sources {
        let target = destination.join(&source.relative);
        let target_modified = match std::fs::metadata(&target) {
            Ok(meta) => meta.modified()?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                newer.push(source);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let source_modified = std::fs::metadata(&source.path)?.modified()?;
        if source_modified > target_modified {
            newer.push(source);
        }
    }
    Ok(newer)
}

/// [`filter_newer`] on the blocking pool, for use from inside a running task
pub async fn filter_newer_async(
    sources: Vec<SourceFile>,
    destination: &Path,
) -> SluiceResult<Vec<SourceFile>> {
    let destination = destination.to_path_buf();
    tokio::task::spawn_blocking(move || filter_newer(sources, &destination))
        .await
        .map_err(|e| SluiceError::Task(format!("timestamp check did not finish: {}", e)))?
}
