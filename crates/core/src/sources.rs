//! Source file discovery
//!
//! Expands a glob such as `src/img/**/*.*` into the files it matches under a
//! project root. Each match also records its path relative to the glob base,
//! the literal directory prefix before the first wildcard (`src/img`), which is
//! what output paths are built from.

use std::collections::VecDeque;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};

use crate::types::{SluiceError, SluiceResult};

const GLOB_META: &[char] = &['*', '?', '[', '{'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Location on disk.
    pub path: PathBuf,
    /// Path below the glob base; joined onto an output directory to place the file.
    pub relative: PathBuf,
}

/// Compile a project-relative glob. `*` stops at `/`, `**` crosses directories.
pub fn compile_glob(pattern: &str) -> SluiceResult<GlobMatcher> {
    GlobBuilder::new(&normalize(pattern))
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| SluiceError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

/// Literal directory prefix of a glob.
///
/// For a pattern without wildcards this is the parent directory, so a single
/// file keeps its own name as its relative path.
pub fn glob_base(pattern: &str) -> PathBuf {
    let pattern = normalize(pattern);
    let components: Vec<&str> = pattern.split('/').filter(|c| !c.is_empty()).collect();
    let literal = components
        .iter()
        .take_while(|c| !c.contains(GLOB_META))
        .count();
    let take = if literal == components.len() {
        literal.saturating_sub(1)
    } else {
        literal
    };
    components[..take].iter().collect()
}

/// [`collect`] on the blocking pool, for walks made from inside a running task
pub async fn collect_async(root: &Path, pattern: &str) -> SluiceResult<Vec<SourceFile>> {
    let root = root.to_path_buf();
    let pattern = pattern.to_string();
    tokio::task::spawn_blocking(move || collect(&root, &pattern))
        .await
        .map_err(|e| SluiceError::Task(format!("source walk did not finish: {}", e)))?
}

/// Every file under `root` matching `pattern`, sorted by path
pub fn collect(root: &Path, pattern: &str) -> SluiceResult<Vec<SourceFile>> {
    let matcher = compile_glob(pattern)?;
    let base = root.join(glob_base(pattern));
    let mut files = Vec::new();

    let mut queue = VecDeque::new();
    queue.push_back(base.clone());

    while let Some(current_dir) = queue.pop_front() {
        let entries = match std::fs::read_dir(&current_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                queue.push_back(path);
            } else if path.is_file() {
                push_if_match(root, &base, &path, &matcher, &mut files);
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn push_if_match(
    root: &Path,
    base: &Path,
    path: &Path,
    matcher: &GlobMatcher,
    files: &mut Vec<SourceFile>,
) {
    let relative_to_root = path.strip_prefix(root).unwrap_or(path);
    if !matcher.is_match(relative_to_root) {
        return;
    }
    let relative = path
        .strip_prefix(base)
        .ok()
        .filter(|r| !r.as_os_str().is_empty())
        .or_else(|| path.file_name().map(Path::new))
        .unwrap_or(path)
        .to_path_buf();
    files.push(SourceFile {
        path: path.to_path_buf(),
        relative,
    });
}

fn normalize(pattern: &str) -> String {
    let trimmed = Path::new(pattern)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    trimmed.join("/")
}
