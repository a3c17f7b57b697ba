use std::path::{Path, PathBuf};

use super::error::{GitError, GitResult};

/// Marker entry that makes a directory a git working copy. It is a directory
/// in a normal clone and a file in linked worktrees and submodules.
const GIT_MARKER: &str = ".git";

/// Check that `path` exists and is a git working copy.
///
/// Not memoized: the directory is managed outside this process
/// and can be moved or re-cloned between requests.
pub fn ensure_repository(path: &Path) -> GitResult<PathBuf> {
    if !path.is_dir() {
        return Err(GitError::DirectoryNotFound(path.to_path_buf()));
    }

    if !path.join(GIT_MARKER).exists() {
        return Err(GitError::NotARepository(path.to_path_buf()));
    }

    Ok(path.to_path_buf())
}
