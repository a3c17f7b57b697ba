use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::error::{GitError, GitResult};

/// One exclusive lock per repository path.
///
/// Pull and deploy mutate the working tree and switch branches, so at most
/// one of them may run against a given working copy at a time.
#[derive(Debug, Default)]
pub struct RepositoryLocks {
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of a mutating operation; released on drop
#[derive(Debug)]
pub struct RepositoryGuard {
    _guard: OwnedMutexGuard<()>,
}

impl RepositoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `path` without waiting.
    pub fn try_acquire(&self, path: &Path) -> GitResult<RepositoryGuard> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        lock.try_lock_owned()
            .map(|guard| RepositoryGuard { _guard: guard })
            .map_err(|_| GitError::OperationInProgress(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_on_same_path_fails_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let locks = RepositoryLocks::new();

        let guard = locks.try_acquire(dir.path()).unwrap();
        assert!(matches!(
            locks.try_acquire(dir.path()),
            Err(GitError::OperationInProgress(_))
        ));

        drop(guard);
        assert!(locks.try_acquire(dir.path()).is_ok());
    }

    #[test]
    fn different_paths_lock_independently() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let locks = RepositoryLocks::new();

        let _ga = locks.try_acquire(a.path()).unwrap();
        assert!(locks.try_acquire(b.path()).is_ok());
    }
}
