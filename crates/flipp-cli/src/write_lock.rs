//! Single-writer lock beside the catalog database.
//!
//! `flipp process` holds `<db>.write.lock` for the whole batch. The file
//! records the owner's pid; when that pid is gone the lock is abandoned and
//! gets cleared on the next attempt.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;

/// How long a second `process` run waits for the first to finish.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(300);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Held for as long as the catalog is being written; the lock file goes
/// away on drop.
#[derive(Debug)]
pub struct CatalogWriteLock {
    path: PathBuf,
}

impl CatalogWriteLock {
    /// Wait up to `wait` for the lock on `db_path`.
    ///
    /// # Errors
    ///
    /// Fails once `wait` has elapsed with another run still holding the lock,
    /// or with a lock file whose owner cannot be determined.
    pub async fn acquire(db_path: &Path, wait: Duration) -> anyhow::Result<Self> {
        let path = lock_path_for(db_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let deadline = Instant::now() + wait;

        loop {
            let contention = match Self::try_create(&path) {
                Ok(lock) => return Ok(lock),
                Err(contention) => contention,
            };
            match contention {
                Contention::Abandoned(pid) => {
                    tracing::warn!(pid, path = %path.display(), "clearing abandoned catalog write lock");
                    let _ = std::fs::remove_file(&path);
                    continue;
                }
                Contention::Failed(_) => return Err(contention.into_error(&path)),
                Contention::Running(_) | Contention::Unreadable(_) => {}
            }
            if Instant::now() >= deadline {
                return Err(contention.into_error(&path));
            }
            tracing::debug!(?contention, "catalog write lock busy");
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_create(path: &Path) -> Result<Self, Contention> {
        Self::try_create_with(path, |file| writeln!(file, "{}", std::process::id()))
    }

    /// Create the lock file and record its owner with `write_owner`. A lock
    /// file whose owner could not be written is removed again.
    fn try_create_with(
        path: &Path,
        write_owner: impl FnOnce(&mut File) -> std::io::Result<()>,
    ) -> Result<Self, Contention> {
        match OpenOptions::new().create_new(true).write(true).open(path) {
            Ok(mut file) => {
                if let Err(err) = write_owner(&mut file).and_then(|()| file.sync_all()) {
                    drop(file);
                    if let Err(remove) = std::fs::remove_file(path) {
                        tracing::warn!(error = %remove, path = %path.display(), "cannot remove half-written catalog lock");
                    }
                    return Err(Contention::Failed(err));
                }
                Ok(Self {
                    path: path.to_path_buf(),
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(Contention::inspect(path))
            }
            Err(err) => Err(Contention::Failed(err)),
        }
    }
}

impl Drop for CatalogWriteLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// `catalog.db` → `catalog.db.write.lock`, in the same directory.
pub fn lock_path_for(db_path: &Path) -> PathBuf {
    let mut name = db_path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".write.lock");
    db_path.with_file_name(name)
}

/// Why the lock file could not be created.
#[derive(Debug)]
enum Contention {
    /// A live process owns it.
    Running(u32),
    /// Owner pid no longer exists.
    Abandoned(u32),
    Unreadable(String),
    /// The lock file could not be created or its owner not recorded.
    Failed(std::io::Error),
}

impl Contention {
    fn inspect(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => return Self::Unreadable(err.to_string()),
        };
        match contents.trim().parse::<u32>() {
            Ok(pid) if pid_is_alive(pid) => Self::Running(pid),
            Ok(pid) => Self::Abandoned(pid),
            Err(_) => Self::Unreadable(format!("unexpected contents {:?}", contents.trim())),
        }
    }

    fn into_error(self, path: &Path) -> anyhow::Error {
        match self {
            Self::Running(pid) => anyhow::anyhow!(
                "another flipp run (pid {pid}) is writing the catalog; try again after it finishes"
            ),
            Self::Abandoned(pid) => anyhow::anyhow!("stale catalog lock from pid {pid} at {}", path.display()),
            Self::Unreadable(reason) => anyhow::anyhow!(
                "cannot read catalog lock {} ({reason}); delete it if no flipp run is active",
                path.display()
            ),
            Self::Failed(err) => {
                anyhow::Error::new(err).context(format!("cannot create catalog lock {}", path.display()))
            }
        }
    }
}

fn pid_is_alive(pid: u32) -> bool {
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use super::*;

    #[test]
    fn lock_sits_beside_the_database() {
        assert_eq!(
            lock_path_for(Path::new("/data/flipp/catalog.db")),
            Path::new("/data/flipp/catalog.db.write.lock")
        );
    }

    #[tokio::test]
    async fn second_run_times_out_while_first_holds_the_lock() {
        let temp = tempfile::tempdir().expect("tempdir should create");
        let db = temp.path().join("catalog.db");

        let first = CatalogWriteLock::acquire(&db, Duration::ZERO).await.expect("first lock");
        assert!(first.path().is_file());

        let err = CatalogWriteLock::acquire(&db, Duration::from_millis(10))
            .await
            .expect_err("lock is held");
        assert!(err.to_string().contains(&std::process::id().to_string()));

        drop(first);
        assert!(!lock_path_for(&db).exists());
        CatalogWriteLock::acquire(&db, Duration::ZERO).await.expect("released lock");
    }

    #[test]
    fn failed_owner_write_removes_the_lock_file() {
        let temp = tempfile::tempdir().expect("tempdir should create");
        let path = lock_path_for(&temp.path().join("catalog.db"));

        let err = CatalogWriteLock::try_create_with(&path, |_| {
            Err(std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full"))
        })
        .expect_err("owner write fails");

        assert!(matches!(err, Contention::Failed(ref e) if e.kind() == std::io::ErrorKind::StorageFull));
        assert!(err.into_error(&path).to_string().contains("cannot create catalog lock"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn garbage_lock_file_is_left_alone() {
        let temp = tempfile::tempdir().expect("tempdir should create");
        let db = temp.path().join("catalog.db");
        std::fs::write(lock_path_for(&db), "not a pid").expect("write lock");

        let err = CatalogWriteLock::acquire(&db, Duration::ZERO)
            .await
            .expect_err("unreadable lock");
        assert!(err.to_string().contains("not a pid"));
        assert!(lock_path_for(&db).exists());
    }
}
