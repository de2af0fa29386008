//! Keeps two processes from installing into the same host at once.

use std::path::{Path, PathBuf};

pub const LOCK_FILE: &str = "install.lock";

/// Held for the duration of a run, released when dropped.
pub struct InstallLock {
	_file: fslock::LockFile,
	path: PathBuf,
}

impl InstallLock {
	/// Takes the lock in `installer_dir` without waiting.
	///
	/// # Errors
	/// - [`InstallationLocked`](crate::Error::InstallationLocked) when another process holds it.
	pub fn acquire(installer_dir: &Path) -> crate::Result<Self> {
		std::fs::create_dir_all(installer_dir)?;
		let path = installer_dir.join(LOCK_FILE);
		let mut file = fslock::LockFile::open(&path)?;
		if !file.try_lock()? {
			return Err(crate::Error::InstallationLocked(path));
		}
		log::trace!("Acquired {}", path.display());
		Ok(InstallLock { _file: file, path })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}
