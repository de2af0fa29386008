//! Filesystem operations the host applies on its next start.
//!
//! A running host keeps its jars loaded so they can't be replaced in place. Instead every change is
//! mirrored into the host's `update/` directory: a copy lands at the same position relative to the
//! host root, and an empty file at that position marks the original for removal.

use std::path::{Path, PathBuf};

/// A staged change to an installed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOperation {
	Copy {
		src: PathBuf,
		dst: PathBuf,
	},
	MarkRemoved {
		path: PathBuf,
	},
}

pub trait StagingArea {
	/// Stages removal of `path`. Returns `false` without staging anything when `path` doesn't exist.
	fn stage_removal(&mut self, path: &Path) -> crate::Result<bool>;

	/// Stages `src` to be installed at `dst`.
	///
	/// # Errors
	/// - [`SourceMissing`](crate::Error::SourceMissing) when `src` doesn't exist.
	/// - [`DestinationUnwritable`](crate::Error::DestinationUnwritable) when the target directory can't be created or written.
	/// - [`PartialInstallation`](crate::Error::PartialInstallation) when copying fails.
	fn stage_copy(&mut self, src: &Path, dst: &Path) -> crate::Result<()>;

	/// Undoes everything staged since the area was created.
	fn rollback(&mut self);
	/// Carries out work held back until the run has been committed. Nothing is undone after this.
	fn finish(&mut self) -> crate::Result<()> {
		Ok(())
	}
}

/// Files and directories created during a run, removed again on rollback.
#[derive(Debug, Default)]
struct Created {
	files: Vec<PathBuf>,
	dirs: Vec<PathBuf>,
}

impl Created {
	/// Creates `dir` and its missing parents, remembering each one created.
	fn create_dirs(&mut self, dir: &Path) -> crate::Result<()> {
		let missing: Vec<&Path> = dir.ancestors().take_while(|d| !d.exists()).collect();
		for d in missing.into_iter().rev() {
			std::fs::create_dir(d).map_err(|source| crate::Error::DestinationUnwritable { path: d.to_path_buf(), source })?;
			self.dirs.push(d.to_path_buf());
		}
		Ok(())
	}

	fn remove_all(&mut self) {
		for file in self.files.drain(..) {
			if let Err(e) = std::fs::remove_file(&file) {
				log::warn!("Failed to remove staged file {}: {}", file.display(), e);
			}
		}
		/* Deepest first so parents are empty by the time they're reached */
		self.dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
		for dir in self.dirs.drain(..) {
			let empty = std::fs::read_dir(&dir).map(|mut d| d.next().is_none()).unwrap_or(false);
			if empty {
				let _ = std::fs::remove_dir(&dir);
			}
		}
	}
}

fn ensure_writable(dir: &Path) -> crate::Result<()> {
	let metadata = std::fs::metadata(dir).map_err(|source| crate::Error::DestinationUnwritable { path: dir.to_path_buf(), source })?;
	if metadata.permissions().readonly() {
		return Err(crate::Error::DestinationUnwritable {
			path: dir.to_path_buf(),
			source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "directory is read only"),
		});
	}
	Ok(())
}

fn source_name(src: &Path) -> String {
	src.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| src.display().to_string())
}

/// Stages operations into the host's `update/` directory.
#[derive(Debug)]
pub struct DeferredUpdateArea {
	host_root: PathBuf,
	update_dir: PathBuf,
	created: Created,
}

impl DeferredUpdateArea {
	pub fn new(host_root: impl Into<PathBuf>, update_dir: impl Into<PathBuf>) -> Self {
		Self { host_root: host_root.into(), update_dir: update_dir.into(), created: Created::default() }
	}

	/// Position of `path` inside the update directory.
	///
	/// # Errors
	/// - [`PartialInstallation`](crate::Error::PartialInstallation) when `path` is outside the host root.
	pub fn staged_path(&self, path: &Path) -> crate::Result<PathBuf> {
		let relative = pathdiff::diff_paths(path, &self.host_root)
			.filter(|r| !r.starts_with(".."))
			.ok_or_else(|| crate::Error::PartialInstallation {
				path: path.to_path_buf(),
				reason: format!("not inside {}", self.host_root.display()),
			})?;
		Ok(self.update_dir.join(relative))
	}

	/// Creates the removal placeholder `target` in `dir`, recreating `dir` once if it has gone missing.
	fn place_marker(&mut self, dir: &Path, target: &Path) -> crate::Result<()> {
		match self.create_placeholder(target) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				log::debug!("Recreating {}", dir.display());
				self.created.create_dirs(dir)?;
				self.create_placeholder(target).map_err(|source| crate::Error::DestinationUnwritable { path: target.to_path_buf(), source })
			},
			Err(source) => Err(crate::Error::DestinationUnwritable { path: target.to_path_buf(), source }),
		}
	}

	fn create_placeholder(&mut self, target: &Path) -> std::io::Result<()> {
		let existed = target.exists();
		std::fs::File::create(target)?;
		if !existed {
			self.created.files.push(target.to_path_buf());
		}
		Ok(())
	}
}

impl StagingArea for DeferredUpdateArea {
	fn stage_removal(&mut self, path: &Path) -> crate::Result<bool> {
		if !path.exists() {
			log::trace!("{} already absent", path.display());
			return Ok(false);
		}
		let target = self.staged_path(path)?;
		let dir = target.with_file_name("");
		self.created.create_dirs(&dir)?;
		ensure_writable(&dir)?;
		self.place_marker(&dir, &target)?;
		log::info!("{} will be removed", path.display());
		Ok(true)
	}

	fn stage_copy(&mut self, src: &Path, dst: &Path) -> crate::Result<()> {
		if !src.exists() {
			return Err(crate::Error::SourceMissing { artifact: source_name(src), path: src.to_path_buf() });
		}
		let target = self.staged_path(dst)?;
		let dir = target.with_file_name("");
		self.created.create_dirs(&dir)?;
		ensure_writable(&dir)?;

		let existed = target.exists();
		std::fs::copy(src, &target).map_err(|e| crate::Error::PartialInstallation {
			path: dst.to_path_buf(),
			reason: format!("copying {}: {}", source_name(src), e),
		})?;
		if !existed {
			self.created.files.push(target);
		}
		log::info!("{} will be installed to {}", source_name(src), dst.with_file_name("").display());
		Ok(())
	}

	fn rollback(&mut self) {
		log::debug!("Rolling back staged files in {}", self.update_dir.display());
		self.created.remove_all();
	}
}

/// Applies operations directly, for hosts that don't hold their jars open.
///
/// Copies happen straight away and are undone by [`rollback()`](StagingArea::rollback()).
/// Removals wait for [`finish()`](StagingArea::finish()) so a failed run never leaves the previous installation half removed.
#[derive(Debug, Default)]
pub struct ImmediateDeployment {
	created: Created,
	removals: Vec<PathBuf>,
	copied: Vec<PathBuf>,
}

impl ImmediateDeployment {
	pub fn new() -> Self {
		Self::default()
	}
}

impl StagingArea for ImmediateDeployment {
	fn stage_removal(&mut self, path: &Path) -> crate::Result<bool> {
		if !path.exists() {
			log::trace!("{} already absent", path.display());
			return Ok(false);
		}
		if !self.removals.iter().any(|r| r == path) {
			self.removals.push(path.to_path_buf());
		}
		Ok(true)
	}

	fn stage_copy(&mut self, src: &Path, dst: &Path) -> crate::Result<()> {
		if !src.exists() {
			return Err(crate::Error::SourceMissing { artifact: source_name(src), path: src.to_path_buf() });
		}
		let dir = dst.with_file_name("");
		self.created.create_dirs(&dir)?;
		ensure_writable(&dir)?;

		let existed = dst.exists();
		std::fs::copy(src, dst).map_err(|e| crate::Error::PartialInstallation {
			path: dst.to_path_buf(),
			reason: format!("copying {}: {}", source_name(src), e),
		})?;
		if !existed {
			self.created.files.push(dst.to_path_buf());
		}
		self.copied.push(dst.to_path_buf());
		log::info!("Installed {}", dst.display());
		Ok(())
	}

	fn rollback(&mut self) {
		self.removals.clear();
		self.created.remove_all();
	}

	fn finish(&mut self) -> crate::Result<()> {
		for path in self.removals.drain(..) {
			/* A file installed by this run under the same name stays */
			if self.copied.contains(&path) {
				continue;
			}
			match std::fs::remove_file(&path) {
				Ok(()) => log::info!("Removed {}", path.display()),
				Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
				Err(source) => return Err(crate::Error::DestinationUnwritable { path, source }),
			}
		}
		self.created = Created::default();
		Ok(())
	}
}
