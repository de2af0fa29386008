//! Persisted record of what the last successful run installed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// File name of the record inside the installer directory.
pub const RECORD_FILE: &str = "installcfg.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InstallationRecord {
	/// The installed JavaCV release.
	pub version: String,
	#[serde(default)]
	pub components: BTreeSet<String>,
	/// Installed file paths, in their final location rather than the staging area.
	#[serde(default)]
	pub artifacts: BTreeSet<PathBuf>,
}

/// Loads and saves the [`InstallationRecord`] between runs.
pub trait InstallationStore {
	/// Returns `None` when nothing has been installed yet.
	fn load(&self) -> crate::Result<Option<InstallationRecord>>;
	fn save(&self, record: &InstallationRecord) -> crate::Result<()>;
}

/// Keeps the record as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonInstallationStore {
	path: PathBuf,
}

impl JsonInstallationStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// The store used for an installation, [`RECORD_FILE`] in `installer_dir`.
	pub fn in_dir(installer_dir: impl AsRef<Path>) -> Self {
		Self::new(installer_dir.as_ref().join(RECORD_FILE))
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl InstallationStore for JsonInstallationStore {
	/// An unreadable record is treated as missing so a broken file never blocks installing.
	fn load(&self) -> crate::Result<Option<InstallationRecord>> {
		let file = match std::fs::File::open(&self.path) {
			Ok(f) => f,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(e.into()),
		};
		match serde_json::from_reader(std::io::BufReader::new(file)) {
			Ok(record) => Ok(Some(record)),
			Err(e) => {
				log::warn!("Incorrect install config {}: {}", self.path.display(), e);
				Ok(None)
			},
		}
	}

	fn save(&self, record: &InstallationRecord) -> crate::Result<()> {
		std::fs::create_dir_all(self.path.with_file_name(""))?;
		/* Written beside the record then renamed so a failed write keeps the previous record */
		let partial = self.path.with_extension("json.part");
		let file = std::fs::File::create(&partial)?;
		serde_json::to_writer_pretty(&file, record)?;
		file.sync_all()?;
		std::fs::rename(&partial, &self.path)?;
		log::debug!("Saved install record to {}", self.path.display());
		Ok(())
	}
}
