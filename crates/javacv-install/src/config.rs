//! Persisted engine configuration.

use std::path::{Path, PathBuf};

/// Maven Central, where JavaCV is published.
pub const DEFAULT_REPOSITORY_URL: &str = "https://repo.maven.apache.org/maven2/";

/// Directory name of the local artifact cache under the host root.
pub const LOCAL_REPOSITORY_DIR: &str = "local-maven-repo";

fn default_timeout_secs() -> u64 {
	60
}

fn default_true() -> bool {
	true
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Config {
	/// Root directory of the ImageJ or Fiji installation being managed.
	host_root: PathBuf,
	#[serde(default = "default_repository_url")]
	repository_url: String,
	#[serde(default = "default_true")]
	https_only: bool,
	/// Verify downloads against published `.sha256` files.
	#[serde(default = "default_true")]
	do_checksums: bool,
	#[serde(default = "default_timeout_secs")]
	timeout_secs: u64,
	/// Write files directly instead of staging them for the next host start.
	#[serde(default)]
	apply_immediately: bool,
	#[serde(default)]
	local_repository: Option<PathBuf>,
}

fn default_repository_url() -> String {
	DEFAULT_REPOSITORY_URL.to_string()
}

impl Default for Config {
	fn default() -> Self {
		Self::new(std::env::current_dir().unwrap_or_default())
	}
}

impl Config {
	pub fn new(host_root: impl Into<PathBuf>) -> Self {
		Self {
			host_root: host_root.into(),
			repository_url: default_repository_url(),
			https_only: true,
			do_checksums: true,
			timeout_secs: default_timeout_secs(),
			apply_immediately: false,
			local_repository: None,
		}
	}

	/// Location of the configuration file, `javacv-install/config.json` in the user's config directory.
	///
	/// # Errors
	/// [`IO`](crate::Error::IO) of kind `NotFound` when neither `XDG_CONFIG_HOME`, `HOME` nor `APPDATA` is set.
	pub fn file_path() -> crate::Result<PathBuf> {
		#[cfg(target_os = "windows")]
		let path = std::env::var("APPDATA").map(PathBuf::from);

		#[cfg(not(target_os = "windows"))]
		let path = std::env::var("XDG_CONFIG_HOME")
			.map(PathBuf::from)
			.or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")));

		let path = path.map_err(|_| std::io::Error::new(std::io::ErrorKind::NotFound, "no configuration directory in environment"))?;
		Ok(path.join("javacv-install").join("config.json"))
	}

	pub fn load_from_disk() -> crate::Result<Config> {
		Self::load_from_path(Self::file_path()?)
	}

	pub fn load_from_path(path: impl AsRef<Path>) -> crate::Result<Config> {
		let file = std::fs::File::open(path)?;
		Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
	}

	pub fn save_to_disk(&self) -> crate::Result<()> {
		self.save_to_path(Self::file_path()?)
	}

	pub fn save_to_path(&self, path: impl AsRef<Path>) -> crate::Result<()> {
		let path = path.as_ref();
		std::fs::create_dir_all(path.with_file_name(""))?;
		let file = std::fs::File::create(path)?;
		serde_json::to_writer_pretty(file, self)?;
		Ok(())
	}

	pub fn host_root(&self) -> &Path {
		&self.host_root
	}
	pub fn set_host_root(&mut self, host_root: PathBuf) {
		self.host_root = host_root;
	}

	/// Directory the installer keeps its record and lock file in.
	pub fn installer_dir(&self) -> PathBuf {
		self.host_root.join("plugins").join("JavaCV_Installer")
	}

	pub fn repository_url(&self) -> &str {
		&self.repository_url
	}
	pub fn set_repository_url(&mut self, repository_url: String) {
		self.repository_url = repository_url;
	}

	pub fn https_only(&self) -> bool {
		self.https_only
	}
	pub fn set_https_only(&mut self, https_only: bool) {
		self.https_only = https_only;
	}

	pub fn do_checksums(&self) -> bool {
		self.do_checksums
	}
	pub fn set_do_checksums(&mut self, do_checksums: bool) {
		self.do_checksums = do_checksums;
	}

	pub fn timeout(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.timeout_secs)
	}
	pub fn set_timeout_secs(&mut self, timeout_secs: u64) {
		self.timeout_secs = timeout_secs;
	}

	pub fn apply_immediately(&self) -> bool {
		self.apply_immediately
	}
	/// Copies go straight into the host. Replaced files are only deleted once the run has been committed.
	pub fn set_apply_immediately(&mut self, apply_immediately: bool) {
		self.apply_immediately = apply_immediately;
	}

	/// Local artifact cache, `local-maven-repo` under the host root unless overridden.
	pub fn local_repository(&self) -> PathBuf {
		self.local_repository.clone().unwrap_or_else(|| self.host_root.join(LOCAL_REPOSITORY_DIR))
	}
	pub fn set_local_repository(&mut self, local_repository: Option<PathBuf>) {
		self.local_repository = local_repository;
	}
}
