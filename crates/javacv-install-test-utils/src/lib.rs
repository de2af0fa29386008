//! Various helpers for testing
//!
//! functions in this module should use results and not use any panics to avoid confusion in callers

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use javacv_install::installation::record::JsonInstallationStore;
use javacv_install::platform::PlatformProbe;
use javacv_install::repository::*;

#[derive(Debug, thiserror::Error)]
pub enum TestUtilError {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("engine error: {0}")]
	Engine(#[from] javacv_install::Error),
}

/// A platform probe answering with fixed values.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe {
	pub os: &'static str,
	pub is_64bit: bool,
	pub is_arm: bool,
}

impl FixedProbe {
	pub fn linux64() -> Self {
		FixedProbe { os: "linux", is_64bit: true, is_arm: false }
	}
}

impl PlatformProbe for FixedProbe {
	fn os_family(&self) -> &str {
		self.os
	}
	fn is_64bit(&self) -> bool {
		self.is_64bit
	}
	fn is_arm(&self) -> bool {
		self.is_arm
	}
}

/// An in-memory repository whose artifacts are written to a scratch directory when resolved.
pub struct MockRepository {
	versions: Vec<String>,
	descriptors: HashMap<String, Vec<Dependency>>,
	without_content: HashSet<String>,
	content: tempfile::TempDir,
}

impl MockRepository {
	pub fn new() -> Result<Self, TestUtilError> {
		Ok(MockRepository {
			versions: Vec::new(),
			descriptors: HashMap::new(),
			without_content: HashSet::new(),
			content: tempfile::tempdir()?,
		})
	}

	/// Sets the versions published for `javacv-platform`.
	pub fn with_versions(mut self, versions: &[&str]) -> Self {
		self.versions = versions.iter().map(ToString::to_string).collect();
		self
	}

	/// Declares `artifact:version` with compile dependencies given as `(artifact, version, classifier)`.
	pub fn declare(mut self, artifact: &str, version: &str, dependencies: &[(&str, &str, &str)]) -> Self {
		let dependencies = dependencies.iter()
			.map(|(a, v, c)| Dependency::new(Coordinate::bytedeco(*a, *v).with_classifier(*c), "compile"))
			.collect();
		self.descriptors.insert(format!("{}:{}", artifact, version), dependencies);
		self
	}

	/// Resolves the artifact with this file name to a path that doesn't exist.
	pub fn without_content(mut self, file_name: &str) -> Self {
		self.without_content.insert(file_name.to_string());
		self
	}

	/// Where resolved artifact content is written.
	pub fn content_dir(&self) -> &Path {
		self.content.path()
	}

	/// A repository publishing `1.5.0`, `1.5.4` and `1.5.9` with `ffmpeg` and `opencv` components.
	///
	/// From `1.5.9` on `ffmpeg` depends on `opencv`. No GPL build of FFmpeg is published.
	pub fn sample() -> Result<Self, TestUtilError> {
		let mut repository = Self::new()?.with_versions(&["1.5.0", "1.5.4", "1.5.9"]);
		for (release, ffmpeg, opencv) in [("1.5.0", "4.1.3", "4.1.0"), ("1.5.4", "4.3.1", "4.4.0"), ("1.5.9", "6.0", "4.7.0")] {
			let (ffmpeg_version, opencv_version) = (format!("{}-{}", ffmpeg, release), format!("{}-{}", opencv, release));
			let (ffmpeg, opencv) = (ffmpeg_version.as_str(), opencv_version.as_str());

			let mut ffmpeg_dependencies = vec![("ffmpeg", ffmpeg, ""), ("ffmpeg", ffmpeg, "linux-x86_64"), ("javacpp-platform", release, "")];
			if release == "1.5.9" {
				ffmpeg_dependencies.push(("opencv-platform", opencv, ""));
			}

			repository = repository
				.declare("javacv-platform", release, &[
					("javacv", release, ""),
					("javacpp-platform", release, ""),
					("ffmpeg-platform", ffmpeg, ""),
					("opencv-platform", opencv, ""),
				])
				.declare("javacv", release, &[("javacpp", release, "")])
				.declare("javacpp-platform", release, &[("javacpp", release, ""), ("javacpp", release, "linux-x86_64")])
				.declare("javacpp", release, &[])
				.declare("ffmpeg-platform", ffmpeg, &ffmpeg_dependencies)
				.declare("ffmpeg", ffmpeg, &[("javacpp", release, "")])
				.declare("opencv-platform", opencv, &[("opencv", opencv, ""), ("opencv", opencv, "linux-x86_64"), ("javacpp-platform", release, "")])
				.declare("opencv", opencv, &[("javacpp", release, "")]);
		}
		Ok(repository)
	}
}

impl ArtifactRepository for MockRepository {
	fn list_versions(&self, coordinate: &Coordinate) -> Result<Vec<String>, RepositoryError> {
		if coordinate.artifact_id == javacv_install::catalog::ROOT_ARTIFACT {
			Ok(self.versions.clone())
		} else {
			Err(RepositoryError::NotFound(coordinate.to_string()))
		}
	}

	fn fetch_descriptor(&self, coordinate: &Coordinate) -> Result<Vec<Dependency>, RepositoryError> {
		self.descriptors
			.get(&format!("{}:{}", coordinate.artifact_id, coordinate.version))
			.cloned()
			.ok_or_else(|| RepositoryError::NotFound(coordinate.to_string()))
	}

	fn resolve_graph(&self, root: &Dependency, filter: &mut dyn DependencyFilter) -> Result<Vec<ResolvedArtifact>, RepositoryError> {
		graph::collect(self, root, filter)?
			.into_iter()
			.map(|coordinate| {
				let path = self.content.path().join(coordinate.file_name());
				if !self.without_content.contains(&coordinate.file_name()) && !path.exists() {
					std::fs::write(&path, coordinate.to_string())?;
				}
				Ok::<_, RepositoryError>(ResolvedArtifact { coordinate, path })
			})
			.collect()
	}
}

/// A scratch host installation.
pub struct HostFixture {
	dir: tempfile::TempDir,
}

impl HostFixture {
	/// An ImageJ installation, jars live in `plugins/jars`.
	pub fn imagej() -> Result<Self, TestUtilError> {
		let dir = tempfile::tempdir()?;
		std::fs::create_dir_all(dir.path().join("plugins").join("jars"))?;
		Ok(HostFixture { dir })
	}

	/// A Fiji installation, jars live in `jars` and native libraries in a platform subdirectory.
	pub fn fiji() -> Result<Self, TestUtilError> {
		let dir = tempfile::tempdir()?;
		std::fs::create_dir_all(dir.path().join("jars"))?;
		std::fs::write(dir.path().join("db.xml.gz"), b"")?;
		Ok(HostFixture { dir })
	}

	pub fn root(&self) -> &Path {
		self.dir.path()
	}

	pub fn config(&self) -> javacv_install::Config {
		javacv_install::Config::new(self.root())
	}

	/// Creates a file below the root with `content`.
	pub fn add_file(&self, relative: impl AsRef<Path>, content: &[u8]) -> Result<PathBuf, TestUtilError> {
		let path = self.root().join(relative);
		std::fs::create_dir_all(path.with_file_name(""))?;
		std::fs::write(&path, content)?;
		Ok(path)
	}

	/// Where the host picks up a staged change to `relative` on restart.
	pub fn staged(&self, relative: impl AsRef<Path>) -> PathBuf {
		self.root().join("update").join(relative)
	}

	/// Creates an engine for this host with its record kept in the installer directory.
	pub fn engine(&self, repository: MockRepository, probe: FixedProbe) -> Result<javacv_install::EngineContext, TestUtilError> {
		self.engine_with_config(self.config(), repository, probe)
	}

	/// Same as [`engine()`](HostFixture::engine()) but with a config adjusted by the caller.
	pub fn engine_with_config(&self, config: javacv_install::Config, repository: MockRepository, probe: FixedProbe) -> Result<javacv_install::EngineContext, TestUtilError> {
		let store = JsonInstallationStore::in_dir(config.installer_dir());
		Ok(javacv_install::EngineContext::with_parts(config, &probe, Box::new(repository), Box::new(store))?)
	}
}
