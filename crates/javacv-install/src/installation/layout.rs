//! Where artifacts go inside the host application.

use std::path::{Path, PathBuf};

use crate::platform::PlatformSpecifier;
use crate::repository::ResolvedArtifact;

/// Update site database present in every Fiji installation.
const FIJI_MARKER: &str = "db.xml.gz";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
	ImageJ,
	Fiji,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
	root: PathBuf,
	kind: HostKind,
	/// Destination of platform independent jars.
	dependencies_dir: PathBuf,
	/// Destination of jars carrying native libraries.
	native_dir: PathBuf,
}

impl InstallLayout {
	/// Works out the layout of the host installed at `root`.
	///
	/// Fiji keeps jars in `jars/` with native libraries in a per platform subdirectory,
	/// ImageJ keeps both in `plugins/jars/`.
	pub fn detect(root: impl Into<PathBuf>, platform: &PlatformSpecifier) -> Self {
		let root = root.into();
		if root.join(FIJI_MARKER).exists() {
			let dependencies_dir = root.join("jars");
			let native_dir = dependencies_dir.join(platform.fiji_native_dir());
			log::debug!("Fiji installation detected at {}", root.display());
			InstallLayout { root, kind: HostKind::Fiji, dependencies_dir, native_dir }
		} else {
			let dependencies_dir = root.join("plugins").join("jars");
			log::debug!("ImageJ installation detected at {}", root.display());
			InstallLayout { native_dir: dependencies_dir.clone(), root, kind: HostKind::ImageJ, dependencies_dir }
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn kind(&self) -> HostKind {
		self.kind
	}

	pub fn dependencies_dir(&self) -> &Path {
		&self.dependencies_dir
	}

	pub fn native_dir(&self) -> &Path {
		&self.native_dir
	}

	/// Directory the host applies staged changes from on its next start.
	pub fn update_dir(&self) -> PathBuf {
		self.root.join("update")
	}

	/// Installed location of `artifact`, keeping its file name.
	pub fn destination_for(&self, artifact: &ResolvedArtifact) -> PathBuf {
		let dir = if artifact.coordinate.classifier.is_empty() { &self.dependencies_dir } else { &self.native_dir };
		match artifact.path.file_name() {
			Some(name) => dir.join(name),
			None => dir.join(artifact.coordinate.file_name()),
		}
	}

	/// Directories artifacts are installed to, without duplicates.
	pub fn install_dirs(&self) -> Vec<&Path> {
		if self.dependencies_dir == self.native_dir {
			vec![&self.dependencies_dir]
		} else {
			vec![&self.dependencies_dir, &self.native_dir]
		}
	}
}
