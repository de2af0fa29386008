//! Published JavaCV versions and the optional components of each.

use std::collections::HashMap;

use crate::repository::{ArtifactRepository, Coordinate};
use crate::version::Version;

/// The artifact every JavaCV release is published as.
pub const ROOT_ARTIFACT: &str = "javacv-platform";
/// Marker carried by the artifact ids of components which bundle every platform.
pub const PLATFORM_SUFFIX: &str = "-platform";
/// Meta package depended on by every release, not an optional component.
const JAVACPP_PLATFORM: &str = "javacpp-platform";

/// An optional part of a JavaCV release, such as `ffmpeg` or `opencv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
	/// Name with the platform marker removed, e.g. `ffmpeg`.
	pub name: String,
	/// e.g. `ffmpeg-platform`
	pub artifact_id: String,
	/// The component's own version which can differ from the release, e.g. `6.0-1.5.9`.
	pub version: String,
}

impl Component {
	pub fn new(artifact_id: impl Into<String>, version: impl Into<String>) -> Self {
		let artifact_id = artifact_id.into();
		Component {
			name: artifact_id.replace(PLATFORM_SUFFIX, ""),
			artifact_id,
			version: version.into(),
		}
	}

	pub fn coordinate(&self) -> Coordinate {
		Coordinate::bytedeco(&self.artifact_id, &self.version)
	}
}

/// Caches repository queries about releases for the lifetime of an [`EngineContext`](crate::EngineContext).
#[derive(Debug, Default)]
pub struct VersionCatalog {
	versions: Vec<Version>,
	components: HashMap<String, Vec<Component>>,
}

impl VersionCatalog {
	pub fn new() -> Self {
		Self::default()
	}

	/// All published versions in ascending order.
	///
	/// # Errors
	/// - [`RepositoryUnavailable`](crate::Error::RepositoryUnavailable) when the repository can't be queried or lists nothing.
	/// An empty result is not cached so a later call queries again.
	pub fn list_versions(&mut self, repository: &dyn ArtifactRepository) -> crate::Result<&[Version]> {
		if self.versions.is_empty() {
			let published = repository.list_versions(&Coordinate::bytedeco(ROOT_ARTIFACT, ""))?;
			let mut versions: Vec<Version> = published.iter()
				.filter_map(|v| match Version::parse(v) {
					Ok(v) => Some(v),
					Err(_) => {
						log::debug!("Skipping published version {}", v);
						None
					},
				})
				.collect();
			if versions.is_empty() {
				return Err(crate::Error::RepositoryUnavailable("no information about available versions".to_string()));
			}
			versions.sort();
			versions.dedup();
			log::debug!("{} JavaCV versions available", versions.len());
			self.versions = versions;
		}
		Ok(&self.versions)
	}

	pub fn newest_version(&mut self, repository: &dyn ArtifactRepository) -> crate::Result<Version> {
		self.list_versions(repository)?
			.last()
			.cloned()
			.ok_or_else(|| crate::Error::RepositoryUnavailable("no information about available versions".to_string()))
	}

	/// Finds `text` among the versions already listed, returning the published spelling.
	pub fn find(&self, text: &str) -> Option<&Version> {
		let wanted = Version::parse(text).ok()?;
		self.versions.iter().find(|v| **v == wanted)
	}

	pub fn contains(&self, version: &Version) -> bool {
		self.versions.contains(version)
	}

	/// Optional components of `version`.
	///
	/// # Errors
	/// - [`UnknownVersion`](crate::Error::UnknownVersion) when `version` is not published.
	/// - [`RepositoryUnavailable`](crate::Error::RepositoryUnavailable) when the release descriptor can't be read.
	pub fn components_for_version(&mut self, repository: &dyn ArtifactRepository, version: &Version) -> crate::Result<&[Component]> {
		self.list_versions(repository)?;
		let version = match self.find(version.as_str()) {
			Some(v) => v.clone(),
			None => return Err(crate::Error::UnknownVersion {
				requested: version.to_string(),
				suggested: self.versions.last().map(ToString::to_string),
			}),
		};

		if !self.components.contains_key(version.as_str()) {
			let descriptor = repository.fetch_descriptor(&Coordinate::bytedeco(ROOT_ARTIFACT, version.as_str()))?;
			let components: Vec<Component> = descriptor.into_iter()
				.filter(|d| d.is_compile_scope())
				.filter(|d| d.coordinate.artifact_id != JAVACPP_PLATFORM && d.coordinate.artifact_id.contains(PLATFORM_SUFFIX))
				.map(|d| Component::new(d.coordinate.artifact_id, d.coordinate.version))
				.collect();
			log::debug!("Version {} has components {:?}", version, components.iter().map(|c| &c.name).collect::<Vec<_>>());
			self.components.insert(version.to_string(), components);
		}
		Ok(&self.components[version.as_str()])
	}

	/// Sorted names of the optional components of `version`.
	pub fn component_names(&mut self, repository: &dyn ArtifactRepository, version: &Version) -> crate::Result<Vec<String>> {
		let mut names: Vec<String> = self.components_for_version(repository, version)?
			.iter()
			.map(|c| c.name.clone())
			.collect();
		names.sort();
		names.dedup();
		Ok(names)
	}
}
