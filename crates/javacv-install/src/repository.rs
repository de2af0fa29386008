//! Access to the artifact repository JavaCV is published to.
//!
//! The engine only talks to the repository through [`ArtifactRepository`].
//! [`MavenRepository`] implements it over HTTP against a Maven layout repository such as Maven Central.

use std::path::PathBuf;

pub mod filter;
pub mod graph;
mod pom;
mod maven;
pub use maven::MavenRepository;
pub use filter::DependencyFilter;

/// Publisher namespace of every JavaCV artifact.
pub const GROUP_ID: &str = "org.bytedeco";

/// Errors reported by a repository implementation.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
	#[error("{0} not found in repository")]
	NotFound(String),
	#[error("repository unavailable: {0}")]
	Unavailable(String),
	#[error("invalid descriptor for {coordinate}: {reason}")]
	InvalidDescriptor {
		coordinate: String,
		reason: String,
	},
	/// The downloaded content hash does not match the published checksum.
	#[error("checksum mismatch for {0}")]
	DifferentHashes(String),
	#[error("reqwest error: {0}")]
	Reqwest(#[from] reqwest::Error),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
}

/// Identifies a single artifact, `group:artifact:extension[:classifier]:version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
	pub group_id: String,
	pub artifact_id: String,
	pub version: String,
	pub classifier: String,
	pub extension: String,
}

impl Coordinate {
	pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>, version: impl Into<String>) -> Self {
		Coordinate {
			group_id: group_id.into(),
			artifact_id: artifact_id.into(),
			version: version.into(),
			classifier: String::new(),
			extension: "jar".to_string(),
		}
	}

	/// A coordinate in the [`GROUP_ID`] namespace.
	pub fn bytedeco(artifact_id: impl Into<String>, version: impl Into<String>) -> Self {
		Self::new(GROUP_ID, artifact_id, version)
	}

	pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
		self.classifier = classifier.into();
		self
	}

	pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
		self.extension = extension.into();
		self
	}

	/// Key used to pick a single version of an artifact during graph collection.
	pub fn versionless_key(&self) -> String {
		format!("{}:{}:{}:{}", self.group_id, self.artifact_id, self.extension, self.classifier)
	}

	/// File name of the artifact in a Maven layout, e.g. `ffmpeg-6.0-1.5.9-linux-x86_64.jar`.
	pub fn file_name(&self) -> String {
		if self.classifier.is_empty() {
			format!("{}-{}.{}", self.artifact_id, self.version, self.extension)
		} else {
			format!("{}-{}-{}.{}", self.artifact_id, self.version, self.classifier, self.extension)
		}
	}

	/// Relative path of the artifact in a Maven layout.
	pub fn layout_path(&self) -> PathBuf {
		let mut path = PathBuf::new();
		for part in self.group_id.split('.') {
			path.push(part);
		}
		path.join(&self.artifact_id).join(&self.version).join(self.file_name())
	}
}

impl std::fmt::Display for Coordinate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.classifier.is_empty() {
			write!(f, "{}:{}:{}:{}", self.group_id, self.artifact_id, self.extension, self.version)
		} else {
			write!(f, "{}:{}:{}:{}:{}", self.group_id, self.artifact_id, self.extension, self.classifier, self.version)
		}
	}
}

/// A dependency declared in an artifact's descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
	pub coordinate: Coordinate,
	/// Empty when the descriptor doesn't declare one, which means `compile`.
	pub scope: String,
	pub optional: bool,
}

impl Dependency {
	pub fn new(coordinate: Coordinate, scope: impl Into<String>) -> Self {
		Dependency { coordinate, scope: scope.into(), optional: false }
	}

	pub fn is_compile_scope(&self) -> bool {
		self.scope.is_empty() || self.scope.eq_ignore_ascii_case("compile")
	}

	/// Dependencies which end up on the runtime classpath and so are followed during graph collection.
	pub fn is_transitive(&self) -> bool {
		!self.optional && (self.is_compile_scope() || self.scope.eq_ignore_ascii_case("runtime"))
	}
}

/// An artifact whose content has been fetched to the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
	pub coordinate: Coordinate,
	pub path: PathBuf,
}

impl ResolvedArtifact {
	/// Key artifacts are deduplicated by, `artifactId` plus `-classifier` when there is one.
	pub fn group_key(&self) -> String {
		if self.coordinate.classifier.is_empty() {
			self.coordinate.artifact_id.clone()
		} else {
			format!("{}-{}", self.coordinate.artifact_id, self.coordinate.classifier)
		}
	}
}

/// A source of versions, descriptors and artifact content.
///
/// Calls are blocking and are not retried.
pub trait ArtifactRepository {
	/// Lists every published version of `coordinate`'s artifact. The version of `coordinate` is ignored.
	fn list_versions(&self, coordinate: &Coordinate) -> Result<Vec<String>, RepositoryError>;

	/// Reads the dependencies declared by `coordinate`.
	fn fetch_descriptor(&self, coordinate: &Coordinate) -> Result<Vec<Dependency>, RepositoryError>;

	/// Collects the dependency graph rooted at `root` and fetches the content of every node accepted by `filter`.
	fn resolve_graph(&self, root: &Dependency, filter: &mut dyn DependencyFilter) -> Result<Vec<ResolvedArtifact>, RepositoryError>;
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn coordinate_file_name_includes_classifier() {
		let c = Coordinate::bytedeco("ffmpeg", "6.0-1.5.9").with_classifier("linux-x86_64");
		assert_eq!(c.file_name(), "ffmpeg-6.0-1.5.9-linux-x86_64.jar");
		assert_eq!(c.layout_path(), PathBuf::from("org/bytedeco/ffmpeg/6.0-1.5.9/ffmpeg-6.0-1.5.9-linux-x86_64.jar"));
	}

	#[test]
	fn coordinate_display_matches_maven_style() {
		assert_eq!(Coordinate::bytedeco("javacv", "1.5.9").to_string(), "org.bytedeco:javacv:jar:1.5.9");
	}

	#[test]
	fn group_key_appends_classifier() {
		let a = ResolvedArtifact { coordinate: Coordinate::bytedeco("ffmpeg", "6.0-1.5.9").with_classifier("linux-x86_64"), path: PathBuf::new() };
		assert_eq!(a.group_key(), "ffmpeg-linux-x86_64");
	}

	#[test]
	fn test_scope_is_not_transitive() {
		assert!(!Dependency::new(Coordinate::bytedeco("junit", "4"), "test").is_transitive());
		assert!(Dependency::new(Coordinate::bytedeco("javacpp", "1.5.9"), "").is_transitive());
	}
}
