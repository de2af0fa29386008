//! Turning a requested release and component selection into the artifacts to install.
//!
//! # Usage
//! 1. [`DependencyExpander::expand()`] grows the requested components with the components they depend on.
//! 1. [`ArtifactResolver::resolve()`] resolves the release with only those components and picks
//! one artifact per file name stem.

mod expansion;
pub use expansion::DependencyExpander;
mod artifact_resolver;
pub use artifact_resolver::{arbitrate, ArtifactResolver, CodecVariant, Resolution};

/// Fails the resolution of `coordinate` with a repository error.
fn resolution_failed(coordinate: &crate::repository::Coordinate, error: crate::repository::RepositoryError) -> crate::Error {
	crate::Error::ResolutionFailed { coordinate: coordinate.to_string(), reason: error.to_string() }
}

/// An in-memory repository for exercising resolution without a network.
#[cfg(test)]
pub(crate) mod fixture {
	use std::collections::HashMap;
	use std::path::PathBuf;

	use crate::repository::*;

	#[derive(Default)]
	pub struct Fixture {
		descriptors: HashMap<String, Vec<Dependency>>,
	}

	impl Fixture {
		/// Declares `artifact:version` with dependencies given as `(artifact, version, classifier)`.
		pub fn with(mut self, artifact: &str, version: &str, dependencies: &[(&str, &str, &str)]) -> Self {
			let dependencies = dependencies.iter()
				.map(|(a, v, c)| Dependency::new(Coordinate::bytedeco(*a, *v).with_classifier(*c), "compile"))
				.collect();
			self.descriptors.insert(format!("{}:{}", artifact, version), dependencies);
			self
		}
	}

	impl ArtifactRepository for Fixture {
		fn list_versions(&self, coordinate: &Coordinate) -> Result<Vec<String>, RepositoryError> {
			Ok(self.descriptors.keys()
				.filter_map(|k| k.split_once(':'))
				.filter(|(a, _)| *a == coordinate.artifact_id)
				.map(|(_, v)| v.to_string())
				.collect())
		}

		fn fetch_descriptor(&self, coordinate: &Coordinate) -> Result<Vec<Dependency>, RepositoryError> {
			self.descriptors
				.get(&format!("{}:{}", coordinate.artifact_id, coordinate.version))
				.cloned()
				.ok_or_else(|| RepositoryError::NotFound(coordinate.to_string()))
		}

		fn resolve_graph(&self, root: &Dependency, filter: &mut dyn DependencyFilter) -> Result<Vec<ResolvedArtifact>, RepositoryError> {
			Ok(graph::collect(self, root, filter)?
				.into_iter()
				.map(|c| ResolvedArtifact { path: PathBuf::from(c.file_name()), coordinate: c })
				.collect())
		}
	}
}
