//! Adds the components a requested component depends on.

use crate::catalog::{Component, PLATFORM_SUFFIX};
use crate::repository::ArtifactRepository;
use crate::version::Version;

/// Releases up to this one don't declare dependencies between components.
const FIRST_UNEXPANDED_VERSION: &str = "1.4.4";

pub struct DependencyExpander<'a> {
	repository: &'a dyn ArtifactRepository,
	/// Optional components of the release being expanded.
	available: &'a [Component],
}

impl<'a> DependencyExpander<'a> {
	pub fn new(repository: &'a dyn ArtifactRepository, available: &'a [Component]) -> Self {
		Self { repository, available }
	}

	/// Expands `requested` with every component reachable through component descriptors.
	///
	/// Names that aren't components of the release are dropped with a warning.
	/// The requested components come first in the result, followed by added ones in discovery order.
	///
	/// # Errors
	/// - [`ResolutionFailed`](crate::Error::ResolutionFailed) when a component descriptor can't be read.
	pub fn expand(&self, version: &Version, requested: &[String]) -> crate::Result<Vec<Component>> {
		let mut working = Vec::<Component>::new();
		for name in requested {
			if working.iter().any(|c| &c.name == name) {
				continue;
			}
			match self.available.iter().find(|c| &c.name == name) {
				Some(c) => working.push(c.clone()),
				None => log::warn!("Component {} is not available in version {}", name, version),
			}
		}

		let threshold = Version::parse(FIRST_UNEXPANDED_VERSION)?;
		if *version <= threshold {
			log::debug!("Version {} declares no component interdependencies", version);
			return Ok(working);
		}

		/* `working` grows while it is walked so added components are expanded too */
		let mut i = 0;
		while i < working.len() {
			let coordinate = working[i].coordinate();
			log::trace!("Checking interdependencies of {}", coordinate);
			let dependencies = self.repository
				.fetch_descriptor(&coordinate)
				.map_err(|e| super::resolution_failed(&coordinate, e))?;

			for dependency in dependencies {
				let artifact_id = &dependency.coordinate.artifact_id;
				if !artifact_id.contains(PLATFORM_SUFFIX) {
					continue;
				}
				let name = artifact_id.replace(PLATFORM_SUFFIX, "");
				let known = self.available.iter().any(|c| c.name == name);
				if known && !working.iter().any(|c| c.name == name) {
					log::info!("{} depends on {}", working[i].name, name);
					working.push(Component::new(artifact_id.clone(), dependency.coordinate.version.clone()));
				}
			}
			i += 1;
		}

		log::debug!("Final list of required components: {:?}", working.iter().map(|c| &c.name).collect::<Vec<_>>());
		Ok(working)
	}
}
