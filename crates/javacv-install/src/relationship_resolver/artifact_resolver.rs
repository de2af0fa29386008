//! Resolving a release down to the artifact files to install.

use std::collections::BTreeMap;

use crate::catalog::{Component, ROOT_ARTIFACT};
use crate::platform::PlatformSpecifier;
use crate::repository::filter::{AndFilter, DuplicateFilter, ExclusionFilter, InclusionFilter};
use crate::repository::{ArtifactRepository, Coordinate, Dependency, ResolvedArtifact};
use crate::version::{split_artifact_version, Version};

/// Namespace every installed artifact must belong to.
const NAMESPACE: &str = "bytedeco";
/// Releases after this one publish a GPL build of FFmpeg.
const LAST_RELEASE_WITHOUT_GPL: &str = "1.5.4";
const FFMPEG: &str = "ffmpeg";
const FFMPEG_PLATFORM: &str = "ffmpeg-platform";
const FFMPEG_PLATFORM_GPL: &str = "ffmpeg-platform-gpl";

/// Which FFmpeg build ends up installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecVariant {
	Standard,
	/// The GPL build, which includes codecs the standard build leaves out.
	Gpl,
}

#[derive(Debug, Clone)]
pub struct Resolution {
	/// One artifact per [`group_key()`](ResolvedArtifact::group_key()), sorted by it.
	pub artifacts: Vec<ResolvedArtifact>,
	pub codec: CodecVariant,
}

pub struct ArtifactResolver<'a> {
	repository: &'a dyn ArtifactRepository,
	platform: &'a PlatformSpecifier,
}

impl<'a> ArtifactResolver<'a> {
	pub fn new(repository: &'a dyn ArtifactRepository, platform: &'a PlatformSpecifier) -> Self {
		Self { repository, platform }
	}

	/// Resolves `version` with only the `requested` optional components.
	///
	/// # Parameters
	/// - `available` - Every optional component of the release, the ones not requested are excluded.
	/// - `requested` - Output of [`DependencyExpander::expand()`](super::DependencyExpander::expand()).
	///
	/// # Errors
	/// - [`ResolutionFailed`](crate::Error::ResolutionFailed) when the release can't be resolved.
	/// A failure resolving the GPL build of FFmpeg is only logged.
	pub fn resolve(&self, version: &Version, available: &[Component], requested: &[Component]) -> crate::Result<Resolution> {
		let unrequested: Vec<String> = available.iter()
			.filter(|a| !requested.iter().any(|r| r.name == a.name))
			.map(|a| a.name.clone())
			.collect();
		log::debug!("Excluding components {:?}", unrequested);

		let mut filter = AndFilter::new()
			.with(InclusionFilter::new(NAMESPACE))
			.with(ExclusionFilter::new(unrequested))
			.with(DuplicateFilter::default());

		let root = Dependency::new(Coordinate::bytedeco(ROOT_ARTIFACT, version.as_str()), "compile");
		log::info!("Resolving dependencies of {}", root.coordinate);
		let mut artifacts = self.repository
			.resolve_graph(&root, &mut filter)
			.map_err(|e| super::resolution_failed(&root.coordinate, e))?;

		let mut codec = CodecVariant::Standard;
		let gpl_published = Version::parse(LAST_RELEASE_WITHOUT_GPL)? < *version;
		if gpl_published && requested.iter().any(|c| c.name == FFMPEG) {
			if let Some(gpl) = self.resolve_gpl(&artifacts) {
				codec = CodecVariant::Gpl;
				let native = self.platform.classifier();
				artifacts.retain(|a| {
					let id = &a.coordinate.artifact_id;
					!(id == FFMPEG_PLATFORM || (id == FFMPEG && a.coordinate.classifier == native))
				});
				artifacts.extend(gpl);
			}
		}
		log::debug!("Using {:?} FFmpeg build", codec);

		Ok(Resolution { artifacts: arbitrate(artifacts), codec })
	}

	/// Resolves the GPL build of the FFmpeg version in `artifacts`.
	///
	/// Returns `None` unless the result contains both the GPL wrapper and a GPL native library for this platform.
	fn resolve_gpl(&self, artifacts: &[ResolvedArtifact]) -> Option<Vec<ResolvedArtifact>> {
		let Some(ffmpeg) = artifacts.iter().find(|a| a.coordinate.artifact_id.contains(FFMPEG_PLATFORM)) else {
			log::info!("FFmpeg version not found, keeping the standard build");
			return None;
		};

		let root = Dependency::new(Coordinate::bytedeco(FFMPEG_PLATFORM_GPL, &ffmpeg.coordinate.version), "");
		let mut filter = AndFilter::new()
			.with(InclusionFilter::new(NAMESPACE))
			.with(DuplicateFilter::default());

		log::info!("Resolving optional dependencies of {}", root.coordinate);
		let gpl = match self.repository.resolve_graph(&root, &mut filter) {
			Ok(gpl) => gpl,
			Err(e) => {
				log::warn!("Failed to resolve {}: {}", root.coordinate, e);
				return None;
			},
		};

		let native = format!("{}-gpl", self.platform.classifier());
		let has_wrapper = gpl.iter().any(|a| a.coordinate.artifact_id == FFMPEG_PLATFORM_GPL);
		let has_native = gpl.iter().any(|a| a.coordinate.classifier == native);
		if has_wrapper && has_native {
			Some(gpl)
		} else {
			log::info!("No GPL build of FFmpeg for {}", self.platform);
			None
		}
	}
}

/// Keeps a single artifact per [`group_key()`](ResolvedArtifact::group_key()).
///
/// Versions are compared on the release part after the first hyphen, then on the component
/// part before it when both artifacts have one. The first artifact wins ties and unparseable versions.
pub fn arbitrate(candidates: Vec<ResolvedArtifact>) -> Vec<ResolvedArtifact> {
	let mut selected = BTreeMap::<String, ResolvedArtifact>::new();
	for candidate in candidates {
		let key = candidate.group_key();
		match selected.get(&key) {
			None => {
				selected.insert(key, candidate);
			},
			Some(current) => match supersedes(&candidate.coordinate.version, &current.coordinate.version) {
				Ok(true) => {
					log::trace!("{} replaces {}", candidate.coordinate, current.coordinate);
					selected.insert(key, candidate);
				},
				Ok(false) => {},
				Err(e) => log::warn!("Keeping {} over {}: {}", current.coordinate, candidate.coordinate, e),
			},
		}
	}
	selected.into_values().collect()
}

fn supersedes(candidate: &str, current: &str) -> crate::Result<bool> {
	let (candidate_component, candidate_release) = split_artifact_version(candidate);
	let (current_component, current_release) = split_artifact_version(current);
	match Version::parse(candidate_release)?.cmp(&Version::parse(current_release)?) {
		std::cmp::Ordering::Greater => Ok(true),
		std::cmp::Ordering::Less => Ok(false),
		std::cmp::Ordering::Equal => {
			if candidate_component.is_empty() || current_component.is_empty() {
				return Ok(false);
			}
			Ok(Version::parse(candidate_component)? > Version::parse(current_component)?)
		},
	}
}
