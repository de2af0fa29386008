//! Bringing the host's installed files in line with a request.
//!
//! # Usage
//! 1. Build an [`InstallRequest`].
//! 1. [`EngineContext::install()`](crate::EngineContext::install()) or [`InstallReconciler::run()`].
//! 1. Check [`ReconcileReport::restart_required`] and ask the user to restart the host if set.

use std::collections::BTreeSet;
use std::path::PathBuf;

pub mod conflicts;
pub mod layout;
pub mod lock;
pub mod record;
pub mod staging;

use crate::relationship_resolver::{ArtifactResolver, CodecVariant, DependencyExpander};
use crate::repository::ResolvedArtifact;
use crate::version::{Version, VersionRequirement};
use crate::EngineContext;
use conflicts::{Conflict, ConflictScanner};
use lock::InstallLock;
use record::InstallationRecord;
use staging::{DeferredUpdateArea, ImmediateDeployment, PendingOperation, StagingArea};

/// Components installed with every release, scanned for conflicts alongside the optional ones.
const CORE_COMPONENTS: [&str; 2] = ["javacv", "javacpp"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallRequest {
	/// The release wanted, the installed one or else the newest when `None`.
	pub version: Option<String>,
	/// Optional component names.
	pub components: Vec<String>,
	/// Copy files even when they are already in place.
	pub force_reinstall: bool,
	pub requirement: VersionRequirement,
	/// Fall back to the installed or newest release when `version` isn't published.
	pub substitute_unknown_version: bool,
}

impl InstallRequest {
	pub fn new(version: Option<&str>, components: impl IntoIterator<Item = impl Into<String>>) -> Self {
		InstallRequest {
			version: version.map(ToString::to_string),
			components: components.into_iter().map(Into::into).collect(),
			..Default::default()
		}
	}

	pub fn force_reinstall(mut self, force: bool) -> Self {
		self.force_reinstall = force;
		self
	}

	pub fn requirement(mut self, requirement: VersionRequirement) -> Self {
		self.requirement = requirement;
		self
	}

	pub fn substitute_unknown_version(mut self, substitute: bool) -> Self {
		self.substitute_unknown_version = substitute;
		self
	}
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
	pub version: Version,
	/// Requested components along with the ones they depend on.
	pub components: Vec<String>,
	pub codec: CodecVariant,
	pub operations: Vec<PendingOperation>,
	pub conflicts: Vec<Conflict>,
	/// The host must restart before the staged operations take effect.
	pub restart_required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
	Start,
	VersionDecided,
	ComponentsResolved,
	PriorVersionRemoved,
	FilesStaged,
	ConflictsSwept,
	Committed,
	Aborted,
}

/// An artifact paired with its installed location.
struct Placement {
	artifact: ResolvedArtifact,
	destination: PathBuf,
}

/// What a run settled on before touching the disk.
struct Prepared {
	prior: Option<Version>,
	target: Version,
	components: Vec<String>,
	codec: CodecVariant,
	placements: Vec<Placement>,
}

pub struct InstallReconciler<'a> {
	context: &'a mut EngineContext,
	state: ReconcileState,
}

impl<'a> InstallReconciler<'a> {
	pub fn new(context: &'a mut EngineContext) -> Self {
		Self { context, state: ReconcileState::Start }
	}

	fn transition(&mut self, state: ReconcileState) {
		log::debug!("{:?} -> {:?}", self.state, state);
		self.state = state;
	}

	pub fn state(&self) -> ReconcileState {
		self.state
	}

	/// Runs the whole reconciliation for `request`.
	///
	/// Nothing is touched until the release has been resolved. Once staging has begun any error
	/// rolls the staging area back, and the installation record is only written when every step succeeded.
	/// The record is read again once the install lock is held so a run never builds on a stale copy.
	///
	/// # Errors
	/// - [`RestartRequired`](crate::Error::RestartRequired) when an earlier run in this context staged changes.
	/// - [`InstallationLocked`](crate::Error::InstallationLocked) while another process is installing.
	/// - [`InvalidVersionFormat`](crate::Error::InvalidVersionFormat) or [`UnknownVersion`](crate::Error::UnknownVersion) for a bad `version`.
	/// - [`RepositoryUnavailable`](crate::Error::RepositoryUnavailable) or [`ResolutionFailed`](crate::Error::ResolutionFailed) from the repository.
	/// - [`PartialInstallation`](crate::Error::PartialInstallation), [`SourceMissing`](crate::Error::SourceMissing) or
	/// [`DestinationUnwritable`](crate::Error::DestinationUnwritable) while staging.
	pub fn run(&mut self, request: &InstallRequest) -> crate::Result<ReconcileReport> {
		if self.context.restart_required {
			return Err(crate::Error::RestartRequired);
		}
		let _lock = InstallLock::acquire(&self.context.config.installer_dir())?;

		let Prepared { prior, target, components, codec, placements } = match self.prepare(request) {
			Ok(prepared) => prepared,
			Err(e) => {
				log::error!("Install request is rejected: {}", e);
				self.transition(ReconcileState::Aborted);
				return Err(e);
			},
		};

		let mut staging: Box<dyn StagingArea> = if self.context.config.apply_immediately() {
			Box::new(ImmediateDeployment::new())
		} else {
			Box::new(DeferredUpdateArea::new(self.context.layout.root(), self.context.layout.update_dir()))
		};

		match self.stage(&mut *staging, request, &target, prior.as_ref(), &placements) {
			Ok((operations, conflicts)) => {
				let restart_required = !operations.is_empty() && !self.context.config.apply_immediately();
				if let Err(e) = self.commit(&target, prior.as_ref(), &components, &placements) {
					staging.rollback();
					self.transition(ReconcileState::Aborted);
					return Err(e);
				}
				if let Err(e) = staging.finish() {
					log::warn!("Failed to remove replaced files, they will be swept on the next run: {}", e);
				}
				self.context.restart_required = restart_required;
				self.transition(ReconcileState::Committed);
				if restart_required {
					log::info!("Host restart is required to complete the installation");
				}
				Ok(ReconcileReport { version: target, components, codec, operations, conflicts, restart_required })
			},
			Err(e) => {
				log::error!("Install operations are rejected: {}", e);
				staging.rollback();
				self.transition(ReconcileState::Aborted);
				Err(e)
			},
		}
	}

	/// Reloads the record and settles the release and its artifacts. Nothing on disk changes here.
	fn prepare(&mut self, request: &InstallRequest) -> crate::Result<Prepared> {
		self.context.record = self.context.store.load()?;
		let prior = self.context.installed_version()?;
		let target = self.decide_version(request, prior.as_ref())?;
		self.transition(ReconcileState::VersionDecided);
		log::info!("Requested JavaCV version: {}", target);

		let (components, codec, placements) = self.resolve(&target, &request.components)?;
		self.transition(ReconcileState::ComponentsResolved);
		Ok(Prepared { prior, target, components, codec, placements })
	}

	fn decide_version(&mut self, request: &InstallRequest, prior: Option<&Version>) -> crate::Result<Version> {
		let context = &mut *self.context;
		let newest = context.catalog.newest_version(&*context.repository)?;
		let suggested = prior.cloned().unwrap_or(newest);

		let mut target = match &request.version {
			None => suggested,
			Some(text) => {
				let requested = Version::parse(text)?;
				match context.catalog.find(requested.as_str()) {
					Some(published) => published.clone(),
					None if request.substitute_unknown_version => {
						log::warn!("Requested JavaCV version ({}) is unknown, using {}", requested, suggested);
						suggested
					},
					None => return Err(crate::Error::UnknownVersion {
						requested: requested.to_string(),
						suggested: Some(suggested.to_string()),
					}),
				}
			},
		};

		if let Some(prior) = prior {
			if target.is_met_by(prior, request.requirement) {
				log::info!("The installed JavaCV version {} meets the requirements", prior);
				target = prior.clone();
			}
		}
		Ok(target)
	}

	fn resolve(&mut self, target: &Version, requested: &[String]) -> crate::Result<(Vec<String>, CodecVariant, Vec<Placement>)> {
		let context = &mut *self.context;
		let repository = &*context.repository;
		let available = context.catalog.components_for_version(repository, target)?.to_vec();

		let expanded = DependencyExpander::new(repository, &available).expand(target, requested)?;
		let resolution = ArtifactResolver::new(repository, &context.platform).resolve(target, &available, &expanded)?;

		let placements = resolution.artifacts
			.into_iter()
			.map(|artifact| {
				let destination = context.layout.destination_for(&artifact);
				log::debug!("{} resolved to {}", artifact.coordinate, artifact.path.display());
				Placement { artifact, destination }
			})
			.collect();
		Ok((expanded.into_iter().map(|c| c.name).collect(), resolution.codec, placements))
	}

	fn stage(
		&mut self,
		staging: &mut dyn StagingArea,
		request: &InstallRequest,
		target: &Version,
		prior: Option<&Version>,
		placements: &[Placement],
	) -> crate::Result<(Vec<PendingOperation>, Vec<Conflict>)> {
		let mut operations = Vec::<PendingOperation>::new();
		let replaced = prior.filter(|p| *p != target);

		if let Some(replaced) = replaced {
			log::info!("The installed JavaCV version ({}) will be changed to {}", replaced, target);
			let previous = self.context.record.as_ref().map(|r| r.artifacts.clone()).unwrap_or_default();
			for path in previous {
				match staging.stage_removal(&path) {
					Ok(true) => operations.push(PendingOperation::MarkRemoved { path }),
					Ok(false) => {},
					Err(e) => return Err(crate::Error::PartialInstallation {
						reason: format!("can't mark previous installation for removal: {}", e),
						path,
					}),
				}
			}
			self.transition(ReconcileState::PriorVersionRemoved);
		}

		/* A destination marked for removal above is replaced, not left to be removed */
		let replaced_paths: BTreeSet<PathBuf> = operations.iter()
			.filter_map(|o| match o {
				PendingOperation::MarkRemoved { path } => Some(path.clone()),
				PendingOperation::Copy { .. } => None,
			})
			.collect();
		for placement in placements {
			if request.force_reinstall || !placement.destination.exists() || replaced_paths.contains(&placement.destination) {
				staging.stage_copy(&placement.artifact.path, &placement.destination)?;
				operations.push(PendingOperation::Copy { src: placement.artifact.path.clone(), dst: placement.destination.clone() });
			}
		}
		self.transition(ReconcileState::FilesStaged);

		let context = &mut *self.context;
		let mut names = context.catalog.component_names(&*context.repository, target)?;
		names.extend(CORE_COMPONENTS.iter().map(ToString::to_string));
		log::trace!("Components checked for conflicts: {:?}", names);

		let conflicts = ConflictScanner::new(&context.platform, target, replaced)
			.scan(&context.layout.install_dirs(), &names, &replaced_paths);
		for conflict in &conflicts {
			if staging.stage_removal(&conflict.path)? {
				operations.push(PendingOperation::MarkRemoved { path: conflict.path.clone() });
			}
		}
		self.transition(ReconcileState::ConflictsSwept);

		Ok((operations, conflicts))
	}

	fn commit(&mut self, target: &Version, prior: Option<&Version>, components: &[String], placements: &[Placement]) -> crate::Result<()> {
		let unchanged = prior.map_or(false, |p| p == target);
		let mut record = match (&self.context.record, unchanged) {
			(Some(previous), true) => previous.clone(),
			_ => InstallationRecord::default(),
		};
		record.version = target.to_string();
		record.components.extend(components.iter().cloned());
		record.artifacts.extend(placements.iter().map(|p| p.destination.clone()));

		self.context.store.save(&record)?;
		self.context.record = Some(record);
		Ok(())
	}
}
