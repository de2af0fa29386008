//! The long lived state shared by every part of the engine.

use std::collections::BTreeSet;

use crate::catalog::VersionCatalog;
use crate::installation::layout::InstallLayout;
use crate::installation::record::{InstallationRecord, InstallationStore, JsonInstallationStore};
use crate::installation::{InstallReconciler, InstallRequest, ReconcileReport};
use crate::platform::{HostProbe, PlatformProbe, PlatformSpecifier};
use crate::repository::{ArtifactRepository, MavenRepository};
use crate::version::{Version, VersionRequirement};
use crate::Config;

/// Version of this installer.
pub const INSTALLER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything a run needs, created once per host process.
///
/// Repository answers are cached here, so a context should not outlive the host session it was created for.
pub struct EngineContext {
	pub(crate) config: Config,
	pub(crate) platform: PlatformSpecifier,
	pub(crate) layout: InstallLayout,
	pub(crate) repository: Box<dyn ArtifactRepository>,
	pub(crate) store: Box<dyn InstallationStore>,
	pub(crate) catalog: VersionCatalog,
	pub(crate) record: Option<InstallationRecord>,
	pub(crate) restart_required: bool,
}

impl EngineContext {
	/// Creates a context for the current host using the Maven repository from `config`.
	///
	/// # Errors
	/// - [`UnsupportedPlatform`](crate::Error::UnsupportedPlatform) on hosts JavaCV isn't built for.
	/// - [`RepositoryUnavailable`](crate::Error::RepositoryUnavailable) when the HTTP client can't be created.
	pub fn new(config: Config) -> crate::Result<Self> {
		let platform = PlatformSpecifier::detect(&HostProbe)?;
		let repository = MavenRepository::new(&config, &platform)?;
		let store = JsonInstallationStore::in_dir(config.installer_dir());
		Self::with_parts(config, &HostProbe, Box::new(repository), Box::new(store))
	}

	/// Creates a context from explicit parts, loading the installation record from `store`.
	pub fn with_parts(config: Config, probe: &dyn PlatformProbe, repository: Box<dyn ArtifactRepository>, store: Box<dyn InstallationStore>) -> crate::Result<Self> {
		let platform = PlatformSpecifier::detect(probe)?;
		let layout = InstallLayout::detect(config.host_root(), &platform);
		let record = store.load()?;
		log::debug!("Installed record: {:?}", record);
		Ok(EngineContext {
			config,
			platform,
			layout,
			repository,
			store,
			catalog: VersionCatalog::new(),
			record,
			restart_required: false,
		})
	}

	pub fn installer_version(&self) -> &'static str {
		INSTALLER_VERSION
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn platform(&self) -> &PlatformSpecifier {
		&self.platform
	}

	pub fn layout(&self) -> &InstallLayout {
		&self.layout
	}

	/// `true` once a run has staged changes which need a host restart.
	pub fn restart_required(&self) -> bool {
		self.restart_required
	}

	pub fn available_versions(&mut self) -> crate::Result<Vec<Version>> {
		Ok(self.catalog.list_versions(&*self.repository)?.to_vec())
	}

	pub fn newest_version(&mut self) -> crate::Result<Version> {
		self.catalog.newest_version(&*self.repository)
	}

	/// Names of the optional components of `version`.
	pub fn components_for_version(&mut self, version: &Version) -> crate::Result<Vec<String>> {
		self.catalog.component_names(&*self.repository, version)
	}

	/// The recorded release when it is one the repository publishes.
	///
	/// A record naming anything else is ignored.
	pub fn installed_version(&mut self) -> crate::Result<Option<Version>> {
		let Some(record) = &self.record else { return Ok(None) };
		if record.version.is_empty() {
			return Ok(None);
		}
		self.catalog.list_versions(&*self.repository)?;
		match self.catalog.find(&record.version) {
			Some(v) => Ok(Some(v.clone())),
			None => {
				log::warn!("Incorrect install config, version {} is not published", record.version);
				Ok(None)
			},
		}
	}

	/// Components of the validly recorded installation.
	pub fn installed_components(&mut self) -> crate::Result<BTreeSet<String>> {
		if self.installed_version()?.is_none() {
			return Ok(BTreeSet::new());
		}
		Ok(self.record.as_ref().map(|r| r.components.clone()).unwrap_or_default())
	}

	/// Checks the installed release against `version` as `requirement` describes.
	/// `false` when nothing valid is installed.
	pub fn installed_version_meets(&mut self, version: &str, requirement: VersionRequirement) -> crate::Result<bool> {
		let requested = Version::parse(version)?;
		Ok(self.installed_version()?.map_or(false, |installed| requested.is_met_by(&installed, requirement)))
	}

	/// Runs an [`InstallReconciler`] for `request`.
	pub fn install(&mut self, request: &InstallRequest) -> crate::Result<ReconcileReport> {
		InstallReconciler::new(self).run(request)
	}
}
