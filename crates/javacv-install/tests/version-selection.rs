use javacv_install::installation::{InstallReconciler, ReconcileState};
use javacv_install::installation::record::{InstallationRecord, InstallationStore, JsonInstallationStore};
use javacv_install::{Error, InstallRequest, VersionRequirement};
use javacv_install_test_utils::{FixedProbe, HostFixture, MockRepository};

fn install_in_place(host: &HostFixture, version: &str) {
	let mut config = host.config();
	config.set_apply_immediately(true);
	host.engine_with_config(config, MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap()
		.install(&InstallRequest::new(Some(version), ["ffmpeg"])).unwrap();
}

#[test]
fn newest_release_is_installed_by_default() {
	let host = HostFixture::imagej().unwrap();
	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	let report = engine.install(&InstallRequest::new(None, ["opencv"])).unwrap();
	assert_eq!(report.version.as_str(), "1.5.9");
}

#[test]
fn installed_release_is_kept_by_default() {
	let host = HostFixture::imagej().unwrap();
	install_in_place(&host, "1.5.4");

	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	let report = engine.install(&InstallRequest::new(None, ["ffmpeg"])).unwrap();
	assert_eq!(report.version.as_str(), "1.5.4");
	assert!(report.operations.is_empty());
}

#[test]
fn unknown_version_is_rejected_with_suggestion() {
	let host = HostFixture::imagej().unwrap();
	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	match engine.install(&InstallRequest::new(Some("1.5.7"), ["ffmpeg"])) {
		Err(Error::UnknownVersion { requested, suggested }) => {
			assert_eq!(requested, "1.5.7");
			assert_eq!(suggested.as_deref(), Some("1.5.9"));
		},
		other => panic!("expected UnknownVersion, got {:?}", other),
	}
	assert!(!host.root().join("update").exists());
}

#[test]
fn unknown_version_can_be_substituted() {
	let host = HostFixture::imagej().unwrap();
	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	let request = InstallRequest::new(Some("1.5.7"), ["ffmpeg"]).substitute_unknown_version(true);
	assert_eq!(engine.install(&request).unwrap().version.as_str(), "1.5.9");
}

#[test]
fn malformed_version_is_rejected() {
	let host = HostFixture::imagej().unwrap();
	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	let result = engine.install(&InstallRequest::new(Some("1.5.x"), ["ffmpeg"]));
	assert!(matches!(result, Err(Error::InvalidVersionFormat(_))));
}

#[test]
fn newer_installed_release_satisfies_minimum() {
	let host = HostFixture::imagej().unwrap();
	install_in_place(&host, "1.5.4");

	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	assert!(engine.installed_version_meets("1.5.0", VersionRequirement::RequireAtLeast).unwrap());
	assert!(!engine.installed_version_meets("1.5.0", VersionRequirement::RequireExact).unwrap());

	let request = InstallRequest::new(Some("1.5.0"), ["ffmpeg"]).requirement(VersionRequirement::RequireAtLeast);
	let report = engine.install(&request).unwrap();
	assert_eq!(report.version.as_str(), "1.5.4");
	assert!(!report.restart_required);
}

#[test]
fn exact_requirement_downgrades() {
	let host = HostFixture::imagej().unwrap();
	install_in_place(&host, "1.5.4");

	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	let report = engine.install(&InstallRequest::new(Some("1.5.0"), ["ffmpeg"])).unwrap();
	assert_eq!(report.version.as_str(), "1.5.0");
	assert!(host.staged("plugins/jars/javacv-1.5.0.jar").exists());
	assert!(host.staged("plugins/jars/javacv-1.5.4.jar").exists());
}

#[test]
fn record_of_unpublished_release_is_ignored() {
	let host = HostFixture::imagej().unwrap();
	let store = JsonInstallationStore::in_dir(host.config().installer_dir());
	store.save(&InstallationRecord { version: "1.4.0".to_string(), ..Default::default() }).unwrap();

	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	assert!(engine.installed_version().unwrap().is_none());
	assert!(engine.installed_components().unwrap().is_empty());
	assert!(!engine.installed_version_meets("1.4.0", VersionRequirement::RequireAtLeast).unwrap());
}

#[test]
fn corrupt_record_is_ignored() {
	let host = HostFixture::imagej().unwrap();
	host.add_file("plugins/JavaCV_Installer/installcfg.json", b"{ not json").unwrap();

	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	assert!(engine.installed_version().unwrap().is_none());
	assert_eq!(engine.install(&InstallRequest::new(None, ["ffmpeg"])).unwrap().version.as_str(), "1.5.9");
}

#[test]
fn rejected_request_leaves_reconciler_aborted() {
	let host = HostFixture::imagej().unwrap();
	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();

	let mut reconciler = InstallReconciler::new(&mut engine);
	assert!(matches!(reconciler.run(&InstallRequest::new(Some("1.5.7"), ["ffmpeg"])), Err(Error::UnknownVersion { .. })));
	assert_eq!(reconciler.state(), ReconcileState::Aborted);

	let mut reconciler = InstallReconciler::new(&mut engine);
	assert!(matches!(reconciler.run(&InstallRequest::new(Some("1.a.9"), ["ffmpeg"])), Err(Error::InvalidVersionFormat(_))));
	assert_eq!(reconciler.state(), ReconcileState::Aborted);

	let mut reconciler = InstallReconciler::new(&mut engine);
	reconciler.run(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"])).unwrap();
	assert_eq!(reconciler.state(), ReconcileState::Committed);
}
