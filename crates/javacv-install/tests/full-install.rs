use javacv_install::installation::lock::InstallLock;
use javacv_install::installation::staging::PendingOperation;
use javacv_install::relationship_resolver::CodecVariant;
use javacv_install::{Error, InstallRequest};
use javacv_install_test_utils::{FixedProbe, HostFixture, MockRepository};

fn copied(operations: &[PendingOperation]) -> usize {
	operations.iter().filter(|o| matches!(o, PendingOperation::Copy { .. })).count()
}

#[test]
fn fresh_install_stages_component_dependencies() {
	let _ = env_logger::builder().is_test(true).try_init();
	let host = HostFixture::imagej().unwrap();
	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();

	let report = engine.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"])).unwrap();
	assert_eq!(report.version.as_str(), "1.5.9");
	assert_eq!(report.components, ["ffmpeg", "opencv"]);
	assert_eq!(report.codec, CodecVariant::Standard);
	assert!(report.restart_required);
	assert!(report.conflicts.is_empty());
	/* javacv-platform and javacv plus the platform, wrapper and native jars of javacpp, ffmpeg and opencv */
	assert_eq!(copied(&report.operations), 11);

	for name in ["javacv-1.5.9.jar", "ffmpeg-6.0-1.5.9-linux-x86_64.jar", "opencv-4.7.0-1.5.9.jar", "javacpp-1.5.9-linux-x86_64.jar"] {
		assert!(host.staged(format!("plugins/jars/{}", name)).exists(), "{} wasn't staged", name);
		assert!(!host.root().join("plugins/jars").join(name).exists(), "{} was installed in place", name);
	}

	assert_eq!(engine.installed_version().unwrap().unwrap().as_str(), "1.5.9");
	let components = engine.installed_components().unwrap();
	assert!(components.contains("ffmpeg") && components.contains("opencv"));
}

#[test]
fn second_run_waits_for_restart() {
	let host = HostFixture::imagej().unwrap();
	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();

	engine.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"])).unwrap();
	assert!(engine.restart_required());
	assert!(matches!(engine.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"])), Err(Error::RestartRequired)));
}

#[test]
fn repeated_install_has_nothing_to_do() {
	let host = HostFixture::imagej().unwrap();
	let mut config = host.config();
	config.set_apply_immediately(true);

	let mut engine = host.engine_with_config(config.clone(), MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	let report = engine.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"])).unwrap();
	assert!(!report.restart_required);
	assert!(host.root().join("plugins/jars/javacv-1.5.9.jar").exists());

	let mut engine = host.engine_with_config(config, MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	let report = engine.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"])).unwrap();
	assert!(report.operations.is_empty());
	assert!(report.conflicts.is_empty());
	assert!(!report.restart_required);
}

#[test]
fn forced_reinstall_copies_everything_again() {
	let host = HostFixture::imagej().unwrap();
	let mut config = host.config();
	config.set_apply_immediately(true);
	host.engine_with_config(config, MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap()
		.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"])).unwrap();

	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	let report = engine.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"]).force_reinstall(true)).unwrap();
	assert_eq!(copied(&report.operations), 11);
	assert!(report.restart_required);
}

#[test]
fn upgrade_marks_previous_release_for_removal() {
	let host = HostFixture::imagej().unwrap();
	let mut config = host.config();
	config.set_apply_immediately(true);
	host.engine_with_config(config, MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap()
		.install(&InstallRequest::new(Some("1.5.4"), ["ffmpeg"])).unwrap();
	let old = host.root().join("plugins/jars/javacv-1.5.4.jar");
	assert!(old.exists());

	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	let report = engine.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"])).unwrap();
	assert!(report.operations.contains(&PendingOperation::MarkRemoved { path: old.clone() }));

	let marker = host.staged("plugins/jars/javacv-1.5.4.jar");
	assert_eq!(std::fs::metadata(marker).unwrap().len(), 0);
	/* The old release is handled by its record, not reported again as a conflict */
	assert!(report.conflicts.iter().all(|c| c.path != old));

	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	assert_eq!(engine.installed_version().unwrap().unwrap().as_str(), "1.5.9");
}

#[test]
fn gpl_build_is_preferred_when_published() {
	let repository = MockRepository::sample().unwrap()
		.declare("ffmpeg-platform-gpl", "6.0-1.5.9", &[("ffmpeg", "6.0-1.5.9", "linux-x86_64-gpl"), ("javacpp", "1.5.9", "")]);
	let host = HostFixture::imagej().unwrap();
	let mut engine = host.engine(repository, FixedProbe::linux64()).unwrap();

	let report = engine.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"])).unwrap();
	assert_eq!(report.codec, CodecVariant::Gpl);
	assert!(host.staged("plugins/jars/ffmpeg-6.0-1.5.9-linux-x86_64-gpl.jar").exists());
	assert!(host.staged("plugins/jars/ffmpeg-platform-gpl-6.0-1.5.9.jar").exists());
	assert!(!host.staged("plugins/jars/ffmpeg-6.0-1.5.9-linux-x86_64.jar").exists());
	assert!(!host.staged("plugins/jars/ffmpeg-platform-6.0-1.5.9.jar").exists());
}

#[test]
fn fiji_keeps_native_libraries_apart() {
	let host = HostFixture::fiji().unwrap();
	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();

	engine.install(&InstallRequest::new(Some("1.5.9"), ["opencv"])).unwrap();
	assert!(host.staged("jars/javacv-1.5.9.jar").exists());
	assert!(host.staged("jars/linux64/opencv-4.7.0-1.5.9-linux-x86_64.jar").exists());
	assert!(!host.staged("jars/ffmpeg-6.0-1.5.9.jar").exists());
}

#[test]
fn missing_artifact_rolls_back_staging() {
	let _ = env_logger::builder().is_test(true).try_init();
	let repository = MockRepository::sample().unwrap().without_content("opencv-4.7.0-1.5.9-linux-x86_64.jar");
	let host = HostFixture::imagej().unwrap();
	let mut engine = host.engine(repository, FixedProbe::linux64()).unwrap();

	let result = engine.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"]));
	assert!(matches!(result, Err(Error::SourceMissing { .. })), "{:?}", result);
	assert!(!host.root().join("update").exists());
	assert!(!engine.restart_required());
	assert!(engine.installed_version().unwrap().is_none());
}

#[test]
fn concurrent_install_is_refused() {
	let host = HostFixture::imagej().unwrap();
	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();

	let lock = InstallLock::acquire(&host.config().installer_dir()).unwrap();
	assert!(matches!(engine.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"])), Err(Error::InstallationLocked(_))));
	drop(lock);
	assert!(engine.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"])).is_ok());
}

#[test]
fn run_builds_on_record_written_by_another_context() {
	let host = HostFixture::imagej().unwrap();
	let mut config = host.config();
	config.set_apply_immediately(true);
	host.engine_with_config(config.clone(), MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap()
		.install(&InstallRequest::new(Some("1.5.4"), ["opencv"])).unwrap();

	/* Loaded before the other context adds ffmpeg */
	let mut stale = host.engine_with_config(config.clone(), MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	host.engine_with_config(config.clone(), MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap()
		.install(&InstallRequest::new(Some("1.5.4"), ["ffmpeg"])).unwrap();
	stale.install(&InstallRequest::new(Some("1.5.4"), ["opencv"])).unwrap();

	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	let components = engine.installed_components().unwrap();
	assert!(components.contains("ffmpeg") && components.contains("opencv"), "{:?}", components);
	assert!(host.root().join("plugins/jars/ffmpeg-4.3.1-1.5.4.jar").exists());
}

#[test]
fn unwritable_update_directory_keeps_previous_release() {
	let host = HostFixture::imagej().unwrap();
	let mut config = host.config();
	config.set_apply_immediately(true);
	host.engine_with_config(config, MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap()
		.install(&InstallRequest::new(Some("1.5.4"), ["ffmpeg"])).unwrap();
	/* A plain file where the update directory should be */
	host.add_file("update", b"").unwrap();

	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	let result = engine.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"]));
	assert!(matches!(result, Err(Error::PartialInstallation { .. })), "{:?}", result);
	assert!(!engine.restart_required());
	assert!(host.root().join("plugins/jars/javacv-1.5.4.jar").exists());
	assert!(host.root().join("update").is_file());

	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	assert_eq!(engine.installed_version().unwrap().unwrap().as_str(), "1.5.4");
}

#[test]
fn failed_in_place_upgrade_keeps_previous_release() {
	let host = HostFixture::imagej().unwrap();
	let mut config = host.config();
	config.set_apply_immediately(true);
	host.engine_with_config(config.clone(), MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap()
		.install(&InstallRequest::new(Some("1.5.4"), ["ffmpeg"])).unwrap();

	let repository = MockRepository::sample().unwrap().without_content("opencv-4.7.0-1.5.9-linux-x86_64.jar");
	let mut engine = host.engine_with_config(config.clone(), repository, FixedProbe::linux64()).unwrap();
	let result = engine.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"]));
	assert!(matches!(result, Err(Error::SourceMissing { .. })), "{:?}", result);
	assert!(host.root().join("plugins/jars/javacv-1.5.4.jar").exists());
	assert!(host.root().join("plugins/jars/ffmpeg-4.3.1-1.5.4-linux-x86_64.jar").exists());
	assert!(!host.root().join("plugins/jars/javacv-1.5.9.jar").exists());
	assert_eq!(engine.installed_version().unwrap().unwrap().as_str(), "1.5.4");

	/* The same upgrade goes through once the artifact is available */
	let mut engine = host.engine_with_config(config, MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();
	engine.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"])).unwrap();
	assert!(!host.root().join("plugins/jars/javacv-1.5.4.jar").exists());
	assert!(host.root().join("plugins/jars/javacv-1.5.9.jar").exists());
}
