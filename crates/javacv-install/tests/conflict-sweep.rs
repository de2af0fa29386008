use javacv_install::installation::conflicts::ConflictReason;
use javacv_install::installation::staging::PendingOperation;
use javacv_install::InstallRequest;
use javacv_install_test_utils::{FixedProbe, HostFixture, MockRepository};

#[test]
fn stale_jars_are_marked_for_removal() {
	let host = HostFixture::imagej().unwrap();
	let stale = host.add_file("plugins/jars/javacv-1.5.7.jar", b"old").unwrap();
	let foreign = host.add_file("plugins/jars/ij-1.54f.jar", b"ij").unwrap();
	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();

	let report = engine.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"])).unwrap();
	assert_eq!(report.conflicts.len(), 1);
	assert_eq!(report.conflicts[0].path, stale);
	assert_eq!(report.conflicts[0].reason, ConflictReason::Version("1.5.7".to_string()));
	assert!(report.operations.contains(&PendingOperation::MarkRemoved { path: stale }));

	assert_eq!(std::fs::metadata(host.staged("plugins/jars/javacv-1.5.7.jar")).unwrap().len(), 0);
	assert!(foreign.exists());
	assert!(!host.staged("plugins/jars/ij-1.54f.jar").exists());
}

#[test]
fn native_jars_of_other_bitness_conflict() {
	let host = HostFixture::imagej().unwrap();
	let native = host.add_file("plugins/jars/opencv-4.7.0-1.5.9-linux-x86.jar", b"").unwrap();
	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();

	let report = engine.install(&InstallRequest::new(Some("1.5.9"), ["opencv"])).unwrap();
	assert_eq!(report.conflicts.len(), 1);
	assert_eq!(report.conflicts[0].path, native);
	assert_eq!(report.conflicts[0].reason, ConflictReason::Bitness);
}

#[test]
fn fiji_native_directory_is_swept() {
	let host = HostFixture::fiji().unwrap();
	let stale = host.add_file("jars/linux64/ffmpeg-4.3.1-1.5.4-linux-x86_64.jar", b"").unwrap();
	let mut engine = host.engine(MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();

	let report = engine.install(&InstallRequest::new(Some("1.5.9"), ["ffmpeg"])).unwrap();
	assert!(report.conflicts.iter().any(|c| c.path == stale));
	assert!(host.staged("jars/linux64/ffmpeg-4.3.1-1.5.4-linux-x86_64.jar").exists());
}

#[test]
fn unrequested_component_jars_are_checked() {
	let host = HostFixture::imagej().unwrap();
	let stale = host.add_file("plugins/jars/opencv-4.1.0-1.5.0.jar", b"").unwrap();
	let mut config = host.config();
	config.set_apply_immediately(true);
	let mut engine = host.engine_with_config(config, MockRepository::sample().unwrap(), FixedProbe::linux64()).unwrap();

	let report = engine.install(&InstallRequest::new(Some("1.5.4"), ["ffmpeg"])).unwrap();
	assert_eq!(report.components, ["ffmpeg"]);
	assert!(report.conflicts.iter().any(|c| c.path == stale));
	assert!(!stale.exists());
	assert!(!report.restart_required);
}
