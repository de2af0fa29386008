//! Finding jars left behind by other releases or built for another architecture.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::platform::{arch_is_64bit, PlatformSpecifier};
use crate::version::Version;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
	/// Native library built for the other bitness.
	Bitness,
	/// Belongs to neither the target nor the installed release.
	Version(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
	pub path: PathBuf,
	pub reason: ConflictReason,
}

/// Release version embedded in the jar name of `component`, e.g. `1.5.9` for `opencv-4.7.0-1.5.9-linux-x86_64.jar`.
pub fn jar_version(file_name: &str, component: &str) -> Option<Version> {
	let rest = file_name.strip_suffix(".jar")?.strip_prefix(component)?;
	let digits: String = rest.chars().filter(|c| !c.is_ascii_alphabetic()).collect();
	let digits = digits.trim_matches('-');
	let digits = digits.split("--").next().unwrap_or_default();
	let release = digits.split_once('-').map_or(digits, |(_, release)| release);
	Version::parse(release).ok()
}

/// Bitness of the architecture following `<os>-` in `file_name`, `None` without a recognised marker.
pub fn jar_bitness(file_name: &str, os: &str) -> Option<bool> {
	let stem = file_name.strip_suffix(".jar").unwrap_or(file_name);
	let marker = format!("{}-", os);
	let start = stem.find(&marker)? + marker.len();
	let arch = stem[start..].split('-').next()?;
	arch_is_64bit(arch)
}

pub struct ConflictScanner<'a> {
	platform: &'a PlatformSpecifier,
	target: &'a Version,
	prior: Option<&'a Version>,
}

impl<'a> ConflictScanner<'a> {
	/// # Parameters
	/// - `target` - The release being installed.
	/// - `prior` - The validly recorded installed release, whose files are also kept.
	pub fn new(platform: &'a PlatformSpecifier, target: &'a Version, prior: Option<&'a Version>) -> Self {
		Self { platform, target, prior }
	}

	/// Checks a single jar belonging to `component`.
	pub fn check(&self, file_name: &str, component: &str) -> Option<ConflictReason> {
		if let Some(is_64bit) = jar_bitness(file_name, self.platform.os().javacpp_name()) {
			if is_64bit != self.platform.is_64bit() {
				return Some(ConflictReason::Bitness);
			}
		}

		let Some(version) = jar_version(file_name, component) else {
			log::warn!("Can't read version of {}, leaving it in place", file_name);
			return None;
		};
		let is_target = version == *self.target;
		let is_prior = self.prior.map_or(false, |p| version == *p);
		if is_target || is_prior {
			None
		} else {
			Some(ConflictReason::Version(version.to_string()))
		}
	}

	/// Scans `dirs`, without descending, for conflicting jars of `components`.
	///
	/// Files in `skip` are already being dealt with and are not reported.
	pub fn scan(&self, dirs: &[&Path], components: &[String], skip: &BTreeSet<PathBuf>) -> Vec<Conflict> {
		let mut conflicts = Vec::<Conflict>::new();
		let mut seen = BTreeSet::<PathBuf>::new();

		for dir in dirs {
			if !dir.is_dir() {
				continue;
			}
			log::debug!("Searching {} for conflicts", dir.display());
			let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
				.min_depth(1)
				.max_depth(1)
				.into_iter()
				.filter_map(|e| match e {
					Ok(e) => Some(e),
					Err(e) => {
						log::warn!("Skipping unreadable entry: {}", e);
						None
					},
				})
				.filter(|e| e.file_type().is_file())
				.map(|e| e.into_path())
				.collect();
			files.sort();

			for path in files {
				if skip.contains(&path) || seen.contains(&path) {
					continue;
				}
				let Some(name) = path.file_name().and_then(|n| n.to_str()) else { continue };
				for component in components {
					if !(name.starts_with(component.as_str()) && name.ends_with(".jar")) {
						continue;
					}
					if let Some(reason) = self.check(name, component) {
						log::info!("Conflicting file {} ({:?})", path.display(), reason);
						seen.insert(path.clone());
						conflicts.push(Conflict { path: path.clone(), reason });
						break;
					}
				}
			}
		}
		conflicts
	}
}
