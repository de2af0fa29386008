//! Host platform detection.
//!
//! The platform specifier selects which native library variant is installed and is
//! also the classifier JavaCPP uses for platform-specific artifacts.

use std::fmt::Display;

/// Queries the host for the information a [`PlatformSpecifier`] is computed from.
pub trait PlatformProbe {
	/// Operating system family as reported by [`std::env::consts::OS`].
	fn os_family(&self) -> &str;
	fn is_64bit(&self) -> bool;
	fn is_arm(&self) -> bool;
}

/// Probes the platform this binary was built for.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostProbe;

impl PlatformProbe for HostProbe {
	fn os_family(&self) -> &str {
		std::env::consts::OS
	}

	fn is_64bit(&self) -> bool {
		cfg!(target_pointer_width = "64")
	}

	fn is_arm(&self) -> bool {
		let arch = std::env::consts::ARCH;
		arch.contains("aarch") || arch.contains("arm")
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
	Linux,
	Windows,
	MacOsX,
}

impl OsFamily {
	/// The name JavaCPP uses for this family in classifiers.
	pub fn javacpp_name(&self) -> &'static str {
		match self {
			OsFamily::Linux => "linux",
			OsFamily::Windows => "windows",
			OsFamily::MacOsX => "macosx",
		}
	}
}

/// The `<os>-<arch>` token for the current host, e.g. `linux-x86_64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSpecifier {
	os: OsFamily,
	arch: &'static str,
	is_64bit: bool,
}

impl PlatformSpecifier {
	/// # Errors
	/// - [`UnsupportedPlatform`](crate::Error::UnsupportedPlatform) for anything other than linux, windows or macos.
	pub fn detect(probe: &dyn PlatformProbe) -> crate::Result<Self> {
		let is_64bit = probe.is_64bit();
		let is_arm = probe.is_arm();
		let specifier = match probe.os_family() {
			"linux" => PlatformSpecifier {
				os: OsFamily::Linux,
				arch: match (is_64bit, is_arm) {
					(true, true) => "arm64",
					(true, false) => "x86_64",
					(false, true) => "armhf",
					(false, false) => "x86",
				},
				is_64bit,
			},
			"windows" => PlatformSpecifier {
				os: OsFamily::Windows,
				arch: if is_64bit { "x86_64" } else { "x86" },
				is_64bit,
			},
			"macos" | "macosx" => PlatformSpecifier {
				os: OsFamily::MacOsX,
				arch: if is_arm { "arm64" } else { "x86_64" },
				is_64bit,
			},
			other => return Err(crate::Error::UnsupportedPlatform(other.to_string())),
		};
		log::debug!("Detected platform {}", specifier);
		Ok(specifier)
	}

	pub fn os(&self) -> OsFamily {
		self.os
	}

	pub fn is_64bit(&self) -> bool {
		self.is_64bit
	}

	/// The classifier of native artifacts for this platform.
	pub fn classifier(&self) -> String {
		self.to_string()
	}

	/// Directory name Fiji uses for native libraries of this platform.
	pub fn fiji_native_dir(&self) -> &'static str {
		match (self.os, self.is_64bit) {
			(OsFamily::Linux, true) => "linux64",
			(OsFamily::Linux, false) => "linux32",
			(OsFamily::Windows, true) => "win64",
			(OsFamily::Windows, false) => "win32",
			(OsFamily::MacOsX, _) => "macosx",
		}
	}
}

impl Display for PlatformSpecifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}-{}", self.os.javacpp_name(), self.arch)
	}
}

/// Bitness encoded by a JavaCPP architecture token, `None` if the token is not recognised.
pub fn arch_is_64bit(arch: &str) -> Option<bool> {
	match arch {
		"x86_64" | "arm64" | "aarch64" | "ppc64le" => Some(true),
		"x86" | "armhf" | "arm" => Some(false),
		_ => None,
	}
}
