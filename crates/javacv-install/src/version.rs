//! Numeric versions used by JavaCV artifacts.
//!
//! A version is a sequence of non-negative integers separated by `.` or `-`, e.g. `1.5.9` or `6.0-1.5.9`.
//! Comparison is done segment by segment with missing trailing segments treated as zero,
//! which makes `1.5` and `1.5.0` equal.

use std::cmp::Ordering;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

fn version_pattern() -> &'static regex::Regex {
	static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
	PATTERN.get_or_init(|| regex::Regex::new(r"^[0-9]+(\.[0-9]+)*(-[0-9]+(\.[0-9]+)*)*$").expect("version pattern should compile"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
	text: String,
	segments: Vec<u64>,
}

impl Version {
	pub fn parse(text: &str) -> crate::Result<Self> {
		if !version_pattern().is_match(text) {
			return Err(crate::Error::InvalidVersionFormat(text.to_string()));
		}
		let segments = text
			.split(['.', '-'])
			.map(|s| s.parse::<u64>().map_err(|_| crate::Error::InvalidVersionFormat(text.to_string())))
			.collect::<crate::Result<Vec<_>>>()?;
		Ok(Version { text: text.to_string(), segments })
	}

	/// Same as [`parse()`](Version::parse()) but treats a missing value as an invalid format.
	pub fn parse_optional(text: Option<&str>) -> crate::Result<Self> {
		match text {
			Some(t) => Self::parse(t),
			None => Err(crate::Error::InvalidVersionFormat("<none>".to_string())),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.text
	}

	/// Segments without trailing zeros, used so hashing agrees with equality.
	fn significant_segments(&self) -> &[u64] {
		let end = self.segments.iter().rposition(|s| *s != 0).map_or(0, |i| i + 1);
		&self.segments[..end]
	}

	/// Checks whether an installed version satisfies `self` as requested under `requirement`.
	pub fn is_met_by(&self, installed: &Version, requirement: VersionRequirement) -> bool {
		match requirement {
			VersionRequirement::RequireExact => self == installed,
			VersionRequirement::RequireAtLeast => self <= installed,
		}
	}
}

/// How an installed version is checked against a requested one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionRequirement {
	/// The installed version must be equal to the requested one.
	#[default]
	RequireExact,
	/// The requested version is a minimum, anything newer is acceptable.
	RequireAtLeast,
}

impl Ord for Version {
	fn cmp(&self, other: &Self) -> Ordering {
		let length = self.segments.len().max(other.segments.len());
		for i in 0..length {
			let lhs = self.segments.get(i).copied().unwrap_or(0);
			let rhs = other.segments.get(i).copied().unwrap_or(0);
			match lhs.cmp(&rhs) {
				Ordering::Equal => {},
				ord => return ord,
			}
		}
		Ordering::Equal
	}
}

impl PartialOrd for Version {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl PartialEq for Version {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for Version {}

impl std::hash::Hash for Version {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.significant_segments().hash(state);
	}
}

impl std::fmt::Display for Version {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.text)
	}
}

impl std::str::FromStr for Version {
	type Err = crate::Error;
	fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
}

impl TryFrom<String> for Version {
	type Error = crate::Error;
	fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(&value) }
}

impl TryFrom<&str> for Version {
	type Error = crate::Error;
	fn try_from(value: &str) -> Result<Self, Self::Error> { Self::parse(value) }
}

impl From<Version> for String {
	fn from(value: Version) -> Self {
		value.text
	}
}

/// Splits an artifact version such as `6.0-1.5.9` into `(component_version, package_version)`.
///
/// Versions without a hyphen are entirely the package version and the component version is empty.
pub fn split_artifact_version(version: &str) -> (&str, &str) {
	match version.split_once('-') {
		Some((component, package)) => (component, package),
		None => ("", version),
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn v(s: &str) -> Version { Version::parse(s).unwrap() }

	#[test] fn version_is_not_compared_lexically() { assert!(v("1.4.4") < v("1.4.10")) }
	#[test] fn version_missing_segments_are_zero() { assert_eq!(v("1.5"), v("1.5.0")) }
	#[test] fn version_short_version_is_lt() { assert!(v("1.5") < v("1.5.1")) }
	#[test] fn version_identical_are_eq() { assert_eq!(v("1.5.9").cmp(&v("1.5.9")), Ordering::Equal) }
	#[test] fn version_hyphen_is_a_separator() { assert!(v("6.0-1.5.9") > v("6.0-1.5.8")) }
	#[test] fn version_rejects_letters() { assert!(matches!(Version::parse("1.a.0"), Err(crate::Error::InvalidVersionFormat(_)))) }
	#[test] fn version_rejects_empty() { assert!(matches!(Version::parse(""), Err(crate::Error::InvalidVersionFormat(_)))) }
	#[test] fn version_rejects_missing() { assert!(matches!(Version::parse_optional(None), Err(crate::Error::InvalidVersionFormat(_)))) }
	#[test] fn version_rejects_trailing_dot() { assert!(Version::parse("1.5.").is_err()) }
	#[test] fn version_keeps_original_text() { assert_eq!(v("1.5").to_string(), "1.5") }

	#[test]
	fn version_ordering_is_antisymmetric_and_transitive() {
		let versions = ["1.3", "1.4.4", "1.4.10", "1.5", "1.5.0", "1.5.9", "2"].map(v);
		for a in &versions {
			assert_eq!(a.cmp(a), Ordering::Equal);
			for b in &versions {
				assert_eq!(a.cmp(b), b.cmp(a).reverse());
				for c in &versions {
					if a <= b && b <= c {
						assert!(a <= c);
					}
				}
			}
		}
	}

	#[test]
	fn version_hash_agrees_with_eq() {
		let mut set = std::collections::HashSet::new();
		set.insert(v("1.5"));
		assert!(set.contains(&v("1.5.0.0")));
	}

	#[test]
	fn requirement_modes_differ() {
		let requested = v("1.5.4");
		assert!(!requested.is_met_by(&v("1.5.9"), VersionRequirement::RequireExact));
		assert!(requested.is_met_by(&v("1.5.9"), VersionRequirement::RequireAtLeast));
		assert!(!requested.is_met_by(&v("1.5.3"), VersionRequirement::RequireAtLeast));
		assert!(requested.is_met_by(&v("1.5.4.0"), VersionRequirement::RequireExact));
	}

	#[test]
	fn artifact_version_is_split_on_first_hyphen() {
		assert_eq!(split_artifact_version("6.0-1.5.9"), ("6.0", "1.5.9"));
		assert_eq!(split_artifact_version("1.5.9"), ("", "1.5.9"));
	}
}
