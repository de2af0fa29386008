//! Filters deciding which nodes of a collected dependency graph get resolved.

use std::collections::HashSet;

use super::Coordinate;

pub trait DependencyFilter {
	/// `parents` is the path from the root to `node`, root first.
	fn accept(&mut self, node: &Coordinate, parents: &[Coordinate]) -> bool;
}

/// Accepts nodes whose group id contains `namespace`.
#[derive(Debug, Clone)]
pub struct InclusionFilter {
	namespace: String,
}

impl InclusionFilter {
	pub fn new(namespace: impl Into<String>) -> Self {
		Self { namespace: namespace.into() }
	}
}

impl DependencyFilter for InclusionFilter {
	fn accept(&mut self, node: &Coordinate, _parents: &[Coordinate]) -> bool {
		node.group_id.contains(&self.namespace)
	}
}

/// Rejects nodes whose artifact id starts with any of the given prefixes.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
	prefixes: Vec<String>,
}

impl ExclusionFilter {
	pub fn new(prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self { prefixes: prefixes.into_iter().map(Into::into).collect() }
	}
}

impl DependencyFilter for ExclusionFilter {
	fn accept(&mut self, node: &Coordinate, _parents: &[Coordinate]) -> bool {
		!self.prefixes.iter().any(|p| node.artifact_id.starts_with(p.as_str()))
	}
}

/// Accepts only the first occurrence of a coordinate.
#[derive(Debug, Clone, Default)]
pub struct DuplicateFilter {
	included: HashSet<String>,
}

impl DependencyFilter for DuplicateFilter {
	fn accept(&mut self, node: &Coordinate, _parents: &[Coordinate]) -> bool {
		self.included.insert(node.to_string())
	}
}

/// Accepts a node when every inner filter does, stopping at the first rejection.
#[derive(Default)]
pub struct AndFilter {
	filters: Vec<Box<dyn DependencyFilter>>,
}

impl AndFilter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, filter: impl DependencyFilter + 'static) -> Self {
		self.filters.push(Box::new(filter));
		self
	}
}

impl DependencyFilter for AndFilter {
	fn accept(&mut self, node: &Coordinate, parents: &[Coordinate]) -> bool {
		self.filters.iter_mut().all(|f| f.accept(node, parents))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn c(group: &str, artifact: &str) -> Coordinate { Coordinate::new(group, artifact, "1.5.9") }

	#[test] fn inclusion_matches_namespace() { assert!(InclusionFilter::new("bytedeco").accept(&c("org.bytedeco", "javacv"), &[])) }
	#[test] fn inclusion_rejects_other_groups() { assert!(!InclusionFilter::new("bytedeco").accept(&c("junit", "junit"), &[])) }
	#[test] fn exclusion_matches_prefix() { assert!(!ExclusionFilter::new(["opencv"]).accept(&c("org.bytedeco", "opencv-platform"), &[])) }
	#[test] fn exclusion_keeps_others() { assert!(ExclusionFilter::new(["opencv"]).accept(&c("org.bytedeco", "ffmpeg"), &[])) }

	#[test]
	fn duplicate_filter_accepts_first_occurrence_only() {
		let mut f = DuplicateFilter::default();
		assert!(f.accept(&c("org.bytedeco", "javacpp"), &[]));
		assert!(!f.accept(&c("org.bytedeco", "javacpp"), &[]));
	}

	#[test]
	fn and_filter_short_circuits() {
		let mut f = AndFilter::new().with(InclusionFilter::new("bytedeco")).with(DuplicateFilter::default());
		assert!(!f.accept(&c("junit", "junit"), &[]));
		/* The duplicate filter never saw the rejected node */
		assert!(f.accept(&c("org.bytedeco", "javacpp"), &[]));
		assert!(!f.accept(&c("org.bytedeco", "javacpp"), &[]));
	}
}
