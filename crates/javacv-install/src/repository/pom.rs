//! Reading Maven POM descriptors into the dependency list of their effective model.
//!
//! Only the parts of the model that affect the dependency list are built: the parent chain,
//! properties, profiles activated by properties or by default, and `dependencyManagement`.
//! Profiles activated by OS, JDK or file conditions never activate.

use std::collections::HashMap;

use super::{Coordinate, Dependency};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
	pub group_id: String,
	pub artifact_id: String,
	pub version: String,
}

#[derive(Debug, Clone, Default)]
struct DeclaredDependency {
	group_id: String,
	artifact_id: String,
	version: Option<String>,
	classifier: String,
	kind: String,
	scope: Option<String>,
	optional: String,
}

impl DeclaredDependency {
	/// Key used by Maven to match a dependency with its managed version.
	fn management_key(&self) -> String {
		format!("{}:{}:{}:{}", self.group_id, self.artifact_id, self.kind, self.classifier)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Activation {
	Never,
	ByDefault,
	Property {
		name: String,
		negated: bool,
		value: Option<String>,
	},
}

#[derive(Debug, Clone)]
struct Profile {
	id: String,
	activation: Activation,
	properties: Vec<(String, String)>,
	dependencies: Vec<DeclaredDependency>,
	management: Vec<DeclaredDependency>,
}

/// A single parsed POM file, before inheritance and interpolation.
#[derive(Debug, Clone)]
pub struct Pom {
	group_id: Option<String>,
	artifact_id: String,
	version: Option<String>,
	pub parent: Option<ParentRef>,
	properties: Vec<(String, String)>,
	dependencies: Vec<DeclaredDependency>,
	management: Vec<DeclaredDependency>,
	profiles: Vec<Profile>,
}

fn child<'a, 'input>(node: roxmltree::Node<'a, 'input>, name: &str) -> Option<roxmltree::Node<'a, 'input>> {
	node.children().find(|n| n.is_element() && n.tag_name().name() == name)
}

fn child_text(node: roxmltree::Node, name: &str) -> Option<String> {
	child(node, name).map(|n| n.text().unwrap_or_default().trim().to_string())
}

fn elements<'a, 'input>(node: roxmltree::Node<'a, 'input>) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> {
	node.children().filter(|n| n.is_element())
}

fn read_properties(node: roxmltree::Node) -> Vec<(String, String)> {
	child(node, "properties")
		.map(|p| elements(p).map(|e| (e.tag_name().name().to_string(), e.text().unwrap_or_default().trim().to_string())).collect())
		.unwrap_or_default()
}

fn read_dependencies(node: Option<roxmltree::Node>) -> Vec<DeclaredDependency> {
	let Some(node) = node else { return Vec::new() };
	elements(node)
		.filter(|d| d.tag_name().name() == "dependency")
		.map(|d| DeclaredDependency {
			group_id: child_text(d, "groupId").unwrap_or_default(),
			artifact_id: child_text(d, "artifactId").unwrap_or_default(),
			version: child_text(d, "version"),
			classifier: child_text(d, "classifier").unwrap_or_default(),
			kind: child_text(d, "type").unwrap_or_else(|| "jar".to_string()),
			scope: child_text(d, "scope"),
			optional: child_text(d, "optional").unwrap_or_default(),
		})
		.collect()
}

fn read_management(node: roxmltree::Node) -> Vec<DeclaredDependency> {
	read_dependencies(child(node, "dependencyManagement").and_then(|m| child(m, "dependencies")))
}

fn read_activation(node: roxmltree::Node) -> Activation {
	let Some(activation) = child(node, "activation") else { return Activation::Never };
	if let Some(property) = child(activation, "property") {
		let name = child_text(property, "name").unwrap_or_default();
		let (negated, name) = match name.strip_prefix('!') {
			Some(n) => (true, n.to_string()),
			None => (false, name),
		};
		return Activation::Property { name, negated, value: child_text(property, "value") };
	}
	if child_text(activation, "activeByDefault").as_deref() == Some("true") {
		return Activation::ByDefault;
	}
	Activation::Never
}

impl Pom {
	/// # Errors
	/// Returns a description of the problem when the text is not XML or has no `artifactId`.
	pub fn parse(text: &str) -> Result<Pom, String> {
		let document = roxmltree::Document::parse(text).map_err(|e| e.to_string())?;
		let project = document.root_element();
		if project.tag_name().name() != "project" {
			return Err(format!("unexpected root element <{}>", project.tag_name().name()));
		}

		let parent = child(project, "parent").map(|p| ParentRef {
			group_id: child_text(p, "groupId").unwrap_or_default(),
			artifact_id: child_text(p, "artifactId").unwrap_or_default(),
			version: child_text(p, "version").unwrap_or_default(),
		});

		let profiles = child(project, "profiles")
			.map(|ps| elements(ps)
				.filter(|p| p.tag_name().name() == "profile")
				.map(|p| Profile {
					id: child_text(p, "id").unwrap_or_default(),
					activation: read_activation(p),
					properties: read_properties(p),
					dependencies: read_dependencies(child(p, "dependencies")),
					management: read_management(p),
				})
				.collect())
			.unwrap_or_default();

		Ok(Pom {
			group_id: child_text(project, "groupId"),
			artifact_id: child_text(project, "artifactId").ok_or("missing artifactId")?,
			version: child_text(project, "version"),
			parent,
			properties: read_properties(project),
			dependencies: read_dependencies(child(project, "dependencies")),
			management: read_management(project),
			profiles,
		})
	}

	/// Profiles of this POM active under the given system properties.
	///
	/// Profiles active by default only apply when no other profile of the same POM is active.
	fn active_profiles(&self, system: &HashMap<String, String>) -> Vec<&Profile> {
		let active: Vec<&Profile> = self.profiles.iter()
			.filter(|p| match &p.activation {
				Activation::Property { name, negated, value } => {
					let matched = match (system.get(name), value) {
						(Some(actual), Some(expected)) => match expected.strip_prefix('!') {
							Some(expected) => actual != expected,
							None => actual == expected,
						},
						(Some(_), None) => true,
						(None, Some(expected)) => expected.starts_with('!'),
						(None, None) => false,
					};
					matched != *negated
				},
				_ => false,
			})
			.collect();
		if !active.is_empty() {
			return active;
		}
		self.profiles.iter().filter(|p| p.activation == Activation::ByDefault).collect()
	}
}

/// Replaces `${name}` expressions, leaving unknown names in place as Maven does.
fn interpolate(text: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
	let mut current = text.to_string();
	/* Bounded so self referencing properties terminate */
	for _ in 0..16 {
		let mut output = String::with_capacity(current.len());
		let mut rest = current.as_str();
		let mut changed = false;
		while let Some(start) = rest.find("${") {
			output.push_str(&rest[..start]);
			match rest[start..].find('}') {
				Some(end) => {
					let name = &rest[start + 2..start + end];
					match lookup(name) {
						Some(value) => {
							output.push_str(&value);
							changed = true;
						},
						None => output.push_str(&rest[start..=start + end]),
					}
					rest = &rest[start + end + 1..];
				},
				None => {
					output.push_str(&rest[start..]);
					rest = "";
				},
			}
		}
		output.push_str(rest);
		if !changed {
			return output;
		}
		current = output;
	}
	current
}

/// Builds the dependency list of the effective model of `lineage[0]`.
///
/// # Parameters
/// - `lineage` - The POM followed by its parents, nearest first.
/// - `system` - System properties, used for profile activation and as a fallback for interpolation.
pub fn effective_dependencies(lineage: &[Pom], system: &HashMap<String, String>) -> Result<Vec<Dependency>, String> {
	let project = lineage.first().ok_or("empty lineage")?;

	let mut properties = HashMap::<String, String>::new();
	let mut dependencies = Vec::<DeclaredDependency>::new();
	let mut management = HashMap::<String, DeclaredDependency>::new();

	/* Farthest ancestor first so children override */
	for pom in lineage.iter().rev() {
		let profiles = pom.active_profiles(system);
		for profile in &profiles {
			log::trace!("Profile {} active in {}", profile.id, pom.artifact_id);
		}

		properties.extend(pom.properties.iter().cloned());
		for profile in &profiles {
			properties.extend(profile.properties.iter().cloned());
		}

		let declared = pom.dependencies.iter().chain(profiles.iter().flat_map(|p| p.dependencies.iter()));
		for dependency in declared {
			let key = dependency.management_key();
			match dependencies.iter_mut().find(|d| d.management_key() == key) {
				Some(existing) => *existing = dependency.clone(),
				None => dependencies.push(dependency.clone()),
			}
		}

		let managed = pom.management.iter().chain(profiles.iter().flat_map(|p| p.management.iter()));
		for dependency in managed {
			management.insert(dependency.management_key(), dependency.clone());
		}
	}

	let parent = project.parent.as_ref();
	let group_id = project.group_id.clone().or_else(|| parent.map(|p| p.group_id.clone())).unwrap_or_default();
	let version = project.version.clone().or_else(|| parent.map(|p| p.version.clone())).unwrap_or_default();
	let artifact_id = project.artifact_id.clone();
	let parent_version = parent.map(|p| p.version.clone());

	let lookup = |name: &str| -> Option<String> {
		match name {
			"project.version" | "pom.version" | "version" => Some(version.clone()),
			"project.groupId" | "pom.groupId" | "groupId" => Some(group_id.clone()),
			"project.artifactId" | "pom.artifactId" | "artifactId" => Some(artifact_id.clone()),
			"project.parent.version" | "parent.version" => parent_version.clone(),
			_ => properties.get(name).or_else(|| system.get(name)).cloned(),
		}
	};

	let mut resolved = Vec::<Dependency>::new();
	for declared in dependencies {
		let mut d = DeclaredDependency {
			group_id: interpolate(&declared.group_id, &lookup),
			artifact_id: interpolate(&declared.artifact_id, &lookup),
			version: declared.version.as_deref().map(|v| interpolate(v, &lookup)),
			classifier: interpolate(&declared.classifier, &lookup),
			kind: interpolate(&declared.kind, &lookup),
			scope: declared.scope.as_deref().map(|s| interpolate(s, &lookup)),
			optional: interpolate(&declared.optional, &lookup),
		};

		/* Management entries are matched after interpolation, their own values need it too */
		let managed = management.values().find(|m| {
			interpolate(&m.management_key(), &lookup) == d.management_key()
		});
		if let Some(m) = managed {
			if d.version.is_none() {
				d.version = m.version.as_deref().map(|v| interpolate(v, &lookup));
			}
			if d.scope.is_none() {
				d.scope = m.scope.as_deref().map(|s| interpolate(s, &lookup));
			}
		}

		let version = d.version.ok_or_else(|| format!("no version for {}:{}", d.group_id, d.artifact_id))?;
		let coordinate = Coordinate::new(d.group_id, d.artifact_id, version)
			.with_classifier(d.classifier)
			.with_extension(d.kind);
		let mut dependency = Dependency::new(coordinate, d.scope.unwrap_or_default());
		dependency.optional = d.optional == "true";
		resolved.push(dependency);
	}

	Ok(resolved)
}
