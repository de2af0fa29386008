//! Dependency graph collection shared by repository implementations.
//!
//! The graph is collected breadth first so that the version nearest to the root wins
//! when an artifact is reached through several paths. Filters are applied to the finished
//! graph in preorder; a rejected node's dependencies are still visited, filters only decide
//! what gets resolved.

use std::collections::{HashMap, VecDeque};

use petgraph::prelude::*;

use super::{ArtifactRepository, Coordinate, Dependency, DependencyFilter, RepositoryError};

/// Collects the graph rooted at `root` and returns the accepted `jar` nodes in preorder.
pub fn collect<R>(repository: &R, root: &Dependency, filter: &mut dyn DependencyFilter) -> Result<Vec<Coordinate>, RepositoryError>
where R: ArtifactRepository + ?Sized,
{
	let mut graph = DiGraph::<Coordinate, String>::new();
	let mut nodes = HashMap::<String, NodeIndex>::new();
	let mut descriptors = HashMap::<String, Vec<Dependency>>::new();

	let root_index = graph.add_node(root.coordinate.clone());
	nodes.insert(root.coordinate.versionless_key(), root_index);

	let mut queue = VecDeque::<NodeIndex>::new();
	queue.push_back(root_index);

	while let Some(i) = queue.pop_front() {
		let coordinate = graph[i].clone();
		let descriptor_key = format!("{}:{}:{}", coordinate.group_id, coordinate.artifact_id, coordinate.version);

		if !descriptors.contains_key(&descriptor_key) {
			let dependencies = match repository.fetch_descriptor(&coordinate) {
				Ok(d) => d,
				Err(RepositoryError::NotFound(what)) if i != root_index => {
					log::warn!("Missing artifact descriptor for {}", what);
					Vec::new()
				},
				Err(e) => return Err(e),
			};
			descriptors.insert(descriptor_key.clone(), dependencies);
		}

		for dependency in &descriptors[&descriptor_key] {
			if !dependency.is_transitive() {
				continue;
			}
			let key = dependency.coordinate.versionless_key();
			match nodes.get(&key) {
				Some(existing) => {
					if graph[*existing].version != dependency.coordinate.version {
						log::trace!("{} omitted for conflict with {}", dependency.coordinate, graph[*existing]);
					}
				},
				None => {
					let child = graph.add_node(dependency.coordinate.clone());
					graph.add_edge(i, child, dependency.scope.clone());
					nodes.insert(key, child);
					queue.push_back(child);
				},
			}
		}
	}

	log::debug!("Collected {} nodes under {}", graph.node_count(), root.coordinate);

	/* Preorder walk so each node is filtered with the path that led to it */
	let mut accepted = Vec::<Coordinate>::new();
	let mut stack = vec![(root_index, Vec::<Coordinate>::new())];
	while let Some((i, parents)) = stack.pop() {
		let coordinate = &graph[i];
		if filter.accept(coordinate, &parents) && coordinate.extension == "jar" {
			accepted.push(coordinate.clone());
		}

		let mut children: Vec<NodeIndex> = graph.neighbors_directed(i, Outgoing).collect();
		/* Node indices follow declaration order, pushed in reverse so the first declared is visited first */
		children.sort();
		let mut path = parents;
		path.push(coordinate.clone());
		for child in children.into_iter().rev() {
			stack.push((child, path.clone()));
		}
	}

	Ok(accepted)
}
