//! A Maven layout repository reached over HTTP with a local file cache.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use super::pom::{self, Pom};
use super::{ArtifactRepository, Coordinate, Dependency, DependencyFilter, RepositoryError, ResolvedArtifact};

/// Parent chains longer than this are treated as cyclic.
const MAX_LINEAGE: usize = 32;

pub struct MavenRepository {
	base_url: String,
	local_dir: PathBuf,
	client: reqwest::blocking::Client,
	do_checksums: bool,
	system_properties: HashMap<String, String>,
}

/// Path of an artifact relative to the repository root, using `/` separators.
fn remote_path(coordinate: &Coordinate) -> String {
	format!("{}/{}/{}/{}", coordinate.group_id.replace('.', "/"), coordinate.artifact_id, coordinate.version, coordinate.file_name())
}

fn metadata_path(coordinate: &Coordinate) -> String {
	format!("{}/{}/maven-metadata.xml", coordinate.group_id.replace('.', "/"), coordinate.artifact_id)
}

/// Reads the version list out of a `maven-metadata.xml` document.
fn parse_metadata(text: &str) -> Result<Vec<String>, String> {
	let document = roxmltree::Document::parse(text).map_err(|e| e.to_string())?;
	Ok(document
		.descendants()
		.filter(|n| n.has_tag_name("version") && n.parent().map_or(false, |p| p.has_tag_name("versions")))
		.filter_map(|n| n.text())
		.map(|t| t.trim().to_string())
		.collect())
}

impl MavenRepository {
	/// Creates a repository from the engine configuration.
	///
	/// `platform` is exposed to descriptors as the `javacpp.platform` system property, which selects the
	/// native artifacts JavaCPP presets depend on.
	pub fn new(config: &crate::Config, platform: &crate::PlatformSpecifier) -> Result<Self, RepositoryError> {
		let client = reqwest::blocking::Client::builder()
			.https_only(config.https_only())
			.timeout(config.timeout())
			.user_agent(concat!("javacv-install/", env!("CARGO_PKG_VERSION")))
			.build()?;

		let mut base_url = config.repository_url().to_string();
		if !base_url.ends_with('/') {
			base_url.push('/');
		}

		let mut system_properties = HashMap::new();
		system_properties.insert("javacpp.platform".to_string(), platform.to_string());

		Ok(MavenRepository {
			base_url,
			local_dir: config.local_repository(),
			client,
			do_checksums: config.do_checksums(),
			system_properties,
		})
	}

	fn get(&self, path: &str) -> Result<Vec<u8>, RepositoryError> {
		let url = format!("{}{}", self.base_url, path);
		log::trace!("GET {}", url);
		let response = self.client.get(&url)
			.send()
			.map_err(|e| RepositoryError::Unavailable(format!("{}: {}", url, e)))?;
		let status = response.status();
		if status == reqwest::StatusCode::NOT_FOUND {
			return Err(RepositoryError::NotFound(path.to_string()));
		}
		if !status.is_success() {
			return Err(RepositoryError::Unavailable(format!("{} returned {}", url, status)));
		}
		Ok(response.bytes()?.to_vec())
	}

	/// Compares `content` against the published `.sha256` file when there is one.
	fn verify(&self, path: &str, content: &[u8]) -> Result<(), RepositoryError> {
		if !self.do_checksums {
			return Ok(());
		}
		let published = match self.get(&format!("{}.sha256", path)) {
			Ok(p) => p,
			Err(RepositoryError::NotFound(_)) => {
				log::debug!("No checksum published for {}", path);
				return Ok(());
			},
			Err(e) => return Err(e),
		};
		let published = String::from_utf8_lossy(&published);
		let expected = published.split_whitespace().next().unwrap_or_default();
		if !expected.eq_ignore_ascii_case(&sha256::digest(content)) {
			return Err(RepositoryError::DifferentHashes(path.to_string()));
		}
		Ok(())
	}

	/// Returns the cached copy of `coordinate`, downloading it first if needed.
	fn fetch_file(&self, coordinate: &Coordinate) -> Result<PathBuf, RepositoryError> {
		let local = self.local_dir.join(coordinate.layout_path());
		if local.exists() {
			log::trace!("{} found in local repository", coordinate);
			return Ok(local);
		}

		let path = remote_path(coordinate);
		log::info!("Downloading {}", coordinate);
		let content = self.get(&path)?;
		self.verify(&path, &content)?;

		std::fs::create_dir_all(local.with_file_name(""))?;
		/* Written beside the target and renamed so an interrupted download never looks cached */
		let partial = local.with_extension("part");
		let mut file = std::fs::File::create(&partial)?;
		file.write_all(&content)?;
		file.sync_all()?;
		std::fs::rename(&partial, &local)?;
		Ok(local)
	}

	fn load_pom(&self, coordinate: &Coordinate) -> Result<Pom, RepositoryError> {
		let pom_coordinate = coordinate.clone().with_classifier("").with_extension("pom");
		let path = self.fetch_file(&pom_coordinate)?;
		let text = std::fs::read_to_string(path)?;
		Pom::parse(&text).map_err(|reason| RepositoryError::InvalidDescriptor { coordinate: pom_coordinate.to_string(), reason })
	}

	/// The POM of `coordinate` followed by its parents.
	fn lineage(&self, coordinate: &Coordinate) -> Result<Vec<Pom>, RepositoryError> {
		let mut lineage = vec![self.load_pom(coordinate)?];
		while let Some(parent) = lineage.last().and_then(|p| p.parent.clone()) {
			if lineage.len() >= MAX_LINEAGE {
				return Err(RepositoryError::InvalidDescriptor { coordinate: coordinate.to_string(), reason: "parent chain too long".to_string() });
			}
			let parent = Coordinate::new(parent.group_id, parent.artifact_id, parent.version);
			lineage.push(self.load_pom(&parent)?);
		}
		Ok(lineage)
	}
}

impl ArtifactRepository for MavenRepository {
	fn list_versions(&self, coordinate: &Coordinate) -> Result<Vec<String>, RepositoryError> {
		let content = self.get(&metadata_path(coordinate))?;
		let text = String::from_utf8_lossy(&content);
		parse_metadata(&text).map_err(|reason| RepositoryError::InvalidDescriptor { coordinate: coordinate.to_string(), reason })
	}

	fn fetch_descriptor(&self, coordinate: &Coordinate) -> Result<Vec<Dependency>, RepositoryError> {
		let lineage = self.lineage(coordinate)?;
		pom::effective_dependencies(&lineage, &self.system_properties)
			.map_err(|reason| RepositoryError::InvalidDescriptor { coordinate: coordinate.to_string(), reason })
	}

	fn resolve_graph(&self, root: &Dependency, filter: &mut dyn DependencyFilter) -> Result<Vec<ResolvedArtifact>, RepositoryError> {
		super::graph::collect(self, root, filter)?
			.into_iter()
			.map(|coordinate| {
				let path = self.fetch_file(&coordinate)?;
				Ok::<_, RepositoryError>(ResolvedArtifact { coordinate, path })
			})
			.collect()
	}
}
