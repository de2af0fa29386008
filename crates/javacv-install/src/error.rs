//! Library error type.

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("invalid version format: {0:?}")]
	InvalidVersionFormat(String),
	/// The requested version is not published. `suggested` is the version a caller could fall back to.
	#[error("requested JavaCV version ({requested}) is unknown")]
	UnknownVersion {
		requested: String,
		suggested: Option<String>,
	},
	#[error("repository unavailable: {0}")]
	RepositoryUnavailable(String),
	#[error("failed to resolve {coordinate}: {reason}")]
	ResolutionFailed {
		coordinate: String,
		reason: String,
	},
	#[error("can't write to {}: {source}", path.display())]
	DestinationUnwritable {
		path: std::path::PathBuf,
		source: std::io::Error,
	},
	#[error("source file of {artifact} not found at {}", path.display())]
	SourceMissing {
		artifact: String,
		path: std::path::PathBuf,
	},
	#[error("installation of {} failed part way: {reason}", path.display())]
	PartialInstallation {
		path: std::path::PathBuf,
		reason: String,
	},
	#[error("unsupported platform: {0}")]
	UnsupportedPlatform(String),
	/// A previous run staged changes which only take effect once the host has restarted.
	#[error("host must be restarted after the previous install operation")]
	RestartRequired,
	#[error("another installation is in progress (lock held at {})", .0.display())]
	InstallationLocked(std::path::PathBuf),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
}

/// Repository failures outside of artifact resolution mean the repository could not be queried.
impl From<crate::repository::RepositoryError> for Error {
	fn from(value: crate::repository::RepositoryError) -> Self {
		Error::RepositoryUnavailable(value.to_string())
	}
}
