//! Resolves and installs JavaCV components into an ImageJ or Fiji installation.
//!
//! Everything hangs off an [`EngineContext`], see [`installation`] for running an install.

pub mod error;
pub use error::Result;
pub use error::Error;

pub mod config;
pub use config::Config;

pub mod version;
pub use version::{Version, VersionRequirement};

pub mod platform;
pub use platform::PlatformSpecifier;

pub mod repository;
pub mod catalog;
pub mod relationship_resolver;
pub mod installation;
pub use installation::{InstallRequest, ReconcileReport};

pub mod context;
pub use context::EngineContext;
