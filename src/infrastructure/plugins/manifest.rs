//! Plugin manifest definition

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::application::errors::PluginError;

/// File name of the manifest inside a local plugin directory
pub const MANIFEST_FILE: &str = "plugin.yaml";

/// Plugin package metadata
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginManifest {
    /// Plugin name (required)
    pub name: String,

    /// Plugin version (required)
    pub version: String,

    /// Plugin description
    pub description: Option<String>,

    /// Plugin author
    pub author: Option<String>,

    /// Path to the shared library, relative to the plugin directory
    pub library: Option<PathBuf>,
}

impl PluginManifest {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            author: None,
            library: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PluginError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PluginError::load(path.display().to_string(), format!("Failed to read manifest: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| PluginError::load(path.display().to_string(), format!("Failed to parse manifest: {}", e)))
    }

    /// Check the manifest's version against a semver requirement such as
    /// `0.3`, `^0.3.1` or `=0.3.1`.
    pub fn satisfies(&self, requirement: &str) -> Result<(), String> {
        let req = semver::VersionReq::parse(requirement)
            .map_err(|e| format!("Invalid version requirement '{}': {}", requirement, e))?;
        let version = semver::Version::parse(&self.version)
            .map_err(|e| format!("Invalid version '{}': {}", self.version, e))?;
        if req.matches(&version) {
            Ok(())
        } else {
            Err(format!("Version {} does not satisfy {}", self.version, requirement))
        }
    }

    /// Shared library of a plugin living in `dir`.
    ///
    /// Defaults to the platform's file name for a cdylib built from a crate
    /// with the plugin's name.
    pub fn library_path(&self, dir: &Path) -> PathBuf {
        match &self.library {
            Some(lib) => dir.join(lib),
            None => dir.join(libloading::library_filename(self.name.replace('-', "_"))),
        }
    }
}
