use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{ClasspathError, Result};
use crate::models::{Artifact, ArtifactSet, Coordinate};
use crate::repository::{LocalRepository, RepositorySystem, ResolutionRequest};

/// Known-plugins key of the testability plugin.
pub const PLUGIN_KEY: &str = "com.github.jazzmuesli:testability-mvn-plugin";

/// Plugin release used when `[plugins] artifacts` is not configured.
pub const PLUGIN_VERSION: &str = "1.0-SNAPSHOT";

/// Plugin artifacts known to the host, keyed by `group:name`.
pub type KnownArtifacts = BTreeMap<String, Artifact>;

/// Build the known-plugins table, locating each artifact in `local_repository`.
pub fn known_plugins(coordinates: &[Coordinate], local_repository: &LocalRepository) -> KnownArtifacts {
    coordinates
        .iter()
        .map(|c| {
            let artifact = local_repository.locate(&Artifact::new(c.clone()));
            if artifact.file.is_none() {
                warn!(
                    "{} is not in local repository {}; set [plugins] artifacts to an installed version",
                    c,
                    local_repository.root().display()
                );
            }
            (c.key(), artifact)
        })
        .collect()
}

/// Resolves the plugin's own runtime dependencies through a [`RepositorySystem`].
pub struct PluginResolver<'a> {
    system: &'a dyn RepositorySystem,
    known: &'a KnownArtifacts,
}

impl<'a> PluginResolver<'a> {
    pub fn new(system: &'a dyn RepositorySystem, known: &'a KnownArtifacts) -> Self {
        Self { system, known }
    }

    /// The plugin's own artifact; a [`ClasspathError::Configuration`] naming
    /// every known key when it is missing.
    pub fn plugin_artifact(&self) -> Result<&'a Artifact> {
        self.known
            .get(PLUGIN_KEY)
            .ok_or_else(|| ClasspathError::Configuration {
                coordinate: PLUGIN_KEY.to_string(),
                known: self.known.keys().cloned().collect(),
            })
    }

    /// Transitive closure of the plugin artifact, not retried on failure.
    pub fn resolve_transitive_dependencies(&self, local_repository: &LocalRepository) -> Result<ArtifactSet> {
        let artifact = self.plugin_artifact()?;
        let request = ResolutionRequest::new(artifact, local_repository).transitive(true);
        let artifacts = self.system.resolve(&request).map_err(|e| match e {
            e @ ClasspathError::Resolution { .. } => e,
            other => ClasspathError::Resolution {
                artifact: artifact.coordinate.to_string(),
                reason: other.to_string(),
            },
        })?;
        debug!("{} resolved to {} artifacts", artifact.coordinate, artifacts.len());
        Ok(artifacts)
    }
}
