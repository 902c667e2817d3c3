use std::path::PathBuf;

use tracing::{debug, error, warn};

use crate::classpath::plugin::PluginResolver;
use crate::classpath::OrderedClasspath;
use crate::error::{ClasspathError, Result};
use crate::models::{Artifact, ClasspathEntry};
use crate::project::ProjectModel;
use crate::repository::LocalRepository;

/// Ordered registry of absolute locations for a single classpath pass.
///
/// Registering a location twice keeps the first registration.
#[derive(Debug)]
pub struct Realm {
    id: String,
    locations: Vec<PathBuf>,
}

impl Realm {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            locations: Vec::new(),
        }
    }

    /// Register a classpath element given as a string.
    pub fn add_element(&mut self, element: &str) -> Result<()> {
        let entry = ClasspathEntry::parse(element)?;
        self.add_location(entry.normalized());
        Ok(())
    }

    /// Register the resolved file of `artifact`.
    pub fn add_artifact(&mut self, artifact: &Artifact) -> Result<()> {
        let file = artifact.file.as_deref().ok_or_else(|| ClasspathError::PathConversion {
            element: artifact.coordinate.to_string(),
            reason: "artifact has no resolved file".to_string(),
        })?;
        let entry = ClasspathEntry::from_path(file)?;
        self.add_location(entry.normalized());
        Ok(())
    }

    fn add_location(&mut self, location: PathBuf) {
        if !self.locations.contains(&location) {
            debug!("realm {}: {}", self.id, location.display());
            self.locations.push(location);
        }
    }

    pub fn locations(&self) -> &[PathBuf] {
        &self.locations
    }
}

/// Register, in order: the project's compile source roots, its compile
/// classpath elements, the plugin's resolved dependencies and the plugin
/// itself; then read every location back as an absolute path.
///
/// Per-element failures are logged and skipped. A missing plugin artifact or
/// a failed plugin resolution is returned as an error.
pub fn build_realm(
    project: &dyn ProjectModel,
    local_repository: &LocalRepository,
    resolver: &PluginResolver<'_>,
) -> Result<OrderedClasspath> {
    let mut realm = Realm::new("testability");

    for root in project.compile_source_roots() {
        if let Err(e) = realm.add_element(&root) {
            warn!("source root skipped: {}", e);
        }
    }

    match project.compile_classpath_elements() {
        Ok(elements) => {
            for element in elements {
                if let Err(e) = realm.add_element(&element) {
                    warn!("compile classpath element skipped: {}", e);
                }
            }
        }
        Err(e) => error!("compile classpath unavailable for {}: {}", project.id(), e),
    }

    for artifact in &resolver.resolve_transitive_dependencies(local_repository)? {
        if let Err(e) = realm.add_artifact(artifact) {
            warn!("plugin dependency skipped: {}", e);
        }
    }

    if let Err(e) = realm.add_artifact(resolver.plugin_artifact()?) {
        warn!("plugin artifact skipped: {}", e);
    }

    let mut classpath = OrderedClasspath::new();
    for location in realm.locations() {
        match ClasspathEntry::from_path(location) {
            Ok(entry) => {
                classpath.push(entry);
            }
            Err(e) => warn!("{}", e),
        }
    }
    Ok(classpath)
}
