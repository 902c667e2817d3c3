use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ClasspathError, Result};
use crate::models::{normalize_path, Artifact, ArtifactSet, ClasspathEntry, Coordinate, Scope};
use crate::project::pom::{ParentRef, Pom, PomDependency};
use crate::project::ProjectModel;
use crate::repository::resolver::inherit_repository_parents;
use crate::repository::{CollectRequest, DirectDependency, LocalRepository, RepositorySystem};

/// Local parent POMs further up than this are ignored.
const MAX_PARENT_DEPTH: usize = 16;

/// A Maven project loaded from its `pom.xml`.
///
/// Dependencies start out unresolved; until [`MavenProject::resolve_dependencies`]
/// succeeds, both classpath accessors fail the way the host does when a
/// goal runs without dependency resolution.
#[derive(Debug, Clone)]
pub struct MavenProject {
    coordinate: Coordinate,
    build_directory: PathBuf,
    output_directory: PathBuf,
    test_output_directory: PathBuf,
    source_directory: PathBuf,
    test_source_directory: PathBuf,
    dependencies: Vec<PomDependency>,
    artifacts: ArtifactSet,
    resolved: bool,
}

impl MavenProject {
    /// Load `pom_file`, folding in its parents from disk and, past the
    /// first parent not found there, from `local_repository`.
    pub fn load(pom_file: &Path, local_repository: &LocalRepository) -> Result<Self> {
        let pom_file = normalize_path(pom_file);
        let mut pom = Pom::parse_file(&pom_file)?;
        if let Some(parent) = inherit_local_parents(&mut pom, &pom_file) {
            if let Err(e) = inherit_repository_parents(local_repository, &mut pom, parent) {
                warn!("parent POM of {} not inherited: {}", pom_file.display(), e);
            }
        }

        let missing = |field: &str| ClasspathError::Pom {
            path: pom_file.clone(),
            reason: format!("missing <{}> and no <parent> to inherit it from", field),
        };
        let group = pom.effective_group().ok_or_else(|| missing("groupId"))?.to_string();
        let version = pom.effective_version().ok_or_else(|| missing("version"))?.to_string();
        let packaging = pom.packaging.clone().unwrap_or_else(|| "jar".to_string());
        let coordinate = Coordinate::new(&pom.interpolate(&group), &pom.artifact_id, &pom.interpolate(&version))
            .with_kind(&packaging);

        let basedir = pom_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let basedir_str = basedir.to_string_lossy().into_owned();
        pom.properties.insert("basedir".to_string(), basedir_str.clone());
        pom.properties.insert("project.basedir".to_string(), basedir_str);

        let under_basedir = |value: &str| normalize_path(&basedir.join(pom.interpolate(value)));

        let build_directory = under_basedir(pom.build.directory.as_deref().unwrap_or("target"));
        pom.properties.insert(
            "project.build.directory".to_string(),
            build_directory.to_string_lossy().into_owned(),
        );
        let under_basedir = |value: &str| normalize_path(&basedir.join(pom.interpolate(value)));

        let output_directory = match &pom.build.output_directory {
            Some(dir) => under_basedir(dir),
            None => build_directory.join("classes"),
        };
        let test_output_directory = match &pom.build.test_output_directory {
            Some(dir) => under_basedir(dir),
            None => build_directory.join("test-classes"),
        };
        let source_directory =
            under_basedir(pom.build.source_directory.as_deref().unwrap_or("src/main/java"));
        let test_source_directory =
            under_basedir(pom.build.test_source_directory.as_deref().unwrap_or("src/test/java"));

        Ok(Self {
            coordinate,
            dependencies: pom.effective_dependencies(),
            build_directory,
            output_directory,
            test_output_directory,
            source_directory,
            test_source_directory,
            artifacts: ArtifactSet::new(),
            resolved: false,
        })
    }

    pub fn build_directory(&self) -> &Path {
        &self.build_directory
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Resolve declared dependencies and their closures into project artifacts.
    ///
    /// The whole graph is walked at once with the direct dependencies at
    /// depth one, so they win over any transitive declaration of the same
    /// `group:name`. A dependency without a version is skipped.
    pub fn resolve_dependencies(
        &mut self,
        local_repository: &LocalRepository,
        system: &dyn RepositorySystem,
    ) -> Result<()> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut direct = Vec::new();
        for dep in &self.dependencies {
            if !seen.insert(dep.key()) {
                continue;
            }
            let Some(coordinate) = dep.coordinate() else {
                warn!("{} has no version declared or managed; skipped", dep.key());
                continue;
            };
            let mut artifact = Artifact::new(coordinate).with_scope(dep.scope());
            artifact.optional = dep.optional;
            if let (Scope::System, Some(path)) = (dep.scope(), &dep.system_path) {
                artifact = artifact.with_file(path);
            }
            direct.push(DirectDependency {
                artifact,
                exclusions: dep.exclusions.clone(),
            });
        }

        let request = CollectRequest {
            dependencies: direct,
            local_repository,
        };
        self.artifacts = system.collect(&request)?;
        debug!("{} resolved to {} artifacts", self.coordinate, self.artifacts.len());
        self.resolved = true;
        Ok(())
    }

    fn classpath_files<F>(&self, mut elements: Vec<String>, include: F) -> Result<Vec<String>>
    where
        F: Fn(&Artifact) -> bool,
    {
        if !self.resolved {
            return Err(ClasspathError::DependencyResolution {
                reason: format!("dependencies of {} have not been resolved", self.coordinate),
            });
        }
        for artifact in self.artifacts.iter().filter(|a| a.is_added_to_classpath() && include(a)) {
            match &artifact.file {
                Some(file) => elements.push(element(file)?),
                None => {
                    return Err(ClasspathError::DependencyResolution {
                        reason: format!("{} has not been resolved to a file", artifact),
                    })
                }
            }
        }
        Ok(elements)
    }
}

/// Fold in parent POMs reachable through `<relativePath>` (default `../pom.xml`).
///
/// Returns the first parent that is not available on disk.
fn inherit_local_parents(pom: &mut Pom, pom_file: &Path) -> Option<ParentRef> {
    let mut current_file = pom_file.to_path_buf();
    let mut next = pom.parent.clone().map(|p| (p, pom.parent_file(pom_file)));
    let mut depth = 0;

    while let Some((parent_ref, parent_file)) = next.take() {
        depth += 1;
        if depth > MAX_PARENT_DEPTH {
            warn!("local parent chain of {} too deep", pom_file.display());
            return None;
        }
        let Some(parent_file) = parent_file.filter(|f| f.is_file() && *f != current_file) else {
            return Some(parent_ref);
        };
        let parent = match Pom::parse_file(&parent_file) {
            Ok(parent) => parent,
            Err(e) => {
                warn!("ignoring parent POM {}: {}", parent_file.display(), e);
                return Some(parent_ref);
            }
        };
        if parent.artifact_id != parent_ref.artifact_id {
            debug!(
                "{} is {}, not parent {}",
                parent_file.display(),
                parent.artifact_id,
                parent_ref.artifact_id
            );
            return Some(parent_ref);
        }
        pom.inherit(&parent);
        next = parent
            .parent
            .clone()
            .map(|p| (p, parent.parent_file(&parent_file)));
        current_file = parent_file;
    }
    None
}

/// A path as a classpath element; non-UTF-8 paths are a `PathConversion` error.
fn element(path: &Path) -> Result<String> {
    ClasspathEntry::from_path(path).map(|entry| entry.as_str().to_string())
}

/// A path as a root or directory string, dropped with a warning when not UTF-8.
fn location(path: &Path) -> Option<String> {
    match element(path) {
        Ok(location) => Some(location),
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

impl ProjectModel for MavenProject {
    fn id(&self) -> String {
        self.coordinate.to_string()
    }

    fn group_id(&self) -> &str {
        &self.coordinate.group
    }

    fn compile_source_roots(&self) -> Vec<String> {
        location(&self.source_directory).into_iter().collect()
    }

    fn test_compile_source_roots(&self) -> Vec<String> {
        location(&self.test_source_directory).into_iter().collect()
    }

    fn compile_classpath_elements(&self) -> Result<Vec<String>> {
        let elements = vec![element(&self.output_directory)?];
        self.classpath_files(elements, |a| a.scope.is_compile())
    }

    fn test_classpath_elements(&self) -> Result<Vec<String>> {
        let elements = vec![
            element(&self.test_output_directory)?,
            element(&self.output_directory)?,
        ];
        self.classpath_files(elements, |_| true)
    }

    fn output_directory(&self) -> Option<String> {
        location(&self.output_directory)
    }

    fn test_output_directory(&self) -> Option<String> {
        location(&self.test_output_directory)
    }

    fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }
}
