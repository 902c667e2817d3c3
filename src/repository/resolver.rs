use std::collections::{HashSet, VecDeque};

use tracing::{debug, error, warn};

use crate::error::{ClasspathError, Result};
use crate::models::{Artifact, ArtifactSet, Coordinate, Scope};
use crate::project::pom::{is_excluded, ParentRef, Pom, PomDependency};
use crate::repository::{CollectRequest, LocalRepository, RepositorySystem, ResolutionRequest};

/// Parent chains longer than this are treated as cycles.
const MAX_PARENT_DEPTH: usize = 16;

/// Resolves artifacts by walking POMs in a [`LocalRepository`].
///
/// The walk is breadth-first, so the nearest declaration of a
/// `group:name` wins. `test` and `provided` dependencies of dependencies are
/// not followed, nor are optional ones. An artifact reached again through a
/// wider scope is widened. A POM that is missing from the repository
/// contributes no dependencies; one that exists but cannot be read is a
/// [`ClasspathError::Resolution`] for [`RepositorySystem::resolve`] and is
/// skipped by [`RepositorySystem::collect`].
#[derive(Debug, Default)]
pub struct PomResolver;

impl PomResolver {
    pub fn new() -> Self {
        Self
    }

    /// Read the POM for `coordinate` and fold in its parents.
    ///
    /// `Ok(None)` when the repository has no POM for it.
    fn effective_pom(&self, repo: &LocalRepository, coordinate: &Coordinate) -> Result<Option<Pom>> {
        let pom_path = repo.pom_path(coordinate);
        if !pom_path.is_file() {
            debug!("no POM for {} at {}", coordinate, pom_path.display());
            return Ok(None);
        }
        let mut pom = Pom::parse_file(&pom_path).map_err(|e| resolution_error(coordinate, e))?;
        if let Some(parent) = pom.parent.clone() {
            inherit_repository_parents(repo, &mut pom, parent)?;
        }
        Ok(Some(pom))
    }
}

/// Fold `parent` and its own ancestors, read from `repo`, into `pom`.
///
/// The chain ends quietly at the first parent the repository does not hold.
pub fn inherit_repository_parents(repo: &LocalRepository, pom: &mut Pom, parent: ParentRef) -> Result<()> {
    let mut next = Some(parent);
    let mut depth = 0;
    while let Some(parent_ref) = next.take() {
        depth += 1;
        let parent_coordinate = Coordinate::new(
            &parent_ref.group_id,
            &parent_ref.artifact_id,
            &parent_ref.version,
        )
        .with_kind("pom");
        if depth > MAX_PARENT_DEPTH {
            return Err(ClasspathError::Resolution {
                artifact: parent_coordinate.to_string(),
                reason: "parent POM chain too deep".to_string(),
            });
        }
        let parent_path = repo.pom_path(&parent_coordinate);
        if !parent_path.is_file() {
            debug!("parent POM {} not in local repository", parent_coordinate);
            break;
        }
        let parent =
            Pom::parse_file(&parent_path).map_err(|e| resolution_error(&parent_coordinate, e))?;
        pom.inherit(&parent);
        next = parent.parent.clone();
    }
    Ok(())
}

fn resolution_error(coordinate: &Coordinate, e: ClasspathError) -> ClasspathError {
    ClasspathError::Resolution {
        artifact: coordinate.to_string(),
        reason: e.to_string(),
    }
}

/// Scope a transitive dependency takes on, given the scope it was reached through.
fn mediate_scope(parent: Scope, declared: Scope) -> Scope {
    match (parent, declared) {
        (Scope::Compile, declared) => declared,
        (Scope::Runtime, Scope::Compile) => Scope::Runtime,
        (parent, _) => parent,
    }
}

/// What the walk does with a POM it cannot read.
#[derive(Debug, Clone, Copy, PartialEq)]
enum OnBrokenPom {
    Fail,
    Skip,
}

struct Pending {
    coordinate: Coordinate,
    scope: Scope,
    exclusions: Vec<(String, String)>,
}

/// Breadth-first walk over POM dependencies.
struct Walk<'r> {
    repo: &'r LocalRepository,
    on_broken_pom: OnBrokenPom,
    result: ArtifactSet,
    /// `group:name` keys already placed; the first placement fixes the version.
    seen: HashSet<String>,
    /// Roots and direct dependencies keep the scope they were declared with.
    pinned: HashSet<String>,
    queue: VecDeque<Pending>,
}

impl<'r> Walk<'r> {
    fn new(repo: &'r LocalRepository, on_broken_pom: OnBrokenPom) -> Self {
        Self {
            repo,
            on_broken_pom,
            result: ArtifactSet::new(),
            seen: HashSet::new(),
            pinned: HashSet::new(),
            queue: VecDeque::new(),
        }
    }

    /// Place an artifact that was asked for directly.
    fn seed(&mut self, artifact: Artifact, exclusions: Vec<(String, String)>, follow: bool) {
        let key = artifact.coordinate.key();
        if !self.seen.insert(key.clone()) {
            return;
        }
        self.pinned.insert(key);
        if follow {
            self.queue.push_back(Pending {
                coordinate: artifact.coordinate.clone(),
                scope: artifact.scope,
                exclusions,
            });
        }
        self.result.insert(artifact);
    }

    fn run(mut self, resolver: &PomResolver) -> Result<ArtifactSet> {
        while let Some(node) = self.queue.pop_front() {
            let pom = match resolver.effective_pom(self.repo, &node.coordinate) {
                Ok(Some(pom)) => pom,
                Ok(None) => continue,
                Err(e) if self.on_broken_pom == OnBrokenPom::Skip => {
                    error!("dependencies of {} skipped: {}", node.coordinate, e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            for dep in pom.effective_dependencies() {
                self.visit(&node, &dep);
            }
        }
        Ok(self.result)
    }

    fn visit(&mut self, node: &Pending, dep: &PomDependency) {
        let declared = dep.scope();
        if matches!(declared, Scope::Test | Scope::Provided) || dep.optional {
            return;
        }
        if is_excluded(&node.exclusions, &dep.group_id, &dep.artifact_id) {
            debug!("{} excluded below {}", dep.key(), node.coordinate);
            return;
        }

        let key = dep.key();
        let scope = mediate_scope(node.scope, declared);
        let mut exclusions = node.exclusions.clone();
        exclusions.extend(dep.exclusions.iter().cloned());

        if self.seen.contains(&key) {
            self.widen(&key, scope, exclusions);
            return;
        }
        let Some(coordinate) = dep.coordinate() else {
            warn!("{} declared by {} has no version; skipped", key, node.coordinate);
            return;
        };
        self.seen.insert(key);

        let artifact = self.repo.locate(&Artifact::new(coordinate.clone()).with_scope(scope));
        if artifact.file.is_none() {
            warn!("{} is not in local repository {}", coordinate, self.repo.root().display());
        }
        debug!("{} -> {}", node.coordinate, artifact);
        self.result.insert(artifact);
        self.queue.push_back(Pending {
            coordinate,
            scope,
            exclusions,
        });
    }

    /// Give a placed artifact the wider of its scope and `scope`, then walk
    /// its dependencies again so they follow.
    fn widen(&mut self, key: &str, scope: Scope, exclusions: Vec<(String, String)>) {
        if self.pinned.contains(key) {
            return;
        }
        let Some(existing) = self.result.get_mut_by_key(key) else {
            return;
        };
        let widened = existing.scope.widest(scope);
        if widened == existing.scope {
            return;
        }
        debug!("{} widened to {}", existing.coordinate, widened);
        existing.scope = widened;
        let coordinate = existing.coordinate.clone();
        self.queue.push_back(Pending {
            coordinate,
            scope: widened,
            exclusions,
        });
    }
}

impl RepositorySystem for PomResolver {
    fn resolve(&self, request: &ResolutionRequest<'_>) -> Result<ArtifactSet> {
        let repo = request.local_repository;
        let root = repo.locate(request.artifact);
        if root.file.is_none() {
            warn!("{} is not in local repository {}", root.coordinate, repo.root().display());
        }

        let mut walk = Walk::new(repo, OnBrokenPom::Fail);
        walk.seed(root, request.exclusions.clone(), request.transitive);
        walk.run(self)
    }

    fn collect(&self, request: &CollectRequest<'_>) -> Result<ArtifactSet> {
        let repo = request.local_repository;
        let mut walk = Walk::new(repo, OnBrokenPom::Skip);
        for dependency in &request.dependencies {
            let artifact = repo.locate(&dependency.artifact);
            if artifact.file.is_none() {
                warn!("{} is not in local repository {}", artifact.coordinate, repo.root().display());
            }
            let follow = artifact.scope != Scope::System;
            walk.seed(artifact, dependency.exclusions.clone(), follow);
        }
        walk.run(self)
    }
}
