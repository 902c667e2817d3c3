//! Local package repository and the resolution engine built on top of it.
//!
//! [`RepositorySystem`] is the seam the classpath code resolves through;
//! [`resolver::PomResolver`] is the implementation that walks POMs in a
//! Maven-layout [`LocalRepository`].

pub mod local;
pub mod resolver;

pub use local::LocalRepository;

use crate::error::Result;
use crate::models::{Artifact, ArtifactSet};

/// One resolution call: which artifact, whether to follow its
/// dependencies, and where to look.
#[derive(Debug, Clone)]
pub struct ResolutionRequest<'a> {
    pub artifact: &'a Artifact,
    pub transitive: bool,
    pub local_repository: &'a LocalRepository,
    /// `group:artifact` patterns pruned from the walk; either side may be `*`.
    pub exclusions: Vec<(String, String)>,
}

impl<'a> ResolutionRequest<'a> {
    pub fn new(artifact: &'a Artifact, local_repository: &'a LocalRepository) -> Self {
        Self {
            artifact,
            transitive: false,
            local_repository,
            exclusions: Vec::new(),
        }
    }

    pub fn transitive(mut self, transitive: bool) -> Self {
        self.transitive = transitive;
        self
    }

    pub fn exclusions(mut self, exclusions: Vec<(String, String)>) -> Self {
        self.exclusions = exclusions;
        self
    }
}

/// A dependency declared directly by a project.
#[derive(Debug, Clone)]
pub struct DirectDependency {
    pub artifact: Artifact,
    pub exclusions: Vec<(String, String)>,
}

/// Resolution of a whole project graph: every direct dependency sits at
/// depth one of a single walk.
#[derive(Debug, Clone)]
pub struct CollectRequest<'a> {
    pub dependencies: Vec<DirectDependency>,
    pub local_repository: &'a LocalRepository,
}

/// Resolves artifacts to local files.
pub trait RepositorySystem {
    /// The returned set starts with the requested artifact itself, followed
    /// by its dependency closure when the request is transitive.
    fn resolve(&self, request: &ResolutionRequest<'_>) -> Result<ArtifactSet>;

    /// Direct dependencies first, in declaration order, then the transitive
    /// ones. A dependency whose POM cannot be read is kept without its
    /// own dependencies.
    fn collect(&self, request: &CollectRequest<'_>) -> Result<ArtifactSet>;
}
