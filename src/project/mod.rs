use crate::error::Result;
use crate::models::ArtifactSet;

pub mod maven;
pub mod pom;

/// Read-only view of the project being analyzed.
///
/// Classpath elements are fallible: a project whose dependencies have not
/// been resolved yet reports [`ClasspathError::DependencyResolution`].
///
/// [`ClasspathError::DependencyResolution`]: crate::error::ClasspathError::DependencyResolution
pub trait ProjectModel {
    /// Display identity, used in logs.
    fn id(&self) -> String;
    fn group_id(&self) -> &str;
    fn compile_source_roots(&self) -> Vec<String>;
    fn test_compile_source_roots(&self) -> Vec<String>;
    fn compile_classpath_elements(&self) -> Result<Vec<String>>;
    fn test_classpath_elements(&self) -> Result<Vec<String>>;
    fn output_directory(&self) -> Option<String>;
    fn test_output_directory(&self) -> Option<String>;
    fn artifacts(&self) -> &ArtifactSet;
}
