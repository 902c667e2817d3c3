use tracing::warn;

use crate::models::ClasspathEntry;
use crate::project::ProjectModel;

/// Locations in coverage scope: the test output directory, the output
/// directory, then the files of classpath-eligible dependencies that share
/// the project's group id. Unresolved artifacts are skipped.
pub fn coverage_classpath(project: &dyn ProjectModel) -> Vec<ClasspathEntry> {
    let directories = [project.test_output_directory(), project.output_directory()];
    let files = project
        .artifacts()
        .iter()
        .filter(|a| a.group() == project.group_id() && a.is_added_to_classpath())
        .filter_map(|a| a.file.as_deref());

    directories
        .into_iter()
        .flatten()
        .map(|dir| ClasspathEntry::parse(&dir))
        .chain(files.map(ClasspathEntry::from_path))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("{}", err);
                None
            }
        })
        .collect()
}
