use tracing::{error, info};

use crate::classpath::plugin::PluginResolver;
use crate::classpath::realm::build_realm;
use crate::classpath::OrderedClasspath;
use crate::error::Result;
use crate::project::ProjectModel;
use crate::repository::LocalRepository;

/// Classpath of the target project merged with the plugin's own dependencies.
///
/// Sources are merged in order: test classpath elements, compile classpath
/// elements, then the realm (see [`build_realm`]). When the project's
/// classpath elements are not available yet the failure is logged and that
/// source contributes nothing.
// TODO: decide whether an unavailable test classpath should instead require
// dependency resolution up front; it is currently logged and skipped.
pub fn prepare_classpath(
    project: &dyn ProjectModel,
    local_repository: &LocalRepository,
    resolver: &PluginResolver<'_>,
) -> Result<OrderedClasspath> {
    info!("project: {}", project.id());
    for artifact in project.artifacts().iter().filter(|a| a.group() == project.group_id()) {
        info!("artifact: {}", artifact);
    }

    let mut classpath = OrderedClasspath::new();

    match project.test_classpath_elements() {
        Ok(elements) => classpath.extend_elements(elements),
        Err(e) => error!("test classpath unavailable for {}: {}", project.id(), e),
    }
    match project.compile_classpath_elements() {
        Ok(elements) => classpath.extend_elements(elements),
        Err(e) => error!("compile classpath unavailable for {}: {}", project.id(), e),
    }

    let realm = build_realm(project, local_repository, resolver)?;
    classpath.extend_from(&realm);
    Ok(classpath)
}

/// Classpath handed to the analysis engine: compile classpath elements first,
/// then everything [`prepare_classpath`] produces.
pub fn project_classpath(
    project: &dyn ProjectModel,
    local_repository: &LocalRepository,
    resolver: &PluginResolver<'_>,
) -> Result<OrderedClasspath> {
    let mut classpath = OrderedClasspath::new();
    match project.compile_classpath_elements() {
        Ok(elements) => classpath.extend_elements(elements),
        Err(e) => error!("compile classpath unavailable for {}: {}", project.id(), e),
    }
    classpath.extend_from(&prepare_classpath(project, local_repository, resolver)?);
    info!("classpath: {}", classpath);
    Ok(classpath)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::plugin::tests::{plugin_table, FakeSystem};
    use crate::classpath::plugin::KnownArtifacts;
    use crate::error::ClasspathError;
    use crate::models::{Artifact, Coordinate};
    use crate::project::fake::FakeProject;
    use std::collections::HashSet;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_precedence() {
        // The realm contributes its compile classpath ("/Y", "/Z") and the
        // plugin closure ("/Z", "/W"); the plugin jar itself comes last.
        let project = FakeProject {
            test: Some(strings(&["/X", "/Y"])),
            compile: Some(strings(&["/Y", "/Z"])),
            ..Default::default()
        };
        let known = plugin_table("/W");
        let system = FakeSystem::returning(vec![
            Artifact::new(Coordinate::new("g", "z", "1")).with_file("/Z"),
            Artifact::new(Coordinate::new("g", "w", "1")).with_file("/W"),
        ]);
        let resolver = PluginResolver::new(&system, &known);

        let cp = prepare_classpath(&project, &LocalRepository::new("/m2"), &resolver).unwrap();
        assert_eq!(cp.to_strings(), vec!["/X", "/Y", "/Z", "/W"]);
    }

    #[test]
    fn test_no_duplicates_and_first_seen_order() {
        let project = FakeProject {
            source_roots: vec!["/p/src".into(), "/p/src/".into()],
            test: Some(strings(&["/p/test-classes", "/p/classes", "/m2/a.jar", "/m2/./a.jar"])),
            compile: Some(strings(&["/p/classes", "/m2/a.jar", "/m2/b.jar"])),
            ..Default::default()
        };
        let known = plugin_table("/m2/plugin.jar");
        let system = FakeSystem::returning(vec![
            Artifact::new(Coordinate::new("g", "b", "1")).with_file("/m2/b.jar"),
            Artifact::new(Coordinate::new("g", "c", "1")).with_file("/m2/c.jar"),
        ]);
        let resolver = PluginResolver::new(&system, &known);

        let cp = prepare_classpath(&project, &LocalRepository::new("/m2"), &resolver).unwrap();
        let paths: Vec<_> = cp.iter().map(|e| e.normalized()).collect();
        let unique: HashSet<_> = paths.iter().collect();
        assert_eq!(unique.len(), paths.len());
        assert_eq!(
            cp.to_strings(),
            vec![
                "/p/test-classes",
                "/p/classes",
                "/m2/a.jar",
                "/m2/b.jar",
                "/p/src",
                "/m2/c.jar",
                "/m2/plugin.jar"
            ]
        );
    }

    #[test]
    fn test_idempotent() {
        let project = FakeProject {
            source_roots: vec!["/p/src".into()],
            test: Some(strings(&["/p/test-classes"])),
            compile: Some(strings(&["/p/classes"])),
            ..Default::default()
        };
        let known = plugin_table("/m2/plugin.jar");
        let system = FakeSystem::returning(vec![
            Artifact::new(Coordinate::new("g", "c", "1")).with_file("/m2/c.jar")
        ]);
        let resolver = PluginResolver::new(&system, &known);
        let repo = LocalRepository::new("/m2");

        let first = prepare_classpath(&project, &repo, &resolver).unwrap();
        let second = prepare_classpath(&project, &repo, &resolver).unwrap();
        assert_eq!(first.to_strings(), second.to_strings());
    }

    #[test]
    fn test_unavailable_test_classpath_degrades() {
        let project = FakeProject {
            test: None,
            compile: Some(strings(&["/p/classes"])),
            ..Default::default()
        };
        let known = plugin_table("/m2/plugin.jar");
        let system = FakeSystem::returning(vec![
            Artifact::new(Coordinate::new("g", "c", "1")).with_file("/m2/c.jar")
        ]);
        let resolver = PluginResolver::new(&system, &known);

        let cp = prepare_classpath(&project, &LocalRepository::new("/m2"), &resolver).unwrap();
        assert_eq!(cp.to_strings(), vec!["/p/classes", "/m2/c.jar", "/m2/plugin.jar"]);
    }

    #[test]
    fn test_unresolved_project_still_gets_plugin_classpath() {
        let project = FakeProject {
            source_roots: vec!["/p/src".into()],
            ..Default::default()
        };
        let known = plugin_table("/m2/plugin.jar");
        let system = FakeSystem::returning(Vec::new());
        let resolver = PluginResolver::new(&system, &known);

        let cp = project_classpath(&project, &LocalRepository::new("/m2"), &resolver).unwrap();
        assert_eq!(cp.to_strings(), vec!["/p/src", "/m2/plugin.jar"]);
    }

    #[test]
    fn test_missing_plugin_escalates() {
        let project = FakeProject {
            test: Some(strings(&["/X"])),
            compile: Some(strings(&["/Y"])),
            ..Default::default()
        };
        let known = KnownArtifacts::new();
        let system = FakeSystem::returning(Vec::new());
        let resolver = PluginResolver::new(&system, &known);

        let err = prepare_classpath(&project, &LocalRepository::new("/m2"), &resolver).unwrap_err();
        assert!(matches!(err, ClasspathError::Configuration { .. }));
    }

    #[test]
    fn test_plugin_resolution_failure_escalates() {
        let project = FakeProject {
            test: Some(strings(&["/X"])),
            compile: Some(strings(&["/Y"])),
            ..Default::default()
        };
        let known = plugin_table("/m2/plugin.jar");
        let mut system = FakeSystem::returning(Vec::new());
        system.fail = true;
        let resolver = PluginResolver::new(&system, &known);
        let repo = LocalRepository::new("/m2");

        let err = prepare_classpath(&project, &repo, &resolver).unwrap_err();
        assert!(matches!(err, ClasspathError::Resolution { .. }));
        let err = project_classpath(&project, &repo, &resolver).unwrap_err();
        assert!(matches!(err, ClasspathError::Resolution { .. }));
        assert_eq!(system.calls.get(), 2);
    }

    #[test]
    fn test_project_classpath_puts_compile_elements_first() {
        let project = FakeProject {
            test: Some(strings(&["/p/test-classes", "/p/classes"])),
            compile: Some(strings(&["/p/classes", "/m2/dep.jar"])),
            ..Default::default()
        };
        let known = plugin_table("/m2/plugin.jar");
        let system = FakeSystem::returning(Vec::new());
        let resolver = PluginResolver::new(&system, &known);

        let cp = project_classpath(&project, &LocalRepository::new("/m2"), &resolver).unwrap();
        assert_eq!(
            cp.to_strings(),
            vec!["/p/classes", "/m2/dep.jar", "/p/test-classes", "/m2/plugin.jar"]
        );
    }
}
