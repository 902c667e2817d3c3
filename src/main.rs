//! `testability-classpath` — assemble the classpath a testability analysis of
//! a Maven project runs against.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and install logging ([`logging`]).
//! 2. Locate the build file ([`detector::detect_build_file`]).
//! 3. Load config ([`config::load_config`]) and the project ([`project::maven`]).
//! 4. Resolve the project's dependencies against the local repository
//!    ([`repository`]) unless `--no-resolve` is given.
//! 5. For every compile source root, then every test source root, build the
//!    effective classpath ([`classpath`]).
//! 6. Render the requested report ([`report`]).
//! 7. Exit `0`, or `1` when no existing source root got a classpath.

mod classpath;
mod cli;
mod config;
mod detector;
mod error;
mod logging;
mod models;
mod project;
mod repository;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use classpath::aggregate::project_classpath;
use classpath::coverage::coverage_classpath;
use classpath::plugin::{known_plugins, PluginResolver};
use cli::{Cli, ReportFormat};
use config::{load_config, AnalysisConfig};
use detector::{detect_build_file, BuildFile};
use models::{AnalysisRequest, ClasspathReport};
use project::maven::MavenProject;
use project::ProjectModel;
use repository::resolver::PomResolver;
use repository::LocalRepository;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    // Resolve project path
    let path = cli
        .path
        .canonicalize()
        .unwrap_or_else(|_| cli.path.clone());

    let pom = match detect_build_file(&path) {
        Some(BuildFile::Maven(pom)) => pom,
        Some(BuildFile::Gradle(file)) => {
            eprintln!("Gradle builds are not supported: {}", file.display());
            std::process::exit(1);
        }
        None => {
            eprintln!("No pom.xml found in {}", path.display());
            std::process::exit(1);
        }
    };
    let project_dir = pom.parent().unwrap_or(&path).to_path_buf();

    let config = load_config(&project_dir, cli.config.as_deref())?;

    let local_repository = cli
        .local_repo
        .clone()
        .or_else(|| config.repository.local.clone())
        .or_else(LocalRepository::default_location)
        .map(LocalRepository::new)
        .context("no local repository: pass --local-repo or set [repository] local")?;
    info!("local repository: {}", local_repository.root().display());

    let mut project = MavenProject::load(&pom, &local_repository)
        .with_context(|| format!("failed to load {}", pom.display()))?;

    let system = PomResolver::new();
    if cli.no_resolve {
        info!("dependencies of {} left unresolved", project.id());
    } else if let Err(e) = project.resolve_dependencies(&local_repository, &system) {
        error!("dependency resolution failed for {}: {}", project.id(), e);
    }
    if !project.is_resolved() {
        warn!("project classpath elements are unavailable; only the plugin classpath will be used");
    }

    let known = known_plugins(&config.plugins.coordinates()?, &local_repository);
    let resolver = PluginResolver::new(&system, &known);

    let mut settings = config
        .analysis
        .clone()
        .with_build_directory(project.build_directory());
    if let Some(format) = cli.format {
        settings.format = format.into();
    }

    let mut report = ClasspathReport::new(project.id());
    let roots: Vec<String> = project
        .compile_source_roots()
        .into_iter()
        .chain(project.test_compile_source_roots())
        .collect();
    for root in &roots {
        process_source_root(&project, root, &local_repository, &resolver, &settings, &mut report);
    }

    if cli.coverage {
        report.coverage = Some(coverage_classpath(&project));
    }

    match cli.report {
        ReportFormat::Terminal => {
            report::terminal::render(&report, &project_dir, cli.verbose, cli.quiet)?;
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        ReportFormat::Plain => {
            for request in &report.requests {
                println!("{}", request.classpath.to_path_string());
            }
        }
    }

    // Exit code: 1 if every existing source root failed
    if report.requests.is_empty() && !report.failed.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}

/// Build the analysis request for one source root.
///
/// Failures are recorded in `report` and logged; they never stop the loop
/// over the remaining roots.
fn process_source_root(
    project: &dyn ProjectModel,
    root: &str,
    local_repository: &LocalRepository,
    resolver: &PluginResolver<'_>,
    settings: &AnalysisConfig,
    report: &mut ClasspathReport,
) {
    info!("Processing {}", root);
    let dir = PathBuf::from(root);
    if !dir.exists() {
        report.skipped.push(dir);
        return;
    }

    match project_classpath(project, local_repository, resolver) {
        Ok(classpath) => report.requests.push(AnalysisRequest {
            root: dir,
            classpath,
            settings: settings.clone(),
        }),
        Err(e) => {
            error!("{}: {}", root, e);
            report.failed.push((dir, e.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::plugin::tests::{plugin_table, FakeSystem};
    use crate::classpath::plugin::KnownArtifacts;
    use crate::project::fake::FakeProject;

    #[test]
    fn test_failures_do_not_stop_other_roots() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().to_string_lossy().into_owned();
        let project = FakeProject {
            compile: Some(vec!["/p/classes".into()]),
            ..Default::default()
        };
        let system = FakeSystem::returning(Vec::new());
        let settings = AnalysisConfig::default();
        let repo = LocalRepository::new("/m2");

        let mut report = ClasspathReport::new(project.id());
        let empty = KnownArtifacts::new();
        process_source_root(
            &project,
            &root,
            &repo,
            &PluginResolver::new(&system, &empty),
            &settings,
            &mut report,
        );
        process_source_root(
            &project,
            "/definitely/not/here",
            &repo,
            &PluginResolver::new(&system, &empty),
            &settings,
            &mut report,
        );
        let known = plugin_table("/m2/plugin.jar");
        process_source_root(
            &project,
            &root,
            &repo,
            &PluginResolver::new(&system, &known),
            &settings,
            &mut report,
        );

        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].1.contains("testability-mvn-plugin"));
        assert_eq!(report.skipped, vec![PathBuf::from("/definitely/not/here")]);
        assert_eq!(report.requests.len(), 1);
        assert_eq!(
            report.requests[0].classpath.to_strings(),
            vec!["/p/classes", "/m2/plugin.jar"]
        );
    }
}
