use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::classpath::plugin::{PLUGIN_KEY, PLUGIN_VERSION};
use crate::models::Coordinate;

/// Root configuration structure, deserialized from `.testability/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings forwarded to the analysis engine.
    pub analysis: AnalysisConfig,
    pub repository: RepositoryConfig,
    pub plugins: PluginsConfig,
}

/// Analysis engine parameters, with the engine's own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Root package to inspect.
    pub filter: String,
    /// Directory for the intermediate XML report; defaults to the project build directory.
    pub target_directory: Option<PathBuf>,
    /// Directory for the final HTML report; defaults to `<build directory>/site`.
    pub output_directory: Option<PathBuf>,
    /// Report file name, without extension.
    pub result_file: String,
    /// Where the engine writes execution errors.
    pub error_file: Option<PathBuf>,
    /// Weight of cyclomatic complexity cost.
    pub cyclomatic: u32,
    /// Weight of global state cost.
    pub global: u32,
    /// Extra multiplier for costs incurred in constructors.
    pub constructor: u32,
    /// Maximum recursion depth of printed results.
    pub print_depth: u32,
    /// Minimum cost for a class to be printed.
    pub min_cost: u32,
    pub max_excellent_cost: u32,
    pub max_acceptable_cost: u32,
    /// Number of worst classes to print.
    pub worst_offender_count: u32,
    /// Colon-delimited packages to whitelist.
    pub white_list: String,
    pub format: OutputFormat,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            filter: ".".to_string(),
            target_directory: None,
            output_directory: None,
            result_file: "testability".to_string(),
            error_file: None,
            cyclomatic: 1,
            global: 10,
            constructor: 1,
            print_depth: 2,
            min_cost: 1,
            max_excellent_cost: 50,
            max_acceptable_cost: 100,
            worst_offender_count: 20,
            white_list: " ".to_string(),
            format: OutputFormat::Xml,
        }
    }
}

impl AnalysisConfig {
    /// Fill unset directories from the project's build directory.
    pub fn with_build_directory(mut self, build_directory: &Path) -> Self {
        if self.target_directory.is_none() {
            self.target_directory = Some(build_directory.to_path_buf());
        }
        if self.output_directory.is_none() {
            self.output_directory = Some(build_directory.join("site"));
        }
        self
    }
}

/// Report format produced by the analysis engine in addition to HTML.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Xml,
    Summary,
    Source,
    Detail,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Local repository root; defaults to `~/.m2/repository`.
    pub local: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// Coordinates (`group:name:version[:type]`) of the plugins known to the host.
    ///
    /// Defaults to the testability plugin at [`PLUGIN_VERSION`]; point it at
    /// the version actually installed in the local repository.
    pub artifacts: Vec<String>,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            artifacts: vec![format!("{}:{}:maven-plugin", PLUGIN_KEY, PLUGIN_VERSION)],
        }
    }
}

impl PluginsConfig {
    /// Parse every configured coordinate, rejecting malformed entries.
    pub fn coordinates(&self) -> Result<Vec<Coordinate>> {
        let re = Regex::new(r"^[^:\s]+:[^:\s]+:[^:\s]+(:[^:\s]+)?$")?;
        let mut coordinates = Vec::with_capacity(self.artifacts.len());
        for raw in &self.artifacts {
            if !re.is_match(raw.trim()) {
                bail!("invalid plugin coordinate {:?}: expected group:name:version[:type]", raw);
            }
            match Coordinate::parse(raw) {
                Some(c) => coordinates.push(c),
                None => bail!("invalid plugin coordinate {:?}", raw),
            }
        }
        Ok(coordinates)
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.testability/config.toml`
/// 3. `~/.config/testability/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        let content = std::fs::read_to_string(path)?;
        return Ok(toml::from_str(&content)?);
    }

    let project_config = project_path.join(".testability").join("config.toml");
    if project_config.exists() {
        let content = std::fs::read_to_string(&project_config)?;
        return Ok(toml::from_str(&content)?);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("testability").join("config.toml");
        if home_config.exists() {
            let content = std::fs::read_to_string(&home_config)?;
            return Ok(toml::from_str(&content)?);
        }
    }

    Ok(Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.analysis.filter, ".");
        assert_eq!(cfg.analysis.global, 10);
        assert_eq!(cfg.analysis.max_acceptable_cost, 100);
        assert_eq!(cfg.analysis.format, OutputFormat::Xml);

        let plugins = cfg.plugins.coordinates().unwrap();
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].key(), PLUGIN_KEY);
        assert_eq!(plugins[0].version, PLUGIN_VERSION);
        assert_eq!(plugins[0].kind, "maven-plugin");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[analysis]
cyclomatic = 3
format = "detail"

[repository]
local = "/opt/m2"
"#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.cyclomatic, 3);
        assert_eq!(cfg.analysis.global, 10);
        assert_eq!(cfg.analysis.format, OutputFormat::Detail);
        assert_eq!(cfg.repository.local, Some(PathBuf::from("/opt/m2")));
        assert_eq!(cfg.plugins.artifacts.len(), 1);
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[analysis]\nformat = \"html\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_plugin_coordinate() {
        let cfg = PluginsConfig {
            artifacts: vec!["com.example:plugin".to_string()],
        };
        assert!(cfg.coordinates().is_err());
    }

    #[test]
    fn test_directories_default_to_build_directory() {
        let analysis = AnalysisConfig::default().with_build_directory(Path::new("/p/target"));
        assert_eq!(analysis.target_directory, Some(PathBuf::from("/p/target")));
        assert_eq!(analysis.output_directory, Some(PathBuf::from("/p/target/site")));

        let explicit = AnalysisConfig {
            output_directory: Some(PathBuf::from("/reports")),
            ..Default::default()
        }
        .with_build_directory(Path::new("/p/target"));
        assert_eq!(explicit.output_directory, Some(PathBuf::from("/reports")));
    }

    #[test]
    fn test_load_config_from_project() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join(".testability");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.toml"),
            "[plugins]\nartifacts = [\"com.github.jazzmuesli:testability-mvn-plugin:2.0\"]\n",
        )
        .unwrap();

        let cfg = load_config(temp.path(), None).unwrap();
        assert_eq!(cfg.plugins.coordinates().unwrap()[0].version, "2.0");
    }
}
