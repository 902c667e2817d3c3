use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classpath::OrderedClasspath;
use crate::config::AnalysisConfig;
use crate::error::{ClasspathError, Result};

/// Maven-style artifact identity: `group:name:version[:type]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub group: String,
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Coordinate {
    pub fn new(group: &str, name: &str, version: &str) -> Self {
        Self {
            group: group.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            kind: "jar".to_string(),
        }
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    /// Parse `group:name:version` or `group:name:version:type`.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        match parts.as_slice() {
            [g, n, v] => Some(Self::new(g, n, v)),
            [g, n, v, t] => Some(Self::new(g, n, v).with_kind(t)),
            _ => None,
        }
    }

    /// Versionless `group:name` key, the shape used by the known-plugins table.
    pub fn key(&self) -> String {
        format!("{}:{}", self.group, self.name)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}:{}", self.group, self.name, self.kind, self.version)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Compile,
    Provided,
    Runtime,
    Test,
    System,
}

impl Scope {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "provided" => Scope::Provided,
            "runtime" => Scope::Runtime,
            "test" => Scope::Test,
            "system" => Scope::System,
            _ => Scope::Compile,
        }
    }

    /// Scopes that contribute to the compile classpath.
    pub fn is_compile(self) -> bool {
        matches!(self, Scope::Compile | Scope::Provided | Scope::System)
    }

    fn rank(self) -> u8 {
        match self {
            Scope::Test => 0,
            Scope::Provided => 1,
            Scope::Runtime => 2,
            Scope::Compile => 3,
            Scope::System => 4,
        }
    }

    /// The scope an artifact reached through both `self` and `other` ends up in.
    pub fn widest(self, other: Scope) -> Scope {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Compile => write!(f, "compile"),
            Scope::Provided => write!(f, "provided"),
            Scope::Runtime => write!(f, "runtime"),
            Scope::Test => write!(f, "test"),
            Scope::System => write!(f, "system"),
        }
    }
}

/// A packaged unit of code, optionally resolved to a local file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub coordinate: Coordinate,
    pub scope: Scope,
    pub optional: bool,
    pub file: Option<PathBuf>,
}

impl Artifact {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            scope: Scope::Compile,
            optional: false,
            file: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn group(&self) -> &str {
        &self.coordinate.group
    }

    /// Whether the artifact type's handler adds it to a classpath.
    pub fn is_added_to_classpath(&self) -> bool {
        matches!(
            self.coordinate.kind.as_str(),
            "jar" | "test-jar" | "maven-plugin" | "ejb" | "ejb-client" | "bundle"
        )
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.coordinate, self.scope)
    }
}

/// Artifacts de-duplicated by coordinate, kept in resolution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if an artifact with the same coordinate is already present.
    pub fn insert(&mut self, artifact: Artifact) -> bool {
        if self.contains(&artifact.coordinate) {
            return false;
        }
        self.artifacts.push(artifact);
        true
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.artifacts.iter().any(|a| &a.coordinate == coordinate)
    }

    /// The artifact registered under the versionless `group:name` key.
    pub fn get_mut_by_key(&mut self, key: &str) -> Option<&mut Artifact> {
        self.artifacts.iter_mut().find(|a| a.coordinate.key() == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Artifact> {
        self.artifacts.iter()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl FromIterator<Artifact> for ArtifactSet {
    fn from_iter<I: IntoIterator<Item = Artifact>>(iter: I) -> Self {
        let mut set = ArtifactSet::new();
        for a in iter {
            set.insert(a);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ArtifactSet {
    type Item = &'a Artifact;
    type IntoIter = std::slice::Iter<'a, Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.artifacts.iter()
    }
}

/// A single filesystem location on a classpath.
///
/// The original spelling is kept for output; equality goes through
/// [`ClasspathEntry::normalized`], which makes the path absolute and folds
/// `.` and `..` components without touching the filesystem.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ClasspathEntry(String);

impl ClasspathEntry {
    /// Accepts any non-blank path without NUL bytes.
    pub fn parse(element: &str) -> Result<Self> {
        if element.trim().is_empty() {
            return Err(ClasspathError::PathConversion {
                element: element.to_string(),
                reason: "empty path".to_string(),
            });
        }
        if element.contains('\0') {
            return Err(ClasspathError::PathConversion {
                element: element.escape_default().to_string(),
                reason: "path contains a NUL byte".to_string(),
            });
        }
        Ok(Self(element.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        match path.to_str() {
            Some(s) => Self::parse(s),
            None => Err(ClasspathError::PathConversion {
                element: path.display().to_string(),
                reason: "path is not valid UTF-8".to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn normalized(&self) -> PathBuf {
        normalize_path(Path::new(&self.0))
    }
}

impl PartialEq for ClasspathEntry {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for ClasspathEntry {}

impl std::hash::Hash for ClasspathEntry {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl std::fmt::Display for ClasspathEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lexically absolutize `path` against the current directory.
pub fn normalize_path(path: &Path) -> PathBuf {
    use std::path::Component;

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Everything the analysis engine needs for one source root.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub root: PathBuf,
    pub classpath: OrderedClasspath,
    pub settings: AnalysisConfig,
}

/// Outcome of one run over a project's source roots.
#[derive(Debug, Clone, Serialize)]
pub struct ClasspathReport {
    pub project: String,
    pub requests: Vec<AnalysisRequest>,
    /// Source roots that do not exist on disk.
    pub skipped: Vec<PathBuf>,
    /// Source roots whose classpath could not be built, with the reason.
    pub failed: Vec<(PathBuf, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<Vec<ClasspathEntry>>,
}

impl ClasspathReport {
    pub fn new(project: String) -> Self {
        Self {
            project,
            requests: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            coverage: None,
        }
    }
}
