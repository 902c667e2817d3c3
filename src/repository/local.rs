use std::path::{Path, PathBuf};

use crate::models::{Artifact, Coordinate};

/// A Maven-layout repository on disk, usually `~/.m2/repository`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.m2/repository`, if a home directory is known.
    pub fn default_location() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".m2").join("repository"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/group/as/dirs/<name>/<version>`
    pub fn artifact_dir(&self, coordinate: &Coordinate) -> PathBuf {
        let mut dir = self.root.clone();
        for part in coordinate.group.split('.') {
            dir.push(part);
        }
        dir.join(&coordinate.name).join(&coordinate.version)
    }

    /// Expected location of the artifact's packaged file.
    pub fn path_of(&self, coordinate: &Coordinate) -> PathBuf {
        let (classifier, extension) = file_suffix(&coordinate.kind);
        let file_name = match classifier {
            Some(c) => format!("{}-{}-{}.{}", coordinate.name, coordinate.version, c, extension),
            None => format!("{}-{}.{}", coordinate.name, coordinate.version, extension),
        };
        self.artifact_dir(coordinate).join(file_name)
    }

    pub fn pom_path(&self, coordinate: &Coordinate) -> PathBuf {
        self.artifact_dir(coordinate)
            .join(format!("{}-{}.pom", coordinate.name, coordinate.version))
    }

    /// The artifact's file, if it exists in this repository.
    pub fn find(&self, coordinate: &Coordinate) -> Option<PathBuf> {
        let path = self.path_of(coordinate);
        path.is_file().then_some(path)
    }

    /// `artifact` with its file set from this repository when present.
    pub fn locate(&self, artifact: &Artifact) -> Artifact {
        let mut located = artifact.clone();
        if located.file.is_none() {
            located.file = self.find(&artifact.coordinate);
        }
        located
    }
}

/// Classifier and file extension for an artifact type.
fn file_suffix(kind: &str) -> (Option<&'static str>, &str) {
    match kind {
        "test-jar" => (Some("tests"), "jar"),
        "ejb-client" => (Some("client"), "jar"),
        "maven-plugin" | "ejb" | "bundle" | "jar" => (None, "jar"),
        other => (None, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let repo = LocalRepository::new("/repo");
        let c = Coordinate::new("org.apache.commons", "commons-lang3", "3.12.0");
        assert_eq!(
            repo.path_of(&c),
            PathBuf::from("/repo/org/apache/commons/commons-lang3/3.12.0/commons-lang3-3.12.0.jar")
        );
        assert_eq!(
            repo.pom_path(&c),
            PathBuf::from("/repo/org/apache/commons/commons-lang3/3.12.0/commons-lang3-3.12.0.pom")
        );

        let tests = c.clone().with_kind("test-jar");
        assert!(repo
            .path_of(&tests)
            .ends_with("commons-lang3-3.12.0-tests.jar"));

        let plugin = c.with_kind("maven-plugin");
        assert!(repo.path_of(&plugin).ends_with("commons-lang3-3.12.0.jar"));
    }

    #[test]
    fn test_locate_only_existing_files() {
        let temp = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new(temp.path());
        let present = Coordinate::new("g", "present", "1");
        let absent = Coordinate::new("g", "absent", "1");

        let jar = repo.path_of(&present);
        std::fs::create_dir_all(jar.parent().unwrap()).unwrap();
        std::fs::write(&jar, b"").unwrap();

        assert_eq!(repo.locate(&Artifact::new(present)).file, Some(jar));
        assert_eq!(repo.locate(&Artifact::new(absent)).file, None);
    }
}
