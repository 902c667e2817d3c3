use std::path::{Path, PathBuf};

/// Build descriptor found at a project path.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildFile {
    Maven(PathBuf),
    Gradle(PathBuf),
}

/// Locate the build descriptor for `path`, which may be a project
/// directory or a POM file itself.
pub fn detect_build_file(path: &Path) -> Option<BuildFile> {
    if path.is_file() {
        return match path.extension().and_then(|e| e.to_str()) {
            Some("xml" | "pom") => Some(BuildFile::Maven(path.to_path_buf())),
            Some("gradle" | "kts") => Some(BuildFile::Gradle(path.to_path_buf())),
            _ => None,
        };
    }

    let pom = path.join("pom.xml");
    if pom.exists() {
        return Some(BuildFile::Maven(pom));
    }

    for gradle in ["build.gradle", "build.gradle.kts"] {
        let candidate = path.join(gradle);
        if candidate.exists() {
            return Some(BuildFile::Gradle(candidate));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_pom_in_directory() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("pom.xml"), "<project/>").unwrap();
        std::fs::write(temp.path().join("build.gradle"), "").unwrap();
        assert_eq!(
            detect_build_file(temp.path()),
            Some(BuildFile::Maven(temp.path().join("pom.xml")))
        );
    }

    #[test]
    fn test_accepts_pom_file_directly() {
        let temp = tempfile::tempdir().unwrap();
        let pom = temp.path().join("module.xml");
        std::fs::write(&pom, "<project/>").unwrap();
        assert_eq!(detect_build_file(&pom), Some(BuildFile::Maven(pom)));
    }

    #[test]
    fn test_gradle_and_nothing() {
        let temp = tempfile::tempdir().unwrap();
        assert_eq!(detect_build_file(temp.path()), None);
        std::fs::write(temp.path().join("build.gradle.kts"), "").unwrap();
        assert!(matches!(detect_build_file(temp.path()), Some(BuildFile::Gradle(_))));
    }
}
