use std::collections::HashMap;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{ClasspathError, Result};
use crate::models::{Coordinate, Scope};

/// The subset of a `pom.xml` needed to compute classpaths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<ParentRef>,
    pub properties: HashMap<String, String>,
    pub dependencies: Vec<PomDependency>,
    pub managed: Vec<PomDependency>,
    pub build: PomBuild,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub relative_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub kind: Option<String>,
    pub classifier: Option<String>,
    pub scope: Option<String>,
    pub optional: bool,
    pub system_path: Option<String>,
    /// `group:artifact` pairs; either side may be `*`.
    pub exclusions: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PomBuild {
    pub directory: Option<String>,
    pub output_directory: Option<String>,
    pub test_output_directory: Option<String>,
    pub source_directory: Option<String>,
    pub test_source_directory: Option<String>,
}

/// Whether `group:artifact` matches any exclusion pattern.
pub fn is_excluded(exclusions: &[(String, String)], group: &str, artifact: &str) -> bool {
    exclusions
        .iter()
        .any(|(g, a)| (g == "*" || g == group) && (a == "*" || a == artifact))
}

impl PomDependency {
    pub fn key(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }

    pub fn scope(&self) -> Scope {
        self.scope.as_deref().map(Scope::parse).unwrap_or_default()
    }

    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or("jar")
    }

    /// Coordinate for this dependency, if its version is known.
    pub fn coordinate(&self) -> Option<Coordinate> {
        let version = self.version.as_deref()?;
        let kind = match (self.kind(), self.classifier.as_deref()) {
            ("jar", Some("tests")) => "test-jar",
            (kind, _) => kind,
        };
        Some(Coordinate::new(&self.group_id, &self.artifact_id, version).with_kind(kind))
    }
}

impl Pom {
    pub fn parse_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_str(&content).map_err(|reason| ClasspathError::Pom {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse POM text using the quick-xml event API.
    pub fn parse_str(xml: &str) -> std::result::Result<Self, String> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut pom = Pom::default();
        let mut buf = Vec::new();
        let mut path: Vec<String> = Vec::new();
        let mut dependency = PomDependency::default();
        let mut exclusion = (String::new(), String::new());

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let name = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                    match name.as_str() {
                        "dependency" => dependency = PomDependency::default(),
                        "exclusion" => exclusion = (String::new(), String::new()),
                        "parent" if path.len() == 1 => pom.parent = Some(ParentRef::default()),
                        _ => {}
                    }
                    path.push(name);
                }
                Ok(Event::End(_)) => {
                    let segments: Vec<&str> = path.iter().map(String::as_str).collect();
                    match segments.as_slice() {
                        ["project", "dependencies", "dependency"] => {
                            pom.dependencies.push(std::mem::take(&mut dependency));
                        }
                        ["project", "dependencyManagement", "dependencies", "dependency"] => {
                            pom.managed.push(std::mem::take(&mut dependency));
                        }
                        [.., "dependency", "exclusions", "exclusion"] => {
                            dependency.exclusions.push(std::mem::take(&mut exclusion));
                        }
                        _ => {}
                    }
                    path.pop();
                }
                Ok(Event::Text(ref e)) => {
                    let text = e.unescape().map_err(|e| e.to_string())?.trim().to_string();
                    pom.accept_text(&path, text, &mut dependency, &mut exclusion);
                }
                // `<relativePath/>` and friends carry an empty value.
                Ok(Event::Empty(ref e)) => {
                    let name = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                    path.push(name);
                    pom.accept_text(&path, String::new(), &mut dependency, &mut exclusion);
                    path.pop();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(format!(
                        "error at position {}: {}",
                        reader.buffer_position(),
                        e
                    ))
                }
                _ => {}
            }
            buf.clear();
        }

        if pom.artifact_id.is_empty() {
            return Err("missing <artifactId>".to_string());
        }
        Ok(pom)
    }

    fn accept_text(
        &mut self,
        path: &[String],
        text: String,
        dependency: &mut PomDependency,
        exclusion: &mut (String, String),
    ) {
        let segments: Vec<&str> = path.iter().map(String::as_str).collect();
        match segments.as_slice() {
            ["project", "groupId"] => self.group_id = Some(text),
            ["project", "artifactId"] => self.artifact_id = text,
            ["project", "version"] => self.version = Some(text),
            ["project", "packaging"] => self.packaging = Some(text),
            ["project", "parent", field] => {
                if let Some(parent) = self.parent.as_mut() {
                    match *field {
                        "groupId" => parent.group_id = text,
                        "artifactId" => parent.artifact_id = text,
                        "version" => parent.version = text,
                        "relativePath" => parent.relative_path = Some(text),
                        _ => {}
                    }
                }
            }
            ["project", "properties", key] => {
                self.properties.insert(key.to_string(), text);
            }
            ["project", "build", field] => match *field {
                "directory" => self.build.directory = Some(text),
                "outputDirectory" => self.build.output_directory = Some(text),
                "testOutputDirectory" => self.build.test_output_directory = Some(text),
                "sourceDirectory" => self.build.source_directory = Some(text),
                "testSourceDirectory" => self.build.test_source_directory = Some(text),
                _ => {}
            },
            [.., "dependency", "exclusions", "exclusion", field] => match *field {
                "groupId" => exclusion.0 = text,
                "artifactId" => exclusion.1 = text,
                _ => {}
            },
            [.., "dependency", field] => match *field {
                "groupId" => dependency.group_id = text,
                "artifactId" => dependency.artifact_id = text,
                "version" => dependency.version = Some(text),
                "type" => dependency.kind = Some(text),
                "classifier" => dependency.classifier = Some(text),
                "scope" => dependency.scope = Some(text),
                "optional" => dependency.optional = text == "true",
                "systemPath" => dependency.system_path = Some(text),
                _ => {}
            },
            _ => {}
        }
    }

    /// Group id, inherited from `<parent>` when not declared.
    pub fn effective_group(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// Version, inherited from `<parent>` when not declared.
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.version.as_str()))
    }

    /// Where the parent POM lives on disk relative to `pom_file`.
    pub fn parent_file(&self, pom_file: &Path) -> Option<PathBuf> {
        let parent = self.parent.as_ref()?;
        let relative = parent.relative_path.as_deref().unwrap_or("../pom.xml");
        if relative.is_empty() {
            return None;
        }
        let candidate = pom_file.parent()?.join(relative);
        if candidate.is_dir() {
            Some(candidate.join("pom.xml"))
        } else {
            Some(candidate)
        }
    }

    /// Inherit properties, managed versions and dependencies from `parent`.
    ///
    /// Values declared here win over inherited ones.
    pub fn inherit(&mut self, parent: &Pom) {
        for (k, v) in &parent.properties {
            self.properties.entry(k.clone()).or_insert_with(|| v.clone());
        }
        for managed in &parent.managed {
            if !self.managed.iter().any(|m| m.key() == managed.key()) {
                self.managed.push(managed.clone());
            }
        }
        for dep in &parent.dependencies {
            if !self.dependencies.iter().any(|d| d.key() == dep.key()) {
                self.dependencies.push(dep.clone());
            }
        }
        if self.build.directory.is_none() {
            self.build.directory = parent.build.directory.clone();
        }
    }

    /// Replace `${...}` placeholders from properties and project fields.
    ///
    /// Unknown placeholders are left untouched.
    pub fn interpolate(&self, value: &str) -> String {
        let mut current = value.to_string();
        // Properties may refer to other properties; bound the passes to stop on cycles.
        for _ in 0..8 {
            if !current.contains("${") {
                break;
            }
            let next = self.expand_once(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn expand_once(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let key = &after[..end];
                    match self.lookup(key) {
                        Some(v) => out.push_str(&v),
                        None => out.push_str(&rest[start..start + 2 + end + 1]),
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let parent = self.parent.as_ref();
        match key {
            "project.groupId" | "pom.groupId" | "groupId" => {
                self.effective_group().map(str::to_string)
            }
            "project.artifactId" | "pom.artifactId" | "artifactId" => Some(self.artifact_id.clone()),
            "project.version" | "pom.version" | "version" => {
                self.effective_version().map(str::to_string)
            }
            "project.parent.groupId" | "parent.groupId" => parent.map(|p| p.group_id.clone()),
            "project.parent.version" | "parent.version" => parent.map(|p| p.version.clone()),
            other => self.properties.get(other).cloned(),
        }
    }

    /// Declared dependencies with placeholders expanded and missing
    /// versions/scopes filled in from `<dependencyManagement>`.
    pub fn effective_dependencies(&self) -> Vec<PomDependency> {
        self.dependencies
            .iter()
            .map(|dep| {
                let mut dep = self.interpolate_dependency(dep);
                if let Some(managed) = self.managed_for(&dep) {
                    if dep.version.is_none() {
                        dep.version = managed.version;
                    }
                    if dep.scope.is_none() {
                        dep.scope = managed.scope;
                    }
                    for exclusion in managed.exclusions {
                        if !dep.exclusions.contains(&exclusion) {
                            dep.exclusions.push(exclusion);
                        }
                    }
                }
                dep
            })
            .collect()
    }

    fn managed_for(&self, dep: &PomDependency) -> Option<PomDependency> {
        self.managed
            .iter()
            .map(|m| self.interpolate_dependency(m))
            .find(|m| m.key() == dep.key() && m.kind() == dep.kind())
    }

    fn interpolate_dependency(&self, dep: &PomDependency) -> PomDependency {
        PomDependency {
            group_id: self.interpolate(&dep.group_id),
            artifact_id: self.interpolate(&dep.artifact_id),
            version: dep.version.as_deref().map(|v| self.interpolate(v)),
            kind: dep.kind.as_deref().map(|v| self.interpolate(v)),
            classifier: dep.classifier.as_deref().map(|v| self.interpolate(v)),
            scope: dep.scope.as_deref().map(|v| self.interpolate(v)),
            optional: dep.optional,
            system_path: dep.system_path.as_deref().map(|v| self.interpolate(v)),
            exclusions: dep.exclusions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POM: &str = r#"<?xml version="1.0"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>com.example</groupId>
    <artifactId>parent</artifactId>
    <version>2.1</version>
  </parent>
  <artifactId>app</artifactId>
  <properties>
    <guava.version>31.1-jre</guava.version>
    <junit.version>4.13.2</junit.version>
  </properties>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>junit</groupId>
        <artifactId>junit</artifactId>
        <version>${junit.version}</version>
        <scope>test</scope>
      </dependency>
    </dependencies>
  </dependencyManagement>
  <dependencies>
    <dependency>
      <groupId>com.google.guava</groupId>
      <artifactId>guava</artifactId>
      <version>${guava.version}</version>
      <exclusions>
        <exclusion>
          <groupId>com.google.code.findbugs</groupId>
          <artifactId>*</artifactId>
        </exclusion>
      </exclusions>
    </dependency>
    <dependency>
      <groupId>${project.groupId}</groupId>
      <artifactId>core</artifactId>
      <version>${project.version}</version>
    </dependency>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
    </dependency>
  </dependencies>
  <build>
    <outputDirectory>out/classes</outputDirectory>
  </build>
</project>"#;

    #[test]
    fn test_parse_pom() {
        let pom = Pom::parse_str(POM).unwrap();
        assert_eq!(pom.artifact_id, "app");
        assert_eq!(pom.effective_group(), Some("com.example"));
        assert_eq!(pom.effective_version(), Some("2.1"));
        assert_eq!(pom.dependencies.len(), 3);
        assert_eq!(pom.managed.len(), 1);
        assert_eq!(pom.build.output_directory.as_deref(), Some("out/classes"));
        assert_eq!(
            pom.dependencies[0].exclusions,
            vec![("com.google.code.findbugs".to_string(), "*".to_string())]
        );
    }

    #[test]
    fn test_effective_dependencies() {
        let pom = Pom::parse_str(POM).unwrap();
        let deps = pom.effective_dependencies();

        assert_eq!(deps[0].version.as_deref(), Some("31.1-jre"));
        assert!(is_excluded(&deps[0].exclusions, "com.google.code.findbugs", "jsr305"));
        assert!(!is_excluded(&deps[0].exclusions, "com.google.guava", "failureaccess"));
        assert_eq!(deps[1].group_id, "com.example");
        assert_eq!(deps[1].version.as_deref(), Some("2.1"));
        assert_eq!(deps[2].version.as_deref(), Some("4.13.2"));
        assert_eq!(deps[2].scope(), Scope::Test);
    }

    #[test]
    fn test_inherit_from_parent() {
        let mut child = Pom::parse_str(
            r#"<project><artifactId>child</artifactId>
               <dependencies><dependency><groupId>org.slf4j</groupId><artifactId>slf4j-api</artifactId></dependency></dependencies>
               </project>"#,
        )
        .unwrap();
        let parent = Pom::parse_str(
            r#"<project><groupId>g</groupId><artifactId>parent</artifactId><version>1</version>
               <properties><slf4j.version>1.7.36</slf4j.version></properties>
               <dependencyManagement><dependencies><dependency>
                 <groupId>org.slf4j</groupId><artifactId>slf4j-api</artifactId><version>${slf4j.version}</version>
               </dependency></dependencies></dependencyManagement>
               </project>"#,
        )
        .unwrap();

        child.inherit(&parent);
        let deps = child.effective_dependencies();
        assert_eq!(deps[0].version.as_deref(), Some("1.7.36"));
    }

    #[test]
    fn test_unknown_placeholder_left_alone() {
        let pom = Pom::parse_str("<project><artifactId>a</artifactId></project>").unwrap();
        assert_eq!(pom.interpolate("${missing}/x"), "${missing}/x");
        assert_eq!(pom.interpolate("${project.artifactId}-${"), "a-${");
    }

    #[test]
    fn test_nested_properties() {
        let pom = Pom::parse_str(
            r#"<project><artifactId>a</artifactId><properties>
               <base>1.2</base><full>${base}.3</full><loop>${loop}</loop>
               </properties></project>"#,
        )
        .unwrap();
        assert_eq!(pom.interpolate("v${full}"), "v1.2.3");
        assert_eq!(pom.interpolate("${loop}"), "${loop}");
    }

    #[test]
    fn test_empty_relative_path_disables_local_lookup() {
        let pom = Pom::parse_str(
            "<project><parent><groupId>g</groupId><artifactId>p</artifactId><version>1</version>\
             <relativePath/></parent><artifactId>child</artifactId></project>",
        )
        .unwrap();
        assert_eq!(pom.parent.as_ref().unwrap().relative_path.as_deref(), Some(""));
        assert_eq!(pom.parent_file(Path::new("/work/child/pom.xml")), None);

        let defaulted = Pom::parse_str(
            "<project><parent><groupId>g</groupId><artifactId>p</artifactId><version>1</version></parent>\
             <artifactId>child</artifactId></project>",
        )
        .unwrap();
        assert_eq!(
            defaulted.parent_file(Path::new("/work/child/pom.xml")),
            Some(PathBuf::from("/work/child/../pom.xml"))
        );
    }

    #[test]
    fn test_malformed_pom() {
        assert!(Pom::parse_str("<project><artifactId>a</artifactId></build></project>").is_err());
        assert!(Pom::parse_str("<project></project>").is_err());
    }

    #[test]
    fn test_tests_classifier_maps_to_test_jar() {
        let dep = PomDependency {
            group_id: "g".into(),
            artifact_id: "a".into(),
            version: Some("1".into()),
            classifier: Some("tests".into()),
            ..Default::default()
        };
        assert_eq!(dep.coordinate().unwrap().kind, "test-jar");
    }
}
