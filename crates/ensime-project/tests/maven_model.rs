use std::fs;
use std::path::Path;

use ensime_project::{load_build_model, ProjectError};
use pretty_assertions::assert_eq;

fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, contents).expect("write file");
}

const ROOT_POM: &str = r#"
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>com.example</groupId>
  <artifactId>reactor</artifactId>
  <version>1.2.3</version>
  <packaging>pom</packaging>
  <name>Example Reactor</name>

  <properties>
    <scala.version>2.11.12</scala.version>
  </properties>

  <modules>
    <module>core</module>
    <module>app</module>
  </modules>

  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>org.scala-lang</groupId>
        <artifactId>scala-library</artifactId>
        <version>${scala.version}</version>
      </dependency>
    </dependencies>
  </dependencyManagement>

  <build>
    <pluginManagement>
      <plugins>
        <plugin>
          <groupId>net.alchim31.maven</groupId>
          <artifactId>scala-maven-plugin</artifactId>
          <configuration>
            <args><arg>-Xfatal-warnings</arg></args>
          </configuration>
        </plugin>
      </plugins>
    </pluginManagement>
  </build>
</project>
"#;

const CORE_POM: &str = r#"
<project>
  <parent>
    <groupId>com.example</groupId>
    <artifactId>reactor</artifactId>
    <version>1.2.3</version>
  </parent>
  <artifactId>core</artifactId>
  <dependencies>
    <dependency>
      <groupId>org.scala-lang</groupId>
      <artifactId>scala-library</artifactId>
    </dependency>
  </dependencies>
  <build>
    <outputDirectory>${project.build.directory}/main-classes</outputDirectory>
  </build>
</project>
"#;

const APP_POM: &str = r#"
<project>
  <parent>
    <groupId>com.example</groupId>
    <artifactId>reactor</artifactId>
    <version>1.2.3</version>
  </parent>
  <artifactId>app</artifactId>
  <dependencies>
    <dependency>
      <groupId>com.example</groupId>
      <artifactId>core</artifactId>
      <version>${project.version}</version>
    </dependency>
    <dependency>
      <groupId>com.example</groupId>
      <artifactId>core</artifactId>
      <version>${project.version}</version>
      <type>test-jar</type>
      <scope>test</scope>
    </dependency>
  </dependencies>
</project>
"#;

#[test]
fn loads_reactor_modules_and_skips_aggregator() {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = temp.path();
    write_file(&root.join("pom.xml"), ROOT_POM);
    write_file(&root.join("core/pom.xml"), CORE_POM);
    write_file(&root.join("app/pom.xml"), APP_POM);

    let model = load_build_model(root).expect("load model");
    let root = fs::canonicalize(root).expect("canonical root");

    assert_eq!(model.root.artifact_id, "reactor");
    assert_eq!(model.root.display_name(), "Example Reactor");
    assert!(model.root.is_aggregator());

    let names: Vec<_> = model.modules.iter().map(|m| m.artifact_id.as_str()).collect();
    assert_eq!(names, vec!["app", "core"]);

    let internal: Vec<_> = model.internal_artifacts().collect();
    assert!(internal.contains(&("com.example", "core")));

    let core = model
        .modules
        .iter()
        .find(|m| m.artifact_id == "core")
        .expect("core module");
    assert_eq!(core.group_id, "com.example");
    assert_eq!(core.version.as_deref(), Some("1.2.3"));
    assert_eq!(core.dependencies[0].version.as_deref(), Some("2.11.12"));
    assert_eq!(
        core.build.output_directory,
        root.join("core").join("target").join("main-classes")
    );
    assert_eq!(
        core.build.test_output_directory,
        root.join("core/target/test-classes")
    );
    assert_eq!(
        core.compile_source_roots(),
        vec![root.join("core/src/main/java")]
    );
    assert_eq!(
        core.plugins.scalac_args(),
        Some(&["-Xfatal-warnings".to_string()][..])
    );

    let app = model
        .modules
        .iter()
        .find(|m| m.artifact_id == "app")
        .expect("app module");
    assert_eq!(app.dependencies.len(), 2);
    assert_eq!(app.dependencies[0].version.as_deref(), Some("1.2.3"));
    assert_eq!(app.dependencies[1].type_(), "test-jar");
    assert_eq!(app.dependencies[1].scope(), "test");
}

#[test]
fn modules_inherit_parent_dependencies() {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = temp.path();
    write_file(
        &root.join("pom.xml"),
        r#"<project>
  <groupId>com.example</groupId>
  <artifactId>parent</artifactId>
  <version>1.0</version>
  <packaging>pom</packaging>
  <properties><scala.version>2.12.8</scala.version></properties>
  <modules><module>core</module><module>util</module></modules>
  <dependencies>
    <dependency>
      <groupId>org.scala-lang</groupId>
      <artifactId>scala-library</artifactId>
      <version>${scala.version}</version>
    </dependency>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <version>4.12</version>
      <scope>test</scope>
    </dependency>
  </dependencies>
</project>"#,
    );
    write_file(
        &root.join("core/pom.xml"),
        r#"<project>
  <parent><groupId>com.example</groupId><artifactId>parent</artifactId><version>1.0</version></parent>
  <artifactId>core</artifactId>
</project>"#,
    );
    write_file(
        &root.join("util/pom.xml"),
        r#"<project>
  <parent><groupId>com.example</groupId><artifactId>parent</artifactId><version>1.0</version></parent>
  <artifactId>util</artifactId>
  <dependencies>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <version>4.13</version>
      <scope>test</scope>
    </dependency>
    <dependency>
      <groupId>com.example</groupId>
      <artifactId>core</artifactId>
      <version>${project.version}</version>
    </dependency>
  </dependencies>
</project>"#,
    );

    let model = load_build_model(root).expect("load model");
    let deps = |name: &str| -> Vec<(String, Option<String>)> {
        model
            .modules
            .iter()
            .find(|m| m.artifact_id == name)
            .expect("module")
            .dependencies
            .iter()
            .map(|d| (d.artifact_id.clone(), d.version.clone()))
            .collect()
    };

    assert_eq!(
        deps("core"),
        vec![
            ("scala-library".to_string(), Some("2.12.8".to_string())),
            ("junit".to_string(), Some("4.12".to_string())),
        ]
    );
    assert_eq!(
        deps("util"),
        vec![
            ("scala-library".to_string(), Some("2.12.8".to_string())),
            ("junit".to_string(), Some("4.13".to_string())),
            ("core".to_string(), Some("1.0".to_string())),
        ]
    );
}

#[test]
fn single_module_project_is_its_own_module() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_file(
        &temp.path().join("pom.xml"),
        "<project><groupId>g</groupId><artifactId>solo</artifactId><version>1</version></project>",
    );

    let model = load_build_model(temp.path()).expect("load model");
    assert_eq!(model.modules.len(), 1);
    assert_eq!(model.modules[0].artifact_id, "solo");
    assert_eq!(model.root.packaging, "jar");
}

#[test]
fn missing_pom_is_reported() {
    let temp = tempfile::tempdir().expect("temp dir");
    let err = load_build_model(temp.path()).expect_err("no pom");
    assert!(matches!(err, ProjectError::NotAMavenProject { .. }));
}

#[test]
fn malformed_pom_is_reported_with_path() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_file(&temp.path().join("pom.xml"), "<project>");
    let err = load_build_model(temp.path()).expect_err("bad xml");
    assert!(matches!(err, ProjectError::Xml { .. }));
    assert!(err.to_string().contains("pom.xml"));
}
