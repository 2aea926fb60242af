use super::*;

fn write_spec(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("environments.yaml");
    fs::write(&path, contents).expect("write spec");
    (dir, path)
}

fn schema_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<HealthError>() {
        Some(HealthError::Schema { message, .. }) => message.clone(),
        other => panic!("expected schema error, got {other:?} ({err})"),
    }
}

#[test]
fn override_lists_append_to_base_lists() {
    let (_dir, path) = write_spec(
        r#"
base_environment:
  base-image: X
  pip: [a]
environments:
  - name: e1
    pip: [b]
producers: []
"#,
    );
    let spec = load_spec(&path).expect("load spec");
    let env = &spec.environments[0];
    assert_eq!(env.name, "e1");
    assert_eq!(env.base_image, "X");
    assert_eq!(env.pip, vec!["a", "b"]);
    assert!(env.apt.is_empty());
    assert_eq!(env.on_startup, None);
}

#[test]
fn lists_are_not_deduplicated_and_scalars_override() {
    let (_dir, path) = write_spec(
        r#"
base_environment:
  name: ignored
  base-image: debian:bullseye
  apt: [git, curl]
  on_startup: echo base
environments:
  - name: first
    base-image: ubuntu:22.04
    apt: [git]
  - name: second
producers:
  - name: core
    environments: [first, second]
"#,
    );
    let spec = load_spec(&path).expect("load spec");
    let names: Vec<_> = spec.environments.iter().map(|env| env.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);

    let first = &spec.environments[0];
    assert_eq!(first.base_image, "ubuntu:22.04");
    assert_eq!(first.apt, vec!["git", "curl", "git"]);
    assert_eq!(first.on_startup.as_deref(), Some("echo base"));

    let second = &spec.environments[1];
    assert_eq!(second.base_image, "debian:bullseye");
    assert_eq!(second.apt, vec!["git", "curl"]);
    assert_eq!(
        spec.producers,
        vec![Producer {
            name: "core".to_string(),
            environments: vec!["first".to_string(), "second".to_string()],
        }]
    );
}

#[test]
fn base_is_copied_per_environment() {
    let (_dir, path) = write_spec(
        r#"
base_environment:
  base-image: X
  pip: [a]
environments:
  - name: e1
    pip: [b]
  - name: e2
    pip: [c]
producers: []
"#,
    );
    let spec = load_spec(&path).expect("load spec");
    assert_eq!(spec.environments[0].pip, vec!["a", "b"]);
    assert_eq!(spec.environments[1].pip, vec!["a", "c"]);
}

#[test]
fn missing_base_image_is_schema_error() {
    let (_dir, path) = write_spec(
        r#"
base_environment:
  pip: [a]
environments:
  - name: e1
producers: []
"#,
    );
    let err = load_spec(&path).unwrap_err();
    assert!(schema_message(&err).contains("base-image"), "{err}");
}

#[test]
fn missing_name_or_mistyped_field_is_schema_error() {
    for contents in [
        "base_environment: {base-image: X}\nenvironments: [{pip: [a]}]\nproducers: []\n",
        "base_environment: {base-image: X}\nenvironments: [{name: e1, apt: git}]\nproducers: []\n",
        "base_environment: {base-image: X}\nenvironments: [{name: e1}]\n",
        "environments: [{name: e1, base-image: X}]\nproducers: []\n",
        "base_environment: {base-image: X}\nenvironments: [{name: e1}, {name: e1}]\nproducers: []\n",
        "- just\n- a list\n",
        "base_environment: [not, a, mapping]\nproducers: []\n",
        "base_environment: {base-image: X\n",
    ] {
        let (_dir, path) = write_spec(contents);
        let err = load_spec(&path).unwrap_err();
        schema_message(&err);
    }
}

#[test]
fn missing_environments_key_yields_no_environments() {
    let (_dir, path) = write_spec("base_environment: {base-image: X}\nproducers: []\n");
    let spec = load_spec(&path).expect("load spec");
    assert!(spec.environments.is_empty());
}

#[test]
fn missing_file_is_spec_not_found() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = load_spec(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HealthError>(),
        Some(HealthError::SpecNotFound { .. })
    ));
}

#[test]
fn deep_merge_recurses_into_nested_mappings() {
    let base: Value = serde_yaml::from_str("outer: {keep: 1, list: [a], replace: x}").expect("base");
    let overlay: Value =
        serde_yaml::from_str("outer: {list: [b], replace: [y], added: true}").expect("overlay");
    let merged = deep_merge(base, overlay);
    let expected: Value = serde_yaml::from_str(
        "outer: {keep: 1, list: [a, b], replace: [y], added: true}",
    )
    .expect("expected");
    assert_eq!(merged, expected);
}
