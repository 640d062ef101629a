use std::{fs, path::PathBuf};

use specdoc_schema::{
    CatalogOptions, FileSystem, NodeKind, TypeKey, TypeRef, error::ErrorCode, load_catalog,
};

fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create directory");
    }
    fs::write(&path, text).expect("Failed to write file");
    path
}

#[test]
fn test_cross_namespace_forward_references() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let common = write(
        &dir,
        "common/common.namespace.yaml",
        r#"
namespaces:
- name: common
  doc: Common types
  schema:
  - source: table.yaml
"#,
    );
    write(
        &dir,
        "common/table.yaml",
        r#"
groups:
- data_type_def: Container
  doc: Base container
datasets:
- data_type_def: VectorData
  doc: A column
"#,
    );
    let core = write(
        &dir,
        "core/core.namespace.yaml",
        r#"
namespaces:
- name: core
  doc: Core types
  schema:
  - namespace: common
  - source: base.yaml
"#,
    );
    write(
        &dir,
        "core/base.yaml",
        r#"
groups:
- neurodata_type_def: ProcessingModule
  neurodata_type_inc: NWBContainer
  doc: A module
  groups:
  - neurodata_type_inc: NWBContainer
    quantity: '*'
- neurodata_type_def: NWBContainer
  neurodata_type_inc: Container
  doc: Base for NWB types
  datasets:
  - data_type_inc: VectorData
    name: column
"#,
    );

    let normalized = load_catalog(&FileSystem, &[core, common], &CatalogOptions::default())
        .expect("Failed to load catalog");
    let catalog = &normalized.catalog;

    assert!(normalized.warnings.is_empty());
    assert_eq!(catalog.len(), 4);

    let module = catalog
        .get(&TypeKey::new("core", "ProcessingModule"))
        .expect("ProcessingModule missing");
    assert_eq!(module.kind, NodeKind::Group);
    let ancestors: Vec<String> = catalog
        .ancestors(&module.key)
        .iter()
        .map(|node| node.key.to_string())
        .collect();
    assert_eq!(ancestors, vec!["core:NWBContainer", "common:Container"]);

    let container = catalog
        .get(&TypeKey::new("core", "NWBContainer"))
        .expect("NWBContainer missing");
    let includes: Vec<Option<&TypeKey>> =
        container.includes().into_iter().map(TypeRef::target).collect();
    assert_eq!(includes, vec![Some(&TypeKey::new("common", "VectorData"))]);
}

#[test]
fn test_collision_names_both_origins_and_keeps_run_alive() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let first = write(
        &dir,
        "first/ns.yaml",
        "namespaces:\n- name: lab\n  schema:\n  - source: lab.yaml\n",
    );
    write(
        &dir,
        "first/lab.yaml",
        "groups:\n- data_type_def: Probe\n  doc: first\n- data_type_def: Rig\n",
    );
    let second = write(
        &dir,
        "second/ns.yaml",
        "namespaces:\n- name: lab\n  schema:\n  - source: lab.yaml\n",
    );
    write(
        &dir,
        "second/lab.yaml",
        "groups:\n- data_type_def: Probe\n  doc: second\n- data_type_def: Rig\n",
    );

    let normalized = load_catalog(
        &FileSystem,
        &[first.clone(), second.clone()],
        &CatalogOptions::default(),
    )
    .expect("Collisions are not fatal");

    assert_eq!(normalized.catalog.len(), 2);
    assert_eq!(normalized.warnings.len(), 1);

    let warning = &normalized.warnings[0];
    assert_eq!(warning.code(), Some(ErrorCode::E200));
    assert!(warning.message().contains(&first.display().to_string()));
    assert!(warning.message().contains(&second.display().to_string()));
}

#[test]
fn test_syntax_error_is_fatal_with_location() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let namespace = write(
        &dir,
        "ns.yaml",
        "namespaces:\n- name: core\n  schema:\n  - source: broken.yaml\n",
    );
    write(&dir, "broken.yaml", "groups:\n- data_type_def: A\n  doc: [unterminated\n");

    let err = load_catalog(&FileSystem, &[namespace], &CatalogOptions::default())
        .expect_err("Broken YAML must fail");

    let diagnostic = &err.diagnostics()[0];
    assert_eq!(diagnostic.code(), Some(ErrorCode::E002));
    assert!(diagnostic.source().is_some());
}
