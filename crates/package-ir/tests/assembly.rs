// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! End-to-end assembly from archive and directory packages.

use package_ir::{
    extract_archive, ArchiveFiles, DirectoryFiles, PackageAssembler, PackageError, TopologyError,
};
use serde_json::json;

const MANIFEST: &str = r#"{
    "name": "detector",
    "version": "1.0.0",
    "inputs": [{"name": "image", "content_type": "NDJSON", "dtype": "float32", "shape": ["batch", 3]}],
    "outputs": [{"name": "boxes", "content_type": "NDJSON", "dtype": "float32", "shape": ["batch", 4]}]
}"#;

const OPS: &str = r#"[
    {"id": "pre", "op": "scale",
     "inputs": [{"name": "x", "dtype": "float32", "shape": ["batch", 3]}],
     "outputs": [{"name": "y", "dtype": "float32"}],
     "attributes": {"factor": 2.0}},
    {"id": "det", "op": "detect",
     "inputs": [{"name": "x", "dtype": "float32"}],
     "outputs": [{"name": "y", "dtype": "float32", "shape": ["batch", 4]}]}
]"#;

const VARIANT: &str = r#"{"nodes": [
    {"op_instance_id": "pre", "inputs": ["image"], "outputs": ["scaled"]},
    {"op_instance_id": "det", "inputs": ["scaled"], "outputs": ["boxes"]}
]}"#;

fn archive(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        builder.append_data(&mut header, path, data.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap()
}

fn base_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("manifest.json", MANIFEST),
        ("ops.json", OPS),
        ("variant_config.json", VARIANT),
    ]
}

fn assemble(files: &[(&str, &str)]) -> Result<package_ir::AssembledPackage, PackageError> {
    let files = ArchiveFiles::from_vec(archive(files))?;
    PackageAssembler::assemble(&files)
}

#[test]
fn test_minimal_package() {
    let package = assemble(&base_files()).unwrap();
    assert_eq!(package.manifest.name, "detector");
    assert_eq!(package.operators.len(), 2);
    assert_eq!(package.topology.len(), 2);
    assert!(package.dtypes.is_empty());
    assert!(package.metadata.is_empty());
    assert_eq!(package.operator("pre").unwrap().attributes["factor"], 2.0);

    package
        .topology
        .validate_wiring(&package.operators, package.manifest.input_names())
        .unwrap();
    assert_eq!(package.topology.schedule(["image"]).unwrap(), [0, 1]);
}

#[test]
fn test_patches_apply_in_lexicographic_name_order() {
    let mut files = base_files();
    // "manifest-10" sorts before "manifest-2".
    files.push((
        "manifest-2.patch.json",
        r#"[{"op": "replace", "path": "/version", "value": "from-2"}]"#,
    ));
    files.push((
        "manifest-10.patch.json",
        r#"[{"op": "replace", "path": "/version", "value": "from-10"},
            {"op": "add", "path": "/producer_tags", "value": ["ten"]}]"#,
    ));
    let package = assemble(&files).unwrap();
    assert_eq!(package.manifest.version, "from-2");
    assert_eq!(package.manifest.producer_tags, ["ten"]);
}

#[test]
fn test_swapping_patch_names_swaps_the_winner() {
    let versioned = |first: &'static str, second: &'static str| {
        let mut files = base_files();
        files.push((
            first,
            r#"[{"op": "replace", "path": "/version", "value": "alpha"}]"#,
        ));
        files.push((
            second,
            r#"[{"op": "replace", "path": "/version", "value": "beta"}]"#,
        ));
        assemble(&files).unwrap().manifest.version
    };
    assert_eq!(versioned("manifest-a.patch.json", "manifest-b.patch.json"), "beta");
    assert_eq!(versioned("manifest-b.patch.json", "manifest-a.patch.json"), "alpha");
}

#[test]
fn test_patch_can_rewrite_declared_shape() {
    let mut files = base_files();
    files.push((
        "manifest-a.patch.json",
        r#"[{"op": "replace", "path": "/inputs/0/shape/1", "value": 4}]"#,
    ));
    let package = assemble(&files).unwrap();
    assert_eq!(package.manifest.inputs[0].shape.to_string(), "[batch, 4]");
}

#[test]
fn test_nested_patch_names_are_ignored() {
    let mut files = base_files();
    files.push((
        "extra/manifest-1.patch.json",
        r#"[{"op": "replace", "path": "/version", "value": "nested"}]"#,
    ));
    assert_eq!(assemble(&files).unwrap().manifest.version, "1.0.0");
}

#[test]
fn test_failing_patch_names_file_and_pointer() {
    let mut files = base_files();
    files.push((
        "manifest-x.patch.json",
        r#"[{"op": "replace", "path": "/nope", "value": 1}]"#,
    ));
    let err = assemble(&files).unwrap_err();
    assert!(matches!(&err, PackageError::Patch { file, .. } if file == "manifest-x.patch.json"));
    let msg = err.to_string();
    assert!(msg.contains("manifest-x.patch.json"));
    assert!(std::error::Error::source(&err).unwrap().to_string().contains("/nope"));
}

#[test]
fn test_metadata_concatenated_in_archive_order() {
    let mut files = base_files();
    files.push(("meta-b.json", r#"[{"k": "b"}]"#));
    files.push(("meta.json", r#"[{"k": "root"}, {"k": "root2"}]"#));
    files.push(("meta-obj.json", r#"{"k": "not an array"}"#));
    files.push(("docs/meta-z.json", r#"[{"k": "nested"}]"#));
    let package = assemble(&files).unwrap();
    assert_eq!(
        package.metadata,
        [json!({"k": "b"}), json!({"k": "root"}), json!({"k": "root2"})]
    );
}

#[test]
fn test_dtypes_loaded_when_present() {
    let mut files = base_files();
    files.push(("dtypes.json", r#"{"labels_t": {"type": "array"}}"#));
    let package = assemble(&files).unwrap();
    assert_eq!(package.dtypes["labels_t"], json!({"type": "array"}));
}

#[test]
fn test_missing_required_files() {
    for missing in ["manifest.json", "ops.json", "variant_config.json"] {
        let files: Vec<_> = base_files().into_iter().filter(|(n, _)| *n != missing).collect();
        match assemble(&files) {
            Err(PackageError::MissingFile(name)) => assert_eq!(name, missing),
            other => panic!("expected MissingFile({missing}), got {other:?}"),
        }
    }
}

#[test]
fn test_malformed_json_names_file() {
    let mut files = base_files();
    files.push(("meta.json", "[1, 2"));
    assert!(matches!(
        assemble(&files),
        Err(PackageError::Json { file, .. }) if file == "meta.json"
    ));
}

#[test]
fn test_dot_slash_archive_paths() {
    let files: Vec<_> = base_files()
        .into_iter()
        .map(|(n, d)| (format!("./{n}"), d))
        .collect();
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in &files {
        let mut header = tar::Header::new_ustar();
        header.as_mut_bytes()[..path.len()].copy_from_slice(path.as_bytes());
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, data.as_bytes()).unwrap();
    }
    let files = ArchiveFiles::from_vec(builder.into_inner().unwrap()).unwrap();
    assert_eq!(PackageAssembler::assemble(&files).unwrap().operators.len(), 2);
}

#[test]
fn test_directory_package_matches_archive() {
    let mut files = base_files();
    files.push(("meta-1.json", r#"[{"n": 1}]"#));
    files.push(("meta-0.json", r#"[{"n": 0}]"#));
    let bytes = archive(&files);
    let from_archive = PackageAssembler::assemble(&ArchiveFiles::from_vec(bytes.clone()).unwrap()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    assert_eq!(extract_archive(&bytes, dir.path()).unwrap(), 5);
    let from_dir = PackageAssembler::assemble(&DirectoryFiles::new(dir.path()).unwrap()).unwrap();

    assert_eq!(from_dir.manifest, from_archive.manifest);
    assert_eq!(from_dir.operators, from_archive.operators);
    // Directories enumerate by name, archives by position.
    assert_eq!(from_archive.metadata, [json!({"n": 1}), json!({"n": 0})]);
    assert_eq!(from_dir.metadata, [json!({"n": 0}), json!({"n": 1})]);
}

#[test]
fn test_wiring_defect_detected_after_assembly() {
    let mut files = base_files();
    files.retain(|(n, _)| *n != "variant_config.json");
    files.push((
        "variant_config.json",
        r#"{"nodes": [{"op_instance_id": "pre", "inputs": ["image"], "outputs": ["image"]}]}"#,
    ));
    let package = assemble(&files).unwrap();
    assert!(matches!(
        package
            .topology
            .validate_wiring(&package.operators, package.manifest.input_names()),
        Err(TopologyError::WritesPipelineInput { .. })
    ));
}
