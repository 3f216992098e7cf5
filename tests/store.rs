use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use serde_json::json;

use kira_downsample::domain::{DatasetKind, JsonStyle};
use kira_downsample::error::SampleError;
use kira_downsample::store::Store;

fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, root)
}

#[test]
fn layout_paths() {
    let store = Store::new_with_root(Utf8PathBuf::from("viz"));
    let input = store.input_path(DatasetKind::CellClusterMapping);
    assert!(input.ends_with("cell_cluster_mapping/cell_cluster_mapping_sampleAll.json"));
    let output = store.output_path(DatasetKind::Umap);
    assert!(output.ends_with("data/umap/umap_Combined.json"));
    assert!(output.starts_with(store.data_root()));
}

#[test]
fn read_document_errors() {
    let (_temp, root) = temp_root();

    let err = Store::read_document(&root.join("missing.json")).unwrap_err();
    assert_matches!(err, SampleError::MissingInput(_));

    let bad = root.join("bad.json");
    std::fs::write(bad.as_std_path(), "{\"0\": ").unwrap();
    let err = Store::read_document(&bad).unwrap_err();
    assert_matches!(err, SampleError::MalformedJson { .. });
}

#[test]
fn write_document_overwrites() {
    let (_temp, root) = temp_root();
    let path = root.join("out.json");
    std::fs::write(path.as_std_path(), "previous content that is longer").unwrap();

    Store::write_document(&path, &json!({"0": [1.5, -2]}), JsonStyle::Spaced).unwrap();
    let written = std::fs::read_to_string(path.as_std_path()).unwrap();
    assert_eq!(written, r#"{"0": [1.5, -2]}"#);

    Store::write_document(&path, &json!({"0": [1.5, -2]}), JsonStyle::Compact).unwrap();
    let written = std::fs::read_to_string(path.as_std_path()).unwrap();
    assert_eq!(written, r#"{"0":[1.5,-2]}"#);
}

#[test]
fn write_document_requires_parent() {
    let (_temp, root) = temp_root();
    let path = root.join("no_such_dir").join("out.json");
    let err = Store::write_document(&path, &json!({}), JsonStyle::Spaced).unwrap_err();
    assert_matches!(err, SampleError::OutputWrite { .. });
}
