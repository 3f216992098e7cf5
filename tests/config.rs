use camino::Utf8PathBuf;

use assert_matches::assert_matches;
use kira_downsample::config::{
    Config, ConfigLoader, DatasetEntry, DatasetEntryObject, SampleRequest,
};
use kira_downsample::domain::DatasetKind;
use kira_downsample::error::SampleError;

#[test]
fn parse_config_shorthand_and_detailed() {
    let config = Config {
        schema_version: None,
        data_root: Some("/srv/viz".to_string()),
        datasets: vec![
            DatasetEntry::Shorthand("umap".to_string()),
            DatasetEntry::Detailed(DatasetEntryObject {
                dataset: "gene-cell-expression".to_string(),
                input: Some("raw/genes.json".to_string()),
                output: None,
            }),
        ],
    };

    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_eq!(resolved.schema_version, 1);
    assert_eq!(resolved.data_root, Some(Utf8PathBuf::from("/srv/viz")));
    assert_eq!(resolved.requests.len(), 2);
    assert_eq!(resolved.requests[0], SampleRequest::builtin(DatasetKind::Umap));
    assert_eq!(resolved.requests[1].dataset, DatasetKind::GeneCellExpression);
    assert_eq!(resolved.requests[1].input, Utf8PathBuf::from("raw/genes.json"));
    assert_eq!(
        resolved.requests[1].output,
        Utf8PathBuf::from(DatasetKind::GeneCellExpression.default_output())
    );
}

#[test]
fn config_rejects_unknown_dataset() {
    let config = Config {
        schema_version: Some(1),
        data_root: None,
        datasets: vec![DatasetEntry::Shorthand("tsne".to_string())],
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, SampleError::UnknownDataset(name) if name == "tsne");
}

#[test]
fn config_file_round_trip_from_disk() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("kira-ds.json");
    std::fs::write(
        &path,
        r#"{"schema_version": 2, "datasets": ["cell-cluster-mapping", {"dataset": "umap", "output": "out.json"}]}"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.schema_version, 2);
    assert_eq!(resolved.requests[0].dataset, DatasetKind::CellClusterMapping);
    assert_eq!(resolved.requests[1].output, Utf8PathBuf::from("out.json"));
}

#[test]
fn config_errors() {
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(missing.to_str()).unwrap_err();
    assert_matches!(err, SampleError::ConfigRead(_));

    let broken = temp.path().join("broken.json");
    std::fs::write(&broken, "{\"datasets\": [").unwrap();
    let err = ConfigLoader::resolve(broken.to_str()).unwrap_err();
    assert_matches!(err, SampleError::ConfigParse(_));
}
