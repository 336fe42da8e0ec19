use villagemap::{
    decode, encode, read_snapshot, write_snapshots, DataSource, Dataset, DatasetLoader, Encoding,
    PipelineConfig, MINIMAL_SNAPSHOT,
};

fn synthetic(seed: u64) -> Dataset {
    let config = PipelineConfig::default()
        .with_shapefile("/nonexistent/villages.shp")
        .with_seed(seed);
    DatasetLoader::new(config).load().unwrap().dataset
}

#[test]
fn plain_and_gzip_snapshots_restore_the_dataset() {
    let dataset = synthetic(7);

    let plain = encode(&dataset, Encoding::Json).unwrap();
    let gzip = encode(&dataset, Encoding::Gzip).unwrap();
    assert!(gzip.len() < plain.len());
    assert_eq!(&gzip[..2], &[0x1f, 0x8b]);

    let from_plain = decode(&plain).unwrap();
    assert_eq!(from_plain.data_format, "deployable");
    assert_eq!(from_plain.dataset, dataset);

    let from_gzip = decode(&gzip).unwrap();
    assert_eq!(from_gzip.data_format, "deployable_compressed");
    assert_eq!(from_gzip.dataset, dataset);
    assert_eq!(from_gzip.dataset.source(), DataSource::Synthetic);
}

#[test]
fn minimal_snapshot_keeps_a_consistent_prefix() {
    let dataset = synthetic(8);
    let snapshot = decode(&encode(&dataset, Encoding::Minimal(10)).unwrap()).unwrap();

    assert_eq!(snapshot.data_format, "deployable_minimal");
    let minimal = snapshot.dataset;
    assert_eq!(minimal.len(), 10);
    assert_eq!(minimal.features(), &dataset.features()[..10]);
    // Outline first, then nine villages.
    assert_eq!(minimal.metadata().total_count, 9);
    let total: u64 = minimal.villages().map(|f| f.population).sum();
    assert_eq!(minimal.metadata().total_population, total);
}

#[test]
fn snapshot_directory_prefers_gzip_then_plain_then_minimal() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = synthetic(9);
    let written = write_snapshots(&dataset, dir.path(), 5).unwrap();
    assert_eq!(written.len(), 3);

    let (snapshot, path) = read_snapshot(dir.path()).unwrap().unwrap();
    assert_eq!(path, written[0]);
    assert_eq!(snapshot.dataset, dataset);

    std::fs::remove_file(&written[0]).unwrap();
    std::fs::remove_file(&written[1]).unwrap();
    let (snapshot, path) = read_snapshot(dir.path()).unwrap().unwrap();
    assert_eq!(path, dir.path().join(MINIMAL_SNAPSHOT));
    assert_eq!(snapshot.dataset.len(), 5);

    std::fs::remove_file(&written[2]).unwrap();
    assert!(read_snapshot(dir.path()).unwrap().is_none());
}

#[test]
fn inconsistent_metadata_is_rejected() {
    let dataset = synthetic(10);
    let mut value: serde_json::Value = serde_json::from_slice(&encode(&dataset, Encoding::Json).unwrap()).unwrap();
    value["metadata"]["total_population"] = serde_json::json!(1);
    assert!(decode(&serde_json::to_vec(&value).unwrap()).is_err());
}
