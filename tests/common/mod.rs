#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dwh_sampler::provider::ObjectStoreAdapter;
use dwh_sampler::schema::FormatHints;
use flate2::{Compression, write::GzEncoder};
use object_store::{ObjectStore, PutPayload, memory::InMemory, path::Path as ObjectPath};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file contents");
        path
    }
}

pub fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).expect("gzip fixture");
    encoder.finish().expect("finish gzip fixture")
}

/// In-process bucket seeded with `objects`.
pub async fn memory_bucket(objects: &[(&str, Vec<u8>)]) -> ObjectStoreAdapter {
    let store = InMemory::new();
    for (key, body) in objects {
        store
            .put(
                &ObjectPath::parse(*key).expect("valid key"),
                PutPayload::from(body.clone()),
            )
            .await
            .expect("seed object");
    }
    ObjectStoreAdapter::new(Arc::new(store), "memory://test")
}

pub fn hints(has_header_row: bool) -> FormatHints {
    FormatHints {
        has_header_row,
        date_format: "yyyy-MM-dd".to_string(),
        time_format: "HH:mm:ss".to_string(),
        timestamp_format: "yyyy-MM-dd HH:mm:ss.SSS".to_string(),
        decimal_separator: '.',
    }
}

pub fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
    data.iter()
        .map(|row| row.iter().map(|value| value.to_string()).collect())
        .collect()
}
