#![allow(dead_code)]

use image::{ImageBuffer, ImageFormat, Rgb};
use std::io::Cursor;
use std::path::Path;

use marmot_checker::common::config::{
    FileConfig, ENV_ALLOWLIST, ENV_API_KEY, ENV_ENDPOINT, ENV_STORAGE_HOST,
};
use marmot_checker::CheckerConfig;

pub const API_KEY: &str = "test-key";

fn encoded(format: ImageFormat) -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_fn(8, 8, |x, y| Rgb([(x * 30) as u8, (y * 30) as u8, 90]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

pub fn png_bytes() -> Vec<u8> {
    encoded(ImageFormat::Png)
}

pub fn jpeg_bytes() -> Vec<u8> {
    encoded(ImageFormat::Jpeg)
}

/// Classification reply carrying `labels` in order.
pub fn label_reply(labels: &[&str]) -> String {
    let annotations: Vec<serde_json::Value> = labels
        .iter()
        .map(|label| serde_json::json!({ "mid": "/m/0", "description": label, "score": 0.87 }))
        .collect();
    serde_json::json!({ "responses": [{ "labelAnnotations": annotations }] }).to_string()
}

/// Configuration pointing at the given collaborators, with temp files in `temp_dir`.
pub fn test_config(
    temp_dir: &Path,
    allow_list: &str,
    endpoint: &str,
    storage_host: &str,
    max_upload_bytes: usize,
) -> CheckerConfig {
    let mut file = FileConfig::default();
    file.server.temp_dir = Some(temp_dir.to_path_buf());
    file.server.max_upload_bytes = Some(max_upload_bytes);
    file.classification.timeout_secs = Some(5);
    file.storage.timeout_secs = Some(5);

    let env = [
        (ENV_API_KEY, API_KEY.to_string()),
        (ENV_ALLOWLIST, allow_list.to_string()),
        (ENV_ENDPOINT, endpoint.to_string()),
        (ENV_STORAGE_HOST, storage_host.to_string()),
    ];

    CheckerConfig::from_sources(file, move |key: &str| {
        env.iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.clone())
    })
    .unwrap()
}

pub fn temp_files_left(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
