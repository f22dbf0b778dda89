//! Storage Facade Tests
//!
//! Exercises the facade over the local backend:
//! - save/download round trip preserves bytes
//! - prefix listing and counting
//! - signed URL structure resolves and verifies
//! - metadata checksums

use std::collections::HashMap;

use chrono::Utc;
use tempfile::TempDir;
use url::Url;

use blobgate::config::Config;
use blobgate::signing::UrlSigner;
use blobgate::storage::{SaveOptions, SignedUrlOptions, StorageError, StorageService};

const SECRET: &str = "facade-test-secret";

fn test_config(temp: &TempDir) -> Config {
    Config {
        local_base_dir: temp.path().display().to_string(),
        local_secret_key: Some(SECRET.to_string()),
        ..Config::default()
    }
}

async fn test_service(temp: &TempDir) -> StorageService {
    StorageService::from_config(&test_config(temp)).await.unwrap()
}

fn query_pairs(signed_url: &str) -> HashMap<String, String> {
    Url::parse(signed_url)
        .unwrap()
        .query_pairs()
        .into_owned()
        .collect()
}

#[tokio::test]
async fn test_round_trip_preserves_bytes() {
    let temp = TempDir::new().unwrap();
    let service = test_service(&temp).await;
    let payload = vec![0u8, 255, 1, 254, 127, 128];

    service
        .save("u/42/blob.bin", &payload, &SaveOptions::default())
        .await
        .unwrap();

    assert_eq!(service.download("u/42/blob.bin").await.unwrap(), payload);
}

#[tokio::test]
async fn test_exists_and_not_found_are_distinct() {
    let temp = TempDir::new().unwrap();
    let service = test_service(&temp).await;

    assert!(!service.exists("missing").await.unwrap());
    assert!(matches!(
        service.download("missing").await,
        Err(StorageError::ObjectNotFound(_))
    ));
}

#[tokio::test]
async fn test_list_and_count_by_prefix() {
    let temp = TempDir::new().unwrap();
    let service = test_service(&temp).await;

    for path in ["u/42/a", "u/42/b", "u/7/c"] {
        service.save(path, b"x", &SaveOptions::default()).await.unwrap();
    }

    let names = service.list_by_prefix("u/42/").await.unwrap();
    assert_eq!(names, vec!["u/42/a".to_string(), "u/42/b".to_string()]);

    assert_eq!(service.count_by_prefix("u/42/").await.unwrap(), 2);
    assert_eq!(service.count_by_prefix("u/").await.unwrap(), 3);
    assert_eq!(service.count_by_prefix("v/").await.unwrap(), 0);
}

#[tokio::test]
async fn test_upload_signed_url_resolves_and_verifies() {
    let temp = TempDir::new().unwrap();
    let service = test_service(&temp).await;

    let options = SignedUrlOptions {
        content_type: Some("image/png".to_string()),
        ..SignedUrlOptions::default()
    };
    let signed_url = service.upload_signed_url("u/42/cover.png", &options).await.unwrap();

    let parsed = Url::parse(&signed_url).unwrap();
    assert!(parsed.path().ends_with("/upload"));

    let pairs = query_pairs(&signed_url);
    assert_eq!(pairs["filename"], "u/42/cover.png");
    assert_eq!(pairs["contentType"], "image/png");

    // the embedded token verifies against the configured secret
    let signer = UrlSigner::new(SECRET).unwrap();
    let payload = format!(
        "{}:{}:{}",
        pairs["filename"], pairs["expiry"], pairs["contentType"]
    );
    assert!(signer.verify(&payload, &pairs["signature"]));
}

#[tokio::test]
async fn test_download_signed_url_default_window() {
    let temp = TempDir::new().unwrap();
    let service = test_service(&temp).await;

    let signed_url = service
        .download_signed_url("u/42/cover.png", &SignedUrlOptions::default())
        .await
        .unwrap();
    let pairs = query_pairs(&signed_url);

    let expiry: i64 = pairs["expiry"].parse().unwrap();
    let delta = expiry - Utc::now().timestamp();
    assert!((3595..=3600).contains(&delta), "unexpected window: {}", delta);
}

#[tokio::test]
async fn test_file_metadata_reports_checksum_without_public_url() {
    let temp = TempDir::new().unwrap();
    let service = test_service(&temp).await;

    service
        .save("u/42/hello.txt", b"hello", &SaveOptions::default())
        .await
        .unwrap();
    let metadata = service.file_metadata("u/42/hello.txt").await.unwrap();

    assert_eq!(
        metadata.content_hash,
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
    assert!(metadata.public_url.is_none());
}

#[tokio::test]
async fn test_facade_rejects_escaping_paths() {
    let temp = TempDir::new().unwrap();
    let service = test_service(&temp).await;

    let result = service.save("../outside", b"x", &SaveOptions::default()).await;
    assert!(matches!(result, Err(StorageError::InvalidPath(_))));
}

#[tokio::test]
async fn test_from_config_fails_without_secret() {
    let temp = TempDir::new().unwrap();
    let config = Config {
        local_secret_key: None,
        ..test_config(&temp)
    };

    let result = StorageService::from_config(&config).await;
    assert!(matches!(result, Err(StorageError::Config(_))));
}
