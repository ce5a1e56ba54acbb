//! 会话资源存储集成测试

use std::sync::Arc;
use std::thread;

use ocrchat_lib::{rewrite_image_references, SessionAssetStore};
use regex::Regex;
use tempfile::TempDir;

const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

fn create_test_storage() -> (SessionAssetStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let storage = SessionAssetStore::with_base_dir(temp_dir.path().to_path_buf()).unwrap();
    (storage, temp_dir)
}

#[test]
fn test_fig1_scenario_without_session_id() {
    let (storage, _temp) = create_test_storage();
    let report = storage.ingest([("fig1", PNG)], None).unwrap();

    let asset = &report.assets["fig1"];
    assert_eq!(asset.mime_type, "image/png");
    assert_eq!(asset.original_id, "fig1");

    let pattern = Regex::new(&format!(
        r"^/assets/ocr-images/{}/fig1-[0-9a-f]{{8}}\.png$",
        regex::escape(&report.session_id)
    ))
    .unwrap();
    assert!(pattern.is_match(&asset.public_path), "{}", asset.public_path);
}

#[test]
fn test_three_assets_one_corrupt() {
    let (storage, _temp) = create_test_storage();
    let report = storage
        .ingest(
            [
                ("p1", PNG),
                ("p2", "data:image/png;base64,%%%corrupt%%%"),
                ("p3", "iVBORw0KGgo="),
            ],
            None,
        )
        .unwrap();

    assert_eq!(report.assets.len(), 2);
    assert!(report.assets.contains_key("p1"));
    assert!(report.assets.contains_key("p3"));
    assert_eq!(storage.list_assets(&report.session_id).len(), 2);
}

#[test]
fn test_sessions_do_not_leak_into_each_other() {
    let (storage, _temp) = create_test_storage();
    let a = storage.ingest([("a", PNG)], None).unwrap();
    let b = storage.ingest([("b", PNG)], None).unwrap();
    assert_ne!(a.session_id, b.session_id);

    let listed_b = storage.list_assets(&b.session_id);
    assert!(listed_b.iter().all(|asset| asset.original_id != "a"));
    assert!(listed_b
        .iter()
        .all(|asset| asset.public_path.contains(&b.session_id)));
}

#[test]
fn test_delete_leaves_no_residue() {
    let (storage, _temp) = create_test_storage();
    let report = storage.ingest([("a", PNG), ("b", PNG)], None).unwrap();
    let session_dir = storage.base_dir().join(&report.session_id);

    assert!(storage.delete_session(&report.session_id));
    assert!(!session_dir.exists());
    assert!(!storage.delete_session(&report.session_id));
    assert!(storage.list_assets(&report.session_id).is_empty());
}

#[test]
fn test_concurrent_ingest_same_session_keeps_all_files() {
    let (storage, _temp) = create_test_storage();
    let storage = Arc::new(storage);
    storage.ensure_session(Some("shared")).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let storage = storage.clone();
            thread::spawn(move || {
                storage
                    .ingest([(format!("w{}", i), PNG)], Some("shared"))
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // 文件全部保留，会话信息只反映最后一次写入
    assert_eq!(storage.list_assets("shared").len(), 4);
    let catalog = storage.read_catalog("shared").unwrap().unwrap();
    assert_eq!(catalog.image_count, 1);
}

#[test]
fn test_markdown_references_point_at_public_paths() {
    let (storage, _temp) = create_test_storage();
    let report = storage
        .ingest([("img-0.jpeg", "data:image/jpeg;base64,/9j/4AAQ")], Some("doc"))
        .unwrap();

    let markdown = "Intro\n\n![img-0.jpeg](img-0.jpeg)\n";
    let rewritten = rewrite_image_references(markdown, &report.assets);

    let public_path = &report.assets["img-0.jpeg"].public_path;
    assert!(public_path.starts_with("/assets/ocr-images/doc/img-0.jpeg-"));
    assert!(public_path.ends_with(".jpeg"));
    assert_eq!(rewritten, format!("Intro\n\n![img-0.jpeg]({})\n", public_path));
}

#[test]
fn test_custom_public_prefix() {
    let temp_dir = TempDir::new().unwrap();
    let storage = SessionAssetStore::with_base_dir(temp_dir.path().to_path_buf())
        .unwrap()
        .with_public_prefix("/static/images/");

    let report = storage.ingest([("x", PNG)], Some("s")).unwrap();
    assert!(report.assets["x"].public_path.starts_with("/static/images/s/x-"));
    assert!(storage.list_assets("s")[0]
        .public_path
        .starts_with("/static/images/s/x-"));
}
