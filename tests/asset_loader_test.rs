use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use gridlight::{
    AssetLoadError,
    data_structures::mesh::MeshDescription,
    resources::{
        load_streamed,
        manifest::{AssetEntry, AssetKind, Manifest},
    },
};

use crate::common::test_utils::{Fixture, shipped_assets};

mod common;

#[derive(Debug, PartialEq)]
enum Loaded {
    Json(serde_json::Value),
    Image { width: u32, height: u32 },
}

fn json_entry(source: &str) -> AssetEntry<Loaded> {
    AssetEntry::text(source, |text| Ok(Loaded::Json(serde_json::from_str(text)?)))
}

fn image_entry(source: &str) -> AssetEntry<Loaded> {
    AssetEntry::image(source, |bytes| {
        let img = image::load_from_memory(bytes)?;
        Ok(Loaded::Image {
            width: img.width(),
            height: img.height(),
        })
    })
    .streamed()
}

#[tokio::test]
async fn should_resolve_with_every_entry() {
    let fixture = Fixture::new("resolve");
    fixture.write("a.json", r#"{"a": 1}"#).write_png_2x2("image.png");

    let manifest = Manifest::new(fixture.root())
        .with("a", json_entry("a.json"))
        .with("image", image_entry("image.png"));
    assert_eq!(manifest.len(), 2);
    assert_eq!(manifest.get("image").map(|e| e.kind()), Some(AssetKind::Image));
    assert!(manifest.get("image").is_some_and(|e| e.is_streamed()));

    let mut assets = manifest.load().await.expect("manifest should load");
    assert_eq!(assets.len(), 2);
    assert_eq!(
        assets.take("a").unwrap(),
        Loaded::Json(serde_json::json!({ "a": 1 }))
    );
    assert_eq!(
        assets.take("image").unwrap(),
        Loaded::Image {
            width: 2,
            height: 2
        }
    );
    assert!(assets.is_empty());
}

#[tokio::test]
async fn should_fail_whole_load_when_a_source_is_missing() {
    let fixture = Fixture::new("missing");
    fixture.write("a.json", r#"{"a": 1}"#).write_png_2x2("image.png");
    fixture.remove("image.png");

    let result = Manifest::new(fixture.root())
        .with("a", json_entry("a.json"))
        .with("image", image_entry("image.png"))
        .load()
        .await;

    match result {
        Err(AssetLoadError::Retrieve {
            name, source_path, ..
        }) => {
            assert_eq!(name, "image");
            assert!(source_path.ends_with("image.png"), "{source_path}");
        }
        other => panic!("expected a retrieve error, got {other:?}"),
    }
}

#[tokio::test]
async fn should_report_decode_failures_by_name() {
    let fixture = Fixture::new("decode");
    fixture.write("broken.json", "{ not json");

    let result = Manifest::new(fixture.root())
        .with("broken", json_entry("broken.json"))
        .load()
        .await;

    assert!(
        matches!(&result, Err(AssetLoadError::Decode { name, .. }) if name == "broken"),
        "{result:?}"
    );
}

#[tokio::test]
async fn should_report_invalid_utf8_text_as_a_decode_failure() {
    let fixture = Fixture::new("utf8");
    fixture.write("latin1.json", [b'{', b'"', 0xE9, b'"', b':', b'1', b'}']);

    for entry in [json_entry("latin1.json"), json_entry("latin1.json").streamed()] {
        let result = Manifest::new(fixture.root())
            .with("latin1", entry)
            .load()
            .await;
        assert!(
            matches!(&result, Err(AssetLoadError::Decode { name, .. }) if name == "latin1"),
            "{result:?}"
        );
    }
}

#[test]
fn should_clean_up_fixture_directories() {
    let fixture = Fixture::new("cleanup");
    fixture.write("a.json", "{}");
    let root = fixture.root().to_path_buf();
    assert!(root.join("a.json").is_file());

    drop(fixture);
    assert!(!root.exists());
}

#[tokio::test]
async fn should_parse_each_entry_exactly_once() {
    let fixture = Fixture::new("once");
    fixture.write("one.txt", "1").write("two.txt", "2");

    let calls = Arc::new(AtomicUsize::new(0));
    let counting = |source: &str| {
        let calls = calls.clone();
        AssetEntry::text(source, move |text| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(text.trim().parse::<u32>()?)
        })
    };

    let assets = Manifest::new(fixture.root())
        .with("one", counting("one.txt"))
        .with("two", counting("two.txt"))
        .load()
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(assets.get("one"), Some(&1));
    assert_eq!(assets.get("two"), Some(&2));
}

#[tokio::test]
async fn should_resolve_an_empty_manifest() {
    let assets = Manifest::<()>::new("does-not-matter").load().await.unwrap();
    assert!(assets.is_empty());
}

#[tokio::test]
async fn should_stream_in_chunks_without_losing_bytes() {
    let fixture = Fixture::new("stream");
    let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    fixture.write("blob.bin", &payload);

    let streamed = load_streamed(fixture.root(), "blob.bin", 7).await.unwrap();
    assert_eq!(streamed, payload);
}

#[tokio::test]
async fn should_report_taking_an_unknown_asset() {
    let fixture = Fixture::new("take");
    fixture.write("a.json", "{}");

    let mut assets = Manifest::new(fixture.root())
        .with("a", json_entry("a.json"))
        .load()
        .await
        .unwrap();

    assert!(assets.take("a").is_ok());
    assert!(matches!(
        assets.take("a"),
        Err(AssetLoadError::Missing { name }) if name == "a"
    ));
}

#[tokio::test]
async fn should_load_the_shipped_cube() {
    let assets = Manifest::new(shipped_assets())
        .with(
            "cube",
            AssetEntry::text("cube.json", MeshDescription::from_json),
        )
        .load()
        .await
        .unwrap();

    let cube = assets.get("cube").unwrap();
    assert_eq!(cube.positions.len(), 24);
    assert_eq!(cube.uv.len(), 24);
    assert_eq!(cube.cells.len(), 12);
}
