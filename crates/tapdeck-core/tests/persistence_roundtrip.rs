/*
[INPUT]:  tapdeck-core storage API and hand-written task documents
[OUTPUT]: Round-trip and compatibility coverage for the task store
[POS]:    Integration test layer - persistence contract
[UPDATE]: When the stored document shape changes
*/

use tempfile::TempDir;
use tokio_test::assert_ok;

use tapdeck_core::{Block, Region, Task, TaskId, TaskStorage};

fn busy_collection() -> Vec<Task> {
    let mut routine = Task::named(TaskId(1_771_111_111_111), "unlock and scroll");
    routine
        .blocks
        .push(Block::tap_in(Region::new(10.0, 650.0, 310.0, 700.0)));
    routine.blocks.push(Block::loop_with(
        5,
        vec![
            Block::tap_in(Region::new(200.0, 90.0, 120.0, 40.0)),
            Block::function(vec![Block::tap()]),
        ],
    ));

    let mut empty = Task::new(TaskId(1_771_111_111_112));
    empty.name = String::new();

    vec![routine, empty]
}

#[tokio::test]
async fn persistence_round_trips_collections_exactly() {
    let dir = TempDir::new().expect("temp dir");
    let storage = TaskStorage::new(dir.path().join("tasks.json"));
    let tasks = busy_collection();

    assert_ok!(storage.save(&tasks).await);
    let loaded = assert_ok!(storage.load().await);
    assert_eq!(loaded, tasks);

    // Save the loaded copy again: a second generation must be identical too.
    assert_ok!(storage.save(&loaded).await);
    assert_eq!(assert_ok!(storage.load().await), tasks);
}

#[tokio::test]
async fn persistence_preserves_block_ids_verbatim() {
    let dir = TempDir::new().expect("temp dir");
    let storage = TaskStorage::new(dir.path().join("tasks.json"));
    let tasks = busy_collection();

    let nested_id = tasks[0].blocks[1].children()[1].children()[0].id();
    assert_ok!(storage.save(&tasks).await);

    let loaded = assert_ok!(storage.load().await);
    let found = loaded[0]
        .find_block(nested_id)
        .expect("nested block survives with its id");
    assert_eq!(found.id(), nested_id);
    assert_eq!(found.kind(), "tap");
}

#[tokio::test]
async fn persistence_reads_hand_written_documents() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("tasks.json");

    // The shape an older build (or a curious user) may have written: null
    // region, absent iteration count, reversed region corners.
    let document = r#"[
      {
        "id": 1771234567890,
        "name": "Legacy Task",
        "created": "2026-02-16T08:56:07.890Z",
        "blocks": [
          { "type": "tap", "id": "11111111-1111-1111-1111-111111111111", "region": null },
          {
            "type": "loop",
            "id": "22222222-2222-2222-2222-222222222222",
            "blocks": [
              {
                "type": "tap",
                "id": "33333333-3333-3333-3333-333333333333",
                "region": { "x1": 50.0, "y1": 60.0, "x2": 10.0, "y2": 20.0 }
              }
            ]
          },
          { "type": "function", "id": "44444444-4444-4444-4444-444444444444", "blocks": [] }
        ]
      }
    ]"#;
    std::fs::write(&path, document).expect("seed document");

    let storage = TaskStorage::new(&path);
    let loaded = storage.load().await.expect("load");
    assert_eq!(loaded.len(), 1);

    let task = &loaded[0];
    assert_eq!(task.id, TaskId(1_771_234_567_890));
    assert_eq!(task.name, "Legacy Task");
    assert_eq!(task.blocks.len(), 3);

    // Null region reads as unconfigured.
    assert_eq!(task.blocks[0].region(), None);
    assert_eq!(
        task.blocks[0].id().to_string(),
        "11111111-1111-1111-1111-111111111111"
    );

    // Absent iteration count runs once; stored corners stay reversed.
    assert_eq!(task.blocks[1].effective_iterations(), 1);
    let region = task.blocks[1].children()[0].region().expect("nested region");
    assert_eq!(region.x1, 50.0);
    assert_eq!(region.x2, 10.0);
    assert_eq!(region.min_x(), 10.0);

    assert!(task.blocks[2].children().is_empty());
}

#[tokio::test]
async fn persistence_document_shape_stays_stable() {
    let dir = TempDir::new().expect("temp dir");
    let storage = TaskStorage::new(dir.path().join("tasks.json"));
    storage.save(&busy_collection()).await.expect("save");

    let raw = std::fs::read_to_string(storage.path()).expect("read raw");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");

    let task = &value[0];
    for key in ["id", "name", "blocks", "created"] {
        assert!(task.get(key).is_some(), "task document missing '{key}'");
    }
    assert!(task["created"].is_string());

    assert_eq!(task["blocks"][0]["type"], "tap");
    assert_eq!(task["blocks"][1]["type"], "loop");
    assert_eq!(task["blocks"][1]["iterations"], 5);
    assert_eq!(task["blocks"][1]["blocks"][1]["type"], "function");

    // Unconfigured taps carry no region key at all.
    let bare_tap = &task["blocks"][1]["blocks"][1]["blocks"][0];
    assert_eq!(bare_tap["type"], "tap");
    assert!(bare_tap.get("region").is_none());
}
