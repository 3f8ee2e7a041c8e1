//! Integration tests for refsync
//!
//! These tests wire the delta engine, store, protocol, and client together
//! and verify whole-system behavior against real directories.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use refsync_client::{SyncClient, SyncConfig};
use refsync_delta::{GreedyMatcher, Instruction, InstructionPlanner, Matcher, PlannerConfig, SourceMatch};
use refsync_protocol::{StoreRequest, StoreResponse};
use refsync_store::{ByteRangeStore, DirectTransport, StoreService};
use refsync_tests::test_utils::{generate_test_data, with_shared_middle, TestDataPattern};

struct SyncFixture {
    _dirs: TempDir,
    source: PathBuf,
    store: Arc<ByteRangeStore>,
}

async fn sync_fixture() -> SyncFixture {
    let dirs = TempDir::new().unwrap();
    let source = dirs.path().join("source");
    fs::create_dir(&source).unwrap();
    let store = Arc::new(
        ByteRangeStore::open(dirs.path().join("dest"))
            .await
            .unwrap(),
    );
    SyncFixture {
        _dirs: dirs,
        source,
        store,
    }
}

fn client_with(fixture: &SyncFixture, config: SyncConfig) -> SyncClient {
    SyncClient::with_config(
        &fixture.source,
        Arc::new(DirectTransport::new(Arc::clone(&fixture.store))),
        config,
    )
    .unwrap()
}

fn client(fixture: &SyncFixture) -> SyncClient {
    client_with(fixture, SyncConfig::default())
}

async fn assert_destination_matches(fixture: &SyncFixture, name: &str) {
    let source_bytes = fs::read(fixture.source.join(name)).unwrap();
    let dest_bytes = fixture.store.read(name).await.unwrap();
    assert_eq!(dest_bytes, source_bytes, "destination mismatch for {name}");
}

#[tokio::test]
async fn test_end_to_end_directory_sync() {
    let fixture = sync_fixture().await;
    let shared = generate_test_data(2048, TestDataPattern::Realistic);

    fs::write(fixture.source.join("a-base.txt"), &shared).unwrap();
    fs::write(
        fixture.source.join("b-overlapping.txt"),
        with_shared_middle(&shared, 128, 3),
    )
    .unwrap();
    fs::write(
        fixture.source.join("c-unrelated.bin"),
        generate_test_data(1024, TestDataPattern::Random),
    )
    .unwrap();

    let mut client = client(&fixture);
    let stats = client.check().await.unwrap();

    assert_eq!(stats.files_synced, 3);
    assert_eq!(stats.files_failed, 0);
    assert!(
        stats.copied_bytes >= 2048,
        "the shared region should have been deduplicated, copied {} bytes",
        stats.copied_bytes
    );
    for name in ["a-base.txt", "b-overlapping.txt", "c-unrelated.bin"] {
        assert_destination_matches(&fixture, name).await;
    }
}

#[tokio::test]
async fn test_worked_example_with_small_min_match() {
    let fixture = sync_fixture().await;
    fs::write(fixture.source.join("a-reference.txt"), b"0123456789XYZ0123").unwrap();
    fs::write(fixture.source.join("b-candidate.txt"), b"abcXYZdef").unwrap();

    let mut client = client_with(
        &fixture,
        SyncConfig {
            min_match_len: 3,
            ..Default::default()
        },
    );
    client
        .sync_file(&fixture.source.join("a-reference.txt"))
        .await
        .unwrap();
    let report = client
        .sync_file(&fixture.source.join("b-candidate.txt"))
        .await
        .unwrap();

    // "abc" and "def" travel literally, "XYZ" is copied out of the reference.
    assert_eq!(report.literal_bytes, 6);
    assert_eq!(report.copied_bytes, 3);
    assert_eq!(
        fixture.store.read("b-candidate.txt").await.unwrap(),
        b"abcXYZdef"
    );
}

#[tokio::test]
async fn test_short_overlaps_are_not_deduplicated() {
    let fixture = sync_fixture().await;
    let shared = generate_test_data(16, TestDataPattern::Random); // below the default 32

    fs::write(fixture.source.join("a.bin"), with_shared_middle(&shared, 256, 1)).unwrap();
    fs::write(fixture.source.join("b.bin"), with_shared_middle(&shared, 256, 9)).unwrap();

    let mut client = client(&fixture);
    let stats = client.check().await.unwrap();

    assert_eq!(stats.files_synced, 2);
    assert_eq!(stats.copied_bytes, 0);
    assert_destination_matches(&fixture, "b.bin").await;
}

#[tokio::test]
async fn test_reconstruction_chain_across_references() {
    // c duplicates b, which itself was partly reconstructed out of a; the
    // copy for c must read bytes b's reconstruction already persisted.
    let fixture = sync_fixture().await;
    let shared = generate_test_data(1024, TestDataPattern::Realistic);
    let b_content = with_shared_middle(&shared, 200, 17);

    fs::write(fixture.source.join("a.dat"), &shared).unwrap();
    fs::write(fixture.source.join("b.dat"), &b_content).unwrap();
    fs::write(fixture.source.join("c.dat"), &b_content).unwrap();

    let mut client = client(&fixture);
    let stats = client.check().await.unwrap();

    assert_eq!(stats.files_synced, 3);
    for name in ["a.dat", "b.dat", "c.dat"] {
        assert_destination_matches(&fixture, name).await;
    }
    // c is a full duplicate of an existing reference and transfers nothing
    // literal beyond what the planner could not cover.
    assert!(stats.copied_bytes > b_content.len() as u64);
}

#[tokio::test]
async fn test_stale_partial_destination_is_replaced() {
    let fixture = sync_fixture().await;
    let content = generate_test_data(512, TestDataPattern::Random);
    fs::write(fixture.source.join("wedged.bin"), &content).unwrap();

    // Simulate a crashed earlier attempt that left a corrupt prefix behind.
    fixture
        .store
        .append("wedged.bin", b"corrupt prefix from a dead attempt")
        .await
        .unwrap();

    let mut client = client(&fixture);
    client
        .sync_file(&fixture.source.join("wedged.bin"))
        .await
        .unwrap();

    assert_destination_matches(&fixture, "wedged.bin").await;
}

#[tokio::test]
async fn test_empty_file_syncs_to_empty_destination() {
    let fixture = sync_fixture().await;
    fs::write(fixture.source.join("empty.log"), b"").unwrap();

    let mut client = client(&fixture);
    let stats = client.check().await.unwrap();

    assert_eq!(stats.files_synced, 1);
    assert_eq!(fixture.store.len("empty.log").await.unwrap(), 0);
}

#[tokio::test]
async fn test_plan_carried_over_an_encoded_transport() {
    // Drive the store the way a remote deployment would: every instruction
    // becomes an encoded StoreRequest frame, decoded and dispatched by the
    // serving side.
    let dirs = TempDir::new().unwrap();
    let store = Arc::new(ByteRangeStore::open(dirs.path().join("dest")).await.unwrap());
    let service = StoreService::new(Arc::clone(&store));

    let reference = generate_test_data(4096, TestDataPattern::Realistic);
    let candidate = with_shared_middle(&reference[512..2048], 300, 5);

    // The reference file is already stored remotely.
    dispatch(
        &service,
        &StoreRequest::Append {
            name: "reference.bin".to_string(),
            data: reference.clone(),
        },
    )
    .await;

    let matches: Vec<SourceMatch> = GreedyMatcher::new()
        .find_matches(&candidate, &reference)
        .into_iter()
        .map(|range| SourceMatch::new("reference.bin", range))
        .collect();
    let plan = InstructionPlanner::new(PlannerConfig::default()).plan(candidate.len(), matches);

    dispatch(
        &service,
        &StoreRequest::Reset {
            name: "candidate.bin".to_string(),
        },
    )
    .await;
    for instruction in &plan {
        let request = match instruction {
            Instruction::Literal { start, len } => StoreRequest::Append {
                name: "candidate.bin".to_string(),
                data: candidate[*start as usize..(*start + *len) as usize].to_vec(),
            },
            Instruction::Reference {
                len,
                source,
                source_start,
                ..
            } => StoreRequest::CopyRange {
                name: "candidate.bin".to_string(),
                source: source.clone(),
                offset: *source_start,
                length: *len,
            },
        };
        dispatch(&service, &request).await;
    }

    assert_eq!(store.read("candidate.bin").await.unwrap(), candidate);
}

/// Encode, decode, and apply one request, asserting success.
async fn dispatch(service: &StoreService, request: &StoreRequest) {
    let frame = request.to_bytes().unwrap();
    let decoded = StoreRequest::from_bytes(&frame).unwrap();
    assert_eq!(&decoded, request);
    assert_eq!(service.handle(decoded).await, StoreResponse::Done);
}

#[tokio::test]
async fn test_concurrent_appends_to_distinct_files() {
    // Distinct destination files need no mutual ordering; the store must
    // keep each file internally consistent under concurrent writers.
    let dirs = TempDir::new().unwrap();
    let store = Arc::new(ByteRangeStore::open(dirs.path().join("dest")).await.unwrap());

    let tasks: Vec<_> = (0..8u8)
        .map(|i| {
            let store = Arc::clone(&store);
            async move {
                let name = format!("file-{i}.bin");
                for chunk in 0..4u8 {
                    store.append(&name, &[i; 64]).await.unwrap();
                    assert_eq!(store.len(&name).await.unwrap(), u64::from(chunk + 1) * 64);
                }
            }
        })
        .collect();
    futures::future::join_all(tasks).await;

    for i in 0..8u8 {
        let data = store.read(&format!("file-{i}.bin")).await.unwrap();
        assert_eq!(data, vec![i; 256]);
    }
}

#[tokio::test]
async fn test_watch_loop_picks_up_files_added_later() {
    let fixture = sync_fixture().await;
    fs::write(
        fixture.source.join("early.bin"),
        generate_test_data(256, TestDataPattern::Random),
    )
    .unwrap();

    let mut client = client_with(
        &fixture,
        SyncConfig {
            poll_interval: Duration::from_millis(10),
            ..Default::default()
        },
    );

    assert_eq!(client.check().await.unwrap().files_synced, 1);

    // A file that appears between passes is found by the next one.
    fs::write(
        fixture.source.join("late.bin"),
        generate_test_data(256, TestDataPattern::Random),
    )
    .unwrap();
    assert_eq!(client.check().await.unwrap().files_synced, 1);
    assert_destination_matches(&fixture, "late.bin").await;
}

#[tokio::test]
async fn test_out_of_range_copy_is_rejected_not_truncated() {
    let dirs = TempDir::new().unwrap();
    let store = Arc::new(ByteRangeStore::open(dirs.path().join("dest")).await.unwrap());
    store.append("short.bin", &[1u8; 16]).await.unwrap();

    let service = StoreService::new(Arc::clone(&store));
    let response = service
        .handle(StoreRequest::CopyRange {
            name: "out.bin".to_string(),
            source: "short.bin".to_string(),
            offset: 10,
            length: 10,
        })
        .await;

    assert!(matches!(response, StoreResponse::Failed { .. }));
    assert!(store.read("out.bin").await.is_err(), "no partial write");
}
