//! End-to-end tests of the fetch orchestration against a mocked store node.

use std::{sync::Arc, time::Duration};

use beecast_feed::{FeedIndex, Topic};
use beecast_hls::{
    manifest::segment_entries, ManifestStore, ManifestSync, SyncError, SyncEvent, SyncOptions,
};
use beecast_net::{mock::NetMock, Headers};
use bytes::Bytes;
use unimock::{matching, MockFn, Unimock};

const OWNER: &str = "8d3766440f0d7b949a5e32995d09619a7f86e632";

const SNAPSHOT_AB: &str = "#EXTM3U\n#EXTINF:4.0,\nseg0.ts\n#EXTINF:4.0,\nseg1.ts";
const SNAPSHOT_ABC: &str =
    "#EXTM3U\n#EXTINF:4.0,\nseg0.ts\n#EXTINF:4.0,\nseg1.ts\n#EXTINF:4.0,\nseg2.ts";

fn topic_hex() -> String {
    "ab".repeat(32)
}

fn stream_url() -> String {
    format!("{OWNER}/{}", topic_hex())
}

fn topic() -> Topic {
    Topic::from_hex(&topic_hex()).unwrap()
}

fn index_headers(hex: &str) -> Headers {
    let mut headers = Headers::new();
    headers.insert("swarm-feed-index", hex);
    headers
}

fn sync_with(mock: &Unimock) -> (ManifestSync<Unimock>, Arc<ManifestStore>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let store = Arc::new(ManifestStore::new());
    let sync = ManifestSync::new(mock.clone(), SyncOptions::default(), Arc::clone(&store));
    (sync, store)
}

/// Poll until the background continuation has been applied.
async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("background merge did not complete in time");
}

#[tokio::test]
async fn initial_fetch_resolves_latest_snapshot() {
    let mock = Unimock::new(
        NetMock::get_with_headers
            .some_call(matching!((url, _) if url.path().starts_with("/feeds/")))
            .returns(Ok((
                Bytes::from_static(SNAPSHOT_AB.as_bytes()),
                index_headers("0000000000000005"),
            ))),
    );
    let (sync, store) = sync_with(&mock);

    let body = sync.fetch(&stream_url()).await.unwrap();

    assert_eq!(body, SNAPSHOT_AB);
    assert_eq!(store.manifest(&topic()), SNAPSHOT_AB);
    assert_eq!(store.index(&topic()), Some(FeedIndex::new(5)));
}

#[tokio::test]
async fn initial_fetch_requires_index_header() {
    let mock = Unimock::new(
        NetMock::get_with_headers
            .some_call(matching!(_, _))
            .returns(Ok((Bytes::from_static(SNAPSHOT_AB.as_bytes()), Headers::new()))),
    );
    let (sync, store) = sync_with(&mock);

    let result = sync.fetch(&stream_url()).await;

    assert!(matches!(result, Err(SyncError::MissingFeedIndex)));
    // Nothing was recorded; the next call retries the initial path.
    assert_eq!(store.index(&topic()), None);
}

#[tokio::test]
async fn initial_fetch_propagates_fetch_failure() {
    let mock = Unimock::new(
        NetMock::get_with_headers
            .some_call(matching!(_, _))
            .returns(Err(beecast_net::NetError::Timeout)),
    );
    let (sync, _store) = sync_with(&mock);

    let result = sync.fetch(&stream_url()).await;

    assert!(matches!(result, Err(SyncError::Net(_))));
}

#[tokio::test]
async fn follow_up_returns_cached_then_applies_in_background() {
    let mock = Unimock::new((
        NetMock::get_with_headers
            .some_call(matching!((url, _) if url.path().starts_with("/feeds/")))
            .returns(Ok((
                Bytes::from_static(SNAPSHOT_AB.as_bytes()),
                index_headers("0000000000000005"),
            ))),
        NetMock::get_bytes
            .some_call(matching!((url, _) if url.path().starts_with("/soc/")))
            .returns(Ok(Bytes::from_static(SNAPSHOT_ABC.as_bytes()))),
    ));
    let (sync, store) = sync_with(&mock);

    let first = sync.fetch(&stream_url()).await.unwrap();
    assert_eq!(first, SNAPSHOT_AB);

    // The follow-up answer is the cached text, stale by one round-trip.
    let second = sync.fetch(&stream_url()).await.unwrap();
    assert_eq!(second, SNAPSHOT_AB);

    wait_until(|| segment_entries(&store.manifest(&topic())).len() == 3).await;

    // The accepted snapshot advanced the tracked index past the resolved one.
    assert_eq!(store.index(&topic()), Some(FeedIndex::new(6)));
    let merged = store.manifest(&topic());
    assert!(merged.contains("seg2.ts"));
}

#[tokio::test]
async fn follow_up_failure_keeps_serving_cached() {
    let mock = Unimock::new((
        NetMock::get_with_headers
            .some_call(matching!(_, _))
            .returns(Ok((
                Bytes::from_static(SNAPSHOT_AB.as_bytes()),
                index_headers("0000000000000005"),
            ))),
        NetMock::get_bytes
            .some_call(matching!(_, _))
            .returns(Err(beecast_net::NetError::Timeout)),
    ));
    let (sync, store) = sync_with(&mock);
    let mut events = sync.events();

    sync.fetch(&stream_url()).await.unwrap();
    let cached = sync.fetch(&stream_url()).await.unwrap();

    assert_eq!(cached, SNAPSHOT_AB);

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("no event before timeout")
        .unwrap();
    assert!(matches!(event, SyncEvent::FollowUpFailed { .. }));

    // State is untouched; the next poll interval simply retries.
    assert_eq!(store.manifest(&topic()), SNAPSHOT_AB);
    assert_eq!(store.index(&topic()), Some(FeedIndex::new(5)));
}

#[tokio::test]
async fn finalized_stream_stops_polling() {
    let final_body = format!("{SNAPSHOT_ABC}\n#EXT-X-ENDLIST");
    let mock = Unimock::new((
        NetMock::get_with_headers
            .some_call(matching!(_, _))
            .returns(Ok((
                Bytes::from_static(SNAPSHOT_AB.as_bytes()),
                index_headers("0000000000000005"),
            ))),
        // Exactly one poll: later fetches must not hit the network again.
        NetMock::get_bytes
            .some_call(matching!(_, _))
            .returns(Ok(Bytes::from(final_body.clone()))),
    ));
    let (sync, store) = sync_with(&mock);

    sync.fetch(&stream_url()).await.unwrap();
    sync.fetch(&stream_url()).await.unwrap();

    wait_until(|| store.manifest(&topic()).contains("#EXT-X-ENDLIST")).await;

    // Finalization suppressed the index advance.
    assert_eq!(store.index(&topic()), Some(FeedIndex::new(5)));

    // Terminal: both calls serve the final text without polling.
    assert_eq!(sync.fetch(&stream_url()).await.unwrap(), final_body);
    assert_eq!(sync.fetch(&stream_url()).await.unwrap(), final_body);
}

#[tokio::test]
async fn clear_allows_fresh_session_for_same_topic() {
    let mock = Unimock::new(
        NetMock::get_with_headers
            .each_call(matching!((url, _) if url.path().starts_with("/feeds/")))
            .returns(Ok((
                Bytes::from_static(SNAPSHOT_AB.as_bytes()),
                index_headers("0000000000000002"),
            ))),
    );
    let (sync, store) = sync_with(&mock);

    sync.fetch(&stream_url()).await.unwrap();
    assert_eq!(store.index(&topic()), Some(FeedIndex::new(2)));

    sync.clear(&topic());
    assert_eq!(store.manifest(&topic()), "");

    // The topic starts over on the initial path.
    let body = sync.fetch(&stream_url()).await.unwrap();
    assert_eq!(body, SNAPSHOT_AB);
    assert_eq!(store.index(&topic()), Some(FeedIndex::new(2)));
}

#[tokio::test]
async fn snapshot_applied_event_is_broadcast() {
    let mock = Unimock::new((
        NetMock::get_with_headers
            .some_call(matching!(_, _))
            .returns(Ok((
                Bytes::from_static(SNAPSHOT_AB.as_bytes()),
                index_headers("0000000000000000"),
            ))),
        NetMock::get_bytes
            .some_call(matching!(_, _))
            .returns(Ok(Bytes::from_static(SNAPSHOT_ABC.as_bytes()))),
    ));
    let (sync, _store) = sync_with(&mock);
    let mut events = sync.events();

    sync.fetch(&stream_url()).await.unwrap();

    // Initial snapshot counts as applied content.
    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("no event before timeout")
        .unwrap();
    assert!(
        matches!(event, SyncEvent::SnapshotApplied { segments_added, .. } if segments_added == 2)
    );

    sync.fetch(&stream_url()).await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("no event before timeout")
        .unwrap();
    assert!(
        matches!(event, SyncEvent::SnapshotApplied { segments_added, .. } if segments_added == 1)
    );
}

#[tokio::test]
async fn shutdown_stops_the_merge_worker() {
    let mock = Unimock::new(
        NetMock::get_with_headers
            .some_call(matching!(_, _))
            .returns(Ok((
                Bytes::from_static(SNAPSHOT_AB.as_bytes()),
                index_headers("0000000000000001"),
            ))),
    );
    let (sync, store) = sync_with(&mock);

    sync.fetch(&stream_url()).await.unwrap();
    sync.shutdown().await;

    // State survives shutdown until explicitly cleared.
    assert_eq!(store.manifest(&topic()), SNAPSHOT_AB);
}
