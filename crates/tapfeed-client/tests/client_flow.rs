//! End-to-end client flows over the in-memory transport.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tapfeed_client::{
    shutdown_pair, ClientConfig, ConnectionState, FeedClient, MemoryTransport, TransportEvent,
};
use tapfeed_core::{CardEvent, CardId, GroupChange, GroupConfig, GroupDefinition, GroupId, ReaderId};
use tokio::time::timeout;

fn message(payload: &str) -> TransportEvent {
    TransportEvent::Message(payload.to_string())
}

fn collector() -> (
    Arc<Mutex<Vec<CardEvent>>>,
    impl FnMut(CardEvent) + Send + 'static,
) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    (events, move |event| sink.lock().unwrap().push(event))
}

async fn wait_for_events(events: &Arc<Mutex<Vec<CardEvent>>>, count: usize) {
    timeout(Duration::from_secs(5), async {
        loop {
            if events.lock().unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("expected events were never emitted");
}

#[tokio::test(start_paused = true)]
async fn delivers_events_in_order_and_skips_malformed() {
    let transport = MemoryTransport::new(vec![vec![
        message(r#"{"reader": "R1", "card": "C1"}"#),
        message("certainly not json"),
        message(r#"{"reader": "R1", "card": ""}"#),
        TransportEvent::Closed,
    ]]);
    let (events, callback) = collector();
    let mut client = FeedClient::with_transport(
        ClientConfig::testing(),
        None,
        Box::new(transport),
        callback,
    )
    .unwrap();

    let (handle, shutdown) = shutdown_pair();
    let run = tokio::spawn(async move {
        client.run(shutdown).await;
        client
    });

    wait_for_events(&events, 2).await;
    handle.shutdown();
    let client = run.await.unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2, "the malformed payload must be dropped");
    assert_eq!(events[0].reader, ReaderId::from("R1"));
    assert_eq!(events[0].id, Some(CardId::from("C1")));
    assert_eq!(events[0].previous_id, None);
    assert_eq!(events[1].id, None);
    assert_eq!(events[1].previous_id, Some(CardId::from("C1")));
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn reconnects_after_close_and_keeps_processing() {
    let transport = MemoryTransport::new(vec![
        vec![
            message(r#"{"reader": "R1", "card": "C1"}"#),
            TransportEvent::Error("wire glitch".to_string()),
            TransportEvent::Closed,
        ],
        vec![
            message(r#"{"reader": "R2", "card": "C2"}"#),
            TransportEvent::Closed,
        ],
    ]);
    let connects = transport.connect_count();
    let (events, callback) = collector();
    let mut client = FeedClient::with_transport(
        ClientConfig::testing(),
        None,
        Box::new(transport),
        callback,
    )
    .unwrap();

    let (handle, shutdown) = shutdown_pair();
    let run = tokio::spawn(async move {
        client.run(shutdown).await;
        client
    });

    wait_for_events(&events, 2).await;
    handle.shutdown();
    let client = run.await.unwrap();

    assert!(connects.load(Ordering::SeqCst) >= 2);
    let events = events.lock().unwrap();
    assert_eq!(events[0].reader, ReaderId::from("R1"));
    assert_eq!(events[1].reader, ReaderId::from("R2"));
    // State accumulated across reconnects: both readers are known.
    assert_eq!(client.readers().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_an_open_connection() {
    // A connection that never says anything: the client sits in Open until
    // the host flips the shutdown flag.
    let transport = MemoryTransport::new(vec![vec![]]);
    let (_events, callback) = collector();
    let mut client = FeedClient::with_transport(
        ClientConfig::testing(),
        None,
        Box::new(transport),
        callback,
    )
    .unwrap();

    let (handle, shutdown) = shutdown_pair();
    let run = tokio::spawn(async move {
        client.run(shutdown).await;
        client
    });

    tokio::time::sleep(Duration::from_millis(5)).await;
    handle.shutdown();
    let client = timeout(Duration::from_secs(5), run)
        .await
        .expect("run did not stop on shutdown")
        .unwrap();

    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn exclusive_groups_resolve_across_the_feed() {
    let mut groups = GroupConfig::new();
    groups.insert(
        GroupId::from("gate-A"),
        GroupDefinition::Sequence(vec![CardId::from("C1"), CardId::from("C2")]),
    );

    let transport = MemoryTransport::new(vec![vec![
        message(r#"{"reader": "R1", "card": "C1"}"#),
        message(r#"{"reader": "R1", "card": ""}"#),
        message(r#"{"reader": "R2", "card": "C2"}"#),
        message(r#"{"reader": "R3", "card": "C9"}"#),
        TransportEvent::Closed,
    ]]);
    let (events, callback) = collector();
    let mut client = FeedClient::with_transport(
        ClientConfig::testing(),
        Some(groups),
        Box::new(transport),
        callback,
    )
    .unwrap();

    let (handle, shutdown) = shutdown_pair();
    let run = tokio::spawn(async move {
        client.run(shutdown).await;
        client
    });

    wait_for_events(&events, 4).await;
    handle.shutdown();
    run.await.unwrap();

    let events = events.lock().unwrap();
    let gate = GroupId::from("gate-A");

    // R1 presents C1: the group is claimed at index 0 / value 0.
    let claimed = &events[0].exclusive_state[&gate];
    assert!(!events[0].not_exclusive);
    assert_eq!(claimed.reader, Some(ReaderId::from("R1")));
    assert_eq!(claimed.id, Some(CardId::from("C1")));
    assert_eq!(claimed.changed, GroupChange::New);
    assert_eq!(claimed.index, Some(0));
    assert_eq!(claimed.value, Some(serde_json::json!(0)));

    // R1 removes the card: the group is released.
    let released = &events[1].exclusive_state[&gate];
    assert_eq!(events[1].previous_id, Some(CardId::from("C1")));
    assert_eq!(released.reader, None);
    assert_eq!(released.id, None);
    assert_eq!(released.changed, GroupChange::Removed);
    assert_eq!(released.index, None);

    // R2 presents the sibling card: claimed again, no residual removal.
    let reclaimed = &events[2].exclusive_state[&gate];
    assert_eq!(reclaimed.reader, Some(ReaderId::from("R2")));
    assert_eq!(reclaimed.id, Some(CardId::from("C2")));
    assert_eq!(reclaimed.changed, GroupChange::New);
    assert_eq!(reclaimed.index, Some(1));

    // R3 presents a card outside every group.
    let untouched = &events[3].exclusive_state[&gate];
    assert!(events[3].not_exclusive);
    assert_eq!(untouched.changed, GroupChange::Unchanged);
    assert_eq!(untouched.reader, Some(ReaderId::from("R2")));
}
