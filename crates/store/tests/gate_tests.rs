use keypoint_core::{AppError, BookSummary, Chapter, Duration};
use keypoint_store::{
    reduce_gate, GateAction, GateEffect, GateNotice, GateSession, GateSettings, GateState,
    InMemoryStore, Product, FETCH_ERROR_MESSAGE,
};
use std::sync::Arc;
use std::time::Duration as StdDuration;

const PREMIUM: &str = "com.keypoint.subscription";

fn book() -> BookSummary {
    BookSummary::new(
        "Deep Work",
        "cover",
        vec![Chapter::new("Rule 1", "summary_0", Duration::from_seconds(180))],
        PREMIUM,
    )
}

fn product() -> Product {
    Product::new(PREMIUM, "Keypoint Premium", "$9.99")
}

fn store() -> InMemoryStore {
    InMemoryStore::new().with_product(product())
}

async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if check() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}

#[test]
fn test_repeated_entitlement_dismisses_paywall_once() {
    let mut state = GateState::new(book());
    reduce_gate(&mut state, GateAction::Appeared);
    reduce_gate(&mut state, GateAction::GotProduct(product()));
    reduce_gate(&mut state, GateAction::FinishedLoading);
    assert!(state.paywall().is_some());

    let first = reduce_gate(&mut state, GateAction::ActiveEntitlement(PREMIUM.to_string()));
    let second = reduce_gate(&mut state, GateAction::ActiveEntitlement(PREMIUM.to_string()));

    assert_eq!(first, vec![GateEffect::PaywallDismissed]);
    assert!(second.is_empty());
    assert!(state.paywall().is_none());
    assert!(state.is_unlocked());
}

#[tokio::test]
async fn test_entitled_user_goes_straight_to_player() {
    let store = Arc::new(store().with_active(PREMIUM));
    let (session, handle, mut notices) = GateSession::new(book(), store, GateSettings::default());
    let task = tokio::spawn(session.run());

    assert_eq!(notices.recv().await, Some(GateNotice::PlayerReady));
    let state = handle.state();
    assert!(state.is_entitled());
    assert!(state.paywall().is_none());
    assert!(state.is_unlocked());

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_purchase_dismisses_paywall() {
    let store = Arc::new(store());
    let (session, handle, mut notices) =
        GateSession::new(book(), store.clone(), GateSettings::default());
    let task = tokio::spawn(session.run());

    assert_eq!(notices.recv().await, Some(GateNotice::PlayerReady));
    assert_eq!(
        handle.state().paywall().map(|p| p.product.clone()),
        Some(product())
    );

    handle.purchase().await.unwrap();
    assert_eq!(notices.recv().await, Some(GateNotice::PaywallDismissed));
    assert!(store.is_active(PREMIUM));

    // A later restore of the same product changes nothing
    store.grant(PREMIUM).unwrap();
    handle.shutdown().await.unwrap();
    let state = task.await.unwrap();
    assert!(state.is_unlocked());
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn test_purchase_from_elsewhere_dismisses_paywall() {
    let store = Arc::new(store());
    let (session, handle, mut notices) =
        GateSession::new(book(), store.clone(), GateSettings::default());
    tokio::spawn(session.run());

    assert_eq!(notices.recv().await, Some(GateNotice::PlayerReady));
    store.grant(PREMIUM).unwrap();

    assert_eq!(notices.recv().await, Some(GateNotice::PaywallDismissed));
    let mut state = handle.subscribe();
    eventually(|| state.borrow_and_update().is_unlocked()).await;
}

#[tokio::test]
async fn test_fetch_failure_then_retry() {
    let store = Arc::new(store());
    store.fail_next_fetches(1);
    let (session, handle, mut notices) =
        GateSession::new(book(), store.clone(), GateSettings::default());
    tokio::spawn(session.run());

    let notice = notices.recv().await;
    assert!(matches!(
        notice,
        Some(GateNotice::Error(AppError::EntitlementFetch { .. }))
    ));
    let state = handle.state();
    assert_eq!(state.error_message(), Some(FETCH_ERROR_MESSAGE));
    assert!(!state.is_loading());
    assert!(!state.is_player_ready());

    handle.retry().await.unwrap();
    assert_eq!(notices.recv().await, Some(GateNotice::PlayerReady));
    let state = handle.state();
    assert_eq!(state.error_message(), None);
    assert!(state.paywall().is_some());
}

#[tokio::test]
async fn test_listener_survives_fetch_failure() {
    let store = Arc::new(store());
    store.fail_next_fetches(1);
    let (session, handle, mut notices) =
        GateSession::new(book(), store.clone(), GateSettings::default());
    tokio::spawn(session.run());

    assert!(matches!(notices.recv().await, Some(GateNotice::Error(_))));
    store.grant(PREMIUM).unwrap();

    let mut state = handle.subscribe();
    eventually(|| state.borrow_and_update().is_entitled()).await;
}

#[tokio::test(start_paused = true)]
async fn test_slow_store_times_out() {
    let store = Arc::new(store().with_latency(StdDuration::from_secs(30)));
    let settings = GateSettings {
        fetch_timeout: StdDuration::from_secs(5),
    };
    let (session, handle, mut notices) = GateSession::new(book(), store, settings);
    tokio::spawn(session.run());

    match notices.recv().await {
        Some(GateNotice::Error(AppError::EntitlementFetch { message })) => {
            assert!(message.contains("timed out"));
        }
        other => panic!("unexpected notice {:?}", other),
    }
    assert_eq!(handle.state().error_message(), Some(FETCH_ERROR_MESSAGE));
}

#[tokio::test]
async fn test_shutdown_detaches_listener() {
    let store = Arc::new(store());
    let (session, handle, mut notices) =
        GateSession::new(book(), store.clone(), GateSettings::default());
    let task = tokio::spawn(session.run());

    assert_eq!(notices.recv().await, Some(GateNotice::PlayerReady));
    assert_eq!(store.subscriber_count(), 1);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
    eventually(|| store.subscriber_count() == 0).await;
    assert!(handle.retry().await.is_err());
}
