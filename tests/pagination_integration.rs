use std::sync::Arc;
use std::time::Duration;

use rust_photo_gallery::events::{BatchRendered, LoadMore, TriggerSource, ViewEvent};
use rust_photo_gallery::feed::{FeedRequest, GalleryFeed};
use rust_photo_gallery::pagination::{CuratedPages, NO_SEARCH_TERM, PaginationController, SearchPages};
use rust_photo_gallery::photo::ImageSize;
use rust_photo_gallery::tasks::pagination;
use rust_photo_gallery::testkit::{StubApi, image_url_for};
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

async fn next_event(rx: &mut mpsc::UnboundedReceiver<ViewEvent>) -> ViewEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timeout waiting for ViewEvent")
        .expect("channel closed")
}

/// Events up to and including the next `HideLoading`.
async fn batch(rx: &mut mpsc::UnboundedReceiver<ViewEvent>) -> Vec<ViewEvent> {
    let mut out = Vec::new();
    loop {
        let event = next_event(rx).await;
        let done = event == ViewEvent::HideLoading;
        out.push(event);
        if done {
            return out;
        }
    }
}

fn urls(events: &[ViewEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            ViewEvent::AppendPhoto { image_url, .. } => Some(image_url.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn triggers_during_a_fetch_are_dropped() {
    let gate = Arc::new(Semaphore::new(0));
    let feed = Arc::new(GalleryFeed::new(
        StubApi::new()
            .with_page(1..=12)
            .with_page(10..=21)
            .gated(gate.clone()),
        ImageSize::Large2x,
    ));
    let (trigger_tx, trigger_rx) = mpsc::channel::<LoadMore>(8);
    let (rendered_tx, rendered_rx) = mpsc::unbounded_channel::<BatchRendered>();
    let (view_tx, mut view_rx) = mpsc::unbounded_channel::<ViewEvent>();
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(pagination::run(
        PaginationController::new(CuratedPages, 12),
        feed.clone(),
        None::<String>,
        trigger_rx,
        rendered_rx,
        view_tx,
        cancel.clone(),
    ));

    trigger_tx.send(LoadMore::new(TriggerSource::Initial)).await.unwrap();
    assert_eq!(next_event(&mut view_rx).await, ViewEvent::ShowLoading);

    let sends = (0..5).map(|_| trigger_tx.send(LoadMore::new(TriggerSource::Scroll)));
    for sent in futures::future::join_all(sends).await {
        sent.unwrap();
    }
    // give the task time to see (and drop) every trigger
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(feed.api().calls(), 1);

    gate.add_permits(1);
    let first = batch(&mut view_rx).await;
    assert_eq!(first.len(), 12 + 1);
    assert_eq!(urls(&first), (1..=12).map(image_url_for).collect::<Vec<_>>());
    assert_eq!(feed.api().calls(), 1);

    // batch acknowledged: the next trigger fetches page 2, overlapping ids skipped
    rendered_tx.send(BatchRendered).unwrap();
    trigger_tx.send(LoadMore::new(TriggerSource::Scroll)).await.unwrap();
    assert_eq!(next_event(&mut view_rx).await, ViewEvent::ShowLoading);
    gate.add_permits(1);
    let second = batch(&mut view_rx).await;
    assert_eq!(urls(&second), (13..=21).map(image_url_for).collect::<Vec<_>>());

    assert_eq!(
        feed.api().requests(),
        vec![
            FeedRequest::Curated { page: 1, per_page: 12 },
            FeedRequest::Curated { page: 2, per_page: 12 },
        ]
    );

    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn task_exits_when_triggers_close() {
    let feed = Arc::new(GalleryFeed::new(StubApi::new().with_page([1, 2]), ImageSize::Large2x));
    let (trigger_tx, trigger_rx) = mpsc::channel::<LoadMore>(1);
    let (_rendered_tx, rendered_rx) = mpsc::unbounded_channel::<BatchRendered>();
    let (view_tx, mut view_rx) = mpsc::unbounded_channel::<ViewEvent>();

    let handle = tokio::spawn(pagination::run(
        PaginationController::new(CuratedPages, 12),
        feed,
        None::<String>,
        trigger_rx,
        rendered_rx,
        view_tx,
        CancellationToken::new(),
    ));

    trigger_tx.send(LoadMore::new(TriggerSource::Initial)).await.unwrap();
    drop(trigger_tx);

    // the in-flight page still settles before the task stops
    let events = batch(&mut view_rx).await;
    assert_eq!(urls(&events).len(), 2);
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("pagination task did not exit")
        .unwrap()
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn search_without_term_shows_curated_photos_and_a_notice() {
    let feed = Arc::new(GalleryFeed::new(StubApi::new().with_page([7, 8]), ImageSize::Large2x));
    let (trigger_tx, trigger_rx) = mpsc::channel::<LoadMore>(1);
    let (_rendered_tx, rendered_rx) = mpsc::unbounded_channel::<BatchRendered>();
    let (view_tx, mut view_rx) = mpsc::unbounded_channel::<ViewEvent>();
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(pagination::run(
        PaginationController::new(SearchPages, 12),
        feed.clone(),
        Some("   ".to_owned()),
        trigger_rx,
        rendered_rx,
        view_tx,
        cancel.clone(),
    ));

    trigger_tx.send(LoadMore::new(TriggerSource::Search)).await.unwrap();
    let events = batch(&mut view_rx).await;

    assert_eq!(events.first(), Some(&ViewEvent::ShowLoading));
    assert!(events.contains(&ViewEvent::Notice(NO_SEARCH_TERM.to_owned())));
    assert_eq!(urls(&events), vec![image_url_for(7), image_url_for(8)]);
    // search results carry no caption
    assert!(events.iter().all(|e| !matches!(
        e,
        ViewEvent::AppendPhoto { photographer: Some(_), .. }
    )));
    assert_eq!(
        feed.api().requests(),
        vec![FeedRequest::Curated { page: 1, per_page: 12 }]
    );

    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn trigger_before_the_render_ack_is_dropped() {
    let feed = Arc::new(GalleryFeed::new(
        StubApi::new()
            .with_page(1..=6)
            .with_page(7..=12)
            .with_page(13..=18),
        ImageSize::Large2x,
    ));
    let (trigger_tx, trigger_rx) = mpsc::channel::<LoadMore>(1);
    let (rendered_tx, rendered_rx) = mpsc::unbounded_channel::<BatchRendered>();
    let (view_tx, mut view_rx) = mpsc::unbounded_channel::<ViewEvent>();
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(pagination::run(
        PaginationController::new(CuratedPages, 6),
        feed.clone(),
        None::<String>,
        trigger_rx,
        rendered_rx,
        view_tx,
        cancel.clone(),
    ));

    trigger_tx.send(LoadMore::new(TriggerSource::Initial)).await.unwrap();
    batch(&mut view_rx).await;
    rendered_tx.send(BatchRendered).unwrap();

    trigger_tx.send(LoadMore::new(TriggerSource::Scroll)).await.unwrap();
    let second = batch(&mut view_rx).await;
    assert_eq!(urls(&second), (7..=12).map(image_url_for).collect::<Vec<_>>());

    // page 2 is settled but the viewer has not rendered it yet
    trigger_tx.send(LoadMore::new(TriggerSource::Scroll)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(feed.api().calls(), 2);
    assert!(view_rx.try_recv().is_err(), "no spinner for a dropped trigger");

    rendered_tx.send(BatchRendered).unwrap();
    trigger_tx.send(LoadMore::new(TriggerSource::Scroll)).await.unwrap();
    assert_eq!(next_event(&mut view_rx).await, ViewEvent::ShowLoading);
    let third = batch(&mut view_rx).await;
    assert_eq!(urls(&third), (13..=18).map(image_url_for).collect::<Vec<_>>());

    assert_eq!(
        feed.api().requests(),
        vec![
            FeedRequest::Curated { page: 1, per_page: 6 },
            FeedRequest::Curated { page: 2, per_page: 6 },
            FeedRequest::Curated { page: 3, per_page: 6 },
        ]
    );

    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn closed_ack_channel_releases_after_each_page() {
    let feed = Arc::new(GalleryFeed::new(
        StubApi::new().with_page([1, 2]).with_page([3, 4]),
        ImageSize::Large2x,
    ));
    let (trigger_tx, trigger_rx) = mpsc::channel::<LoadMore>(1);
    let (rendered_tx, rendered_rx) = mpsc::unbounded_channel::<BatchRendered>();
    let (view_tx, mut view_rx) = mpsc::unbounded_channel::<ViewEvent>();
    let cancel = CancellationToken::new();
    drop(rendered_tx);

    let handle = tokio::spawn(pagination::run(
        PaginationController::new(CuratedPages, 2),
        feed.clone(),
        None::<String>,
        trigger_rx,
        rendered_rx,
        view_tx,
        cancel.clone(),
    ));

    trigger_tx.send(LoadMore::new(TriggerSource::Initial)).await.unwrap();
    assert_eq!(urls(&batch(&mut view_rx).await).len(), 2);
    // give the task time to notice the closed ack channel
    tokio::time::sleep(Duration::from_millis(100)).await;
    trigger_tx.send(LoadMore::new(TriggerSource::Scroll)).await.unwrap();
    assert_eq!(
        urls(&batch(&mut view_rx).await),
        vec![image_url_for(3), image_url_for(4)]
    );

    cancel.cancel();
    handle.await.unwrap().unwrap();
}
