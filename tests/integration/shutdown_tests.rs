//! Stop-signal handling

use crate::support::{create_test_config, html, FakeWeb, GatedFetcher, RecordingSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use weir::crawler::{Coordinator, CrawlPhase, HtmlParser};

#[tokio::test]
async fn test_stop_lets_in_flight_target_finish() {
    let fetcher = Arc::new(GatedFetcher::new(
        FakeWeb::new()
            .page("https://a.example/", html("A", &["/x", "/y"]))
            .page("https://a.example/x", html("X", &[]))
            .page("https://a.example/y", html("Y", &[])),
    ));
    let sink = RecordingSink::new();

    let coordinator = Coordinator::new(
        create_test_config(&["https://a.example/"], 3, 1),
        fetcher.clone(),
        Arc::new(HtmlParser::new()),
        sink.clone(),
    );
    let mut phases = coordinator.phases();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let driver = async {
        fetcher.started.notified().await;
        stop_tx.send(()).unwrap();
        phases
            .wait_for(|phase| *phase == CrawlPhase::Draining)
            .await
            .unwrap();
        fetcher.release.notify_one();
    };
    let crawl = coordinator.run_until(async {
        let _ = stop_rx.await;
    });

    let (summary, ()) = tokio::time::timeout(Duration::from_secs(10), async {
        tokio::join!(crawl, driver)
    })
    .await
    .expect("crawl did not stop");

    assert!(summary.stopped);
    assert_eq!(sink.titles(), vec!["A"]);
    assert_eq!(summary.fetched, 1);
    assert_eq!(fetcher.calls("https://a.example/x"), 0);
    assert_eq!(fetcher.calls("https://a.example/y"), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_all_workers_joined_after_stop() {
    let urls: Vec<String> = (0..50)
        .map(|i| format!("https://a.example/{}", i))
        .collect();
    let links: Vec<&str> = urls.iter().map(String::as_str).collect();

    let mut web = FakeWeb::new();
    for (i, url) in urls.iter().enumerate() {
        web = web.page(url, html(&format!("Page {}", i), &links));
    }
    let fetcher = Arc::new(GatedFetcher::new(web));
    let sink = RecordingSink::new();

    let coordinator = Coordinator::new(
        create_test_config(&[urls[0].as_str()], 3, 4),
        fetcher.clone(),
        Arc::new(HtmlParser::new()),
        sink.clone(),
    );
    let token = coordinator.shutdown_token();
    let mut crawl = tokio::spawn(coordinator.run_until(std::future::pending()));

    // Let a handful of pages through, then stop with fetches parked
    for _ in 0..5 {
        fetcher.started.notified().await;
        fetcher.release.notify_one();
    }
    token.cancel();

    let summary = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            tokio::select! {
                joined = &mut crawl => break joined.unwrap(),
                _ = tokio::time::sleep(Duration::from_millis(10)) => {
                    fetcher.release.notify_waiters();
                }
            }
        }
    })
    .await
    .expect("crawl did not stop");

    assert!(summary.stopped);
    assert!(summary.fetched < urls.len() as u64);
    // Every worker has dropped its handle on the fetcher
    assert_eq!(Arc::strong_count(&fetcher), 1);
}

#[tokio::test]
async fn test_stop_unblocks_seeding_on_full_frontier() {
    let seeds: Vec<String> = (0..5).map(|i| format!("https://a.example/{}", i)).collect();
    let seed_refs: Vec<&str> = seeds.iter().map(String::as_str).collect();

    let mut web = FakeWeb::new();
    for (i, url) in seeds.iter().enumerate() {
        web = web.page(url, html(&format!("Seed {}", i), &[]));
    }
    let fetcher = Arc::new(GatedFetcher::new(web));
    let sink = RecordingSink::new();

    let mut config = create_test_config(&seed_refs, 1, 1);
    config.crawler.queue_capacity = 1;

    let coordinator = Coordinator::new(
        config,
        fetcher.clone(),
        Arc::new(HtmlParser::new()),
        sink.clone(),
    );
    let mut phases = coordinator.phases();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    // The only worker is parked in a fetch while seeding waits for queue space
    let driver = async {
        fetcher.started.notified().await;
        stop_tx.send(()).unwrap();
        phases
            .wait_for(|phase| *phase == CrawlPhase::Draining)
            .await
            .unwrap();
        fetcher.release.notify_one();
    };
    let crawl = coordinator.run_until(async {
        let _ = stop_rx.await;
    });

    let (summary, ()) = tokio::time::timeout(Duration::from_secs(10), async {
        tokio::join!(crawl, driver)
    })
    .await
    .expect("crawl did not stop");

    assert!(summary.stopped);
    assert_eq!(summary.persisted, 1);
    assert!(summary.admitted < seeds.len() as u64);
    assert_eq!(fetcher.calls("https://a.example/4"), 0);
}
