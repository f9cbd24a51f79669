use super::*;

#[tokio::test]
async fn test_deadline_stops_stuck_worker_without_affecting_others() {
    let transport = Arc::new(MockTransport::new());
    transport
        .links("slow", &["s1"])
        .delay(Endpoint::Link, "slow", Duration::from_secs(30))
        .links("fast", &["f1"])
        .dataset("f1", "1");
    let config = Config {
        worker_deadline: Some(Duration::from_millis(100)),
        ..mock_config()
    };
    let harvester = mock_harvester(&transport, config);

    let harvest = tokio::time::timeout(
        Duration::from_secs(5),
        harvester.harvest(&ids(&["slow", "fast"])),
    )
    .await
    .expect("deadline should end the slow worker");

    assert!(harvest.ranges.get(0).unwrap().is_empty());
    assert_eq!(dependents_of(&harvest, 1), vec!["f1"]);
    assert!(!harvester.cancellation_token().is_cancelled());
}

#[tokio::test]
async fn test_deadline_keeps_records_gathered_so_far() {
    let transport = Arc::new(MockTransport::new());
    transport
        .links("A", &["x1", "x2", "x3"])
        .dataset("x1", "1")
        .dataset("x2", "2")
        .delay(Endpoint::Summary, "x2", Duration::from_secs(30))
        .dataset("x3", "3");
    let config = Config {
        worker_deadline: Some(Duration::from_millis(200)),
        ..mock_config()
    };
    let harvester = mock_harvester(&transport, config);
    let mut rx = harvester.subscribe();

    let harvest = harvester.harvest(&ids(&["A"])).await;

    assert_eq!(dependents_of(&harvest, 0), vec!["x1"]);
    assert_eq!(transport.calls(Endpoint::Summary, "x3"), 0);

    let mut finished = None;
    while let Ok(event) = rx.try_recv() {
        if let Event::WorkerFinished { cancelled, success_count, .. } = event {
            finished = Some((cancelled, success_count));
        }
    }
    assert_eq!(finished, Some((true, 1)));
}

#[tokio::test]
async fn test_cancel_ends_run_with_complete_results() {
    let transport = Arc::new(MockTransport::new());
    for name in ["A", "B", "C"] {
        transport
            .links(name, &["x"])
            .delay(Endpoint::Link, name, Duration::from_secs(30));
    }
    let harvester = mock_harvester(&transport, mock_config());

    let canceller = {
        let harvester = harvester.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            harvester.cancel();
        })
    };

    let harvest = tokio::time::timeout(
        Duration::from_secs(5),
        harvester.harvest(&ids(&["A", "B", "C"])),
    )
    .await
    .expect("cancel should end the run");
    canceller.await.unwrap();

    assert_eq!(harvest.ranges.len(), 3);
    assert!(harvest.records.is_empty());
}

#[tokio::test]
async fn test_cancelled_harvester_issues_no_lookups() {
    let transport = Arc::new(MockTransport::new());
    transport.links("A", &["x1"]).dataset("x1", "1");
    let harvester = mock_harvester(&transport, mock_config());
    harvester.cancel();

    let results = harvester.collect(&ids(&["A", "B"])).await;

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.records.is_empty()));
    assert!(transport.urls().is_empty());
}

#[tokio::test]
async fn test_dropping_harvest_stops_its_workers() {
    let transport = Arc::new(MockTransport::new());
    transport.script(Endpoint::Link, "A", vec![Scripted::status(429)]);
    let harvester = mock_harvester(&transport, mock_config());

    let outcome =
        tokio::time::timeout(Duration::from_millis(50), harvester.harvest(&ids(&["A"]))).await;
    assert!(outcome.is_err(), "an always-throttled lookup never finishes");

    // Let the worker observe cancellation, then make sure it stays quiet
    tokio::time::sleep(Duration::from_millis(20)).await;
    let settled = transport.calls(Endpoint::Link, "A");
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(settled > 0);
    assert_eq!(transport.calls(Endpoint::Link, "A"), settled, "worker kept calling");
    assert!(
        !harvester.cancellation_token().is_cancelled(),
        "dropping one run must not cancel the harvester"
    );
}
