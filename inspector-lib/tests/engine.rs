// inspector-lib/tests/engine.rs

//! Probe engine behaviour against an instrumented in-memory transport.

use async_trait::async_trait;
use futures::StreamExt;
use inspector_lib::{
    Catalogue, MatchRule, PlatformGroup, PlatformTemplate, ProbeConfig, ProbeEngine, ProbeError,
    ProbeOutcome, ProbeResponse, ProbeResult, ProbeTarget, Transport,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
enum Behaviour {
    Status(u16),
    Fail,
    Hang,
    Panic,
}

#[derive(Default)]
struct Stats {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

/// Decrements the in-flight counter even when the request future is dropped.
struct InFlightGuard(Arc<Stats>);

impl InFlightGuard {
    fn enter(stats: &Arc<Stats>) -> Self {
        let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stats.peak.fetch_max(now, Ordering::SeqCst);
        stats.calls.fetch_add(1, Ordering::SeqCst);
        Self(stats.clone())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

struct FakeTransport {
    routes: HashMap<String, Behaviour>,
    fallback: Behaviour,
    delay: Duration,
    stats: Arc<Stats>,
}

impl FakeTransport {
    fn new(fallback: Behaviour) -> Self {
        Self {
            routes: HashMap::new(),
            fallback,
            delay: Duration::from_millis(5),
            stats: Arc::new(Stats::default()),
        }
    }

    fn route(mut self, url: &str, behaviour: Behaviour) -> Self {
        self.routes.insert(url.to_string(), behaviour);
        self
    }

    fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn stats(&self) -> Arc<Stats> {
        self.stats.clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str) -> Result<ProbeResponse, ProbeError> {
        let _guard = InFlightGuard::enter(&self.stats);
        tokio::time::sleep(self.delay).await;

        match self.routes.get(url).copied().unwrap_or(self.fallback) {
            Behaviour::Status(status) => Ok(ProbeResponse::new(status)),
            Behaviour::Fail => Err(ProbeError::network(url, "connection refused")),
            Behaviour::Hang => std::future::pending().await,
            Behaviour::Panic => panic!("transport blew up for {url}"),
        }
    }
}

fn targets(count: usize) -> Vec<ProbeTarget> {
    (0..count)
        .map(|i| {
            ProbeTarget::new(
                format!("Platform{i}"),
                format!("https://platform{i}.test/alice"),
                MatchRule::default(),
            )
        })
        .collect()
}

fn config(concurrency: usize) -> ProbeConfig {
    ProbeConfig::default()
        .with_concurrency(concurrency)
        .with_timeout(Duration::from_millis(200))
}

/// Fail the test instead of hanging forever.
async fn bounded<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(10), future)
        .await
        .expect("probe run did not complete")
}

#[tokio::test]
async fn empty_targets_issue_no_requests() {
    let transport = FakeTransport::new(Behaviour::Status(200));
    let stats = transport.stats();
    let engine = ProbeEngine::with_transport(transport, config(4));

    let results = engine.probe(Vec::new()).await;

    assert!(results.is_empty());
    assert_eq!(stats.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn every_target_matches_once() {
    let engine = ProbeEngine::with_transport(FakeTransport::new(Behaviour::Status(200)), config(3));
    let input = targets(7);

    let results = bounded(engine.probe(input.clone())).await;

    assert_eq!(results.len(), input.len());
    let unique: HashSet<&ProbeResult> = results.iter().collect();
    assert_eq!(unique.len(), results.len(), "duplicate results");

    for target in &input {
        assert!(results
            .iter()
            .any(|r| r.name == target.name && r.url == target.url));
    }
}

#[tokio::test]
async fn no_target_matches_for_any_limit() {
    for limit in [1, 2, 8] {
        let engine =
            ProbeEngine::with_transport(FakeTransport::new(Behaviour::Status(404)), config(limit));
        let results = bounded(engine.probe(targets(6))).await;
        assert!(results.is_empty(), "limit {limit} produced matches");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_flight_requests_never_exceed_limit() {
    let count = 10;
    for limit in [1, 2, count] {
        let transport =
            FakeTransport::new(Behaviour::Status(200)).delay(Duration::from_millis(20));
        let stats = transport.stats();
        let engine = ProbeEngine::with_transport(transport, config(limit));

        let results = bounded(engine.probe(targets(count))).await;

        let peak = stats.peak.load(Ordering::SeqCst);
        assert_eq!(results.len(), count);
        assert!(peak >= 1);
        assert!(peak <= limit, "peak {peak} exceeded limit {limit}");
        assert_eq!(stats.in_flight.load(Ordering::SeqCst), 0);
        assert_eq!(engine.available_slots(), limit);
    }
}

#[tokio::test]
async fn failures_holding_slots_do_not_block_the_rest() {
    let input = targets(8);
    let transport = FakeTransport::new(Behaviour::Status(200))
        .route(&input[0].url, Behaviour::Fail)
        .route(&input[1].url, Behaviour::Hang)
        .route(&input[2].url, Behaviour::Fail);
    let engine = ProbeEngine::with_transport(transport, config(2));

    let results = bounded(engine.probe(input.clone())).await;

    let names: HashSet<String> = results.into_iter().map(|r| r.name).collect();
    let expected: HashSet<String> = input[3..].iter().map(|t| t.name.clone()).collect();
    assert_eq!(names, expected);
    assert_eq!(engine.available_slots(), 2);
}

#[tokio::test]
async fn alice_tech_scenario() {
    let catalogue = Catalogue::from_groups(vec![PlatformGroup {
        id: "tech".to_string(),
        description: "test platforms".to_string(),
        platforms: vec![
            PlatformTemplate::status_ok("A", "https://a.test/{username}"),
            PlatformTemplate::status_ok("B", "https://b.test/{username}"),
            PlatformTemplate::status_ok("C", "https://c.test/{username}"),
        ],
    }]);
    let input = catalogue.build_targets("alice", &["tech"]).unwrap();

    let transport = FakeTransport::new(Behaviour::Fail)
        .route("https://a.test/alice", Behaviour::Status(200))
        .route("https://b.test/alice", Behaviour::Status(404))
        .route("https://c.test/alice", Behaviour::Hang);
    let engine = ProbeEngine::with_transport(transport, config(3));

    let reports = bounded(engine.probe_reports(input.clone())).await;
    assert_eq!(reports.len(), 3);

    for report in &reports {
        match report.name.as_str() {
            "A" => assert!(matches!(report.outcome, ProbeOutcome::Matched { status: 200 })),
            "B" => assert!(matches!(report.outcome, ProbeOutcome::NotMatched { status: 404 })),
            "C" => assert!(matches!(
                report.outcome,
                ProbeOutcome::Failed {
                    error: ProbeError::Timeout { .. }
                }
            )),
            other => panic!("unexpected report for {other}"),
        }
    }

    let results = bounded(engine.probe(input)).await;
    assert_eq!(
        results,
        vec![ProbeResult {
            name: "A".to_string(),
            url: "https://a.test/alice".to_string(),
        }]
    );
}

#[tokio::test]
async fn ten_targets_limit_two() {
    let transport = FakeTransport::new(Behaviour::Status(200)).delay(Duration::from_millis(15));
    let stats = transport.stats();
    let engine = ProbeEngine::with_transport(transport, config(2));

    let results = bounded(engine.probe(targets(10))).await;

    assert_eq!(results.len(), 10);
    assert!(stats.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(stats.calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn panicking_transport_releases_its_slot() {
    let input = targets(5);
    let transport =
        FakeTransport::new(Behaviour::Status(200)).route(&input[0].url, Behaviour::Panic);
    let engine = ProbeEngine::with_transport(transport, config(1));

    let reports = bounded(engine.probe_reports(input.clone())).await;

    assert_eq!(reports.len(), 5);
    let panicked = reports.iter().find(|r| r.name == input[0].name).unwrap();
    assert!(matches!(
        panicked.outcome,
        ProbeOutcome::Failed {
            error: ProbeError::Internal { .. }
        }
    ));
    assert_eq!(reports.iter().filter(|r| r.is_match()).count(), 4);
    assert_eq!(engine.available_slots(), 1);
}

#[tokio::test]
async fn stream_yields_one_report_per_target() {
    let input = targets(6);
    let transport =
        FakeTransport::new(Behaviour::Status(200)).route(&input[4].url, Behaviour::Status(404));
    let engine = ProbeEngine::with_transport(transport, config(2));

    let reports: Vec<_> = bounded(engine.probe_stream(input.clone()).collect::<Vec<_>>()).await;

    assert_eq!(reports.len(), input.len());
    let matched: Vec<_> = reports
        .into_iter()
        .filter_map(|r| r.into_result())
        .collect();
    assert_eq!(matched.len(), 5);
    assert!(matched.iter().all(|r| r.name != input[4].name));
}

#[tokio::test]
async fn dropping_stream_stops_admission_and_frees_slots() {
    let transport = FakeTransport::new(Behaviour::Status(200)).delay(Duration::from_millis(20));
    let stats = transport.stats();
    let engine = ProbeEngine::with_transport(transport, config(2));

    let mut stream = engine.probe_stream(targets(50));
    let first = bounded(stream.next()).await;
    assert!(first.is_some());
    drop(stream);

    bounded(async {
        while engine.available_slots() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    // Give the dispatcher a moment to observe the closed channel.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(stats.calls.load(Ordering::SeqCst) < 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn independent_engines_do_not_share_limits() {
    let first = FakeTransport::new(Behaviour::Status(200)).delay(Duration::from_millis(10));
    let second = FakeTransport::new(Behaviour::Status(404)).delay(Duration::from_millis(10));
    let (first_stats, second_stats) = (first.stats(), second.stats());

    let first = ProbeEngine::with_transport(first, config(1));
    let second = ProbeEngine::with_transport(second, config(1));

    let (found, missing) = bounded(async {
        tokio::join!(first.probe(targets(4)), second.probe(targets(4)))
    })
    .await;

    assert_eq!(found.len(), 4);
    assert!(missing.is_empty());
    assert_eq!(first_stats.peak.load(Ordering::SeqCst), 1);
    assert_eq!(second_stats.peak.load(Ordering::SeqCst), 1);
}

#[test]
fn result_serializes_as_name_and_url() {
    let result = ProbeResult {
        name: "GitHub".to_string(),
        url: "https://github.com/alice".to_string(),
    };
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "name": "GitHub", "url": "https://github.com/alice" })
    );
}
