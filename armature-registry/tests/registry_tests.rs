// Tests for the named registry

use armature_registry::{BoxError, CapabilityKind, Component, EntryState, NamedRegistry, RegistryError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[derive(Debug)]
struct Credentials {
    username: String,
}

impl Component for Credentials {
    const KIND: CapabilityKind = CapabilityKind::AuthenticationCredential;
}

#[derive(Debug)]
struct Pool {
    url: String,
    credentials: Option<Arc<Credentials>>,
}

impl Component for Pool {
    const KIND: CapabilityKind = CapabilityKind::ConnectionPool;
}

#[derive(Debug)]
struct Settings {
    pool: Arc<Pool>,
}

impl Component for Settings {
    const KIND: CapabilityKind = CapabilityKind::ConnectionConfiguration;
}

#[derive(Debug)]
struct Client {
    settings: Arc<Settings>,
}

impl Component for Client {
    const KIND: CapabilityKind = CapabilityKind::Client;
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    (calls.clone(), calls)
}

#[test]
fn test_resolve_unregistered_for_every_kind() {
    let registry = NamedRegistry::new();

    let errors = [
        registry.resolve::<Credentials>("a").unwrap_err(),
        registry.resolve::<Pool>("a").unwrap_err(),
        registry.resolve::<Settings>("a").unwrap_err(),
        registry.resolve::<Client>("a").unwrap_err(),
    ];

    for (err, kind) in errors.iter().zip(CapabilityKind::ALL) {
        assert!(err.is_not_registered());
        assert_eq!(err.key(), Some((kind, "a")));
    }
}

#[test]
fn test_repeated_resolve_returns_same_instance() {
    let registry = NamedRegistry::new();
    let (calls, seen) = counter();

    registry
        .register("a", move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Credentials {
                username: "admin".to_string(),
            })
        })
        .unwrap();

    let first = registry.resolve::<Credentials>("a").unwrap();
    let second = registry.resolve::<Credentials>("a").unwrap();
    let third = registry.resolve::<Credentials>("a").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&second, &third));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_first_resolve_builds_once() {
    const CALLERS: usize = 16;
    init_tracing();

    let registry = NamedRegistry::new();
    let (calls, seen) = counter();

    registry
        .register("p", move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            // Widen the window for racing callers.
            thread::sleep(Duration::from_millis(50));
            Ok(Pool {
                url: "http://localhost:9200".to_string(),
                credentials: None,
            })
        })
        .unwrap();

    let barrier = Arc::new(Barrier::new(CALLERS));
    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                registry.resolve::<Pool>("p").unwrap()
            })
        })
        .collect();

    let pools: Vec<Arc<Pool>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(pools.len(), CALLERS);
    assert!(pools.iter().all(|p| Arc::ptr_eq(p, &pools[0])));
}

#[test]
fn test_distinct_keys_build_in_parallel() {
    let registry = NamedRegistry::new();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = std::sync::Mutex::new(release_rx);
    let (started_tx, started_rx) = mpsc::channel::<()>();
    let started_tx = std::sync::Mutex::new(started_tx);

    registry
        .register("slow", move |_| {
            started_tx.lock().unwrap().send(()).unwrap();
            release_rx.lock().unwrap().recv().unwrap();
            Ok(Pool {
                url: "http://slow:9200".to_string(),
                credentials: None,
            })
        })
        .unwrap();
    registry
        .register("fast", |_| {
            Ok(Pool {
                url: "http://fast:9200".to_string(),
                credentials: None,
            })
        })
        .unwrap();

    let slow = {
        let registry = registry.clone();
        thread::spawn(move || registry.resolve::<Pool>("slow").unwrap())
    };

    started_rx.recv().unwrap();
    assert_eq!(
        registry.state(CapabilityKind::ConnectionPool, "slow"),
        Some(EntryState::Building)
    );

    // Must not wait on the in-flight build of "slow".
    let fast = registry.resolve::<Pool>("fast").unwrap();
    assert_eq!(fast.url, "http://fast:9200");

    release_tx.send(()).unwrap();
    assert_eq!(slow.join().unwrap().url, "http://slow:9200");
}

#[test]
fn test_state_moves_from_building_straight_to_built() {
    let registry = NamedRegistry::new();
    registry
        .register("p", |_| {
            thread::sleep(Duration::from_millis(20));
            Ok(Pool {
                url: "http://localhost:9200".to_string(),
                credentials: None,
            })
        })
        .unwrap();

    let observer = {
        let registry = registry.clone();
        thread::spawn(move || {
            let mut seen = Vec::new();
            loop {
                let state = registry.state(CapabilityKind::ConnectionPool, "p").unwrap();
                if seen.last() != Some(&state) {
                    seen.push(state);
                }
                if state == EntryState::Built {
                    return seen;
                }
            }
        })
    };

    registry.resolve::<Pool>("p").unwrap();
    let seen = observer.join().unwrap();

    let building = seen.iter().position(|s| *s == EntryState::Building);
    if let Some(index) = building {
        assert_eq!(&seen[index..], &[EntryState::Building, EntryState::Built]);
    }
    assert_eq!(seen.last(), Some(&EntryState::Built));
}

#[test]
fn test_reregistration_uses_latest_factory() {
    let registry = NamedRegistry::new();
    let (first_calls, first_seen) = counter();

    registry
        .register("a", move |_| {
            first_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Credentials {
                username: "first".to_string(),
            })
        })
        .unwrap();
    registry
        .register("a", |_| {
            Ok(Credentials {
                username: "second".to_string(),
            })
        })
        .unwrap();

    let credentials = registry.resolve::<Credentials>("a").unwrap();
    assert_eq!(credentials.username, "second");
    assert_eq!(first_seen.load(Ordering::SeqCst), 0);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_reregistration_discards_built_instance() {
    let registry = NamedRegistry::new();
    registry
        .register("a", |_| {
            Ok(Credentials {
                username: "first".to_string(),
            })
        })
        .unwrap();
    let before = registry.resolve::<Credentials>("a").unwrap();

    registry
        .register("a", |_| {
            Ok(Credentials {
                username: "second".to_string(),
            })
        })
        .unwrap();
    assert_eq!(
        registry.state(CapabilityKind::AuthenticationCredential, "a"),
        Some(EntryState::Registered)
    );

    let after = registry.resolve::<Credentials>("a").unwrap();
    assert_eq!(before.username, "first");
    assert_eq!(after.username, "second");
    assert!(!Arc::ptr_eq(&before, &after));
}

#[test]
fn test_reregistration_leaves_other_keys_alone() {
    let registry = NamedRegistry::new();
    registry
        .register("a", |_| Ok(Credentials { username: "a".to_string() }))
        .unwrap();
    registry
        .register("b", |_| Ok(Credentials { username: "b".to_string() }))
        .unwrap();
    let b = registry.resolve::<Credentials>("b").unwrap();

    registry
        .register("a", |_| Ok(Credentials { username: "a2".to_string() }))
        .unwrap();

    assert!(Arc::ptr_eq(&b, &registry.resolve::<Credentials>("b").unwrap()));
}

#[test]
fn test_missing_dependency_fails_only_on_resolve() {
    let registry = NamedRegistry::new();

    registry
        .register("c2", |r| {
            Ok(Settings {
                pool: r.resolve::<Pool>("missing")?,
            })
        })
        .unwrap();

    assert!(registry.contains(CapabilityKind::ConnectionConfiguration, "c2"));

    let err = registry.resolve::<Settings>("c2").unwrap_err();
    assert!(err.is_not_registered(), "unexpected error: {err}");
    assert_eq!(err.key(), Some((CapabilityKind::ConnectionPool, "missing")));
}

#[test]
fn test_construction_failure_is_not_cached() {
    let registry = NamedRegistry::new();
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = attempts.clone();

    registry
        .register("flaky", move |_| {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err::<Pool, BoxError>("section 'Uris' not found".into());
            }
            Ok(Pool {
                url: "http://localhost:9200".to_string(),
                credentials: None,
            })
        })
        .unwrap();

    let err = registry.resolve::<Pool>("flaky").unwrap_err();
    match &err {
        RegistryError::ConstructionFailed { kind, name, source } => {
            assert_eq!(*kind, CapabilityKind::ConnectionPool);
            assert_eq!(name, "flaky");
            assert!(source.to_string().contains("Uris"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        registry.state(CapabilityKind::ConnectionPool, "flaky"),
        Some(EntryState::Registered)
    );

    let pool = registry.resolve::<Pool>("flaky").unwrap();
    assert_eq!(pool.url, "http://localhost:9200");
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[test]
fn test_end_to_end_pipeline_builds_each_stage_once() {
    let registry = NamedRegistry::new();
    let counts: Arc<[AtomicUsize; 4]> = Arc::new(Default::default());

    let c = counts.clone();
    registry
        .register("a", move |_| {
            c[0].fetch_add(1, Ordering::SeqCst);
            Ok(Credentials {
                username: "test".to_string(),
            })
        })
        .unwrap();

    let c = counts.clone();
    registry
        .register("p", move |r| {
            c[1].fetch_add(1, Ordering::SeqCst);
            Ok(Pool {
                url: "http://localhost:9200".to_string(),
                credentials: Some(r.resolve::<Credentials>("a")?),
            })
        })
        .unwrap();

    let c = counts.clone();
    registry
        .register("c", move |r| {
            c[2].fetch_add(1, Ordering::SeqCst);
            Ok(Settings {
                pool: r.resolve::<Pool>("p")?,
            })
        })
        .unwrap();

    let c = counts.clone();
    registry
        .register("x", move |r| {
            c[3].fetch_add(1, Ordering::SeqCst);
            Ok(Client {
                settings: r.resolve::<Settings>("c")?,
            })
        })
        .unwrap();

    assert!(counts.iter().all(|c| c.load(Ordering::SeqCst) == 0));

    let client = registry.resolve::<Client>("x").unwrap();
    let credentials = client.settings.pool.credentials.as_ref().unwrap();
    assert_eq!(credentials.username, "test");
    assert!(counts.iter().all(|c| c.load(Ordering::SeqCst) == 1));

    // Intermediate stages are the same shared instances.
    let pool = registry.resolve::<Pool>("p").unwrap();
    assert!(Arc::ptr_eq(&pool, &client.settings.pool));
    registry.resolve::<Client>("x").unwrap();
    assert!(counts.iter().all(|c| c.load(Ordering::SeqCst) == 1));
}

#[test]
fn test_same_name_across_kinds_coexists() {
    let registry = NamedRegistry::new();
    registry
        .register("test", |_| {
            Ok(Pool {
                url: "http://localhost:9200".to_string(),
                credentials: None,
            })
        })
        .unwrap();
    registry
        .register("test", |r| {
            Ok(Settings {
                pool: r.resolve::<Pool>("test")?,
            })
        })
        .unwrap();

    assert_eq!(registry.len(), 2);
    let settings = registry.resolve::<Settings>("test").unwrap();
    assert_eq!(settings.pool.url, "http://localhost:9200");
}
