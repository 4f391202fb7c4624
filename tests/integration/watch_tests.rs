use linesweep::signal::{create_handler, ShutdownHandler};
use linesweep::watch::{
    OverflowPolicy, WatchConfig, WatchContext, WatchEvent, WatchSession, WatchState, WatchStats,
};
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::tempdir;

const DEBOUNCE: Duration = Duration::from_millis(200);
const TIMEOUT: Duration = Duration::from_secs(10);

/// Wait for the first event matching `pred`, or panic after `TIMEOUT`.
fn wait_for(rx: &mpsc::Receiver<WatchEvent>, pred: impl Fn(&WatchEvent) -> bool) -> WatchEvent {
    let deadline = Instant::now() + TIMEOUT;
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(left) {
            Ok(event) if pred(&event) => return event,
            Ok(_) => {}
            Err(e) => panic!("no matching watch event: {e}"),
        }
    }
}

type SessionHandle = thread::JoinHandle<(WatchState, WatchStats)>;

fn spawn_with(
    root: PathBuf,
    config: WatchConfig,
    context: WatchContext,
) -> (ShutdownHandler, mpsc::Receiver<WatchEvent>, SessionHandle) {
    let shutdown = create_handler();
    let (tx, rx) = mpsc::channel();
    let thread_shutdown = shutdown.clone();

    let handle = thread::spawn(move || {
        let mut session = WatchSession::new(&root, config).with_context(context);
        let stats = session
            .run(&thread_shutdown, |event| {
                let _ = tx.send(event.clone());
            })
            .unwrap();
        (session.state(), stats)
    });

    (shutdown, rx, handle)
}

fn spawn_session(root: PathBuf) -> (ShutdownHandler, mpsc::Receiver<WatchEvent>, SessionHandle) {
    spawn_with(
        root,
        WatchConfig::default().with_debounce(DEBOUNCE),
        WatchContext::new(),
    )
}

#[test]
fn test_written_file_is_normalized() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let watched = root.join("list.txt");
    let other = root.join("other.txt");
    fs::write(&watched, "").unwrap();
    fs::write(&other, "keep\n").unwrap();

    let (shutdown, rx, handle) = spawn_session(root.clone());
    wait_for(&rx, |e| matches!(e, WatchEvent::Started { .. }));

    fs::write(&watched, "line3\nline1\n").unwrap();

    wait_for(&rx, |e| {
        matches!(e, WatchEvent::Processed { path, changed: true } if path.ends_with("list.txt"))
    });
    assert_eq!(fs::read_to_string(&watched).unwrap(), "line1\nline3\n");
    assert_eq!(fs::read_to_string(&other).unwrap(), "keep\n");

    shutdown.request_shutdown();
    assert_eq!(handle.join().unwrap().0, WatchState::Stopped);
}

#[test]
fn test_startup_pass_normalizes_existing_files() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::write(root.join("a.txt"), "b\na\n").unwrap();

    let (shutdown, rx, handle) = spawn_session(root.clone());
    wait_for(&rx, |e| matches!(e, WatchEvent::Started { .. }));

    assert_eq!(fs::read_to_string(root.join("a.txt")).unwrap(), "a\nb\n");

    shutdown.request_shutdown();
    handle.join().unwrap();
}

#[test]
fn test_file_deleted_during_debounce_is_skipped() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let path = root.join("short_lived.txt");

    let (shutdown, rx, handle) = spawn_session(root.clone());
    wait_for(&rx, |e| matches!(e, WatchEvent::Started { .. }));

    fs::write(&path, "b\na\n").unwrap();
    wait_for(&rx, |e| matches!(e, WatchEvent::FileChanged { .. }));
    fs::remove_file(&path).unwrap();

    // Past the debounce window: either skipped or never reported, but no error.
    thread::sleep(DEBOUNCE * 3);
    shutdown.request_shutdown();
    handle.join().unwrap();

    let events: Vec<WatchEvent> = rx.try_iter().collect();
    assert!(!events
        .iter()
        .any(|e| matches!(e, WatchEvent::Error { .. } | WatchEvent::Processed { .. })));
    assert!(matches!(events.last(), Some(WatchEvent::Shutdown)));
}

#[test]
fn test_watch_missing_root_fails_setup() {
    let shutdown = create_handler();
    let mut session = WatchSession::new(
        std::path::Path::new("/no/such/linesweep/watch/root"),
        WatchConfig::default(),
    );
    assert!(session.run(&shutdown, |_| {}).is_err());
}

#[test]
fn test_full_buffer_drops_events_and_keeps_running() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let first = root.join("first.txt");
    let context = WatchContext::new();
    let config = WatchConfig::default()
        .with_debounce(Duration::from_millis(50))
        .with_event_buffer(1)
        .with_overflow(OverflowPolicy::Drop);

    let (shutdown, rx, handle) = spawn_with(root.clone(), config, context.clone());
    wait_for(&rx, |e| matches!(e, WatchEvent::Started { .. }));

    // Hold the shared lock so the session stalls on its first file and
    // stops draining notifications.
    let lock = context.lock();
    let guard = lock.lock().unwrap();

    // With a one-slot buffer a single write's notifications can already
    // overflow, so write until one gets through.
    let mut noticed = false;
    for _ in 0..20 {
        fs::write(&first, "b\na\n").unwrap();
        let deadline = Instant::now() + Duration::from_millis(250);
        while let Ok(event) = rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            if matches!(&event, WatchEvent::FileChanged { path } if path.ends_with("first.txt")) {
                noticed = true;
                break;
            }
        }
        if noticed {
            break;
        }
    }
    assert!(noticed, "first.txt change never reported");

    thread::sleep(Duration::from_millis(300));
    assert_eq!(fs::read_to_string(&first).unwrap(), "b\na\n");

    for i in 0..100 {
        fs::write(root.join(format!("burst_{i:03}.txt")), "y\nx\n").unwrap();
    }
    thread::sleep(Duration::from_millis(300));
    drop(guard);

    wait_for(&rx, |e| {
        matches!(e, WatchEvent::Processed { path, .. } if path.ends_with("first.txt"))
    });
    assert_eq!(fs::read_to_string(&first).unwrap(), "a\nb\n");

    shutdown.request_shutdown();
    let (state, stats) = handle.join().unwrap();
    assert_eq!(state, WatchState::Stopped);
    assert!(stats.events_dropped > 0, "{stats:?}");
}
