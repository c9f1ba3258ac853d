//! Game loop integration tests
//!
//! End-to-end scenarios against the real clock. Bounds are loose enough for
//! a busy CI host while still catching a second ticker or leaked pause time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tickloop::config::LoopConfig;
use tickloop::error::LoopError;
use tickloop::{GameLoop, LoopState};

fn recording_loop(interval: Duration) -> (GameLoop, Arc<Mutex<Vec<f64>>>) {
    let deltas = Arc::new(Mutex::new(Vec::new()));
    let recorded = deltas.clone();
    let game_loop = GameLoop::new(interval, move |delta| {
        recorded.lock().unwrap().push(delta);
    })
    .unwrap();
    (game_loop, deltas)
}

/// Steady ticking: 10ms loop for 200ms yields about 20 ticks near 10ms each.
///
/// The paused-clock unit test holds the 18-22 bound; on the real clock a
/// preempted host can skip a period or two, so the lower bound is looser here.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_steady_ticking() {
    let (game_loop, deltas) = recording_loop(Duration::from_millis(10));

    game_loop.start().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    game_loop.shutdown().await.unwrap();

    let deltas = deltas.lock().unwrap().clone();
    assert!(
        (15..=22).contains(&deltas.len()),
        "expected ~20 ticks, got {}",
        deltas.len()
    );
    assert!(deltas.iter().all(|d| *d >= 0.0));

    // Median rather than every sample: a single scheduler hiccup is not a bug
    let mut sorted = deltas.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let median = sorted[sorted.len() / 2];
    assert!((0.008..=0.014).contains(&median), "median delta {}", median);
}

/// First-tick convention: the first delta is the nominal interval.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_first_tick_reports_interval() {
    let (game_loop, deltas) = recording_loop(Duration::from_millis(50));

    tokio::time::sleep(Duration::from_millis(100)).await;
    game_loop.start().unwrap();
    tokio::time::sleep(Duration::from_millis(75)).await;
    game_loop.shutdown().await.unwrap();

    let first = deltas.lock().unwrap()[0];
    assert!((first - 0.050).abs() <= 0.005, "first delta {}", first);
    assert_eq!(game_loop.state(), LoopState::Stopped);
}

/// Pausing excludes the paused wall time from the next delta.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pause_excludes_wall_time() {
    let (game_loop, deltas) = recording_loop(Duration::from_millis(20));
    let mut states = game_loop.subscribe();

    game_loop.start().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    game_loop.pause();
    states.wait_for(|s| *s == LoopState::Paused).await.unwrap();
    let ticks_at_pause = deltas.lock().unwrap().len();

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(deltas.lock().unwrap().len(), ticks_at_pause, "ticked while paused");

    game_loop.resume();
    tokio::time::sleep(Duration::from_millis(100)).await;
    game_loop.shutdown().await.unwrap();

    let deltas = deltas.lock().unwrap().clone();
    assert!(deltas.len() > ticks_at_pause, "no ticks after resume");
    let after_resume = deltas[ticks_at_pause];
    assert!(after_resume <= 0.030, "post-resume delta {} includes paused time", after_resume);
}

/// Stop is terminal: a second start is rejected and nothing ticks.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_is_terminal() {
    let (game_loop, deltas) = recording_loop(Duration::from_millis(10));

    game_loop.start().unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    game_loop.shutdown().await.unwrap();
    let ticks_at_stop = deltas.lock().unwrap().len();

    assert!(matches!(game_loop.start(), Err(LoopError::InvalidState(_))));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(deltas.lock().unwrap().len(), ticks_at_stop);
    assert_eq!(game_loop.tick_count() as usize, ticks_at_stop);
    assert_eq!(game_loop.state(), LoopState::Stopped);
}

/// A panicking callback terminates the loop after exactly three calls.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_callback_fault_propagates() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let game_loop = GameLoop::new(Duration::from_millis(10), move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
            panic!("simulation fault on tick 3");
        }
    })
    .unwrap();

    game_loop.start().unwrap();
    let result = game_loop.join().await;

    assert!(matches!(result, Err(LoopError::CallbackPanicked(_))));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(game_loop.state(), LoopState::Stopped);
    assert!(!game_loop.is_running());
}

/// Opt-in recovery keeps the loop alive through a panicking tick.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_callback_fault_recovered_when_enabled() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let config = LoopConfig::default()
        .with_interval(Duration::from_millis(10))
        .with_panic_recovery(true);
    let game_loop = GameLoop::with_config(&config, move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
            panic!("simulation fault on tick 3");
        }
    })
    .unwrap();

    game_loop.start().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(game_loop.is_running());
    game_loop.shutdown().await.unwrap();

    assert!(calls.load(Ordering::SeqCst) > 3);
}

/// Invalid construction produces no loop.
#[test]
fn test_invalid_construction() {
    let result = GameLoop::new(Duration::ZERO, |_| {});
    assert!(matches!(result, Err(LoopError::InvalidInterval(_))));

    let config = LoopConfig::default().with_tick_rate(-30.0);
    assert!(GameLoop::with_config(&config, |_| {}).is_err());

    let result = GameLoop::new(Duration::MAX, |_| {});
    assert!(matches!(result, Err(LoopError::InvalidInterval(_))));
}

/// A sub-millisecond configured interval survives into the loop.
#[test]
fn test_sub_millisecond_config_interval() {
    let config = LoopConfig::default().with_interval(Duration::from_micros(500));
    let game_loop = GameLoop::with_config(&config, |_| {}).unwrap();
    assert!(game_loop.interval().abs_diff(Duration::from_micros(500)) < Duration::from_micros(1));
}

/// Pause, Resume, Stop in quick succession ends Stopped with at most one extra tick.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pause_resume_stop_sequence() {
    let (game_loop, deltas) = recording_loop(Duration::from_millis(10));

    game_loop.start().unwrap();
    tokio::time::sleep(Duration::from_millis(35)).await;
    let before = deltas.lock().unwrap().len();

    game_loop.pause();
    game_loop.resume();
    game_loop.stop();
    game_loop.join().await.unwrap();

    let after = deltas.lock().unwrap().len();
    assert!(after <= before + 1, "{} ticks after resume", after - before);
    assert_eq!(game_loop.state(), LoopState::Stopped);
}

/// A callback that stalls stretches the next measured delta.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stalled_callback_grows_delta() {
    let deltas = Arc::new(Mutex::new(Vec::new()));
    let recorded = deltas.clone();
    let game_loop = GameLoop::new(Duration::from_millis(10), move |delta| {
        let count = {
            let mut recorded = recorded.lock().unwrap();
            recorded.push(delta);
            recorded.len()
        };
        if count == 2 {
            std::thread::sleep(Duration::from_millis(60));
        }
    })
    .unwrap();

    let started = Instant::now();
    game_loop.start().unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    game_loop.shutdown().await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(150));

    let deltas = deltas.lock().unwrap().clone();
    assert!(deltas.len() >= 3);
    assert!(deltas[2] >= 0.055, "delta after stall {}", deltas[2]);
}
