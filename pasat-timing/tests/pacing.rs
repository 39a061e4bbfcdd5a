use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use pasat_core::{Digit, PresentationEvent, Stimulus};
use pasat_timing::{
    ManualTimer, PacedScheduler, PacerEvent, PacingStats, PauseGate, RenderError, Renderer,
    SilentRenderer, Timer,
};

const SECOND: u64 = 1_000_000_000;

fn digits(values: &[u8]) -> Vec<Digit> {
    values.iter().map(|&v| Digit::saturating(v)).collect()
}

/// Pretends to play a clip of fixed length by advancing the virtual clock.
struct ClipRenderer {
    timer: ManualTimer,
    clip: Duration,
}

impl Renderer<Digit> for ClipRenderer {
    fn render(&mut self, _stimulus: &Digit) -> Result<(), RenderError> {
        self.timer.advance(self.clip);
        Ok(())
    }
}

/// Pauses the run while rendering the given digit.
struct PauseOn {
    inner: ClipRenderer,
    gate: Arc<PauseGate>,
    digit: u8,
}

impl Renderer<Digit> for PauseOn {
    fn render(&mut self, stimulus: &Digit) -> Result<(), RenderError> {
        self.inner.render(stimulus)?;
        if stimulus.value() == self.digit {
            self.gate.pause();
        }
        Ok(())
    }
}

/// Requests a stop after `remaining` renders.
struct StopAfter {
    gate: Arc<PauseGate>,
    remaining: usize,
}

impl Renderer<Digit> for StopAfter {
    fn render(&mut self, _stimulus: &Digit) -> Result<(), RenderError> {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.gate.stop();
        }
        Ok(())
    }
}

struct FailingRenderer;

impl Renderer<Digit> for FailingRenderer {
    fn render(&mut self, _stimulus: &Digit) -> Result<(), RenderError> {
        Err(RenderError::MissingAsset("audio/en/1.wav".into()))
    }
}

fn drain(rx: Receiver<PacerEvent<Digit>>) -> (Vec<PresentationEvent<Digit>>, Option<PacingStats>) {
    let mut presented = Vec::new();
    let mut stats = None;
    for event in rx.iter() {
        match event {
            PacerEvent::Presented(ev) => presented.push(ev),
            PacerEvent::Finished(s) => stats = Some(s),
        }
    }
    (presented, stats)
}

#[test]
fn wait_is_shortened_by_render_time() {
    let timer = ManualTimer::new();
    let renderer = ClipRenderer {
        timer: timer.clone(),
        clip: Duration::from_secs(1),
    };
    let (tx, rx) = mpsc::channel();
    let stats = PacedScheduler::new(digits(&[4, 7, 2]), Duration::from_secs(3), timer, renderer)
        .run(tx);

    let (presented, reported) = drain(rx);
    let stamps: Vec<u64> = presented.iter().map(|e| e.presented_at).collect();
    assert_eq!(stamps, vec![0, 3 * SECOND, 6 * SECOND, 9 * SECOND]);
    assert_eq!(
        presented.iter().map(|e| e.stimulus.value()).collect::<Vec<_>>(),
        vec![4, 7, 2, 0]
    );
    assert_eq!(reported, Some(stats.clone()));
    assert_eq!(stats.presented, 3);
    assert_eq!(stats.overruns, 0);
    assert_eq!(stats.mean_render_ns, SECOND as f64);
}

#[test]
fn overrun_clamps_wait_to_zero() {
    let timer = ManualTimer::new();
    let renderer = ClipRenderer {
        timer: timer.clone(),
        clip: Duration::from_secs(5),
    };
    let (tx, rx) = mpsc::channel();
    let stats = PacedScheduler::new(digits(&[1, 2, 3]), Duration::from_secs(3), timer, renderer)
        .run(tx);

    let (presented, _) = drain(rx);
    let stamps: Vec<u64> = presented.iter().map(|e| e.presented_at).collect();
    assert_eq!(stamps, vec![0, 5 * SECOND, 10 * SECOND, 15 * SECOND]);
    assert_eq!(stats.overruns, 3);
}

#[test]
fn exactly_one_terminal_event_closes_the_run() {
    let (tx, rx) = mpsc::channel();
    PacedScheduler::new(
        digits(&[9, 9]),
        Duration::from_secs(2),
        ManualTimer::new(),
        SilentRenderer,
    )
    .run(tx);

    let (presented, stats) = drain(rx);
    let terminals = presented.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(terminals, 1);
    assert!(presented.last().is_some_and(|e| e.stimulus.is_null()));
    assert!(stats.is_some());
}

#[test]
fn pause_holds_back_the_next_stimulus() {
    let timer = ManualTimer::new();
    let gate = Arc::new(PauseGate::new());
    let renderer = PauseOn {
        inner: ClipRenderer {
            timer: timer.clone(),
            clip: Duration::from_secs(1),
        },
        gate: Arc::clone(&gate),
        digit: 5,
    };
    let (tx, rx) = mpsc::channel();
    let handle = PacedScheduler::new(
        digits(&[3, 5, 2]),
        Duration::from_secs(3),
        timer.clone(),
        renderer,
    )
    .with_gate(Arc::clone(&gate))
    .spawn(tx)
    .unwrap();

    let first = rx.recv().unwrap();
    let second = rx.recv().unwrap();
    assert!(matches!(first, PacerEvent::Presented(ev) if ev.stimulus.value() == 3));
    assert!(matches!(second, PacerEvent::Presented(ev) if ev.stimulus.value() == 5));

    assert_eq!(
        rx.recv_timeout(Duration::from_millis(150)).unwrap_err(),
        RecvTimeoutError::Timeout
    );
    // Virtual time stands still while paused: 3 s interval + 1 s clip.
    assert_eq!(timer.now(), 4 * SECOND);

    gate.resume();
    let (rest, stats) = drain(rx);
    handle.join().unwrap();

    assert_eq!(rest[0].stimulus.value(), 2);
    assert_eq!(rest[0].presented_at, 6 * SECOND);
    assert!(rest[1].is_terminal());
    assert_eq!(stats.map(|s| s.presented), Some(3));
}

#[test]
fn paused_before_start_presents_nothing_until_resumed() {
    let gate = Arc::new(PauseGate::new());
    gate.pause();
    let (tx, rx) = mpsc::channel();
    let handle = PacedScheduler::new(
        digits(&[1, 2]),
        Duration::from_secs(2),
        ManualTimer::new(),
        SilentRenderer,
    )
    .with_gate(Arc::clone(&gate))
    .spawn(tx)
    .unwrap();

    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    gate.resume();
    let (presented, _) = drain(rx);
    handle.join().unwrap();
    assert_eq!(presented.len(), 3);
}

#[test]
fn stop_aborts_remaining_stimuli() {
    let gate = Arc::new(PauseGate::new());
    let renderer = StopAfter {
        gate: Arc::clone(&gate),
        remaining: 2,
    };
    let (tx, rx) = mpsc::channel();
    let stats = PacedScheduler::new(
        digits(&[1, 2, 3, 4, 5]),
        Duration::from_secs(3),
        ManualTimer::new(),
        renderer,
    )
    .with_gate(Arc::clone(&gate))
    .run(tx);

    let (presented, _) = drain(rx);
    assert_eq!(
        presented.iter().map(|e| e.stimulus.value()).collect::<Vec<_>>(),
        vec![1, 2, 0]
    );
    // The terminal event is not delayed by the interrupted wait.
    assert_eq!(presented[2].presented_at, 3 * SECOND);
    assert_eq!(stats.presented, 2);
    assert!(gate.is_stopped());
}

#[test]
fn stop_while_paused_finishes_the_run() {
    let gate = Arc::new(PauseGate::new());
    gate.pause();
    let (tx, rx) = mpsc::channel();
    let handle = PacedScheduler::new(
        digits(&[1, 2]),
        Duration::from_secs(2),
        ManualTimer::new(),
        SilentRenderer,
    )
    .with_gate(Arc::clone(&gate))
    .spawn(tx)
    .unwrap();

    gate.stop();
    let (presented, stats) = drain(rx);
    assert_eq!(handle.join().unwrap().presented, 0);
    assert_eq!(presented.len(), 1);
    assert!(presented[0].is_terminal());
    assert_eq!(stats.map(|s| s.presented), Some(0));
}

#[test]
fn render_failure_keeps_pace() {
    let (tx, rx) = mpsc::channel();
    let stats = PacedScheduler::new(
        digits(&[1, 2]),
        Duration::from_secs(2),
        ManualTimer::new(),
        FailingRenderer,
    )
    .run(tx);
    let (presented, _) = drain(rx);
    assert_eq!(presented[1].presented_at, 2 * SECOND);
    assert_eq!(stats.presented, 2);
}

#[test]
fn pacer_halts_when_listener_is_gone() {
    let (tx, rx) = mpsc::channel::<PacerEvent<Digit>>();
    drop(rx);
    let scheduler = PacedScheduler::new(
        digits(&[1, 2, 3]),
        Duration::from_secs(3),
        ManualTimer::new(),
        SilentRenderer,
    );
    let gate = scheduler.gate();
    let stats = scheduler.run(tx);
    assert_eq!(stats.presented, 0);
    assert!(gate.is_stopped());
}
