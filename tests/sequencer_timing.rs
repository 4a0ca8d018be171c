//! Sequencer playback timing against a manual clock.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use spark_flow::error::SequencerError;
use spark_flow::sequencer::{ManualClock, PlaybackMode, PlaybackState, Program, Sequencer, Step};

type Log = Rc<RefCell<Vec<(u128, String)>>>;

/// Sequencer that logs `(ms, key)` per activation.
fn recorder(clock: &ManualClock, default_ms: u64) -> (Sequencer, Log) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let time = clock.clone();
    let sequencer = Sequencer::new(Duration::from_millis(default_ms), clock.clone(), move |key| {
        use spark_flow::sequencer::Clock;
        sink.borrow_mut().push((time.now().as_millis(), key.to_string()));
        Ok(())
    });
    (sequencer, log)
}

fn keys(log: &Log) -> Vec<String> {
    log.borrow().iter().map(|(_, key)| key.clone()).collect()
}

/// Step the clock 1ms at a time, polling after each step.
fn run_for(clock: &ManualClock, sequencer: &mut Sequencer, ms: u64) {
    for _ in 0..ms {
        clock.advance_ms(1);
        sequencer.poll().unwrap();
    }
}

#[test]
fn timed_step_then_default_interval() {
    let clock = ManualClock::new();
    let (mut seq, log) = recorder(&clock, 500);
    let program = Program::new("p", [Step::timed("A", 100), Step::from("B")]);

    seq.play(&program, PlaybackMode::Normal).unwrap();
    run_for(&clock, &mut seq, 599);
    assert!(seq.is_playing(), "still on B just before 600ms");

    run_for(&clock, &mut seq, 1);
    assert!(!seq.is_playing());
    assert_eq!(
        log.borrow().as_slice(),
        [(0, "A".to_string()), (100, "B".to_string())]
    );
    assert_eq!(seq.state(), PlaybackState::default());
}

#[test]
fn late_poll_catches_up_without_drift() {
    let clock = ManualClock::new();
    let (mut seq, log) = recorder(&clock, 100);
    seq.play(&Program::new("p", ["a", "b", "c", "d"]), PlaybackMode::Normal).unwrap();

    // One poll 250ms late fires b (due 100) and c (due 200).
    clock.advance_ms(250);
    assert_eq!(seq.poll().unwrap(), 2);
    assert_eq!(seq.current_step_key(), Some("c"));
    // d is due at 300, measured from c's deadline, not from the poll.
    assert_eq!(seq.next_deadline(), Some(Duration::from_millis(300)));
    assert_eq!(keys(&log), ["a", "b", "c"]);
}

#[test]
fn normal_mode_fires_each_step_once_then_idles() {
    let clock = ManualClock::new();
    let (mut seq, log) = recorder(&clock, 10);
    let program = Program::new("p", ["a", "b", "c", "d", "e"]);
    let n = program.len();

    seq.play(&program, PlaybackMode::Normal).unwrap();
    for _ in 0..n {
        assert!(seq.is_playing());
        seq.fire().unwrap();
    }
    assert!(!seq.is_playing());
    assert_eq!(log.borrow().len(), n);

    // Nothing left to fire.
    seq.fire().unwrap();
    assert_eq!(seq.poll().unwrap(), 0);
    assert_eq!(log.borrow().len(), n);
}

#[test]
fn loop_mode_returns_to_start() {
    let clock = ManualClock::new();
    let (mut seq, log) = recorder(&clock, 10);
    let program = Program::new("p", ["a", "b", "c"]);

    seq.play(&program, PlaybackMode::Loop).unwrap();
    for _ in 0..program.len() {
        seq.fire().unwrap();
    }
    assert_eq!(seq.state().step_index, Some(0));
    assert!(seq.is_playing());

    run_for(&clock, &mut seq, 60);
    assert_eq!(keys(&log), ["a", "b", "c", "a", "b", "c", "a", "b", "c", "a"]);
}

#[test]
fn reverse_mode_plays_backwards_then_stops() {
    let clock = ManualClock::new();
    let (mut seq, log) = recorder(&clock, 50);
    seq.play(&Program::new("p", ["0", "1", "2"]), PlaybackMode::Reverse).unwrap();
    assert_eq!(seq.state().step_index, Some(2));

    run_for(&clock, &mut seq, 150);
    assert_eq!(keys(&log), ["2", "1", "0"]);
    assert!(!seq.is_playing());
}

#[test]
fn empty_program_never_calls_back() {
    let clock = ManualClock::new();
    let (mut seq, log) = recorder(&clock, 50);
    for mode in PlaybackMode::ALL {
        seq.play(&Program::new("empty", Vec::<Step>::new()), mode).unwrap();
        assert!(!seq.is_playing());
    }
    run_for(&clock, &mut seq, 100);
    assert!(log.borrow().is_empty());
}

#[test]
fn callback_error_propagates_and_state_stays_usable() {
    let clock = ManualClock::new();
    let calls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&calls);
    let mut seq = Sequencer::new(Duration::from_millis(100), clock.clone(), move |key| {
        *counter.borrow_mut() += 1;
        if key == "bad" {
            return Err(io::Error::other("step refused").into());
        }
        Ok(())
    });

    let program = Program::new("p", ["ok", "bad", "ok"]);
    seq.play(&program, PlaybackMode::Normal).unwrap();

    clock.advance_ms(100);
    let err = seq.poll().unwrap_err();
    assert!(matches!(&err, SequencerError::Step { key, .. } if key == "bad"));
    assert!(err.to_string().contains("step refused"));
    assert_eq!(seq.current_step_key(), Some("bad"));

    // Playback continues from the failed step.
    clock.advance_ms(100);
    seq.poll().unwrap();
    assert_eq!(seq.state().step_index, Some(2));

    seq.stop();
    assert!(!seq.is_playing());
    seq.play(&program, PlaybackMode::Loop).unwrap();
    assert!(seq.is_playing());
    assert_eq!(*calls.borrow(), 4);
}

#[test]
fn new_program_cancels_pending_deadline() {
    let clock = ManualClock::new();
    let (mut seq, log) = recorder(&clock, 100);
    seq.play(&Program::new("one", ["a", "b"]), PlaybackMode::Normal).unwrap();
    run_for(&clock, &mut seq, 50);
    seq.play(&Program::new("two", ["x", "y"]), PlaybackMode::Normal).unwrap();

    run_for(&clock, &mut seq, 99);
    assert_eq!(keys(&log), ["a", "x"]);
    run_for(&clock, &mut seq, 1);
    assert_eq!(keys(&log), ["a", "x", "y"]);
}
