//! Property tests for the countdown state machine.
//!
//! These drive the engine with arbitrary configurations and command
//! sequences and check the invariants that every caller relies on:
//! the displayed remaining time never escapes the current phase's
//! bounds, completed cycles only ever grow, and a work phase takes
//! exactly `work_minutes * 60` ticks to finish.

use focusflow_core::attribution::SessionAttributor;
use focusflow_core::timer::{DurationConfig, Phase, TimerEngine};
use proptest::prelude::*;

fn arbitrary_config() -> impl Strategy<Value = DurationConfig> {
    (1u32..=120, 1u32..=60, 1u32..=90, 1u32..=8).prop_map(
        |(work, short, long, cycles)| DurationConfig {
            work_minutes: work,
            short_break_minutes: short,
            long_break_minutes: long,
            cycles_per_long_break: cycles,
        },
    )
}

#[derive(Debug, Clone)]
enum Op {
    Start,
    Pause,
    Reset,
    Tick(u16),
    Select(Phase),
    SetDurations(DurationConfig),
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Start),
        Just(Op::Pause),
        Just(Op::Reset),
        (1u16..=200).prop_map(Op::Tick),
        prop_oneof![
            Just(Phase::Work),
            Just(Phase::ShortBreak),
            Just(Phase::LongBreak)
        ]
        .prop_map(Op::Select),
        arbitrary_config().prop_map(Op::SetDurations),
    ]
}

#[test]
fn invariants_hold_under_arbitrary_commands() {
    proptest!(|(
        config in arbitrary_config(),
        ops in prop::collection::vec(arbitrary_op(), 0..64),
    )| {
        let (attributor, _rx) = SessionAttributor::channel();
        let mut engine = TimerEngine::new(config, attributor);
        let mut last_cycles = 0;

        for op in ops {
            match op {
                Op::Start => {
                    engine.start();
                }
                Op::Pause => {
                    engine.pause();
                }
                Op::Reset => {
                    engine.reset();
                }
                Op::Tick(n) => {
                    for _ in 0..n {
                        engine.tick();
                    }
                }
                Op::Select(phase) => {
                    // Rejected while running; either outcome is fine here.
                    let _ = engine.select_phase(phase);
                }
                Op::SetDurations(config) => {
                    let _ = engine.set_durations(config);
                }
            }

            prop_assert!(engine.remaining_secs() >= 1);
            prop_assert!(engine.remaining_secs() <= engine.total_secs());
            prop_assert!(engine.completed_cycles() >= last_cycles);
            last_cycles = engine.completed_cycles();
        }
    });
}

#[test]
fn work_phase_takes_exactly_its_ticks() {
    proptest!(|(config in arbitrary_config())| {
        let (attributor, _rx) = SessionAttributor::channel();
        let mut engine = TimerEngine::new(config.clone(), attributor);
        engine.start();

        let ticks = u64::from(config.work_minutes) * 60;
        for _ in 0..ticks - 1 {
            prop_assert!(engine.tick().is_none());
        }
        prop_assert!(engine.tick().is_some());

        prop_assert_eq!(engine.completed_cycles(), 1);
        let expected = if config.cycles_per_long_break == 1 {
            Phase::LongBreak
        } else {
            Phase::ShortBreak
        };
        prop_assert_eq!(engine.phase(), expected);
        prop_assert_eq!(engine.remaining_secs(), engine.total_secs());
        prop_assert!(!engine.is_running());
    });
}

#[test]
fn reset_restores_the_full_phase_length() {
    proptest!(|(config in arbitrary_config(), ticks in 0u64..500)| {
        let (attributor, _rx) = SessionAttributor::channel();
        let mut engine = TimerEngine::new(config, attributor);
        engine.start();
        for _ in 0..ticks {
            engine.tick();
        }

        engine.reset();
        prop_assert_eq!(engine.remaining_secs(), engine.total_secs());
        prop_assert!(!engine.is_running());
    });
}

#[test]
fn attributions_match_work_completions() {
    proptest!(|(phases in 1usize..12)| {
        let config = DurationConfig {
            work_minutes: 1,
            short_break_minutes: 1,
            long_break_minutes: 1,
            cycles_per_long_break: 3,
        };
        let (attributor, mut rx) = SessionAttributor::channel();
        let mut engine = TimerEngine::new(config, attributor);
        engine.set_active_task(Some("t1".to_string())).unwrap();

        let mut work_completions = 0;
        for _ in 0..phases {
            let in_work = engine.phase() == Phase::Work;
            engine.start();
            while engine.tick().is_none() {}
            if in_work {
                work_completions += 1;
            }
        }

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        prop_assert_eq!(received, work_completions);
        prop_assert_eq!(engine.completed_cycles(), work_completions);
    });
}
