//! Property tests for timestamp assignment.
//!
//! Random operation sequences are replayed step by step (failures
//! included) and the committed state is checked against the
//! succession and merge rules after every step.

use clockwork_core::scenario::Op;
use clockwork_core::{
    Clock, LamportClock, Scalar, Strategy as TimeStrategy, TimeOrder, Vector,
    VectorClock, VectorTime,
};
use proptest::prelude::*;

const NAMES: &[&str] = &["a", "b", "c", "d", "e", "f", "g", "h"];

fn arb_name() -> impl Strategy<Value = String> {
    proptest::sample::select(NAMES).prop_map(str::to_string)
}

fn arb_op() -> impl Strategy<Value = Op<u64>> {
    prop_oneof![
        4 => (0usize..4, arb_name()).prop_map(|(line, name)| Op::AddEvent { line, name }),
        3 => (arb_name(), arb_name()).prop_map(|(from, to)| Op::AddRelation { from, to }),
        1 => (arb_name(), arb_name()).prop_map(|(from, to)| Op::RemoveRelation { from, to }),
        1 => arb_name().prop_map(|name| Op::RemoveEvent { name }),
        1 => (0usize..4, 0u64..5).prop_map(|(line, time)| Op::SetStartingTime { line, time }),
        1 => proptest::option::of(0u64..3).prop_map(|start| Op::AddLine { start }),
        1 => proptest::option::of(0usize..4).prop_map(|index| Op::RemoveLine { index }),
    ]
}

fn arb_vector(len: usize) -> impl Strategy<Value = VectorTime> {
    proptest::collection::vec(0u64..10, len).prop_map(VectorTime::from)
}

/// Vector starting time with `time` in component `line` only.
fn own_line_start(line: usize, time: u64) -> VectorTime {
    let mut components = vec![0; line + 1];
    components[line] = time;
    VectorTime::from(components)
}

/// Check every committed event against the Lamport succession rules.
fn assert_lamport_consistent(clock: &LamportClock) -> Result<(), TestCaseError> {
    for (line, events) in clock.time().iter().enumerate() {
        let mut previous = *clock.starting_time(line).expect("line exists");
        for event in events {
            let expected = match &event.caused_by {
                None => previous + 1,
                Some(cause) => {
                    let cause = clock.event(cause).expect("cause exists");
                    let cause_line = clock.locate_event(&cause.name).expect("cause located").line;
                    prop_assert_ne!(cause_line, line, "relation within one line");
                    cause.time.max(previous) + 1
                }
            };
            prop_assert_eq!(event.time, expected, "event {}", &event.name);
            previous = event.time;
        }
    }
    Ok(())
}

fn build<S: TimeStrategy>(ops: Vec<Op<S::Time>>, lines: usize) -> Clock<S> {
    let mut clock = Clock::<S>::new(lines);
    for op in ops {
        let _ = op.apply(&mut clock);
    }
    clock
}

proptest! {
    #[test]
    fn prop_lamport_times_follow_succession_and_merge(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut clock = LamportClock::new(3);
        for op in ops {
            let _ = op.apply(&mut clock);
            assert_lamport_consistent(&clock)?;
        }
    }

    #[test]
    fn prop_failed_operations_leave_clock_unchanged(
        ops in proptest::collection::vec(arb_op(), 0..30),
        probe in arb_op(),
    ) {
        let mut clock = build::<Scalar>(ops, 3);
        let before = clock.clone();
        if probe.apply(&mut clock).is_err() {
            prop_assert_eq!(clock, before);
        }
    }

    #[test]
    fn prop_add_then_remove_relation_restores_times(
        ops in proptest::collection::vec(arb_op(), 0..30),
        from in arb_name(),
        to in arb_name(),
    ) {
        let mut clock = build::<Scalar>(ops, 3);
        prop_assume!(clock.event(&to).is_some_and(|e| e.caused_by.is_none()));
        let before = clock.clone();

        if clock.add_relation(&from, &to).is_ok() {
            clock.remove_relation(&from, &to).expect("relation just added");
            prop_assert_eq!(clock, before);
        }
    }

    #[test]
    fn prop_removed_event_leaves_no_references(
        ops in proptest::collection::vec(arb_op(), 0..30),
        victim in arb_name(),
    ) {
        let mut clock = build::<Scalar>(ops, 3);
        let existed = clock.locate_event(&victim).is_some();
        let before = clock.clone();
        clock.remove_event(&victim).expect("remove_event never rejects a name");
        prop_assert!(clock.locate_event(&victim).is_none());
        prop_assert!(clock.relations().iter().all(|(from, to)| from != &victim && to != &victim));
        if !existed {
            prop_assert_eq!(clock, before);
        }
    }

    #[test]
    fn prop_vector_merge_dominates_and_bumps_own(
        own in 0usize..4,
        cause in arb_vector(4),
        predecessor in arb_vector(4),
    ) {
        let merged = Vector::merge(own, &cause, &predecessor);
        for i in 0..4 {
            let max = cause.get(i).max(predecessor.get(i));
            if i == own {
                prop_assert_eq!(merged.get(i), max + 1);
            } else {
                prop_assert_eq!(merged.get(i), max);
            }
        }
        prop_assert!(cause.leq(&merged) && predecessor.leq(&merged));
    }

    #[test]
    fn prop_vector_causes_happen_before_effects(ops in proptest::collection::vec(arb_op(), 0..30)) {
        let ops: Vec<Op<VectorTime>> = ops
            .into_iter()
            .map(|op| match op {
                Op::SetStartingTime { line, time } => Op::SetStartingTime {
                    line,
                    time: own_line_start(line, time),
                },
                Op::AddLine { .. } => Op::AddLine { start: None },
                Op::RemoveLine { index } => Op::RemoveLine { index },
                Op::AddEvent { line, name } => Op::AddEvent { line, name },
                Op::RemoveEvent { name } => Op::RemoveEvent { name },
                Op::AddRelation { from, to } => Op::AddRelation { from, to },
                Op::RemoveRelation { from, to } => Op::RemoveRelation { from, to },
            })
            .collect();
        let clock: VectorClock = build::<Vector>(ops, 3);

        for events in clock.time() {
            for pair in events.windows(2) {
                prop_assert_eq!(
                    clock.order(&pair[0].name, &pair[1].name),
                    Ok(TimeOrder::Before)
                );
            }
            for event in &events {
                if let Some(cause) = &event.caused_by {
                    prop_assert_eq!(
                        clock.order(cause, &event.name),
                        Ok(TimeOrder::Before)
                    );
                }
            }
        }
    }
}
