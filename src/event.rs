//! Bounded search for error events of a convolutional-code trellis

use rayon::prelude::*;

use crate::{Bit, Trellis};

/// Error event of a convolutional-code trellis
///
/// An error event starts at some trellis state, immediately diverges from the zero-input
/// (correct) path out of that state, and remerges with it after `remerge_depth` steps. The
/// `pattern` holds the output bit differences between the two paths over the divergence, and
/// `weight` is the pattern's Hamming weight; a decoder that picks the error path over the
/// correct one is wrong in exactly those `weight` code bit positions.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ErrorEvent {
    /// State at which the divergence begins
    pub start_state: usize,
    /// Input bits along the error path
    pub inputs: Vec<Bit>,
    /// States visited by the error path (length `remerge_depth + 1`, starting at `start_state`)
    pub states: Vec<usize>,
    /// Output bit differences between the error path and the correct path
    pub pattern: Vec<Bit>,
    /// Trellis depth at which the error path remerges with the correct path
    pub remerge_depth: usize,
    /// Hamming weight of the difference pattern
    pub weight: usize,
}

/// Partial error path being grown by the depth-first search
struct PartialPath {
    inputs: Vec<Bit>,
    states: Vec<usize>,
    pattern: Vec<Bit>,
    weight: usize,
}

/// Returns all error events of the trellis, one list per nonzero state.
///
/// Entry `i` of the returned vector holds the events whose divergence begins at state `i + 1`,
/// so there are `trellis.num_states() - 1` lists in state-index order (lists may be empty).
/// Each event remerges within `search_distance` trellis steps and has a difference pattern of
/// Hamming weight at most `search_distance`; partial paths whose accumulated weight already
/// exceeds that bound are abandoned, since extending a path can never shed weight. The search
/// for each state is independent of the others and runs in parallel.
///
/// The remerge depth and the pattern weight share the one budget, so an event is collected
/// only if both stay within it. A trellis whose divergence cycles gain weight slower than one
/// per step has events whose depth exceeds their weight; such an event is dropped even though
/// its weight fits the budget, leaving the weight buckets near `search_distance` incomplete.
/// Collect with a larger budget if those buckets must be exact.
///
/// # Examples
///
/// ```
/// use dsocrc::{collect_error_events, Trellis};
///
/// let trellis = Trellis::new(&[0o5, 0o7], None)?;
/// let events_per_state = collect_error_events(&trellis, 5);
/// assert_eq!(events_per_state.len(), trellis.num_states() - 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[must_use]
pub fn collect_error_events(trellis: &Trellis, search_distance: usize) -> Vec<Vec<ErrorEvent>> {
    (1 .. trellis.num_states())
        .into_par_iter()
        .map(|start_state| events_from_state(trellis, start_state, search_distance))
        .collect()
}

/// Returns all error events whose divergence begins at given state.
fn events_from_state(
    trellis: &Trellis,
    start_state: usize,
    search_distance: usize,
) -> Vec<ErrorEvent> {
    let mut events = Vec::new();
    if search_distance == 0 {
        return events;
    }
    let mut path = PartialPath {
        inputs: Vec::with_capacity(search_distance),
        states: vec![start_state],
        pattern: Vec::with_capacity(search_distance * trellis.num_output_bits()),
        weight: 0,
    };
    // The first input bit must differ from the correct path's zero input; afterwards both
    // input bits are explored until the paths remerge or the bounds are hit.
    extend_path(
        trellis,
        start_state,
        start_state,
        Bit::One,
        search_distance,
        &mut path,
        &mut events,
    );
    events
}

/// Grows the partial error path by one transition, recording a remerge or recursing.
///
/// `correct_state` is where the zero-input path from the start state has reached; it is
/// stepped through the trellis alongside the error path (for a feedback encoder it does not
/// simply shift toward zero).
fn extend_path(
    trellis: &Trellis,
    start_state: usize,
    correct_state: usize,
    input_bit: Bit,
    search_distance: usize,
    path: &mut PartialPath,
    events: &mut Vec<ErrorEvent>,
) {
    let depth = path.inputs.len();
    let state = *path.states.last().unwrap_or(&start_state);
    let branch_bits = trellis.output_bits(state, input_bit);
    let correct_bits = trellis.output_bits(correct_state, Bit::Zero);
    let diff_bits: Vec<Bit> = branch_bits
        .iter()
        .zip(correct_bits.iter())
        .map(|(&b, &c)| b.xor(c))
        .collect();
    let branch_weight: usize = diff_bits.iter().map(|&b| b as usize).sum();
    if path.weight + branch_weight > search_distance {
        return;
    }
    let next_state = trellis.next_state(state, input_bit);
    let next_correct_state = trellis.next_state(correct_state, Bit::Zero);
    path.inputs.push(input_bit);
    path.states.push(next_state);
    path.pattern.extend(diff_bits);
    path.weight += branch_weight;
    if next_state == next_correct_state {
        events.push(ErrorEvent {
            start_state,
            inputs: path.inputs.clone(),
            states: path.states.clone(),
            pattern: path.pattern.clone(),
            remerge_depth: depth + 1,
            weight: path.weight,
        });
    } else if depth + 1 < search_distance {
        extend_path(
            trellis,
            start_state,
            next_correct_state,
            Bit::Zero,
            search_distance,
            path,
            events,
        );
        extend_path(
            trellis,
            start_state,
            next_correct_state,
            Bit::One,
            search_distance,
            path,
            events,
        );
    }
    path.inputs.pop();
    path.states.pop();
    path.pattern
        .truncate(path.pattern.len() - trellis.num_output_bits());
    path.weight -= branch_weight;
}

#[cfg(test)]
mod tests_of_functions {
    use super::*;
    use Bit::{One, Zero};

    #[test]
    fn test_collect_error_events_list_count() {
        let trellis = Trellis::new(&[0o5, 0o7], None).unwrap();
        assert_eq!(collect_error_events(&trellis, 5).len(), 3);
        let trellis = Trellis::new(&[0o13, 0o15], None).unwrap();
        assert_eq!(collect_error_events(&trellis, 6).len(), 7);
    }

    #[test]
    fn test_collect_error_events_bounds() {
        let trellis = Trellis::new(&[0o5, 0o7], None).unwrap();
        let search_distance = 7;
        for events in collect_error_events(&trellis, search_distance) {
            assert!(!events.is_empty());
            for event in events {
                assert!(event.remerge_depth >= 2);
                assert!(event.remerge_depth <= search_distance);
                assert!(event.weight <= search_distance);
                assert_eq!(event.inputs.len(), event.remerge_depth);
                assert_eq!(event.states.len(), event.remerge_depth + 1);
                assert_eq!(event.states[0], event.start_state);
                assert_eq!(
                    event.pattern.len(),
                    event.remerge_depth * trellis.num_output_bits()
                );
                let weight: usize = event.pattern.iter().map(|&b| b as usize).sum();
                assert_eq!(weight, event.weight);
            }
        }
    }

    #[test]
    fn test_collect_error_events_free_distance() {
        // The (5, 7) code has free distance 5 with a unique minimum-weight event, the
        // three-step divergence with difference pattern 11 01 11.
        let trellis = Trellis::new(&[0o5, 0o7], None).unwrap();
        for events in collect_error_events(&trellis, 5) {
            let minimal: Vec<&ErrorEvent> = events.iter().filter(|e| e.weight == 5).collect();
            assert_eq!(minimal.len(), 1);
            assert_eq!(minimal[0].remerge_depth, 3);
            assert_eq!(minimal[0].inputs, [One, Zero, Zero]);
            assert_eq!(minimal[0].pattern, [One, One, Zero, One, One, One]);
            assert!(events.iter().all(|e| e.weight == 5));
        }
    }

    #[test]
    fn test_collect_error_events_patterns_agree_across_states() {
        // The encoder is linear, so the difference patterns reachable from every state are
        // the same set; only the visited states differ.
        let trellis = Trellis::new(&[0o13, 0o15], None).unwrap();
        let events_per_state = collect_error_events(&trellis, 8);
        let reference: Vec<(Vec<Bit>, Vec<Bit>)> = events_per_state[0]
            .iter()
            .map(|e| (e.inputs.clone(), e.pattern.clone()))
            .collect();
        for events in &events_per_state[1 ..] {
            let other: Vec<(Vec<Bit>, Vec<Bit>)> = events
                .iter()
                .map(|e| (e.inputs.clone(), e.pattern.clone()))
                .collect();
            assert_eq!(other, reference);
        }
    }

    #[test]
    fn test_collect_error_events_feedback_encoder() {
        // Recursive systematic [1, 15/13] encoder. The correct path from a nonzero state
        // never reaches state 0 on zero inputs alone, so remerges are against the stepped
        // zero-input trajectory, and every recorded path must be a real trellis walk.
        let trellis = Trellis::new(&[0o13, 0o15], Some(0o13)).unwrap();
        let search_distance = 8;
        let events_per_state = collect_error_events(&trellis, search_distance);
        assert_eq!(events_per_state.len(), 7);
        for (index, events) in events_per_state.iter().enumerate() {
            assert!(!events.is_empty());
            let start_state = index + 1;
            for event in events {
                assert_eq!(event.start_state, start_state);
                assert!(event.weight <= search_distance);
                assert!(event.remerge_depth <= search_distance);
                let mut correct_state = start_state;
                for (depth, &input_bit) in event.inputs.iter().enumerate() {
                    assert_eq!(
                        trellis.next_state(event.states[depth], input_bit),
                        event.states[depth + 1]
                    );
                    correct_state = trellis.next_state(correct_state, Zero);
                }
                assert_eq!(*event.states.last().unwrap(), correct_state);
                let weight: usize = event.pattern.iter().map(|&b| b as usize).sum();
                assert_eq!(weight, event.weight);
            }
        }
    }

    #[test]
    fn test_collect_error_events_feedback_patterns_agree_across_states() {
        let trellis = Trellis::new(&[0o13, 0o15], Some(0o13)).unwrap();
        let events_per_state = collect_error_events(&trellis, 8);
        let reference: Vec<Vec<Bit>> = events_per_state[0]
            .iter()
            .map(|e| e.pattern.clone())
            .collect();
        for events in &events_per_state[1 ..] {
            let other: Vec<Vec<Bit>> = events.iter().map(|e| e.pattern.clone()).collect();
            assert_eq!(other, reference);
        }
    }

    #[test]
    fn test_collect_error_events_tight_budgets() {
        let trellis = Trellis::new(&[0o5, 0o7], None).unwrap();
        // No divergence can remerge within zero or one steps, and none can accumulate
        // weight 5 within a budget of 4.
        for search_distance in [0, 1, 2, 4] {
            for events in collect_error_events(&trellis, search_distance) {
                assert!(events.is_empty());
            }
        }
    }

    #[test]
    fn test_collect_error_events_depth_shares_the_budget() {
        // The (5, 7) divergence cycle through states 2 and 1 gains weight 1 per 2 steps, so
        // a weight-8 event takes 9 steps and is collected only once the budget covers its
        // depth; the weight-8 bucket at a budget of exactly 8 is incomplete.
        let trellis = Trellis::new(&[0o5, 0o7], None).unwrap();
        let events_at_8 = collect_error_events(&trellis, 8);
        let events_at_9 = collect_error_events(&trellis, 9);
        assert!(events_at_9[0]
            .iter()
            .any(|e| e.weight == 8 && e.remerge_depth == 9));
        assert!(events_at_8[0].iter().all(|e| e.remerge_depth <= 8));
        let weight_8_at_8 = events_at_8[0].iter().filter(|e| e.weight == 8).count();
        let weight_8_at_9 = events_at_9[0].iter().filter(|e| e.weight == 8).count();
        assert!(weight_8_at_9 > weight_8_at_8);
    }

    #[test]
    fn test_collect_error_events_deterministic() {
        let trellis = Trellis::new(&[0o13, 0o15], None).unwrap();
        assert_eq!(
            collect_error_events(&trellis, 7),
            collect_error_events(&trellis, 7)
        );
    }
}
