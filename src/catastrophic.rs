//! Structural filter for catastrophic error events

use std::collections::HashSet;

use crate::{Bit, Error, ErrorEvent, Trellis};

/// Trellis edge, keyed by source state and input bit value
type Edge = (usize, usize);

/// Removes catastrophic error events from the per-state event lists.
///
/// An event is catastrophic when its divergence traverses a trellis edge that lies on a
/// zero-output-weight cycle: such a loop can repeat indefinitely without accumulating any
/// distance, so the event's detectability is independent of the CRC choice and it must not
/// take part in the distance-based candidate elimination. The classification is a property of
/// the event's path against the trellis topology, not of its bit pattern; the set of edges on
/// zero-weight cycles is computed once per call and reused for every event.
///
/// Filtering is idempotent: running it again on its own output removes nothing further.
///
/// # Errors
///
/// Returns [`Error::MalformedErrorEvent`] if an event's recorded path does not match the
/// trellis topology (wrong path lengths, out-of-range states, or transitions the trellis does
/// not have). Such events are never silently dropped.
pub fn discard_catastrophic(
    trellis: &Trellis,
    events_per_state: &[Vec<ErrorEvent>],
) -> Result<Vec<Vec<ErrorEvent>>, Error> {
    let looping_edges = zero_weight_loop_edges(trellis);
    events_per_state
        .iter()
        .map(|events| {
            events
                .iter()
                .filter_map(|event| {
                    match divergence_rides_loop(trellis, &looping_edges, event) {
                        Ok(true) => None,
                        Ok(false) => Some(Ok(event.clone())),
                        Err(err) => Some(Err(err)),
                    }
                })
                .collect()
        })
        .collect()
}

/// Returns the trellis edges that lie on a zero-output-weight cycle.
///
/// The all-zero self-loop at state 0 is the correct path itself and is not counted as a
/// cycle. An edge `u -> v` lies on a cycle exactly when `v` can reach `u` again through
/// zero-weight edges.
fn zero_weight_loop_edges(trellis: &Trellis) -> HashSet<Edge> {
    let mut zero_edges: Vec<(usize, usize, usize)> = Vec::new();
    for state in 0 .. trellis.num_states() {
        for input_bit in [Bit::Zero, Bit::One] {
            if state == 0 && input_bit == Bit::Zero {
                continue;
            }
            if trellis.output_weight(state, input_bit) == 0 {
                zero_edges.push((state, input_bit as usize, trellis.next_state(state, input_bit)));
            }
        }
    }
    zero_edges
        .iter()
        .filter(|&&(source, _, target)| reaches(&zero_edges, target, source))
        .map(|&(source, input_val, _)| (source, input_val))
        .collect()
}

/// Returns whether `target` is reachable from `from` over the given edges (trivially true
/// when they coincide).
fn reaches(zero_edges: &[(usize, usize, usize)], from: usize, target: usize) -> bool {
    let mut visited = HashSet::new();
    let mut frontier = vec![from];
    while let Some(state) = frontier.pop() {
        if state == target {
            return true;
        }
        if visited.insert(state) {
            for &(source, _, next) in zero_edges {
                if source == state {
                    frontier.push(next);
                }
            }
        }
    }
    false
}

/// Returns whether the event's divergence path uses an edge on a zero-weight cycle.
///
/// The divergence path is the state trajectory of the difference between the error path and
/// the zero-input correct path from the same start state. Both the next-state map and the
/// output map are linear over GF(2), feedback encoders included, so its states are the
/// bitwise XOR of the two paths' states and its inputs are the error-path inputs (the correct
/// path's inputs are all zero).
fn divergence_rides_loop(
    trellis: &Trellis,
    looping_edges: &HashSet<Edge>,
    event: &ErrorEvent,
) -> Result<bool, Error> {
    check_event_shape(trellis, event)?;
    let mut correct_state = event.start_state;
    let mut rides_loop = false;
    for (depth, &input_bit) in event.inputs.iter().enumerate() {
        let state = event.states[depth];
        if trellis.next_state(state, input_bit) != event.states[depth + 1] {
            return Err(Error::MalformedErrorEvent(format!(
                "no transition from state {} to state {} on input {} at depth {}",
                state,
                event.states[depth + 1],
                input_bit as usize,
                depth,
            )));
        }
        let divergence_state = state ^ correct_state;
        if looping_edges.contains(&(divergence_state, input_bit as usize)) {
            rides_loop = true;
        }
        correct_state = trellis.next_state(correct_state, Bit::Zero);
    }
    Ok(rides_loop)
}

/// Checks that the event's recorded path has a consistent shape for the trellis.
fn check_event_shape(trellis: &Trellis, event: &ErrorEvent) -> Result<(), Error> {
    if event.states.len() != event.inputs.len() + 1
        || event.states.first() != Some(&event.start_state)
        || event.remerge_depth != event.inputs.len()
    {
        return Err(Error::MalformedErrorEvent(format!(
            "inconsistent path lengths for event starting at state {}",
            event.start_state
        )));
    }
    if let Some(&state) = event.states.iter().find(|&&s| s >= trellis.num_states()) {
        return Err(Error::MalformedErrorEvent(format!(
            "state {} out of range for a {}-state trellis",
            state,
            trellis.num_states()
        )));
    }
    Ok(())
}
