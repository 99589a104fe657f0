//! Candidate-elimination search for the best CRC polynomial

use std::fs::File;
use std::io::{BufWriter, Write};

use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    collect_error_events, discard_catastrophic, undetected_count, Bit, CrcPolynomial, Error,
    ErrorEvent, Trellis,
};

/// Parameters for a CRC polynomial search
#[derive(Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct SearchParams {
    /// Generator polynomials of the convolutional code
    pub code_polynomials: Vec<usize>,
    /// Feedback polynomial, if the encoder is recursive
    #[serde(default)]
    pub feedback_polynomial: Option<usize>,
    /// Degree of the CRC polynomials to consider
    pub crc_degree: usize,
    /// Maximum Hamming distance (and trellis depth) examined
    pub search_distance: usize,
}

/// Outcome of a CRC polynomial search
#[derive(Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub enum SearchOutcome {
    /// A single best CRC polynomial was identified
    Best {
        /// The winning polynomial
        crc: CrcPolynomial,
        /// Distance at which all other candidates had been eliminated
        distance: usize,
        /// Smallest distance at which the winner misses an error event, if any within budget
        min_undetected_distance: Option<usize>,
    },
    /// The distance budget ran out with several candidates still tied
    Ambiguous {
        /// Candidates that survived every elimination step
        survivors: Vec<CrcPolynomial>,
        /// Distance at which the search stopped
        stopped_distance: usize,
    },
}

/// Report of a completed CRC polynomial search
#[derive(Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct SearchReport {
    /// Parameters the search ran with
    pub params: SearchParams,
    /// Number of CRC candidates examined
    pub num_candidates: usize,
    /// Number of pooled non-catastrophic error events at each distance (index is distance).
    /// Counts near `search_distance` can be incomplete, since an event's remerge depth shares
    /// the budget with its weight (see [`collect_error_events`]).
    pub num_events_per_distance: Vec<usize>,
    /// Outcome of the search
    pub outcome: SearchOutcome,
}

/// Returns the best CRC polynomial of given degree for the given trellis.
///
/// Collects all error events up to `search_distance`, discards catastrophic ones, and then
/// eliminates CRC candidates distance by distance: at each distance with at least one pooled
/// error event, every surviving candidate is scored by the number of events it fails to
/// detect, and only the candidates achieving the minimum count are retained (ties kept). The
/// search returns early as soon as a single candidate remains.
///
/// # Errors
///
/// Returns an error if the CRC degree or search distance is invalid, or if every candidate is
/// eliminated at some distance (which the ties-inclusive elimination rules out; seeing it
/// means an internal invariant was violated).
///
/// # Examples
///
/// ```
/// use dsocrc::{search_best_crc, Trellis};
///
/// let trellis = Trellis::new(&[0o5, 0o7], None)?;
/// let outcome = search_best_crc(&trellis, 3, 8)?;
/// println!("{outcome:?}");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn search_best_crc(
    trellis: &Trellis,
    crc_degree: usize,
    search_distance: usize,
) -> Result<SearchOutcome, Error> {
    check_search_distance(search_distance)?;
    let events_per_state = collect_error_events(trellis, search_distance);
    search_with_events(trellis, &events_per_state, crc_degree, search_distance)
}

/// Returns the best CRC polynomial of given degree for pre-collected error events.
///
/// Behaves exactly like [`search_best_crc`], but takes the per-state error-event lists as an
/// input instead of collecting them, so one expensive collection can back several searches
/// (e.g. over different CRC degrees).
///
/// # Errors
///
/// As for [`search_best_crc`], plus [`Error::MalformedErrorEvent`] if a supplied event does
/// not match the trellis topology.
pub fn search_with_events(
    trellis: &Trellis,
    events_per_state: &[Vec<ErrorEvent>],
    crc_degree: usize,
    search_distance: usize,
) -> Result<SearchOutcome, Error> {
    check_search_distance(search_distance)?;
    let candidates = CrcPolynomial::all_of_degree(crc_degree)?;
    let filtered = discard_catastrophic(trellis, events_per_state)?;
    let buckets = pooled_patterns_by_distance(&filtered, search_distance);
    let (_snapshots, outcome) = whittle_candidates(candidates, &buckets)?;
    Ok(outcome)
}

/// Runs a full search for given parameters and saves a JSON report to given file.
///
/// # Errors
///
/// Returns an error if the parameters are invalid or if the report cannot be written.
pub fn run_search(params: &SearchParams, json_filename: &str) -> Result<SearchReport, Error> {
    check_search_params(params)?;
    let trellis = Trellis::new(&params.code_polynomials, params.feedback_polynomial)?;
    let candidates = CrcPolynomial::all_of_degree(params.crc_degree)?;
    let events_per_state = collect_error_events(&trellis, params.search_distance);
    let filtered = discard_catastrophic(&trellis, &events_per_state)?;
    let buckets = pooled_patterns_by_distance(&filtered, params.search_distance);
    eprintln!(
        "{} non-catastrophic error events pooled, {} CRC candidates of degree {}",
        buckets.iter().map(Vec::len).sum::<usize>(),
        candidates.len(),
        params.crc_degree
    );
    let num_candidates = candidates.len();
    let (_snapshots, outcome) = whittle_candidates(candidates, &buckets)?;
    let report = SearchReport {
        params: params.clone(),
        num_candidates,
        num_events_per_distance: buckets.iter().map(Vec::len).collect(),
        outcome,
    };
    let mut writer = BufWriter::new(File::create(json_filename)?);
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writer.flush()?;
    Ok(report)
}

/// Pools the difference patterns of all states' events into per-distance buckets.
///
/// Bucket `d` holds the patterns of Hamming weight exactly `d`. Divisibility by a CRC is a
/// property of the pattern alone, not of the state the event started from, so the originating
/// state is dropped here.
fn pooled_patterns_by_distance(
    events_per_state: &[Vec<ErrorEvent>],
    search_distance: usize,
) -> Vec<Vec<Vec<Bit>>> {
    let mut buckets = vec![Vec::new(); search_distance + 1];
    for events in events_per_state {
        for event in events {
            if event.weight <= search_distance {
                buckets[event.weight].push(event.pattern.clone());
            }
        }
    }
    buckets
}

/// Whittles the candidate set down across distances, returning the per-step snapshots and the
/// final outcome.
///
/// The candidate pool is never mutated in place: each elimination step produces a fresh
/// snapshot (`snapshots[k + 1]` is a subset of `snapshots[k]`), which keeps the process
/// auditable step by step. Distances with an empty bucket are skipped, since every count
/// would be zero and nobody could be eliminated. Counting across the surviving candidates at
/// one distance is parallel; elimination is applied only after all counts are in.
fn whittle_candidates(
    candidates: Vec<CrcPolynomial>,
    buckets: &[Vec<Vec<Bit>>],
) -> Result<(Vec<Vec<CrcPolynomial>>, SearchOutcome), Error> {
    let search_distance = buckets.len().saturating_sub(1);
    let mut snapshots = vec![candidates];
    if snapshots[0].len() == 1 {
        let crc = snapshots[0][0];
        let outcome = SearchOutcome::Best {
            crc,
            distance: 0,
            min_undetected_distance: min_undetected_distance(crc, buckets),
        };
        return Ok((snapshots, outcome));
    }
    for distance in 1 ..= search_distance {
        let bucket = &buckets[distance];
        if bucket.is_empty() {
            continue;
        }
        let survivors = &snapshots[snapshots.len() - 1];
        let counts: Vec<usize> = survivors
            .par_iter()
            .map(|&crc| undetected_count(crc, bucket))
            .collect();
        let next: Vec<CrcPolynomial> = survivors
            .iter()
            .copied()
            .zip(counts)
            .min_set_by_key(|&(_, count)| count)
            .into_iter()
            .map(|(crc, _)| crc)
            .collect();
        if next.is_empty() {
            return Err(Error::NoSurvivingCandidates(distance));
        }
        let found_best = next.len() == 1;
        snapshots.push(next);
        if found_best {
            let crc = snapshots[snapshots.len() - 1][0];
            let outcome = SearchOutcome::Best {
                crc,
                distance,
                min_undetected_distance: min_undetected_distance(crc, buckets),
            };
            return Ok((snapshots, outcome));
        }
    }
    let survivors = snapshots[snapshots.len() - 1].clone();
    Ok((
        snapshots,
        SearchOutcome::Ambiguous {
            survivors,
            stopped_distance: search_distance,
        },
    ))
}

/// Returns the smallest distance at which the CRC misses an error event, if any.
fn min_undetected_distance(crc: CrcPolynomial, buckets: &[Vec<Vec<Bit>>]) -> Option<usize> {
    (1 .. buckets.len()).find(|&distance| undetected_count(crc, &buckets[distance]) > 0)
}

/// Checks validity of a search distance.
fn check_search_distance(search_distance: usize) -> Result<(), Error> {
    if search_distance == 0 {
        return Err(Error::InvalidInput(
            "Search distance must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Checks validity of search parameters.
fn check_search_params(params: &SearchParams) -> Result<(), Error> {
    check_search_distance(params.search_distance)?;
    if params.crc_degree == 0 {
        return Err(Error::InvalidInput(
            "CRC degree must be positive".to_string(),
        ));
    }
    Ok(())
}
