//! This crate searches for the distance-spectrum-optimal CRC polynomial of a given degree for
//! a given convolutional code, feedforward or feedback, by progressively eliminating CRC
//! candidates based
//! on the number of low-weight error events they fail to detect. Search parameters are
//! specified on the command line, and search results are saved to a JSON file.
//!
//! Build the executable with `cargo build --release` and then run `./target/release/dsocrc -h`
//! for help on the command-line interface.

#![warn(
    clippy::complexity,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_allocation,
    unused_import_braces,
    unused_qualifications
)]

use anyhow::{Context, Result};
use clap::{crate_name, crate_version, value_parser, Arg, ArgMatches, Command};
use dsocrc::{run_search, SearchOutcome, SearchParams};
use std::time::Instant;

/// Main function
fn main() -> Result<()> {
    let timer = Instant::now();
    let matches = command_line_parser().get_matches();
    let params = search_params(&matches)?;
    let json_filename = &json_filename_from_matches(&matches);
    let report = run_search(&params, json_filename)?;
    print_outcome(&report.outcome);
    eprintln!("Elapsed time: {:.3?}", timer.elapsed());
    Ok(())
}

/// Returns command line parser.
fn command_line_parser() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about("Finds the distance-spectrum-optimal CRC for a convolutional code")
        .arg(code_polynomials())
        .arg(feedback_polynomial())
        .arg(crc_degree())
        .arg(search_distance())
        .arg(json_filename())
}

/// Returns argument for generator polynomials of the convolutional code.
fn code_polynomials() -> Arg {
    Arg::new("code_polynomials")
        .short('g')
        .default_value("13,15")
        .help("Generator polynomials of the convolutional code (octal, comma-separated)")
}

/// Returns argument for feedback polynomial of a recursive encoder.
fn feedback_polynomial() -> Arg {
    Arg::new("feedback_polynomial")
        .short('q')
        .help("Feedback polynomial for a recursive encoder (octal; omit for feedforward)")
}

/// Returns argument for degree of the CRC polynomials to consider.
fn crc_degree() -> Arg {
    Arg::new("crc_degree")
        .short('m')
        .value_parser(value_parser!(usize))
        .default_value("4")
        .help("Degree of the CRC polynomials to consider")
}

/// Returns argument for maximum Hamming distance examined.
fn search_distance() -> Arg {
    Arg::new("search_distance")
        .short('d')
        .value_parser(value_parser!(usize))
        .default_value("12")
        .help("Maximum Hamming distance examined")
}

/// Returns argument for name of JSON file to which results must be saved.
fn json_filename() -> Arg {
    Arg::new("json_filename")
        .short('f')
        .default_value("results.json")
        .help("Name of JSON file to which results must be saved")
}

/// Returns search parameters based on command-line arguments.
fn search_params(matches: &ArgMatches) -> Result<SearchParams> {
    Ok(SearchParams {
        code_polynomials: code_polynomials_from_matches(matches)?,
        feedback_polynomial: feedback_polynomial_from_matches(matches)?,
        crc_degree: crc_degree_from_matches(matches),
        search_distance: search_distance_from_matches(matches),
    })
}

/// Returns generator polynomials of the convolutional code.
fn code_polynomials_from_matches(matches: &ArgMatches) -> Result<Vec<usize>> {
    matches
        .get_one::<String>("code_polynomials")
        .unwrap()
        .split(',')
        .map(|octal| {
            usize::from_str_radix(octal.trim(), 8)
                .with_context(|| format!("Invalid octal generator polynomial `{octal}`"))
        })
        .collect()
}

/// Returns feedback polynomial of a recursive encoder, if one was given.
fn feedback_polynomial_from_matches(matches: &ArgMatches) -> Result<Option<usize>> {
    matches
        .get_one::<String>("feedback_polynomial")
        .map(|octal| {
            usize::from_str_radix(octal.trim(), 8)
                .with_context(|| format!("Invalid octal feedback polynomial `{octal}`"))
        })
        .transpose()
}

/// Returns degree of the CRC polynomials to consider.
fn crc_degree_from_matches(matches: &ArgMatches) -> usize {
    *matches.get_one("crc_degree").unwrap()
}

/// Returns maximum Hamming distance examined.
fn search_distance_from_matches(matches: &ArgMatches) -> usize {
    *matches.get_one("search_distance").unwrap()
}

/// Returns name of JSON file to which search results must be saved.
fn json_filename_from_matches(matches: &ArgMatches) -> String {
    matches
        .get_one::<String>("json_filename")
        .unwrap()
        .to_string()
}

/// Prints search outcome to standard output.
fn print_outcome(outcome: &SearchOutcome) {
    match outcome {
        SearchOutcome::Best {
            crc,
            distance,
            min_undetected_distance,
        } => {
            println!("Best CRC polynomial: {crc} (found at distance {distance})");
            match min_undetected_distance {
                Some(d) => println!("Smallest undetected error event distance: {d}"),
                None => println!("No undetected error events within the search distance"),
            }
        }
        SearchOutcome::Ambiguous {
            survivors,
            stopped_distance,
        } => {
            println!(
                "Search stopped at distance {stopped_distance} with {} candidates tied:",
                survivors.len()
            );
            for crc in survivors {
                println!("  {crc}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command_line_for_test() -> Vec<&'static str> {
        vec![
            crate_name!(),
            "-g",
            "5,7",
            "-m",
            "3",
            "-d",
            "10",
            "-f",
            "results.json",
        ]
    }

    #[test]
    fn test_command_line_parser() {
        assert!(command_line_parser()
            .try_get_matches_from(command_line_for_test())
            .is_ok());
    }

    #[test]
    fn test_search_params() {
        let matches = command_line_parser().get_matches_from(command_line_for_test());
        let params = search_params(&matches).unwrap();
        assert_eq!(params.code_polynomials, vec![0o5, 0o7]);
        assert_eq!(params.feedback_polynomial, None);
        assert_eq!(params.crc_degree, 3);
        assert_eq!(params.search_distance, 10);
    }

    #[test]
    fn test_search_params_with_feedback() {
        let matches = command_line_parser().get_matches_from(vec![
            crate_name!(),
            "-g",
            "13,15",
            "-q",
            "13",
            "-m",
            "4",
        ]);
        let params = search_params(&matches).unwrap();
        assert_eq!(params.code_polynomials, vec![0o13, 0o15]);
        assert_eq!(params.feedback_polynomial, Some(0o13));
    }

    #[test]
    fn test_feedback_polynomial_from_matches_rejects_bad_octal() {
        let matches =
            command_line_parser().get_matches_from(vec![crate_name!(), "-q", "19", "-m", "3"]);
        assert!(feedback_polynomial_from_matches(&matches).is_err());
    }

    #[test]
    fn test_code_polynomials_from_matches_rejects_bad_octal() {
        let matches =
            command_line_parser().get_matches_from(vec![crate_name!(), "-g", "5,8", "-m", "3"]);
        assert!(code_polynomials_from_matches(&matches).is_err());
    }

    #[test]
    fn test_json_filename_from_matches() {
        let matches = command_line_parser().get_matches_from(command_line_for_test());
        assert_eq!(json_filename_from_matches(&matches), "results.json");
    }
}
