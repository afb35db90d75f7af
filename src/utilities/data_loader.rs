//! Loads round histories from CSV, mainly for test fixtures. Persistence of
//! live session data is a presentation-layer concern and stays out of the
//! core.

use crate::indicators::score::{classify_round, Round};
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use std::error::Error;
use std::fs::File;

/// Reads `timestamp,multiplier` rows into classified rounds, scoring each
/// multiplier against `pink_threshold`.
pub fn read_rounds_from_csv(
    file_path: &str,
    pink_threshold: f64,
) -> Result<Vec<Round>, Box<dyn Error>> {
    let file = File::open(file_path)?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut rounds = Vec::new();
    for record in reader.records() {
        let record = record?;
        let timestamp: DateTime<Utc> = record
            .get(0)
            .ok_or("Missing timestamp column")?
            .parse()
            .map_err(|e| format!("Invalid timestamp: {}", e))?;
        let multiplier: f64 = record
            .get(1)
            .ok_or("Missing multiplier column")?
            .parse()
            .map_err(|e| format!("Invalid multiplier: {}", e))?;
        let (_, score) = classify_round(multiplier, pink_threshold)?;
        rounds.push(Round {
            timestamp,
            multiplier,
            score,
        });
    }
    Ok(rounds)
}
