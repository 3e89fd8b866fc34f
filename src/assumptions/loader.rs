//! CSV-based mortality table loader
//!
//! Tables are stored as `age,female,male` rows, one row per age. Ages must be
//! contiguous; rows may appear in any order.

use std::fs::File;
use std::path::Path;

use crate::error::MortalityError;
use crate::participant::Gender;

/// Raw CSV row
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    age: u32,
    female: f64,
    male: f64,
}

/// Both gender columns of a table as read from disk
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRates {
    pub min_age: u32,
    pub female: Vec<f64>,
    pub male: Vec<f64>,
}

impl LoadedRates {
    /// The qx column for `gender`
    pub fn column(&self, gender: Gender) -> &[f64] {
        match gender {
            Gender::Female => &self.female,
            Gender::Male => &self.male,
        }
    }
}

/// Load a mortality table from a CSV file
pub fn load_mortality_csv(table: &str, path: &Path) -> Result<LoadedRates, MortalityError> {
    let file = File::open(path).map_err(|e| MortalityError::Load {
        table: table.to_string(),
        reason: format!("{}: {}", path.display(), e),
    })?;
    load_mortality_from_reader(table, file)
}

/// Load a mortality table from any reader
pub fn load_mortality_from_reader<R: std::io::Read>(
    table: &str,
    reader: R,
) -> Result<LoadedRates, MortalityError> {
    let load_err = |e: csv::Error| MortalityError::Load {
        table: table.to_string(),
        reason: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: CsvRow = result.map_err(load_err)?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(MortalityError::InvalidTable {
            table: table.to_string(),
            reason: "no rows".to_string(),
        });
    }

    rows.sort_by_key(|row| row.age);

    let min_age = rows[0].age;
    for (idx, row) in rows.iter().enumerate() {
        let expected = min_age + idx as u32;
        if row.age != expected {
            return Err(MortalityError::InvalidTable {
                table: table.to_string(),
                reason: format!("ages are not contiguous: expected {}, found {}", expected, row.age),
            });
        }
    }

    Ok(LoadedRates {
        min_age,
        female: rows.iter().map(|r| r.female).collect(),
        male: rows.iter().map(|r| r.male).collect(),
    })
}
