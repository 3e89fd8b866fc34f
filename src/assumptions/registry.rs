//! Shared, immutable registry of mortality tables
//!
//! The set of table sources is fixed when the registry is built. Each
//! (table, gender) slot is populated lazily on first reference, exactly once,
//! behind a `OnceLock`; concurrent first accesses block on the same
//! initialisation instead of loading twice. Load failures are cached too, so
//! a broken file is read once and reported to every caller.
//!
//! After population a slot is never written again, which makes every read
//! lock-free.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use log::info;

use super::loader::load_mortality_csv;
use super::mortality::{MortalityPoint, MortalityTable, SurvivalPoint};
use super::tables::BuiltinTable;
use crate::config::DEFAULT_RADIX;
use crate::error::MortalityError;
use crate::participant::Gender;

/// Where the rates of a table come from
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    /// Compiled into the binary
    Builtin(BuiltinTable),
    /// `age,female,male` CSV file read on first use
    CsvFile(PathBuf),
    /// Rates supplied in memory
    Rates {
        min_age: u32,
        female: Vec<f64>,
        male: Vec<f64>,
    },
}

/// CSV table registered under a name, written `NAME=PATH` on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedCsvTable {
    pub name: String,
    pub path: PathBuf,
}

impl FromStr for NamedCsvTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=PATH, got {}", s))?;
        let (name, path) = (name.trim(), path.trim());
        if name.is_empty() || path.is_empty() {
            return Err(format!("empty table name or path in {}", s));
        }
        Ok(Self {
            name: name.to_string(),
            path: PathBuf::from(path),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TableKey {
    name: String,
    gender: Gender,
}

impl TableKey {
    fn new(name: &str, gender: Gender) -> Self {
        Self {
            name: normalize_name(name),
            gender,
        }
    }
}

/// Table names are matched case-insensitively
fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

#[derive(Debug)]
struct Slot {
    source: Arc<TableSource>,
    table: OnceLock<Result<Arc<MortalityTable>, MortalityError>>,
}

/// Registry of mortality tables keyed by (name, gender)
#[derive(Debug)]
pub struct MortalityRegistry {
    slots: HashMap<TableKey, Slot>,
    names: Vec<String>,
    radix: f64,
}

/// Builder for [`MortalityRegistry`]
#[derive(Debug, Clone)]
pub struct MortalityRegistryBuilder {
    sources: Vec<(String, TableSource)>,
    radix: f64,
}

impl MortalityRegistryBuilder {
    /// Register every compiled-in table
    pub fn with_builtin_tables(mut self) -> Self {
        for table in BuiltinTable::ALL {
            self.sources
                .push((table.name().to_string(), TableSource::Builtin(table)));
        }
        self
    }

    /// Register a CSV file under `name`
    pub fn with_csv_file(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.sources
            .push((name.to_string(), TableSource::CsvFile(path.into())));
        self
    }

    /// Register every `NAME=PATH` table in order
    pub fn with_csv_tables(mut self, tables: &[NamedCsvTable]) -> Self {
        for table in tables {
            info!("Registering mortality table {} from {}", table.name, table.path.display());
            self = self.with_csv_file(&table.name, table.path.clone());
        }
        self
    }

    /// Register in-memory rates under `name`
    pub fn with_rates(mut self, name: &str, min_age: u32, female: Vec<f64>, male: Vec<f64>) -> Self {
        self.sources
            .push((name.to_string(), TableSource::Rates { min_age, female, male }));
        self
    }

    /// Survivor cohort at the first age of every table
    pub fn radix(mut self, radix: f64) -> Self {
        self.radix = radix;
        self
    }

    /// Freeze the source list. A later registration under the same name wins.
    pub fn build(self) -> MortalityRegistry {
        let mut slots = HashMap::new();
        let mut names: Vec<String> = Vec::new();

        for (name, source) in self.sources {
            let normalized = normalize_name(&name);
            if !names.contains(&normalized) {
                names.push(normalized.clone());
            }
            let source = Arc::new(source);
            for gender in [Gender::Female, Gender::Male] {
                slots.insert(
                    TableKey {
                        name: normalized.clone(),
                        gender,
                    },
                    Slot {
                        source: Arc::clone(&source),
                        table: OnceLock::new(),
                    },
                );
            }
        }
        names.sort();

        MortalityRegistry {
            slots,
            names,
            radix: self.radix,
        }
    }
}

impl MortalityRegistry {
    pub fn builder() -> MortalityRegistryBuilder {
        MortalityRegistryBuilder {
            sources: Vec::new(),
            radix: DEFAULT_RADIX,
        }
    }

    /// Registry holding only the compiled-in tables
    pub fn with_builtin_tables() -> Self {
        Self::builder().with_builtin_tables().build()
    }

    /// Names of every registered table, upper-cased and sorted
    pub fn table_names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&normalize_name(name))
    }

    /// The table for (name, gender), loading it on first reference
    pub fn table(&self, name: &str, gender: Gender) -> Result<Arc<MortalityTable>, MortalityError> {
        let key = TableKey::new(name, gender);
        let slot = self
            .slots
            .get(&key)
            .ok_or_else(|| MortalityError::UnknownTable {
                name: name.to_string(),
            })?;

        slot.table
            .get_or_init(|| self.load(&key, &slot.source).map(Arc::new))
            .clone()
    }

    /// Mortality query for chart collaborators: qx ordered by age
    pub fn rates(&self, name: &str, gender: Gender) -> Result<Vec<MortalityPoint>, MortalityError> {
        Ok(self.table(name, gender)?.rates())
    }

    /// qx and lx ordered by age
    pub fn survival_curve(&self, name: &str, gender: Gender) -> Result<Vec<SurvivalPoint>, MortalityError> {
        Ok(self.table(name, gender)?.survival_curve())
    }

    fn load(&self, key: &TableKey, source: &TableSource) -> Result<MortalityTable, MortalityError> {
        let (min_age, rates) = match source {
            TableSource::Builtin(table) => (table.min_age(), table.rates(key.gender)),
            TableSource::CsvFile(path) => {
                let loaded = load_mortality_csv(&key.name, path)?;
                (loaded.min_age, loaded.column(key.gender).to_vec())
            }
            TableSource::Rates { min_age, female, male } => {
                let column = match key.gender {
                    Gender::Female => female.clone(),
                    Gender::Male => male.clone(),
                };
                (*min_age, column)
            }
        };

        let table = MortalityTable::new(key.name.clone(), key.gender, min_age, rates, self.radix)?;
        info!(
            "Loaded mortality table {} ({}), ages {}..={}",
            table.name(),
            table.gender(),
            table.min_age(),
            table.terminal_age()
        );
        Ok(table)
    }
}

impl Default for MortalityRegistry {
    fn default() -> Self {
        Self::with_builtin_tables()
    }
}
