//! Load participant batches from CSV

use super::{Gender, Participant};
use csv::Reader;
use std::error::Error;
use std::path::Path;

/// Raw CSV row: `id,age,gender,monthly_salary,initial_balance`
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    id: String,
    age: u32,
    gender: String,
    monthly_salary: f64,
    #[serde(default)]
    initial_balance: Option<f64>,
}

/// A participant tagged with its identifier from the batch file
#[derive(Debug, Clone, PartialEq)]
pub struct BatchParticipant {
    pub id: String,
    pub participant: Participant,
}

impl CsvRow {
    fn to_participant(self) -> Result<BatchParticipant, Box<dyn Error>> {
        let gender: Gender = self.gender.parse()?;

        Ok(BatchParticipant {
            id: self.id,
            participant: Participant {
                age: self.age,
                gender,
                monthly_salary: self.monthly_salary,
                initial_balance: self.initial_balance.unwrap_or(0.0),
            },
        })
    }
}

/// Load all participants from a CSV file
pub fn load_participants<P: AsRef<Path>>(path: P) -> Result<Vec<BatchParticipant>, Box<dyn Error>> {
    let reader = Reader::from_path(path)?;
    read_all(reader)
}

/// Load participants from any reader (string buffer, network stream, ...)
pub fn load_participants_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<Vec<BatchParticipant>, Box<dyn Error>> {
    read_all(Reader::from_reader(reader))
}

fn read_all<R: std::io::Read>(mut reader: Reader<R>) -> Result<Vec<BatchParticipant>, Box<dyn Error>> {
    let mut participants = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        participants.push(row.to_participant()?);
    }

    Ok(participants)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_participants_from_reader() {
        let data = "id,age,gender,monthly_salary,initial_balance\n\
                    A1,35,male,8000,0\n\
                    A2,52,F,12500.5,\n";

        let batch = load_participants_from_reader(data.as_bytes()).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id, "A1");
        assert_eq!(batch[0].participant.age, 35);
        assert_eq!(batch[1].participant.gender, Gender::Female);
        assert_eq!(batch[1].participant.initial_balance, 0.0);
        assert!((batch[1].participant.monthly_salary - 12500.5).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_gender_rejected() {
        let data = "id,age,gender,monthly_salary,initial_balance\nA1,35,x,8000,0\n";
        assert!(load_participants_from_reader(data.as_bytes()).is_err());
    }
}
