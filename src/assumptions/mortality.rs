//! Mortality table with derived survival curve and life expectancy
//!
//! A table holds annual mortality rates qx for one gender over a contiguous
//! age domain `min_age..=terminal_age`. The survivor column l(x) is derived
//! once at construction:
//!
//! - `l(min_age) = radix`
//! - `l(x+1) = l(x) * (1 - qx)`
//!
//! l(x) is kept one age past the terminal age so the survivors of the last
//! year are available to annuity and expectancy sums. Tables are immutable
//! after construction and safe to share across threads.

use serde::Serialize;

use crate::error::MortalityError;
use crate::participant::Gender;

/// One row of the qx column, used by chart collaborators
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MortalityPoint {
    pub age: u32,
    pub qx: f64,
}

/// One row of the survival curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurvivalPoint {
    pub age: u32,
    pub qx: f64,
    pub lx: f64,
}

/// Mortality rates for a single (table, gender) pair
#[derive(Debug, Clone, PartialEq)]
pub struct MortalityTable {
    name: String,
    gender: Gender,

    /// First age of the table
    min_age: u32,

    /// Annual mortality rates, index = age - min_age
    qx: Vec<f64>,

    /// Survivors, index = age - min_age, one entry longer than `qx`
    lx: Vec<f64>,
}

impl MortalityTable {
    /// Build a table, rejecting rates outside [0, 1]
    pub fn new(
        name: impl Into<String>,
        gender: Gender,
        min_age: u32,
        qx: Vec<f64>,
        radix: f64,
    ) -> Result<Self, MortalityError> {
        let name = name.into();

        if qx.is_empty() {
            return Err(MortalityError::InvalidTable {
                table: name,
                reason: "table has no rates".to_string(),
            });
        }

        if !(radix.is_finite() && radix > 0.0) {
            return Err(MortalityError::InvalidTable {
                table: name,
                reason: format!("radix must be positive, got {}", radix),
            });
        }

        if let Some((idx, q)) = qx
            .iter()
            .enumerate()
            .find(|(_, q)| !(q.is_finite() && (0.0..=1.0).contains(*q)))
        {
            return Err(MortalityError::InvalidTable {
                reason: format!(
                    "qx at age {} for {} is {}, expected a probability in [0, 1]",
                    min_age + idx as u32,
                    gender,
                    q
                ),
                table: name,
            });
        }

        let mut lx = Vec::with_capacity(qx.len() + 1);
        let mut survivors = radix;
        lx.push(survivors);
        for q in &qx {
            survivors *= 1.0 - q;
            lx.push(survivors);
        }

        Ok(Self {
            name,
            gender,
            min_age,
            qx,
            lx,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn min_age(&self) -> u32 {
        self.min_age
    }

    /// Last age with a mortality rate
    pub fn terminal_age(&self) -> u32 {
        self.min_age + self.qx.len() as u32 - 1
    }

    /// Whether `age` has a rate in this table
    pub fn contains_age(&self, age: u32) -> bool {
        age >= self.min_age && age <= self.terminal_age()
    }

    fn out_of_domain(&self, age: u32) -> MortalityError {
        MortalityError::OutOfDomain {
            table: self.name.clone(),
            age,
            min_age: self.min_age,
            max_age: self.terminal_age(),
        }
    }

    /// Annual mortality rate at `age`
    pub fn qx(&self, age: u32) -> Result<f64, MortalityError> {
        if !self.contains_age(age) {
            return Err(self.out_of_domain(age));
        }
        Ok(self.qx[(age - self.min_age) as usize])
    }

    /// Survivors at `age`; defined up to one year past the terminal age
    pub fn lx(&self, age: u32) -> Result<f64, MortalityError> {
        if age < self.min_age || age > self.terminal_age() + 1 {
            return Err(self.out_of_domain(age));
        }
        Ok(self.lx[(age - self.min_age) as usize])
    }

    /// Survivors without domain checks: zero past the end of the table
    fn lx_or_zero(&self, age: u32) -> f64 {
        if age < self.min_age {
            return self.lx[0];
        }
        self.lx
            .get((age - self.min_age) as usize)
            .copied()
            .unwrap_or(0.0)
    }

    /// Probability that a life aged `age` survives `years` more years (tpx)
    ///
    /// Zero once the horizon runs past the end of the table, or when the
    /// cohort is already extinct at `age`.
    pub fn survival_probability(&self, age: u32, years: u32) -> Result<f64, MortalityError> {
        if !self.contains_age(age) {
            return Err(self.out_of_domain(age));
        }
        let base = self.lx_or_zero(age);
        if base <= 0.0 {
            return Ok(0.0);
        }
        Ok(self.lx_or_zero(age + years) / base)
    }

    /// Survival probabilities from `age` for every year up to the end of the table
    ///
    /// Element k is kpx; the last element is the probability of surviving past
    /// the terminal age.
    pub fn survival_path(&self, age: u32) -> Result<Vec<f64>, MortalityError> {
        if !self.contains_age(age) {
            return Err(self.out_of_domain(age));
        }
        let base = self.lx_or_zero(age);
        let start = (age - self.min_age) as usize;
        Ok(self.lx[start..]
            .iter()
            .map(|l| if base > 0.0 { l / base } else { 0.0 })
            .collect())
    }

    /// Curtate life expectancy at `age`, truncated at the terminal age
    ///
    /// e(a) = sum over y in a+1..=terminal of l(y) / l(a)
    pub fn life_expectancy(&self, age: u32) -> Result<f64, MortalityError> {
        if !self.contains_age(age) {
            return Err(self.out_of_domain(age));
        }
        let base = self.lx_or_zero(age);
        if base <= 0.0 {
            return Ok(0.0);
        }
        let total: f64 = ((age + 1)..=self.terminal_age())
            .map(|y| self.lx_or_zero(y))
            .sum();
        Ok(total / base)
    }

    /// The qx column ordered by age
    pub fn rates(&self) -> Vec<MortalityPoint> {
        self.qx
            .iter()
            .enumerate()
            .map(|(idx, &qx)| MortalityPoint {
                age: self.min_age + idx as u32,
                qx,
            })
            .collect()
    }

    /// The qx and lx columns ordered by age
    pub fn survival_curve(&self) -> Vec<SurvivalPoint> {
        self.qx
            .iter()
            .zip(&self.lx)
            .enumerate()
            .map(|(idx, (&qx, &lx))| SurvivalPoint {
                age: self.min_age + idx as u32,
                qx,
                lx,
            })
            .collect()
    }
}
