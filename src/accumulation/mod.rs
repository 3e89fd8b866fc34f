//! Defined-contribution accumulation and income conversion

mod balance;
mod conversion;
mod projector;
mod types;

pub use balance::accumulate_balances;
pub use conversion::{convert, ConversionContext, IncomeConversion, PayoutYear};
pub use projector::CdBalanceProjector;
pub use types::CdResult;
