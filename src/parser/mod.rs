mod trx;

pub use trx::{load_trx, parse_trx, TestResult};
