pub mod transaction;

pub use transaction::{ParseEnumError, Transaction, TransactionKind, TransactionStatus};
