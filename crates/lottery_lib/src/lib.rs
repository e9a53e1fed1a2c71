//! Charity lottery core: ticket issuance, prize fund, round lifecycle and the
//! prize draw, backed by SQLite.

pub mod draw;
pub mod error;
pub mod fund;
pub mod notifier;
pub mod registry;
pub mod rounds;
pub mod storage;
pub mod ticket;
pub mod types;

pub use error::{ErrorKind, LotteryError, LotteryResult};
