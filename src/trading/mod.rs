pub mod ledger;
pub mod trade_record;

pub use ledger::{LedgerStats, TradeLedger};
pub use trade_record::{TradeExit, TradeRecord};
