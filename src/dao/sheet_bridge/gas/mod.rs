//! Google Apps Script web app bridge: the script owns the spreadsheet, this side
//! only speaks its small JSON protocol over HTTPS.

mod config;
mod error;
mod models;
mod store;

pub use config::GasConfig;
pub use error::{GasBridgeError, GasResult};
pub use store::GasSheetBridge;
