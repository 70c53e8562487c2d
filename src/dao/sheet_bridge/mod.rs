#[cfg(feature = "gas-bridge")]
/// Apps Script implementation.
pub mod gas;

use futures::future::BoxFuture;

use crate::{
    dao::{
        models::{LoadedSheet, SheetDocument},
        storage::StorageResult,
    },
    state::division::Division,
};

/// Abstraction over the remote spreadsheet acting as the system of record.
pub trait SheetBridge: Send + Sync {
    /// Overwrite the division's sheet with `document`.
    fn save(&self, division: Division, document: SheetDocument)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Read the division's sheet back.
    fn load(&self, division: Division) -> BoxFuture<'static, StorageResult<LoadedSheet>>;
    /// Archive the division's sheet once the competition is over, returning the
    /// service's confirmation message when it sends one.
    fn archive(&self, division: Division) -> BoxFuture<'static, StorageResult<Option<String>>>;
}
