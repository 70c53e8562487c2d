/// Sheet layout shared by CSV import and spreadsheet persistence.
pub mod models;
/// Spreadsheet bridge abstraction and its implementations.
pub mod sheet_bridge;
/// Bridge-agnostic storage errors.
pub mod storage;
