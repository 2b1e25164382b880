//! Normalized record types emitted by the parsers.

pub mod delivery;
pub mod inventory;
pub mod product;

pub use delivery::{DeliveryRecord, ReportType};
pub use inventory::InventoryRecord;
pub use product::Product;
