//! Parsers for exchange report files.
//!
//! Two document families are supported: depository inventory snapshots
//! ([`inventory`]) and delivery notices ([`delivery`]). Both are stateless:
//! they turn a file into an in-memory batch of records and never touch storage.

pub mod classify;
pub mod dates;
pub mod delivery;
pub mod errors;
pub mod inventory;
pub mod models;
pub mod numeric;
pub mod source;

pub use classify::{Classification, DocumentKind, classify};
pub use delivery::{DeliveryNoticeParser, DeliveryParse};
pub use errors::{FormatError, ParseError, ParseResult};
pub use inventory::{InventoryParse, InventoryParserOptions, InventoryReportParser};
pub use models::{DeliveryRecord, InventoryRecord, Product, ReportType};
