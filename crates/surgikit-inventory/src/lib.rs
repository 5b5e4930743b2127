//! surgikit-inventory - the domain behind the procurement tools
//!
//! Surgery catalog, historical kit templates, stock levels, reconciliation
//! arithmetic, the usage ledger and the optional reference documents. Tools
//! in surgikit-tools are thin adapters over [`KitResolver`].

pub mod catalog;
pub mod error;
pub mod kit;
pub mod ledger;
pub mod reconcile;
pub mod reference;
pub mod resolver;
pub mod stock;

pub use catalog::{Identification, SurgeryCatalog, SurgeryType};
pub use error::{InventoryError, InventoryResult};
pub use kit::{has_content, parse_kit, KitItem, KitTemplate};
pub use ledger::{InMemoryLedger, JsonlLedger, UsageLedger, UsageRecord};
pub use reconcile::{reconcile, ReconciliationLine, ReconciliationReport};
pub use reference::{HttpFetcher, ReferenceDoc, ReferenceFetcher, ReferenceUrls};
pub use resolver::{KitLookup, KitResolver};
pub use stock::{InMemoryStock, StockStore};
