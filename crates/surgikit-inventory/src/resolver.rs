//! KitResolver - the domain functions behind the four procurement tools

use crate::catalog::{Identification, SurgeryCatalog, SurgeryType};
use crate::error::{InventoryError, InventoryResult};
use crate::kit::{demo_kits, KitItem, KitTemplate};
use crate::ledger::{InMemoryLedger, UsageLedger, UsageRecord};
use crate::reconcile::{reconcile, ReconciliationReport};
use crate::reference::{ReferenceDoc, ReferenceFetcher, ReferenceUrls};
use crate::stock::{InMemoryStock, StockStore};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a historical kit lookup. `NotFound` is a normal outcome: the
/// human defines the kit manually.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KitLookup {
    Found {
        surgery: SurgeryType,
        kit: KitTemplate,
    },
    NotFound,
}

struct Reference {
    fetcher: Arc<dyn ReferenceFetcher>,
    urls: ReferenceUrls,
}

pub struct KitResolver {
    catalog: SurgeryCatalog,
    kits: HashMap<String, KitTemplate>,
    stock: Arc<dyn StockStore>,
    ledger: Arc<dyn UsageLedger>,
    reference: Option<Reference>,
}

impl KitResolver {
    pub fn new(
        catalog: SurgeryCatalog,
        kits: Vec<KitTemplate>,
        stock: Arc<dyn StockStore>,
        ledger: Arc<dyn UsageLedger>,
    ) -> Self {
        let kits = kits
            .into_iter()
            .map(|k| (k.code.to_lowercase(), k))
            .collect();
        Self {
            catalog,
            kits,
            stock,
            ledger,
            reference: None,
        }
    }

    /// Demo catalog, kit and stock with an in-memory ledger.
    pub fn demo() -> Self {
        Self::new(
            SurgeryCatalog::demo(),
            demo_kits(),
            Arc::new(InMemoryStock::demo()),
            Arc::new(InMemoryLedger::new()),
        )
    }

    /// Touch the reference documents during lookups.
    pub fn with_reference(
        mut self,
        fetcher: Arc<dyn ReferenceFetcher>,
        urls: ReferenceUrls,
    ) -> Self {
        self.reference = Some(Reference { fetcher, urls });
        self
    }

    pub fn catalog(&self) -> &SurgeryCatalog {
        &self.catalog
    }

    pub fn stock(&self) -> &Arc<dyn StockStore> {
        &self.stock
    }

    pub fn ledger(&self) -> &Arc<dyn UsageLedger> {
        &self.ledger
    }

    pub fn identify_surgery(&self, code_or_name: &str) -> Identification {
        let result = self.catalog.identify(code_or_name);
        debug!("identify '{}': {:?}", code_or_name, result.surgery().map(|s| &s.code));
        result
    }

    /// The surgery type text goes through the catalog again, so both a code
    /// and the display name returned by identification resolve.
    pub fn get_historical_kit(&self, surgery_type: &str) -> KitLookup {
        let Identification::Identified(surgery) = self.catalog.identify(surgery_type) else {
            return KitLookup::NotFound;
        };
        match self.kits.get(&surgery.code.to_lowercase()) {
            Some(kit) => KitLookup::Found {
                surgery,
                kit: kit.clone(),
            },
            None => KitLookup::NotFound,
        }
    }

    pub fn check_inventory(&self, finalized_kit: &[KitItem]) -> ReconciliationReport {
        let report = reconcile(finalized_kit, self.stock.as_ref());
        info!(
            "reconciled {} items, {} with deficit",
            report.lines.len(),
            report.deficits().count()
        );
        report
    }

    /// Append one usage record. Not idempotent.
    pub async fn record_usage(
        &self,
        finalized_kit: &[KitItem],
        report: Option<ReconciliationReport>,
    ) -> InventoryResult<UsageRecord> {
        if finalized_kit.is_empty() {
            return Err(InventoryError::Storage(
                "nothing to record: the purchase list is empty".into(),
            ));
        }
        let record = UsageRecord::new(finalized_kit.to_vec(), report);
        self.ledger.append(&record).await?;
        Ok(record)
    }

    /// Fetch a reference document when a fetcher is configured. Returns the
    /// number of bytes read, or `None` without a fetcher.
    pub async fn fetch_reference(&self, doc: ReferenceDoc) -> InventoryResult<Option<usize>> {
        let Some(reference) = &self.reference else {
            return Ok(None);
        };
        let url = reference.urls.get(doc);
        match reference.fetcher.fetch(url).await {
            Ok(bytes) => {
                debug!("reference {:?}: {} bytes", doc, bytes.len());
                Ok(Some(bytes.len()))
            }
            Err(e) => {
                warn!("reference {:?} unavailable: {}", doc, e);
                Err(e)
            }
        }
    }

    pub fn quotations_url(&self) -> Option<&str> {
        self.reference
            .as_ref()
            .map(|r| r.urls.get(ReferenceDoc::Quotations))
    }
}
