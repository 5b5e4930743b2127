//! Reference documents - historical consumption, current inventory and
//! quotations, published as raw text files. Only fetched, never parsed.

use crate::error::{InventoryError, InventoryResult};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const URL_HISTORICAL: &str = "https://gist.githubusercontent.com/AngelTroncoso/09343994ea886e2cdacc82ffcdef89f2/raw/9c37a67ff8bfcd9db4f85f0b83bbd7b4de994979/insumos%2520Quir%25C3%25BArgicos%2520Historicos";
pub const URL_INVENTORY: &str = "https://gist.githubusercontent.com/AngelTroncoso/bda68c3c7f4c95e20651954fb5e21737/raw/4c32c31b666033cedf39ba6beb35b4ad79b57a0d/insumos%2520Quir%25C3%25BArgicos";
pub const URL_QUOTATIONS: &str = "https://gist.githubusercontent.com/AngelTroncoso/7d8476ce28a059f1b51694b20ba5b7e5/raw/f5e4827237b23f422fbf6127f369e3d8d85bef71/Codigo_para_Cotizaciones";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceDoc {
    Historical,
    Inventory,
    Quotations,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReferenceUrls {
    pub historical: String,
    pub inventory: String,
    pub quotations: String,
}

impl Default for ReferenceUrls {
    fn default() -> Self {
        Self {
            historical: URL_HISTORICAL.into(),
            inventory: URL_INVENTORY.into(),
            quotations: URL_QUOTATIONS.into(),
        }
    }
}

impl ReferenceUrls {
    pub fn get(&self, doc: ReferenceDoc) -> &str {
        match doc {
            ReferenceDoc::Historical => &self.historical,
            ReferenceDoc::Inventory => &self.inventory,
            ReferenceDoc::Quotations => &self.quotations,
        }
    }
}

#[async_trait::async_trait]
pub trait ReferenceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> InventoryResult<Bytes>;
}

/// Plain GET over reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> InventoryResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InventoryError::fetch("client", e))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ReferenceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> InventoryResult<Bytes> {
        debug!("reference: GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| InventoryError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InventoryError::fetch(url, format!("HTTP {}", status)));
        }
        response.bytes().await.map_err(|e| InventoryError::fetch(url, e))
    }
}
