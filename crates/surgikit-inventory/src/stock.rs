//! Stock levels

use dashmap::DashMap;
use std::collections::HashMap;
use tracing::debug;

/// Current stock per item. Lookups are case-insensitive; unknown items have
/// zero stock.
pub trait StockStore: Send + Sync {
    fn level(&self, item: &str) -> u32;
    fn set_level(&self, item: &str, quantity: u32);
    /// (display name, quantity) pairs, sorted by name.
    fn snapshot(&self) -> Vec<(String, u32)>;
}

#[derive(Clone, Debug)]
struct StockEntry {
    name: String,
    quantity: u32,
}

fn normalize(item: &str) -> String {
    item.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// DashMap-backed store. Writes to one item lock only that item's shard.
#[derive(Debug, Default)]
pub struct InMemoryStock {
    items: DashMap<String, StockEntry>,
}

impl InMemoryStock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_levels<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let store = Self::new();
        for (name, qty) in levels {
            let name = name.into();
            store.set_level(&name, qty);
        }
        store
    }

    /// Stock seeded with the neurosurgery demo levels.
    pub fn demo() -> Self {
        Self::from_levels(demo_stock())
    }

    /// Entry for an item that has no exact key: the longest stored name
    /// that starts with the query or that the query starts with.
    fn closest(&self, key: &str) -> Option<u32> {
        self.items
            .iter()
            .filter(|e| e.key().starts_with(key) || key.starts_with(e.key().as_str()))
            .max_by_key(|e| e.key().len())
            .map(|e| e.value().quantity)
    }
}

impl StockStore for InMemoryStock {
    fn level(&self, item: &str) -> u32 {
        let key = normalize(item);
        if key.is_empty() {
            return 0;
        }
        if let Some(entry) = self.items.get(&key) {
            return entry.quantity;
        }
        let level = self.closest(&key).unwrap_or(0);
        debug!("stock: no exact entry for '{}', using {}", item, level);
        level
    }

    fn set_level(&self, item: &str, quantity: u32) {
        let key = normalize(item);
        if key.is_empty() {
            return;
        }
        self.items
            .entry(key)
            .and_modify(|e| e.quantity = quantity)
            .or_insert_with(|| StockEntry {
                name: item.trim().to_string(),
                quantity,
            });
    }

    fn snapshot(&self) -> Vec<(String, u32)> {
        let mut out: Vec<(String, u32)> = self
            .items
            .iter()
            .map(|e| (e.value().name.clone(), e.value().quantity))
            .collect();
        out.sort();
        out
    }
}

pub fn demo_stock() -> HashMap<String, u32> {
    HashMap::from([
        ("Suturas de Nylon".to_string(), 15),
        ("Grapas Quirúrgicas".to_string(), 5),
        ("Catéter de Drenaje".to_string(), 2),
        ("Gasa Quirúrgica".to_string(), 8),
    ])
}
