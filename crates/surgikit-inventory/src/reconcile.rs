//! Reconciliation of a finalized kit against current stock

use crate::kit::KitItem;
use crate::stock::StockStore;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconciliationLine {
    pub item: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub required: u32,
    pub in_stock: u32,
    /// `max(0, required - in_stock)`
    pub deficit: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub lines: Vec<ReconciliationLine>,
    pub has_deficit: bool,
}

impl ReconciliationReport {
    pub fn deficits(&self) -> impl Iterator<Item = &ReconciliationLine> {
        self.lines.iter().filter(|l| l.deficit > 0)
    }

    pub fn deficit_for(&self, item: &str) -> Option<u32> {
        let item = item.to_lowercase();
        self.lines
            .iter()
            .find(|l| l.item.to_lowercase() == item)
            .map(|l| l.deficit)
    }

    /// Purchase order text returned to the model. `quotations_url`, when
    /// known, is cited for the items to order.
    pub fn render(&self, quotations_url: Option<&str>) -> String {
        if self.lines.is_empty() {
            return "Resumen de Inventario: la lista final no contiene artículos; no se requiere pedido."
                .to_string();
        }

        let sufficient: Vec<&str> = self
            .lines
            .iter()
            .filter(|l| l.deficit == 0)
            .map(|l| l.item.as_str())
            .collect();

        let mut out = String::from("Resumen de Inventario: ");
        if sufficient.is_empty() {
            out.push_str("ningún artículo tiene stock suficiente.");
        } else {
            let _ = write!(out, "{} con stock suficiente.", sufficient.join(", "));
        }

        if !self.has_deficit {
            out.push_str("\nNo se requiere Solicitud de Pedido.");
            return out;
        }

        out.push_str("\nSolicitud de Pedido (artículos con déficit):");
        for line in self.deficits() {
            let unit = line.unit.as_deref().unwrap_or("unidades");
            let _ = write!(
                out,
                "\n- {}: Faltan {} {} ({} requeridas - {} en stock)",
                line.item, line.deficit, unit, line.required, line.in_stock
            );
        }
        if let Some(url) = quotations_url {
            let _ = write!(out, "\nCotizaciones de referencia: {}", url);
        }
        out
    }
}

/// Per-item deficit of `kit` against `stock`. Defined for an empty kit.
pub fn reconcile(kit: &[KitItem], stock: &dyn StockStore) -> ReconciliationReport {
    let lines: Vec<ReconciliationLine> = kit
        .iter()
        .map(|k| {
            let in_stock = stock.level(&k.item);
            ReconciliationLine {
                item: k.item.clone(),
                unit: k.unit.clone(),
                required: k.quantity,
                in_stock,
                deficit: k.quantity.saturating_sub(in_stock),
            }
        })
        .collect();
    let has_deficit = lines.iter().any(|l| l.deficit > 0);
    ReconciliationReport { lines, has_deficit }
}
