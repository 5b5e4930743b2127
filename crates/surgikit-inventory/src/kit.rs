//! Kit templates and the text form tools exchange with the model
//!
//! A kit renders as one `- Item (unit): qty` line per item. [`parse_kit`]
//! reads that shape back, plus the looser forms humans type when they edit
//! the proposal: `name x qty`, `qty x name`, `name - qty [unit]` and
//! `name qty [unit]`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::OnceLock;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KitItem {
    pub item: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl KitItem {
    pub fn new(item: impl Into<String>, quantity: u32) -> Self {
        Self {
            item: item.into(),
            quantity,
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn unit_label(&self) -> &str {
        self.unit.as_deref().unwrap_or("unidades")
    }

    pub fn render(&self) -> String {
        match &self.unit {
            Some(unit) => format!("- {} ({}): {}", self.item, unit, self.quantity),
            None => format!("- {}: {}", self.item, self.quantity),
        }
    }
}

/// Historical kit for one surgery code.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KitTemplate {
    pub code: String,
    pub items: Vec<KitItem>,
}

impl KitTemplate {
    pub fn new(code: impl Into<String>, items: Vec<KitItem>) -> Self {
        Self {
            code: code.into(),
            items,
        }
    }

    pub fn render(&self, surgery_name: &str) -> String {
        let mut out = format!("Kit Histórico Propuesto para {}:", surgery_name);
        for item in &self.items {
            let _ = write!(out, "\n{}", item.render());
        }
        out
    }
}

pub fn demo_kits() -> Vec<KitTemplate> {
    vec![KitTemplate::new(
        "012546",
        vec![
            KitItem::new("Suturas de Nylon", 20).with_unit("unidades"),
            KitItem::new("Grapas Quirúrgicas", 10).with_unit("unidades"),
            KitItem::new("Catéter de Drenaje", 1).with_unit("unidades"),
            KitItem::new("Gasa Quirúrgica", 8).with_unit("paquetes"),
        ],
    )]
}

struct KitPatterns {
    colon_form: Regex,
    name_x_qty: Regex,
    qty_x_name: Regex,
    name_dash_qty: Regex,
    name_qty: Regex,
}

fn patterns() -> Option<&'static KitPatterns> {
    static PATTERNS: OnceLock<Option<KitPatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(KitPatterns {
                colon_form: Regex::new(
                    r"(?P<name>\p{L}[\p{L}\p{N} \t./%-]*?)\s*(?:\((?P<unit>[^)\n]*)\))?\s*:\s*(?P<qty>\d+)",
                )
                .ok()?,
                name_x_qty: Regex::new(
                    r"^(?P<name>\p{L}.*?)\s+[xX×]\s*(?P<qty>\d+)\s*(?P<unit>\p{L}+)?$",
                )
                .ok()?,
                qty_x_name: Regex::new(r"^(?P<qty>\d+)\s*[xX×]\s+(?P<name>\p{L}.*?)$").ok()?,
                name_dash_qty: Regex::new(
                    r"^(?P<name>\p{L}.*?)\s+[-–]\s*(?P<qty>\d+)\s*(?P<unit>\p{L}+)?\.?$",
                )
                .ok()?,
                name_qty: Regex::new(
                    r"^(?P<name>\p{L}[^\d]*?)\s+(?P<qty>\d+)\s*(?P<unit>\p{L}+)?\.?$",
                )
                .ok()?,
            })
        })
        .as_ref()
}

fn bullet_trimmed(segment: &str) -> &str {
    segment
        .trim()
        .trim_start_matches(|c: char| matches!(c, '-' | '*' | '•'))
        .trim()
}

/// Parse kit text into items, in order of appearance. Headings, blank lines
/// and lines without a quantity are skipped, so prose yields no items.
pub fn parse_kit(text: &str) -> Vec<KitItem> {
    let mut items = Vec::new();
    let Some(re) = patterns() else {
        return items;
    };
    for line in text.lines() {
        let before = items.len();
        for caps in re.colon_form.captures_iter(line) {
            let Ok(quantity) = caps["qty"].parse::<u32>() else {
                continue;
            };
            let name = caps["name"].trim();
            if name.is_empty() {
                continue;
            }
            let mut item = KitItem::new(name, quantity);
            if let Some(unit) = caps.name("unit").map(|u| u.as_str().trim()) {
                if !unit.is_empty() {
                    item.unit = Some(unit.to_string());
                }
            }
            items.push(item);
        }
        if items.len() > before {
            continue;
        }

        for segment in line.split([',', ';']) {
            let segment = bullet_trimmed(segment);
            let caps = match re
                .name_x_qty
                .captures(segment)
                .or_else(|| re.qty_x_name.captures(segment))
                .or_else(|| re.name_dash_qty.captures(segment))
                .or_else(|| re.name_qty.captures(segment))
            {
                Some(c) => c,
                None => continue,
            };
            let Ok(quantity) = caps["qty"].parse::<u32>() else {
                continue;
            };
            let mut item = KitItem::new(caps["name"].trim(), quantity);
            item.unit = caps.name("unit").map(|u| u.as_str().to_string());
            items.push(item);
        }
    }
    items
}

/// Whether `text` has something to read even though it may hold no items.
pub fn has_content(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}
