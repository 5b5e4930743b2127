//! Tests for surgikit-inventory: catalog, kit codec, stock, reconciliation,
//! ledgers and the resolver

use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use surgikit_inventory::*;

// ===========================================================================
// Catalog
// ===========================================================================

#[test]
fn code_and_alias_identify_the_same_surgery() {
    let catalog = SurgeryCatalog::demo();
    let by_code = catalog.identify("012546");
    let by_alias = catalog.identify("craneo");
    assert_eq!(by_code, by_alias);
    assert_eq!(
        by_code.surgery().map(|s| s.name.as_str()),
        Some("Cirugía de Cráneo (Neurocirugía)")
    );
}

#[test]
fn identification_is_case_insensitive_and_tolerates_context() {
    let catalog = SurgeryCatalog::demo();
    assert!(catalog.identify("Necesito insumos para una CRÁNEO mañana").surgery().is_some());
    assert!(catalog.identify("código FONASA 012546 por favor").surgery().is_some());
}

#[test]
fn unknown_code_is_unidentified() {
    let catalog = SurgeryCatalog::demo();
    assert_eq!(catalog.identify("unknown-code"), Identification::Unidentified);
    assert_eq!(catalog.identify("   "), Identification::Unidentified);
}

// ===========================================================================
// Kit codec
// ===========================================================================

const DEMO_KIT_TEXT: &str = "
        Kit Histórico Propuesto para Cirugía de Cráneo:
        - Suturas de Nylon (unidades): 20
        - Grapas Quirúrgicas (unidades): 10
        - Catéter de Drenaje (unidades): 1
        - Gasa Quirúrgica (paquetes): 8
        ";

#[test]
fn parses_the_historical_kit_text() {
    let items = parse_kit(DEMO_KIT_TEXT);
    assert_eq!(items.len(), 4);
    assert_eq!(items[0], KitItem::new("Suturas de Nylon", 20).with_unit("unidades"));
    assert_eq!(items[3], KitItem::new("Gasa Quirúrgica", 8).with_unit("paquetes"));
}

#[test]
fn rendered_template_parses_back() {
    let kit = &kit::demo_kits()[0];
    let text = kit.render("Cirugía de Cráneo (Neurocirugía)");
    assert!(text.starts_with("Kit Histórico Propuesto para Cirugía de Cráneo"));
    assert_eq!(parse_kit(&text), kit.items);
}

#[test]
fn parses_human_edits() {
    let items = parse_kit("Suturas de Nylon: 25, Grapas Quirúrgicas: 10\n* Gasa x 4 paquetes\n3 x Catéter de Drenaje");
    assert_eq!(
        items,
        vec![
            KitItem::new("Suturas de Nylon", 25),
            KitItem::new("Grapas Quirúrgicas", 10),
            KitItem::new("Gasa", 4).with_unit("paquetes"),
            KitItem::new("Catéter de Drenaje", 3),
        ]
    );
}

#[test]
fn parses_dash_and_trailing_quantity_forms() {
    let items = parse_kit("Suturas de Nylon - 20 unidades\nGrapas Quirúrgicas 10 unidades\n- Catéter de Drenaje 1");
    assert_eq!(
        items,
        vec![
            KitItem::new("Suturas de Nylon", 20).with_unit("unidades"),
            KitItem::new("Grapas Quirúrgicas", 10).with_unit("unidades"),
            KitItem::new("Catéter de Drenaje", 1),
        ]
    );
}

#[test]
fn text_without_quantities_is_empty() {
    assert!(parse_kit("Confirmo el kit, gracias.").is_empty());
    assert!(parse_kit("Confirmo el kit propuesto tal cual").is_empty());
    // a quantity inside a sentence is not a kit line
    assert!(parse_kit("Agrega 5 gasas si hay stock").is_empty());
    assert!(parse_kit("").is_empty());
}

#[test]
fn content_check_ignores_whitespace_and_punctuation() {
    assert!(has_content("Confirmo el kit"));
    assert!(!has_content("  \n - "));
}

// ===========================================================================
// Stock and reconciliation
// ===========================================================================

#[test]
fn deficit_is_required_minus_stock() {
    let stock = InMemoryStock::from_levels([("Suturas", 15)]);
    let report = reconcile(&[KitItem::new("Suturas", 20)], &stock);
    assert_eq!(report.deficit_for("Suturas"), Some(5));
    assert!(report.has_deficit);
}

#[test]
fn enough_stock_has_no_deficit() {
    let stock = InMemoryStock::from_levels([("Suturas", 25)]);
    let report = reconcile(&[KitItem::new("Suturas", 20)], &stock);
    assert_eq!(report.deficit_for("suturas"), Some(0));
    assert!(!report.has_deficit);
}

#[test]
fn empty_kit_reconciles_to_empty_report() {
    let report = reconcile(&[], &InMemoryStock::demo());
    assert!(report.lines.is_empty());
    assert!(!report.has_deficit);
    assert!(report.render(None).contains("no contiene artículos"));
}

#[test]
fn stock_lookup_is_case_insensitive_with_prefix_fallback() {
    let stock = InMemoryStock::demo();
    assert_eq!(stock.level("suturas de nylon"), 15);
    assert_eq!(stock.level("  GRAPAS   Quirúrgicas "), 5);
    assert_eq!(stock.level("Suturas"), 15);
    assert_eq!(stock.level("Bisturí"), 0);

    stock.set_level("Bisturí", 3);
    assert_eq!(stock.level("bisturí"), 3);
    assert_eq!(stock.snapshot().len(), 5);
}

#[test]
fn demo_reconciliation_matches_the_purchase_order() {
    let stock = InMemoryStock::demo();
    let report = reconcile(&kit::demo_kits()[0].items, &stock);
    assert_eq!(report.deficit_for("Suturas de Nylon"), Some(5));
    assert_eq!(report.deficit_for("Grapas Quirúrgicas"), Some(5));
    assert_eq!(report.deficit_for("Catéter de Drenaje"), Some(0));
    assert_eq!(report.deficit_for("Gasa Quirúrgica"), Some(0));

    let text = report.render(Some("https://example.test/cotizaciones"));
    assert!(text.contains("Suturas de Nylon: Faltan 5 unidades (20 requeridas - 15 en stock)"));
    assert!(text.contains("Catéter de Drenaje, Gasa Quirúrgica con stock suficiente"));
    assert!(text.contains("https://example.test/cotizaciones"));
}

// ===========================================================================
// Ledgers
// ===========================================================================

#[tokio::test]
async fn in_memory_ledger_appends_every_call() {
    let ledger = InMemoryLedger::new();
    let record = UsageRecord::new(vec![KitItem::new("Gasa", 2)], None);
    ledger.append(&record).await.unwrap();
    ledger.append(&record).await.unwrap();
    assert_eq!(ledger.records().await.unwrap().len(), 2);
}

#[tokio::test]
async fn jsonl_ledger_writes_one_line_per_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("usage.jsonl");
    let ledger = JsonlLedger::new(&path);
    assert!(ledger.records().await.unwrap().is_empty());

    let first = UsageRecord::new(vec![KitItem::new("Suturas de Nylon", 20)], None);
    let second = UsageRecord::new(vec![KitItem::new("Gasa", 8).with_unit("paquetes")], None);
    ledger.append(&first).await.unwrap();
    ledger.append(&second).await.unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 2);
    let records = ledger.records().await.unwrap();
    assert_eq!(records, vec![first, second]);
}

// ===========================================================================
// Resolver
// ===========================================================================

#[test]
fn historical_kit_resolves_from_the_identified_name() {
    let resolver = KitResolver::demo();
    let surgery = resolver.identify_surgery("012546");
    let name = &surgery.surgery().unwrap().name;
    match resolver.get_historical_kit(name) {
        KitLookup::Found { kit, .. } => assert_eq!(kit.items.len(), 4),
        KitLookup::NotFound => panic!("expected the demo kit"),
    }
    assert_eq!(resolver.get_historical_kit("Apendicectomía"), KitLookup::NotFound);
}

#[tokio::test]
async fn record_usage_rejects_an_empty_list() {
    let resolver = KitResolver::demo();
    let err = resolver.record_usage(&[], None).await.unwrap_err();
    assert!(matches!(err, InventoryError::Storage(_)));
    assert!(resolver.ledger().records().await.unwrap().is_empty());
}

#[tokio::test]
async fn record_usage_is_not_idempotent() {
    let resolver = KitResolver::demo();
    let kit = vec![KitItem::new("Suturas de Nylon", 20)];
    let report = resolver.check_inventory(&kit);
    let a = resolver.record_usage(&kit, Some(report.clone())).await.unwrap();
    let b = resolver.record_usage(&kit, Some(report)).await.unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(resolver.ledger().records().await.unwrap().len(), 2);
}

struct CountingFetcher {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait::async_trait]
impl ReferenceFetcher for CountingFetcher {
    async fn fetch(&self, url: &str) -> InventoryResult<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(InventoryError::fetch(url, "connection refused"))
        } else {
            Ok(Bytes::from_static(b"Suturas de Nylon;15"))
        }
    }
}

#[tokio::test]
async fn reference_fetch_is_optional() {
    let resolver = KitResolver::demo();
    assert_eq!(resolver.fetch_reference(ReferenceDoc::Historical).await.unwrap(), None);
    assert!(resolver.quotations_url().is_none());
}

#[tokio::test]
async fn reference_fetch_reports_failures() {
    let fetcher = Arc::new(CountingFetcher { calls: AtomicUsize::new(0), fail: true });
    let resolver = KitResolver::demo().with_reference(fetcher.clone(), ReferenceUrls::default());
    let err = resolver.fetch_reference(ReferenceDoc::Inventory).await.unwrap_err();
    assert!(err.to_string().contains(reference::URL_INVENTORY));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(resolver.quotations_url(), Some(reference::URL_QUOTATIONS));
}

#[tokio::test]
async fn reference_fetch_returns_size() {
    let fetcher = Arc::new(CountingFetcher { calls: AtomicUsize::new(0), fail: false });
    let resolver = KitResolver::demo().with_reference(fetcher, ReferenceUrls::default());
    assert_eq!(resolver.fetch_reference(ReferenceDoc::Historical).await.unwrap(), Some(19));
}
