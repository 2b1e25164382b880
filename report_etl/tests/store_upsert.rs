use report_etl::store::{DeliveryFilter, IngestionRepo, InventoryFilter};
use report_parsers::{Product, ReportType};

mod common;
use common::{date, delivery, inventory};

#[test]
fn store_connection_applies_pragmas() {
    let (_db, mut store) = common::setup_store();
    common::assert_store_pragmas(store.connection());
}

#[test]
fn upserting_the_same_inventory_batch_twice_is_a_no_op() {
    let (_db, mut store) = common::setup_store();
    let day = date(2026, 1, 12);
    let batch = vec![
        inventory(day, Product::Gold, "BRINKS", 10_500.25, 2_000.0),
        inventory(day, Product::Gold, "HSBC", 1_000.0, 0.0),
        inventory(day, Product::Silver, "BRINKS", 5.0, 5.0),
    ];

    let first = store.upsert_inventory(&batch);
    assert_eq!(first.applied, 3);
    assert!(first.failures.is_empty());
    let before = store.inventory_history(&InventoryFilter::default()).unwrap();

    let second = store.upsert_inventory(&batch);
    assert_eq!(second.applied, 3);
    let after = store.inventory_history(&InventoryFilter::default()).unwrap();

    assert_eq!(before, after);
    assert_eq!(store.stats().unwrap().inventory_rows, 3);
}

#[test]
fn later_inventory_write_wins() {
    let (_db, mut store) = common::setup_store();
    let day = date(2026, 1, 12);
    store.upsert_inventory(&[inventory(day, Product::Gold, "BRINKS", 1.0, 1.0)]);

    let mut revised = inventory(day, Product::Gold, "BRINKS", 3.0, 4.0);
    revised.eligible = None;
    revised.report_date = Some(date(2026, 1, 13));
    store.upsert_inventory(std::slice::from_ref(&revised));

    let rows = store.inventory_history(&InventoryFilter::default()).unwrap();
    assert_eq!(rows, vec![revised]);
}

#[test]
fn inventory_filters() {
    let (_db, mut store) = common::setup_store();
    store.upsert_inventory(&[
        inventory(date(2026, 1, 10), Product::Gold, "BRINKS", 1.0, 1.0),
        inventory(date(2026, 1, 11), Product::Gold, "BRINKS", 2.0, 1.0),
        inventory(date(2026, 1, 12), Product::Gold, "BRINKS", 3.0, 1.0),
        inventory(date(2026, 1, 12), Product::Copper, "BRINKS", 9.0, 1.0),
    ]);

    let gold = store
        .inventory_history(&InventoryFilter {
            product: Some(Product::Gold),
            start: Some(date(2026, 1, 11)),
            end: None,
        })
        .unwrap();
    let days: Vec<_> = gold.iter().map(|r| r.activity_date).collect();
    assert_eq!(days, [date(2026, 1, 12), date(2026, 1, 11)]);

    let up_to_tenth = store
        .inventory_history(&InventoryFilter {
            end: Some(date(2026, 1, 10)),
            ..InventoryFilter::default()
        })
        .unwrap();
    assert_eq!(up_to_tenth.len(), 1);
}

#[test]
fn delivery_upsert_is_keyed_on_report_type_too() {
    let (_db, mut store) = common::setup_store();
    let day = date(2026, 1, 12);
    let daily = delivery(day, Product::Gold, "JANUARY 2026", ReportType::Daily, 10, 1204);
    let monthly = delivery(day, Product::Gold, "JANUARY 2026", ReportType::Monthly, 10, 1204);

    assert_eq!(store.upsert_delivery(&[daily.clone(), monthly.clone()]).applied, 2);
    assert_eq!(store.upsert_delivery(&[daily.clone(), monthly]).applied, 2);
    assert_eq!(store.stats().unwrap().delivery_rows, 2);

    let mut corrected = daily;
    corrected.cumulative = 1210;
    store.upsert_delivery(std::slice::from_ref(&corrected));
    let rows = store
        .delivery_notices(&DeliveryFilter {
            report_type: Some(ReportType::Daily),
            ..DeliveryFilter::default()
        })
        .unwrap();
    assert_eq!(rows, vec![corrected]);
}

#[test]
fn delivery_product_filter_is_a_case_insensitive_substring() {
    let (_db, mut store) = common::setup_store();
    let day = date(2026, 1, 12);
    store.upsert_delivery(&[
        delivery(day, Product::Gold, "FEBRUARY 2026", ReportType::Daily, 1, 1),
        delivery(day, Product::Other("Micro Gold".into()), "FEBRUARY 2026", ReportType::Daily, 2, 2),
        delivery(day, Product::Silver, "MARCH 2026", ReportType::Daily, 3, 3),
    ]);

    let gold = store
        .delivery_notices(&DeliveryFilter {
            product_contains: Some("gold".into()),
            report_type: None,
        })
        .unwrap();
    let products: Vec<_> = gold.iter().map(|r| r.product.clone()).collect();
    assert_eq!(products, [Product::Gold, Product::Other("Micro Gold".into())]);
}

#[test]
fn delivery_product_filter_treats_wildcards_literally() {
    let (_db, mut store) = common::setup_store();
    let day = date(2026, 1, 12);
    store.upsert_delivery(&[
        delivery(day, Product::Other("Micro_Gold".into()), "FEBRUARY 2026", ReportType::Daily, 1, 1),
        delivery(day, Product::Other("Micro Gold".into()), "FEBRUARY 2026", ReportType::Daily, 2, 2),
    ]);

    fn by_fragment(store: &mut impl IngestionRepo, fragment: &str) -> Vec<String> {
        store
            .delivery_notices(&DeliveryFilter {
                product_contains: Some(fragment.into()),
                report_type: None,
            })
            .unwrap()
            .into_iter()
            .map(|r| r.product.as_str().to_string())
            .collect()
    }
    assert_eq!(by_fragment(&mut store, "o_g"), ["Micro_Gold"]);
    assert!(by_fragment(&mut store, "%").is_empty());
}

#[test]
fn unrepresentable_counts_fail_per_row() {
    let (_db, mut store) = common::setup_store();
    let day = date(2026, 1, 12);
    let report = store.upsert_delivery(&[
        delivery(day, Product::Gold, "JANUARY 2026", ReportType::Daily, 10, 20),
        delivery(day, Product::Silver, "JANUARY 2026", ReportType::Daily, u64::MAX, 20),
    ]);
    assert_eq!(report.applied, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert!(report.failures[0].key.contains("Silver"));
    assert!(!report.all_failed());
}

mod properties {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    const DEPOSITORIES: [&str; 4] = ["BRINKS", "HSBC", "JP MORGAN", "MALCA-AMIT"];

    fn batch() -> impl Strategy<Value = Vec<(u32, usize, u32, u32)>> {
        prop::collection::vec((1u32..=5, 0usize..DEPOSITORIES.len(), 0u32..100_000, 0u32..100_000), 0..20)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn store_converges_to_last_write_per_key(raw in batch()) {
            let (_db, mut store) = common::setup_store();
            let records: Vec<_> = raw
                .iter()
                .map(|&(d, i, r, e)| {
                    inventory(date(2026, 1, d), Product::Gold, DEPOSITORIES[i], f64::from(r), f64::from(e))
                })
                .collect();

            store.upsert_inventory(&records);
            store.upsert_inventory(&records);

            let mut expected = HashMap::new();
            for r in &records {
                expected.insert((r.activity_date, r.depository.clone()), r.clone());
            }
            let stored = store.inventory_history(&InventoryFilter::default()).unwrap();
            prop_assert_eq!(stored.len(), expected.len());
            for row in stored {
                prop_assert_eq!(Some(&row), expected.get(&(row.activity_date, row.depository.clone())));
            }
        }
    }
}
