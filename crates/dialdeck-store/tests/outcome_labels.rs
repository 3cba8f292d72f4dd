use dialdeck_core::domain::{default_outcome_labels, OutcomeCatalog, OutcomeLabel};
use dialdeck_store::Store;

#[test]
fn catalog_round_trips_in_sort_order() {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    assert!(store.outcome_labels().catalog().expect("catalog").is_none());
    assert!(store.outcome_labels().fetched_at().expect("fetched").is_none());

    let catalog = OutcomeCatalog::new(default_outcome_labels()).expect("catalog");
    store
        .outcome_labels()
        .replace_all(1_700_000_000, &catalog)
        .expect("replace");
    let cached = store
        .outcome_labels()
        .catalog()
        .expect("catalog")
        .expect("cached");
    assert_eq!(cached, catalog);
    assert_eq!(
        store.outcome_labels().fetched_at().expect("fetched"),
        Some(1_700_000_000)
    );

    let smaller = OutcomeCatalog::new(vec![
        OutcomeLabel::new("Booked", "#16a34a", "#ffffff", 2),
        OutcomeLabel::new("Declined", "#dc2626", "#ffffff", 1),
    ])
    .expect("catalog");
    store
        .outcome_labels()
        .replace_all(1_700_000_100, &smaller)
        .expect("replace");
    let cached = store
        .outcome_labels()
        .catalog()
        .expect("catalog")
        .expect("cached");
    let labels: Vec<&str> = cached
        .labels()
        .iter()
        .map(|label| label.label.as_str())
        .collect();
    assert_eq!(labels, vec!["Declined", "Booked"]);
}
