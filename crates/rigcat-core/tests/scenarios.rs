use proptest::prelude::*;
use rigcat_core::{evaluate, filter, CatalogItem, ConstraintEvent, ConstraintSet, TriState};

fn headphones() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new(1, "WH-1000XM5", "Sony")
            .with_price(399.99)
            .with_attr("wireless", true),
        CatalogItem::new(2, "QuietComfort Ultra", "Bose")
            .with_price(329.99)
            .with_attr("wireless", true),
        CatalogItem::new(3, "HD 800 S", "Sennheiser")
            .with_price(499.99)
            .with_attr("wireless", false),
    ]
}

fn ids(items: &[CatalogItem]) -> Vec<u64> {
    items.iter().map(|i| i.id).collect()
}

#[test]
fn wireless_within_budget() {
    let c = ConstraintSet::new()
        .with_price_range(50.0, 500.0)
        .with_flag("wireless", true);
    assert_eq!(ids(&filter(&headphones(), &c)), vec![1, 2]);
}

#[test]
fn query_matches_brand_substring() {
    let c = ConstraintSet::new().with_query("sen");
    assert_eq!(ids(&filter(&headphones(), &c)), vec![3]);
    let c = ConstraintSet::new().with_query("son");
    assert_eq!(ids(&filter(&headphones(), &c)), vec![1]);
}

#[test]
fn query_matches_display_name() {
    let c = ConstraintSet::new().with_query("quietcomfort");
    assert_eq!(ids(&filter(&headphones(), &c)), vec![2]);
}

#[test]
fn price_bounds_are_inclusive() {
    let c = ConstraintSet::new().with_price_range(400.0, 500.0);
    assert_eq!(ids(&filter(&headphones(), &c)), vec![3]);
    let c = ConstraintSet::new().with_price_range(329.99, 399.99);
    assert_eq!(ids(&filter(&headphones(), &c)), vec![1, 2]);
}

#[test]
fn brand_selection_on_plain_items() {
    let c = ConstraintSet::new().with_selection("brand", ["Sony", "Sennheiser"]);
    assert_eq!(ids(&filter(&headphones(), &c)), vec![1, 3]);
}

#[test]
fn unset_discrete_facet_excludes_item_while_selected() {
    let mut items = headphones();
    items[2] = items[2].clone().with_attr("back", "open");
    let c = ConstraintSet::new().with_selection("back", ["open"]);
    assert_eq!(ids(&filter(&items, &c)), vec![3]);
    let c = ConstraintSet::new().with_selection("back", ["closed"]);
    assert!(filter(&items, &c).is_empty());
}

#[test]
fn contact_for_price_always_passes_price_gate() {
    let item = CatalogItem::new(4, "Prototype", "Acme");
    let c = ConstraintSet::new().with_price_range(1000.0, 2000.0);
    assert!(evaluate(&item, &c));
}

#[test]
fn reducer_builds_same_set_as_builder() {
    let events = [
        ConstraintEvent::SetPriceRange { min: 50.0, max: 500.0 },
        ConstraintEvent::SetFlag { facet: "wireless".into(), value: true },
        ConstraintEvent::ToggleValue { facet: "brand".into(), value: "Bose".into() },
        ConstraintEvent::ToggleValue { facet: "brand".into(), value: "Sony".into() },
        ConstraintEvent::ToggleValue { facet: "brand".into(), value: "Bose".into() },
    ];
    let c = events.iter().fold(ConstraintSet::new(), |c, ev| c.apply(ev));
    assert_eq!(c.flag("wireless"), TriState::Yes);
    assert_eq!(ids(&filter(&headphones(), &c)), vec![1]);
}

fn arb_item() -> impl Strategy<Value = CatalogItem> {
    (
        0u64..1000,
        "[A-Za-z ]{0,12}",
        prop::sample::select(vec!["Sony", "Bose", "Sennheiser", "AKG"]),
        prop_oneof![Just(0.0f64), 1.0f64..1000.0],
        prop::option::of(any::<bool>()),
        prop::option::of(prop::sample::select(vec!["closed", "open", "semi"])),
    )
        .prop_map(|(id, name, brand, price, wireless, back)| {
            let mut item = CatalogItem::new(id, name, brand).with_price(price);
            if let Some(w) = wireless {
                item = item.with_attr("wireless", w);
            }
            if let Some(b) = back {
                item = item.with_attr("back", b);
            }
            item
        })
}

fn arb_constraints() -> impl Strategy<Value = ConstraintSet> {
    (
        prop::option::of((0.0f64..500.0, 500.0f64..1000.0)),
        prop::sample::select(vec!["", "so", "SE", "z"]),
        prop::option::of(any::<bool>()),
        prop::collection::btree_set(prop::sample::select(vec!["closed", "open"]), 0..3),
    )
        .prop_map(|(range, query, wireless, backs)| {
            let mut c = ConstraintSet::new().with_query(query);
            if let Some((min, max)) = range {
                c = c.with_price_range(min, max);
            }
            if let Some(w) = wireless {
                c = c.with_flag("wireless", w);
            }
            c.with_selection("back", backs)
        })
}

proptest! {
    #[test]
    fn unconstrained_filter_is_identity(items in prop::collection::vec(arb_item(), 0..20)) {
        let out = filter(&items, &ConstraintSet::new());
        prop_assert_eq!(out, items);
    }

    #[test]
    fn filter_preserves_relative_order(
        items in prop::collection::vec(arb_item(), 0..20),
        c in arb_constraints(),
    ) {
        let expected: Vec<CatalogItem> =
            items.iter().filter(|i| evaluate(i, &c)).cloned().collect();
        prop_assert_eq!(filter(&items, &c), expected);
    }

    #[test]
    fn price_gate_matches_window(price in 0.01f64..1000.0, min in 0.0f64..600.0, width in 0.0f64..600.0) {
        let item = CatalogItem::new(1, "x", "y").with_price(price);
        let c = ConstraintSet::new().with_price_range(min, min + width);
        prop_assert_eq!(evaluate(&item, &c), min <= price && price <= min + width);
    }

    #[test]
    fn combined_constraints_are_a_conjunction(
        item in arb_item(),
        a in arb_constraints(),
        b in arb_constraints(),
    ) {
        // merge b's flag and text onto a's price and selections
        let mut both = a.clone();
        both.query = b.query.clone();
        both.booleans = b.booleans.clone();
        let mut only_a = a.clone();
        only_a.query.clear();
        only_a.booleans.clear();
        let mut only_b = ConstraintSet::new().with_query(b.query.clone());
        only_b.booleans = b.booleans.clone();
        prop_assert_eq!(
            evaluate(&item, &both),
            evaluate(&item, &only_a) && evaluate(&item, &only_b)
        );
    }

    #[test]
    fn tri_state_involution(start in prop::option::of(any::<bool>()), v in any::<bool>()) {
        let s = TriState::from(start);
        let once = s.toggle(v);
        if s == TriState::from(v) {
            prop_assert_eq!(once, TriState::Unset);
        } else {
            prop_assert_eq!(once, TriState::from(v));
            prop_assert_eq!(once.toggle(v), TriState::Unset);
        }
    }
}
