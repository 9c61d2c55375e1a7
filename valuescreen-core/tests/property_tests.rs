//! Property tests for reshaping and normalization invariants.
//!
//! 1. Pivot yields one row per distinct identifier, never duplicated
//! 2. Melt then pivot reproduces the wide table
//! 3. Footnote renaming is idempotent
//! 4. Percent coercion inverts formatting with a `%` suffix

use proptest::prelude::*;
use std::collections::BTreeMap;
use valuescreen_core::normalize::{parse_numeric, rename_footnoted_columns};
use valuescreen_core::{melt, pivot, CoercionMode, ColumnSpecs, LongTable};

// ── Strategies ──────────────────────────────────────────────────────

fn arb_identifier() -> impl Strategy<Value = String> {
    "[A-Z]{2,4}\\.(DE|PA|AS|MI)"
}

fn arb_attribute() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Trailing P/E".to_string()),
        Just("Forward P/E".to_string()),
        Just("% Held by Insiders 1".to_string()),
        Just("Payout Ratio 4".to_string()),
        Just("Profit Margin".to_string()),
        Just("Beta (5Y Monthly)".to_string()),
    ]
}

/// Unique (identifier, attribute) cells with arbitrary raw values.
fn arb_long_table() -> impl Strategy<Value = LongTable> {
    prop::collection::btree_map(
        (arb_identifier(), arb_attribute()),
        "[0-9]{1,3}\\.[0-9]{1,2}%?",
        0..40,
    )
    .prop_map(|cells: BTreeMap<(String, String), String>| {
        let mut long = LongTable::new("Value");
        for ((id, attr), value) in cells {
            long.push(id, attr, value);
        }
        long
    })
}

proptest! {
    #[test]
    fn pivot_has_one_row_per_identifier(long in arb_long_table()) {
        let wide = pivot(&long).unwrap();
        let mut distinct: Vec<&str> = long.identifiers();
        distinct.sort();
        let ids: Vec<&str> = wide.identifiers().iter().map(String::as_str).collect();
        prop_assert_eq!(ids, distinct);
    }

    #[test]
    fn melt_then_pivot_reproduces_table(long in arb_long_table()) {
        let wide = pivot(&long).unwrap();
        let back = pivot(&melt(&wide, long.value_label())).unwrap();
        prop_assert_eq!(back, wide);
    }

    #[test]
    fn rename_is_idempotent(long in arb_long_table()) {
        let specs = ColumnSpecs::extended_defaults();
        let once = rename_footnoted_columns(pivot(&long).unwrap(), &specs);
        let twice = rename_footnoted_columns(once.clone(), &specs);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn percent_parse_strips_suffix(x in -1.0e6..1.0e6_f64) {
        let text = format!("{x}%");
        prop_assert_eq!(parse_numeric(&text, CoercionMode::Percent), Some(x));
        prop_assert_eq!(parse_numeric(&text, CoercionMode::Number), None);
    }
}
