mod support;

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use support::{make_result_set, number, text};
use vendor_report::CellScalar;
use vendor_report::format::{WritableCell, to_writable, to_writable_rows};

#[test]
fn null_becomes_empty_cell() {
    assert_eq!(to_writable(&CellScalar::Null), WritableCell::Empty);
}

#[test]
fn scalars_map_to_native_cell_types() {
    assert_eq!(
        to_writable(&CellScalar::Bool(true)),
        WritableCell::Bool(true)
    );
    assert_eq!(
        to_writable(&CellScalar::Number(97.5)),
        WritableCell::Number(97.5)
    );
    assert_eq!(
        to_writable(&CellScalar::Text("ACME".to_string())),
        WritableCell::Text("ACME".to_string())
    );
}

#[test]
fn dates_render_as_iso_text() {
    let date = NaiveDate::from_ymd_opt(2025, 4, 30).expect("valid date");
    assert_eq!(
        to_writable(&CellScalar::Date(date)),
        WritableCell::Text("2025-04-30".to_string())
    );

    let datetime = NaiveDateTime::parse_from_str("2025-04-30 13:45:00", "%Y-%m-%d %H:%M:%S")
        .expect("valid datetime");
    assert_eq!(
        to_writable(&CellScalar::DateTime(datetime)),
        WritableCell::Text("2025-04-30".to_string())
    );
}

#[test]
fn rows_keep_their_order() {
    let set = make_result_set(
        "Basic_Metrics",
        &["PO", "QTY"],
        vec![
            vec![text("PO-1"), number(10.0)],
            vec![text("PO-2"), number(20.0)],
        ],
    );
    let rows = to_writable_rows(&set);
    assert_eq!(rows[0][0], WritableCell::Text("PO-1".to_string()));
    assert_eq!(rows[1][1], WritableCell::Number(20.0));
}

fn arb_scalar() -> impl Strategy<Value = CellScalar> {
    prop_oneof![
        Just(CellScalar::Null),
        any::<bool>().prop_map(CellScalar::Bool),
        (-1.0e9..1.0e9f64).prop_map(CellScalar::Number),
        "[a-zA-Z0-9 ]{0,16}".prop_map(CellScalar::Text),
    ]
}

fn arb_table() -> impl Strategy<Value = (usize, Vec<Vec<CellScalar>>)> {
    (1usize..6).prop_flat_map(|columns| {
        proptest::collection::vec(
            proptest::collection::vec(arb_scalar(), columns),
            0..20,
        )
        .prop_map(move |rows| (columns, rows))
    })
}

proptest! {
    // Shape preservation: one output row per input row, one value per column.
    #[test]
    fn conversion_preserves_shape((columns, data) in arb_table()) {
        let names: Vec<String> = (0..columns).map(|i| format!("C{i}")).collect();
        let row_count = data.len();
        let set = vendor_report::ResultSet::new("prop", names, data).unwrap();
        let writable = to_writable_rows(&set);
        prop_assert_eq!(writable.len(), row_count);
        for row in &writable {
            prop_assert_eq!(row.len(), columns);
        }
    }
}
