use proptest::prelude::*;
use quire_table::{Cell, Table};

fn arb_table() -> impl Strategy<Value = Table> {
    (prop::sample::subsequence(vec!["a", "b", "c", "d"], 1..=4), 0usize..6).prop_map(
        |(columns, rows)| {
            let width = columns.len();
            let rows = (0..rows)
                .map(|r| {
                    (0..width)
                        .map(|c| Cell::Int(i64::try_from(r * 10 + c).unwrap()))
                        .collect()
                })
                .collect();
            Table::from_rows(columns, rows).unwrap()
        },
    )
}

proptest! {
    #[test]
    fn concat_keeps_every_row_and_column(tables in prop::collection::vec(arb_table(), 0..4)) {
        let merged = Table::concat(&tables);
        prop_assert_eq!(merged.len(), tables.iter().map(Table::len).sum::<usize>());
        for table in &tables {
            for name in table.columns() {
                prop_assert!(merged.has_column(name));
            }
        }
        let mut offset = 0;
        for table in &tables {
            for row in 0..table.len() {
                for name in table.columns() {
                    prop_assert_eq!(merged.cell(offset + row, name), table.cell(row, name));
                }
            }
            offset += table.len();
        }
    }

    #[test]
    fn csv_has_one_line_per_row(table in arb_table()) {
        prop_assert_eq!(table.to_csv().lines().count(), table.len() + 1);
    }
}
