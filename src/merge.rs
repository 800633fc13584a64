use std::collections::HashMap;

use crate::model::Table;

fn occurrence_slots(columns: &[String]) -> Vec<(&str, usize)> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    columns
        .iter()
        .map(|name| {
            let count = seen.entry(name.as_str()).or_insert(0);
            let occurrence = *count;
            *count += 1;
            (name.as_str(), occurrence)
        })
        .collect()
}

fn find_slot(columns: &[String], name: &str, occurrence: usize) -> Option<usize> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, column)| column.as_str() == name)
        .nth(occurrence)
        .map(|(index, _)| index)
}

/// Stacks the rows of several tables under the ordered union of their column labels.
///
/// The k-th column named `N` in a table lands under the k-th `N` of the union;
/// cells a table has no column for stay empty. Column meaning is not reconciled.
pub(crate) fn concat_tables(tables: Vec<Table>) -> Table {
    let mut columns: Vec<String> = Vec::new();
    for table in &tables {
        for (name, occurrence) in occurrence_slots(&table.columns) {
            if find_slot(&columns, name, occurrence).is_none() {
                columns.push(name.to_string());
            }
        }
    }

    let mut rows = Vec::new();
    for table in tables {
        let slots = occurrence_slots(&table.columns)
            .into_iter()
            .map(|(name, occurrence)| find_slot(&columns, name, occurrence))
            .collect::<Vec<_>>();
        for row in table.rows {
            let mut stacked = vec![String::new(); columns.len()];
            for (cell, slot) in row.into_iter().zip(&slots) {
                if let Some(index) = slot {
                    stacked[*index] = cell;
                }
            }
            rows.push(stacked);
        }
    }

    Table { columns, rows }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::concat_tables;
    use crate::model::Table;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            columns: columns.iter().map(ToString::to_string).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(ToString::to_string).collect())
                .collect(),
        }
    }

    #[test]
    fn same_schema_tables_stack_directly() {
        let merged = concat_tables(vec![
            table(&["Fecha", "Saldo"], &[&["01/02", "10"]]),
            table(&["Fecha", "Saldo"], &[&["02/02", "20"]]),
        ]);
        assert_eq!(merged, table(&["Fecha", "Saldo"], &[&["01/02", "10"], &["02/02", "20"]]));
    }

    #[test]
    fn differing_columns_are_unioned_and_padded() {
        let merged = concat_tables(vec![
            table(&["Fecha", "Saldo"], &[&["01/02", "10"]]),
            table(&["Column 1", "Column 2", "Column 3"], &[&["a", "b", "c"]]),
        ]);
        assert_eq!(
            merged.columns,
            vec!["Fecha", "Saldo", "Column 1", "Column 2", "Column 3"]
        );
        assert_eq!(merged.rows[0], vec!["01/02", "10", "", "", ""]);
        assert_eq!(merged.rows[1], vec!["", "", "a", "b", "c"]);
    }

    #[test]
    fn repeated_labels_keep_their_own_slots() {
        let merged = concat_tables(vec![
            table(&["Fecha", "Fecha", "Saldo"], &[&["01/02", "03/02", "10"]]),
            table(&["Fecha", "Saldo"], &[&["04/02", "20"]]),
        ]);
        assert_eq!(merged.columns, vec!["Fecha", "Fecha", "Saldo"]);
        assert_eq!(merged.rows[1], vec!["04/02", "", "20"]);
        assert!(merged.rows.iter().all(|row| row.len() == merged.columns.len()));
    }

    #[test]
    fn nothing_to_merge() {
        assert_eq!(concat_tables(Vec::new()), Table::default());
    }
}
