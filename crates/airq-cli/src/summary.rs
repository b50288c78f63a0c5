use std::collections::BTreeSet;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use airq_model::Value;

use crate::types::{InspectResult, LoadResult};

pub fn print_summary(result: &LoadResult) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Load"), header_cell("")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);

    table.add_row(vec![
        label_cell("Source"),
        Cell::new(result.source.display()),
    ]);
    table.add_row(vec![
        label_cell("Store"),
        match &result.store {
            Some(path) if result.skipped => {
                dim_cell(format!("{} (already holds data, skipped)", path.display()))
            }
            Some(path) => Cell::new(path.display()),
            None => dim_cell("dry run"),
        },
    ]);
    table.add_row(vec![label_cell("Batch capacity"), Cell::new(result.batch_capacity)]);
    table.add_row(vec![label_cell("Batches"), Cell::new(result.batches)]);
    table.add_row(vec![
        label_cell("Records"),
        Cell::new(result.records).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        label_cell("Elapsed (ms)"),
        Cell::new(result.elapsed.as_millis()),
    ]);
    println!("{table}");
}

pub fn print_inspect(result: &InspectResult) {
    println!("Source: {}", result.source.display());

    let mut headers = Table::new();
    headers.set_header(vec![
        header_cell("#"),
        header_cell("Header"),
        header_cell("Field"),
    ]);
    apply_table_style(&mut headers);
    align_column(&mut headers, 0, CellAlignment::Right);
    for (index, column) in result.columns.iter().enumerate() {
        headers.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&column.raw),
            match &column.name {
                Some(name) => Cell::new(name),
                None => dim_cell("dropped"),
            },
        ]);
    }
    println!("{headers}");

    if result.records.is_empty() {
        println!("No records.");
        return;
    }

    let fields: BTreeSet<&str> = result
        .records
        .iter()
        .flat_map(|record| record.names())
        .collect();
    let mut records = Table::new();
    records.set_header(fields.iter().map(|name| header_cell(name)));
    apply_table_style(&mut records);
    for record in &result.records {
        records.add_row(fields.iter().map(|name| match record.get(name) {
            None => dim_cell("-"),
            Some(Value::Null) => dim_cell("null"),
            Some(Value::Number(n)) => Cell::new(n).set_alignment(CellAlignment::Right),
            Some(value) => Cell::new(value),
        }));
    }
    println!("{records}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn label_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
