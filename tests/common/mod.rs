use csv_remedy::{
    frame::DataFrame,
    schema::{infer_schema, parse_typed_row},
};

/// Builds a typed frame the same way the I/O layer does: infer column
/// types over every raw row, then parse.
pub fn frame_from_rows(headers: &[&str], raw: &[&[&str]]) -> DataFrame {
    let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let rows: Vec<Vec<String>> = raw
        .iter()
        .map(|row| row.iter().map(|s| s.to_string()).collect())
        .collect();
    let schema = infer_schema(&headers, &rows);
    let typed = rows
        .iter()
        .map(|row| parse_typed_row(&schema, row).expect("typed row"))
        .collect();
    DataFrame::from_rows(schema, typed).expect("uniform rows")
}
