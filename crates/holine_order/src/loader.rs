//! Source workbook reader: order-form sheet to a typed column table.

use std::path::Path;

use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};
use polars::prelude::{Column, DataFrame, PlSmallStr};
use tracing::{debug, info};

use crate::spec::{EnumCellValue, OrderSplitError, SpecOrderTable, SpecOrderVariant};
use crate::util::{derive_cell_display_text, select_missing_columns};

/// Load the variant's source sheet and select its required columns.
///
/// Rows above `variant.row_header` are ignored; the header row supplies column labels and every
/// physical row below it becomes one table row. Fails with
/// [`OrderSplitError::SheetNotFound`] or [`OrderSplitError::MissingColumns`] (listing every
/// missing column).
pub fn load_order_table(
    path_file_source: &Path,
    variant: &SpecOrderVariant,
) -> Result<SpecOrderTable, OrderSplitError> {
    let mut workbook: Sheets<_> =
        open_workbook_auto(path_file_source).map_err(|err| OrderSplitError::SourceOpen {
            path: path_file_source.to_path_buf(),
            message: err.to_string(),
        })?;

    let sheet_name = variant.sheet_name_source.as_str();
    if !workbook.sheet_names().iter().any(|c_name| c_name == sheet_name) {
        return Err(OrderSplitError::SheetNotFound {
            sheet: sheet_name.to_string(),
        });
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|err| OrderSplitError::SourceOpen {
            path: path_file_source.to_path_buf(),
            message: err.to_string(),
        })?;

    let (l_header, l_grid, l_rows_source) = derive_header_and_grid(&range, variant.row_header);
    info!(
        sheet = sheet_name,
        rows = l_grid.len(),
        cols = l_header.len(),
        "loaded order sheet"
    );

    let l_cols_missing = select_missing_columns(&l_header, &variant.cols_required);
    if !l_cols_missing.is_empty() {
        return Err(OrderSplitError::MissingColumns {
            columns: l_cols_missing,
        });
    }

    let mut l_columns = Vec::with_capacity(variant.cols_required.len());
    for col_name in &variant.cols_required {
        let n_idx_col = l_header
            .iter()
            .position(|c_name| c_name == col_name)
            .ok_or_else(|| OrderSplitError::MissingColumns {
                columns: vec![col_name.clone()],
            })?;
        let l_values: Vec<EnumCellValue> = l_grid
            .iter()
            .map(|row| row.get(n_idx_col).cloned().unwrap_or(EnumCellValue::None))
            .collect();
        l_columns.push(create_typed_column(col_name, &l_values));
    }

    let df_rows = DataFrame::new(l_columns)?;
    debug!(height = df_rows.height(), "selected required columns");

    Ok(SpecOrderTable {
        df_rows,
        l_rows_source,
    })
}

/// Split a sheet range into header labels, body cells and 1-based source row numbers.
///
/// Positions are physical: a range that starts below row 0 or column A is re-aligned so
/// `row_header` always refers to the sheet's own row numbering.
fn derive_header_and_grid(
    range: &Range<Data>,
    row_header: usize,
) -> (Vec<String>, Vec<Vec<EnumCellValue>>, Vec<usize>) {
    let (n_row_start, n_col_start) = match range.start() {
        Some((row, col)) => (row as usize, col as usize),
        None => return (vec![], vec![], vec![]),
    };

    let mut l_header = Vec::new();
    let mut l_grid = Vec::new();
    let mut l_rows_source = Vec::new();

    for (n_idx_row, row) in range.rows().enumerate() {
        let n_row_abs = n_row_start + n_idx_row;
        if n_row_abs < row_header {
            continue;
        }

        let mut l_cells = vec![EnumCellValue::None; n_col_start];
        l_cells.extend(row.iter().map(convert_data_to_cell_value));

        if n_row_abs == row_header {
            l_header = l_cells
                .iter()
                .map(|value| derive_cell_display_text(value).trim().to_string())
                .collect();
        } else {
            l_grid.push(l_cells);
            l_rows_source.push(n_row_abs + 1);
        }
    }

    (l_header, l_grid, l_rows_source)
}

fn convert_data_to_cell_value(data: &Data) -> EnumCellValue {
    match data {
        Data::Empty | Data::Error(_) => EnumCellValue::None,
        Data::String(val) => EnumCellValue::String(val.clone()),
        Data::Float(val) => EnumCellValue::Number(*val),
        Data::Int(val) => EnumCellValue::Number(*val as f64),
        Data::Bool(val) => EnumCellValue::String(if *val { "True" } else { "False" }.to_string()),
        _ => EnumCellValue::String(data.to_string()),
    }
}

/// Build a Float64 column when every non-blank cell is numeric, else a String column.
fn create_typed_column(col_name: &str, values: &[EnumCellValue]) -> Column {
    let if_all_numeric = values
        .iter()
        .all(|value| !matches!(value, EnumCellValue::String(_)));

    if if_all_numeric {
        let l_numbers: Vec<Option<f64>> = values
            .iter()
            .map(|value| match value {
                EnumCellValue::Number(n) => Some(*n),
                _ => None,
            })
            .collect();
        return Column::new(PlSmallStr::from(col_name), l_numbers);
    }

    let l_texts: Vec<Option<String>> = values
        .iter()
        .map(|value| match value {
            EnumCellValue::None => None,
            _ => Some(derive_cell_display_text(value)),
        })
        .collect();
    Column::new(PlSmallStr::from(col_name), l_texts)
}
