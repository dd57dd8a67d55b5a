//! Stateless helper utilities shared by the loader, batcher and writer.

use chrono::NaiveDate;

use crate::conf::{
    C_FILE_NAME_DATE_FMT, C_FILE_NAME_EXT, C_FILE_NAME_INFIX, C_FILE_NAME_PREFIX, TUP_NA_TOKENS,
};
use crate::spec::EnumCellValue;

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Coerce a cell to an optional number.
///
/// Blank cells, whitespace-only text and NA tokens (`#N/A`, `NULL`, ...) are `Ok(None)`. Text is
/// parsed after trimming and dropping thousands separators. Returns the raw text as `Err` when it
/// is not a number.
pub fn coerce_numeric_cell(value: &EnumCellValue) -> Result<Option<f64>, String> {
    match value {
        EnumCellValue::None => Ok(None),
        EnumCellValue::Number(n) => Ok(if n.is_nan() { None } else { Some(*n) }),
        EnumCellValue::String(s) => {
            let c_trimmed = s.trim();
            if c_trimmed.is_empty() || TUP_NA_TOKENS.contains(&c_trimmed) {
                return Ok(None);
            }
            let c_text = c_trimmed.replace(',', "");
            match c_text.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Some(n)),
                _ => Err(s.clone()),
            }
        }
    }
}

/// Render a number the way it is displayed in a sheet: integral values without `.0`.
pub fn format_number_display(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    n.to_string()
}

/// Displayed text of a normalized cell value (blank for missing).
pub fn derive_cell_display_text(value: &EnumCellValue) -> String {
    match value {
        EnumCellValue::None => String::new(),
        EnumCellValue::String(s) => s.clone(),
        EnumCellValue::Number(n) if n.is_nan() => String::new(),
        EnumCellValue::Number(n) => format_number_display(*n),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnUtils

/// Required columns absent from `columns`, in required order.
pub fn select_missing_columns(columns: &[String], columns_required: &[String]) -> Vec<String> {
    columns_required
        .iter()
        .filter(|c_name| !columns.contains(c_name))
        .cloned()
        .collect()
}

/// Final column width: `max(content, header, min) + padding`, measured in characters.
pub fn calculate_column_width(
    n_len_content_max: usize,
    header: &str,
    width_cell_min: usize,
    width_cell_padding: usize,
) -> usize {
    let n_len_header = header.chars().count();
    usize::max(usize::max(n_len_content_max, n_len_header), width_cell_min) + width_cell_padding
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Naming

/// Output file name `(홀라인){vendor}_발주서_{yyMMdd}.xlsx`; vendor is used verbatim.
pub fn derive_output_file_name(vendor: &str, date_run: NaiveDate) -> String {
    format!(
        "{C_FILE_NAME_PREFIX}{vendor}{C_FILE_NAME_INFIX}{}.{C_FILE_NAME_EXT}",
        date_run.format(C_FILE_NAME_DATE_FMT)
    )
}

/// Parse a run date given as `YYYY-MM-DD` or `yyMMdd`.
pub fn parse_date_run(value: &str) -> Result<NaiveDate, String> {
    let c_value = value.trim();
    NaiveDate::parse_from_str(c_value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(c_value, C_FILE_NAME_DATE_FMT))
        .map_err(|_| format!("Invalid run date {c_value:?}; expected YYYY-MM-DD or yyMMdd."))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
