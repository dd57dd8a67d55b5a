//! Vendor workbook writer kernel: one styled `발주내역` sheet per vendor batch.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use rust_xlsxwriter::utility::column_number_to_name;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Formula, Workbook, Worksheet, XlsxError};
use tracing::debug;

use crate::batch::derive_cell_value_from_any_value;
use crate::conf::{C_SHEET_NAME_OUTPUT, derive_order_formats};
use crate::spec::{
    EnumCellValue, OrderSplitError, SpecCellFormat, SpecOrderFormatSet, SpecOrderVariant,
    SpecVendorBatch,
};
use crate::util::{
    calculate_column_width, derive_cell_display_text, derive_output_file_name,
    format_number_display,
};

/// Resolved `rust_xlsxwriter` formats for one variant.
struct OrderFormats {
    header: Format,
    cell: Format,
    number: Format,
    total: Format,
    empty: Format,
}

impl OrderFormats {
    fn from_spec(fmts: &SpecOrderFormatSet) -> Self {
        Self {
            header: derive_rust_xlsx_format(&fmts.header),
            cell: derive_rust_xlsx_format(&fmts.cell),
            number: derive_rust_xlsx_format(&fmts.number),
            total: derive_rust_xlsx_format(&fmts.total),
            empty: derive_rust_xlsx_format(&fmts.empty),
        }
    }
}

/// Writer bound to one destination folder, run date and variant.
///
/// Every call to [`Self::write_vendor_batch`] builds and saves an independent workbook, so a
/// failure leaves previously written files in place.
pub struct OrderWorkbookWriter {
    variant: SpecOrderVariant,
    formats: OrderFormats,
    dir_output: PathBuf,
    date_run: NaiveDate,
}

impl OrderWorkbookWriter {
    pub fn new(variant: SpecOrderVariant, dir_output: PathBuf, date_run: NaiveDate) -> Self {
        let formats = OrderFormats::from_spec(&derive_order_formats(&variant));
        Self {
            variant,
            formats,
            dir_output,
            date_run,
        }
    }

    /// Output path for `vendor`; an existing file at that path is overwritten.
    pub fn derive_path_file_out(&self, vendor: &str) -> PathBuf {
        self.dir_output.join(derive_output_file_name(vendor, self.date_run))
    }

    /// Write one vendor workbook and return its path.
    pub fn write_vendor_batch(&self, batch: &SpecVendorBatch) -> Result<PathBuf, OrderSplitError> {
        let path_file_out = self.derive_path_file_out(&batch.vendor);
        let l_widths = plan_column_widths(&batch.df_rows, &self.variant)?;

        let mut workbook = Workbook::new();
        self.write_sheet(&mut workbook, batch, &l_widths)
            .and_then(|_| {
                workbook
                    .save(&path_file_out)
                    .map_err(derive_xlsx_error_text)
            })
            .map_err(|message| OrderSplitError::Write {
                path: path_file_out.clone(),
                message,
            })?;

        debug!(
            vendor = batch.vendor.as_str(),
            rows = batch.n_rows(),
            path = %path_file_out.display(),
            "wrote vendor workbook"
        );
        Ok(path_file_out)
    }

    fn write_sheet(
        &self,
        workbook: &mut Workbook,
        batch: &SpecVendorBatch,
        l_widths: &[usize],
    ) -> Result<(), String> {
        let l_cols = self.variant.cols_output();
        let n_idx_col_qty = find_column_index(&l_cols, &self.variant.col_qty)?;
        let n_idx_col_price = match &self.variant.col_price {
            Some(col_price) => Some(find_column_index(&l_cols, col_price)?),
            None => None,
        };
        let n_idx_col_amount = match &self.variant.col_amount {
            Some(col_amount) => Some(find_column_index(&l_cols, col_amount)?),
            None => None,
        };

        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(C_SHEET_NAME_OUTPUT)
            .map_err(derive_xlsx_error_text)?;

        for (n_idx_col, col_name) in l_cols.iter().enumerate() {
            worksheet
                .write_string_with_format(
                    0,
                    cast_col_num(n_idx_col)?,
                    col_name,
                    &self.formats.header,
                )
                .map_err(derive_xlsx_error_text)?;
        }

        let n_rows = batch.df_rows.height();
        for (n_idx_col, col_name) in l_cols.iter().enumerate() {
            if Some(n_idx_col) == n_idx_col_amount {
                let Some(n_idx_col_price) = n_idx_col_price else {
                    return Err(format!("amount column {col_name:?} needs a price column"));
                };
                let column = batch
                    .df_rows
                    .column(col_name)
                    .map_err(|err| err.to_string())?;
                for n_idx_row in 0..n_rows {
                    let amount = match derive_cell_value_from_any_value(
                        column.get(n_idx_row).map_err(|err| err.to_string())?,
                    ) {
                        EnumCellValue::Number(n) => n,
                        _ => 0.0,
                    };
                    let n_row_excel = n_idx_row + 2;
                    let formula = Formula::new(format!(
                        "={}{n_row_excel}*{}{n_row_excel}",
                        derive_column_letter(n_idx_col_qty)?,
                        derive_column_letter(n_idx_col_price)?,
                    ))
                    .set_result(format_number_display(amount));
                    worksheet
                        .write_formula_with_format(
                            cast_row_num(n_idx_row + 1)?,
                            cast_col_num(n_idx_col)?,
                            formula,
                            &self.formats.number,
                        )
                        .map_err(derive_xlsx_error_text)?;
                }
                continue;
            }

            let if_numeric = n_idx_col == n_idx_col_qty || Some(n_idx_col) == n_idx_col_price;
            let fmt = if if_numeric {
                &self.formats.number
            } else {
                &self.formats.cell
            };
            let column = batch
                .df_rows
                .column(col_name)
                .map_err(|err| err.to_string())?;
            for n_idx_row in 0..n_rows {
                let value = derive_cell_value_from_any_value(
                    column.get(n_idx_row).map_err(|err| err.to_string())?,
                );
                write_cell_with_format(worksheet, n_idx_row + 1, n_idx_col, &value, fmt)?;
            }
        }

        let n_idx_row_total = n_rows + 1;
        for n_idx_col in 0..l_cols.len() {
            if n_idx_col == n_idx_col_qty {
                write_cell_with_format(
                    worksheet,
                    n_idx_row_total,
                    n_idx_col,
                    &EnumCellValue::Number(batch.qty_total),
                    &self.formats.total,
                )?;
            } else if Some(n_idx_col) == n_idx_col_amount {
                let c_col = derive_column_letter(n_idx_col)?;
                let formula = Formula::new(format!("=SUM({c_col}2:{c_col}{})", n_rows + 1))
                    .set_result(format_number_display(batch.amount_total.unwrap_or(0.0)));
                worksheet
                    .write_formula_with_format(
                        cast_row_num(n_idx_row_total)?,
                        cast_col_num(n_idx_col)?,
                        formula,
                        &self.formats.total,
                    )
                    .map_err(derive_xlsx_error_text)?;
            } else {
                write_cell_with_format(
                    worksheet,
                    n_idx_row_total,
                    n_idx_col,
                    &EnumCellValue::None,
                    &self.formats.empty,
                )?;
            }
        }

        for (n_idx_col, n_width) in l_widths.iter().enumerate() {
            worksheet
                .set_column_width(cast_col_num(n_idx_col)?, *n_width as f64)
                .map_err(derive_xlsx_error_text)?;
        }

        Ok(())
    }
}

/// Plan final column widths for the output columns of `df_rows`.
///
/// Width is `max(longest displayed value, header, min) + padding`, counted in characters.
pub fn plan_column_widths(
    df_rows: &DataFrame,
    variant: &SpecOrderVariant,
) -> Result<Vec<usize>, OrderSplitError> {
    let policy = &variant.policy_autofit;
    let mut l_widths = Vec::new();
    for col_name in variant.cols_output() {
        let column = df_rows.column(&col_name)?;
        let mut n_len_content_max = 0usize;
        for n_idx_row in 0..df_rows.height() {
            let value = derive_cell_value_from_any_value(column.get(n_idx_row)?);
            n_len_content_max =
                usize::max(n_len_content_max, derive_cell_display_text(&value).chars().count());
        }
        l_widths.push(calculate_column_width(
            n_len_content_max,
            &col_name,
            policy.width_cell_min,
            policy.padding_for(&col_name),
        ));
    }
    Ok(l_widths)
}

/// Reject a destination that is missing or not a directory.
pub fn validate_dir_output(path: &Path) -> Result<(), OrderSplitError> {
    if path.is_dir() {
        return Ok(());
    }
    Err(OrderSplitError::DestinationInvalid {
        path: path.to_path_buf(),
    })
}

fn find_column_index(l_cols: &[String], col_name: &str) -> Result<usize, String> {
    l_cols
        .iter()
        .position(|c_name| c_name == col_name)
        .ok_or_else(|| format!("output column not found: {col_name}"))
}

fn derive_column_letter(n_idx_col: usize) -> Result<String, String> {
    Ok(column_number_to_name(cast_col_num(n_idx_col)?))
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), String> {
    match value {
        EnumCellValue::None => {
            worksheet
                .write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    val,
                    format,
                )
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::Number(val) => {
            worksheet
                .write_number_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    *val,
                    format,
                )
                .map_err(derive_xlsx_error_text)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}
