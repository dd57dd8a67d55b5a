//! Row filtering, line-amount aggregation and vendor grouping.

use indexmap::IndexMap;
use polars::prelude::{
    AnyValue, BooleanChunked, Column, DataFrame, IdxCa, IdxSize, NewChunkedArray, PlSmallStr,
};
use tracing::{debug, warn};

use crate::spec::{
    EnumCellValue, OrderSplitError, SpecOrderTable, SpecOrderVariant, SpecVendorBatch,
};
use crate::util::{coerce_numeric_cell, derive_cell_display_text};

////////////////////////////////////////////////////////////////////////////////
// #region RowFilter

/// Coerce the quantity column and keep rows whose quantity is present and non-zero.
///
/// When `variant.if_fill_missing_numeric` is set, a missing quantity becomes 0 first (so it is
/// dropped by the same rule). The remaining numeric columns (price) are coerced and filled on
/// kept rows only. Non-numeric text is [`OrderSplitError::InvalidNumber`]. Row order is
/// preserved.
pub fn filter_order_rows(
    table: &SpecOrderTable,
    variant: &SpecOrderVariant,
) -> Result<DataFrame, OrderSplitError> {
    let mut df_rows = table.df_rows.clone();

    let l_qty = coerce_numeric_column(
        &df_rows,
        &variant.col_qty,
        &table.l_rows_source,
        variant.if_fill_missing_numeric,
    )?;
    let l_mask_keep: Vec<bool> = l_qty
        .iter()
        .map(|qty| qty.is_some_and(|n| n != 0.0))
        .collect();
    df_rows.with_column(Column::new(PlSmallStr::from(variant.col_qty.as_str()), l_qty))?;

    let mask_keep = BooleanChunked::from_slice(PlSmallStr::from_static("keep"), &l_mask_keep);
    let mut df_kept = df_rows.filter(&mask_keep)?;
    let l_rows_source_kept: Vec<usize> = table
        .l_rows_source
        .iter()
        .zip(l_mask_keep.iter())
        .filter(|(_, if_keep)| **if_keep)
        .map(|(n_row, _)| *n_row)
        .collect();

    for col_name in variant.cols_numeric() {
        if col_name == variant.col_qty {
            continue;
        }
        let l_numbers = coerce_numeric_column(
            &df_kept,
            col_name,
            &l_rows_source_kept,
            variant.if_fill_missing_numeric,
        )?;
        df_kept.with_column(Column::new(PlSmallStr::from(col_name), l_numbers))?;
    }

    debug!(
        rows_in = df_rows.height(),
        rows_kept = df_kept.height(),
        "filtered order rows by quantity"
    );
    Ok(df_kept)
}

fn coerce_numeric_column(
    df: &DataFrame,
    col_name: &str,
    l_rows_source: &[usize],
    if_fill_missing: bool,
) -> Result<Vec<Option<f64>>, OrderSplitError> {
    let column = df.column(col_name)?;
    let mut l_numbers = Vec::with_capacity(df.height());
    for n_idx_row in 0..df.height() {
        let value = derive_cell_value_from_any_value(column.get(n_idx_row)?);
        let number = coerce_numeric_cell(&value).map_err(|text| OrderSplitError::InvalidNumber {
            column: col_name.to_string(),
            row: l_rows_source.get(n_idx_row).copied().unwrap_or(n_idx_row + 1),
            value: text,
        })?;
        l_numbers.push(if if_fill_missing {
            Some(number.unwrap_or(0.0))
        } else {
            number
        });
    }
    Ok(l_numbers)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Aggregator

/// Append `col_amount = quantity * price` when the variant defines an amount column.
pub fn append_line_amounts(
    df_rows: &mut DataFrame,
    variant: &SpecOrderVariant,
) -> Result<(), OrderSplitError> {
    let (Some(col_price), Some(col_amount)) = (&variant.col_price, &variant.col_amount) else {
        return Ok(());
    };

    let l_qty = read_f64_values(df_rows, &variant.col_qty)?;
    let l_price = read_f64_values(df_rows, col_price)?;
    let l_amount: Vec<Option<f64>> = l_qty
        .iter()
        .zip(l_price.iter())
        .map(|(qty, price)| Some(qty.unwrap_or(0.0) * price.unwrap_or(0.0)))
        .collect();

    df_rows.with_column(Column::new(PlSmallStr::from(col_amount.as_str()), l_amount))?;
    Ok(())
}

/// Sum of a Float64 column, nulls skipped.
pub fn sum_column(df: &DataFrame, col_name: &str) -> Result<f64, OrderSplitError> {
    Ok(read_f64_values(df, col_name)?.into_iter().flatten().sum())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region VendorGrouper

/// Partition rows by exact vendor name, vendors in order of first appearance.
///
/// Each batch keeps the original relative row order and carries its quantity total (and amount
/// total when the variant has an amount column). A blank vendor cell groups under `""`.
pub fn group_vendor_batches(
    df_rows: &DataFrame,
    variant: &SpecOrderVariant,
) -> Result<Vec<SpecVendorBatch>, OrderSplitError> {
    let column_vendor = df_rows.column(&variant.col_vendor)?;

    let mut dict_idx_by_vendor: IndexMap<String, Vec<IdxSize>> = IndexMap::new();
    for n_idx_row in 0..df_rows.height() {
        let vendor =
            derive_cell_display_text(&derive_cell_value_from_any_value(column_vendor.get(n_idx_row)?));
        if vendor.is_empty() {
            warn!(row = n_idx_row, "order row has no vendor name");
        }
        let n_idx = IdxSize::try_from(n_idx_row)
            .map_err(|_| OrderSplitError::Unexpected(format!("row index overflow: {n_idx_row}")))?;
        dict_idx_by_vendor.entry(vendor).or_default().push(n_idx);
    }

    let mut l_batches = Vec::with_capacity(dict_idx_by_vendor.len());
    for (vendor, l_idx) in dict_idx_by_vendor {
        let df_vendor = df_rows.take(&IdxCa::from_vec(PlSmallStr::from_static("idx"), l_idx))?;
        let qty_total = sum_column(&df_vendor, &variant.col_qty)?;
        let amount_total = match &variant.col_amount {
            Some(col_amount) => Some(sum_column(&df_vendor, col_amount)?),
            None => None,
        };
        l_batches.push(SpecVendorBatch {
            vendor,
            df_rows: df_vendor,
            qty_total,
            amount_total,
        });
    }

    Ok(l_batches)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region AnyValueConversion

pub(crate) fn read_f64_values(
    df: &DataFrame,
    col_name: &str,
) -> Result<Vec<Option<f64>>, OrderSplitError> {
    let column = df.column(col_name)?;
    let mut l_values = Vec::with_capacity(df.height());
    for n_idx_row in 0..df.height() {
        let value = match derive_cell_value_from_any_value(column.get(n_idx_row)?) {
            EnumCellValue::Number(n) => Some(n),
            _ => None,
        };
        l_values.push(value);
    }
    Ok(l_values)
}

pub(crate) fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
