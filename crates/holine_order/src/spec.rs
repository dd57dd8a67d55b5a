//! Shared order-splitting specification models and top-level error types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use polars::prelude::{DataFrame, PolarsError};
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification, translated to `rust_xlsxwriter::Format` at write time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
        }
    }
}

/// Named formats used by one vendor order sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecOrderFormatSet {
    /// Header row cells.
    pub header: SpecCellFormat,
    /// Plain data cells.
    pub cell: SpecCellFormat,
    /// Numeric data cells (quantity, price, amount).
    pub number: SpecCellFormat,
    /// Totals-row value cells.
    pub total: SpecCellFormat,
    /// Totals-row blank cells.
    pub empty: SpecCellFormat,
}

/// Normalized cell value during load/write pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region VariantSpecification

/// Order form variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumOrderVariant {
    /// Consignment orders (위탁): seven columns, values written as-is.
    #[default]
    Consignment,
    /// Wholesale orders (사입): adds unit price and a formula-driven amount column.
    Wholesale,
}

impl EnumOrderVariant {
    /// Stable lowercase identifier used by the CLI and Python bridge.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consignment => "consignment",
            Self::Wholesale => "wholesale",
        }
    }

    /// Parse a lowercase identifier produced by [`Self::as_str`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "consignment" => Some(Self::Consignment),
            "wholesale" => Some(Self::Wholesale),
            _ => None,
        }
    }
}

/// Column width inference policy for vendor order sheets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Minimum content width before padding.
    pub width_cell_min: usize,
    /// Padding added to columns without an override.
    pub width_cell_padding: usize,
    /// Per-column padding overrides keyed by header label.
    pub dict_width_padding_by_col: BTreeMap<String, usize>,
}

impl SpecAutofitCellsPolicy {
    /// Padding for column `col_name`.
    pub fn padding_for(&self, col_name: &str) -> usize {
        self.dict_width_padding_by_col
            .get(col_name)
            .copied()
            .unwrap_or(self.width_cell_padding)
    }
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            width_cell_min: 3,
            width_cell_padding: 1,
            dict_width_padding_by_col: BTreeMap::new(),
        }
    }
}

/// Variant descriptor driving the single order-splitting pipeline.
///
/// Presets live in [`crate::conf::derive_consignment_variant`] and
/// [`crate::conf::derive_wholesale_variant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecOrderVariant {
    /// Variant identity.
    pub rule_variant: EnumOrderVariant,
    /// Source sheet that holds the order form.
    pub sheet_name_source: String,
    /// Zero-based physical row holding the header labels.
    pub row_header: usize,
    /// Columns selected from the source, in output order.
    pub cols_required: Vec<String>,
    /// Vendor (grouping key) column.
    pub col_vendor: String,
    /// Order quantity column.
    pub col_qty: String,
    /// Unit price column, when the variant carries prices.
    pub col_price: Option<String>,
    /// Derived `quantity * price` column appended after `cols_required`.
    pub col_amount: Option<String>,
    /// Coerce missing quantity/price to 0 before filtering.
    pub if_fill_missing_numeric: bool,
    /// Font size applied to every output format.
    pub font_size: Option<i64>,
    /// Number format for quantity/price/amount cells; `None` writes them as plain cells.
    pub num_format_numeric: Option<String>,
    /// Column width policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
}

impl SpecOrderVariant {
    /// Output column labels: required columns followed by the derived amount column.
    pub fn cols_output(&self) -> Vec<String> {
        let mut l_cols = self.cols_required.clone();
        if let Some(col_amount) = &self.col_amount {
            l_cols.push(col_amount.clone());
        }
        l_cols
    }

    /// Columns coerced to numbers during filtering.
    pub fn cols_numeric(&self) -> Vec<&str> {
        let mut l_cols = vec![self.col_qty.as_str()];
        if let Some(col_price) = &self.col_price {
            l_cols.push(col_price.as_str());
        }
        l_cols
    }
}

impl Default for SpecOrderVariant {
    fn default() -> Self {
        crate::conf::derive_consignment_variant()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SplitOptions

/// Input options for [`crate::split::split_orders`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSplitOptions {
    /// Variant descriptor.
    pub variant: SpecOrderVariant,
    /// Run date stamped into every output file name.
    pub date_run: NaiveDate,
}

impl SpecSplitOptions {
    /// Options for `variant` stamped with today's local date.
    pub fn for_variant(rule_variant: EnumOrderVariant) -> Self {
        Self {
            variant: crate::conf::derive_variant(rule_variant),
            date_run: Local::now().date_naive(),
        }
    }
}

impl Default for SpecSplitOptions {
    fn default() -> Self {
        Self::for_variant(EnumOrderVariant::Consignment)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableModels

/// Loaded source table restricted to the variant's required columns.
#[derive(Debug, Clone)]
pub struct SpecOrderTable {
    /// Required columns in variant order.
    pub df_rows: DataFrame,
    /// 1-based spreadsheet row number of every table row.
    pub l_rows_source: Vec<usize>,
}

/// Rows belonging to one vendor plus derived totals.
#[derive(Debug, Clone)]
pub struct SpecVendorBatch {
    /// Vendor name (grouping key), verbatim.
    pub vendor: String,
    /// Output columns, rows in original relative order.
    pub df_rows: DataFrame,
    /// Sum of quantities.
    pub qty_total: f64,
    /// Sum of line amounts (variants with an amount column only).
    pub amount_total: Option<f64>,
}

impl SpecVendorBatch {
    /// Number of order rows in the batch.
    pub fn n_rows(&self) -> usize {
        self.df_rows.height()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Coarse error category, stable across message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSplitErrorKind {
    /// Source sheet absent.
    SheetNotFound,
    /// Required columns absent.
    MissingColumns,
    /// Non-numeric quantity/price.
    InvalidNumber,
    /// Source workbook unreadable.
    SourceOpen,
    /// Destination folder unusable.
    DestinationInvalid,
    /// Output workbook failed to write.
    Write,
    /// Anything else.
    Unexpected,
}

/// Terminal failure of one split job.
#[derive(Debug, Error)]
pub enum OrderSplitError {
    /// Named sheet absent from the source workbook.
    #[error("'{sheet}' 시트를 찾을 수 없습니다. 엑셀 파일의 시트 이름을 확인해주세요.")]
    SheetNotFound {
        /// Requested sheet name.
        sheet: String,
    },
    /// One or more required columns absent from the header row.
    #[error("필요한 열을 찾을 수 없습니다: {}", .columns.join(", "))]
    MissingColumns {
        /// Every missing column, in required order.
        columns: Vec<String>,
    },
    /// Quantity/price cell holds text that is not a number.
    #[error("숫자로 변환할 수 없는 값입니다 ({column}, {row}행): {value:?}")]
    InvalidNumber {
        /// Column label.
        column: String,
        /// 1-based spreadsheet row number.
        row: usize,
        /// Raw cell text.
        value: String,
    },
    /// Source workbook cannot be opened or parsed.
    #[error("엑셀 파일을 열 수 없습니다: {}: {message}", .path.display())]
    SourceOpen {
        /// Source file path.
        path: PathBuf,
        /// Underlying reader error text.
        message: String,
    },
    /// Destination folder missing or not a directory.
    #[error("저장할 폴더를 찾을 수 없습니다: {}", .path.display())]
    DestinationInvalid {
        /// Destination folder path.
        path: PathBuf,
    },
    /// Writing one vendor workbook failed; remaining vendors are not written.
    #[error("발주서 파일을 저장하지 못했습니다: {}: {message}", .path.display())]
    Write {
        /// Output file path.
        path: PathBuf,
        /// Underlying writer error text.
        message: String,
    },
    /// Catch-all carrying the underlying cause's description.
    #[error("{0}")]
    Unexpected(String),
}

impl OrderSplitError {
    /// Error category.
    pub fn kind(&self) -> EnumSplitErrorKind {
        match self {
            Self::SheetNotFound { .. } => EnumSplitErrorKind::SheetNotFound,
            Self::MissingColumns { .. } => EnumSplitErrorKind::MissingColumns,
            Self::InvalidNumber { .. } => EnumSplitErrorKind::InvalidNumber,
            Self::SourceOpen { .. } => EnumSplitErrorKind::SourceOpen,
            Self::DestinationInvalid { .. } => EnumSplitErrorKind::DestinationInvalid,
            Self::Write { .. } => EnumSplitErrorKind::Write,
            Self::Unexpected(_) => EnumSplitErrorKind::Unexpected,
        }
    }
}

impl From<PolarsError> for OrderSplitError {
    fn from(err: PolarsError) -> Self {
        Self::Unexpected(err.to_string())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_lists_every_column() {
        let err = OrderSplitError::MissingColumns {
            columns: vec!["상품코드".to_string(), "공급가".to_string()],
        };
        assert_eq!(err.to_string(), "필요한 열을 찾을 수 없습니다: 상품코드, 공급가");
        assert_eq!(err.kind(), EnumSplitErrorKind::MissingColumns);
    }

    #[test]
    fn sheet_not_found_message_names_sheet() {
        let err = OrderSplitError::SheetNotFound {
            sheet: "발주양식".to_string(),
        };
        assert!(err.to_string().starts_with("'발주양식' 시트를 찾을 수 없습니다."));
    }

    #[test]
    fn format_merge_prefers_patch_values() {
        let fmt_base = SpecCellFormat {
            font_size: Some(9),
            valign: Some("vcenter".to_string()),
            ..Default::default()
        };
        let fmt = fmt_base.with_(SpecCellFormat {
            bold: Some(true),
            font_size: Some(11),
            ..Default::default()
        });
        assert_eq!(fmt.font_size, Some(11));
        assert_eq!(fmt.bold, Some(true));
        assert_eq!(fmt.valign.as_deref(), Some("vcenter"));
    }

    #[test]
    fn variant_name_round_trips_through_parser() {
        assert_eq!(
            EnumOrderVariant::from_name(" Wholesale "),
            Some(EnumOrderVariant::Wholesale)
        );
        assert_eq!(EnumOrderVariant::from_name("retail"), None);
    }
}
