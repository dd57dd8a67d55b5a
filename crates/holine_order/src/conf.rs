//! Order form constants and variant preset factories.

use std::collections::BTreeMap;

use crate::spec::{
    EnumOrderVariant, SpecAutofitCellsPolicy, SpecCellFormat, SpecOrderFormatSet,
    SpecOrderVariant,
};

/// Source sheet holding the order form.
pub const C_SHEET_NAME_SOURCE: &str = "발주양식";
/// Sheet name of every vendor output workbook.
pub const C_SHEET_NAME_OUTPUT: &str = "발주내역";

/// Output file name prefix.
pub const C_FILE_NAME_PREFIX: &str = "(홀라인)";
/// Output file name infix between vendor and date.
pub const C_FILE_NAME_INFIX: &str = "_발주서_";
/// Output file extension (without dot).
pub const C_FILE_NAME_EXT: &str = "xlsx";
/// `chrono` pattern for the run date in file names (`yyMMdd`).
pub const C_FILE_NAME_DATE_FMT: &str = "%y%m%d";

pub const C_COL_VENDOR: &str = "거래처명";
pub const C_COL_CODE_INTERNAL: &str = "자사코드";
pub const C_COL_CODE_PRODUCT: &str = "상품코드";
pub const C_COL_NAME_PRODUCT: &str = "상품명";
pub const C_COL_COLOR: &str = "칼라명";
pub const C_COL_SIZE: &str = "사이즈";
pub const C_COL_QTY: &str = "발주수량";
pub const C_COL_PRICE: &str = "공급가";
pub const C_COL_AMOUNT: &str = "공급가합";

/// Cell texts read as a missing value in quantity/price columns.
pub const TUP_NA_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Header background fill.
pub const C_COLOR_HEADER_BG: &str = "#D9D9D9";
/// Thousands-separated integer format.
pub const C_NUM_FORMAT_THOUSANDS: &str = "#,##0";

/// Progress checkpoints (percent).
pub const N_PCT_LOAD: u8 = 10;
pub const N_PCT_PREPARE: u8 = 20;
pub const N_PCT_WRITE_SPAN: u8 = 60;
pub const N_PCT_FINALIZE_START: u8 = 80;
pub const N_PCT_FINALIZE_STEP: u8 = 2;
pub const N_PCT_DONE: u8 = 100;

pub const C_MSG_LOAD: &str = "파일 읽는 중...";
pub const C_MSG_PREPARE: &str = "데이터 처리 중...";
pub const C_MSG_FINALIZE: &str = "마무리 중...";
/// Completion text shown by callers after a successful run.
pub const C_MSG_DONE: &str = "모든 발주서가 생성되었습니다!";
/// Prefix callers put in front of a terminal error message.
pub const C_MSG_ERROR_PREFIX: &str = "처리 중 오류가 발생했습니다";

fn derive_base_columns() -> Vec<String> {
    [
        C_COL_VENDOR,
        C_COL_CODE_INTERNAL,
        C_COL_CODE_PRODUCT,
        C_COL_NAME_PRODUCT,
        C_COL_COLOR,
        C_COL_SIZE,
        C_COL_QTY,
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

/// Consignment (위탁) preset: header on the first row, values written as-is.
pub fn derive_consignment_variant() -> SpecOrderVariant {
    SpecOrderVariant {
        rule_variant: EnumOrderVariant::Consignment,
        sheet_name_source: C_SHEET_NAME_SOURCE.to_string(),
        row_header: 0,
        cols_required: derive_base_columns(),
        col_vendor: C_COL_VENDOR.to_string(),
        col_qty: C_COL_QTY.to_string(),
        col_price: None,
        col_amount: None,
        if_fill_missing_numeric: false,
        font_size: None,
        num_format_numeric: None,
        policy_autofit: SpecAutofitCellsPolicy {
            dict_width_padding_by_col: BTreeMap::from([(C_COL_NAME_PRODUCT.to_string(), 7)]),
            ..Default::default()
        },
    }
}

/// Wholesale (사입) preset: header on the second row, price and formula amount columns.
pub fn derive_wholesale_variant() -> SpecOrderVariant {
    let mut cols_required = derive_base_columns();
    cols_required.push(C_COL_PRICE.to_string());

    SpecOrderVariant {
        rule_variant: EnumOrderVariant::Wholesale,
        sheet_name_source: C_SHEET_NAME_SOURCE.to_string(),
        row_header: 1,
        cols_required,
        col_vendor: C_COL_VENDOR.to_string(),
        col_qty: C_COL_QTY.to_string(),
        col_price: Some(C_COL_PRICE.to_string()),
        col_amount: Some(C_COL_AMOUNT.to_string()),
        if_fill_missing_numeric: true,
        font_size: Some(9),
        num_format_numeric: Some(C_NUM_FORMAT_THOUSANDS.to_string()),
        policy_autofit: SpecAutofitCellsPolicy {
            dict_width_padding_by_col: BTreeMap::from([
                (C_COL_NAME_PRODUCT.to_string(), 8),
                (C_COL_VENDOR.to_string(), 5),
                (C_COL_QTY.to_string(), 4),
            ]),
            ..Default::default()
        },
    }
}

/// Preset for `rule_variant`.
pub fn derive_variant(rule_variant: EnumOrderVariant) -> SpecOrderVariant {
    match rule_variant {
        EnumOrderVariant::Consignment => derive_consignment_variant(),
        EnumOrderVariant::Wholesale => derive_wholesale_variant(),
    }
}

/// Build the named formats of a vendor order sheet for `variant`.
pub fn derive_order_formats(variant: &SpecOrderVariant) -> SpecOrderFormatSet {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_size: variant.font_size,
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };
    let cfg_cell_fmt_spec = cfg_base_fmt_spec.with_(SpecCellFormat {
        border: Some(1),
        ..Default::default()
    });

    SpecOrderFormatSet {
        header: cfg_cell_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            bg_color: Some(C_COLOR_HEADER_BG.to_string()),
            ..Default::default()
        }),
        number: cfg_cell_fmt_spec.with_(SpecCellFormat {
            num_format: variant.num_format_numeric.clone(),
            ..Default::default()
        }),
        cell: cfg_cell_fmt_spec,
        total: cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            num_format: variant.num_format_numeric.clone(),
            ..Default::default()
        }),
        empty: cfg_base_fmt_spec,
    }
}
