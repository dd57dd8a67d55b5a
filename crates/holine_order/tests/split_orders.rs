use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use chrono::NaiveDate;
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

use holine_order::{
    EnumOrderVariant, EnumSplitErrorKind, EnumSplitEvent, OrderSplitError, ProgressSilent,
    SpecSplitOptions, spawn_split_orders, split_orders,
};

enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Blank,
}

use Cell::{Blank, Number, Text};

const L_HEADER_CONSIGNMENT: [&str; 7] = [
    "거래처명", "자사코드", "상품코드", "상품명", "칼라명", "사이즈", "발주수량",
];
const L_HEADER_WHOLESALE: [&str; 8] = [
    "거래처명", "자사코드", "상품코드", "상품명", "칼라명", "사이즈", "발주수량", "공급가",
];

fn create_source(
    dir: &Path,
    sheet_name: &str,
    l_rows_prefix: &[&str],
    l_header: &[&str],
    l_rows: &[Vec<Cell<'_>>],
) -> PathBuf {
    let path_file = dir.join("source.xlsx");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name).expect("sheet name");

    let mut n_row = 0u32;
    for title in l_rows_prefix {
        worksheet.write_string(n_row, 0, *title).expect("title");
        n_row += 1;
    }
    for (n_col, label) in l_header.iter().enumerate() {
        worksheet
            .write_string(n_row, n_col as u16, *label)
            .expect("header");
    }
    for row in l_rows {
        n_row += 1;
        for (n_col, cell) in row.iter().enumerate() {
            match cell {
                Text(val) => {
                    worksheet
                        .write_string(n_row, n_col as u16, *val)
                        .expect("text");
                }
                Number(val) => {
                    worksheet
                        .write_number(n_row, n_col as u16, *val)
                        .expect("number");
                }
                Blank => {}
            }
        }
    }
    workbook.save(&path_file).expect("save source");
    path_file
}

fn create_consignment_row<'a>(vendor: &'a str, product: &'a str, qty: Cell<'a>) -> Vec<Cell<'a>> {
    vec![
        Text(vendor),
        Text("IC-1"),
        Text("PC-1"),
        Text(product),
        Text("블랙"),
        Text("M"),
        qty,
    ]
}

fn create_wholesale_row<'a>(
    vendor: &'a str,
    product: &'a str,
    qty: Cell<'a>,
    price: Cell<'a>,
) -> Vec<Cell<'a>> {
    vec![
        Text(vendor),
        Text("IC-1"),
        Text("PC-1"),
        Text(product),
        Text("네이비"),
        Text("F"),
        qty,
        price,
    ]
}

fn create_options(rule_variant: EnumOrderVariant) -> SpecSplitOptions {
    let mut options = SpecSplitOptions::for_variant(rule_variant);
    options.date_run = NaiveDate::from_ymd_opt(2026, 10, 18).expect("date");
    options
}

fn read_output(path_file: &Path) -> calamine::Range<Data> {
    let mut workbook = open_workbook_auto(path_file).expect("open output");
    assert_eq!(workbook.sheet_names(), vec!["발주내역".to_string()]);
    workbook.worksheet_range("발주내역").expect("output sheet")
}

fn read_formulas(path_file: &Path) -> calamine::Range<String> {
    let mut workbook = open_workbook_auto(path_file).expect("open output");
    workbook.worksheet_formula("발주내역").expect("formulas")
}

fn cell_text(range: &calamine::Range<Data>, n_row: u32, n_col: u32) -> String {
    range
        .get_value((n_row, n_col))
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn formula_text(range: &calamine::Range<String>, n_row: u32, n_col: u32) -> String {
    range
        .get_value((n_row, n_col))
        .map(|val| val.trim_start_matches('=').to_string())
        .unwrap_or_default()
}

#[test]
fn consignment_split_writes_one_workbook_per_vendor() {
    let dir = TempDir::new().expect("tempdir");
    let dir_output = dir.path().join("out");
    std::fs::create_dir(&dir_output).expect("out dir");
    let path_source = create_source(
        dir.path(),
        "발주양식",
        &[],
        &L_HEADER_CONSIGNMENT,
        &[
            create_consignment_row("A", "셔츠", Number(2.0)),
            create_consignment_row("A", "바지", Number(0.0)),
            create_consignment_row("A", "모자", Number(5.0)),
            create_consignment_row("B", "양말", Number(3.0)),
        ],
    );

    let mut l_events: Vec<(u8, String)> = Vec::new();
    let mut observer = |n: u8, msg: &str| l_events.push((n, msg.to_string()));
    let report = split_orders(
        &path_source,
        &dir_output,
        &create_options(EnumOrderVariant::Consignment),
        &mut observer,
    )
    .expect("split");

    assert_eq!(report.cnt_rows_loaded, 4);
    assert_eq!(report.cnt_rows_kept, 3);
    assert_eq!(report.vendor_count(), 2);

    let path_a = dir_output.join("(홀라인)A_발주서_261018.xlsx");
    let path_b = dir_output.join("(홀라인)B_발주서_261018.xlsx");
    assert_eq!(report.files_written(), vec![path_a.clone(), path_b.clone()]);

    let range_a = read_output(&path_a);
    for (n_col, label) in L_HEADER_CONSIGNMENT.iter().enumerate() {
        assert_eq!(cell_text(&range_a, 0, n_col as u32), *label);
    }
    assert_eq!(cell_text(&range_a, 1, 3), "셔츠");
    assert_eq!(cell_text(&range_a, 1, 6), "2");
    assert_eq!(cell_text(&range_a, 2, 3), "모자");
    assert_eq!(cell_text(&range_a, 2, 6), "5");
    assert_eq!(cell_text(&range_a, 3, 6), "7");
    assert_eq!(cell_text(&range_a, 3, 0), "");
    assert_eq!(range_a.end(), Some((3, 6)));

    let range_b = read_output(&path_b);
    assert_eq!(cell_text(&range_b, 1, 0), "B");
    assert_eq!(cell_text(&range_b, 2, 6), "3");

    assert_eq!(l_events[0], (10, "파일 읽는 중...".to_string()));
    assert_eq!(l_events[1], (20, "데이터 처리 중...".to_string()));
    assert_eq!(l_events[2], (50, "처리 중... (1/2 거래처)".to_string()));
    assert_eq!(l_events[3], (80, "처리 중... (2/2 거래처)".to_string()));
    assert!(l_events.windows(2).all(|w| w[0].0 <= w[1].0));
    assert_eq!(l_events.last(), Some(&(100, "마무리 중...".to_string())));
}

#[test]
fn wholesale_split_writes_amount_formulas_and_totals() {
    let dir = TempDir::new().expect("tempdir");
    let path_source = create_source(
        dir.path(),
        "발주양식",
        &["2026 가을 사입 발주"],
        &L_HEADER_WHOLESALE,
        &[
            create_wholesale_row("A", "코트", Number(4.0), Number(1500.0)),
            create_wholesale_row("A", "니트", Blank, Number(900.0)),
            create_wholesale_row("B", "머플러", Number(2.0), Blank),
            create_wholesale_row("A", "스카프", Number(2.0), Number(500.0)),
        ],
    );

    let report = split_orders(
        &path_source,
        dir.path(),
        &create_options(EnumOrderVariant::Wholesale),
        &mut ProgressSilent,
    )
    .expect("split");

    assert_eq!(report.cnt_rows_loaded, 4);
    assert_eq!(report.cnt_rows_kept, 3);
    assert_eq!(report.vendors[0].amount_total, Some(7000.0));
    assert_eq!(report.vendors[1].amount_total, Some(0.0));

    let path_a = dir.path().join("(홀라인)A_발주서_261018.xlsx");
    let range_a = read_output(&path_a);
    assert_eq!(cell_text(&range_a, 0, 7), "공급가");
    assert_eq!(cell_text(&range_a, 0, 8), "공급가합");
    assert_eq!(cell_text(&range_a, 1, 3), "코트");
    assert_eq!(cell_text(&range_a, 1, 6), "4");
    assert_eq!(cell_text(&range_a, 1, 7), "1500");
    assert_eq!(cell_text(&range_a, 1, 8), "6000");
    assert_eq!(cell_text(&range_a, 2, 3), "스카프");
    assert_eq!(cell_text(&range_a, 2, 8), "1000");
    assert_eq!(cell_text(&range_a, 3, 6), "6");
    assert_eq!(cell_text(&range_a, 3, 8), "7000");

    let formulas_a = read_formulas(&path_a);
    assert_eq!(formula_text(&formulas_a, 1, 8), "G2*H2");
    assert_eq!(formula_text(&formulas_a, 2, 8), "G3*H3");
    assert_eq!(formula_text(&formulas_a, 3, 8), "SUM(I2:I3)");

    let path_b = dir.path().join("(홀라인)B_발주서_261018.xlsx");
    let range_b = read_output(&path_b);
    assert_eq!(cell_text(&range_b, 1, 7), "0");
    assert_eq!(cell_text(&range_b, 1, 8), "0");
    assert_eq!(formula_text(&read_formulas(&path_b), 2, 8), "SUM(I2:I2)");
}

#[test]
fn wholesale_garbage_price_on_dropped_row_is_ignored() {
    let dir = TempDir::new().expect("tempdir");
    let path_source = create_source(
        dir.path(),
        "발주양식",
        &["사입 발주"],
        &L_HEADER_WHOLESALE,
        &[
            create_wholesale_row("A", "코트", Number(2.0), Number(100.0)),
            create_wholesale_row("A", "니트", Blank, Text("문의")),
        ],
    );

    let report = split_orders(
        &path_source,
        dir.path(),
        &create_options(EnumOrderVariant::Wholesale),
        &mut ProgressSilent,
    )
    .expect("split");

    assert_eq!(report.vendor_count(), 1);
    assert_eq!(report.vendors[0].n_rows, 1);
    assert_eq!(report.vendors[0].amount_total, Some(200.0));
}

#[test]
fn na_quantity_rows_are_dropped() {
    let dir = TempDir::new().expect("tempdir");
    let path_source = create_source(
        dir.path(),
        "발주양식",
        &[],
        &L_HEADER_CONSIGNMENT,
        &[
            create_consignment_row("A", "셔츠", Number(2.0)),
            create_consignment_row("A", "바지", Text("#N/A")),
        ],
    );

    let report = split_orders(
        &path_source,
        dir.path(),
        &create_options(EnumOrderVariant::Consignment),
        &mut ProgressSilent,
    )
    .expect("split");

    assert_eq!(report.cnt_rows_kept, 1);
    assert_eq!(report.vendor_count(), 1);

    let range_a = read_output(&dir.path().join("(홀라인)A_발주서_261018.xlsx"));
    assert_eq!(cell_text(&range_a, 1, 3), "셔츠");
    assert_eq!(cell_text(&range_a, 2, 6), "2");
    assert_eq!(range_a.end(), Some((2, 6)));
}

#[test]
fn vendors_are_written_in_first_appearance_order() {
    let dir = TempDir::new().expect("tempdir");
    let path_source = create_source(
        dir.path(),
        "발주양식",
        &[],
        &L_HEADER_CONSIGNMENT,
        &[
            create_consignment_row("나", "a", Number(1.0)),
            create_consignment_row("가", "b", Number(1.0)),
            create_consignment_row("다", "c", Number(0.0)),
            create_consignment_row("나", "d", Number(2.0)),
            create_consignment_row("라", "e", Number(1.0)),
        ],
    );

    let report = split_orders(
        &path_source,
        dir.path(),
        &create_options(EnumOrderVariant::Consignment),
        &mut ProgressSilent,
    )
    .expect("split");

    let l_vendors: Vec<&str> = report.vendors.iter().map(|v| v.vendor.as_str()).collect();
    assert_eq!(l_vendors, vec!["나", "가", "라"]);
    assert_eq!(report.vendors[0].qty_total, 3.0);
    assert!(!dir.path().join("(홀라인)다_발주서_261018.xlsx").exists());
}

#[test]
fn missing_required_column_fails_without_writing_files() {
    let dir = TempDir::new().expect("tempdir");
    let dir_output = dir.path().join("out");
    std::fs::create_dir(&dir_output).expect("out dir");
    let l_header = ["거래처명", "자사코드", "상품명", "칼라명", "사이즈", "발주수량"];
    let path_source = create_source(
        dir.path(),
        "발주양식",
        &[],
        &l_header,
        &[vec![
            Text("A"),
            Text("IC"),
            Text("셔츠"),
            Text("블랙"),
            Text("M"),
            Number(1.0),
        ]],
    );

    let err = split_orders(
        &path_source,
        &dir_output,
        &create_options(EnumOrderVariant::Consignment),
        &mut ProgressSilent,
    )
    .expect_err("missing column");

    match &err {
        OrderSplitError::MissingColumns { columns } => {
            assert_eq!(columns, &vec!["상품코드".to_string()])
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_string(), "필요한 열을 찾을 수 없습니다: 상품코드");
    assert_eq!(std::fs::read_dir(&dir_output).expect("read").count(), 0);
}

#[test]
fn missing_order_sheet_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    let path_source = create_source(
        dir.path(),
        "Sheet1",
        &[],
        &L_HEADER_CONSIGNMENT,
        &[create_consignment_row("A", "셔츠", Number(1.0))],
    );

    let err = split_orders(
        &path_source,
        dir.path(),
        &create_options(EnumOrderVariant::Consignment),
        &mut ProgressSilent,
    )
    .expect_err("missing sheet");

    assert_eq!(err.kind(), EnumSplitErrorKind::SheetNotFound);
    assert_eq!(
        err.to_string(),
        "'발주양식' 시트를 찾을 수 없습니다. 엑셀 파일의 시트 이름을 확인해주세요."
    );
}

#[test]
fn non_numeric_quantity_is_rejected_with_row_number() {
    let dir = TempDir::new().expect("tempdir");
    let path_source = create_source(
        dir.path(),
        "발주양식",
        &[],
        &L_HEADER_CONSIGNMENT,
        &[
            create_consignment_row("A", "셔츠", Number(1.0)),
            create_consignment_row("A", "바지", Text("두개")),
        ],
    );

    let err = split_orders(
        &path_source,
        dir.path(),
        &create_options(EnumOrderVariant::Consignment),
        &mut ProgressSilent,
    )
    .expect_err("invalid number");

    match err {
        OrderSplitError::InvalidNumber { column, row, value } => {
            assert_eq!(column, "발주수량");
            assert_eq!(row, 3);
            assert_eq!(value, "두개");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn source_without_order_rows_writes_nothing() {
    let dir = TempDir::new().expect("tempdir");
    let dir_output = dir.path().join("out");
    std::fs::create_dir(&dir_output).expect("out dir");
    let path_source = create_source(
        dir.path(),
        "발주양식",
        &[],
        &L_HEADER_CONSIGNMENT,
        &[create_consignment_row("A", "셔츠", Number(0.0))],
    );

    let mut l_percents: Vec<u8> = Vec::new();
    let mut observer = |n: u8, _msg: &str| l_percents.push(n);
    let report = split_orders(
        &path_source,
        &dir_output,
        &create_options(EnumOrderVariant::Consignment),
        &mut observer,
    )
    .expect("split");

    assert_eq!(report.vendor_count(), 0);
    assert_eq!(std::fs::read_dir(&dir_output).expect("read").count(), 0);
    assert_eq!(l_percents.last(), Some(&100));
}

#[test]
fn spawned_job_streams_progress_then_finishes() {
    let dir = TempDir::new().expect("tempdir");
    let path_source = create_source(
        dir.path(),
        "발주양식",
        &[],
        &L_HEADER_CONSIGNMENT,
        &[
            create_consignment_row("A", "셔츠", Number(1.0)),
            create_consignment_row("B", "바지", Number(2.0)),
        ],
    );

    let rx = spawn_split_orders(
        path_source,
        dir.path().to_path_buf(),
        create_options(EnumOrderVariant::Consignment),
    );
    let l_events: Vec<EnumSplitEvent> = rx.iter().collect();

    let (l_progress, l_terminal) = l_events.split_at(l_events.len() - 1);
    assert!(
        l_progress
            .iter()
            .all(|event| matches!(event, EnumSplitEvent::Progress { .. }))
    );
    match &l_terminal[0] {
        EnumSplitEvent::Finished(report) => assert_eq!(report.vendor_count(), 2),
        other => panic!("unexpected terminal event: {other:?}"),
    }
}
