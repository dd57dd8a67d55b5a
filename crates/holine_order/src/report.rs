//! Split report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::util::format_number_display;

/// Totals and output path for one vendor workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecVendorSummary {
    /// Vendor name.
    pub vendor: String,
    /// Number of order rows written.
    pub n_rows: usize,
    /// Sum of quantities.
    pub qty_total: f64,
    /// Sum of line amounts (wholesale only).
    pub amount_total: Option<f64>,
    /// Written workbook path.
    pub path_file: PathBuf,
}

/// Aggregate counters for one `split_orders` run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReportSplit {
    /// Table rows read below the header.
    pub cnt_rows_loaded: u64,
    /// Rows kept by the quantity filter.
    pub cnt_rows_kept: u64,
    /// Written vendor workbooks, in write order.
    pub vendors: Vec<SpecVendorSummary>,
}

impl ReportSplit {
    /// Number of vendor workbooks written.
    pub fn vendor_count(&self) -> usize {
        self.vendors.len()
    }

    /// Written file paths, in write order.
    pub fn files_written(&self) -> Vec<PathBuf> {
        self.vendors.iter().map(|v| v.path_file.clone()).collect()
    }

    /// Sum of quantities over all vendors.
    pub fn qty_total(&self) -> f64 {
        self.vendors.iter().map(|v| v.qty_total).sum()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_rows_loaded".to_string(), self.cnt_rows_loaded);
        dict_counts.insert("cnt_rows_kept".to_string(), self.cnt_rows_kept);
        dict_counts.insert("cnt_vendors".to_string(), self.vendor_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} rows={} kept={} vendors={} qty={}",
            self.cnt_rows_loaded,
            self.cnt_rows_kept,
            self.vendor_count(),
            format_number_display(self.qty_total())
        )
    }
}

impl fmt::Display for ReportSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[SPLIT]"))
    }
}

/// Mutable accumulator for split statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportSplitBuilder {
    /// See [`ReportSplit::cnt_rows_loaded`].
    pub cnt_rows_loaded: u64,
    /// See [`ReportSplit::cnt_rows_kept`].
    pub cnt_rows_kept: u64,
    /// See [`ReportSplit::vendors`].
    pub vendors: Vec<SpecVendorSummary>,
}

impl ReportSplitBuilder {
    pub fn set_rows_loaded(&mut self, value: usize) {
        self.cnt_rows_loaded = value as u64;
    }

    pub fn set_rows_kept(&mut self, value: usize) {
        self.cnt_rows_kept = value as u64;
    }

    /// Record one written vendor workbook.
    pub fn add_vendor(&mut self, summary: SpecVendorSummary) {
        self.vendors.push(summary);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportSplit {
        ReportSplit {
            cnt_rows_loaded: self.cnt_rows_loaded,
            cnt_rows_kept: self.cnt_rows_kept,
            vendors: self.vendors,
        }
    }
}
