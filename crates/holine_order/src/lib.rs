//! `holine_order` v1:
//! Purchase-order splitter kernel. Reads the `발주양식` sheet of an order workbook and writes one
//! styled workbook per vendor.
//!
//! Modules:
//! - `conf`     : constants, variant presets and format presets
//! - `spec`     : specs/models/options and the error type
//! - `util`     : pure helper functions
//! - `loader`   : source sheet reader
//! - `batch`    : row filtering, line amounts and vendor grouping
//! - `writer`   : per-vendor workbook writer kernel
//! - `progress` : progress observers
//! - `report`   : split report models
//! - `split`    : end-to-end pipeline and background job
pub mod batch;
pub mod conf;
pub mod loader;
pub mod progress;
pub mod report;
pub mod spec;
pub mod split;
pub mod util;
pub mod writer;

pub use conf::{
    C_MSG_DONE, C_MSG_ERROR_PREFIX, C_SHEET_NAME_OUTPUT, C_SHEET_NAME_SOURCE,
    derive_consignment_variant, derive_variant, derive_wholesale_variant,
};
pub use progress::{ProgressObserver, ProgressSilent};
pub use report::{ReportSplit, SpecVendorSummary};
pub use spec::{
    EnumOrderVariant, EnumSplitErrorKind, OrderSplitError, SpecAutofitCellsPolicy,
    SpecOrderVariant, SpecSplitOptions,
};
pub use split::{EnumSplitEvent, spawn_split_orders, split_orders};
pub use util::parse_date_run;
