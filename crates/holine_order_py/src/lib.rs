use std::collections::BTreeMap;

use holine_order::{
    EnumOrderVariant, OrderSplitError as RsOrderSplitError, ProgressObserver, ReportSplit,
    SpecSplitOptions, SpecVendorSummary, parse_date_run, split_orders,
};
use pyo3::create_exception;
use pyo3::exceptions::{PyException, PyNotADirectoryError, PyOSError, PyValueError};
use pyo3::prelude::*;

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "holine.order.split_orders.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

create_exception!(_holine_order_rs, OrderSplitError, PyException);
create_exception!(_holine_order_rs, SheetNotFoundError, OrderSplitError);
create_exception!(_holine_order_rs, MissingColumnError, OrderSplitError);
create_exception!(_holine_order_rs, InvalidNumberError, OrderSplitError);
create_exception!(_holine_order_rs, WriteError, OrderSplitError);

#[pyclass(name = "VendorSummary")]
#[derive(Debug, Clone)]
struct PyVendorSummary {
    #[pyo3(get)]
    vendor: String,
    #[pyo3(get)]
    n_rows: usize,
    #[pyo3(get)]
    qty_total: f64,
    #[pyo3(get)]
    amount_total: Option<f64>,
    #[pyo3(get)]
    path_file: String,
}

impl From<SpecVendorSummary> for PyVendorSummary {
    fn from(summary: SpecVendorSummary) -> Self {
        Self {
            vendor: summary.vendor,
            n_rows: summary.n_rows,
            qty_total: summary.qty_total,
            amount_total: summary.amount_total,
            path_file: summary.path_file.to_string_lossy().to_string(),
        }
    }
}

#[pyclass(name = "ReportSplit")]
#[derive(Debug, Clone)]
struct PyReportSplit {
    inner: ReportSplit,
}

#[pymethods]
impl PyReportSplit {
    #[getter]
    fn cnt_rows_loaded(&self) -> u64 {
        self.inner.cnt_rows_loaded
    }

    #[getter]
    fn cnt_rows_kept(&self) -> u64 {
        self.inner.cnt_rows_kept
    }

    #[getter]
    fn vendors(&self) -> Vec<PyVendorSummary> {
        self.inner
            .vendors
            .iter()
            .cloned()
            .map(PyVendorSummary::from)
            .collect()
    }

    #[getter]
    fn vendor_count(&self) -> usize {
        self.inner.vendor_count()
    }

    #[getter]
    fn files_written(&self) -> Vec<String> {
        self.inner
            .files_written()
            .iter()
            .map(|path| path.to_string_lossy().to_string())
            .collect()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.inner.to_dict()
    }

    #[pyo3(signature = (prefix = "[SPLIT]"))]
    fn format(&self, prefix: &str) -> String {
        self.inner.format(prefix)
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }
}

/// Forwards progress to a Python callable, re-acquiring the GIL per event.
///
/// The first exception raised by the callable is kept and later events are dropped.
struct PyProgressCallback<'a> {
    callback: Option<&'a Py<PyAny>>,
    err_first: Option<PyErr>,
}

impl ProgressObserver for PyProgressCallback<'_> {
    fn on_progress(&mut self, n_percent: u8, message: &str) {
        let Some(callback) = self.callback else {
            return;
        };
        if self.err_first.is_some() {
            return;
        }
        if let Err(err) = Python::with_gil(|py| callback.call1(py, (n_percent, message))) {
            self.err_first = Some(err);
        }
    }
}

fn parse_rule_variant(value: &str) -> PyResult<EnumOrderVariant> {
    EnumOrderVariant::from_name(value).ok_or_else(|| {
        PyValueError::new_err(format!(
            "Invalid order variant: `{value}`. Expected one of: ['consignment', 'wholesale']"
        ))
    })
}

fn map_order_split_error(exception: RsOrderSplitError) -> PyErr {
    let message = exception.to_string();
    match exception {
        RsOrderSplitError::SheetNotFound { .. } => SheetNotFoundError::new_err(message),
        RsOrderSplitError::MissingColumns { .. } => MissingColumnError::new_err(message),
        RsOrderSplitError::InvalidNumber { .. } => InvalidNumberError::new_err(message),
        RsOrderSplitError::Write { .. } => WriteError::new_err(message),
        RsOrderSplitError::SourceOpen { .. } => PyOSError::new_err(message),
        RsOrderSplitError::DestinationInvalid { .. } => PyNotADirectoryError::new_err(message),
        RsOrderSplitError::Unexpected(_) => OrderSplitError::new_err(message),
    }
}

#[pyfunction(name = "split_orders")]
#[pyo3(signature = (
    file_source,
    dir_output,
    rule_variant = "consignment",
    on_progress = None,
    date_run = None
))]
fn split_orders_py(
    py: Python<'_>,
    file_source: String,
    dir_output: String,
    rule_variant: &str,
    on_progress: Option<Py<PyAny>>,
    date_run: Option<String>,
) -> PyResult<PyReportSplit> {
    let mut spec_split_options = SpecSplitOptions::for_variant(parse_rule_variant(rule_variant)?);
    if let Some(val) = date_run {
        spec_split_options.date_run = parse_date_run(&val).map_err(PyValueError::new_err)?;
    }

    let mut observer = PyProgressCallback {
        callback: on_progress.as_ref(),
        err_first: None,
    };
    let report_split = py.allow_threads(|| {
        split_orders(file_source, dir_output, &spec_split_options, &mut observer)
    });
    if let Some(err) = observer.err_first {
        return Err(err);
    }
    let report_split = report_split.map_err(map_order_split_error)?;
    Ok(PyReportSplit {
        inner: report_split,
    })
}

#[pymodule]
fn _holine_order_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = module.py();
    module.add("OrderSplitError", py.get_type::<OrderSplitError>())?;
    module.add("SheetNotFoundError", py.get_type::<SheetNotFoundError>())?;
    module.add("MissingColumnError", py.get_type::<MissingColumnError>())?;
    module.add("InvalidNumberError", py.get_type::<InvalidNumberError>())?;
    module.add("WriteError", py.get_type::<WriteError>())?;
    module.add_class::<PyVendorSummary>()?;
    module.add_class::<PyReportSplit>()?;
    module.add_function(wrap_pyfunction!(split_orders_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
