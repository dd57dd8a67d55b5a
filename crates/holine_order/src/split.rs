//! Order splitting pipeline and its background-job wrapper.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{error, info};

use crate::batch::{append_line_amounts, filter_order_rows, group_vendor_batches};
use crate::loader::load_order_table;
use crate::progress::{ProgressObserver, ProgressTracker};
use crate::report::{ReportSplit, ReportSplitBuilder, SpecVendorSummary};
use crate::spec::{EnumSplitErrorKind, OrderSplitError, SpecSplitOptions};
use crate::writer::{OrderWorkbookWriter, validate_dir_output};

/// Split one order workbook into per-vendor workbooks under `dir_output`.
///
/// Progress is reported to `observer` as `(percent, message)` events that never decrease. On
/// failure the error is returned and files already written stay on disk.
pub fn split_orders<P, Q>(
    file_source: P,
    dir_output: Q,
    options: &SpecSplitOptions,
    observer: &mut dyn ProgressObserver,
) -> Result<ReportSplit, OrderSplitError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_file_source = file_source.as_ref();
    let dir_output = dir_output.as_ref();
    let variant = &options.variant;
    let mut tracker = ProgressTracker::new(observer);
    let mut report = ReportSplitBuilder::default();

    validate_dir_output(dir_output)?;
    info!(
        source = %path_file_source.display(),
        output = %dir_output.display(),
        variant = variant.rule_variant.as_str(),
        "split orders started"
    );

    tracker.start_load();
    let table = load_order_table(path_file_source, variant)?;
    report.set_rows_loaded(table.df_rows.height());

    tracker.start_prepare();
    let mut df_kept = filter_order_rows(&table, variant)?;
    append_line_amounts(&mut df_kept, variant)?;
    report.set_rows_kept(df_kept.height());
    let l_batches = group_vendor_batches(&df_kept, variant)?;

    let writer = OrderWorkbookWriter::new(
        variant.clone(),
        dir_output.to_path_buf(),
        options.date_run,
    );
    let n_vendors = l_batches.len();
    for (n_idx, batch) in l_batches.iter().enumerate() {
        let path_file = writer.write_vendor_batch(batch)?;
        report.add_vendor(SpecVendorSummary {
            vendor: batch.vendor.clone(),
            n_rows: batch.n_rows(),
            qty_total: batch.qty_total,
            amount_total: batch.amount_total,
            path_file,
        });
        tracker.advance_vendor(n_idx + 1, n_vendors);
    }

    tracker.finalize();
    let report = report.build();
    info!("{report}");
    Ok(report)
}

/// Event emitted by a background split job.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumSplitEvent {
    /// Progress update.
    Progress {
        /// Percent in `0..=100`.
        n_percent: u8,
        /// Status text.
        message: String,
    },
    /// Terminal success.
    Finished(ReportSplit),
    /// Terminal failure.
    Failed {
        /// Error category.
        kind: EnumSplitErrorKind,
        /// Human-readable error message.
        message: String,
    },
}

/// Forwards progress into the job channel; sends after the receiver is dropped are ignored.
struct ProgressChannel {
    tx: Sender<EnumSplitEvent>,
}

impl ProgressObserver for ProgressChannel {
    fn on_progress(&mut self, n_percent: u8, message: &str) {
        let _ = self.tx.send(EnumSplitEvent::Progress {
            n_percent,
            message: message.to_string(),
        });
    }
}

/// Run [`split_orders`] on a worker thread and stream its events.
///
/// The receiver yields progress events followed by exactly one terminal `Finished` or `Failed`
/// event, after which the channel closes.
pub fn spawn_split_orders(
    file_source: PathBuf,
    dir_output: PathBuf,
    options: SpecSplitOptions,
) -> Receiver<EnumSplitEvent> {
    let (tx, rx) = mpsc::channel();
    let tx_spawn_failure = tx.clone();

    let result_spawn = thread::Builder::new()
        .name("holine-order-split".to_string())
        .spawn(move || {
            let mut observer = ProgressChannel { tx: tx.clone() };
            let event = match split_orders(&file_source, &dir_output, &options, &mut observer) {
                Ok(report) => EnumSplitEvent::Finished(report),
                Err(err) => {
                    error!(kind = ?err.kind(), "split orders failed: {err}");
                    EnumSplitEvent::Failed {
                        kind: err.kind(),
                        message: err.to_string(),
                    }
                }
            };
            let _ = tx.send(event);
        });

    if let Err(err) = result_spawn {
        let _ = tx_spawn_failure.send(EnumSplitEvent::Failed {
            kind: EnumSplitErrorKind::Unexpected,
            message: format!("failed to start split job: {err}"),
        });
    }

    rx
}
