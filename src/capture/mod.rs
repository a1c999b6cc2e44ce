//! Recorded BLE traffic
//!
//! A capture stores the chunks a device sent, tagged by stream and spaced by the
//! delay between notifications, together with the revisions a session needs before
//! it can decode them. [`ReplayProvider`](crate::providers::replay::ReplayProvider)
//! plays captures back into a session.

mod format;
mod reader;
mod writer;

pub use format::{CAPTURE_MAGIC, CAPTURE_VERSION, CaptureHeader, CaptureRecord, RECORD_HEADER_LEN};
pub use reader::CaptureReader;
pub use writer::CaptureWriter;
