//! Record parsing: payload bytes to typed [`Record`](crate::Record)s.

mod filter;
pub mod legacy;
mod parser;
mod process;
mod timestamps;

pub use filter::EcgFilter;
pub use legacy::{Characteristic, parse_legacy};
pub use parser::{ecg_scale, parse_payload, split_timestamp};
pub use process::Process;
pub use timestamps::{REBASE_THRESHOLD_MS, Timeline, Timelines, batch_timestamps};
