//! Profview core library: profiler file ingestion, the filter/sort pipeline,
//! session state and chart rendering shared by the CLI.

mod chart;
mod cmd;
mod config;
mod dataset;
mod error;
mod pipeline;
mod record;
mod recorder;
mod report;
mod selection;
mod session;

pub use chart::*;
pub use cmd::*;
pub use config::*;
pub use dataset::*;
pub use error::*;
pub use pipeline::*;
pub use record::*;
pub use recorder::*;
pub use report::*;
pub use selection::*;
pub use session::*;
