#![doc = include_str!("../README.md")]

pub mod coerce;
pub mod config;
pub mod error;
pub mod prompt;
pub mod report;
pub mod table;
pub mod workbook;

pub use config::Config;
pub use error::{ConfigError, ReportError, TransformError, WorkbookError};
pub use report::{build_report, join_records, JoinedRecord, Report, ReportRow};
pub use table::{Cell, Table};
pub use workbook::create_report;
