//! Error types.
//!
//! - [`TransformError`]: the input tables don't fit the report
//! - [`ConfigError`]: the YAML configuration can't be used
//! - [`WorkbookError`]: reading or writing a spreadsheet failed
//! - [`ReportError`]: either of the last two, from [`crate::create_report`]

use thiserror::Error;

use std::{
    fmt::{self, Display},
    path::PathBuf,
};

use crate::config::Role;

/// Which input table an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableRole {
    Raw,
    Dict,
}

impl Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TableRole::Raw => "raw",
            TableRole::Dict => "dict",
        })
    }
}

/// A required column that isn't in its table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingColumn {
    pub role: Role,
    pub column: String,
}

impl Display for MissingColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.role, self.column)
    }
}

/// Errors from [`crate::build_report`].
#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error(
        "table '{table}' is missing columns: {}. Present: {present:?}",
        list(.missing)
    )]
    Schema {
        table: TableRole,
        missing: Vec<MissingColumn>,
        present: Vec<String>,
    },

    #[error(
        "table 'dict' has duplicate values in join column {column:?}: {}",
        .duplicates.join(", ")
    )]
    Cardinality {
        column: String,
        duplicates: Vec<String>,
    },
}

fn list(missing: &[MissingColumn]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors at the spreadsheet file boundary.
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("{path:?}: unsupported file extension, expected '.xlsx'")]
    Extension { path: PathBuf },

    #[error("{path:?}: file not found")]
    NotFound { path: PathBuf },

    #[error("{path:?}: cannot open workbook: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("{path:?}: no sheet named {sheet:?}. Available: {available:?}")]
    MissingSheet {
        path: PathBuf,
        sheet: String,
        available: Vec<String>,
    },

    #[error("{path:?}: cannot read sheet {sheet:?}: {source}")]
    Sheet {
        path: PathBuf,
        sheet: String,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("{path:?}: cannot write workbook: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
}

/// Errors from [`crate::create_report`]: I/O problems are kept apart from
/// problems with the data itself.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Workbook(#[from] WorkbookError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_message_names_table_roles_and_present_columns() {
        let err = TransformError::Schema {
            table: TableRole::Raw,
            missing: vec![MissingColumn {
                role: Role::Qty,
                column: "Quantity".into(),
            }],
            present: vec!["date".into(), "code".into()],
        };
        assert_eq!(
            err.to_string(),
            r#"table 'raw' is missing columns: qty ("Quantity"). Present: ["date", "code"]"#
        );
    }

    #[test]
    fn cardinality_error_message_lists_duplicates() {
        let err = TransformError::Cardinality {
            column: "code".into(),
            duplicates: vec!["A".into(), "B".into()],
        };
        assert_eq!(
            err.to_string(),
            r#"table 'dict' has duplicate values in join column "code": A, B"#
        );
    }
}
