use serde::Deserialize;

use std::{
    fmt::{self, Display},
    fs,
    path::{Path, PathBuf},
};

use crate::error::ConfigError;

/// Report configuration, usually loaded from `config.yml`.
///
/// ```yaml
/// sheets:
///   raw: raw
///   dict: dict
/// columns:
///   date: date
///   code: code
///   qty: qty
///   price: price
///   price_override: price_override
///   category: category
/// output:
///   sheet_name: report
///   revenue_column: revenue
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub sheets: Sheets,
    pub columns: ColumnMapping,
    pub output: Output,
}

/// Names of the two input sheets.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Sheets {
    pub raw: String,
    pub dict: String,
}

/// Physical column names for each logical [`Role`].
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ColumnMapping {
    pub date: String,
    pub code: String,
    pub qty: String,
    pub price: String,
    pub price_override: String,
    pub category: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Output {
    pub sheet_name: String,
    pub revenue_column: String,
}

/// A logical field, independent of its column name in any particular sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Date,
    Code,
    Qty,
    Price,
    PriceOverride,
    Category,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Date,
        Role::Code,
        Role::Qty,
        Role::Price,
        Role::PriceOverride,
        Role::Category,
    ];
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Date => "date",
            Role::Code => "code",
            Role::Qty => "qty",
            Role::Price => "price",
            Role::PriceOverride => "price_override",
            Role::Category => "category",
        })
    }
}

impl ColumnMapping {
    /// Returns the physical column name mapped to `role`.
    #[must_use]
    pub fn column(&self, role: Role) -> &str {
        match role {
            Role::Date => &self.date,
            Role::Code => &self.code,
            Role::Qty => &self.qty,
            Role::Price => &self.price,
            Role::PriceOverride => &self.price_override,
            Role::Category => &self.category,
        }
    }
}

impl Default for Config {
    /// The identity mapping: every column is named after its role.
    fn default() -> Self {
        Self {
            sheets: Sheets {
                raw: "raw".into(),
                dict: "dict".into(),
            },
            columns: ColumnMapping {
                date: "date".into(),
                code: "code".into(),
                qty: "qty".into(),
                price: "price".into(),
                price_override: "price_override".into(),
                category: "category".into(),
            },
            output: Output {
                sheet_name: "report".into(),
                revenue_column: "revenue".into(),
            },
        }
    }
}

impl Config {
    /// Reads and validates the YAML configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns errors if:
    /// * The file cannot be read
    /// * The file is not valid YAML, or has missing or unknown keys
    /// * Any name is empty, or the revenue column clashes with a grouping column
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: PathBuf::from(path),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Parses and validates a YAML configuration document.
    ///
    /// # Errors
    ///
    /// As for [`Self::from_file`], apart from file access.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the transform relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = [
            ("sheets.raw", &self.sheets.raw),
            ("sheets.dict", &self.sheets.dict),
            ("output.sheet_name", &self.output.sheet_name),
            ("output.revenue_column", &self.output.revenue_column),
        ];
        for (key, value) in names {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{key} must not be empty")));
            }
        }
        for role in Role::ALL {
            if self.columns.column(role).trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "columns.{role} must not be empty"
                )));
            }
        }
        let revenue = &self.output.revenue_column;
        if revenue == &self.columns.category || revenue == &self.columns.date {
            return Err(ConfigError::Invalid(format!(
                "output.revenue_column {revenue:?} clashes with a grouping column"
            )));
        }
        Ok(())
    }
}
