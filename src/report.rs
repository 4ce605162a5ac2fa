use chrono::NaiveDate;

use std::{
    collections::{BTreeMap, HashMap},
    fmt::{self, Display},
    io,
};

use crate::{
    coerce::{parse_date, parse_label, parse_number},
    config::{ColumnMapping, Config, Role},
    error::{MissingColumn, TableRole, TransformError},
    table::{Cell, Table},
};

const RAW_ROLES: [Role; 4] = [Role::Date, Role::Code, Role::Qty, Role::PriceOverride];
const DICT_ROLES: [Role; 3] = [Role::Code, Role::Price, Role::Category];

/// One raw ledger row after coercion and the join against the price list.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinedRecord {
    pub date: Option<NaiveDate>,
    pub code: Cell,
    pub qty: Option<f64>,
    pub price_override: Option<f64>,
    /// Price from the matching dict row; `None` if there was no match or
    /// the price wasn't numeric.
    pub price: Option<f64>,
    pub category: Option<String>,
    /// `price_override` if present, otherwise `price`.
    pub effective_price: Option<f64>,
    /// `effective_price * qty`, or `None` if either is missing.
    pub each_sum: Option<f64>,
}

/// Revenue for one (category, date) pair.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportRow {
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub revenue: f64,
}

/// Revenue by category and date.
///
/// To build a report from the raw and dict sheets, use [`build_report`].
///
/// To get a printable version of the report, use its [`Display`]
/// implementation; to export it, use [`Self::write_csv`] or
/// [`crate::workbook::write_report`].
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    category_column: String,
    date_column: String,
    revenue_column: String,
    rows: Vec<ReportRow>,
}

/// Joins the raw ledger against the dict price list and sums revenue by
/// category and date.
///
/// Rows are ordered by category, then date, with missing values first.
///
/// # Examples
///
/// ```
/// # use chrono::NaiveDate;
/// # use revenue_report::{build_report, Cell, Config, Table};
/// let raw = Table::new(["date", "code", "qty", "price_override"])
///     .with_row([Cell::from("01.01.2025"), "A".into(), 2.into(), Cell::Empty])
///     .with_row([Cell::from("01.01.2025"), "A".into(), 1.into(), 12.5.into()]);
/// let dict = Table::new(["code", "price", "category"])
///     .with_row([Cell::from("A"), 10.into(), "Food".into()]);
///
/// let report = build_report(&raw, &dict, &Config::default()).unwrap();
/// let jan_1 = NaiveDate::from_ymd_opt(2025, 1, 1);
/// assert_eq!(report.revenue(Some("Food"), jan_1), Some(32.5));
/// ```
///
/// # Errors
///
/// Returns errors if:
/// * A mapped column is missing from either table ([`TransformError::Schema`])
/// * The dict table has a code more than once ([`TransformError::Cardinality`])
pub fn build_report(raw: &Table, dict: &Table, config: &Config) -> Result<Report, TransformError> {
    let records = join_records(raw, dict, &config.columns)?;
    Ok(Report::aggregate(&records, config))
}

/// Coerces both tables and left-joins each raw row to at most one dict row
/// by code.
///
/// The raw table's own category column, if any, is ignored in favour of the
/// dict's.
///
/// # Errors
///
/// As for [`build_report`].
pub fn join_records(
    raw: &Table,
    dict: &Table,
    columns: &ColumnMapping,
) -> Result<Vec<JoinedRecord>, TransformError> {
    let [date_idx, code_idx, qty_idx, override_idx] =
        require_columns(raw, RAW_ROLES, columns, TableRole::Raw)?;
    let [dict_code_idx, price_idx, category_idx] =
        require_columns(dict, DICT_ROLES, columns, TableRole::Dict)?;

    let prices = index_unique(dict, dict_code_idx, &columns.code)?;

    let records = raw
        .rows()
        .map(|row| {
            let code = Table::cell(row, code_idx).clone();
            let matched = prices.get(&Key::from(&code)).copied();
            let price = matched.and_then(|r| parse_number(Table::cell(r, price_idx)));
            let category = matched.and_then(|r| parse_label(Table::cell(r, category_idx)));
            let qty = parse_number(Table::cell(row, qty_idx));
            let price_override = parse_number(Table::cell(row, override_idx));
            let effective_price = price_override.or(price);
            JoinedRecord {
                date: parse_date(Table::cell(row, date_idx)),
                code,
                qty,
                price_override,
                price,
                category,
                effective_price,
                each_sum: effective_price.zip(qty).map(|(p, q)| p * q),
            }
        })
        .collect();
    Ok(records)
}

/// Returns the column positions of `roles` in `table`, or an error naming
/// every one that's missing.
fn require_columns<const N: usize>(
    table: &Table,
    roles: [Role; N],
    columns: &ColumnMapping,
    which: TableRole,
) -> Result<[usize; N], TransformError> {
    let mut missing = Vec::new();
    let mut found = [0; N];
    for (slot, role) in found.iter_mut().zip(roles) {
        let name = columns.column(role);
        match table.column_index(name) {
            Some(idx) => *slot = idx,
            None => missing.push(MissingColumn {
                role,
                column: name.to_string(),
            }),
        }
    }
    if missing.is_empty() {
        Ok(found)
    } else {
        Err(TransformError::Schema {
            table: which,
            missing,
            present: table.columns().to_vec(),
        })
    }
}

/// Maps each code in `dict` to its row, failing if any code repeats.
fn index_unique<'a>(
    dict: &'a Table,
    code_idx: usize,
    code_column: &str,
) -> Result<HashMap<Key<'a>, &'a [Cell]>, TransformError> {
    let mut index = HashMap::with_capacity(dict.len());
    let mut duplicates: Vec<String> = Vec::new();
    for row in dict.rows() {
        let code = Table::cell(row, code_idx);
        if index.insert(Key::from(code), row).is_some() {
            let code = code.to_string();
            if !duplicates.contains(&code) {
                duplicates.push(code);
            }
        }
    }
    if duplicates.is_empty() {
        Ok(index)
    } else {
        Err(TransformError::Cardinality {
            column: code_column.to_string(),
            duplicates,
        })
    }
}

/// Join key: cells compare equal only if they have the same type and value.
/// Blank text counts as empty.
#[derive(Debug, PartialEq, Eq, Hash)]
enum Key<'a> {
    Empty,
    Text(&'a str),
    Number(u64),
    Bool(bool),
    Date(NaiveDate),
}

impl<'a> From<&'a Cell> for Key<'a> {
    fn from(cell: &'a Cell) -> Self {
        match cell {
            _ if cell.is_empty() => Key::Empty,
            Cell::Empty => Key::Empty,
            Cell::Text(s) => Key::Text(s),
            // -0.0 == 0.0, and all NaNs are the same missing code
            Cell::Number(n) if *n == 0.0 => Key::Number(0),
            Cell::Number(n) if n.is_nan() => Key::Number(f64::NAN.to_bits()),
            Cell::Number(n) => Key::Number(n.to_bits()),
            Cell::Bool(b) => Key::Bool(*b),
            Cell::Date(d) => Key::Date(*d),
        }
    }
}

impl Report {
    /// Sums `each_sum` over records grouped by (category, date). Missing
    /// values count as zero, so a group with no known revenue sums to `0.0`.
    #[must_use]
    pub fn aggregate(records: &[JoinedRecord], config: &Config) -> Self {
        let mut groups: BTreeMap<(Option<&str>, Option<NaiveDate>), f64> = BTreeMap::new();
        for record in records {
            *groups
                .entry((record.category.as_deref(), record.date))
                .or_default() += record.each_sum.unwrap_or_default();
        }
        Self {
            category_column: config.columns.category.clone(),
            date_column: config.columns.date.clone(),
            revenue_column: config.output.revenue_column.clone(),
            rows: groups
                .into_iter()
                .map(|((category, date), revenue)| ReportRow {
                    category: category.map(str::to_string),
                    date,
                    revenue,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the output column headers: category, date, revenue.
    #[must_use]
    pub fn columns(&self) -> [&str; 3] {
        [
            self.category_column.as_str(),
            self.date_column.as_str(),
            self.revenue_column.as_str(),
        ]
    }

    /// Returns the revenue for one group, if it appears in the report.
    #[must_use]
    pub fn revenue(&self, category: Option<&str>, date: Option<NaiveDate>) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.category.as_deref() == category && r.date == date)
            .map(|r| r.revenue)
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.revenue).sum()
    }

    /// Writes the report as CSV, with a header row. Missing categories and
    /// dates are written as empty fields.
    ///
    /// # Errors
    ///
    /// Returns any errors from writing to `wtr`.
    pub fn write_csv<W: io::Write>(&self, wtr: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(wtr);
        wtr.write_record(self.columns())?;
        for row in &self.rows {
            wtr.write_record([
                row.category.clone().unwrap_or_default(),
                row.date.map(|d| d.to_string()).unwrap_or_default(),
                row.revenue.to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NONE: &str = "-";
        let width = self
            .rows
            .iter()
            .map(|r| r.category.as_deref().unwrap_or(NONE).len())
            .chain([self.category_column.len(), "Total".len()])
            .max()
            .unwrap_or_default();
        writeln!(
            f,
            "{:width$} {:10} {:>12}",
            self.category_column, self.date_column, self.revenue_column
        )?;
        let length = width + 24;
        writeln!(f, "{:-<length$}", "")?;
        for row in &self.rows {
            let date = row.date.map_or_else(|| NONE.to_string(), |d| d.to_string());
            writeln!(
                f,
                "{:width$} {date:10} {:>12.2}",
                row.category.as_deref().unwrap_or(NONE),
                row.revenue
            )?;
        }
        writeln!(f, "{:-<length$}", "")?;
        writeln!(f, "{:width$} {:10} {:>12.2}", "Total", "", self.total())?;
        Ok(())
    }
}
