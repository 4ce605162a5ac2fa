//! Reading input sheets from, and writing reports to, `.xlsx` workbooks.

use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};
use tracing::{debug, info};

use std::{
    ffi::OsStr,
    io::{Read, Seek},
    path::{Path, PathBuf},
};

use crate::{
    config::{Config, Sheets},
    error::{ReportError, WorkbookError},
    report::{join_records, Report},
    table::{Cell, Table},
};

/// Checks that `path` has an `.xlsx` extension (in any case).
///
/// # Errors
///
/// Returns [`WorkbookError::Extension`] otherwise.
pub fn ensure_xlsx(path: &Path) -> Result<(), WorkbookError> {
    let ok = path
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
    if ok {
        Ok(())
    } else {
        Err(WorkbookError::Extension {
            path: path.to_path_buf(),
        })
    }
}

/// Reads the raw and dict sheets named in `sheets` from the workbook at
/// `path`.
///
/// The first row of each sheet is its header. Blank headers are named
/// `Unnamed: N` after their column position.
///
/// # Errors
///
/// Returns errors if:
/// * `path` doesn't end in `.xlsx`, or doesn't exist
/// * The workbook can't be opened
/// * Either sheet is missing or can't be read
pub fn read_tables(
    path: impl AsRef<Path>,
    sheets: &Sheets,
) -> Result<(Table, Table), WorkbookError> {
    let path = path.as_ref();
    ensure_xlsx(path)?;
    if !path.is_file() {
        return Err(WorkbookError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|source| WorkbookError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = read_sheet(&mut workbook, path, &sheets.raw)?;
    let dict = read_sheet(&mut workbook, path, &sheets.dict)?;
    Ok((raw, dict))
}

fn read_sheet<RS: Read + Seek>(
    workbook: &mut Xlsx<RS>,
    path: &Path,
    sheet: &str,
) -> Result<Table, WorkbookError> {
    let available = workbook.sheet_names();
    if !available.iter().any(|name| name == sheet) {
        return Err(WorkbookError::MissingSheet {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
            available,
        });
    }
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|source| WorkbookError::Sheet {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
            source,
        })?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(idx, data)| match to_cell(data) {
            cell if cell.is_empty() => format!("Unnamed: {idx}"),
            cell => cell.to_string(),
        });
    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(row.iter().map(to_cell).collect());
    }
    info!(
        sheet,
        rows = table.len(),
        columns = table.columns().len(),
        "read sheet"
    );
    Ok(table)
}

#[allow(clippy::cast_precision_loss)]
fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or_else(|| Cell::Number(dt.as_f64()), |dt| Cell::Date(dt.date())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Writes `report` to a new workbook at `path`, in a sheet called
/// `sheet_name`.
///
/// The first row holds the report's column headers. Dates are formatted as
/// `yyyy-mm-dd`; missing categories and dates are left blank.
///
/// # Errors
///
/// Returns errors if `path` doesn't end in `.xlsx`, or if the workbook can't
/// be built or saved.
pub fn write_report(
    path: impl AsRef<Path>,
    sheet_name: &str,
    report: &Report,
) -> Result<(), WorkbookError> {
    let path = path.as_ref();
    ensure_xlsx(path)?;
    let write_err = |source| WorkbookError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name).map_err(write_err)?;
    for (col, name) in (0u16..).zip(report.columns()) {
        sheet
            .write_string_with_format(0, col, name, &header)
            .map_err(write_err)?;
    }
    for (row, line) in (1u32..).zip(report.rows()) {
        if let Some(category) = &line.category {
            sheet.write_string(row, 0, category).map_err(write_err)?;
        }
        if let Some(date) = &line.date {
            sheet
                .write_datetime_with_format(row, 1, date, &date_format)
                .map_err(write_err)?;
        }
        sheet
            .write_number(row, 2, line.revenue)
            .map_err(write_err)?;
    }
    sheet.set_column_width(1, 12).map_err(write_err)?;
    workbook.save(path).map_err(write_err)?;
    Ok(())
}

/// Reads the input workbook, builds the report and saves it to `out_path`.
///
/// Both paths must be `.xlsx` files. The output is checked before the input
/// is read, so a bad output path fails fast.
///
/// # Errors
///
/// Returns [`ReportError::Workbook`] for any file problem, and
/// [`ReportError::Transform`] if the sheets don't fit the configuration.
pub fn create_report(
    input: impl AsRef<Path>,
    out_path: impl AsRef<Path>,
    config: &Config,
) -> Result<Report, ReportError> {
    let (input, out_path) = (input.as_ref(), out_path.as_ref());
    ensure_xlsx(out_path)?;
    let (raw, dict) = read_tables(input, &config.sheets)?;

    let records = join_records(&raw, &dict, &config.columns)?;
    let unpriced = records.iter().filter(|r| r.price.is_none()).count();
    debug!(records = records.len(), unpriced, "joined ledger to price list");
    if unpriced > 0 {
        info!(unpriced, "ledger rows without a price list match");
    }

    let report = Report::aggregate(&records, config);
    info!(
        rows = report.len(),
        columns = report.columns().len(),
        "built report"
    );
    write_report(out_path, &config.output.sheet_name, &report)?;
    info!(path = %out_path.display(), sheet = %config.output.sheet_name, "saved report");
    Ok(report)
}

/// Suggests an output path next to `input`: `sales.xlsx` gives
/// `sales_report.xlsx`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "report".into(), |s| s.to_string_lossy());
    input.with_file_name(format!("{stem}_report.xlsx"))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    use crate::error::TransformError;

    fn write_input(path: &Path, dict_rows: &[(&str, f64, &str)]) {
        let mut workbook = Workbook::new();
        let raw = workbook.add_worksheet();
        raw.set_name("raw").unwrap();
        for (col, name) in [
            (0, "date"),
            (1, "code"),
            (2, "qty"),
            (3, "price_override"),
            (5, "noise"),
        ] {
            raw.write_string(0, col, name).unwrap();
        }
        let ledger = [
            ("01.01.2025", "A", 2.0, None),
            ("01.01.2025", "B", 1.0, Some(12.0)),
            ("02.01.2025", "A", 3.0, None),
            ("02.01.2025", "Q", 1.0, None),
        ];
        for (row, (date, code, qty, price_override)) in (1u32..).zip(ledger) {
            raw.write_string(row, 0, date).unwrap();
            raw.write_string(row, 1, code).unwrap();
            raw.write_number(row, 2, qty).unwrap();
            if let Some(p) = price_override {
                raw.write_number(row, 3, p).unwrap();
            }
        }
        let dict = workbook.add_worksheet();
        dict.set_name("dict").unwrap();
        for (col, name) in (0u16..).zip(["code", "price", "category"]) {
            dict.write_string(0, col, name).unwrap();
        }
        for (row, (code, price, category)) in (1u32..).zip(dict_rows) {
            dict.write_string(row, 0, *code).unwrap();
            dict.write_number(row, 1, *price).unwrap();
            dict.write_string(row, 2, *category).unwrap();
        }
        workbook.save(path).unwrap();
    }

    fn read_output(path: &Path) -> Vec<Vec<Cell>> {
        let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
        let range = workbook.worksheet_range("report").unwrap();
        range.rows().map(|r| r.iter().map(to_cell).collect()).collect()
    }

    const PRICES: [(&str, f64, &str); 2] = [("A", 10.0, "Food"), ("B", 11.0, "Drinks")];

    #[test]
    fn ensure_xlsx_fn_accepts_only_xlsx_extension() {
        assert!(ensure_xlsx(Path::new("sales.xlsx")).is_ok());
        assert!(ensure_xlsx(Path::new("SALES.XLSX")).is_ok());
        for bad in ["sales.xls", "sales.csv", "sales", "xlsx"] {
            assert!(
                matches!(ensure_xlsx(Path::new(bad)), Err(WorkbookError::Extension { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn read_tables_fn_reads_both_sheets_with_headers() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        write_input(&input, &PRICES);

        let (raw, dict) = read_tables(&input, &Config::default().sheets).unwrap();
        assert_eq!(
            raw.columns(),
            ["date", "code", "qty", "price_override", "Unnamed: 4", "noise"]
        );
        assert_eq!(raw.len(), 4);
        let first = raw.rows().next().unwrap();
        assert_eq!(Table::cell(first, 0), &Cell::from("01.01.2025"));
        assert_eq!(Table::cell(first, 2), &Cell::Number(2.0));
        assert_eq!(Table::cell(first, 3), &Cell::Empty);
        assert_eq!(dict.columns(), ["code", "price", "category"]);
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn read_tables_fn_returns_error_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err =
            read_tables(dir.path().join("nope.xlsx"), &Config::default().sheets).unwrap_err();
        assert!(matches!(err, WorkbookError::NotFound { .. }), "{err}");
    }

    #[test]
    fn read_tables_fn_returns_error_for_missing_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        write_input(&input, &PRICES);
        let mut sheets = Config::default().sheets;
        sheets.dict = "prices".into();

        match read_tables(&input, &sheets).unwrap_err() {
            WorkbookError::MissingSheet {
                sheet, available, ..
            } => {
                assert_eq!(sheet, "prices");
                assert_eq!(available, ["raw", "dict"]);
            }
            err => panic!("unexpected error {err}"),
        }
    }

    #[test]
    fn create_report_fn_writes_report_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        let output = dir.path().join("input_report.xlsx");
        write_input(&input, &PRICES);

        let report = create_report(&input, &output, &Config::default()).unwrap();
        assert_eq!(report.len(), 4);

        let jan = |d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();
        let rows = read_output(&output);
        assert_eq!(
            rows,
            vec![
                vec![
                    Cell::from("category"),
                    Cell::from("date"),
                    Cell::from("revenue")
                ],
                vec![Cell::Empty, Cell::Date(jan(2)), Cell::Number(0.0)],
                vec![Cell::from("Drinks"), Cell::Date(jan(1)), Cell::Number(12.0)],
                vec![Cell::from("Food"), Cell::Date(jan(1)), Cell::Number(20.0)],
                vec![Cell::from("Food"), Cell::Date(jan(2)), Cell::Number(30.0)],
            ]
        );
    }

    #[test]
    fn create_report_fn_returns_transform_error_for_duplicate_codes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        let output = dir.path().join("out.xlsx");
        write_input(&input, &[("A", 10.0, "Food"), ("A", 11.0, "Food")]);

        let err = create_report(&input, &output, &Config::default()).unwrap_err();
        assert!(
            matches!(err, ReportError::Transform(TransformError::Cardinality { .. })),
            "{err}"
        );
        assert!(!output.exists(), "no output should be written on failure");
    }

    #[test]
    fn create_report_fn_rejects_non_xlsx_output_before_reading() {
        let err = create_report("missing.xlsx", "report.csv", &Config::default()).unwrap_err();
        assert!(
            matches!(err, ReportError::Workbook(WorkbookError::Extension { .. })),
            "{err}"
        );
    }

    #[test]
    fn default_output_path_fn_appends_report_suffix() {
        assert_eq!(
            default_output_path(Path::new("/data/sales.xlsx")),
            PathBuf::from("/data/sales_report.xlsx")
        );
        assert_eq!(
            default_output_path(Path::new("ledger.XLSX")),
            PathBuf::from("ledger_report.xlsx")
        );
    }
}
