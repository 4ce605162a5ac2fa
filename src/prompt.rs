//! Interactive front end: asks for the input and output workbooks on the
//! terminal instead of taking them as arguments.

use anyhow::{bail, Context, Result};

use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use crate::workbook::default_output_path;

/// Prompts on `out` for the input and output paths, reading answers from
/// `input`.
///
/// An empty answer to the output prompt accepts the suggested path, which is
/// the input's name with a `_report` suffix.
///
/// # Errors
///
/// Returns errors if reading or writing the terminal fails, or if no input
/// path is given.
pub fn prompt_paths(mut input: impl BufRead, mut out: impl Write) -> Result<(PathBuf, PathBuf)> {
    let Some(input_path) = ask(&mut input, &mut out, "Input file (.xlsx): ")? else {
        bail!("an input file is required");
    };
    let input_path = PathBuf::from(input_path);
    let suggested = default_output_path(&input_path);
    let question = format!("Output file [{}]: ", suggested.display());
    let output_path = ask(&mut input, &mut out, &question)?.map_or(suggested, PathBuf::from);
    Ok((input_path, output_path))
}

/// Returns the trimmed answer, or `None` if it was blank or input ended.
fn ask(input: &mut impl BufRead, out: &mut impl Write, question: &str) -> Result<Option<String>> {
    write!(out, "{question}")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("reading answer")?;
    let answer = line.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn prompt_paths_fn_suggests_report_path_next_to_input() {
        let mut shown = Vec::new();
        let (input, output) = prompt_paths(Cursor::new("data/sales.xlsx\n\n"), &mut shown).unwrap();
        assert_eq!(input, PathBuf::from("data/sales.xlsx"));
        assert_eq!(output, PathBuf::from("data/sales_report.xlsx"));
        let shown = String::from_utf8(shown).unwrap();
        assert_eq!(
            shown,
            "Input file (.xlsx): Output file [data/sales_report.xlsx]: "
        );
    }

    #[test]
    fn prompt_paths_fn_uses_given_output_path() {
        let (_, output) =
            prompt_paths(Cursor::new("  sales.xlsx \n out.xlsx\n"), Vec::new()).unwrap();
        assert_eq!(output, PathBuf::from("out.xlsx"));
    }

    #[test]
    fn prompt_paths_fn_returns_error_for_blank_input_path() {
        assert!(prompt_paths(Cursor::new("\n"), Vec::new()).is_err());
        assert!(prompt_paths(Cursor::new(""), Vec::new()).is_err());
    }
}
