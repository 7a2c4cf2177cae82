//! Blank import workbook with the expected sheets, headers and one example

use anyhow::{Context, Result};
use log::info;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

use super::rows::columns;
use super::sheet::{PASSAGE_SHEET, QUESTIONS_SHEET};

const EXAMPLE_PASSAGE: [&str; 5] = [
    "A Day at the Harbour",
    "7",
    "reading",
    "Every morning the fishing boats leave the harbour before sunrise...",
    "",
];

const EXAMPLE_QUESTIONS: [[&str; 13]; 2] = [
    [
        "1",
        "multiple_choice",
        "1",
        "2",
        "When do the boats leave?",
        "See the first sentence.",
        "",
        "",
        "At noon",
        "Before sunrise",
        "At sunset",
        "At midnight",
        "B",
    ],
    [
        "2",
        "fill_blank",
        "2",
        "3",
        "The boats leave the ___ every morning.",
        "",
        "1",
        "harbour",
        "",
        "",
        "",
        "",
        "",
    ],
];

fn write_sheet(worksheet: &mut Worksheet, headers: &[&str], rows: &[&[&str]]) -> Result<()> {
    let bold = Format::new().set_bold();

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
        worksheet.set_column_width(col as u16, 18)?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let row_num = row_idx as u32 + 1;
            match value.parse::<f64>() {
                Ok(number) => worksheet.write_number(row_num, col as u16, number)?,
                Err(_) => worksheet.write_string(row_num, col as u16, *value)?,
            };
        }
    }

    Ok(())
}

fn build_template() -> Result<Workbook> {
    let mut workbook = Workbook::new();

    {
        let passage = workbook.add_worksheet().set_name(PASSAGE_SHEET)?;
        write_sheet(passage, &columns::PASSAGE, &[&EXAMPLE_PASSAGE])?;
    }

    {
        let questions = workbook.add_worksheet().set_name(QUESTIONS_SHEET)?;
        let rows: Vec<&[&str]> = EXAMPLE_QUESTIONS.iter().map(|row| row.as_slice()).collect();
        write_sheet(questions, &columns::QUESTIONS, &rows)?;
    }

    Ok(workbook)
}

/// Template workbook as `.xlsx` bytes
pub fn template_bytes() -> Result<Vec<u8>> {
    let mut workbook = build_template()?;
    workbook
        .save_to_buffer()
        .context("Failed to serialize import template")
}

pub fn write_template<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let mut workbook = build_template()?;
    workbook
        .save(path)
        .with_context(|| format!("Failed to write import template to {:?}", path))?;
    info!("Wrote import template to {:?}", path);
    Ok(())
}
