//! Workbook fixtures shared by the integration tests

#![allow(dead_code)]

use exam_bank::import::rows::columns;
use rust_xlsxwriter::{Workbook, Worksheet};

fn fill(worksheet: &mut Worksheet, headers: &[&str], rows: &[Vec<String>]) {
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header).unwrap();
    }
    for (row_idx, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(row_idx as u32 + 1, col as u16, value).unwrap();
            }
        }
    }
}

/// In-memory .xlsx with the given sheets; `None` leaves a sheet out
pub fn workbook(passage: Option<&[Vec<String>]>, questions: Option<&[Vec<String>]>) -> Vec<u8> {
    let mut workbook = Workbook::new();

    if let Some(rows) = passage {
        let sheet = workbook.add_worksheet();
        sheet.set_name("passage").unwrap();
        fill(sheet, &columns::PASSAGE, rows);
    }
    if let Some(rows) = questions {
        let sheet = workbook.add_worksheet();
        sheet.set_name("questions").unwrap();
        fill(sheet, &columns::QUESTIONS, rows);
    }
    if passage.is_none() && questions.is_none() {
        workbook.add_worksheet().set_name("Sheet1").unwrap();
    }

    workbook.save_to_buffer().unwrap()
}

pub fn passage_row(title: &str, grade: &str, kind: &str, content: &str, audio_url: &str) -> Vec<String> {
    [title, grade, kind, content, audio_url].map(str::to_string).to_vec()
}

pub fn reading_passage() -> Vec<String> {
    passage_row("The Lighthouse", "8", "reading", "The keeper climbed the stairs every night.", "")
}

/// Multiple-choice row in `columns::QUESTIONS` order, without question_order
pub fn mc_row(text: &str, options: [&str; 4], correct: &str) -> Vec<String> {
    let [a, b, c, d] = options;
    ["", "multiple_choice", "1", "2", text, "", "", "", a, b, c, d, correct]
        .map(str::to_string)
        .to_vec()
}

pub fn fill_blank_row(text: &str, answer: &str) -> Vec<String> {
    ["", "fill_blank", "2", "3", text, "", "1", answer, "", "", "", "", ""]
        .map(str::to_string)
        .to_vec()
}

/// One passage and three multiple-choice questions, all fields filled
pub fn valid_workbook() -> Vec<u8> {
    workbook(
        Some(&[reading_passage()]),
        Some(&[
            mc_row("Who climbed the stairs?", ["The cat", "The keeper", "A child", "Nobody"], "B"),
            mc_row("When?", ["Every night", "Once", "Never", "At noon"], "A"),
            mc_row("Where?", ["A tower", "A ship", "A cave", "A lighthouse"], "D"),
        ]),
    )
}
