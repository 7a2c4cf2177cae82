//! Workbook parsing and transformation on real .xlsx bytes

mod common;

use exam_bank::import::template::write_template;
use exam_bank::import::{ImportError, parse_workbook, read_workbook_file, transform_batch};
use rust_xlsxwriter::Workbook;

use common::*;

#[test]
fn passage_sheet_without_rows_is_a_row_count_error() {
    let bytes = workbook(Some(&[]), Some(&[mc_row("Q", ["a", "b", "c", "d"], "A")]));
    assert_eq!(parse_workbook("empty.xlsx", &bytes), Err(ImportError::RowCount(0)));
}

#[test]
fn row_count_message_names_the_count() {
    let err = ImportError::RowCount(3);
    assert_eq!(err.to_string(), "Passage sheet must contain exactly 1 row (found 3)");
}

#[test]
fn missing_questions_sheet_is_a_format_error() {
    let bytes = workbook(Some(&[reading_passage()]), None);
    let err = parse_workbook("passage-only.xlsx", &bytes).unwrap_err();
    assert_eq!(err.to_string(), "File must contain passage and questions sheets");
}

#[test]
fn uppercase_extension_is_accepted() {
    assert!(parse_workbook("LIGHTHOUSE.XLSX", &valid_workbook()).is_ok());
}

#[test]
fn blank_rows_between_questions_are_skipped() {
    let blank = vec![String::new(); 13];
    let bytes = workbook(
        Some(&[reading_passage()]),
        Some(&[
            mc_row("First", ["a", "b", "c", "d"], "A"),
            blank,
            fill_blank_row("Second ___", "two"),
        ]),
    );

    let raw = parse_workbook("gaps.xlsx", &bytes).unwrap();
    assert_eq!(raw.questions.len(), 2);
    assert_eq!(raw.questions[1].position, 1);
    assert_eq!(raw.questions[1].answer_key.as_deref(), Some("two"));
}

#[test]
fn passage_row_of_spaces_is_not_counted() {
    let spaces = passage_row(" ", "", "", "", "");
    let bytes = workbook(
        Some(&[reading_passage(), spaces]),
        Some(&[mc_row("Q", ["a", "b", "c", "d"], "A")]),
    );

    let raw = parse_workbook("trailing-space.xlsx", &bytes).unwrap();
    assert_eq!(raw.passage.title.as_deref(), Some("The Lighthouse"));
}

#[test]
fn numeric_cells_read_as_whole_numbers() {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet().set_name("passage").unwrap();
        sheet.write_string(0, 0, "grade_level").unwrap();
        sheet.write_string(0, 1, "content").unwrap();
        sheet.write_string(0, 2, "unused_column").unwrap();
        sheet.write_number(1, 0, 10.0).unwrap();
        sheet.write_string(1, 1, "Numbers everywhere").unwrap();
        sheet.write_string(1, 2, "ignored").unwrap();
    }
    {
        let sheet = workbook.add_worksheet().set_name("questions").unwrap();
        for (col, header) in ["type", "category_id", "difficulty", "question_text", "answer_key"]
            .iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        sheet.write_string(1, 0, "fill_blank").unwrap();
        sheet.write_number(1, 1, 7.0).unwrap();
        sheet.write_number(1, 2, 4.0).unwrap();
        sheet.write_string(1, 3, "Seven ___").unwrap();
        sheet.write_number(1, 4, 42.0).unwrap();
    }
    let bytes = workbook.save_to_buffer().unwrap();

    let raw = parse_workbook("numbers.xlsx", &bytes).unwrap();
    assert_eq!(raw.passage.grade_level.as_deref(), Some("10"));
    assert_eq!(raw.questions[0].answer_key.as_deref(), Some("42"));

    let batch = transform_batch(&raw).unwrap();
    assert_eq!(batch.passage.grade_level, 10);
    assert_eq!(batch.questions[0].category_id, 7);
    assert_eq!(batch.questions[0].difficulty, 4);
}

#[test]
fn explicit_question_order_sorts_questions() {
    let mut second = mc_row("Second", ["a", "b", "c", "d"], "B");
    second[0] = "2".to_string();
    let mut first = fill_blank_row("First ___", "one");
    first[0] = "1".to_string();

    let bytes = workbook(Some(&[reading_passage()]), Some(&[second, first]));
    let batch = transform_batch(&parse_workbook("ordered.xlsx", &bytes).unwrap()).unwrap();

    let texts: Vec<&str> = batch.questions.iter().map(|q| q.question_text.as_str()).collect();
    assert_eq!(texts, vec!["First ___", "Second"]);
}

#[test]
fn sheet_order_is_kept_without_question_order() {
    let bytes = valid_workbook();
    let batch = transform_batch(&parse_workbook("plain.xlsx", &bytes).unwrap()).unwrap();

    let texts: Vec<&str> = batch.questions.iter().map(|q| q.question_text.as_str()).collect();
    assert_eq!(texts, vec!["Who climbed the stairs?", "When?", "Where?"]);
}

#[test]
fn template_written_to_disk_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("template.xlsx");

    write_template(&path).unwrap();
    let raw = read_workbook_file(&path).unwrap();

    assert!(transform_batch(&raw).is_ok());
}

#[test]
fn reading_a_missing_file_is_a_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_workbook_file(dir.path().join("absent.xlsx")).unwrap_err();
    assert!(matches!(err, ImportError::Format(_)));
}
