use anyhow::Result;
use dialoguer::{Input, Password, Select};
use exam_bank::import::{PassageType, RawPassageRow, RawQuestionRow};

/// Interactive confirmation prompt using arrow-key navigable selection
///
/// Returns `Ok(true)` when the user picks "Yes".
pub fn prompt_confirmation(prompt: &str, default_yes: bool) -> Result<bool> {
    let items = vec!["Yes", "No"];
    let default_index = if default_yes { 0 } else { 1 };

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(default_index)
        .interact()?;

    Ok(selection == 0)
}

/// Use `value` when given on the command line, otherwise ask for it
pub fn prompt_value(value: Option<String>, prompt: &str) -> Result<String> {
    if let Some(value) = value {
        Ok(value)
    } else {
        let value = Input::<String>::new().with_prompt(prompt).interact_text()?;
        Ok(value)
    }
}

/// Free text that may be left empty
pub fn prompt_optional(prompt: &str) -> Result<Option<String>> {
    let value = Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;

    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

pub fn prompt_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        Ok(password)
    } else {
        let password = Password::new().with_prompt("Password").interact()?;
        Ok(password)
    }
}

/// Ask twice and insist both entries match
pub fn prompt_new_password() -> Result<String> {
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;
    Ok(password)
}

/// Passage cells for manual entry, left as text for the transformer
pub fn prompt_passage() -> Result<RawPassageRow> {
    let title = prompt_optional("Title (optional)")?;
    let grade_level = Input::<String>::new()
        .with_prompt("Grade level (6-12)")
        .interact_text()?;

    let types = [PassageType::Reading, PassageType::Listening];
    let type_index = Select::new()
        .with_prompt("Passage type")
        .items(&types.map(|t| t.as_str()))
        .default(0)
        .interact()?;
    let passage_type = types[type_index];

    let content = Input::<String>::new().with_prompt("Content").interact_text()?;
    let audio_url = match passage_type {
        PassageType::Listening => Some(Input::<String>::new().with_prompt("Audio URL").interact_text()?),
        PassageType::Reading => None,
    };

    Ok(RawPassageRow {
        title,
        grade_level: Some(grade_level),
        passage_type: Some(passage_type.as_str().to_string()),
        content: Some(content),
        audio_url,
    })
}

/// One question row; `position` is its 0-based place in the batch
pub fn prompt_question(position: usize) -> Result<RawQuestionRow> {
    println!();
    println!("Question {}", position + 1);

    let kinds = ["multiple_choice", "fill_blank"];
    let kind_index = Select::new()
        .with_prompt("Type")
        .items(&kinds)
        .default(0)
        .interact()?;
    let kind = kinds[kind_index];

    let mut row = RawQuestionRow {
        position,
        kind: Some(kind.to_string()),
        category_id: Some(Input::<String>::new().with_prompt("Category id").interact_text()?),
        difficulty: Some(Input::<String>::new().with_prompt("Difficulty (1-5)").interact_text()?),
        question_text: Some(Input::<String>::new().with_prompt("Question text").interact_text()?),
        explanation: prompt_optional("Explanation (optional)")?,
        ..RawQuestionRow::default()
    };

    if kind == "multiple_choice" {
        row.option_a = Some(Input::<String>::new().with_prompt("Option A").interact_text()?);
        row.option_b = Some(Input::<String>::new().with_prompt("Option B").interact_text()?);
        row.option_c = Some(Input::<String>::new().with_prompt("Option C").interact_text()?);
        row.option_d = Some(Input::<String>::new().with_prompt("Option D").interact_text()?);

        let labels = ["A", "B", "C", "D"];
        let correct = Select::new()
            .with_prompt("Correct option")
            .items(&labels)
            .default(0)
            .interact()?;
        row.correct_option = Some(labels[correct].to_string());
    } else {
        row.blank_index = prompt_optional("Blank index (optional)")?;
        row.answer_key = Some(Input::<String>::new().with_prompt("Answer key").interact_text()?);
    }

    Ok(row)
}
