use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    LongResponse,
}

/// One answer (or correct-answer) value, shaped by its question type.
///
/// The wire format is a plain string: empty for unanswered, a single letter
/// for single-choice, letters sorted and comma-joined for multiple-choice,
/// verbatim text for long-response. The `BTreeSet` keeps the multiple-choice
/// rendering sorted and duplicate-free by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValue {
    SingleChoice(Option<char>),
    MultipleChoice(BTreeSet<char>),
    LongResponse(String),
}

impl AnswerValue {
    pub fn empty(question_type: QuestionType) -> Self {
        match question_type {
            QuestionType::SingleChoice => AnswerValue::SingleChoice(None),
            QuestionType::MultipleChoice => AnswerValue::MultipleChoice(BTreeSet::new()),
            QuestionType::LongResponse => AnswerValue::LongResponse(String::new()),
        }
    }

    pub fn parse(question_type: QuestionType, raw: &str) -> Self {
        match question_type {
            QuestionType::SingleChoice => AnswerValue::SingleChoice(raw.chars().next()),
            QuestionType::MultipleChoice => {
                let letters = raw
                    .split(',')
                    .filter(|token| !token.is_empty())
                    .filter_map(|token| token.chars().next())
                    .collect();
                AnswerValue::MultipleChoice(letters)
            }
            QuestionType::LongResponse => AnswerValue::LongResponse(raw.to_string()),
        }
    }

    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerValue::SingleChoice(_) => QuestionType::SingleChoice,
            AnswerValue::MultipleChoice(_) => QuestionType::MultipleChoice,
            AnswerValue::LongResponse(_) => QuestionType::LongResponse,
        }
    }

    pub fn render(&self) -> String {
        match self {
            AnswerValue::SingleChoice(letter) => {
                letter.map(String::from).unwrap_or_default()
            }
            AnswerValue::MultipleChoice(letters) => {
                let rendered: Vec<String> = letters.iter().map(|letter| letter.to_string()).collect();
                rendered.join(",")
            }
            AnswerValue::LongResponse(text) => text.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::SingleChoice(letter) => letter.is_none(),
            AnswerValue::MultipleChoice(letters) => letters.is_empty(),
            AnswerValue::LongResponse(text) => text.is_empty(),
        }
    }

    /// Replace a single-choice selection. No-op on other shapes.
    pub fn choose(&mut self, letter: char) {
        if let AnswerValue::SingleChoice(current) = self {
            *current = Some(letter);
        }
    }

    /// Add a letter to a multiple-choice selection. No-op on other shapes.
    pub fn check(&mut self, letter: char) {
        if let AnswerValue::MultipleChoice(letters) = self {
            letters.insert(letter);
        }
    }

    /// Remove a letter from a multiple-choice selection. No-op on other shapes.
    pub fn uncheck(&mut self, letter: char) {
        if let AnswerValue::MultipleChoice(letters) = self {
            letters.remove(&letter);
        }
    }

    /// Replace long-response text verbatim. No-op on other shapes.
    pub fn write_text(&mut self, text: &str) {
        if let AnswerValue::LongResponse(current) = self {
            *current = text.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiple_choice_renders_sorted_without_duplicates() {
        let mut value = AnswerValue::empty(QuestionType::MultipleChoice);
        value.check('C');
        value.check('A');
        value.check('C');
        value.check('B');
        assert_eq!(value.render(), "A,B,C");
    }

    #[test]
    fn check_then_uncheck_restores_prior_rendering() {
        let mut value = AnswerValue::parse(QuestionType::MultipleChoice, "A,D");
        let before = value.render();
        value.check('B');
        assert_eq!(value.render(), "A,B,D");
        value.uncheck('B');
        assert_eq!(value.render(), before);
    }

    #[test]
    fn unchecking_last_letter_renders_empty_string() {
        let mut value = AnswerValue::parse(QuestionType::MultipleChoice, "A");
        value.uncheck('A');
        assert_eq!(value.render(), "");
        assert!(value.is_empty());
    }

    #[test]
    fn parsing_blank_multiple_choice_yields_no_spurious_element() {
        let value = AnswerValue::parse(QuestionType::MultipleChoice, "");
        assert!(value.is_empty());
        let mut value = value;
        value.check('B');
        assert_eq!(value.render(), "B");
    }

    #[test]
    fn single_choice_round_trips() {
        let mut value = AnswerValue::parse(QuestionType::SingleChoice, "");
        assert!(value.is_empty());
        value.choose('C');
        assert_eq!(value.render(), "C");
        value.choose('A');
        assert_eq!(value.render(), "A");
    }

    #[test]
    fn long_response_keeps_text_verbatim() {
        let mut value = AnswerValue::empty(QuestionType::LongResponse);
        value.write_text("  acceleration = F / m ");
        assert_eq!(value.render(), "  acceleration = F / m ");
    }

    #[test]
    fn mutators_ignore_mismatched_shapes() {
        let mut value = AnswerValue::SingleChoice(Some('A'));
        value.check('B');
        value.uncheck('A');
        value.write_text("ignored");
        assert_eq!(value, AnswerValue::SingleChoice(Some('A')));
    }
}
