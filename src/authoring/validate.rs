use serde_json::json;
use thiserror::Error;

use crate::authoring::reducer::ExamDraft;
use crate::schemas::answer::QuestionType;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("exam name is required")]
    NameRequired,
    #[error("exam code is required")]
    CodeRequired,
    #[error("total time must be greater than zero")]
    InvalidTotalTime,
    #[error("an exam file is required")]
    FileRequired,
    #[error("question {position} has no correct answer")]
    QuestionUnanswered { position: usize },
}

/// Check a draft is complete enough to publish. Fields are checked in the
/// order they appear on the authoring screen and the first failure wins.
pub fn validate_for_publish(draft: &ExamDraft) -> Result<(), PublishError> {
    if draft.name.trim().is_empty() {
        return Err(PublishError::NameRequired);
    }
    if draft.code.trim().is_empty() {
        return Err(PublishError::CodeRequired);
    }
    if draft.total_time == 0 {
        return Err(PublishError::InvalidTotalTime);
    }
    if draft.file.is_none() {
        return Err(PublishError::FileRequired);
    }
    for (position, question) in draft.questions.iter().enumerate() {
        // long-response questions are marked by hand, no correct answer to require
        if question.question_type != QuestionType::LongResponse && question.correct.is_empty() {
            return Err(PublishError::QuestionUnanswered { position: position + 1 });
        }
    }
    Ok(())
}

/// Build the creation payload for a validated draft. Total time goes back to
/// seconds and each correct answer is rendered into its wire string.
pub fn publish_payload(draft: &ExamDraft) -> Result<serde_json::Value, PublishError> {
    validate_for_publish(draft)?;
    let questions: Vec<serde_json::Value> = draft
        .questions
        .iter()
        .map(|question| {
            json!({
                "index": question.index,
                "type": question.question_type,
                "correct_answer": question.correct.render(),
            })
        })
        .collect();
    Ok(json!({
        "name": draft.name,
        "code": draft.code,
        "exam_group": draft.exam_group,
        "number_of_question": draft.number_of_question,
        "total_time": draft.total_time * 60,
        "file": draft.file,
        "questions": questions,
    }))
}
