use serde::{Deserialize, Serialize};

use crate::schemas::answer::{AnswerValue, QuestionType};
use crate::schemas::exam::ExamFileRef;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Desktop,
    Tablet,
    Mobile,
    Unknown,
}

/// Stored persistence row for one answer. camelCase field names are the
/// on-disk format recovery must keep reading, so they are pinned here rather
/// than derived from the in-memory shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAnswer {
    question_id: i64,
    question_index: u32,
    question_type: QuestionType,
    answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredAnswer", into = "StoredAnswer")]
pub struct AttemptAnswer {
    pub question_id: i64,
    pub question_index: u32,
    pub value: AnswerValue,
}

impl From<StoredAnswer> for AttemptAnswer {
    fn from(stored: StoredAnswer) -> Self {
        AttemptAnswer {
            question_id: stored.question_id,
            question_index: stored.question_index,
            value: AnswerValue::parse(stored.question_type, &stored.answer),
        }
    }
}

impl From<AttemptAnswer> for StoredAnswer {
    fn from(answer: AttemptAnswer) -> Self {
        StoredAnswer {
            question_id: answer.question_id,
            question_index: answer.question_index,
            question_type: answer.value.question_type(),
            answer: answer.value.render(),
        }
    }
}

/// In-memory state of one exam attempt. `time_left` is whole seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptState {
    pub exam_name: String,
    pub exam_code: String,
    pub exam_file: Option<ExamFileRef>,
    pub answers: Vec<AttemptAnswer>,
    pub time_left: u32,
    pub device: Device,
}
