use serde::{Deserialize, Serialize};

use crate::schemas::answer::QuestionType;
use crate::schemas::attempt::Device;

/// One graded (or to-be-graded) answer row inside an exam result.
///
/// `answer` is null when the student never touched the question. `is_correct`
/// is null until a long-response answer has been marked, otherwise a vector of
/// per-criterion booleans (choice questions carry a single element).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub id: Option<i64>,
    pub question: i64,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub is_correct: Option<Vec<bool>>,
    #[serde(default, rename = "type")]
    pub question_type: Option<QuestionType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Completed,
    Remarked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamResult {
    pub id: i64,
    pub exam: i64,
    pub user: i64,
    pub status: ResultStatus,
    #[serde(default)]
    pub number_of_question: u32,
    #[serde(default)]
    pub number_of_correct_answer: u32,
    #[serde(default)]
    pub device: Option<Device>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub answers: Vec<AnswerResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitQuestion {
    pub question: i64,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitResultPayload {
    pub exam: i64,
    pub user: i64,
    pub status: ResultStatus,
    pub questions: Vec<SubmitQuestion>,
    pub device: Device,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemarkQuestion {
    pub question: i64,
    pub answer: String,
    pub is_correct: Vec<bool>,
    pub id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemarkPayload {
    pub exam: i64,
    pub user: i64,
    pub status: ResultStatus,
    pub questions: Vec<RemarkQuestion>,
    pub device: Device,
    pub id: i64,
}
