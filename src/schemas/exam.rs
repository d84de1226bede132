use serde::{Deserialize, Serialize};

use crate::schemas::answer::QuestionType;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamFileRef {
    pub id: Option<i64>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: Option<i64>,
    pub index: u32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub correct_answer: String,
}

/// A published exam as the backend serves it. `total_time` is seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamDefinition {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub exam_group: i64,
    pub total_time: u32,
    #[serde(default)]
    pub file: Option<ExamFileRef>,
    #[serde(default)]
    pub questions: Vec<Question>,
}
