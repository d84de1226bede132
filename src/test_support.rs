use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::core::auth::UserClaims;
use crate::core::config::Settings;
use crate::core::context::FlowContext;
use crate::core::time::now_unix_seconds;
use crate::schemas::answer::QuestionType;
use crate::schemas::exam::{ExamDefinition, ExamFileRef, Question};
use crate::schemas::group::ExamGroup;
use crate::schemas::result::{
    AnswerResult, ExamResult, RemarkPayload, ResultStatus, SubmitResultPayload,
};
use crate::services::api::ExamApi;
use crate::services::local_store::MemoryStore;

pub fn sample_exam(exam_id: i64, group_id: i64) -> ExamDefinition {
    ExamDefinition {
        id: exam_id,
        name: format!("Mechanics quiz {exam_id}"),
        code: format!("MQ-{exam_id}"),
        exam_group: group_id,
        total_time: 1800,
        file: Some(ExamFileRef {
            id: Some(3),
            url: Some(format!("https://files.example/exam-{exam_id}.pdf")),
        }),
        questions: vec![
            Question {
                id: Some(100),
                index: 0,
                question_type: QuestionType::SingleChoice,
                correct_answer: "B".into(),
            },
            Question {
                id: Some(101),
                index: 1,
                question_type: QuestionType::MultipleChoice,
                correct_answer: "A,C".into(),
            },
            Question {
                id: Some(102),
                index: 2,
                question_type: QuestionType::LongResponse,
                correct_answer: String::new(),
            },
        ],
    }
}

pub fn sample_group(group_id: i64) -> ExamGroup {
    ExamGroup {
        id: group_id,
        name: "Term 2 physics".into(),
        await_time: 300,
        start_date: Some("2026-08-01".into()),
    }
}

pub fn sample_result(result_id: i64, exam_id: i64, user: i64) -> ExamResult {
    ExamResult {
        id: result_id,
        exam: exam_id,
        user,
        status: ResultStatus::Completed,
        number_of_question: 3,
        number_of_correct_answer: 1,
        device: None,
        created_at: Some("2026-08-20T10:00:00Z".into()),
        answers: vec![
            AnswerResult {
                id: Some(501),
                question: 100,
                answer: Some("B".into()),
                is_correct: Some(vec![true]),
                question_type: Some(QuestionType::SingleChoice),
            },
            AnswerResult {
                id: Some(502),
                question: 101,
                answer: Some("A,C".into()),
                is_correct: Some(vec![true, false]),
                question_type: Some(QuestionType::MultipleChoice),
            },
            AnswerResult {
                id: Some(503),
                question: 102,
                answer: Some("F = m * a".into()),
                is_correct: None,
                question_type: Some(QuestionType::LongResponse),
            },
        ],
    }
}

/// Canned backend: a single group (exams 41, 42, 43) plus recorded
/// submissions so tests can assert on what was sent.
pub struct MockApi {
    pub completed_exam_ids: Vec<i64>,
    pub submit_ok: bool,
    pub submitted: Mutex<Vec<SubmitResultPayload>>,
    pub updated: Mutex<Vec<(i64, RemarkPayload)>>,
}

impl Default for MockApi {
    fn default() -> Self {
        MockApi {
            completed_exam_ids: Vec::new(),
            submit_ok: true,
            submitted: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ExamApi for MockApi {
    async fn fetch_exam(&self, exam_id: i64) -> Result<ExamDefinition> {
        Ok(sample_exam(exam_id, 9))
    }

    async fn fetch_exam_group(&self, group_id: i64) -> Result<ExamGroup> {
        Ok(sample_group(group_id))
    }

    async fn list_group_exams(&self, group_id: i64) -> Result<Vec<ExamDefinition>> {
        Ok(vec![
            sample_exam(41, group_id),
            sample_exam(42, group_id),
            sample_exam(43, group_id),
        ])
    }

    async fn list_results(&self, student_id: i64, _group_id: i64) -> Result<Vec<ExamResult>> {
        Ok(self
            .completed_exam_ids
            .iter()
            .enumerate()
            .map(|(offset, &exam_id)| ExamResult {
                id: 900 + offset as i64,
                exam: exam_id,
                user: student_id,
                status: ResultStatus::Completed,
                number_of_question: 3,
                number_of_correct_answer: 0,
                device: None,
                created_at: None,
                answers: Vec::new(),
            })
            .collect())
    }

    async fn submit_result(&self, payload: &SubmitResultPayload) -> Result<ExamResult> {
        if !self.submit_ok {
            bail!("exam result rejected");
        }
        self.submitted.lock().unwrap().push(payload.clone());
        Ok(ExamResult {
            id: 1000,
            exam: payload.exam,
            user: payload.user,
            status: payload.status,
            number_of_question: payload.questions.len() as u32,
            number_of_correct_answer: 0,
            device: Some(payload.device),
            created_at: None,
            answers: Vec::new(),
        })
    }

    async fn update_result(&self, result_id: i64, payload: &RemarkPayload) -> Result<ExamResult> {
        self.updated.lock().unwrap().push((result_id, payload.clone()));
        Ok(ExamResult {
            id: result_id,
            exam: payload.exam,
            user: payload.user,
            status: payload.status,
            number_of_question: payload.questions.len() as u32,
            number_of_correct_answer: 0,
            device: Some(payload.device),
            created_at: None,
            answers: Vec::new(),
        })
    }

    async fn create_exam(&self, payload: &serde_json::Value) -> Result<serde_json::Value> {
        let mut created = payload.clone();
        created["id"] = serde_json::json!(77);
        Ok(created)
    }
}

pub fn user_claims() -> UserClaims {
    UserClaims { id: 7, role: Some("student".into()), exp: now_unix_seconds() + 3600 }
}

pub fn make_context(api: Arc<dyn ExamApi>) -> FlowContext {
    let settings = Settings::load().expect("settings");
    FlowContext::new(settings, api, Arc::new(MemoryStore::new()), user_claims())
}
