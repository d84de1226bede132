//! Teacher-side remarking: derives per-question correctness from a stored
//! result, lets the teacher assign marks to ungraded long-response answers,
//! and builds the update payload once every question is graded.

use std::collections::HashMap;

use thiserror::Error;

use crate::schemas::answer::QuestionType;
use crate::schemas::attempt::Device;
use crate::schemas::exam::ExamDefinition;
use crate::schemas::result::{
    AnswerResult, ExamResult, RemarkPayload, RemarkQuestion, ResultStatus,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RemarkError {
    #[error("question at position {position} is not yet marked")]
    Unmarked { position: usize },
    #[error("question {question_id} already carries a grade and cannot be remarked")]
    NotRemarkable { question_id: i64 },
    #[error("question {question_id} is not part of this result")]
    UnknownQuestion { question_id: i64 },
}

/// One question's remarking view.
///
/// `is_correct` is `None` only while an answered long-response question
/// awaits a mark. `is_initially_marked` locks everything the automated
/// grader (or an earlier remark) already judged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemarkedQuestion {
    pub question_id: i64,
    pub index: u32,
    pub question_type: QuestionType,
    pub answer: Option<String>,
    pub is_correct: Option<bool>,
    pub is_initially_marked: bool,
}

pub struct RemarkSheet {
    exam_id: i64,
    result_id: i64,
    user: i64,
    device: Device,
    questions: Vec<RemarkedQuestion>,
    answers: Vec<AnswerResult>,
}

impl RemarkSheet {
    /// Derive the remarking view for one result against its exam definition.
    /// Unanswered questions are forced incorrect and locked; answered
    /// questions without a stored grade are open for the teacher to mark.
    pub fn build(exam: &ExamDefinition, result: &ExamResult) -> Self {
        let rows: HashMap<i64, &AnswerResult> =
            result.answers.iter().map(|row| (row.question, row)).collect();

        let mut questions: Vec<RemarkedQuestion> = exam
            .questions
            .iter()
            .map(|question| {
                let question_id = question.id.unwrap_or_default();
                let row = rows.get(&question_id);
                let answer = row.and_then(|row| row.answer.clone()).filter(|a| !a.is_empty());
                let (is_correct, is_initially_marked) = match (&answer, row) {
                    (None, _) => (Some(false), true),
                    (Some(_), Some(row)) => match &row.is_correct {
                        None => (None, false),
                        Some(marks) => (Some(!marks.contains(&false)), true),
                    },
                    (Some(_), None) => (Some(false), true),
                };
                RemarkedQuestion {
                    question_id,
                    index: question.index,
                    question_type: question.question_type,
                    answer,
                    is_correct,
                    is_initially_marked,
                }
            })
            .collect();
        questions.sort_by_key(|question| question.index);

        RemarkSheet {
            exam_id: exam.id,
            result_id: result.id,
            user: result.user,
            device: result.device.unwrap_or_default(),
            questions,
            answers: result.answers.clone(),
        }
    }

    pub fn questions(&self) -> &[RemarkedQuestion] {
        &self.questions
    }

    /// Answered questions still awaiting a mark.
    pub fn remark_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_correct.is_none()).count()
    }

    pub fn correct_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_correct == Some(true)).count()
    }

    pub fn failed_count(&self) -> usize {
        self.questions
            .len()
            .saturating_sub(self.remark_count())
            .saturating_sub(self.correct_count())
    }

    /// Assign a mark to an ungraded question. Questions already graded by
    /// the automated grader or a previous remark are rejected.
    pub fn set_mark(&mut self, question_id: i64, correct: bool) -> Result<(), RemarkError> {
        let question = self
            .questions
            .iter_mut()
            .find(|q| q.question_id == question_id)
            .ok_or(RemarkError::UnknownQuestion { question_id })?;
        if question.is_initially_marked {
            return Err(RemarkError::NotRemarkable { question_id });
        }
        question.is_correct = Some(correct);
        Ok(())
    }

    /// Build the update payload. Rejected while any question is unmarked.
    /// Only answered questions are included; stored correctness arrays are
    /// reused as-is and teacher marks become single-element arrays.
    pub fn save_payload(&self) -> Result<RemarkPayload, RemarkError> {
        if let Some(position) = self.questions.iter().position(|q| q.is_correct.is_none()) {
            return Err(RemarkError::Unmarked { position: position + 1 });
        }

        let rows: HashMap<i64, &AnswerResult> =
            self.answers.iter().map(|row| (row.question, row)).collect();
        let mut questions = Vec::new();
        for question in &self.questions {
            let Some(answer) = &question.answer else {
                continue;
            };
            let row = rows.get(&question.question_id);
            let is_correct = match row.and_then(|row| row.is_correct.clone()) {
                Some(marks) => marks,
                None => match question.is_correct {
                    Some(mark) => vec![mark],
                    None => continue,
                },
            };
            questions.push(RemarkQuestion {
                question: question.question_id,
                answer: answer.clone(),
                is_correct,
                id: row.and_then(|row| row.id),
            });
        }

        Ok(RemarkPayload {
            exam: self.exam_id,
            user: self.user,
            status: ResultStatus::Remarked,
            questions,
            device: self.device,
            id: self.result_id,
        })
    }
}
