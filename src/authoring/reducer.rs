use crate::schemas::answer::{AnswerValue, QuestionType};
use crate::schemas::exam::{ExamDefinition, ExamFileRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftQuestion {
    pub index: u32,
    pub question_type: QuestionType,
    pub correct: AnswerValue,
}

impl DraftQuestion {
    fn fresh(index: u32) -> Self {
        DraftQuestion {
            index,
            question_type: QuestionType::SingleChoice,
            correct: AnswerValue::empty(QuestionType::SingleChoice),
        }
    }
}

/// An exam being authored. `total_time` is MINUTES while editing and is only
/// converted to seconds when the draft is published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamDraft {
    pub name: String,
    pub code: String,
    pub exam_group: i64,
    pub number_of_question: u32,
    pub total_time: u32,
    pub questions: Vec<DraftQuestion>,
    pub file: Option<ExamFileRef>,
}

impl ExamDraft {
    pub fn new(exam_group: i64) -> Self {
        ExamDraft {
            name: String::new(),
            code: String::new(),
            exam_group,
            number_of_question: 1,
            total_time: 0,
            questions: vec![DraftQuestion::fresh(0)],
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    LoadInitialData { exam: ExamDefinition },
    SetName(String),
    SetCode(String),
    SetTotalTime(u32),
    SetAmount(i64),
    ChangeQuestionType { index: u32, question_type: QuestionType },
    SingleChangeCorrectAnswer { index: u32, letter: char },
    MultipleCheckOption { index: u32, letter: char },
    MultipleUncheckOption { index: u32, letter: char },
    UploadFile(Option<ExamFileRef>),
}

/// Pure transition function for the authoring screen's draft state.
pub fn reduce(draft: &ExamDraft, action: EditAction) -> ExamDraft {
    match action {
        EditAction::LoadInitialData { exam } => ExamDraft {
            name: exam.name,
            code: exam.code,
            exam_group: exam.exam_group,
            number_of_question: exam.questions.len() as u32,
            total_time: exam.total_time / 60,
            questions: exam
                .questions
                .into_iter()
                .map(|question| DraftQuestion {
                    index: question.index,
                    question_type: question.question_type,
                    correct: AnswerValue::parse(question.question_type, &question.correct_answer),
                })
                .collect(),
            file: exam.file,
        },
        EditAction::SetName(name) => ExamDraft { name, ..draft.clone() },
        EditAction::SetCode(code) => ExamDraft { code, ..draft.clone() },
        EditAction::SetTotalTime(total_time) => ExamDraft { total_time, ..draft.clone() },
        EditAction::SetAmount(amount) => {
            if amount <= 0 {
                return draft.clone();
            }
            let amount = amount as u32;
            let mut next = draft.clone();
            next.questions.truncate(amount as usize);
            while (next.questions.len() as u32) < amount {
                next.questions.push(DraftQuestion::fresh(next.questions.len() as u32));
            }
            next.number_of_question = amount;
            next
        }
        EditAction::ChangeQuestionType { index, question_type } => {
            with_question(draft, index, |question| {
                question.question_type = question_type;
                question.correct = AnswerValue::empty(question_type);
            })
        }
        EditAction::SingleChangeCorrectAnswer { index, letter } => {
            with_question(draft, index, |question| question.correct.choose(letter))
        }
        EditAction::MultipleCheckOption { index, letter } => {
            with_question(draft, index, |question| question.correct.check(letter))
        }
        EditAction::MultipleUncheckOption { index, letter } => {
            with_question(draft, index, |question| question.correct.uncheck(letter))
        }
        EditAction::UploadFile(file) => ExamDraft { file, ..draft.clone() },
    }
}

fn with_question<F>(draft: &ExamDraft, index: u32, edit: F) -> ExamDraft
where
    F: FnOnce(&mut DraftQuestion),
{
    let mut next = draft.clone();
    if let Some(question) = next.questions.iter_mut().find(|q| q.index == index) {
        edit(question);
    }
    next
}
