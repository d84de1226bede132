use crate::schemas::attempt::{AttemptAnswer, AttemptState, Device};
use crate::schemas::exam::ExamFileRef;

/// Actions an active attempt can apply. The set is closed on purpose: every
/// transition the session supports is spelled out here and matched
/// exhaustively in [`reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptAction {
    LoadInitialData {
        exam_name: String,
        exam_code: String,
        exam_file: Option<ExamFileRef>,
        answers: Vec<AttemptAnswer>,
        time_left: u32,
        device: Device,
    },
    SingleChangeAnswer { question_index: u32, letter: char },
    MultipleCheckOption { question_index: u32, letter: char },
    MultipleUncheckOption { question_index: u32, letter: char },
    LongResponseAnswer { question_index: u32, text: String },
    Countdown,
}

/// Pure transition function: the previous state and an action in, the next
/// state out. Answer edits targeting an unknown question index leave the
/// state unchanged.
pub fn reduce(state: &AttemptState, action: AttemptAction) -> AttemptState {
    match action {
        AttemptAction::LoadInitialData {
            exam_name,
            exam_code,
            exam_file,
            answers,
            time_left,
            device,
        } => AttemptState { exam_name, exam_code, exam_file, answers, time_left, device },
        AttemptAction::SingleChangeAnswer { question_index, letter } => {
            with_answer(state, question_index, |value| value.choose(letter))
        }
        AttemptAction::MultipleCheckOption { question_index, letter } => {
            with_answer(state, question_index, |value| value.check(letter))
        }
        AttemptAction::MultipleUncheckOption { question_index, letter } => {
            with_answer(state, question_index, |value| value.uncheck(letter))
        }
        AttemptAction::LongResponseAnswer { question_index, text } => {
            with_answer(state, question_index, |value| value.write_text(&text))
        }
        AttemptAction::Countdown => AttemptState {
            time_left: state.time_left.saturating_sub(1),
            ..state.clone()
        },
    }
}

fn with_answer<F>(state: &AttemptState, question_index: u32, edit: F) -> AttemptState
where
    F: FnOnce(&mut crate::schemas::answer::AnswerValue),
{
    let mut next = state.clone();
    if let Some(answer) = next.answers.iter_mut().find(|a| a.question_index == question_index) {
        edit(&mut answer.value);
    }
    next
}
