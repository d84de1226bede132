use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

use crate::attempt::reducer::{reduce, AttemptAction};
use crate::core::context::FlowContext;
use crate::schemas::answer::AnswerValue;
use crate::schemas::attempt::{AttemptAnswer, AttemptState, Device};
use crate::schemas::result::{ResultStatus, SubmitQuestion, SubmitResultPayload};
use crate::services::local_store::{keys, LocalStore as _};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    Loading,
    Active,
    Submitted { timed_out: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to count: attempt not active, or already timed out.
    Idle,
    Counting,
    /// The clock just hit zero. Reported exactly once per attempt.
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted { exam_id: i64 },
    AlreadySubmitted,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("attempt has not finished loading")]
    NotLoaded,
    #[error("submission rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum AttemptLoadError {
    #[error("failed to fetch exam {exam_id}")]
    Fetch {
        exam_id: i64,
        #[source]
        source: anyhow::Error,
    },
}

/// Drives one student's attempt at one exam: loading, answer edits, the
/// countdown, and submission. Every accepted edit is written through to the
/// local store so a restart resumes exactly where the student left off.
pub struct AttemptController {
    ctx: FlowContext,
    exam_id: i64,
    device: Device,
    phase: AttemptPhase,
    timeout_fired: bool,
    state: AttemptState,
}

impl AttemptController {
    pub fn new(ctx: FlowContext, exam_id: i64, device: Device) -> Self {
        AttemptController {
            ctx,
            exam_id,
            device,
            phase: AttemptPhase::Loading,
            timeout_fired: false,
            state: AttemptState::default(),
        }
    }

    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn exam_id(&self) -> i64 {
        self.exam_id
    }

    /// Fetch the exam, recover any persisted progress, and activate the
    /// attempt. Recovered answers are discarded when their question ids no
    /// longer match the exam's questions.
    pub async fn load(&mut self) -> Result<(), AttemptLoadError> {
        let exam = self
            .ctx
            .api()
            .fetch_exam(self.exam_id)
            .await
            .map_err(|source| AttemptLoadError::Fetch { exam_id: self.exam_id, source })?;

        let fresh: Vec<AttemptAnswer> = exam
            .questions
            .iter()
            .map(|question| AttemptAnswer {
                question_id: question.id.unwrap_or_default(),
                question_index: question.index,
                value: AnswerValue::empty(question.question_type),
            })
            .collect();

        let answers = self.recover_answers(&fresh);
        let time_left = self.recover_time(exam.total_time);

        self.state = reduce(
            &self.state,
            AttemptAction::LoadInitialData {
                exam_name: exam.name,
                exam_code: exam.code,
                exam_file: exam.file,
                answers,
                time_left,
                device: self.device,
            },
        );
        self.phase = AttemptPhase::Active;
        self.timeout_fired = false;
        self.persist();
        info!(exam_id = self.exam_id, time_left, "attempt activated");
        Ok(())
    }

    fn recover_answers(&self, fresh: &[AttemptAnswer]) -> Vec<AttemptAnswer> {
        let key = keys::attempt_answers(self.exam_id, self.user_id());
        let Some(raw) = self.ctx.store().get(&key) else {
            return fresh.to_vec();
        };
        match serde_json::from_str::<Vec<AttemptAnswer>>(&raw) {
            Ok(recovered) => {
                let mut recovered_ids: Vec<i64> =
                    recovered.iter().map(|a| a.question_id).collect();
                let mut fresh_ids: Vec<i64> = fresh.iter().map(|a| a.question_id).collect();
                recovered_ids.sort_unstable();
                fresh_ids.sort_unstable();
                if recovered_ids == fresh_ids {
                    recovered
                } else {
                    warn!(exam_id = self.exam_id, "persisted answers no longer match exam, starting fresh");
                    fresh.to_vec()
                }
            }
            Err(err) => {
                warn!(exam_id = self.exam_id, error = %err, "persisted answers unreadable, starting fresh");
                fresh.to_vec()
            }
        }
    }

    fn recover_time(&self, total_time: u32) -> u32 {
        let key = keys::attempt_time(self.exam_id, self.user_id());
        match self.ctx.store().get(&key) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(remaining) => remaining.min(total_time),
                Err(err) => {
                    warn!(exam_id = self.exam_id, error = %err, "persisted time unreadable, using full duration");
                    total_time
                }
            },
            None => total_time,
        }
    }

    /// Apply one answer edit. Ignored outside the active phase, so nothing
    /// can mutate an attempt that is still loading or already submitted.
    pub fn dispatch(&mut self, action: AttemptAction) {
        if self.phase != AttemptPhase::Active {
            return;
        }
        self.state = reduce(&self.state, action);
        self.persist();
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != AttemptPhase::Active {
            return TickOutcome::Idle;
        }
        if self.state.time_left == 0 {
            if self.timeout_fired {
                return TickOutcome::Idle;
            }
            self.timeout_fired = true;
            return TickOutcome::TimedOut;
        }
        self.state = reduce(&self.state, AttemptAction::Countdown);
        self.persist_time();
        if self.state.time_left == 0 {
            self.timeout_fired = true;
            return TickOutcome::TimedOut;
        }
        TickOutcome::Counting
    }

    /// Submit the attempt. Idempotent: a second call reports
    /// [`SubmitOutcome::AlreadySubmitted`] without re-sending. A rejected
    /// submission leaves all local state intact so the student can retry.
    pub async fn submit(&mut self, trigger: SubmitTrigger) -> Result<SubmitOutcome, SubmitError> {
        match self.phase {
            AttemptPhase::Submitted { .. } => return Ok(SubmitOutcome::AlreadySubmitted),
            AttemptPhase::Loading => return Err(SubmitError::NotLoaded),
            AttemptPhase::Active => {}
        }

        let payload = SubmitResultPayload {
            exam: self.exam_id,
            user: self.user_id(),
            status: ResultStatus::Completed,
            questions: self
                .state
                .answers
                .iter()
                .map(|answer| SubmitQuestion {
                    question: answer.question_id,
                    answer: answer.value.render(),
                })
                .collect(),
            device: self.device,
        };

        if let Err(err) = self.ctx.api().submit_result(&payload).await {
            warn!(exam_id = self.exam_id, error = %err, "submission rejected, keeping local state");
            return Err(SubmitError::Rejected(err.to_string()));
        }

        let timed_out = self.timeout_fired || trigger == SubmitTrigger::Timeout;
        self.phase = AttemptPhase::Submitted { timed_out };
        self.clear_persisted();
        info!(exam_id = self.exam_id, timed_out, "attempt submitted");
        Ok(SubmitOutcome::Submitted { exam_id: self.exam_id })
    }

    fn user_id(&self) -> i64 {
        self.ctx.user().id
    }

    fn persist(&self) {
        self.persist_answers();
        self.persist_time();
    }

    fn persist_answers(&self) {
        let key = keys::attempt_answers(self.exam_id, self.user_id());
        match serde_json::to_string(&self.state.answers) {
            Ok(json) => {
                if let Err(err) = self.ctx.store().set(&key, &json) {
                    error!(exam_id = self.exam_id, error = %err, "failed to persist answers");
                }
            }
            Err(err) => error!(exam_id = self.exam_id, error = %err, "failed to encode answers"),
        }
    }

    fn persist_time(&self) {
        let key = keys::attempt_time(self.exam_id, self.user_id());
        if let Err(err) = self.ctx.store().set(&key, &self.state.time_left.to_string()) {
            error!(exam_id = self.exam_id, error = %err, "failed to persist remaining time");
        }
    }

    fn clear_persisted(&self) {
        let user = self.user_id();
        for key in [keys::attempt_answers(self.exam_id, user), keys::attempt_time(self.exam_id, user)] {
            if let Err(err) = self.ctx.store().remove(&key) {
                error!(exam_id = self.exam_id, error = %err, "failed to clear attempt state");
            }
        }
    }
}

/// Run the one-second countdown for a shared controller until the attempt is
/// submitted or shutdown is signalled. On timeout the attempt is submitted
/// automatically.
pub fn spawn_countdown(
    controller: Arc<Mutex<AttemptController>>,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        // consume the immediate first tick so the clock starts a full second out
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("countdown stopped by shutdown signal");
                    return;
                }
                _ = ticker.tick() => {
                    let mut guard = controller.lock().await;
                    match guard.tick() {
                        TickOutcome::Counting => {}
                        TickOutcome::TimedOut => {
                            if let Err(err) = guard.submit(SubmitTrigger::Timeout).await {
                                error!(exam_id = guard.exam_id(), error = %err, "auto-submit failed");
                            }
                        }
                        TickOutcome::Idle => {
                            if matches!(guard.phase(), AttemptPhase::Submitted { .. }) {
                                return;
                            }
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::reducer::AttemptAction;
    use crate::services::local_store::LocalStore;
    use crate::test_support::{make_context, sample_exam, MockApi};

    fn context_with(api: MockApi) -> FlowContext {
        make_context(Arc::new(api))
    }

    #[tokio::test]
    async fn load_activates_with_full_duration_when_nothing_persisted() {
        let mut controller =
            AttemptController::new(context_with(MockApi::default()), 41, Device::Desktop);
        controller.load().await.unwrap();
        assert_eq!(controller.phase(), AttemptPhase::Active);
        assert_eq!(controller.state().time_left, sample_exam(41, 9).total_time);
        assert_eq!(controller.state().answers.len(), 3);
    }

    #[tokio::test]
    async fn load_recovers_persisted_answers_and_time() {
        let ctx = context_with(MockApi::default());
        let answers = r#"[
            {"questionId": 100, "questionIndex": 0, "questionType": "single-choice", "answer": "B"},
            {"questionId": 101, "questionIndex": 1, "questionType": "multiple-choice", "answer": "A,C"},
            {"questionId": 102, "questionIndex": 2, "questionType": "long-response", "answer": "wip"}
        ]"#;
        ctx.store().set("lesson-41-7-answers", answers).unwrap();
        ctx.store().set("lesson-41-7-time", "885").unwrap();

        let mut controller = AttemptController::new(ctx, 41, Device::Desktop);
        controller.load().await.unwrap();
        assert_eq!(controller.state().time_left, 885);
        assert_eq!(controller.state().answers[0].value.render(), "B");
        assert_eq!(controller.state().answers[2].value.render(), "wip");
    }

    #[tokio::test]
    async fn load_discards_persisted_answers_for_different_questions() {
        let ctx = context_with(MockApi::default());
        let stale = r#"[
            {"questionId": 900, "questionIndex": 0, "questionType": "single-choice", "answer": "B"}
        ]"#;
        ctx.store().set("lesson-41-7-answers", stale).unwrap();

        let mut controller = AttemptController::new(ctx, 41, Device::Desktop);
        controller.load().await.unwrap();
        assert_eq!(controller.state().answers.len(), 3);
        assert!(controller.state().answers.iter().all(|a| a.value.is_empty()));
    }

    #[tokio::test]
    async fn dispatch_persists_after_every_edit() {
        let ctx = context_with(MockApi::default());
        let mut controller = AttemptController::new(ctx.clone(), 41, Device::Desktop);
        controller.load().await.unwrap();
        controller.dispatch(AttemptAction::SingleChangeAnswer { question_index: 0, letter: 'C' });

        let raw = ctx.store().get("lesson-41-7-answers").unwrap();
        let rows: Vec<AttemptAnswer> = serde_json::from_str(&raw).unwrap();
        assert_eq!(rows[0].value.render(), "C");
    }

    #[tokio::test]
    async fn dispatch_before_load_is_ignored() {
        let mut controller =
            AttemptController::new(context_with(MockApi::default()), 41, Device::Desktop);
        controller.dispatch(AttemptAction::SingleChangeAnswer { question_index: 0, letter: 'C' });
        assert!(controller.state().answers.is_empty());
    }

    #[tokio::test]
    async fn tick_reports_timeout_exactly_once() {
        let ctx = context_with(MockApi::default());
        ctx.store().set("lesson-41-7-time", "2").unwrap();
        let mut controller = AttemptController::new(ctx, 41, Device::Desktop);
        controller.load().await.unwrap();

        assert_eq!(controller.tick(), TickOutcome::Counting);
        assert_eq!(controller.tick(), TickOutcome::TimedOut);
        assert_eq!(controller.tick(), TickOutcome::Idle);
    }

    #[tokio::test]
    async fn submit_clears_persistence_and_is_idempotent() {
        let api = MockApi::default();
        let ctx = context_with(api);
        let mut controller = AttemptController::new(ctx.clone(), 41, Device::Desktop);
        controller.load().await.unwrap();
        controller.dispatch(AttemptAction::SingleChangeAnswer { question_index: 0, letter: 'B' });

        let outcome = controller.submit(SubmitTrigger::Manual).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Submitted { exam_id: 41 });
        assert_eq!(controller.phase(), AttemptPhase::Submitted { timed_out: false });
        assert!(ctx.store().get("lesson-41-7-answers").is_none());
        assert!(ctx.store().get("lesson-41-7-time").is_none());

        let again = controller.submit(SubmitTrigger::Manual).await.unwrap();
        assert_eq!(again, SubmitOutcome::AlreadySubmitted);
    }

    #[tokio::test]
    async fn rejected_submission_keeps_local_state() {
        let api = MockApi { submit_ok: false, ..MockApi::default() };
        let ctx = context_with(api);
        let mut controller = AttemptController::new(ctx.clone(), 41, Device::Desktop);
        controller.load().await.unwrap();
        controller.dispatch(AttemptAction::SingleChangeAnswer { question_index: 0, letter: 'B' });

        let err = controller.submit(SubmitTrigger::Manual).await.unwrap_err();
        assert!(matches!(err, SubmitError::Rejected(_)));
        assert_eq!(controller.phase(), AttemptPhase::Active);
        assert!(ctx.store().get("lesson-41-7-answers").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_task_auto_submits_on_timeout() {
        let ctx = context_with(MockApi::default());
        ctx.store().set("lesson-41-7-time", "3").unwrap();
        let mut controller = AttemptController::new(ctx.clone(), 41, Device::Desktop);
        controller.load().await.unwrap();

        let controller = Arc::new(Mutex::new(controller));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_countdown(controller.clone(), shutdown_rx);

        tokio::time::sleep(Duration::from_secs(6)).await;
        handle.await.unwrap();

        let guard = controller.lock().await;
        assert_eq!(guard.phase(), AttemptPhase::Submitted { timed_out: true });
        assert!(ctx.store().get("lesson-41-7-time").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_task_stops_on_shutdown() {
        let ctx = context_with(MockApi::default());
        let mut controller = AttemptController::new(ctx, 41, Device::Desktop);
        controller.load().await.unwrap();
        let time_before = controller.state().time_left;

        let controller = Arc::new(Mutex::new(controller));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_countdown(controller.clone(), shutdown_rx);

        tokio::time::sleep(Duration::from_secs(2)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        let guard = controller.lock().await;
        assert!(guard.state().time_left < time_before);
        assert_eq!(guard.phase(), AttemptPhase::Active);
    }
}
