//! Sequential exam unlock flow for one student inside one exam group.
//!
//! Exams in a group open one at a time: completing an exam starts a cooldown
//! of `await_time` seconds before the next one unlocks. The cooldown survives
//! restarts because its wall-clock start time is persisted; the in-process
//! ticker only refreshes the advisory seconds-remaining value, it is never
//! the authority for the transition.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::core::context::FlowContext;
use crate::core::time::now_unix_millis;
use crate::schemas::group::{ExamGroup, ExamStatus, ExamWithStatus};
use crate::services::local_store::{keys, LocalStore as _};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("failed to load exam group {group_id}")]
    Load {
        group_id: i64,
        #[source]
        source: anyhow::Error,
    },
}

pub struct ExamFlowSession {
    ctx: FlowContext,
    group: ExamGroup,
    exams: Vec<ExamWithStatus>,
    awaiting: Option<u32>,
}

impl ExamFlowSession {
    /// Fetch the group, its exams, and the student's results, then derive
    /// each exam's status. Exactly one exam ends up `unlocking` or `unlocked`
    /// unless every exam is already completed.
    pub async fn initialize(ctx: FlowContext, group_id: i64) -> Result<Self, FlowError> {
        let user_id = ctx.user().id;
        let api = ctx.api();
        let (group, exams, results) = tokio::try_join!(
            api.fetch_exam_group(group_id),
            api.list_group_exams(group_id),
            api.list_results(user_id, group_id),
        )
        .map_err(|source| FlowError::Load { group_id, source })?;

        let exams = exams
            .into_iter()
            .map(|exam| {
                let status = if results.iter().any(|result| result.exam == exam.id) {
                    ExamStatus::Completed
                } else {
                    ExamStatus::Locked
                };
                ExamWithStatus { exam, status }
            })
            .collect();

        let mut session = ExamFlowSession { ctx, group, exams, awaiting: None };
        session.recover_unlock_state();
        Ok(session)
    }

    pub fn group(&self) -> &ExamGroup {
        &self.group
    }

    pub fn exams(&self) -> &[ExamWithStatus] {
        &self.exams
    }

    pub fn status_of(&self, exam_id: i64) -> Option<ExamStatus> {
        self.exams.iter().find(|e| e.exam.id == exam_id).map(|e| e.status)
    }

    /// Advisory seconds left on the current cooldown, if one is running.
    pub fn seconds_remaining(&self) -> Option<u32> {
        self.awaiting
    }

    pub fn is_unlocking(&self) -> bool {
        self.exams.iter().any(|e| e.status == ExamStatus::Unlocking)
    }

    /// Record a successful submission: the exam becomes `completed` and the
    /// earliest still-locked exam after it starts its cooldown, with the
    /// wall-clock start persisted so a restart resumes the same cooldown.
    pub fn mark_completed(&mut self, exam_id: i64) {
        let Some(position) = self.exams.iter().position(|e| e.exam.id == exam_id) else {
            warn!(exam_id, group_id = self.group.id, "completed exam not in group");
            return;
        };
        self.exams[position].status = ExamStatus::Completed;

        let next = self
            .exams
            .iter()
            .enumerate()
            .skip(position + 1)
            .find(|(_, e)| e.status == ExamStatus::Locked)
            .map(|(candidate, _)| candidate);
        let Some(next) = next else {
            self.awaiting = None;
            return;
        };

        let next_id = self.exams[next].exam.id;
        self.persist_cooldown(now_unix_millis(), next_id);
        self.exams[next].status = ExamStatus::Unlocking;
        self.awaiting = Some(self.group.await_time);
        info!(
            group_id = self.group.id,
            exam_id = next_id,
            await_time = self.group.await_time,
            "cooldown started"
        );
    }

    /// Refresh the cooldown from the persisted wall-clock start. Promotes
    /// `unlocking` to `unlocked` once the cooldown has fully elapsed.
    pub fn tick(&mut self) -> Option<u32> {
        let unlocking = self.exams.iter().position(|e| e.status == ExamStatus::Unlocking)?;
        match self.read_cooldown() {
            Some((start_ms, _)) => {
                let remaining = self.remaining_seconds(start_ms);
                if remaining == 0 {
                    let exam_id = self.exams[unlocking].exam.id;
                    self.exams[unlocking].status = ExamStatus::Unlocked;
                    self.clear_cooldown();
                    self.awaiting = None;
                    info!(group_id = self.group.id, exam_id, "cooldown elapsed, exam unlocked");
                    None
                } else {
                    self.awaiting = Some(remaining);
                    Some(remaining)
                }
            }
            None => {
                // persisted state vanished under us, unlock rather than stall
                self.exams[unlocking].status = ExamStatus::Unlocked;
                self.awaiting = None;
                None
            }
        }
    }

    fn recover_unlock_state(&mut self) {
        if let Some((start_ms, exam_id)) = self.read_cooldown() {
            let target = self
                .exams
                .iter()
                .position(|e| e.exam.id == exam_id && e.status == ExamStatus::Locked);
            match target {
                Some(position) => {
                    let remaining = self.remaining_seconds(start_ms);
                    if remaining > 0 {
                        self.exams[position].status = ExamStatus::Unlocking;
                        self.awaiting = Some(remaining);
                        info!(
                            group_id = self.group.id,
                            exam_id,
                            remaining,
                            "resumed cooldown from persisted start time"
                        );
                        return;
                    }
                    self.exams[position].status = ExamStatus::Unlocked;
                    self.clear_cooldown();
                    info!(group_id = self.group.id, exam_id, "cooldown already elapsed, exam unlocked");
                    return;
                }
                None => {
                    warn!(
                        group_id = self.group.id,
                        exam_id, "persisted cooldown references an unknown or completed exam"
                    );
                    self.clear_cooldown();
                }
            }
        }
        self.ensure_one_active();
    }

    /// The first exam of a group, or the first exam after corrupt recovery
    /// state was discarded, opens without any cooldown.
    fn ensure_one_active(&mut self) {
        let active = self
            .exams
            .iter()
            .any(|e| matches!(e.status, ExamStatus::Unlocked | ExamStatus::Unlocking));
        if active {
            return;
        }
        if let Some(first_locked) =
            self.exams.iter().position(|e| e.status == ExamStatus::Locked)
        {
            self.exams[first_locked].status = ExamStatus::Unlocked;
        }
    }

    fn remaining_seconds(&self, start_ms: i64) -> u32 {
        let elapsed = (now_unix_millis() - start_ms) / 1000;
        let remaining = i64::from(self.group.await_time) - elapsed;
        remaining.clamp(0, i64::from(self.group.await_time)) as u32
    }

    fn read_cooldown(&self) -> Option<(i64, i64)> {
        let user_id = self.ctx.user().id;
        let start_key = keys::unlock_start_time(user_id, self.group.id);
        let id_key = keys::unlocking_exam_id(user_id, self.group.id);
        let raw_start = self.ctx.store().get(&start_key)?;
        let raw_id = self.ctx.store().get(&id_key)?;
        match (raw_start.trim().parse::<i64>(), raw_id.trim().parse::<i64>()) {
            (Ok(start_ms), Ok(exam_id)) => Some((start_ms, exam_id)),
            _ => {
                warn!(group_id = self.group.id, "persisted cooldown state unreadable, discarding");
                self.clear_cooldown();
                None
            }
        }
    }

    fn persist_cooldown(&self, start_ms: i64, exam_id: i64) {
        let user_id = self.ctx.user().id;
        let writes = [
            (keys::unlock_start_time(user_id, self.group.id), start_ms.to_string()),
            (keys::unlocking_exam_id(user_id, self.group.id), exam_id.to_string()),
        ];
        for (key, value) in writes {
            if let Err(err) = self.ctx.store().set(&key, &value) {
                warn!(group_id = self.group.id, error = %err, "failed to persist cooldown state");
            }
        }
    }

    fn clear_cooldown(&self) {
        let user_id = self.ctx.user().id;
        for key in [
            keys::unlock_start_time(user_id, self.group.id),
            keys::unlocking_exam_id(user_id, self.group.id),
        ] {
            if let Err(err) = self.ctx.store().remove(&key) {
                warn!(group_id = self.group.id, error = %err, "failed to clear cooldown state");
            }
        }
    }
}

/// Tick the advisory cooldown display once per second until nothing is
/// unlocking or shutdown is signalled.
pub fn spawn_cooldown_ticker(
    session: Arc<Mutex<ExamFlowSession>>,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("cooldown ticker stopped by shutdown signal");
                    return;
                }
                _ = ticker.tick() => {
                    let mut guard = session.lock().await;
                    if guard.tick().is_none() && !guard.is_unlocking() {
                        return;
                    }
                }
            }
        }
    })
}
