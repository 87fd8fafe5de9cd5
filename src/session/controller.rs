//! Phase Transition Controller
//!
//! Advances one [`SessionState`] through the study flow:
//!
//! ```text
//! Welcome ─name─> Guessing(0..N) ─last guess─> Completed ─treatment─> TeachingSelected
//!                                                                          │ proceed
//!                       TestingCompleted <─last answer─ Testing(0..M) <────┘
//! ```
//!
//! Every write transition needs a non-empty value. Empty values and
//! submissions that do not belong to the current phase leave the state
//! untouched and report [`Outcome::Unchanged`], so the front end can simply
//! resubmit. A failed persist also leaves the state as it was before the
//! submission.

use super::record::{GuessRecord, TeachingPhase};
use super::state::{Phase, SessionState};
use crate::recorder::{InteractionLog, ResponseSink};
use crate::trial::TrialProvider;
use crate::Result;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// A participant action, as delivered by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Welcome screen name
    Name(String),
    /// Guessing-phase selection
    Guess(String),
    /// Treatment choice (`control`, `treatment1`, `treatment2`)
    Teaching(String),
    /// "Proceed to testing" button
    ProceedToTesting,
    /// Testing-phase selection
    TestAnswer(String),
}

/// Result of applying a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// State changed
    Advanced,
    /// No-op; state untouched
    Unchanged,
}

/// Drives sessions through the study phases.
pub struct PhaseController<S> {
    sink: S,
    provider: TrialProvider,
    test_image_root: PathBuf,
    log: Option<Arc<InteractionLog>>,
}

impl<S: ResponseSink> PhaseController<S> {
    /// Create a controller persisting through `sink` and drawing testing
    /// trials from `test_image_root`.
    #[must_use]
    pub fn new(sink: S, provider: TrialProvider, test_image_root: impl Into<PathBuf>) -> Self {
        Self {
            sink,
            provider,
            test_image_root: test_image_root.into(),
            log: None,
        }
    }

    /// Also append accepted transitions to `log`.
    #[must_use]
    pub fn with_log(mut self, log: Arc<InteractionLog>) -> Self {
        self.log = Some(log);
        self
    }

    /// Response sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Apply `submission` to `state`.
    ///
    /// # Errors
    ///
    /// Returns error if persisting the table fails; `state` is then unchanged
    pub fn submit(&self, state: &mut SessionState, submission: Submission) -> Result<Outcome> {
        match submission {
            Submission::Name(name) => self.on_name(state, &name),
            Submission::Guess(guess) => self.on_guess(state, &guess),
            Submission::Teaching(choice) => self.on_teaching(state, &choice),
            Submission::ProceedToTesting => Ok(self.on_proceed(state)),
            Submission::TestAnswer(answer) => self.on_test_answer(state, &answer),
        }
    }

    /// Append an event to the interaction log, if one is attached.
    ///
    /// Log failures are reported and swallowed.
    pub fn record_event(&self, state: &SessionState, event_type: &str, data: &serde_json::Value) {
        if let Some(log) = &self.log {
            let session_id = state.session_id().to_string();
            if let Err(e) = log.log_interaction(&session_id, state.phase.name(), event_type, data) {
                warn!("Interaction log write failed for {}: {}", session_id, e);
            }
        }
    }

    fn on_name(&self, state: &mut SessionState, name: &str) -> Result<Outcome> {
        let name = name.trim();
        if state.phase != Phase::Welcome || name.is_empty() {
            return Ok(Outcome::Unchanged);
        }

        let participant_id = self.sink.next_participant_id()?;
        state.participant_name = Some(name.to_string());
        state.participant_id = Some(participant_id);
        state.phase = if state.trials().is_empty() {
            Phase::Completed
        } else {
            Phase::Guessing { index: 0 }
        };

        info!(
            "Session {}: participant '{}' (#{}) starts {} trials",
            state.session_id(),
            name,
            participant_id,
            state.trials().len()
        );
        self.record_event(
            state,
            "name_submitted",
            &json!({ "user_name": name, "user_id": participant_id }),
        );
        Ok(Outcome::Advanced)
    }

    fn on_guess(&self, state: &mut SessionState, guess: &str) -> Result<Outcome> {
        let guess = guess.trim();
        let Phase::Guessing { index } = state.phase else {
            return Ok(Outcome::Unchanged);
        };
        if guess.is_empty() {
            return Ok(Outcome::Unchanged);
        }
        let Some(trial) = state.trials().get(index).cloned() else {
            return Ok(Outcome::Unchanged);
        };

        state.records.push(GuessRecord {
            trial_index: index + 1,
            participant_id: state.participant_id.unwrap_or_default(),
            participant_name: state.participant_name.clone().unwrap_or_default(),
            class_label: trial.class_label().to_string(),
            prototype_id: trial.prototype_id().map(str::to_string),
            image_name: trial.image_name().to_string(),
            user_selection: guess.to_string(),
            teaching_phase: TeachingPhase::Untagged,
            testing_phase_class_shown: None,
            testing_phase_user_answer: None,
        });

        let is_last = index + 1 == state.trials().len();
        if is_last {
            state.tag_records(TeachingPhase::Untagged);
            if let Err(e) = self.sink.persist(&state.records) {
                state.records.pop();
                return Err(e);
            }
            state.phase = Phase::Completed;
        } else {
            state.phase = Phase::Guessing { index: index + 1 };
        }

        self.record_event(
            state,
            "guess_submitted",
            &json!({
                "index": index + 1,
                "class_name": trial.class_label(),
                "image_name": trial.image_name(),
                "guess": guess,
            }),
        );
        if is_last {
            info!(
                "Session {}: guessing complete ({} records)",
                state.session_id(),
                state.records.len()
            );
            self.record_event(state, "guessing_completed", &json!({ "records": state.records.len() }));
        }
        Ok(Outcome::Advanced)
    }

    fn on_teaching(&self, state: &mut SessionState, choice: &str) -> Result<Outcome> {
        if !matches!(state.phase, Phase::Completed | Phase::TeachingSelected { .. }) {
            return Ok(Outcome::Unchanged);
        }
        let teaching = match choice.parse::<TeachingPhase>() {
            Ok(teaching) if teaching.is_tagged() => teaching,
            _ => return Ok(Outcome::Unchanged),
        };

        let previous = state
            .records
            .first()
            .map_or(TeachingPhase::Untagged, |r| r.teaching_phase);
        state.tag_records(teaching);
        if let Err(e) = self.sink.persist(&state.records) {
            state.tag_records(previous);
            return Err(e);
        }
        state.phase = Phase::TeachingSelected { teaching };

        info!("Session {}: teaching phase '{}'", state.session_id(), teaching);
        self.record_event(state, "teaching_selected", &json!({ "teaching_phase": teaching }));
        Ok(Outcome::Advanced)
    }

    fn on_proceed(&self, state: &mut SessionState) -> Outcome {
        if !matches!(state.phase, Phase::TeachingSelected { .. }) {
            return Outcome::Unchanged;
        }

        if state.test_trials.is_none() {
            let labels = state.class_labels();
            state.test_trials = Some(self.provider.prepare_test_trials(&labels, &self.test_image_root));
        }
        let count = state.test_trials.as_ref().map_or(0, Vec::len);
        state.phase = if count == 0 {
            Phase::TestingCompleted
        } else {
            Phase::Testing { index: 0 }
        };

        info!("Session {}: testing phase with {} trials", state.session_id(), count);
        self.record_event(state, "testing_started", &json!({ "trials": count }));
        Outcome::Advanced
    }

    fn on_test_answer(&self, state: &mut SessionState, answer: &str) -> Result<Outcome> {
        let answer = answer.trim();
        let Phase::Testing { index } = state.phase else {
            return Ok(Outcome::Unchanged);
        };
        if answer.is_empty() {
            return Ok(Outcome::Unchanged);
        }
        let Some(trial) = state.test_trials.as_ref().and_then(|t| t.get(index)).cloned() else {
            return Ok(Outcome::Unchanged);
        };

        let previous = state.record_for_class_mut(trial.class_label()).map(|record| {
            let previous = (
                record.testing_phase_class_shown.take(),
                record.testing_phase_user_answer.take(),
            );
            record.testing_phase_class_shown = Some(trial.class_label().to_string());
            record.testing_phase_user_answer = Some(answer.to_string());
            previous
        });

        match previous {
            Some((shown, answered)) => {
                if let Err(e) = self.sink.persist(&state.records) {
                    if let Some(record) = state.record_for_class_mut(trial.class_label()) {
                        record.testing_phase_class_shown = shown;
                        record.testing_phase_user_answer = answered;
                    }
                    return Err(e);
                }
            }
            None => warn!(
                "Session {}: no guessing record for testing class '{}'",
                state.session_id(),
                trial.class_label()
            ),
        }

        let total = state.test_trials.as_ref().map_or(0, Vec::len);
        state.phase = if index + 1 >= total {
            Phase::TestingCompleted
        } else {
            Phase::Testing { index: index + 1 }
        };

        self.record_event(
            state,
            "test_answer_submitted",
            &json!({
                "index": index + 1,
                "class_name": trial.class_label(),
                "image_name": trial.image_name(),
                "answer": answer,
            }),
        );
        if state.phase == Phase::TestingCompleted {
            info!("Session {}: testing complete", state.session_id());
            self.record_event(state, "testing_completed", &json!({}));
        }
        Ok(Outcome::Advanced)
    }
}
