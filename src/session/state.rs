//! Session state tracking
//!
//! Maintains:
//! - Participant identity
//! - Current phase and trial pointer
//! - Guessing-phase and (memoized) testing-phase trials
//! - Buffered guess records

use super::record::{GuessRecord, TeachingPhase};
use crate::trial::Trial;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session identifier
pub type SessionId = Uuid;

/// Position in the study flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for the participant name
    Welcome,
    /// Showing guessing trial `index`
    Guessing {
        /// 0-based trial pointer
        index: usize,
    },
    /// All guesses recorded, waiting for a treatment choice
    Completed,
    /// Treatment chosen and shown, waiting to proceed
    TeachingSelected {
        /// Chosen treatment
        teaching: TeachingPhase,
    },
    /// Showing testing trial `index`
    Testing {
        /// 0-based trial pointer
        index: usize,
    },
    /// Terminal
    TestingCompleted,
}

impl Phase {
    /// Coarse study phase name used in the interaction log.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Guessing { .. } | Self::Completed => "guessing",
            Self::TeachingSelected { .. } => "teaching",
            Self::Testing { .. } | Self::TestingCompleted => "testing",
        }
    }
}

/// Complete state of one participant session.
#[derive(Debug, Clone)]
pub struct SessionState {
    session_id: SessionId,
    /// Name typed on the welcome screen
    pub participant_name: Option<String>,
    /// Participant number assigned when the name was accepted
    pub participant_id: Option<u64>,
    /// Current phase
    pub phase: Phase,
    /// Guessing-phase trials, fixed at session start
    trials: Vec<Trial>,
    /// Testing-phase trials, generated once on first use
    pub test_trials: Option<Vec<Trial>>,
    /// Buffered records, one per answered guessing trial
    pub records: Vec<GuessRecord>,
}

impl SessionState {
    /// Create a session in the welcome phase.
    #[must_use]
    pub fn new(trials: Vec<Trial>) -> Self {
        Self::with_id(Uuid::new_v4(), trials)
    }

    /// Create a session with a known id.
    #[must_use]
    pub fn with_id(session_id: SessionId, trials: Vec<Trial>) -> Self {
        Self {
            session_id,
            participant_name: None,
            participant_id: None,
            phase: Phase::Welcome,
            trials,
            test_trials: None,
            records: Vec::new(),
        }
    }

    /// Session id
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Guessing-phase trials
    #[must_use]
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// Class labels of the guessing-phase trials, in trial order.
    #[must_use]
    pub fn class_labels(&self) -> Vec<String> {
        self.trials.iter().map(|t| t.class_label().to_string()).collect()
    }

    /// Trial currently on screen, if any.
    #[must_use]
    pub fn current_trial(&self) -> Option<&Trial> {
        match self.phase {
            Phase::Guessing { index } => self.trials.get(index),
            Phase::Testing { index } => self.test_trials.as_ref().and_then(|t| t.get(index)),
            _ => None,
        }
    }

    /// Total trials of the current phase (guessing or testing).
    #[must_use]
    pub fn phase_trial_count(&self) -> usize {
        match self.phase {
            Phase::Testing { .. } | Phase::TestingCompleted => {
                self.test_trials.as_ref().map_or(0, Vec::len)
            }
            _ => self.trials.len(),
        }
    }

    /// Tag every buffered record with `teaching`.
    pub fn tag_records(&mut self, teaching: TeachingPhase) {
        for record in &mut self.records {
            record.teaching_phase = teaching;
        }
    }

    /// Buffered record for `class_label`, if one was answered.
    pub fn record_for_class_mut(&mut self, class_label: &str) -> Option<&mut GuessRecord> {
        self.records.iter_mut().find(|r| r.class_label == class_label)
    }
}
