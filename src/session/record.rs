//! Guess Record - one answered trial, enriched across phases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dropdown choice for participants who cannot name the class.
pub const DONT_KNOW: &str = "I don't know";

/// Teaching treatment a participant was assigned.
///
/// Serialized as `""`, `control`, `treatment1` or `treatment2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TeachingPhase {
    /// Not yet assigned (guessing phase just finished)
    #[default]
    Untagged,
    /// Plain caption
    Control,
    /// Prototype patch highlight
    Treatment1,
    /// Prototype rectangle highlight
    Treatment2,
}

impl TeachingPhase {
    /// The three assignable treatments, in display order.
    pub const CHOICES: [Self; 3] = [Self::Control, Self::Treatment1, Self::Treatment2];

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Untagged => "",
            Self::Control => "control",
            Self::Treatment1 => "treatment1",
            Self::Treatment2 => "treatment2",
        }
    }

    /// Whether a treatment has been assigned
    #[must_use]
    pub const fn is_tagged(self) -> bool {
        !matches!(self, Self::Untagged)
    }
}

impl fmt::Display for TeachingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TeachingPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(Self::Untagged),
            "control" => Ok(Self::Control),
            "treatment1" => Ok(Self::Treatment1),
            "treatment2" => Ok(Self::Treatment2),
            other => Err(format!("unknown teaching phase '{other}'")),
        }
    }
}

impl TryFrom<String> for TeachingPhase {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TeachingPhase> for String {
    fn from(phase: TeachingPhase) -> Self {
        phase.as_str().to_string()
    }
}

/// One participant answer for one class.
///
/// Created during guessing, then tagged with the teaching phase and filled
/// with the testing outcome. Column names match the persisted table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessRecord {
    /// 1-based position in the guessing sequence
    #[serde(rename = "index")]
    pub trial_index: usize,
    /// Participant number, unique across the table
    #[serde(rename = "user_id")]
    pub participant_id: u64,
    /// Name typed on the welcome screen
    #[serde(rename = "user_name")]
    pub participant_name: String,
    /// Expected class
    #[serde(rename = "class_name")]
    pub class_label: String,
    /// Strongest model prototype for the class, when known
    #[serde(default)]
    pub prototype_id: Option<String>,
    /// Image shown during guessing
    pub image_name: String,
    /// Guess submitted during guessing
    pub user_selection: String,
    /// Treatment assigned after guessing
    #[serde(default)]
    pub teaching_phase: TeachingPhase,
    /// Class of the image shown during testing
    #[serde(default)]
    pub testing_phase_class_shown: Option<String>,
    /// Answer submitted during testing
    #[serde(default)]
    pub testing_phase_user_answer: Option<String>,
}

impl GuessRecord {
    /// Dedup key of the persisted table: (class, participant name).
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.class_label, &self.participant_name)
    }

    /// Testing answer matches the expected class.
    #[must_use]
    pub fn correct_testing(&self) -> bool {
        self.testing_phase_user_answer.as_deref() == Some(self.class_label.as_str())
    }

    /// Guessing answer matches the expected class.
    #[must_use]
    pub fn correct_in_teaching(&self) -> bool {
        self.user_selection == self.class_label
    }
}
