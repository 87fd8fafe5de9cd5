//! View model handed to the front end after every interaction.
//!
//! The front end renders what it receives here; it never inspects
//! [`SessionState`] directly.

use super::record::{TeachingPhase, DONT_KNOW};
use super::state::{Phase, SessionState};
use crate::trial::{PredictionCatalog, Trial};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Message shown once the guessing phase is recorded.
pub const GUESSING_DONE_MESSAGE: &str =
    "Thank you for participating! Your responses have been recorded.";

/// Message shown at the end of the testing phase.
pub const TESTING_DONE_MESSAGE: &str =
    "Testing phase complete. Thank you for taking part in the study!";

const WELCOME_MESSAGE: &str =
    "You will be shown a few images. Enter your name, then try to guess the class of each one.";

/// Highlight style of a treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    /// Caption only
    None,
    /// Prototype patches overlaid on the image
    Patch,
    /// Rectangles around prototype regions
    Rectangle,
}

impl From<TeachingPhase> for Highlight {
    fn from(phase: TeachingPhase) -> Self {
        match phase {
            TeachingPhase::Untagged | TeachingPhase::Control => Self::None,
            TeachingPhase::Treatment1 => Self::Patch,
            TeachingPhase::Treatment2 => Self::Rectangle,
        }
    }
}

/// Teaching material for one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeachingItem {
    /// Class being taught
    pub class_label: String,
    /// Image the participant guessed on
    pub image_name: String,
    /// Caption under the image
    pub caption: String,
    /// Prototype images to highlight (empty for control)
    pub prototype_images: Vec<PathBuf>,
}

/// Teaching content for a chosen treatment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeachingContent {
    /// Chosen treatment
    pub teaching: TeachingPhase,
    /// Highlight style
    pub highlight: Highlight,
    /// One item per guessing trial
    pub items: Vec<TeachingItem>,
}

/// Source of prototype images for the highlight treatments.
#[derive(Debug, Clone, Default)]
pub struct TeachingMaterial {
    catalog: Option<PredictionCatalog>,
    prototype_root: PathBuf,
    per_class: usize,
}

impl TeachingMaterial {
    /// Create teaching material
    #[must_use]
    pub fn new(
        catalog: Option<PredictionCatalog>,
        prototype_root: impl Into<PathBuf>,
        per_class: usize,
    ) -> Self {
        Self {
            catalog,
            prototype_root: prototype_root.into(),
            per_class,
        }
    }

    /// Prediction catalog, when configured
    #[must_use]
    pub const fn catalog(&self) -> Option<&PredictionCatalog> {
        self.catalog.as_ref()
    }

    /// `<prototype_root>/<prototype_id>/prototype.png`
    #[must_use]
    pub fn prototype_image_path(&self, prototype_id: &str) -> PathBuf {
        self.prototype_root.join(prototype_id).join("prototype.png")
    }

    /// Build the content of `teaching` for the given trials.
    #[must_use]
    pub fn content(&self, teaching: TeachingPhase, trials: &[Trial]) -> TeachingContent {
        let highlight = Highlight::from(teaching);
        let items = trials
            .iter()
            .map(|trial| {
                let prototype_images = match (highlight, &self.catalog) {
                    (Highlight::None, _) | (_, None) => Vec::new(),
                    (_, Some(catalog)) => catalog
                        .top_prototypes(trial.class_label(), self.per_class)
                        .iter()
                        .map(|row| self.prototype_image_path(&row.prototype_id))
                        .collect(),
                };
                TeachingItem {
                    class_label: trial.class_label().to_string(),
                    image_name: trial.image_name().to_string(),
                    caption: format!("This is a {}.", trial.class_label().replace('_', " ")),
                    prototype_images,
                }
            })
            .collect();

        TeachingContent {
            teaching,
            highlight,
            items,
        }
    }
}

/// Everything the front end needs to draw the current screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    /// Session id
    pub session_id: String,
    /// Current phase
    pub phase: Phase,
    /// "Trial i/N" while a trial is on screen
    pub trial_header: Option<String>,
    /// Image on screen
    pub image_name: Option<String>,
    /// Dropdown options while a trial is on screen
    pub choices: Vec<String>,
    /// Status message
    pub message: Option<String>,
    /// Treatments offered once guessing is complete
    pub teaching_options: Vec<TeachingPhase>,
    /// Teaching content of the chosen treatment
    pub teaching: Option<TeachingContent>,
    /// Whether the "proceed to testing" action is visible
    pub show_proceed: bool,
}

impl SessionView {
    /// Render the view of `state`.
    #[must_use]
    pub fn render(state: &SessionState, material: &TeachingMaterial) -> Self {
        let trial = state.current_trial();
        let trial_header = match state.phase {
            Phase::Guessing { index } | Phase::Testing { index } if trial.is_some() => {
                Some(format!("Trial {}/{}", index + 1, state.phase_trial_count()))
            }
            _ => None,
        };
        let choices = if trial.is_some() {
            let mut choices = state.class_labels();
            choices.sort();
            choices.push(DONT_KNOW.to_string());
            choices
        } else {
            Vec::new()
        };
        let message = match state.phase {
            Phase::Welcome => Some(WELCOME_MESSAGE.to_string()),
            Phase::Completed | Phase::TeachingSelected { .. } => {
                Some(GUESSING_DONE_MESSAGE.to_string())
            }
            Phase::TestingCompleted => Some(TESTING_DONE_MESSAGE.to_string()),
            Phase::Guessing { .. } | Phase::Testing { .. } => None,
        };
        let teaching_options = match state.phase {
            Phase::Completed | Phase::TeachingSelected { .. } => TeachingPhase::CHOICES.to_vec(),
            _ => Vec::new(),
        };
        let (teaching, show_proceed) = match state.phase {
            Phase::TeachingSelected { teaching } => {
                (Some(material.content(teaching, state.trials())), true)
            }
            _ => (None, false),
        };

        Self {
            session_id: state.session_id().to_string(),
            phase: state.phase,
            trial_header,
            image_name: trial.map(|t| t.image_name().to_string()),
            choices,
            message,
            teaching_options,
            teaching,
            show_proceed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::PredictionRow;

    fn trials() -> Vec<Trial> {
        vec![
            Trial::new("Red_winged_Blackbird", "r.jpg"),
            Trial::new("Gadwall", "g.jpg"),
        ]
    }

    fn material() -> TeachingMaterial {
        let catalog = PredictionCatalog::new(vec![
            PredictionRow {
                class_name: "Gadwall".to_string(),
                prototype_id: "12".to_string(),
                activation_score: 0.9,
            },
            PredictionRow {
                class_name: "Gadwall".to_string(),
                prototype_id: "40".to_string(),
                activation_score: 0.4,
            },
        ]);
        TeachingMaterial::new(Some(catalog), "/protos", 1)
    }

    #[test]
    fn test_control_has_captions_only() {
        let content = material().content(TeachingPhase::Control, &trials());
        assert_eq!(content.highlight, Highlight::None);
        assert_eq!(content.items[0].caption, "This is a Red winged Blackbird.");
        assert!(content.items.iter().all(|i| i.prototype_images.is_empty()));
    }

    #[test]
    fn test_treatment_uses_top_prototypes() {
        let content = material().content(TeachingPhase::Treatment2, &trials());
        assert_eq!(content.highlight, Highlight::Rectangle);
        assert!(content.items[0].prototype_images.is_empty());
        assert_eq!(
            content.items[1].prototype_images,
            vec![PathBuf::from("/protos/12/prototype.png")]
        );
    }

    #[test]
    fn test_render_guessing_view() {
        let mut state = SessionState::new(trials());
        state.phase = Phase::Guessing { index: 0 };
        let view = SessionView::render(&state, &TeachingMaterial::default());

        assert_eq!(view.trial_header.as_deref(), Some("Trial 1/2"));
        assert_eq!(view.image_name.as_deref(), Some("r.jpg"));
        assert_eq!(view.choices, vec!["Gadwall", "Red_winged_Blackbird", DONT_KNOW]);
        assert!(!view.show_proceed);
    }

    #[test]
    fn test_render_teaching_view() {
        let mut state = SessionState::new(trials());
        state.phase = Phase::TeachingSelected {
            teaching: TeachingPhase::Treatment1,
        };
        let view = SessionView::render(&state, &material());

        assert!(view.show_proceed);
        assert_eq!(view.teaching.unwrap().highlight, Highlight::Patch);
        assert_eq!(view.message.as_deref(), Some(GUESSING_DONE_MESSAGE));
    }
}
