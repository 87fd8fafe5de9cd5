//! Study facade: configuration, trial preparation, sessions and persistence
//! wired together behind session-id based calls.

use crate::config::StudyConfig;
use crate::recorder::{InteractionLog, ResponseRecorder};
use crate::session::{
    PhaseController, SessionId, SessionRegistry, SessionState, SessionView, Submission,
    TeachingMaterial,
};
use crate::trial::{PredictionCatalog, Trial, TrialProvider};
use crate::{Error, Result};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// A running study.
pub struct Study {
    config: StudyConfig,
    provider: TrialProvider,
    material: TeachingMaterial,
    controller: PhaseController<ResponseRecorder>,
    sessions: SessionRegistry,
}

impl Study {
    /// Create a new study builder
    #[must_use]
    pub fn builder() -> StudyBuilder {
        StudyBuilder::default()
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Live sessions
    #[must_use]
    pub const fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Response table recorder
    #[must_use]
    pub fn recorder(&self) -> &ResponseRecorder {
        self.controller.sink()
    }

    /// Start a session: fix its trial list and register it.
    pub fn start_session(&self) -> SessionView {
        let state = SessionState::new(self.prepare_session_trials());
        info!(
            "Session {} started with {} trials",
            state.session_id(),
            state.trials().len()
        );
        self.controller.record_event(
            &state,
            "session_started",
            &json!({ "classes": state.class_labels() }),
        );
        let view = SessionView::render(&state, &self.material);
        self.sessions.insert(state);
        view
    }

    /// Apply a participant submission and return the resulting view.
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionNotFound` for an unknown id, or a storage error
    /// if persisting the table fails
    pub fn submit(&self, id: &SessionId, submission: Submission) -> Result<SessionView> {
        self.sessions.update(id, |state| {
            self.controller.submit(state, submission)?;
            Ok(SessionView::render(state, &self.material))
        })
    }

    /// Current view of a session.
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionNotFound` for an unknown id
    pub fn view(&self, id: &SessionId) -> Result<SessionView> {
        self.sessions
            .snapshot(id)
            .map(|state| SessionView::render(&state, &self.material))
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Path of the image currently on screen for a session.
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionNotFound` for an unknown id
    pub fn current_image(&self, id: &SessionId) -> Result<Option<PathBuf>> {
        let state = self
            .sessions
            .snapshot(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        Ok(state.current_trial().map(|t| t.image_path().to_path_buf()))
    }

    fn prepare_session_trials(&self) -> Vec<Trial> {
        let Some(catalog) = self.material.catalog() else {
            return self
                .provider
                .prepare_trials(&self.config.class_labels, &self.config.image_root);
        };

        let labels = catalog.sample_labels(self.config.sample_size, &mut rand::thread_rng());
        self.provider
            .prepare_trials(&labels, &self.config.image_root)
            .into_iter()
            .map(|trial| match catalog.top_prototype(trial.class_label()) {
                Some(row) => {
                    let id = row.prototype_id.clone();
                    trial.with_prototype_id(id)
                }
                None => trial,
            })
            .collect()
    }
}

/// Study builder
#[derive(Debug, Default)]
pub struct StudyBuilder {
    config: StudyConfig,
    interaction_log: bool,
}

impl StudyBuilder {
    /// Use `config`
    #[must_use]
    pub fn config(mut self, config: StudyConfig) -> Self {
        self.config = config;
        self
    }

    /// Write a timestamped interaction log under `config.log_dir`
    #[must_use]
    pub fn interaction_log(mut self, enabled: bool) -> Self {
        self.interaction_log = enabled;
        self
    }

    /// Build the study.
    ///
    /// A configured but unreadable prediction table is skipped with a
    /// warning; sessions then use the fixed label list.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if neither labels nor a prediction table
    /// are configured, or an I/O error if the interaction log cannot be created
    pub fn build(self) -> Result<Study> {
        let config = self.config;
        if config.class_labels.is_empty() && config.predictions_path.is_none() {
            return Err(Error::InvalidInput(
                "no class labels and no prediction table configured".to_string(),
            ));
        }
        let catalog = config.predictions_path.as_ref().and_then(|path| {
            match PredictionCatalog::load(path) {
                Ok(catalog) if !catalog.is_empty() => {
                    info!(
                        "Loaded {} predictions ({} classes) from {}",
                        catalog.len(),
                        catalog.class_labels().len(),
                        path.display()
                    );
                    Some(catalog)
                }
                Ok(_) => {
                    warn!("Prediction table {} is empty, using fixed labels", path.display());
                    None
                }
                Err(e) => {
                    warn!("Prediction table {} unavailable ({}), using fixed labels", path.display(), e);
                    None
                }
            }
        });

        let provider = TrialProvider::new(config.selection, config.shuffle);
        let mut controller = PhaseController::new(
            ResponseRecorder::new(config.table_path.clone()),
            provider,
            config.test_image_root.clone(),
        );
        if self.interaction_log {
            let log = InteractionLog::create(&config.log_dir)?;
            info!("Interaction log at {}", log.path().display());
            controller = controller.with_log(Arc::new(log));
        }

        Ok(Study {
            material: TeachingMaterial::new(
                catalog,
                config.prototype_root.clone(),
                config.prototypes_per_class,
            ),
            provider,
            controller,
            sessions: SessionRegistry::new(),
            config,
        })
    }
}
