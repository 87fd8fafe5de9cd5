//! Study configuration
//!
//! Loaded from a TOML file; every field has a default so a partial (or
//! absent) file still yields a runnable study.

use crate::trial::SelectionStrategy;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Runtime settings for one study deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyConfig {
    /// Root with one sub-directory of images per class (guessing phase)
    #[serde(default = "default_image_root")]
    pub image_root: PathBuf,

    /// Separate image pool for the testing phase
    #[serde(default = "default_test_image_root")]
    pub test_image_root: PathBuf,

    /// Persisted response table
    #[serde(default = "default_table_path")]
    pub table_path: PathBuf,

    /// Directory receiving `study_logs_*.csv` interaction logs
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Model prediction table; when present, labels are sampled from it
    #[serde(default)]
    pub predictions_path: Option<PathBuf>,

    /// Root of `<prototype_id>/prototype.png` images used by the treatments
    #[serde(default = "default_prototype_root")]
    pub prototype_root: PathBuf,

    /// Fixed label list used when no prediction table is configured
    #[serde(default = "default_class_labels")]
    pub class_labels: Vec<String>,

    /// Labels drawn per session from the prediction table
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    /// Prototypes shown per class by the highlight treatments
    #[serde(default = "default_prototypes_per_class")]
    pub prototypes_per_class: usize,

    /// How the guessing-phase image is picked inside a class folder
    #[serde(default)]
    pub selection: SelectionStrategy,

    /// Shuffle trial order
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,

    /// HTTP listen address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_image_root() -> PathBuf {
    PathBuf::from("data/images/train")
}

fn default_test_image_root() -> PathBuf {
    PathBuf::from("data/images/test")
}

fn default_table_path() -> PathBuf {
    PathBuf::from("data/user_guesses.csv")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("data/logs")
}

fn default_prototype_root() -> PathBuf {
    PathBuf::from("data/visualized_prototypes")
}

fn default_class_labels() -> Vec<String> {
    [
        "Black_footed_Albatross",
        "Gadwall",
        "Mallard",
        "Northern_Flicker",
        "Red_winged_Blackbird",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

const fn default_sample_size() -> usize {
    5
}

const fn default_prototypes_per_class() -> usize {
    5
}

const fn default_shuffle() -> bool {
    true
}

fn default_bind_addr() -> String {
    "127.0.0.1:8050".to_string()
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            image_root: default_image_root(),
            test_image_root: default_test_image_root(),
            table_path: default_table_path(),
            log_dir: default_log_dir(),
            predictions_path: None,
            prototype_root: default_prototype_root(),
            class_labels: default_class_labels(),
            sample_size: default_sample_size(),
            prototypes_per_class: default_prototypes_per_class(),
            selection: SelectionStrategy::default(),
            shuffle: default_shuffle(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl StudyConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the document is not valid TOML for this schema
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded study config from {}", path.display());
        Ok(config)
    }

    /// Load from `path` when given, otherwise defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a given file cannot be read or parsed
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Set the guessing-phase image root
    #[must_use]
    pub fn with_image_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.image_root = root.into();
        self
    }

    /// Set the testing-phase image root
    #[must_use]
    pub fn with_test_image_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.test_image_root = root.into();
        self
    }

    /// Set the persisted table path
    #[must_use]
    pub fn with_table_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.table_path = path.into();
        self
    }

    /// Set the interaction log directory
    #[must_use]
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Set the fixed class label list
    #[must_use]
    pub fn with_class_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable trial shuffling
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Set the guessing-phase image selection strategy
    #[must_use]
    pub fn with_selection(mut self, selection: SelectionStrategy) -> Self {
        self.selection = selection;
        self
    }
}
