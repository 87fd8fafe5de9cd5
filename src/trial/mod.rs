//! Trial Provider
//!
//! Resolves one representative image per class label from a directory tree
//! laid out as `<root>/<class_label>/<image files>`.
//!
//! ## Degrade policy
//!
//! A class whose folder is missing, unreadable or holds no regular files is
//! skipped: the session simply gets fewer trials. Nothing here returns an
//! error.
//!
//! ## Example
//!
//! ```rust,no_run
//! use xai_study::trial::{SelectionStrategy, TrialProvider};
//!
//! let provider = TrialProvider::new(SelectionStrategy::First, true);
//! let labels = vec!["Gadwall".to_string(), "Mallard".to_string()];
//! let trials = provider.prepare_trials(&labels, "data/images/train");
//! for trial in &trials {
//!     println!("{} -> {}", trial.class_label(), trial.image_name());
//! }
//! ```

pub mod catalog;

pub use catalog::{PredictionCatalog, PredictionRow};

use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Category identifier (a bird species, a car brand, ...)
pub type ClassLabel = String;

/// How one image is picked inside a class folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStrategy {
    /// First file by name
    #[default]
    First,
    /// Uniformly random file
    Random,
}

/// One (image, expected class) pairing shown to a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    class_label: ClassLabel,
    image_path: PathBuf,
    image_name: String,
    prototype_id: Option<String>,
}

impl Trial {
    /// Create a trial; `image_name` is the final path component.
    #[must_use]
    pub fn new(class_label: impl Into<String>, image_path: impl Into<PathBuf>) -> Self {
        let image_path = image_path.into();
        let image_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            class_label: class_label.into(),
            image_path,
            image_name,
            prototype_id: None,
        }
    }

    /// Attach the model prototype most associated with this class.
    #[must_use]
    pub fn with_prototype_id(mut self, prototype_id: impl Into<String>) -> Self {
        self.prototype_id = Some(prototype_id.into());
        self
    }

    /// Expected class
    #[must_use]
    pub fn class_label(&self) -> &str {
        &self.class_label
    }

    /// Full path of the image
    #[must_use]
    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    /// File name of the image
    #[must_use]
    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    /// Prototype id, when the class came from the prediction catalog
    #[must_use]
    pub fn prototype_id(&self) -> Option<&str> {
        self.prototype_id.as_deref()
    }
}

/// Builds trial lists from class folders.
#[derive(Debug, Clone, Copy)]
pub struct TrialProvider {
    selection: SelectionStrategy,
    shuffle: bool,
}

impl Default for TrialProvider {
    fn default() -> Self {
        Self::new(SelectionStrategy::First, true)
    }
}

impl TrialProvider {
    /// Create a provider
    #[must_use]
    pub const fn new(selection: SelectionStrategy, shuffle: bool) -> Self {
        Self { selection, shuffle }
    }

    /// Image selection strategy in use
    #[must_use]
    pub const fn selection(&self) -> SelectionStrategy {
        self.selection
    }

    /// Whether trial order is shuffled
    #[must_use]
    pub const fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Guessing-phase trials: one image per class under `image_root`.
    #[must_use]
    pub fn prepare_trials<P: AsRef<Path>>(&self, labels: &[ClassLabel], image_root: P) -> Vec<Trial> {
        self.prepare_trials_with_rng(labels, image_root, &mut rand::thread_rng())
    }

    /// As [`prepare_trials`](Self::prepare_trials) with a caller-supplied RNG.
    pub fn prepare_trials_with_rng<P, R>(
        &self,
        labels: &[ClassLabel],
        image_root: P,
        rng: &mut R,
    ) -> Vec<Trial>
    where
        P: AsRef<Path>,
        R: Rng + ?Sized,
    {
        let root = image_root.as_ref();
        let mut seen = HashSet::new();
        let mut trials: Vec<Trial> = labels
            .iter()
            .filter(|label| seen.insert(label.as_str()))
            .filter_map(|label| {
                let files = list_images(&root.join(label));
                let picked = match self.selection {
                    SelectionStrategy::First => files.into_iter().next(),
                    SelectionStrategy::Random => files.into_iter().choose(&mut *rng),
                };
                picked.map(|path| Trial::new(label.clone(), path))
            })
            .collect();

        if self.shuffle {
            trials.shuffle(rng);
        }

        debug!(
            "Prepared {} of {} trials from {}",
            trials.len(),
            labels.len(),
            root.display()
        );
        trials
    }

    /// Testing-phase trials: an independently random image per class from a
    /// separate pool, always picked at random.
    #[must_use]
    pub fn prepare_test_trials<P: AsRef<Path>>(&self, labels: &[ClassLabel], test_root: P) -> Vec<Trial> {
        self.prepare_test_trials_with_rng(labels, test_root, &mut rand::thread_rng())
    }

    /// As [`prepare_test_trials`](Self::prepare_test_trials) with a caller-supplied RNG.
    pub fn prepare_test_trials_with_rng<P, R>(
        &self,
        labels: &[ClassLabel],
        test_root: P,
        rng: &mut R,
    ) -> Vec<Trial>
    where
        P: AsRef<Path>,
        R: Rng + ?Sized,
    {
        Self::new(SelectionStrategy::Random, self.shuffle).prepare_trials_with_rng(labels, test_root, rng)
    }
}

/// Regular files in `dir`, sorted by name. Missing directory → empty.
fn list_images(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        debug!("Skipping missing class folder {}", dir.display());
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.path())
        .collect();
    files.sort();

    if files.is_empty() {
        debug!("Skipping empty class folder {}", dir.display());
    }
    files
}
