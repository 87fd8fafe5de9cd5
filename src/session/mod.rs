//! Session Management: state, phase transitions, and the session registry
//!
//! # Components
//! - `record.rs`: `GuessRecord` and the `TeachingPhase` tag
//! - `state.rs`: `SessionState` and the `Phase` enum
//! - `controller.rs`: `PhaseController`, the study state machine
//! - `view.rs`: `SessionView` and teaching content for the front end
//! - `store.rs`: `SessionRegistry`, sessions keyed by id

pub mod controller;
pub mod record;
pub mod state;
pub mod store;
pub mod view;

pub use controller::{Outcome, PhaseController, Submission};
pub use record::{GuessRecord, TeachingPhase, DONT_KNOW};
pub use state::{Phase, SessionId, SessionState};
pub use store::SessionRegistry;
pub use view::{Highlight, SessionView, TeachingContent, TeachingItem, TeachingMaterial};
