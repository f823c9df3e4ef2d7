//! Chat session model
//!
//! Pure data and pure state transitions. Nothing in this module performs I/O;
//! the store in [`crate::store`] applies transitions and executes effects.

mod effect;
pub mod event;
pub mod message;
pub mod settings;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{Event, ImportPolicy};
pub use message::{ContentType, Message, MessageMetadata, MessageStatus, Role};
pub use settings::{Features, FeaturesPatch, MessageStyle, Settings, SettingsPatch, Theme};
pub use state::{PersistedState, SessionState};
pub use transition::{transition, TransitionError, TransitionResult};
