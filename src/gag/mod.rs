//! Pun gag triggers
//!
//! Every gag in a scene is the same state machine with a different
//! `Condition`: thrown hard enough, let go high enough, clicked enough,
//! left somewhere long enough, lying tilted, turned to an angle, or handed
//! over to a receiver.

pub mod config;
pub mod machine;

pub use config::{Condition, FadeOut, GagConfig, ItemFate, Rearm};
pub use machine::{ClickStage, Gag, GagEvent, GagId, GagPhase};
