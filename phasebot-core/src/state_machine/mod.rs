//! Phase workflow state machine.
//!
//! The design separates:
//! - **Phase model**: where an issue is in the label progression (`phase`)
//! - **Handlers**: pure `(action, comment, snapshot) -> (Outcome, Vec<Effect>)` (`transition`)
//! - **Effects**: what to do, as data (`effect`)
//! - **Notifier**: reply text for each comment effect (`notifier`)
//!
//! The interpreter executes effects against an issue tracker.

pub mod effect;
pub mod interpreter;
pub mod notifier;
pub mod outcome;
pub mod phase;
pub mod transition;

pub use effect::*;
pub use interpreter::execute_effects;
pub use notifier::format_comment_content;
pub use outcome::Outcome;
pub use phase::*;
pub use transition::{plan, Plan};
