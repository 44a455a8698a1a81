//! Conversation orchestration
//!
//! `ChatSession` drives one query through the model/tool loop:
//!
//! ```text
//!   user query ─► AwaitingModel ─► HaveTurn ─┬─ no tool uses ─► Done
//!                      ▲                     │
//!                      └──── Dispatching ◄───┘ tool uses (in order)
//! ```

mod error;
mod session;

pub use error::{ChatError, ChatResult};
pub use session::{ChatEvent, ChatSession, QueryOutcome, QueryState};
