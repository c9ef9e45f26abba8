//! Rule-based intent and entity extraction for the booking chat
//!
//! Everything here is a single pass of regular expressions over the current
//! utterance. The only context carried between turns is the suggestion
//! list, which is derived from the previous turn's analysis.

mod chat;
mod entities;
mod matcher;

pub use chat::*;
pub use entities::*;
pub use matcher::*;
