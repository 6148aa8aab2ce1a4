//! Application module: the TUI view state and its key bindings.
//!
//! `App` only holds what the session does not: the list cursor, the add-path
//! prompt and a one-line notice. Keys are turned into [`Action`]s here and
//! executed by the runtime.

mod input;
mod model;

pub use input::Action;
pub use model::*;
