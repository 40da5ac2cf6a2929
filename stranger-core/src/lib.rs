//! The stranger matchmaking engine.
//!
//! Pairs anonymous sessions for one-on-one chat, relays their messages and
//! enforces the daily limit on filtered searches. The engine never talks to
//! a transport directly. Everything it has to say is pushed as a [Delivery]
//! onto the channel returned by [Matchmaker::events].

mod config;
mod events;
mod ledger;
mod matchmaker;
mod queue;
mod rooms;
mod session;
mod util;

pub use config::*;
pub use events::*;
pub use ledger::*;
pub use matchmaker::*;
pub use queue::*;
pub use rooms::*;
pub use session::*;
pub use util::*;
