//! Board generation and reveal engine for a themed Minesweeper.
//!
//! [`Board`] owns mine placement, adjacency counts and flood-fill reveals.
//! [`GameSession`] drives one game on top of it: deferred placement on the
//! first click, flags, hints, the optional countdown, and win or loss
//! detection, reporting every change as a [`GameEvent`].

pub use asset::*;
pub use board::*;
pub use cell::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use generator::*;
pub use layout::*;
pub use session::*;
pub use timer::*;
pub use types::*;

mod asset;
mod board;
mod cell;
mod config;
mod error;
mod events;
mod generator;
mod layout;
mod session;
mod timer;
mod types;
