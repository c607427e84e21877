//! Text rendering of the remote's observable state.

pub mod status;
