pub mod driver;
pub mod format;
pub mod phase;
pub mod state;
pub mod synth;
pub mod teams;

pub use state::MatchState;
