pub mod config;
pub mod ddragon;
pub mod game;
pub mod lcu;
pub mod protocol;
