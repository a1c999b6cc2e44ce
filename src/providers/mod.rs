//! Chunk providers

pub mod live;
pub mod replay;

pub use live::{ChunkSender, LiveProvider};
pub use replay::ReplayProvider;
