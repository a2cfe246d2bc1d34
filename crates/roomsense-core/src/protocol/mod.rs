//! Protocol module containing the frame type and its JSON codec.

pub mod frame;

pub use frame::{now_ms, Frame, FrameError};
