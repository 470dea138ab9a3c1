//! Client-side response processing for Courier streams.
//!
//! A consumer feeds each received SSE `data` payload through
//! [`parse_frame`], then applies the resulting [`StreamEvent`] to a
//! [`Transcript`] backed by a [`StateStore`]. The transcript is the
//! ordered conversation log (text, tool exchanges, narration); the
//! store holds named application state that `action` events mutate
//! through registered setters.

pub mod frame;
pub mod state;
pub mod transcript;

pub use courier_types::StreamEvent;
pub use frame::{parse_frame, FrameError};
pub use state::StateStore;
pub use transcript::{Transcript, TranscriptEntry};
