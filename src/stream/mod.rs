//! Client-side streaming: incremental decoding and cancellable sessions

pub mod channel;
pub mod decoder;

pub use channel::{CancelHandle, HandlerId, StreamChannel, NETWORK_ERROR_CODE};
pub use decoder::StreamDecoder;
