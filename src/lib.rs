//! Encoder pipeline and Ogg page packer for muxing PCM audio into Ogg
//! Opus files.
//!
//! The entry point is [`Encoder`]: push PCM in with
//! [`Encoder::write_float`]/[`Encoder::write_int16`], call
//! [`Encoder::drain`] to finalize, then [`Encoder::destroy`]. [`packer`]
//! is also usable standalone for callers who want to drive Ogg pages
//! directly.

pub mod comment;
pub mod config;
pub mod crc;
pub mod ctl;
mod encoder;
pub mod error;
pub mod header;
pub mod lpc;
pub mod packer;
pub mod resample;
pub mod rng;
pub mod sink;
pub mod staging;
pub mod stream;

pub use comment::CommentBuilder;
pub use config::EncoderSettings;
pub use ctl::Ctl;
pub use encoder::Encoder;
pub use error::{Error, ErrorCode, Result};
pub use sink::{FileSink, MemorySink, Sink};
