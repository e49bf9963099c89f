//! Tagged configuration requests (spec.md §4.5, §9 design notes).
//!
//! The source's variadic `ctl(request, ...)` call maps to this sum type,
//! dispatched by pattern match in [`crate::Encoder::ctl`] instead of a
//! type-erased variadic.

use crate::config::Application;

/// A request forwarded either to the muxer or to the underlying Opus
/// encoder (spec.md §6 "configuration options").
#[derive(Debug, Clone)]
pub enum Ctl {
    SetDecisionDelay(u64),
    SetMuxingDelay(u64),
    SetCommentPadding(u32),
    SetSerialNumber(u32),
    SetOpusApplication(Application),
    SetOpusBitrate(Option<i32>),
    SetOpusVbr(bool),
    SetOpusComplexity(u8),
    SetOpusFec(bool),
    SetOpusDtx(bool),
    SetOpusLsbDepth(u8),
    SetOpusFrameDurationMs(f32),
}
