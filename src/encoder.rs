//! The encoder core: orchestrates write → resample → stage → encode → mux
//! (spec.md §4.5). This is the largest module in the crate and the one
//! with no single teacher file to crib from line-for-line; it is grounded
//! on the *shape* of `quark-zju-sndcat`'s `OggWriter` in `output/opus.rs`
//! (owns the codec, a sample buffer, and an Ogg writer; exposes a
//! `write`/`close` pair) generalized to the chaining state machine and
//! muxing discipline spec.md §4.5 and §4.6 name.

use std::collections::VecDeque;

use crate::comment::CommentBuilder;
use crate::config::{Application, EncoderSettings};
use crate::ctl::Ctl;
use crate::error::{Error, Result};
use crate::lpc;
use crate::packer::OggPacker;
use crate::resample::{normalize_i16, Resampler};
use crate::rng::{SerialSource, ThreadRngSerialSource};
use crate::sink::Sink;
use crate::staging::StagingBuffer;
use crate::stream::{Stream, StreamList};

/// Generous upper bound on one Opus packet's encoded size.
const MAX_PACKET_BYTES: usize = 4000;
/// Default `ENCODER` comment tag value, injected into every stream's
/// comment block the way `libopusenc`'s `opusenc.c` always injects one at
/// stream creation via `comment_add(..., "ENCODER", encoder_string)`.
const ENCODER_TAG: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));
/// Algorithmic pre-skip applied to the very first stream, in 48 kHz
/// samples. 80 ms, the value `libopusenc` uses for its default encoder
/// look-ahead at complexity settings typical of this crate's default.
const DEFAULT_PRE_SKIP: u16 = 3840;

fn frame_size_from_ms(ms: f32) -> usize {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let samples = (48_000.0 * ms / 1000.0).round() as usize;
    samples.max(1)
}

fn ceil_div(a: u64, b: u64) -> u64 {
    (a + b - 1) / b
}

fn to_audiopus_application(app: Application) -> audiopus::Application {
    match app {
        Application::Voip => audiopus::Application::Voip,
        Application::Audio => audiopus::Application::Audio,
        Application::LowDelay => audiopus::Application::LowDelay,
    }
}

/// Orchestrates the full write → resample → stage → encode → mux pipeline
/// for a single (possibly chained) physical Ogg Opus file.
pub struct Encoder {
    opus: audiopus::coder::Encoder,
    resampler: Resampler,
    staging: StagingBuffer,
    streams: StreamList,
    packer: Option<OggPacker>,
    /// Frames emitted by the codec so far, in 48 kHz units, shared across
    /// every stream in this physical file (spec.md §3 "Encoder").
    current_granule: u64,
    input_rate: u32,
    channels: usize,
    frame_size: usize,
    settings: EncoderSettings,
    pending_header_pre_skip: u16,
    prediction_disabled: bool,
    chaining_keyframe: Option<Vec<u8>>,
    unrecoverable: bool,
    serial_source: Box<dyn SerialSource>,
    pending_serial_override: Option<u32>,
    packet_callback: Option<Box<dyn FnMut(&[u8], bool) + Send>>,
    /// Pull-mode output queue; in push mode this stays empty and pages go
    /// straight to each stream's sink as they complete.
    pull_mode: bool,
    pull_queue: VecDeque<Vec<u8>>,
}

impl Encoder {
    /// Creates an encoder for a new physical file, with the first stream's
    /// sink already attached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadArg`] for unsupported channel counts or invalid
    /// settings, or [`Error::Codec`] if the Opus encoder cannot be built.
    pub fn new(
        channels: usize,
        input_rate: u32,
        sink: Box<dyn Sink>,
        close_at_end: bool,
        pull_mode: bool,
        settings: EncoderSettings,
    ) -> Result<Self> {
        settings.validate()?;
        let channels_enum = match channels {
            1 => audiopus::Channels::Mono,
            2 => audiopus::Channels::Stereo,
            _ => return Err(Error::BadArg("only mono or stereo is supported")),
        };
        let mut opus = audiopus::coder::Encoder::new(
            audiopus::SampleRate::Hz48000,
            channels_enum,
            to_audiopus_application(settings.opus.application),
        )?;
        opus.set_vbr(settings.opus.vbr)?;
        if let Some(bitrate) = settings.opus.bitrate {
            opus.set_bitrate(audiopus::Bitrate::BitsPerSecond(bitrate))?;
        }
        opus.set_complexity(i32::from(settings.opus.complexity))?;
        opus.set_inband_fec(settings.opus.fec)?;
        opus.set_dtx(settings.opus.dtx)?;
        opus.set_lsb_depth(i32::from(settings.opus.lsb_depth))?;

        let frame_size = frame_size_from_ms(settings.opus.frame_duration_ms);
        let resampler = Resampler::new(channels, input_rate, None)?;

        let mut streams = StreamList::new();
        streams.push_tail(Stream::new(sink, close_at_end));

        log::debug!("encoder created: {channels} channel(s), {input_rate}hz input, frame_size {frame_size}");

        Ok(Self {
            opus,
            resampler,
            staging: StagingBuffer::new(channels),
            streams,
            packer: None,
            current_granule: 0,
            input_rate,
            channels,
            frame_size,
            settings,
            pending_header_pre_skip: DEFAULT_PRE_SKIP,
            prediction_disabled: false,
            chaining_keyframe: None,
            unrecoverable: false,
            serial_source: Box::<ThreadRngSerialSource>::default(),
            pending_serial_override: None,
            packet_callback: None,
            pull_mode,
            pull_queue: VecDeque::new(),
        })
    }

    fn check_not_unrecoverable(&self) -> Result<()> {
        if self.unrecoverable {
            return Err(Error::Unrecoverable);
        }
        Ok(())
    }

    fn latch_unrecoverable<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.unrecoverable = true;
        }
        result
    }

    /// Writes interleaved float PCM at the encoder's configured input
    /// rate. `frames` is signed to preserve the BAD_ARG contract for a
    /// negative frame count (spec.md §4.5).
    ///
    /// # Errors
    ///
    /// [`Error::BadArg`] on a negative or mismatched frame count,
    /// [`Error::Unrecoverable`] if a prior operation latched that state.
    pub fn write_float(&mut self, pcm: &[f32], frames: i64) -> Result<()> {
        self.check_not_unrecoverable()?;
        let frames = self.validated_frame_count(pcm.len(), frames)?;
        let result = self.write_common(pcm, frames);
        self.latch_unrecoverable(result)
    }

    /// Writes interleaved 16-bit PCM, normalized to float internally.
    ///
    /// # Errors
    ///
    /// See [`Encoder::write_float`].
    pub fn write_int16(&mut self, pcm: &[i16], frames: i64) -> Result<()> {
        self.check_not_unrecoverable()?;
        let frames = self.validated_frame_count(pcm.len(), frames)?;
        let normalized = normalize_i16(pcm);
        let result = self.write_common(&normalized, frames);
        self.latch_unrecoverable(result)
    }

    fn validated_frame_count(&self, pcm_len: usize, frames: i64) -> Result<usize> {
        if frames < 0 {
            return Err(Error::BadArg("frame count must not be negative"));
        }
        #[allow(clippy::cast_sign_loss)]
        let frames = frames as usize;
        if pcm_len != frames * self.channels {
            return Err(Error::BadArg("pcm length does not match frames * channels"));
        }
        Ok(frames)
    }

    fn write_common(&mut self, pcm: &[f32], frames: usize) -> Result<()> {
        self.freeze_tail_header();
        // Only the stream that is both head and tail initializes eagerly.
        // Once `chain_current` has queued a successor, that successor's ID
        // header and comment packets must wait for `cross_chain_boundary`
        // to actually reach it (spec.md §4.5: initialization is triggered
        // by "the next encoded frame belonging to the new stream", not by
        // the next write call) — otherwise the outgoing head's still
        // unencoded backlog gets misattributed to the new stream's serial.
        if self.streams.head_is_tail() {
            self.ensure_tail_initialized()?;
        }

        if let Some(tail) = self.streams.tail_mut() {
            tail.advance_write_granule(frames as u64);
        }

        let resampled = self.resampler.process(pcm)?;
        self.feed_staging(&resampled)
    }

    fn freeze_tail_header(&mut self) {
        if let Some(tail) = self.streams.tail_mut() {
            tail.freeze_header();
        }
    }

    fn feed_staging(&mut self, samples: &[f32]) -> Result<()> {
        let channels = self.channels;
        let total_frames = samples.len() / channels;
        let mut offset = 0;
        while offset < total_frames {
            self.staging.shift_if_full();
            let room = self.staging.remaining_capacity();
            if room == 0 {
                return Err(Error::Internal("staging buffer has no room after a shift"));
            }
            let take = room.min(total_frames - offset);
            self.staging.append(&samples[offset * channels..(offset + take) * channels]);
            offset += take;
            self.run_encode_loop()?;
        }
        Ok(())
    }

    /// Stream initialization helper (spec.md §4.5): assigns a serial
    /// number if needed, chains or creates the packer, pads the comment
    /// block, and commits the ID header and comment packets each alone on
    /// their own page.
    fn ensure_tail_initialized(&mut self) -> Result<()> {
        if self.streams.tail().is_some_and(Stream::stream_initialized) {
            return Ok(());
        }

        let serial = {
            let tail = self.streams.tail_mut().ok_or(Error::Internal("no tail stream"))?;
            if tail.serial().is_none() {
                let serial =
                    self.pending_serial_override.take().unwrap_or_else(|| self.serial_source.next_serial());
                tail.set_serial(serial);
            }
            tail.serial().expect("serial was just set")
        };

        match &mut self.packer {
            Some(packer) => packer.chain(serial)?,
            None => {
                let mut packer = OggPacker::new(serial);
                packer.set_muxing_delay(self.settings.muxing_delay);
                self.packer = Some(packer);
            },
        }
        log::debug!("stream {serial} initializing");

        let header_bytes = self.header_info().serialize()?;
        let comment_bytes = {
            let tail = self.streams.tail_mut().ok_or(Error::Internal("no tail stream"))?;
            let comment = tail.comment_mut()?;
            comment.set_padding(self.settings.comment_padding);
            comment.add_tag("ENCODER", ENCODER_TAG)?;
            tail.comment().build()
        };

        let packer = self.packer.as_mut().ok_or(Error::Internal("packer missing"))?;
        packer.reserve_packet(header_bytes.len())?.copy_from_slice(&header_bytes);
        packer.commit_packet(header_bytes.len(), 0, false)?;
        packer.flush_page()?;

        packer.reserve_packet(comment_bytes.len())?.copy_from_slice(&comment_bytes);
        packer.commit_packet(comment_bytes.len(), 0, false)?;
        packer.flush_page()?;

        self.drain_ready_pages()?;

        if let Some(tail) = self.streams.tail_mut() {
            tail.mark_initialized();
        }
        Ok(())
    }

    fn header_info(&self) -> crate::header::HeaderInfo {
        #[allow(clippy::cast_possible_truncation)]
        let channels = self.channels as u8;
        crate::header::HeaderInfo {
            channels,
            pre_skip: self.pending_header_pre_skip,
            input_sample_rate: self.input_rate,
            output_gain_q7_8: 0,
            mapping: crate::header::ChannelMapping::Family0,
        }
    }

    /// The encode loop (spec.md §4.5): while the staging buffer holds more
    /// than `frame_size + decision_delay` samples, encode one frame.
    fn run_encode_loop(&mut self) -> Result<()> {
        let threshold = self.frame_size as u64 + self.settings.decision_delay;
        while self.staging.available() as u64 > threshold {
            self.encode_one_frame()?;
        }
        self.staging.shift_if_full();
        Ok(())
    }

    fn encode_one_frame(&mut self) -> Result<()> {
        let frame_size = self.frame_size;
        let channels = self.channels;
        let input_rate = u64::from(self.input_rate);

        // The packet being produced here always belongs to the head
        // stream (spec.md §4.6: "head receives encoded packets"), so its
        // EOS threshold is the head's own write granule, not the tail's
        // (which may already be a different, still-growing successor
        // stream during the frame that crosses a chain boundary).
        let head_end_granule =
            self.streams.head().ok_or(Error::Internal("no head stream"))?.end_granule();
        let end_granule_48k =
            ceil_div(head_end_granule * 48_000, input_rate) + u64::from(self.pending_header_pre_skip);

        let has_successor = !self.streams.head_is_tail();
        let next_frame_granule = self.current_granule + frame_size as u64;
        let is_chain_keyframe = has_successor && next_frame_granule >= end_granule_48k;

        if is_chain_keyframe && !self.prediction_disabled {
            self.opus.set_prediction_disabled(true)?;
        }

        let frame_samples = &self.staging.view()[..frame_size * channels];
        let mut packet_buf = vec![0u8; MAX_PACKET_BYTES];
        let len = match self.opus.encode_float(frame_samples, &mut packet_buf) {
            Ok(len) => len,
            Err(err) => {
                self.unrecoverable = true;
                return Err(Error::from(err));
            },
        };
        packet_buf.truncate(len);

        if is_chain_keyframe && !self.prediction_disabled {
            self.opus.set_prediction_disabled(false)?;
        }

        self.current_granule += frame_size as u64;
        let eos = self.current_granule >= end_granule_48k;
        let granule_48k = self.current_granule.min(end_granule_48k);

        let emit_granule = {
            let head = self.streams.head().ok_or(Error::Internal("no head stream"))?;
            head.emit_granule(granule_48k)
        };

        {
            let packer = self.packer.as_mut().ok_or(Error::Internal("packer missing"))?;
            packer.reserve_packet(packet_buf.len())?.copy_from_slice(&packet_buf);
            packer.commit_packet(packet_buf.len(), emit_granule, eos)?;
        }

        if let Some(callback) = &mut self.packet_callback {
            callback(&packet_buf, eos);
        }

        if is_chain_keyframe {
            self.chaining_keyframe = Some(packet_buf);
        }

        self.drain_ready_pages()?;

        if eos {
            self.cross_chain_boundary(end_granule_48k)?;
        }

        self.staging.consume(frame_size);
        Ok(())
    }

    /// Executed when the head stream's EOS fires (spec.md §4.5 step 6):
    /// closes the finished stream and, if a successor is queued,
    /// initializes it and re-emits the saved chain keyframe.
    fn cross_chain_boundary(&mut self, end_granule_48k: u64) -> Result<()> {
        let mut finished = self.streams.pop_head().ok_or(Error::Internal("no head stream at eos"))?;
        finished.close()?;
        log::debug!("stream closed at granule {end_granule_48k}");

        if self.streams.head().is_none() {
            return Ok(());
        }

        let frame_size = self.frame_size as u64;
        let new_pre_skip = (end_granule_48k + frame_size).saturating_sub(self.current_granule);
        let has_keyframe = self.chaining_keyframe.is_some();
        let (adjusted_pre_skip, extra_offset) =
            if has_keyframe { (new_pre_skip.saturating_sub(frame_size), frame_size) } else { (new_pre_skip, 0) };

        #[allow(clippy::cast_possible_truncation)]
        {
            self.pending_header_pre_skip = adjusted_pre_skip.min(u64::from(u16::MAX)) as u16;
        }
        let granule_offset = self.current_granule as i64 - extra_offset as i64;

        self.ensure_tail_initialized()?;
        if let Some(head) = self.streams.head_mut() {
            head.set_granule_offset(granule_offset);
        }

        if let Some(keyframe) = self.chaining_keyframe.take() {
            let granule = self
                .streams
                .head()
                .ok_or(Error::Internal("no head stream after init"))?
                .emit_granule(self.current_granule);
            let packer = self.packer.as_mut().ok_or(Error::Internal("packer missing"))?;
            packer.reserve_packet(keyframe.len())?.copy_from_slice(&keyframe);
            packer.commit_packet(keyframe.len(), granule, false)?;
            self.drain_ready_pages()?;
        }
        Ok(())
    }

    /// Drains the packer's ready pages either to the head stream's sink
    /// (push mode) or into the pull queue.
    fn drain_ready_pages(&mut self) -> Result<()> {
        let Some(packer) = self.packer.as_mut() else { return Ok(()) };
        while let Some(page) = packer.next_page() {
            if self.pull_mode {
                self.pull_queue.push_back(page);
            } else if let Some(head) = self.streams.head_mut() {
                head.write_to_sink(&page)?;
            }
        }
        Ok(())
    }

    /// Terminates the current stream cleanly (spec.md §4.5): pads the
    /// staging buffer with LPC-extrapolated samples plus a short zero
    /// tail to exceed the codec's look-ahead, then runs the encode loop
    /// to exhaustion.
    ///
    /// # Errors
    ///
    /// Propagates encode-loop failures; latches [`Error::Unrecoverable`]
    /// on any.
    pub fn drain(&mut self) -> Result<()> {
        self.check_not_unrecoverable()?;
        let result = self.drain_inner();
        self.latch_unrecoverable(result)
    }

    fn drain_inner(&mut self) -> Result<()> {
        if self.streams.is_empty() {
            return Ok(());
        }
        self.freeze_tail_header();
        self.ensure_tail_initialized()?;

        let tail_untouched = self.streams.tail().is_some_and(|s| s.end_granule() == 0);
        if tail_untouched && self.current_granule == 0 {
            return self.finish_silent_stream();
        }

        let channels = self.channels;
        let frame_size = self.frame_size as u64;
        let input_rate = u64::from(self.input_rate);
        let tail_end_granule = self.streams.tail().ok_or(Error::Internal("no tail stream"))?.end_granule();
        let end_granule_48k =
            ceil_div(tail_end_granule * 48_000, input_rate) + u64::from(self.pending_header_pre_skip);
        // Pad past end_granule_48k with one extra frame of margin so the
        // encode loop below is guaranteed to observe an EOS crossing.
        let deficit = end_granule_48k.saturating_sub(self.current_granule) + frame_size;
        let needed = deficit.saturating_sub(self.staging.available() as u64);
        let total_pad = needed.max(frame_size).min(self.staging.remaining_capacity() as u64) as usize;
        let lpc_frames = (2 * self.frame_size).min(total_pad);
        let zero_frames = total_pad - lpc_frames;

        let history_len = (8 * lpc::LPC_ORDER).min(self.staging.available());
        if channels == 1 {
            let view = self.staging.view();
            let frames_available = view.len();
            let history_start = frames_available.saturating_sub(history_len);
            let history: Vec<f32> = view[history_start..].to_vec();
            let extension = lpc::extrapolate(&history, lpc_frames);
            self.staging.append(&extension);
        } else {
            let view = self.staging.view().to_vec();
            let frames_available = view.len() / channels;
            let start = frames_available.saturating_sub(history_len);
            let mut per_channel = vec![Vec::new(); channels];
            for (c, ch) in per_channel.iter_mut().enumerate() {
                let history: Vec<f32> = (start..frames_available).map(|i| view[i * channels + c]).collect();
                *ch = lpc::extrapolate(&history, lpc_frames);
            }
            let mut interleaved = Vec::with_capacity(lpc_frames * channels);
            for i in 0..lpc_frames {
                for ch in &per_channel {
                    interleaved.push(ch[i]);
                }
            }
            self.staging.append(&interleaved);
        }

        // A zero tail beyond the LPC extension flushes the codec's
        // remaining look-ahead (spec.md §4.7).
        self.staging.append(&vec![0.0f32; zero_frames * channels]);

        self.settings.decision_delay = 0;
        while !self.streams.is_empty() && self.staging.available() as u64 >= frame_size {
            self.encode_one_frame()?;
        }
        Ok(())
    }

    /// Finishes a stream that never received a single sample: commits an
    /// empty EOS packet at granule 0 and closes it without running the
    /// encode loop (spec.md S6).
    fn finish_silent_stream(&mut self) -> Result<()> {
        {
            let packer = self.packer.as_mut().ok_or(Error::Internal("packer missing"))?;
            packer.reserve_packet(0)?;
            packer.commit_packet(0, 0, true)?;
        }
        self.drain_ready_pages()?;
        if let Some(mut finished) = self.streams.pop_head() {
            finished.close()?;
        }
        Ok(())
    }

    /// Releases resources. Must be preceded by [`Encoder::drain`] for
    /// well-formed output; safe to call even in an unrecoverable state.
    pub fn destroy(mut self) {
        self.pull_queue.clear();
        self.packer = None;
    }

    /// Appends a new logical stream that receives the encoder's
    /// callback-driven sink going forward (spec.md §4.5).
    ///
    /// # Errors
    ///
    /// [`Error::Unrecoverable`] if a prior operation latched that state.
    pub fn chain_current(&mut self, sink: Box<dyn Sink>, close_at_end: bool) -> Result<()> {
        self.check_not_unrecoverable()?;
        self.streams.push_tail(Stream::new(sink, close_at_end));
        Ok(())
    }

    /// Appends a new logical stream backed by a file path.
    ///
    /// # Errors
    ///
    /// [`Error::CannotOpen`] if the file cannot be created; see
    /// [`Encoder::chain_current`] otherwise.
    pub fn continue_new_file(&mut self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let sink = crate::sink::FileSink::create(path).map_err(Error::CannotOpen)?;
        self.chain_current(Box::new(sink), true)
    }

    /// Appends a new logical stream backed by an arbitrary sink (spec.md
    /// §4.5's `continue_new_callbacks`).
    ///
    /// # Errors
    ///
    /// See [`Encoder::chain_current`].
    pub fn continue_new_callbacks(&mut self, sink: Box<dyn Sink>, close_at_end: bool) -> Result<()> {
        self.chain_current(sink, close_at_end)
    }

    /// Forces header emission on the tail stream early.
    ///
    /// # Errors
    ///
    /// See [`Encoder::ensure_tail_initialized`]'s failure modes.
    pub fn flush_header(&mut self) -> Result<()> {
        self.check_not_unrecoverable()?;
        self.freeze_tail_header();
        let result = self.ensure_tail_initialized();
        self.latch_unrecoverable(result)
    }

    /// Pull-mode page retrieval: returns the next ready page, optionally
    /// forcing a flush first.
    ///
    /// # Errors
    ///
    /// [`Error::Unimplemented`] if the encoder was built in push mode.
    pub fn get_page(&mut self, flush: bool) -> Result<Option<Vec<u8>>> {
        self.check_not_unrecoverable()?;
        if !self.pull_mode {
            return Err(Error::Unimplemented("get_page requires an encoder built in pull mode"));
        }
        if self.pull_queue.is_empty() {
            if let Some(packer) = self.packer.as_mut() {
                if let Some(page) = packer.get_page(flush)? {
                    self.pull_queue.push_back(page);
                }
            }
        }
        Ok(self.pull_queue.pop_front())
    }

    /// Installs a per-packet notification callback (spec.md §6).
    pub fn set_packet_callback(&mut self, callback: Box<dyn FnMut(&[u8], bool) + Send>) {
        self.packet_callback = Some(callback);
    }

    /// Overrides the tail stream's serial number.
    ///
    /// # Errors
    ///
    /// [`Error::TooLate`] if the tail stream's header is already frozen.
    pub fn set_serial_number(&mut self, serial: u32) -> Result<()> {
        if let Some(tail) = self.streams.tail() {
            if tail.header_frozen() {
                return Err(Error::TooLate("serial number cannot change after header freeze"));
            }
        }
        self.pending_serial_override = Some(serial);
        Ok(())
    }

    /// Replaces the serial number source (primarily for deterministic
    /// tests; spec.md §9 design notes).
    pub fn set_serial_source(&mut self, source: Box<dyn SerialSource>) {
        self.serial_source = source;
    }

    /// Mutable access to the tail stream's comment block.
    ///
    /// # Errors
    ///
    /// [`Error::TooLate`] if the tail stream's header is already frozen.
    pub fn comment_mut(&mut self) -> Result<&mut CommentBuilder> {
        self.streams.tail_mut().ok_or(Error::Internal("no tail stream"))?.comment_mut()
    }

    /// Forwards a tagged configuration request to the muxer or codec
    /// (spec.md §4.5, §9 design notes).
    ///
    /// # Errors
    ///
    /// [`Error::TooLate`] for mutations no longer legal post-freeze;
    /// [`Error::Codec`] if the underlying Opus call fails.
    pub fn ctl(&mut self, request: Ctl) -> Result<()> {
        self.check_not_unrecoverable()?;
        match request {
            Ctl::SetDecisionDelay(delay) => self.settings.decision_delay = delay,
            Ctl::SetMuxingDelay(delay) => {
                self.settings.muxing_delay = delay;
                if let Some(packer) = &mut self.packer {
                    packer.set_muxing_delay(delay);
                }
            },
            Ctl::SetCommentPadding(bytes) => self.settings.comment_padding = bytes,
            Ctl::SetSerialNumber(serial) => self.set_serial_number(serial)?,
            Ctl::SetOpusApplication(app) => self.opus.set_application(to_audiopus_application(app))?,
            Ctl::SetOpusBitrate(bitrate) => {
                self.settings.opus.bitrate = bitrate;
                if let Some(bits) = bitrate {
                    self.opus.set_bitrate(audiopus::Bitrate::BitsPerSecond(bits))?;
                }
            },
            Ctl::SetOpusVbr(vbr) => {
                self.settings.opus.vbr = vbr;
                self.opus.set_vbr(vbr)?;
            },
            Ctl::SetOpusComplexity(complexity) => {
                self.settings.opus.complexity = complexity;
                self.opus.set_complexity(i32::from(complexity))?;
            },
            Ctl::SetOpusFec(fec) => {
                self.settings.opus.fec = fec;
                self.opus.set_inband_fec(fec)?;
            },
            Ctl::SetOpusDtx(dtx) => {
                self.settings.opus.dtx = dtx;
                self.opus.set_dtx(dtx)?;
            },
            Ctl::SetOpusLsbDepth(depth) => {
                self.settings.opus.lsb_depth = depth;
                self.opus.set_lsb_depth(i32::from(depth))?;
            },
            Ctl::SetOpusFrameDurationMs(ms) => {
                if !self.streams.tail().is_some_and(Stream::stream_initialized) {
                    self.settings.opus.frame_duration_ms = ms;
                    self.frame_size = frame_size_from_ms(ms);
                } else {
                    return Err(Error::TooLate("frame duration cannot change mid-stream"));
                }
            },
        }
        Ok(())
    }
}
