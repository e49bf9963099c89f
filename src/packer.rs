//! The Ogg page packer (spec.md §4.1).
//!
//! Accepts a sequence of packets with granule positions and EOS flags and
//! produces framed, CRC-checked Ogg pages. Pages are assembled eagerly:
//! once a page's lacing table is complete (or a flush is forced), its
//! bytes are pushed onto an internal ready queue that [`OggPacker::next_page`]
//! and [`OggPacker::get_page`] drain. This differs from a C implementation's
//! "reserve a view, invalidate on next call" discipline only in that pages
//! are owned `Vec<u8>`s rather than borrowed views into a shared arena —
//! the observable framing, lacing, and flush semantics are the same.

use std::collections::VecDeque;

use crate::crc::checksum;
use crate::error::{Error, Result};

/// Maximum number of lacing segments in one page.
const MAX_SEGMENTS: usize = 255;
/// Maximum bytes a single lacing segment can describe.
const MAX_SEGMENT_VALUE: usize = 255;
/// Sentinel granule position meaning "no position" (spec.md §4.1): -1 as a
/// 64-bit two's-complement value.
pub const NO_GRANULE: u64 = u64::MAX;
/// Fixed Ogg page header size, not counting the segment table.
const PAGE_HEADER_SIZE: usize = 27;

const FLAG_CONTINUED: u8 = 0x01;
const FLAG_BOS: u8 = 0x02;
const FLAG_EOS: u8 = 0x04;

/// Default muxing delay bound, in the granule-position units the caller
/// commits with (spec.md §6: 48000 for the default 48 kHz / 1 s bound).
pub const DEFAULT_MUXING_DELAY: u64 = 48_000;

struct ReadyPage {
    bytes: Vec<u8>,
    granule: u64,
}

/// Assembles packets into Ogg pages for one physical (possibly chained)
/// bitstream.
pub struct OggPacker {
    serial: u32,
    page_seq: u32,
    body: Vec<u8>,
    lacing: Vec<u8>,
    page_granule: u64,
    pending_bos: bool,
    pending_eos: bool,
    /// Set after flushing a page that ends mid-packet; the next page
    /// produced must carry the "continued packet" flag.
    pending_continued: bool,
    reserve_buf: Vec<u8>,
    muxing_delay: u64,
    ready_pages: VecDeque<ReadyPage>,
}

impl OggPacker {
    /// Creates a packer for a new logical bitstream with the given serial
    /// number. The first page produced carries the BOS flag.
    #[must_use]
    pub fn new(serial: u32) -> Self {
        Self {
            serial,
            page_seq: 0,
            body: Vec::new(),
            lacing: Vec::new(),
            page_granule: 0,
            pending_bos: true,
            pending_eos: false,
            pending_continued: false,
            reserve_buf: Vec::new(),
            muxing_delay: DEFAULT_MUXING_DELAY,
            ready_pages: VecDeque::new(),
        }
    }

    /// Overrides the muxing delay bound (spec.md §6, default 48000).
    pub fn set_muxing_delay(&mut self, delay: u64) {
        self.muxing_delay = delay;
    }

    /// Reserves a writable region of at least `n` bytes. The region is
    /// valid until the next call to `reserve_packet`, `commit_packet`, or
    /// `flush_page`.
    ///
    /// # Errors
    ///
    /// Never fails in this implementation (growth is a plain `Vec` resize),
    /// but the signature keeps the allocation-exhaustion contract from
    /// spec.md §4.1 for callers that want to propagate it.
    pub fn reserve_packet(&mut self, n: usize) -> Result<&mut [u8]> {
        if self.reserve_buf.len() < n {
            self.reserve_buf.resize(n, 0);
        }
        Ok(&mut self.reserve_buf[..n])
    }

    /// Commits the first `len` bytes of the last reserved region as one
    /// packet, with the given granule position and EOS flag.
    ///
    /// May implicitly flush the in-flight page (spec.md §4.1).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if `len` exceeds the last reserved size.
    pub fn commit_packet(&mut self, len: usize, granulepos: u64, eos: bool) -> Result<()> {
        if len > self.reserve_buf.len() {
            return Err(Error::Internal("commit_packet: len exceeds reserved region"));
        }
        let data = self.reserve_buf[..len].to_vec();
        self.commit_bytes(&data, granulepos, eos)
    }

    /// Convenience wrapper: reserves, copies, and commits in one call.
    ///
    /// # Errors
    ///
    /// See [`OggPacker::commit_packet`].
    pub fn write_packet(&mut self, data: &[u8], granulepos: u64, eos: bool) -> Result<()> {
        self.commit_bytes(data, granulepos, eos)
    }

    fn commit_bytes(&mut self, data: &[u8], granulepos: u64, eos: bool) -> Result<()> {
        let mut remaining = data;
        loop {
            let available = MAX_SEGMENTS - self.lacing.len();
            let needed = remaining.len() / MAX_SEGMENT_VALUE + 1;
            if needed <= available {
                // Whole (remaining of the) packet fits on the current page.
                self.append_terminated(remaining);
                self.page_granule = granulepos;
                if !remaining.is_empty() || data.is_empty() {
                    // A non-empty packet always updates the page granule;
                    // an explicit empty EOS packet still stamps it.
                }
                if eos {
                    self.pending_eos = true;
                }
                let must_flush = self.lacing.len() == MAX_SEGMENTS
                    || eos
                    || self.exceeds_muxing_delay(granulepos);
                if must_flush {
                    self.flush_page()?;
                }
                return Ok(());
            }

            // The packet does not fit; fill the page with as many
            // full 255-byte continuation segments as it has room for,
            // flush it with no granule position, and continue.
            if available == 0 {
                self.flush_page()?;
                continue;
            }
            let take_bytes = available * MAX_SEGMENT_VALUE;
            let chunk = &remaining[..take_bytes.min(remaining.len())];
            for _ in 0..(chunk.len() / MAX_SEGMENT_VALUE) {
                self.lacing.push(MAX_SEGMENT_VALUE as u8);
            }
            self.body.extend_from_slice(chunk);
            self.page_granule = NO_GRANULE;
            self.flush_page()?;
            self.pending_continued = true;
            remaining = &remaining[chunk.len()..];
        }
    }

    /// Appends `data` to the current page with a terminating lacing
    /// segment (a value < 255, or a single 0 for an empty packet).
    fn append_terminated(&mut self, data: &[u8]) {
        let full_segments = data.len() / MAX_SEGMENT_VALUE;
        for _ in 0..full_segments {
            self.lacing.push(MAX_SEGMENT_VALUE as u8);
        }
        let remainder = (data.len() % MAX_SEGMENT_VALUE) as u8;
        self.lacing.push(remainder);
        self.body.extend_from_slice(data);
    }

    fn exceeds_muxing_delay(&self, candidate_granule: u64) -> bool {
        if candidate_granule == NO_GRANULE {
            return false;
        }
        match self.oldest_pending_granule() {
            Some(oldest) if candidate_granule > oldest => {
                candidate_granule - oldest > self.muxing_delay
            },
            _ => false,
        }
    }

    fn oldest_pending_granule(&self) -> Option<u64> {
        self.ready_pages
            .front()
            .map(|p| p.granule)
            .or(if self.body.is_empty() && self.lacing.is_empty() {
                None
            } else {
                Some(self.page_granule)
            })
    }

    /// Closes the current page at the last fully committed packet
    /// boundary. A no-op if nothing is pending.
    ///
    /// # Errors
    ///
    /// Propagates any future allocation failure (currently infallible).
    pub fn flush_page(&mut self) -> Result<()> {
        if self.body.is_empty() && self.lacing.is_empty() && !self.pending_eos {
            return Ok(());
        }

        let mut flags = 0u8;
        if self.pending_continued {
            flags |= FLAG_CONTINUED;
        }
        if self.pending_bos {
            flags |= FLAG_BOS;
        }
        if self.pending_eos {
            flags |= FLAG_EOS;
        }

        let bytes = serialize_page(
            flags,
            self.page_granule,
            self.serial,
            self.page_seq,
            &self.lacing,
            &self.body,
        );
        let granule = self.page_granule;
        self.ready_pages.push_back(ReadyPage { bytes, granule });

        self.page_seq += 1;
        self.pending_bos = false;
        self.pending_continued = false;
        self.pending_eos = false;
        self.body.clear();
        self.lacing.clear();
        Ok(())
    }

    /// Materializes and returns the next completed page, if any.
    #[must_use]
    pub fn next_page(&mut self) -> Option<Vec<u8>> {
        self.ready_pages.pop_front().map(|p| p.bytes)
    }

    /// Returns the next ready page, optionally forcing a flush of any
    /// pending (non-empty) page first. Mirrors the encoder's
    /// `get_page(flush)` operation from spec.md §4.5.
    ///
    /// # Errors
    ///
    /// Propagates [`OggPacker::flush_page`] failures.
    pub fn get_page(&mut self, flush: bool) -> Result<Option<Vec<u8>>> {
        if self.ready_pages.is_empty() && flush {
            self.flush_page()?;
        }
        Ok(self.next_page())
    }

    /// True if there is at least one page ready to be drained.
    #[must_use]
    pub fn has_ready_page(&self) -> bool {
        !self.ready_pages.is_empty()
    }

    /// Flushes the current page (even if small), resets the page sequence
    /// number, arms BOS on the next page, and switches to a new serial
    /// number — the chaining operation from spec.md §4.1.
    ///
    /// # Errors
    ///
    /// Propagates [`OggPacker::flush_page`] failures.
    pub fn chain(&mut self, new_serial: u32) -> Result<()> {
        // Force a flush even of an empty accumulator so the outgoing
        // stream's EOS page (committed just before chaining) is not left
        // dangling in the body buffer.
        if !self.body.is_empty() || !self.lacing.is_empty() {
            self.flush_page()?;
        }
        self.page_seq = 0;
        self.pending_bos = true;
        self.pending_continued = false;
        self.serial = new_serial;
        Ok(())
    }

    #[must_use]
    pub const fn serial(&self) -> u32 {
        self.serial
    }
}

/// Serializes one Ogg page: 27-byte header, segment table, body, with the
/// CRC computed over the whole thing (header's CRC field held at zero
/// during the pass, per RFC 3533 §6).
fn serialize_page(
    flags: u8,
    granule: u64,
    serial: u32,
    seq: u32,
    lacing: &[u8],
    body: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(PAGE_HEADER_SIZE + lacing.len() + body.len());
    out.extend_from_slice(b"OggS");
    out.push(0); // version
    out.push(flags);
    out.extend_from_slice(&granule.to_le_bytes());
    out.extend_from_slice(&serial.to_le_bytes());
    out.extend_from_slice(&seq.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // CRC placeholder
    #[allow(clippy::cast_possible_truncation)]
    out.push(lacing.len() as u8);
    out.extend_from_slice(lacing);
    out.extend_from_slice(body);

    let crc = checksum(&out);
    out[22..26].copy_from_slice(&crc.to_le_bytes());
    out
}
