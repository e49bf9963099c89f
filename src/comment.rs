//! The Opus comment ("OpusTags") packet builder (spec.md §4.4).
//!
//! Layout mirrors `quark-zju-sndcat`'s `oggopus::Header::serialize_tags`,
//! extended with the tag/value table, padding, and picture-block support
//! the teacher's fixed-vendor-only version does not need.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::{Error, Result};

const MAGIC: &[u8; 8] = b"OpusTags";
const DEFAULT_VENDOR: &str = "oggopus";
const DEFAULT_PADDING: u32 = 512;

/// One `TAG=VALUE` entry, stored pre-joined so padding can extend the
/// packet without re-encoding every entry (spec.md §4.4).
struct Comment(String);

/// Builds an Opus comment header packet: vendor string, arbitrary
/// `TAG=VALUE` metadata, and a trailing zero-padding block.
pub struct CommentBuilder {
    vendor: String,
    comments: Vec<Comment>,
    padding: u32,
}

impl Default for CommentBuilder {
    fn default() -> Self {
        Self { vendor: DEFAULT_VENDOR.to_string(), comments: Vec::new(), padding: DEFAULT_PADDING }
    }
}

impl CommentBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the vendor string (defaults to this crate's name).
    pub fn set_vendor(&mut self, vendor: impl Into<String>) {
        self.vendor = vendor.into();
    }

    /// Sets the trailing padding size in bytes (spec.md §6, default 512).
    pub fn set_padding(&mut self, bytes: u32) {
        self.padding = bytes;
    }

    /// Adds a `tag=value` comment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadArg`] if `tag` contains anything outside
    /// printable ASCII 0x20-0x7D excluding `=`, or if `value` is not valid
    /// alongside it once joined.
    pub fn add_tag(&mut self, tag: &str, value: &str) -> Result<()> {
        if tag.is_empty() || !tag.bytes().all(|b| (0x20..=0x7D).contains(&b) && b != b'=') {
            return Err(Error::BadArg("comment tag must be printable ASCII without '='"));
        }
        self.comments.push(Comment(format!("{tag}={value}")));
        Ok(())
    }

    /// Adds a `METADATA_BLOCK_PICTURE` tag whose value is the base64
    /// encoding of a raw FLAC-style picture block (spec.md §4.4).
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadArg`] if `picture_block` is empty.
    pub fn add_picture(&mut self, picture_block: &[u8]) -> Result<()> {
        if picture_block.is_empty() {
            return Err(Error::BadArg("picture block must not be empty"));
        }
        let encoded = BASE64.encode(picture_block);
        self.comments.push(Comment(format!("METADATA_BLOCK_PICTURE={encoded}")));
        Ok(())
    }

    /// Returns the number of user-added comment entries (spec.md S4: 1000
    /// tags plus the default ENCODER entry).
    #[must_use]
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Serializes the full OpusTags packet.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);

        let vendor_bytes = self.vendor.as_bytes();
        #[allow(clippy::cast_possible_truncation)]
        out.extend_from_slice(&(vendor_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(vendor_bytes);

        #[allow(clippy::cast_possible_truncation)]
        out.extend_from_slice(&(self.comments.len() as u32).to_le_bytes());
        for comment in &self.comments {
            let bytes = comment.0.as_bytes();
            #[allow(clippy::cast_possible_truncation)]
            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            out.extend_from_slice(bytes);
        }

        out.resize(out.len() + self.padding as usize, 0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_has_magic_vendor_and_padding_only() {
        let builder = CommentBuilder::new();
        let bytes = builder.build();
        assert_eq!(&bytes[0..8], MAGIC);
        assert_eq!(bytes.len(), 8 + 4 + DEFAULT_VENDOR.len() + 4 + DEFAULT_PADDING as usize);
    }

    #[test]
    fn rejects_tag_with_equals_sign() {
        let mut builder = CommentBuilder::new();
        assert!(builder.add_tag("BAD=NAME", "x").is_err());
    }

    #[test]
    fn thousand_tags_round_trip_through_the_count_field() {
        let mut builder = CommentBuilder::new();
        for i in 0..1000 {
            builder.add_tag("TAG", &i.to_string()).unwrap();
        }
        builder.set_padding(0);
        let bytes = builder.build();
        let count_offset = 8 + 4 + builder.vendor.len();
        let count = u32::from_le_bytes(bytes[count_offset..count_offset + 4].try_into().unwrap());
        assert_eq!(count, 1000);
    }

    #[test]
    fn picture_tag_is_valid_base64() {
        let mut builder = CommentBuilder::new();
        builder.add_picture(&[1, 2, 3, 4]).unwrap();
        assert_eq!(builder.len(), 1);
    }
}
