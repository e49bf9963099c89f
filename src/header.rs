//! The Opus ID header ("OpusHead") builder (spec.md §4.5, §6).
//!
//! Grounded on `quark-zju-sndcat`'s `oggopus::Header::serialize_head`,
//! generalized from that teacher's fixed mono/stereo mapping-family-0 case
//! to the full family 0/1/255 layout RFC 7845 requires.

use crate::error::{Error, Result};

const MAGIC: &[u8; 8] = b"OpusHead";
const VERSION: u8 = 1;

/// Channel mapping family and, for families other than 0, the explicit
/// stream layout (spec.md §6).
#[derive(Debug, Clone)]
pub enum ChannelMapping {
    /// Family 0: mono or stereo, implicit mapping, no mapping table.
    Family0,
    /// Family 1 or 255: explicit stream count, coupled count, and a
    /// per-output-channel map into decoded streams.
    Explicit { family: u8, stream_count: u8, coupled_count: u8, channel_map: Vec<u8> },
}

/// Describes the Opus ID header for one logical stream.
#[derive(Debug, Clone)]
pub struct HeaderInfo {
    pub channels: u8,
    pub pre_skip: u16,
    pub input_sample_rate: u32,
    /// Output gain in Q7.8 fixed point, applied by the decoder.
    pub output_gain_q7_8: i16,
    pub mapping: ChannelMapping,
}

impl HeaderInfo {
    /// Serializes the Opus ID header packet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadArg`] if `channels` is zero, or if an explicit
    /// mapping's channel count does not match the header's channel count.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        if self.channels == 0 {
            return Err(Error::BadArg("channel count must be nonzero"));
        }

        //      0                   1                   2                   3
        //  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
        // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
        // |       'O'     |      'p'      |     'u'       |     's'       |
        // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
        // |       'H'     |       'e'     |     'a'       |     'd'       |
        // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
        // |  version = 1  | channel count |           pre-skip            |
        // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
        // |                original input sample rate in Hz               |
        // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
        // |    output gain Q7.8 in dB     |  channel map  |               |
        // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+               :
        let mut out = Vec::with_capacity(19);
        out.extend_from_slice(MAGIC);
        out.push(VERSION);
        out.push(self.channels);
        out.extend_from_slice(&self.pre_skip.to_le_bytes());
        out.extend_from_slice(&self.input_sample_rate.to_le_bytes());
        out.extend_from_slice(&self.output_gain_q7_8.to_le_bytes());

        match &self.mapping {
            ChannelMapping::Family0 => {
                out.push(0);
            },
            ChannelMapping::Explicit { family, stream_count, coupled_count, channel_map } => {
                if channel_map.len() != self.channels as usize {
                    return Err(Error::BadArg("channel map length must equal channel count"));
                }
                out.push(*family);
                out.push(*stream_count);
                out.push(*coupled_count);
                out.extend_from_slice(channel_map);
            },
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_zero_stereo_header_is_nineteen_bytes() {
        let info = HeaderInfo {
            channels: 2,
            pre_skip: 312,
            input_sample_rate: 44100,
            output_gain_q7_8: 0,
            mapping: ChannelMapping::Family0,
        };
        let bytes = info.serialize().unwrap();
        assert_eq!(bytes.len(), 19);
        assert_eq!(&bytes[0..8], MAGIC);
        assert_eq!(bytes[8], 1);
        assert_eq!(bytes[9], 2);
        assert_eq!(u16::from_le_bytes(bytes[10..12].try_into().unwrap()), 312);
        assert_eq!(u32::from_le_bytes(bytes[12..16].try_into().unwrap()), 44100);
        assert_eq!(bytes[18], 0);
    }

    #[test]
    fn explicit_mapping_appends_stream_layout() {
        let info = HeaderInfo {
            channels: 4,
            pre_skip: 0,
            input_sample_rate: 48000,
            output_gain_q7_8: 0,
            mapping: ChannelMapping::Explicit {
                family: 1,
                stream_count: 2,
                coupled_count: 2,
                channel_map: vec![0, 1, 2, 3],
            },
        };
        let bytes = info.serialize().unwrap();
        assert_eq!(bytes.len(), 19 + 3 + 4);
        assert_eq!(bytes[18], 1);
        assert_eq!(bytes[19], 2);
        assert_eq!(bytes[20], 2);
        assert_eq!(&bytes[21..25], &[0, 1, 2, 3]);
    }

    #[test]
    fn rejects_zero_channels() {
        let info = HeaderInfo {
            channels: 0,
            pre_skip: 0,
            input_sample_rate: 48000,
            output_gain_q7_8: 0,
            mapping: ChannelMapping::Family0,
        };
        assert!(info.serialize().is_err());
    }
}
