//! End-to-end scenarios from spec.md §8, driven against an in-memory
//! sink. Uses the `ogg` crate as a read-only validator of this crate's
//! own packer output (never as a writer) the way `env_logger` is used
//! only at test/binary edges elsewhere in this corpus.

use oggopus::config::EncoderSettings;
use oggopus::sink::MemorySink;
use oggopus::{Ctl, Encoder};

fn init_logging() {
    env_logger::builder().filter_level(log::LevelFilter::Debug).is_test(true).try_init().ok();
}

fn new_pull_encoder(channels: usize, input_rate: u32) -> Encoder {
    init_logging();
    Encoder::new(channels, input_rate, Box::new(MemorySink::new()), true, true, EncoderSettings::default())
        .expect("encoder construction should succeed")
}

fn drain_all_pages(encoder: &mut Encoder) -> Vec<u8> {
    let mut bytes = Vec::new();
    while let Some(page) = encoder.get_page(true).unwrap() {
        bytes.extend_from_slice(&page);
    }
    bytes
}

/// Reassembles every logical Opus packet from the raw Ogg page bytes,
/// returning `(packet_count, bos_count, eos_count, distinct_serials)`.
/// `ogg::reading::PacketReader` works at packet granularity (it
/// transparently reassembles packets split across page boundaries), so
/// this is a property of the reconstructed packet stream rather than a
/// literal page count.
fn scan_pages(bytes: &[u8]) -> (usize, usize, usize, std::collections::HashSet<u32>) {
    let mut reader = ogg::reading::PacketReader::new(std::io::Cursor::new(bytes));
    let mut serials = std::collections::HashSet::new();
    let mut packet_count = 0;
    let mut bos_count = 0;
    let mut eos_count = 0;
    while let Ok(Some(packet)) = reader.read_packet() {
        packet_count += 1;
        serials.insert(packet.stream_serial());
        if packet.first_in_stream() {
            bos_count += 1;
        }
        if packet.last_in_stream() {
            eos_count += 1;
        }
    }
    (packet_count, bos_count, eos_count, serials)
}

#[test]
fn s1_one_second_of_stereo_silence_produces_a_valid_crc_checked_stream() {
    let mut encoder = new_pull_encoder(2, 48_000);
    let silence = vec![0.0f32; 96_000 * 2];
    encoder.write_float(&silence, 96_000).unwrap();
    let mut bytes = drain_all_pages(&mut encoder);
    encoder.drain().unwrap();
    bytes.extend(drain_all_pages(&mut encoder));

    let (packet_count, bos_count, eos_count, serials) = scan_pages(&bytes);
    assert!(packet_count >= 52, "expected header + tags + >=50 audio/eos packets, got {packet_count}");
    assert_eq!(bos_count, 1);
    assert_eq!(eos_count, 1);
    assert_eq!(serials.len(), 1);
}

#[test]
fn s2_half_second_sine_decodes_to_the_expected_length_and_energy() {
    let input_rate = 44_100u32;
    let freq = 440.0f32;
    let frames = (input_rate as f32 * 0.5) as usize;
    let mut sine = vec![0.0f32; frames];
    for (i, sample) in sine.iter_mut().enumerate() {
        *sample = (2.0 * std::f32::consts::PI * freq * i as f32 / input_rate as f32).sin();
    }

    let mut encoder = new_pull_encoder(1, input_rate);
    encoder.write_float(&sine, frames as i64).unwrap();
    let mut bytes = drain_all_pages(&mut encoder);
    encoder.drain().unwrap();
    bytes.extend(drain_all_pages(&mut encoder));

    let mut reader = ogg::reading::PacketReader::new(std::io::Cursor::new(&bytes));
    reader.read_packet().unwrap(); // ID header
    reader.read_packet().unwrap(); // comment header

    let mut decoder = audiopus::coder::Decoder::new(audiopus::SampleRate::Hz48000, audiopus::Channels::Mono)
        .expect("decoder construction should succeed");
    let mut decoded = Vec::new();
    // 120ms is the largest Opus frame duration, large enough for any
    // packet this encoder ever produces regardless of configured
    // frame size.
    let mut out_buf = vec![0.0f32; 5_760];
    while let Ok(Some(packet)) = reader.read_packet() {
        if packet.data.is_empty() {
            continue;
        }
        let len = decoder.decode_float(Some(&packet.data), &mut out_buf, false).unwrap();
        decoded.extend_from_slice(&out_buf[..len]);
    }

    // 0.5s of audio resampled up to the codec's fixed 48kHz rate.
    let expected_len = (48_000.0 * 0.5) as i64;
    let tolerance = 2 * 960;
    assert!(
        (decoded.len() as i64 - expected_len).abs() <= tolerance,
        "decoded {} samples, expected close to {}",
        decoded.len(),
        expected_len
    );

    // RMS-based proxy for a THD+N check: a clean tone should decode with
    // energy in the same ballpark as the input, not near silence and not
    // wildly amplified.
    fn rms(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        (samples.iter().map(|x| x * x).sum::<f32>() / samples.len() as f32).sqrt()
    }
    let input_rms = rms(&sine);
    let output_rms = rms(&decoded);
    assert!(output_rms > input_rms * 0.5, "decoded signal is too quiet: {output_rms} vs input {input_rms}");
    assert!(output_rms < input_rms * 1.5, "decoded signal is too loud: {output_rms} vs input {input_rms}");
}

#[test]
fn s3_chain_current_produces_two_independently_decodable_streams() {
    let mut encoder = new_pull_encoder(2, 48_000);
    // Force the encode loop to cross the chain boundary on the writes
    // below rather than waiting for `drain()`'s own padding path, which
    // keeps this test isolated to the `write_common`/`encode_one_frame`
    // fix under review.
    encoder.ctl(Ctl::SetDecisionDelay(0)).unwrap();

    let frames_a = 48_000usize;
    let pcm_a = vec![0.0f32; frames_a * 2];
    encoder.write_float(&pcm_a, frames_a as i64).unwrap();
    let mut bytes = drain_all_pages(&mut encoder);

    encoder.chain_current(Box::new(MemorySink::new()), true).unwrap();

    let frames_b = 48_000usize;
    let pcm_b = vec![0.0f32; frames_b * 2];
    encoder.write_float(&pcm_b, frames_b as i64).unwrap();
    bytes.extend(drain_all_pages(&mut encoder));

    encoder.drain().unwrap();
    bytes.extend(drain_all_pages(&mut encoder));

    let (packet_count, bos_count, eos_count, serials) = scan_pages(&bytes);
    assert!(packet_count > 4);
    assert_eq!(bos_count, 2, "each chained stream starts its own BOS page");
    assert_eq!(eos_count, 2, "each chained stream closes its own EOS page");
    assert_eq!(serials.len(), 2, "chained streams use distinct serial numbers");

    // Each stream must decode on its own, with its own fresh decoder
    // state, confirming packets were not misattributed across the chain
    // boundary (the bug this test exists to catch).
    let mut reader = ogg::reading::PacketReader::new(std::io::Cursor::new(&bytes));
    let mut header_packets_seen: std::collections::HashMap<u32, u8> = std::collections::HashMap::new();
    let mut decoders: std::collections::HashMap<u32, audiopus::coder::Decoder> = std::collections::HashMap::new();
    let mut decoded_per_stream: std::collections::HashMap<u32, usize> = std::collections::HashMap::new();
    let mut out_buf = vec![0.0f32; 5_760 * 2];
    while let Ok(Some(packet)) = reader.read_packet() {
        let serial = packet.stream_serial();
        let seen = header_packets_seen.entry(serial).or_insert(0);
        if *seen < 2 {
            *seen += 1; // ID header, then comment header.
            continue;
        }
        if packet.data.is_empty() {
            continue;
        }
        let decoder = decoders.entry(serial).or_insert_with(|| {
            audiopus::coder::Decoder::new(audiopus::SampleRate::Hz48000, audiopus::Channels::Stereo)
                .expect("decoder construction should succeed")
        });
        let len = decoder.decode_float(Some(&packet.data), &mut out_buf, false).unwrap();
        *decoded_per_stream.entry(serial).or_insert(0) += len;
    }

    assert_eq!(decoded_per_stream.len(), 2, "both chained streams decode audio");
    for samples in decoded_per_stream.values() {
        assert!(*samples > 0, "every chained stream must decode at least one non-empty frame");
    }
}

#[test]
fn s4_thousand_tags_round_trip_alongside_the_automatic_encoder_tag() {
    let mut encoder = new_pull_encoder(1, 48_000);
    {
        let comment = encoder.comment_mut().unwrap();
        for i in 0..1000 {
            comment.add_tag("TAG", &i.to_string()).unwrap();
        }
    }

    let pcm = vec![0.0f32; 4_800];
    encoder.write_float(&pcm, 4_800).unwrap();
    let mut bytes = drain_all_pages(&mut encoder);
    encoder.drain().unwrap();
    bytes.extend(drain_all_pages(&mut encoder));

    let mut reader = ogg::reading::PacketReader::new(std::io::Cursor::new(&bytes));
    reader.read_packet().unwrap(); // ID header, not the tags packet.
    let tags_packet = reader.read_packet().unwrap().expect("comment packet must exist");

    assert_eq!(&tags_packet.data[0..8], b"OpusTags");
    let vendor_len =
        u32::from_le_bytes(tags_packet.data[8..12].try_into().unwrap()) as usize;
    let count_offset = 12 + vendor_len;
    let count =
        u32::from_le_bytes(tags_packet.data[count_offset..count_offset + 4].try_into().unwrap());
    // 1000 user tags plus the automatic ENCODER tag injected on stream
    // initialization.
    assert_eq!(count, 1001);
}

#[test]
fn s5_serial_override_is_honored_on_the_only_bos_page() {
    let mut encoder = new_pull_encoder(1, 48_000);
    encoder.set_serial_number(0xDEAD_BEEF).unwrap();
    let pcm = vec![0.0f32; 4_800];
    encoder.write_float(&pcm, 4_800).unwrap();

    let mut bytes = drain_all_pages(&mut encoder);
    encoder.drain().unwrap();
    bytes.extend(drain_all_pages(&mut encoder));

    let (packet_count, bos_count, eos_count, serials) = scan_pages(&bytes);
    assert!(packet_count >= 2);
    assert_eq!(bos_count, 1);
    assert_eq!(eos_count, 1);
    assert_eq!(serials.len(), 1);
    assert!(serials.contains(&0xDEAD_BEEF));
}

#[test]
fn s6_drain_on_an_empty_encoder_emits_header_and_eos_only() {
    let mut encoder = new_pull_encoder(1, 48_000);
    encoder.drain().unwrap();
    let bytes = drain_all_pages(&mut encoder);

    let (packet_count, bos_count, eos_count, _serials) = scan_pages(&bytes);
    // ID header page + tags page + an empty EOS page.
    assert_eq!(packet_count, 3);
    assert_eq!(bos_count, 1);
    assert_eq!(eos_count, 1);
}
