mod common;

use common::{decoded_samples, packets, parse_pages, pcm_frames, tone, FailingSink, StubEncoder};
use opusmux::{
    EncoderConfig, FrameDuration, IdHeader, OggOpusError, OggOpusWriter, OpusTags, WriterOptions,
};

const STEREO_FRAME_BYTES: usize = 960 * 2 * 2;

fn encode_to_vec(encoder: StubEncoder, options: WriterOptions, chunks: &[&[u8]]) -> Vec<u8> {
    let mut writer = OggOpusWriter::with_options(Vec::new(), encoder, options).unwrap();
    for chunk in chunks {
        writer.write(chunk).unwrap();
    }
    writer.into_inner().unwrap().unwrap()
}

#[test]
fn test_empty_stream_has_headers_and_terminal_page() {
    let out = encode_to_vec(StubEncoder::stereo_48k(), WriterOptions::new(), &[&[]]);
    let pages = parse_pages(&out);

    assert_eq!(pages.len(), 3);
    assert!(pages[0].header.is_bos());
    assert!(pages[2].header.is_eos());
    assert!(pages[2].data.is_empty());
    assert_eq!(decoded_samples(&pages, 312), 0);
}

#[test]
fn test_close_without_write() {
    let mut out = Vec::new();
    let mut writer = OggOpusWriter::new(&mut out, StubEncoder::stereo_48k()).unwrap();
    writer.close().unwrap();
    drop(writer);

    let pages = parse_pages(&out);
    assert_eq!(pages.len(), 3);
    let head = IdHeader::parse(&pages[0].data).unwrap();
    assert_eq!(head.pre_skip, 312);
}

#[test]
fn test_single_frame() {
    let out = encode_to_vec(
        StubEncoder::stereo_48k(),
        WriterOptions::new(),
        &[&vec![0u8; STEREO_FRAME_BYTES][..]],
    );
    let pages = parse_pages(&out);

    assert_eq!(pages.len(), 4);
    assert_eq!(pages[2].header.granule_position, 312 + 960);
    assert_eq!(pages[2].packets().len(), 1);
    assert_eq!(decoded_samples(&pages, 312), 960);
}

#[test]
fn test_many_frames_in_one_write() {
    let encoder = StubEncoder::stereo_48k();
    let pcm = pcm_frames(&encoder.config, 50);
    let out = encode_to_vec(encoder, WriterOptions::new(), &[&pcm[..]]);
    let pages = parse_pages(&out);

    let all = packets(&pages);
    let audio = &all[2..];
    assert_eq!(audio.len(), 50);
    assert!(audio.iter().all(|p| p[0] == 0xf8));
    assert_eq!(decoded_samples(&pages, 312), 50 * 960);
}

#[test]
fn test_partial_frame_is_dropped_on_close() {
    // 500 stereo samples: less than one 20 ms frame
    let options = WriterOptions::new().with_pre_skip(500);
    let out = encode_to_vec(StubEncoder::stereo_48k(), options, &[&vec![0u8; 500 * 4][..]]);
    let pages = parse_pages(&out);

    let head = IdHeader::parse(&pages[0].data).unwrap();
    assert_eq!(head.pre_skip, 500);
    assert_eq!(pages.len(), 3);
    assert_eq!(decoded_samples(&pages, 500), 0);
}

#[test]
fn test_chunking_does_not_change_output() {
    let pcm = tone(48_000, 2, 960 * 7 + 100);
    let options = || WriterOptions::new().with_serial(0x5eed);

    let whole = encode_to_vec(StubEncoder::stereo_48k(), options(), &[&pcm[..]]);

    let mut writer = OggOpusWriter::with_options(Vec::new(), StubEncoder::stereo_48k(), options()).unwrap();
    for chunk in pcm.chunks(4 * 333) {
        writer.write(chunk).unwrap();
    }
    let chunked = writer.into_inner().unwrap().unwrap();

    // Page boundaries differ, packets and final granule do not
    let (a, b) = (parse_pages(&whole), parse_pages(&chunked));
    assert_eq!(packets(&a), packets(&b));
    assert_eq!(decoded_samples(&a, 312), 7 * 960);
    assert_eq!(decoded_samples(&b, 312), 7 * 960);
}

#[test]
fn test_five_seconds_stereo() {
    let pcm = tone(48_000, 2, 48_000 * 5);
    let mut writer = OggOpusWriter::new(Vec::new(), StubEncoder::stereo_48k()).unwrap();
    for chunk in pcm.chunks(4096) {
        writer.write(chunk).unwrap();
    }
    assert_eq!(writer.samples_encoded(), 240_000);
    let out = writer.into_inner().unwrap().unwrap();
    let pages = parse_pages(&out);

    assert_eq!(packets(&pages).len(), 2 + 250);
    assert_eq!(decoded_samples(&pages, 312), 240_000);
}

#[test]
fn test_page_invariants() {
    let encoder = StubEncoder::stereo_48k().with_packet_len(120);
    let pcm = pcm_frames(&encoder.config, 120);
    let (first, second) = pcm.split_at(pcm.len() / 2);
    let out = encode_to_vec(encoder, WriterOptions::new().with_serial(77), &[first, second]);
    let pages = parse_pages(&out);

    let last = pages.len() - 1;
    let mut previous_granule = 0;
    for (i, page) in pages.iter().enumerate() {
        assert_eq!(page.header.page_sequence, i as u32);
        assert_eq!(page.header.bitstream_serial, 77);
        assert!(page.verify_checksum());
        assert_eq!(page.header.is_bos(), i == 0);
        assert_eq!(page.header.is_eos(), i == last);
        if let Some(granule) = page.granule() {
            assert!(granule >= previous_granule);
            previous_granule = granule;
        }
    }
    assert_eq!(pages[0].header.granule_position, 0);
    assert_eq!(pages[1].header.granule_position, 0);
    assert_eq!(previous_granule, 312 + 120 * 960);
}

#[test]
fn test_headers_occupy_first_two_pages() {
    let options = WriterOptions::new()
        .with_output_gain(-256)
        .with_vendor("custom vendor")
        .with_comment("TITLE", "Test Tone")
        .with_comment("ENCODER", "opusmux");
    let out = encode_to_vec(StubEncoder::new(16_000, 1), options, &[&[0u8; 640]]);
    let pages = parse_pages(&out);

    assert_eq!(pages[0].packets().len(), 1);
    let head = IdHeader::parse(&pages[0].data).unwrap();
    assert_eq!(head.version, 1);
    assert_eq!(head.channels, 1);
    assert_eq!(head.input_sample_rate, 16_000);
    assert_eq!(head.output_gain, -256);
    assert_eq!(head.channel_mapping_family, 0);

    assert_eq!(pages[1].packets().len(), 1);
    let tags = OpusTags::parse(&pages[1].data).unwrap();
    assert_eq!(tags.vendor_string, "custom vendor");
    assert_eq!(tags.get("title").map(String::as_str), Some("Test Tone"));
    assert_eq!(tags.comments.len(), 2);
}

#[test]
fn test_default_comment_header_is_minimal() {
    let out = encode_to_vec(StubEncoder::stereo_48k(), WriterOptions::new(), &[&[]]);
    let pages = parse_pages(&out);

    let tags = &pages[1].data;
    assert_eq!(&tags[0..8], b"OpusTags");
    assert_eq!(&tags[8..12], &12u32.to_le_bytes());
    assert_eq!(&tags[12..24], b"stub encoder");
    assert_eq!(&tags[24..28], &[0, 0, 0, 0]);
    assert_eq!(tags.len(), 28);
}

#[test]
fn test_granule_counts_at_48k() {
    let encoder = StubEncoder::new(16_000, 1);
    let pcm = pcm_frames(&encoder.config, 10);
    let out = encode_to_vec(encoder, WriterOptions::new().with_pre_skip(0), &[&pcm[..]]);
    let pages = parse_pages(&out);

    // 10 x 320 samples at 16 kHz
    assert_eq!(decoded_samples(&pages, 0), 9_600);
}

#[test]
fn test_lookahead_is_advertised_unconverted() {
    // A 16 kHz encoder reporting its delay at the input rate
    let mut encoder = StubEncoder::new(16_000, 1);
    encoder.lookahead = 104;
    let pcm = pcm_frames(&encoder.config, 1);
    let out = encode_to_vec(encoder, WriterOptions::new(), &[&pcm[..]]);
    let pages = parse_pages(&out);

    assert_eq!(IdHeader::parse(&pages[0].data).unwrap().pre_skip, 104);
    assert_eq!(pages[2].header.granule_position, 104 + 960);
    assert_eq!(decoded_samples(&pages, 104), 960);
}

#[test]
fn test_short_frames() {
    let mut encoder = StubEncoder::new(8_000, 1);
    encoder.config.frame_duration = FrameDuration::Ms2_5;
    assert_eq!(encoder.config.frame_samples(), 20);

    let out = encode_to_vec(encoder, WriterOptions::new(), &[&[0u8; 20 * 2 * 4 + 2]]);
    let pages = parse_pages(&out);
    assert_eq!(packets(&pages).len(), 2 + 4);
    assert_eq!(decoded_samples(&pages, 312), 4 * 20 * 6);
}

#[test]
fn test_write_after_close() {
    let mut writer = OggOpusWriter::new(Vec::new(), StubEncoder::stereo_48k()).unwrap();
    writer.close().unwrap();

    assert!(matches!(writer.write(&[0u8; 4]), Err(OggOpusError::Closed)));
    assert!(matches!(writer.write(&[]), Err(OggOpusError::Closed)));
}

#[test]
fn test_close_is_idempotent() {
    let mut writer = OggOpusWriter::new(Vec::new(), StubEncoder::stereo_48k()).unwrap();
    writer.write(&vec![0u8; STEREO_FRAME_BYTES]).unwrap();
    writer.close().unwrap();
    let pages_after_first = writer.next_page_sequence();
    writer.close().unwrap();

    assert!(writer.is_closed());
    assert_eq!(writer.next_page_sequence(), pages_after_first);
    let out = writer.into_inner().unwrap().unwrap();
    assert_eq!(parse_pages(&out).len(), 4);
}

#[test]
fn test_external_sink_stays_usable() {
    let mut out = Vec::new();
    {
        let mut writer = OggOpusWriter::new(&mut out, StubEncoder::stereo_48k()).unwrap();
        writer.write(&vec![0u8; STEREO_FRAME_BYTES]).unwrap();
        writer.close().unwrap();
    }
    let stream_len = out.len();
    out.extend_from_slice(b"trailer");

    assert_eq!(&out[stream_len..], b"trailer");
    assert_eq!(parse_pages(&out[..stream_len]).len(), 4);
}

#[test]
fn test_owned_file_sink() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.opus");

    let mut writer = OggOpusWriter::create(&path, StubEncoder::new(24_000, 1)).unwrap();
    writer.write(&tone(24_000, 1, 24_000)).unwrap();
    writer.close().unwrap();
    assert!(writer.get_ref().is_none());
    assert!(writer.into_inner().unwrap().is_none());

    let pages = parse_pages(&std::fs::read(&path).unwrap());
    assert_eq!(decoded_samples(&pages, 312), 48_000);
}

#[test]
fn test_invalid_config_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never.opus");

    let encoder = StubEncoder::new(44_100, 2);
    let err = OggOpusWriter::create(&path, encoder).err().unwrap();
    assert!(matches!(err, OggOpusError::InvalidConfig(_)));
    assert!(!path.exists());
}

#[test]
fn test_unopenable_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.opus");

    let err = OggOpusWriter::create(&path, StubEncoder::stereo_48k()).err().unwrap();
    assert!(matches!(err, OggOpusError::Io(_)));
}

#[test]
fn test_misaligned_write() {
    let mut writer = OggOpusWriter::new(Vec::new(), StubEncoder::stereo_48k()).unwrap();
    let err = writer.write(&[0u8; 7]).unwrap_err();
    assert!(matches!(err, OggOpusError::InvalidInput { len: 7, align: 4 }));
    assert!(writer.is_broken());
    assert!(writer.close().is_err());
    writer.close().unwrap();
}

#[test]
fn test_sink_failure_breaks_writer() {
    // Room for the ID header page but not the comment header page
    let mut writer = OggOpusWriter::new(FailingSink::new(60), StubEncoder::stereo_48k()).unwrap();

    let err = writer.write(&vec![0u8; STEREO_FRAME_BYTES]).unwrap_err();
    assert!(matches!(err, OggOpusError::SinkWrite(_)));
    assert!(err.is_sink_error());
    assert!(writer.is_broken());

    let again = writer.write(&[]).unwrap_err();
    assert!(matches!(again, OggOpusError::SinkWrite(_)));
    assert_eq!(again.to_string(), err.to_string());

    let on_close = writer.close().unwrap_err();
    assert_eq!(on_close.to_string(), err.to_string());
    assert!(writer.is_closed());
    writer.close().unwrap();
    assert!(matches!(writer.write(&[]), Err(OggOpusError::Closed)));

    let sink = writer.into_inner().unwrap().unwrap();
    assert_eq!(parse_pages(&sink.written).len(), 1);
}

#[test]
fn test_into_inner_returns_sink_of_broken_writer() {
    let mut writer = OggOpusWriter::new(FailingSink::new(60), StubEncoder::stereo_48k()).unwrap();
    let err = writer.write(&vec![0u8; STEREO_FRAME_BYTES]).unwrap_err();

    let failed = writer.into_inner().unwrap_err();
    assert!(matches!(failed.error(), OggOpusError::SinkWrite(_)));
    assert_eq!(failed.error().to_string(), err.to_string());

    let sink = failed.into_inner().expect("caller keeps its sink");
    assert_eq!(sink.budget, 60);
    assert_eq!(parse_pages(&sink.written).len(), 1);
}

#[test]
fn test_into_inner_error_converts() {
    fn finish(writer: OggOpusWriter<FailingSink, StubEncoder>) -> opusmux::Result<Option<FailingSink>> {
        Ok(writer.into_inner()?)
    }

    let mut writer = OggOpusWriter::new(FailingSink::new(0), StubEncoder::stereo_48k()).unwrap();
    assert!(writer.write(&[]).is_err());
    assert!(matches!(finish(writer), Err(OggOpusError::SinkWrite(_))));
}

#[test]
fn test_encoder_failure_keeps_earlier_pages() {
    let encoder = StubEncoder::stereo_48k().failing_at(3);
    let pcm = pcm_frames(&encoder.config, 5);
    let mut out = Vec::new();
    let mut writer = OggOpusWriter::new(&mut out, encoder).unwrap();

    let err = writer.write(&pcm).unwrap_err();
    assert!(matches!(&err, OggOpusError::EncodingFailed(e) if e.message() == "stub encoder failure"));
    assert_eq!(writer.samples_encoded(), 3 * 960);
    assert!(writer.close().is_err());
    drop(writer);

    // Only the header pages reached the sink: audio pages are emitted per write
    let pages = parse_pages(&out);
    assert_eq!(pages.len(), 2);
    assert!(!pages.iter().any(|p| p.header.is_eos()));
}

#[test]
fn test_drop_finishes_stream() {
    let mut out = Vec::new();
    {
        let mut writer = OggOpusWriter::new(&mut out, StubEncoder::stereo_48k()).unwrap();
        writer.write(&vec![0u8; STEREO_FRAME_BYTES * 2]).unwrap();
    }
    let pages = parse_pages(&out);
    assert!(pages.last().unwrap().header.is_eos());
    assert_eq!(decoded_samples(&pages, 312), 1920);
}

#[test]
fn test_config_from_json() {
    let config = EncoderConfig::from_json(
        r#"{"sample_rate": 12000, "channels": 2, "frame_duration": 40, "application": "voip"}"#,
    )
    .unwrap();
    assert_eq!(config.frame_samples(), 480);

    let mut encoder = StubEncoder::new(12_000, 2);
    encoder.config = config;
    let pcm = pcm_frames(&encoder.config, 3);
    let out = encode_to_vec(encoder, WriterOptions::new(), &[&pcm[..]]);
    assert_eq!(decoded_samples(&parse_pages(&out), 312), 3 * 480 * 4);
}
