//! Audio decoding and resampling to 16kHz mono f32.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::types::{ResultExt, TranscriptionError};

/// Sample rate whisper expects.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Decoded mono audio at [`TARGET_SAMPLE_RATE`].
#[derive(Debug)]
pub struct DecodedAudio {
    /// Mono samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate of the source before resampling.
    pub source_rate: u32,
    /// Source duration in seconds.
    pub duration_seconds: f64,
}

/// Decode the audio file at `path` into 16kHz mono f32 samples.
///
/// The file extension is used as a format hint; the container is still
/// probed, so a mislabeled file decodes as long as symphonia knows it.
pub fn decode_file(path: &Path) -> Result<DecodedAudio, TranscriptionError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        let _ = hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .audio_decode("probe failed")?;

    let mut format = probed.format;

    // Find the first audio track
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| TranscriptionError::AudioDecode("no audio track found".into()))?;

    let codec_params = track.codec_params.clone();
    let track_id = track.id;
    let source_rate = codec_params.sample_rate.unwrap_or(TARGET_SAMPLE_RATE);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .audio_decode("codec init failed")?;

    let mut mono: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(TranscriptionError::AudioDecode(format!("packet read: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            // Corrupt frame: skip it, keep the rest of the stream
            Err(SymphoniaError::DecodeError(e)) => {
                debug!(error = e, "skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(TranscriptionError::AudioDecode(format!("decode: {e}"))),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        downmix_into(sample_buf.samples(), channels, &mut mono);
    }

    if mono.is_empty() {
        return Err(TranscriptionError::AudioDecode(
            "no audio samples decoded".into(),
        ));
    }

    let duration_seconds = mono.len() as f64 / f64::from(source_rate);
    let samples = if source_rate == TARGET_SAMPLE_RATE {
        mono
    } else {
        resample(&mono, source_rate, TARGET_SAMPLE_RATE)?
    };

    debug!(
        source_rate,
        duration_seconds,
        samples = samples.len(),
        "decoded audio"
    );

    Ok(DecodedAudio {
        samples,
        source_rate,
        duration_seconds,
    })
}

/// Average interleaved frames down to one channel.
fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels == 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

/// Resample mono audio from `from_rate` to `to_rate` using rubato.
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, TranscriptionError> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let chunk_size = 1024;

    let mut resampler =
        SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1).resample("init")?;

    let expected_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(expected_len + chunk_size);

    for chunk in samples.chunks(chunk_size) {
        let input = if chunk.len() < chunk_size {
            // Pad last chunk with zeros
            let mut padded = chunk.to_vec();
            padded.resize(chunk_size, 0.0);
            vec![padded]
        } else {
            vec![chunk.to_vec()]
        };

        let resampled = resampler.process(&input, None).resample("process")?;

        if let Some(channel) = resampled.first() {
            output.extend_from_slice(channel);
        }
    }

    // Drop the tail produced by zero padding
    output.truncate(expected_len);
    Ok(output)
}
