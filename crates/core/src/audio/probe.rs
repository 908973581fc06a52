use std::path::Path;

use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::channel::AudioError;

/// Read the track length from the container headers without decoding.
///
/// Returns `Ok(None)` when the container doesn't declare a frame count,
/// which is common for VBR mp3 files without a Xing header.
pub fn probe_duration<P: AsRef<Path>>(path: P) -> Result<Option<f64>, AudioError> {
    let path = path.as_ref();

    let file = std::fs::File::open(path).map_err(|source| AudioError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let duration = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .and_then(|track| {
            let sample_rate = track.codec_params.sample_rate?;
            let frames = track.codec_params.n_frames?;
            (sample_rate > 0).then(|| frames as f64 / sample_rate as f64)
        })
        .filter(|seconds| *seconds > 0.0);

    Ok(duration)
}
