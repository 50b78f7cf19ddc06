pub mod blocking;
pub mod extract;
pub mod progress;
#[cfg(test)]
pub mod testing;
pub mod utils;

use anyhow::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ArgumentError, StreamError};
use crate::resolver::{MediaBackend, ProgressSink, StreamDescriptor, VideoType};
use progress::ProgressRenderer;

/// The audio-only mp4 stream with the highest bitrate. The first one wins a tie.
pub fn select_audio_stream(
    streams: Vec<StreamDescriptor>,
) -> Result<StreamDescriptor, ArgumentError> {
    streams
        .into_iter()
        .filter(|s| s.video_type == VideoType::Mp4 && s.resolution == 0 && s.can_extract_audio)
        .rev()
        .max_by_key(|s| s.audio_bitrate)
        .ok_or(ArgumentError::AudioNotExtractable)
}

/// The first 360p mp4 stream, in the order the backend listed them.
pub fn select_video_stream(
    streams: Vec<StreamDescriptor>,
    link: &str,
) -> Result<StreamDescriptor, StreamError> {
    streams
        .into_iter()
        .find(|s| s.video_type == VideoType::Mp4 && s.resolution == 360)
        .ok_or_else(|| StreamError::NoVideoStream(link.to_owned()))
}

fn sink<W>(
    renderer: &Arc<ProgressRenderer<W>>,
    label: String,
    scale: fn(f64) -> f64,
) -> ProgressSink
where
    W: Write + Send + 'static,
{
    let renderer = Arc::clone(renderer);
    Box::new(move |percent| renderer.render(&label, scale(percent)))
}

/// Downloads the best audio track of `link` into `folder` and returns the file written.
pub fn download_audio<W>(
    backend: &dyn MediaBackend,
    renderer: &Arc<ProgressRenderer<W>>,
    link: &str,
    folder: &Path,
) -> Result<PathBuf>
where
    W: Write + Send + 'static,
{
    let mut descriptor = select_audio_stream(backend.resolve_streams(link)?)?;
    if descriptor.requires_decryption {
        backend.decrypt(&mut descriptor)?;
    }

    let destination =
        utils::build_download_path(folder, &descriptor.title, descriptor.audio_extension());
    let mut task = backend.audio_task(descriptor, destination.clone());
    // Downloading fills the bar up to 85%, extraction the rest.
    task.on_download_progress(sink(renderer, format!("Downloading {link}"), |p| p * 0.85));
    task.on_extraction_progress(sink(renderer, format!(" Extracting {link}"), |p| {
        85.0 + p * 0.15
    }));
    task.execute()?;
    Ok(destination)
}

/// Downloads the 360p mp4 of `link` into `folder` and returns the file written.
pub fn download_video<W>(
    backend: &dyn MediaBackend,
    renderer: &Arc<ProgressRenderer<W>>,
    link: &str,
    folder: &Path,
) -> Result<PathBuf>
where
    W: Write + Send + 'static,
{
    let mut descriptor = select_video_stream(backend.resolve_streams(link)?, link)?;
    if descriptor.requires_decryption {
        backend.decrypt(&mut descriptor)?;
    }

    let destination =
        utils::build_download_path(folder, &descriptor.title, descriptor.video_extension());
    let mut task = backend.video_task(descriptor, destination.clone());
    task.on_download_progress(sink(renderer, format!("Downloading {link}"), |p| p));
    task.execute()?;
    Ok(destination)
}
