//! Stream descriptors and the backend contract used to resolve and fetch them.
//!
//! The orchestrator never talks to a site directly. It asks a [`MediaBackend`]
//! for every encoding a page offers, picks one, and hands it back to the
//! backend as a download task.

#[cfg(test)]
pub mod fake;
mod ytdlp;

pub use ytdlp::YtDlp;

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Receives percentages in `0..=100` while a task runs, possibly from a worker thread.
pub type ProgressSink = Box<dyn Fn(f64) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoType {
    Mp4,
    WebM,
    Flash,
    Mobile,
    Unknown,
}

impl VideoType {
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "mp4" | "m4a" => VideoType::Mp4,
            "webm" => VideoType::WebM,
            "flv" => VideoType::Flash,
            "3gp" => VideoType::Mobile,
            _ => VideoType::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioType {
    Aac,
    Mp3,
    Vorbis,
    Opus,
    Unknown,
}

impl AudioType {
    pub fn from_codec(codec: &str) -> Self {
        let codec = codec.to_ascii_lowercase();
        if codec.starts_with("mp4a") || codec == "aac" {
            AudioType::Aac
        } else if codec.starts_with("mp3") {
            AudioType::Mp3
        } else if codec.starts_with("vorbis") {
            AudioType::Vorbis
        } else if codec.starts_with("opus") {
            AudioType::Opus
        } else {
            AudioType::Unknown
        }
    }
}

/// One available encoding of a video.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    pub format_id: String,
    pub video_type: VideoType,
    /// Frame height; 0 for audio-only streams.
    pub resolution: u32,
    pub audio_type: AudioType,
    /// kbps
    pub audio_bitrate: u32,
    pub can_extract_audio: bool,
    pub requires_decryption: bool,
    pub download_url: Option<Url>,
    pub title: String,
    pub duration: Option<Duration>,
    pub page_url: String,
    pub http_headers: Vec<(String, String)>,
}

impl StreamDescriptor {
    pub fn video_extension(&self) -> &'static str {
        match self.video_type {
            VideoType::Mp4 => ".mp4",
            VideoType::WebM => ".webm",
            VideoType::Flash => ".flv",
            VideoType::Mobile => ".3gp",
            VideoType::Unknown => "",
        }
    }

    pub fn audio_extension(&self) -> &'static str {
        match self.audio_type {
            AudioType::Aac => ".aac",
            AudioType::Mp3 => ".mp3",
            AudioType::Vorbis => ".ogg",
            AudioType::Opus => ".opus",
            AudioType::Unknown => "",
        }
    }
}

/// Site resolution plus the download machinery for what it resolves.
pub trait MediaBackend: Send + Sync {
    /// Every encoding the page at `link` offers, in the backend's own order.
    fn resolve_streams(&self, link: &str) -> anyhow::Result<Vec<StreamDescriptor>>;

    /// Makes `descriptor.download_url` usable. Only needed when `requires_decryption` is set.
    fn decrypt(&self, descriptor: &mut StreamDescriptor) -> anyhow::Result<()>;

    fn video_task(
        &self,
        descriptor: StreamDescriptor,
        destination: PathBuf,
    ) -> Box<dyn DownloadTask>;

    fn audio_task(
        &self,
        descriptor: StreamDescriptor,
        destination: PathBuf,
    ) -> Box<dyn AudioDownloadTask>;
}

pub trait DownloadTask: Send {
    fn on_download_progress(&mut self, sink: ProgressSink);

    /// Runs to completion on the calling thread.
    fn execute(self: Box<Self>) -> anyhow::Result<()>;
}

/// A download followed by extraction of the audio track into the destination.
pub trait AudioDownloadTask: DownloadTask {
    fn on_extraction_progress(&mut self, sink: ProgressSink);
}
