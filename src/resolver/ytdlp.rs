use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use url::Url;

use super::{
    AudioDownloadTask, AudioType, DownloadTask, MediaBackend, ProgressSink, StreamDescriptor,
    VideoType,
};
use crate::download::{blocking, extract};
use crate::error::StreamError;

/// Resolves links with the `yt-dlp` executable, fetches streams over HTTP and
/// extracts audio with `ffmpeg`.
pub struct YtDlp {
    program: PathBuf,
    ffmpeg: PathBuf,
    chunk_size: usize,
}

impl YtDlp {
    pub fn new(program: PathBuf, ffmpeg: PathBuf, chunk_size: usize) -> Self {
        Self {
            program,
            ffmpeg,
            chunk_size,
        }
    }

    fn run<I, S>(&self, args: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command.args(args);
        debug!("Running {:?}", command);
        let output = command
            .output()
            .with_context(|| format!("Could not run {}", self.program.display()))?;
        if !output.status.success() {
            return Err(StreamError::ToolFailed {
                tool: self.program.display().to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            }
            .into());
        }
        Ok(output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct Info {
    title: String,
    duration: Option<f64>,
    webpage_url: Option<String>,
    #[serde(default)]
    formats: Vec<Format>,
}

#[derive(Debug, Deserialize)]
struct Format {
    format_id: String,
    #[serde(default)]
    ext: String,
    url: Option<String>,
    protocol: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    height: Option<u32>,
    abr: Option<f64>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
}

/// Turns `yt-dlp --dump-single-json` output into descriptors, keeping the format order.
fn parse_info(json: &[u8], link: &str) -> Result<Vec<StreamDescriptor>> {
    let info: Info = serde_json::from_slice(json)?;
    let page_url = info.webpage_url.clone().unwrap_or_else(|| link.to_owned());
    let duration = info
        .duration
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(Duration::from_secs_f64);

    let mut streams = Vec::with_capacity(info.formats.len());
    for format in info.formats {
        match format.protocol.as_deref() {
            None | Some("http") | Some("https") => {}
            Some(protocol) => {
                debug!("Skipping format {} served over {}", format.format_id, protocol);
                continue;
            }
        }

        let download_url = format.url.as_deref().map(Url::parse).transpose()?;
        let audio_type = format
            .acodec
            .as_deref()
            .map_or(AudioType::Unknown, AudioType::from_codec);
        let resolution = match format.vcodec.as_deref() {
            Some("none") => 0,
            _ => format.height.unwrap_or(0),
        };
        let mut http_headers: Vec<_> = format.http_headers.into_iter().collect();
        http_headers.sort();

        streams.push(StreamDescriptor {
            video_type: VideoType::from_extension(&format.ext),
            resolution,
            audio_type,
            audio_bitrate: format.abr.map_or(0, |abr| abr.round() as u32),
            can_extract_audio: matches!(audio_type, AudioType::Aac | AudioType::Mp3),
            requires_decryption: download_url.is_none(),
            download_url,
            title: info.title.clone(),
            duration,
            page_url: page_url.clone(),
            http_headers,
            format_id: format.format_id,
        });
    }
    Ok(streams)
}

impl MediaBackend for YtDlp {
    fn resolve_streams(&self, link: &str) -> Result<Vec<StreamDescriptor>> {
        let json = self.run(["--dump-single-json", "--no-playlist", "--no-warnings", link])?;
        parse_info(&json, link)
    }

    fn decrypt(&self, descriptor: &mut StreamDescriptor) -> Result<()> {
        let stdout = self.run([
            "--get-url",
            "--no-playlist",
            "--no-warnings",
            "-f",
            descriptor.format_id.as_str(),
            descriptor.page_url.as_str(),
        ])?;
        let stdout = String::from_utf8_lossy(&stdout);
        let url = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| StreamError::MissingUrl(descriptor.format_id.clone()))?;
        descriptor.download_url = Some(Url::parse(url)?);
        descriptor.requires_decryption = false;
        Ok(())
    }

    fn video_task(
        &self,
        descriptor: StreamDescriptor,
        destination: PathBuf,
    ) -> Box<dyn DownloadTask> {
        Box::new(VideoTask {
            descriptor,
            destination,
            chunk_size: self.chunk_size,
            on_download: None,
        })
    }

    fn audio_task(
        &self,
        descriptor: StreamDescriptor,
        destination: PathBuf,
    ) -> Box<dyn AudioDownloadTask> {
        Box::new(AudioTask {
            descriptor,
            destination,
            chunk_size: self.chunk_size,
            ffmpeg: self.ffmpeg.clone(),
            on_download: None,
            on_extraction: None,
        })
    }
}

fn report(sink: &Option<ProgressSink>, percent: f64) {
    if let Some(sink) = sink {
        sink(percent);
    }
}

struct VideoTask {
    descriptor: StreamDescriptor,
    destination: PathBuf,
    chunk_size: usize,
    on_download: Option<ProgressSink>,
}

impl DownloadTask for VideoTask {
    fn on_download_progress(&mut self, sink: ProgressSink) {
        self.on_download = Some(sink);
    }

    fn execute(self: Box<Self>) -> Result<()> {
        let client = blocking::client()?;
        blocking::fetch_to_file(
            &client,
            &self.descriptor,
            &self.destination,
            self.chunk_size,
            |percent| report(&self.on_download, percent),
        )?;
        Ok(())
    }
}

struct AudioTask {
    descriptor: StreamDescriptor,
    destination: PathBuf,
    chunk_size: usize,
    ffmpeg: PathBuf,
    on_download: Option<ProgressSink>,
    on_extraction: Option<ProgressSink>,
}

fn part_path(destination: &Path) -> PathBuf {
    let mut part = destination.as_os_str().to_owned();
    part.push(".part");
    PathBuf::from(part)
}

impl DownloadTask for AudioTask {
    fn on_download_progress(&mut self, sink: ProgressSink) {
        self.on_download = Some(sink);
    }

    fn execute(self: Box<Self>) -> Result<()> {
        let part = part_path(&self.destination);
        let client = blocking::client()?;
        blocking::fetch_to_file(
            &client,
            &self.descriptor,
            &part,
            self.chunk_size,
            |percent| report(&self.on_download, percent),
        )?;
        extract::extract_audio(
            &self.ffmpeg,
            &part,
            &self.destination,
            self.descriptor.duration,
            |percent| report(&self.on_extraction, percent),
        )?;
        fs::remove_file(&part)?;
        Ok(())
    }
}

impl AudioDownloadTask for AudioTask {
    fn on_extraction_progress(&mut self, sink: ProgressSink) {
        self.on_extraction = Some(sink);
    }
}
