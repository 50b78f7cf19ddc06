//! In-memory backend for tests. Tasks write the format id into the destination.

use super::*;
use anyhow::bail;
use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;

pub fn descriptor(title: &str, video_type: VideoType, resolution: u32) -> StreamDescriptor {
    StreamDescriptor {
        format_id: format!("{title}-{resolution}"),
        video_type,
        resolution,
        audio_type: AudioType::Aac,
        audio_bitrate: 0,
        can_extract_audio: false,
        requires_decryption: false,
        download_url: None,
        title: title.to_owned(),
        duration: None,
        page_url: String::new(),
        http_headers: Vec::new(),
    }
}

pub fn audio(title: &str, bitrate: u32) -> StreamDescriptor {
    StreamDescriptor {
        format_id: format!("{title}-{bitrate}k"),
        audio_bitrate: bitrate,
        can_extract_audio: true,
        ..descriptor(title, VideoType::Mp4, 0)
    }
}

#[derive(Default)]
pub struct FakeBackend {
    streams: HashMap<String, Vec<StreamDescriptor>>,
    pub resolved: Mutex<Vec<String>>,
    pub decrypted: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn with(mut self, link: &str, streams: Vec<StreamDescriptor>) -> Self {
        self.streams.insert(link.to_owned(), streams);
        self
    }
}

impl MediaBackend for FakeBackend {
    fn resolve_streams(&self, link: &str) -> anyhow::Result<Vec<StreamDescriptor>> {
        self.resolved.lock().unwrap().push(link.to_owned());
        match self.streams.get(link) {
            Some(streams) => Ok(streams.clone()),
            None => bail!("Unsupported link: {link}"),
        }
    }

    fn decrypt(&self, descriptor: &mut StreamDescriptor) -> anyhow::Result<()> {
        self.decrypted
            .lock()
            .unwrap()
            .push(descriptor.format_id.clone());
        descriptor.requires_decryption = false;
        Ok(())
    }

    fn video_task(
        &self,
        descriptor: StreamDescriptor,
        destination: PathBuf,
    ) -> Box<dyn DownloadTask> {
        Box::new(FakeTask::new(descriptor, destination))
    }

    fn audio_task(
        &self,
        descriptor: StreamDescriptor,
        destination: PathBuf,
    ) -> Box<dyn AudioDownloadTask> {
        Box::new(FakeTask::new(descriptor, destination))
    }
}

struct FakeTask {
    descriptor: StreamDescriptor,
    destination: PathBuf,
    on_download: Option<ProgressSink>,
    on_extraction: Option<ProgressSink>,
}

impl FakeTask {
    fn new(descriptor: StreamDescriptor, destination: PathBuf) -> Self {
        Self {
            descriptor,
            destination,
            on_download: None,
            on_extraction: None,
        }
    }
}

impl DownloadTask for FakeTask {
    fn on_download_progress(&mut self, sink: ProgressSink) {
        self.on_download = Some(sink);
    }

    fn execute(self: Box<Self>) -> anyhow::Result<()> {
        if self.descriptor.requires_decryption {
            bail!("{} was not decrypted", self.descriptor.format_id);
        }
        if let Some(sink) = &self.on_download {
            for percent in [0.0, 50.0, 100.0] {
                sink(percent);
            }
        }
        fs::write(&self.destination, self.descriptor.format_id.as_bytes())?;
        if let Some(sink) = &self.on_extraction {
            for percent in [0.0, 100.0] {
                sink(percent);
            }
        }
        Ok(())
    }
}

impl AudioDownloadTask for FakeTask {
    fn on_extraction_progress(&mut self, sink: ProgressSink) {
        self.on_extraction = Some(sink);
    }
}
