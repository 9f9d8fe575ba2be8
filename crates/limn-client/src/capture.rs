//! Local media acquisition for the publisher flow. Video only; no audio
//! track is ever created.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;

use limn_canvas::VideoFrame;

use crate::media::test_pattern;
use crate::session::EventLog;

/// Why media acquisition failed, in the three buckets the caller cares
/// about.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no camera device was found")]
    NoDevice,

    #[error("camera access was denied")]
    PermissionDenied,

    #[error("capture error: {0}")]
    Other(String),
}

impl From<io::Error> for CaptureError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => CaptureError::NoDevice,
            io::ErrorKind::PermissionDenied => CaptureError::PermissionDenied,
            _ => CaptureError::Other(err.to_string()),
        }
    }
}

/// Acquisition failure handling: a missing device and unknown failures are
/// logged; a permission denial is the user cancelling, and stays silent.
pub fn log_acquire_error(log: &EventLog, err: &CaptureError) {
    match err {
        CaptureError::NoDevice => {
            log.append("Unable to open your camera: no capture device was found.");
        }
        CaptureError::PermissionDenied => {}
        CaptureError::Other(msg) => {
            log.append(format!("Error opening your camera: {msg}"));
        }
    }
}

/// One captured video sample plus an optional decoded preview frame for
/// the local render path.
pub struct CaptureSample {
    pub payload: Bytes,
    pub preview: Option<VideoFrame>,
}

/// A paced source of video samples. Pacing is the caller's job; sources
/// return the next sample immediately.
pub trait CaptureSource: Send {
    fn next_sample(&mut self) -> Result<CaptureSample, CaptureError>;
}

/// What to acquire.
pub struct CaptureConfig {
    pub device: Option<PathBuf>,
    pub test_pattern: bool,
    pub width: u32,
    pub height: u32,
}

/// Open a capture source per config: an explicit device node when given,
/// otherwise the synthetic pattern.
pub fn acquire(config: &CaptureConfig) -> Result<Box<dyn CaptureSource>, CaptureError> {
    if config.test_pattern {
        return Ok(Box::new(TestPatternSource::new(config.width, config.height)));
    }
    match config.device.as_deref() {
        Some(device) => Ok(Box::new(DeviceSource::open(device)?)),
        None => Ok(Box::new(TestPatternSource::new(config.width, config.height))),
    }
}

/// Synthetic moving-bar source; payloads are filler bytes standing in for
/// an encoded bitstream, previews are real frames.
pub struct TestPatternSource {
    width: u32,
    height: u32,
    seq: u64,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            seq: 0,
        }
    }
}

impl CaptureSource for TestPatternSource {
    fn next_sample(&mut self) -> Result<CaptureSample, CaptureError> {
        let frame = test_pattern(self.width, self.height, self.seq);
        self.seq += 1;
        Ok(CaptureSample {
            payload: Bytes::from(vec![0x99; 1200]),
            preview: Some(frame),
        })
    }
}

/// Reads raw chunks from a capture node that supports read() I/O. No
/// preview frames; the payload goes straight onto the track.
#[derive(Debug)]
pub struct DeviceSource {
    file: File,
    buf: Vec<u8>,
}

impl DeviceSource {
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let file = File::open(path)?;
        Ok(Self {
            file,
            buf: vec![0u8; 64 * 1024],
        })
    }
}

impl CaptureSource for DeviceSource {
    fn next_sample(&mut self) -> Result<CaptureSample, CaptureError> {
        let n = self.file.read(&mut self.buf)?;
        if n == 0 {
            return Err(CaptureError::Other("capture device closed".into()));
        }
        Ok(CaptureSample {
            payload: Bytes::copy_from_slice(&self.buf[..n]),
            preview: None,
        })
    }
}
