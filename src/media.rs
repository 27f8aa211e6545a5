use std::f32::consts::PI;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Instant;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use log::{debug, info, warn};
use thiserror::Error;

const JPEG_QUALITY: u8 = 85;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Device not found: {0}")]
    NotFound(String),
    #[error("Media I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

pub type Result<T> = std::result::Result<T, MediaError>;

/// One decoded camera frame, tightly packed RGB8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

pub trait CameraStream: Send {
    /// The latest decoded frame, or `None` while the camera is still warming
    /// up or after it was stopped.
    fn current_frame(&mut self) -> Option<VideoFrame>;
    fn stop(&mut self);
    fn is_active(&self) -> bool;
}

pub trait MicrophoneStream: Send {
    fn sample_rate(&self) -> u32;
    /// Mono samples in `[-1.0, 1.0]` captured since the previous call.
    fn drain(&mut self) -> Vec<f32>;
    fn stop(&mut self);
}

/// Access to capture hardware. Both calls may prompt the user and fail
/// with `PermissionDenied`.
pub trait MediaDevices: Send + Sync {
    fn open_camera(&self) -> Result<Box<dyn CameraStream>>;
    fn open_microphone(&self) -> Result<Box<dyn MicrophoneStream>>;
}

/// Encodes a frame as the JPEG still uploaded for emotion analysis.
pub fn encode_jpeg(frame: &VideoFrame) -> Result<Vec<u8>> {
    let expected = frame.width as usize * frame.height as usize * 3;
    if frame.width == 0 || frame.height == 0 || frame.rgb.len() != expected {
        return Err(MediaError::InvalidFrame(format!(
            "{}x{} frame with {} bytes",
            frame.width,
            frame.height,
            frame.rgb.len()
        )));
    }

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode(
        &frame.rgb,
        frame.width,
        frame.height,
        ColorType::Rgb8,
    )?;
    Ok(jpeg)
}

/// Encodes mono samples as 16-bit PCM WAV.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}

/// Devices that always refuse access.
pub struct NoDevices;

impl MediaDevices for NoDevices {
    fn open_camera(&self) -> Result<Box<dyn CameraStream>> {
        Err(MediaError::PermissionDenied("camera access was not granted".to_string()))
    }

    fn open_microphone(&self) -> Result<Box<dyn MicrophoneStream>> {
        Err(MediaError::PermissionDenied("microphone access was not granted".to_string()))
    }
}

/// Devices backed by files: camera frames cycle through the images in a
/// directory, and the microphone plays back a WAV file in real time.
/// A source that is not configured behaves as a denied permission.
#[derive(Clone, Debug, Default)]
pub struct FileDevices {
    pub camera_dir: Option<PathBuf>,
    pub microphone_wav: Option<PathBuf>,
}

impl FileDevices {
    pub fn new(camera_dir: Option<PathBuf>, microphone_wav: Option<PathBuf>) -> Self {
        Self {
            camera_dir,
            microphone_wav,
        }
    }
}

impl MediaDevices for FileDevices {
    fn open_camera(&self) -> Result<Box<dyn CameraStream>> {
        let dir = self
            .camera_dir
            .as_ref()
            .ok_or_else(|| MediaError::PermissionDenied("no camera source configured".to_string()))?;

        let frames = list_images(dir)?;
        if frames.is_empty() {
            return Err(MediaError::NotFound(format!("no images in {}", dir.display())));
        }

        info!("📹 Camera opened from {} ({} frames)", dir.display(), frames.len());
        Ok(Box::new(FileCamera {
            frames,
            next: 0,
            active: true,
        }))
    }

    fn open_microphone(&self) -> Result<Box<dyn MicrophoneStream>> {
        let path = self.microphone_wav.as_ref().ok_or_else(|| {
            MediaError::PermissionDenied("no microphone source configured".to_string())
        })?;
        if !path.exists() {
            return Err(MediaError::NotFound(path.display().to_string()));
        }

        let (samples, sample_rate) = read_wav_mono(path)?;
        info!(
            "🎤 Microphone opened from {} ({} samples @ {} Hz)",
            path.display(),
            samples.len(),
            sample_rate
        );
        Ok(Box::new(FileMicrophone {
            samples,
            sample_rate,
            position: 0,
            opened_at: Instant::now(),
            active: true,
        }))
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
                .unwrap_or(false)
        })
        .collect();
    frames.sort();
    Ok(frames)
}

fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

struct FileCamera {
    frames: Vec<PathBuf>,
    next: usize,
    active: bool,
}

impl CameraStream for FileCamera {
    fn current_frame(&mut self) -> Option<VideoFrame> {
        if !self.active {
            return None;
        }
        let path = &self.frames[self.next % self.frames.len()];
        self.next = self.next.wrapping_add(1);

        match image::open(path) {
            Ok(img) => {
                let rgb = img.to_rgb8();
                Some(VideoFrame {
                    width: rgb.width(),
                    height: rgb.height(),
                    rgb: rgb.into_raw(),
                })
            }
            Err(e) => {
                warn!("Could not decode camera frame {}: {}", path.display(), e);
                None
            }
        }
    }

    fn stop(&mut self) {
        if self.active {
            debug!("Camera stream stopped");
        }
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

struct FileMicrophone {
    samples: Vec<f32>,
    sample_rate: u32,
    position: usize,
    opened_at: Instant,
    active: bool,
}

impl MicrophoneStream for FileMicrophone {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn drain(&mut self) -> Vec<f32> {
        if !self.active {
            return Vec::new();
        }
        let available = (self.opened_at.elapsed().as_secs_f64() * self.sample_rate as f64) as usize;
        let end = available.min(self.samples.len());
        if end <= self.position {
            return Vec::new();
        }
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;
        chunk
    }

    fn stop(&mut self) {
        self.active = false;
    }
}

/// Generated sources: colour bars for the camera and a 440 Hz tone for the
/// microphone. The camera reports no frame for its first `warmup_polls`
/// polls, like a video element that has not decoded anything yet.
#[derive(Clone, Debug)]
pub struct TestPatternDevices {
    pub width: u32,
    pub height: u32,
    pub warmup_polls: usize,
    pub sample_rate: u32,
}

impl Default for TestPatternDevices {
    fn default() -> Self {
        Self {
            width: 64,
            height: 48,
            warmup_polls: 0,
            sample_rate: 16_000,
        }
    }
}

impl MediaDevices for TestPatternDevices {
    fn open_camera(&self) -> Result<Box<dyn CameraStream>> {
        Ok(Box::new(PatternCamera {
            width: self.width,
            height: self.height,
            warmup_left: self.warmup_polls,
            active: true,
        }))
    }

    fn open_microphone(&self) -> Result<Box<dyn MicrophoneStream>> {
        Ok(Box::new(ToneMicrophone {
            sample_rate: self.sample_rate,
            emitted: 0,
            opened_at: Instant::now(),
            active: true,
        }))
    }
}

struct PatternCamera {
    width: u32,
    height: u32,
    warmup_left: usize,
    active: bool,
}

impl CameraStream for PatternCamera {
    fn current_frame(&mut self) -> Option<VideoFrame> {
        if !self.active {
            return None;
        }
        if self.warmup_left > 0 {
            self.warmup_left -= 1;
            return None;
        }

        const BARS: [[u8; 3]; 6] = [
            [255, 255, 255],
            [255, 255, 0],
            [0, 255, 255],
            [0, 255, 0],
            [255, 0, 255],
            [0, 0, 255],
        ];
        let mut rgb = Vec::with_capacity((self.width * self.height * 3) as usize);
        for _ in 0..self.height {
            for x in 0..self.width {
                let bar = (x as usize * BARS.len()) / self.width.max(1) as usize;
                rgb.extend_from_slice(&BARS[bar.min(BARS.len() - 1)]);
            }
        }
        Some(VideoFrame {
            width: self.width,
            height: self.height,
            rgb,
        })
    }

    fn stop(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

struct ToneMicrophone {
    sample_rate: u32,
    emitted: usize,
    opened_at: Instant,
    active: bool,
}

impl MicrophoneStream for ToneMicrophone {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn drain(&mut self) -> Vec<f32> {
        if !self.active {
            return Vec::new();
        }
        let due = (self.opened_at.elapsed().as_secs_f64() * self.sample_rate as f64) as usize;
        let chunk: Vec<f32> = (self.emitted..due)
            .map(|n| 0.3 * (2.0 * PI * 440.0 * n as f32 / self.sample_rate as f32).sin())
            .collect();
        self.emitted = due.max(self.emitted);
        chunk
    }

    fn stop(&mut self) {
        self.active = false;
    }
}
