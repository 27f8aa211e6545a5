use std::sync::Arc;
use std::time::Duration;

use log::debug;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::media::MicrophoneStream;

/// Buffers microphone chunks in the background until finished.
pub struct Recorder {
    stream: Arc<Mutex<Box<dyn MicrophoneStream>>>,
    chunks: Arc<Mutex<Vec<Vec<f32>>>>,
    sample_rate: u32,
    task: JoinHandle<()>,
}

/// The finalized recording.
#[derive(Clone, Debug)]
pub struct Recording {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub chunk_count: usize,
}

impl Recording {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

impl Recorder {
    /// Starts draining `stream` every `chunk_period`. Must be called from
    /// within a tokio runtime.
    pub fn start(stream: Box<dyn MicrophoneStream>, chunk_period: Duration) -> Self {
        let sample_rate = stream.sample_rate();
        let stream = Arc::new(Mutex::new(stream));
        let chunks = Arc::new(Mutex::new(Vec::new()));

        let task = {
            let stream = stream.clone();
            let chunks = chunks.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(chunk_period);
                loop {
                    ticker.tick().await;
                    let chunk = stream.lock().drain();
                    if !chunk.is_empty() {
                        chunks.lock().push(chunk);
                    }
                }
            })
        };

        Self {
            stream,
            chunks,
            sample_rate,
            task,
        }
    }

    /// Stops capture and joins every buffered chunk into one recording.
    pub fn finish(self) -> Recording {
        self.task.abort();

        let tail = {
            let mut stream = self.stream.lock();
            let tail = stream.drain();
            stream.stop();
            tail
        };

        let mut chunks = std::mem::take(&mut *self.chunks.lock());
        if !tail.is_empty() {
            chunks.push(tail);
        }

        let chunk_count = chunks.len();
        let samples: Vec<f32> = chunks.into_iter().flatten().collect();
        debug!("Recorder finished: {} chunks, {} samples", chunk_count, samples.len());
        Recording {
            samples,
            sample_rate: self.sample_rate,
            chunk_count,
        }
    }

    /// Drops the buffered audio and releases the microphone.
    pub fn cancel(self) {
        self.task.abort();
        self.stream.lock().stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingMic {
        next: f32,
        stopped: Arc<Mutex<bool>>,
    }

    impl MicrophoneStream for CountingMic {
        fn sample_rate(&self) -> u32 {
            1_000
        }

        fn drain(&mut self) -> Vec<f32> {
            if *self.stopped.lock() {
                return Vec::new();
            }
            self.next += 1.0;
            vec![self.next; 10]
        }

        fn stop(&mut self) {
            *self.stopped.lock() = true;
        }
    }

    #[tokio::test]
    async fn test_finish_concatenates_chunks_and_stops_stream() {
        let stopped = Arc::new(Mutex::new(false));
        let mic = CountingMic {
            next: 0.0,
            stopped: stopped.clone(),
        };

        let recorder = Recorder::start(Box::new(mic), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(40)).await;
        let recording = recorder.finish();

        assert!(recording.chunk_count >= 2);
        assert_eq!(recording.samples.len(), recording.chunk_count * 10);
        // chunks stay in capture order
        assert!(recording.samples.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(recording.sample_rate, 1_000);
        assert!(*stopped.lock());
    }
}
