use std::sync::Arc;

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::recorder::{Recorder, Recording};
use super::summary::{LocalReport, SessionOutcome, SessionReport};
use super::{CameraPhase, Result, SessionError, SessionState};
use crate::backend::{BackendClient, BackendError, JobInfoSummary};
use crate::config::Settings;
use crate::interview::{
    emotion_label, format_elapsed, simulated_emotion, QuestionBatch, QuestionCategory, QuestionEngine,
    SessionClock, CAMERA_UNAVAILABLE, READY, READY_TO_START, RECORDING,
};
use crate::media::{encode_jpeg, encode_wav, CameraStream, MediaDevices};
use crate::notifications::Notifier;

pub const GREETING_FALLBACK: &str = "Ready to begin your interview session";
pub const RECORDING_TIP: &str = "💡 Tip: Start recording to practice your answer!";

/// What one capture tick did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No camera, or no decoded frame yet.
    Skipped,
    Analyzed(String),
    /// The backend answered without an emotion.
    NoEmotion,
    Simulated(String),
    Failed,
}

/// Result of a recording upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    Processed,
    /// The upload failed; the processed flag flips after the fallback delay.
    FallbackScheduled,
    /// The upload failed after the session ended; the recording was
    /// marked processed locally at once.
    ProcessedLocally,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordingToggle {
    Started,
    Stopped(UploadOutcome),
    MicrophoneDenied,
}

/// State reachable from the background tasks.
struct Shared {
    settings: Settings,
    backend: BackendClient,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SessionState>,
    camera: Mutex<Option<Box<dyn CameraStream>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    frame_loop: TaskSlot,
    video_fallback: TaskSlot,
    audio_fallback: TaskSlot,
    clock: TaskSlot,
}

/// Holds at most one running task; storing a new one aborts the old.
#[derive(Default)]
struct TaskSlot(Mutex<Option<JoinHandle<()>>>);

impl TaskSlot {
    fn replace(&self, handle: JoinHandle<()>) {
        if let Some(previous) = self.0.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Aborts the stored task. Returns whether it was still pending.
    fn abort(&self) -> bool {
        match self.0.lock().take() {
            Some(task) => {
                let pending = !task.is_finished();
                task.abort();
                pending
            }
            None => false,
        }
    }
}

impl Shared {
    fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock();
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    fn abort_tasks(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        if !tasks.is_empty() {
            debug!("Aborting {} session tasks", tasks.len());
        }
        for task in tasks {
            task.abort();
        }
        self.frame_loop.abort();
        self.video_fallback.abort();
        self.audio_fallback.abort();
        self.clock.abort();
    }

    /// Applies a still-pending audio fallback immediately.
    fn settle_audio_fallback(&self) {
        if self.audio_fallback.abort() {
            debug!("Settling pending audio fallback");
            self.state.lock().audio_processed = true;
        }
    }

    fn release_camera(&self) {
        if let Some(mut camera) = self.camera.lock().take() {
            camera.stop();
            info!("📹 Camera released");
        }
    }

    fn set_emotion(&self, label: &str) {
        self.state.lock().emotion_label = label.to_string();
    }

    fn is_ended(&self) -> bool {
        self.state.lock().ended
    }

    async fn capture_and_send_frame(&self) -> FrameOutcome {
        let frame = {
            let mut camera = self.camera.lock();
            camera.as_mut().and_then(|camera| camera.current_frame())
        };
        let Some(frame) = frame else {
            debug!("No decoded frame yet, skipping capture");
            return FrameOutcome::Skipped;
        };

        let jpeg = match encode_jpeg(&frame) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                warn!("Frame encoding failed: {}", e);
                return FrameOutcome::Failed;
            }
        };

        match self.backend.analyze_frame(jpeg).await {
            Ok(Some(emotion)) => {
                let label = emotion_label(&emotion);
                let mut state = self.state.lock();
                state.emotion_label = label.clone();
                state.video_processed = true;
                FrameOutcome::Analyzed(label)
            }
            Ok(None) => FrameOutcome::NoEmotion,
            Err(BackendError::Request(e)) if self.settings.degrade_policy.allows_synthetic() => {
                warn!("Frame upload failed, simulating emotion: {}", e);
                let label = emotion_label(simulated_emotion(&mut rand::thread_rng()));
                self.set_emotion(&label);
                FrameOutcome::Simulated(label)
            }
            Err(e) => {
                error!("❌ Frame analysis failed: {}", e);
                FrameOutcome::Failed
            }
        }
    }

    async fn upload_audio(self: &Arc<Self>, wav: Vec<u8>) -> Result<UploadOutcome> {
        match self.backend.upload_audio(wav).await {
            Ok(()) => {
                self.state.lock().audio_processed = true;
                self.notifier.success("✅ Audio uploaded and processed");
                Ok(UploadOutcome::Processed)
            }
            Err(e) if self.settings.degrade_policy.allows_synthetic() => {
                warn!("Audio upload failed, falling back to local processing: {}", e);
                self.notifier.warning("❌ Upload failed, using local processing");
                if self.is_ended() {
                    self.state.lock().audio_processed = true;
                    return Ok(UploadOutcome::ProcessedLocally);
                }
                let shared = Arc::clone(self);
                let delay = self.settings.audio_fallback();
                self.audio_fallback.replace(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    shared.state.lock().audio_processed = true;
                }));
                Ok(UploadOutcome::FallbackScheduled)
            }
            Err(e) => {
                error!("❌ Audio upload failed: {}", e);
                self.notifier.error("❌ Audio upload failed");
                Err(e.into())
            }
        }
    }
}

/// Coordinates one live interview session: camera and microphone, the
/// periodic frame analysis, question loading, and the end-of-session report.
pub struct InterviewSession {
    shared: Arc<Shared>,
    questions: QuestionEngine,
    devices: Arc<dyn MediaDevices>,
    recorder: Mutex<Option<Recorder>>,
}

impl InterviewSession {
    pub fn new(
        settings: Settings,
        backend: BackendClient,
        devices: Arc<dyn MediaDevices>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let questions = QuestionEngine::new(backend.clone(), settings.degrade_policy);
        Self {
            shared: Arc::new(Shared {
                settings,
                backend,
                notifier,
                state: Mutex::new(SessionState::new()),
                camera: Mutex::new(None),
                tasks: Mutex::new(Vec::new()),
                frame_loop: TaskSlot::default(),
                video_fallback: TaskSlot::default(),
                audio_fallback: TaskSlot::default(),
                clock: TaskSlot::default(),
            }),
            questions,
            devices,
            recorder: Mutex::new(None),
        }
    }

    /// Snapshot of the session state.
    pub fn state(&self) -> SessionState {
        let mut state = self.shared.state.lock().clone();
        state.elapsed_display = format_elapsed(state.clock.elapsed());
        state
    }

    pub fn can_end(&self) -> bool {
        self.shared.state.lock().can_end()
    }

    pub async fn initialize(&self) -> Result<()> {
        self.ensure_active()?;
        info!("🚀 Initializing interview session");
        {
            let mut state = self.shared.state.lock();
            state.clock = SessionClock::start();
            state.emotion_label = READY_TO_START.to_string();
        }

        self.load_job_info().await;
        self.start_session().await?;
        self.start_clock();

        self.shared.notifier.success("🚀 Interview session initialized successfully!");
        Ok(())
    }

    /// Builds the greeting from the saved job info.
    pub async fn load_job_info(&self) -> String {
        let greeting = match self.shared.backend.get_job_info().await {
            Ok(summary) => greeting(&summary.unwrap_or_default()),
            Err(e) => {
                warn!("Could not load job info: {}", e);
                GREETING_FALLBACK.to_string()
            }
        };
        self.shared.state.lock().greeting = greeting.clone();
        greeting
    }

    /// Requests the camera and, once live, starts the frame-analysis cycle.
    /// Calling it again replaces the stream and restarts the cycle.
    pub async fn start_session(&self) -> Result<CameraPhase> {
        self.ensure_active()?;
        self.shared.state.lock().camera = CameraPhase::Requested;

        match self.devices.open_camera() {
            Ok(stream) => {
                if let Some(mut previous) = self.shared.camera.lock().replace(stream) {
                    previous.stop();
                }
                self.shared.state.lock().camera = CameraPhase::Live;
                self.start_frame_loop();
                self.schedule_video_fallback();
                info!("📹 Camera live");
                self.shared.notifier.success("📹 Camera activated");
                Ok(CameraPhase::Live)
            }
            Err(e) => {
                warn!("Camera unavailable: {}", e);
                {
                    let mut state = self.shared.state.lock();
                    state.camera = CameraPhase::Unavailable;
                    state.emotion_label = CAMERA_UNAVAILABLE.to_string();
                }
                self.shared.notifier.error("❌ Camera permission needed");
                Ok(CameraPhase::Unavailable)
            }
        }
    }

    pub async fn generate_questions(&self, category: &QuestionCategory) -> Result<QuestionBatch> {
        self.ensure_active()?;
        info!("❓ Generating {} questions", category);
        match self.questions.generate(category).await {
            Ok(batch) => {
                self.shared.state.lock().questions = batch.questions.clone();
                self.shared
                    .notifier
                    .success(&format!("✅ {} questions generated!", batch.questions.len()));
                Ok(batch)
            }
            Err(e) => {
                error!("❌ Error loading questions: {}", e);
                self.shared.notifier.error("❌ Error loading questions");
                Err(e.into())
            }
        }
    }

    /// Marks question `index` (zero-based) as the one being answered.
    pub fn select_question(&self, index: usize) -> Result<String> {
        let (question, recording) = {
            let mut state = self.shared.state.lock();
            if state.ended {
                return Err(SessionError::AlreadyEnded);
            }
            let available = state.questions.len();
            let question = state
                .questions
                .get(index)
                .cloned()
                .ok_or(SessionError::QuestionOutOfRange { index, available })?;
            state.selected_question = Some(index);
            (question, state.recording)
        };

        self.shared.notifier.info(&format!("🎯 Selected: Question {}", index + 1));

        if !recording {
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                let shared = Arc::clone(&self.shared);
                let delay = self.shared.settings.tip_delay();
                self.shared.track(runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    shared.notifier.info(RECORDING_TIP);
                }));
            }
        }
        Ok(question)
    }

    pub async fn toggle_recording(&self) -> Result<RecordingToggle> {
        self.ensure_active()?;
        let active = self.recorder.lock().take();
        match active {
            Some(recorder) => {
                let outcome = self.stop_recording(recorder).await?;
                Ok(RecordingToggle::Stopped(outcome))
            }
            None => Ok(self.start_recording()),
        }
    }

    fn start_recording(&self) -> RecordingToggle {
        match self.devices.open_microphone() {
            Ok(stream) => {
                let recorder = Recorder::start(stream, self.shared.settings.recorder_chunk());
                *self.recorder.lock() = Some(recorder);
                {
                    let mut state = self.shared.state.lock();
                    state.recording = true;
                    state.emotion_label = RECORDING.to_string();
                }
                info!("🎤 Recording started");
                self.shared.notifier.info("🎤 Recording started");
                RecordingToggle::Started
            }
            Err(e) => {
                warn!("Microphone unavailable: {}", e);
                self.shared.notifier.error("❌ Mic permission needed");
                RecordingToggle::MicrophoneDenied
            }
        }
    }

    async fn stop_recording(&self, recorder: Recorder) -> Result<UploadOutcome> {
        let recording: Recording = recorder.finish();
        {
            let mut state = self.shared.state.lock();
            state.recording = false;
            if !state.ended {
                state.emotion_label = READY.to_string();
            }
        }
        info!(
            "🛑 Recording stopped after {:.1}s ({} chunks)",
            recording.duration().as_secs_f32(),
            recording.chunk_count
        );
        self.shared.notifier.info("🛑 Recording stopped");

        let wav = encode_wav(&recording.samples, recording.sample_rate)?;
        self.upload_audio(wav).await
    }

    pub async fn upload_audio(&self, wav: Vec<u8>) -> Result<UploadOutcome> {
        self.shared.upload_audio(wav).await
    }

    pub async fn capture_and_send_frame(&self) -> FrameOutcome {
        self.shared.capture_and_send_frame().await
    }

    /// Ends the session and produces its report. Irreversible.
    pub async fn end_session(&self) -> Result<SessionOutcome> {
        {
            let mut state = self.shared.state.lock();
            if state.ended {
                return Err(SessionError::AlreadyEnded);
            }
            if self.shared.settings.enforce_end_gate && !state.can_end() {
                return Err(SessionError::NotReady {
                    audio: state.audio_processed,
                    video: state.video_processed,
                });
            }
            state.ended = true;
            state.clock.stop();
        }
        info!("🏁 Ending interview session");

        self.shared.settle_audio_fallback();
        self.shared.abort_tasks();
        self.shared.release_camera();

        let active = self.recorder.lock().take();
        if let Some(recorder) = active {
            if let Err(e) = self.stop_recording(recorder).await {
                warn!("Final recording upload failed: {}", e);
            }
        }

        self.shared.notifier.info("🏁 Generating interview report...");
        let metrics = self.shared.state.lock().metrics();

        let report = match self.shared.backend.generate_session_report(&metrics).await {
            Ok(value) => SessionReport::Backend(value),
            Err(e) if self.shared.settings.degrade_policy.allows_synthetic() => {
                warn!("Report generation failed, building local report: {}", e);
                SessionReport::Local(LocalReport::from_metrics(&metrics, &mut rand::thread_rng()))
            }
            Err(e) => {
                error!("❌ Report generation failed: {}", e);
                self.shared.notifier.error("❌ Failed to generate report");
                return Err(e.into());
            }
        };

        let summary = report.summary(&metrics);
        info!("📊 Session report ready (score {})", summary.overall_score);
        self.shared.notifier.success("✅ Report generated successfully!");
        Ok(SessionOutcome {
            metrics,
            report,
            summary,
        })
    }

    /// Releases devices and aborts background work without producing a
    /// report.
    pub fn shutdown(&self) {
        self.shared.abort_tasks();
        self.shared.release_camera();
        if let Some(recorder) = self.recorder.lock().take() {
            recorder.cancel();
        }
        self.shared.state.lock().recording = false;
    }

    fn ensure_active(&self) -> Result<()> {
        if self.shared.is_ended() {
            Err(SessionError::AlreadyEnded)
        } else {
            Ok(())
        }
    }

    fn start_frame_loop(&self) {
        let shared = Arc::clone(&self.shared);
        let period = self.shared.settings.frame_interval();
        self.shared.frame_loop.replace(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if shared.is_ended() {
                    break;
                }
                let outcome = shared.capture_and_send_frame().await;
                debug!("Frame tick: {:?}", outcome);
            }
        }));
    }

    fn schedule_video_fallback(&self) {
        if !self.shared.settings.degrade_policy.allows_synthetic() {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let delay = self.shared.settings.video_fallback();
        self.shared.video_fallback.replace(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = shared.state.lock();
            if !state.video_processed {
                debug!("Marking video processed after fallback delay");
                state.video_processed = true;
            }
        }));
    }

    fn start_clock(&self) {
        let shared = Arc::clone(&self.shared);
        let period = self.shared.settings.clock_tick();
        self.shared.clock.replace(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let mut state = shared.state.lock();
                if !state.clock.is_running() {
                    break;
                }
                state.elapsed_display = format_elapsed(state.clock.elapsed());
            }
        }));
    }
}

impl Drop for InterviewSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// "Hello {name}! Practicing for {role} at {company}" with placeholder
/// defaults for anything missing.
pub fn greeting(summary: &JobInfoSummary) -> String {
    fn or_default<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    format!(
        "Hello {}! Practicing for {} at {}",
        or_default(&summary.candidate_name, "Candidate"),
        or_default(&summary.job_role, "Software Engineer"),
        or_default(&summary.company_name, "Tech Company"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::media::{NoDevices, TestPatternDevices};
    use crate::notifications::{NotificationKind, ToastCenter};

    fn offline_session(devices: Arc<dyn MediaDevices>) -> (InterviewSession, Arc<ToastCenter>) {
        let settings = Settings {
            // nothing listens on the discard port
            backend_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            frame_interval_ms: 20,
            video_fallback_ms: 30,
            audio_fallback_ms: 10,
            recorder_chunk_ms: 5,
            clock_tick_ms: 10,
            tip_delay_ms: 10,
            ..Settings::default()
        };
        let backend = BackendClient::from_settings(&settings).unwrap();
        let toasts = Arc::new(ToastCenter::new(Duration::from_secs(4)));
        let session = InterviewSession::new(settings, backend, devices, toasts.clone());
        (session, toasts)
    }

    #[test]
    fn test_greeting_defaults() {
        assert_eq!(
            greeting(&JobInfoSummary::default()),
            "Hello Candidate! Practicing for Software Engineer at Tech Company"
        );
        let summary = JobInfoSummary {
            candidate_name: Some("Jane".into()),
            job_role: Some("  ".into()),
            company_name: Some("Acme".into()),
        };
        assert_eq!(greeting(&summary), "Hello Jane! Practicing for Software Engineer at Acme");
    }

    #[tokio::test]
    async fn test_camera_denied_keeps_session_usable() {
        let (session, toasts) = offline_session(Arc::new(NoDevices));
        let phase = session.start_session().await.unwrap();
        assert_eq!(phase, CameraPhase::Unavailable);
        assert_eq!(session.state().emotion_label, CAMERA_UNAVAILABLE);
        assert!(toasts.contains(NotificationKind::Error, "Camera permission needed"));
        assert_eq!(session.capture_and_send_frame().await, FrameOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_select_question_bounds() {
        let (session, toasts) = offline_session(Arc::new(NoDevices));
        let err = session.select_question(0).unwrap_err();
        assert!(matches!(err, SessionError::QuestionOutOfRange { index: 0, available: 0 }));

        let batch = session.generate_questions(&QuestionCategory::Technical).await.unwrap();
        assert_eq!(batch.questions.len(), 5);
        let chosen = session.select_question(4).unwrap();
        assert_eq!(session.state().selected_text(), Some(chosen.as_str()));
        assert!(toasts.contains(NotificationKind::Info, "Selected: Question 5"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(toasts.contains(NotificationKind::Info, "Start recording"));
    }

    #[tokio::test]
    async fn test_microphone_denied_leaves_recorder_idle() {
        let (session, toasts) = offline_session(Arc::new(NoDevices));
        let toggle = session.toggle_recording().await.unwrap();
        assert_eq!(toggle, RecordingToggle::MicrophoneDenied);
        assert!(!session.state().recording);
        assert!(toasts.contains(NotificationKind::Error, "Mic permission needed"));
    }

    #[tokio::test]
    async fn test_failed_upload_falls_back_after_delay() {
        let (session, toasts) = offline_session(Arc::new(TestPatternDevices::default()));
        assert_eq!(session.toggle_recording().await.unwrap(), RecordingToggle::Started);
        assert!(session.state().recording);
        tokio::time::sleep(Duration::from_millis(20)).await;

        let toggle = session.toggle_recording().await.unwrap();
        assert_eq!(toggle, RecordingToggle::Stopped(UploadOutcome::FallbackScheduled));
        assert!(!session.state().audio_processed);
        assert!(toasts.contains(NotificationKind::Warning, "using local processing"));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(session.state().audio_processed);
    }

    #[tokio::test]
    async fn test_shutdown_releases_devices() {
        let (session, _toasts) = offline_session(Arc::new(TestPatternDevices::default()));
        session.start_session().await.unwrap();
        session.toggle_recording().await.unwrap();
        session.shutdown();
        assert!(!session.state().recording);
        assert_eq!(session.capture_and_send_frame().await, FrameOutcome::Skipped);
    }
}
