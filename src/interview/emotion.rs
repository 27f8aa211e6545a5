use rand::seq::SliceRandom;
use rand::Rng;

/// Labels shown when frame analysis is unreachable.
pub const SIMULATED_EMOTIONS: [&str; 4] = ["confident", "focused", "calm", "engaged"];

pub const READY_TO_START: &str = "😊 Ready to start";
pub const READY: &str = "😊 Ready";
pub const RECORDING: &str = "🎤 Recording...";
pub const CAMERA_UNAVAILABLE: &str = "📹 Camera unavailable";

pub fn emotion_emoji(emotion: &str) -> &'static str {
    match emotion.trim().to_lowercase().as_str() {
        "happy" => "😊",
        "sad" => "😢",
        "angry" => "😠",
        "surprised" => "😲",
        "neutral" => "😐",
        "confident" => "😎",
        "nervous" => "😰",
        "focused" => "🧐",
        "calm" => "😌",
        "engaged" => "🤔",
        _ => "😊",
    }
}

/// Display label for a classified emotion, e.g. "😌 calm".
pub fn emotion_label(emotion: &str) -> String {
    format!("{} {}", emotion_emoji(emotion), emotion)
}

pub fn simulated_emotion<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    SIMULATED_EMOTIONS.choose(rng).copied().unwrap_or("calm")
}
