use serde::{Deserialize, Serialize};

pub const DEFAULT_LANGUAGE: &str = "Chinese";
pub const DEFAULT_USETIME: &str = "Under 5 minutes";

/// Speech engines the generation pipeline can drive
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TtsProvider {
    IndexTts,
    DoubaoTts,
    EdgeTts,
    FishAudio,
    GeminiTts,
    Minimax,
}

impl TtsProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            TtsProvider::IndexTts => "index-tts",
            TtsProvider::DoubaoTts => "doubao-tts",
            TtsProvider::EdgeTts => "edge-tts",
            TtsProvider::FishAudio => "fish-audio",
            TtsProvider::GeminiTts => "gemini-tts",
            TtsProvider::Minimax => "minimax",
        }
    }
}

impl std::fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    #[default]
    Podcast,
    Story,
}

impl GenerationMode {
    pub fn label(&self) -> &'static str {
        match self {
            GenerationMode::Podcast => "Podcast",
            GenerationMode::Story => "Story",
        }
    }
}

/// Request body for POST /api/generations and /api/generations/quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub provider: TtsProvider,
    #[serde(default)]
    pub mode: GenerationMode,
    pub content: String,
    #[serde(default)]
    pub voices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usetime: Option<String>,
}

/// Validated job descriptor handed to the pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationJob {
    pub provider: TtsProvider,
    pub mode: GenerationMode,
    pub content: String,
    pub voices: Vec<String>,
    pub language: String,
    pub usetime: String,
}

impl GenerationJob {
    /// Label written on the spend and refund transactions
    pub fn action_label(&self) -> String {
        format!("{} generation ({})", self.mode.label(), self.provider)
    }
}
