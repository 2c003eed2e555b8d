//! ============================================================================
//! Tone Detection - Keyword-based emotional tone classification
//! ============================================================================
//! Classifies a raw user utterance into a closed set of tones by scanning
//! fixed keyword lists. Pure function: no store or network access.
//! ============================================================================

use serde::{Deserialize, Serialize};

/// Tone detected from a single utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedTone {
    Sad,
    Happy,
    Angry,
    Casual,
    Formal,
    Playful,
    Neutral,
}

impl DetectedTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedTone::Sad => "sad",
            DetectedTone::Happy => "happy",
            DetectedTone::Angry => "angry",
            DetectedTone::Casual => "casual",
            DetectedTone::Formal => "formal",
            DetectedTone::Playful => "playful",
            DetectedTone::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for DetectedTone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's preferred response style, stored on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TonePreference {
    Friendly,
    Professional,
    Casual,
    Empathetic,
    Playful,
}

impl Default for TonePreference {
    fn default() -> Self {
        TonePreference::Friendly
    }
}

impl TonePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            TonePreference::Friendly => "friendly",
            TonePreference::Professional => "professional",
            TonePreference::Casual => "casual",
            TonePreference::Empathetic => "empathetic",
            TonePreference::Playful => "playful",
        }
    }
}

impl std::fmt::Display for TonePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TonePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "friendly" => Ok(TonePreference::Friendly),
            "professional" => Ok(TonePreference::Professional),
            "casual" => Ok(TonePreference::Casual),
            "empathetic" => Ok(TonePreference::Empathetic),
            "playful" => Ok(TonePreference::Playful),
            _ => Err(format!("Unknown tone preference: {}", s)),
        }
    }
}

// Keyword tables scanned in order; the first matching category wins.
const TONE_PATTERNS: &[(DetectedTone, &[&str])] = &[
    (
        DetectedTone::Sad,
        &["sad", "depressed", "unhappy", "lonely", "miss", "lost"],
    ),
    (
        DetectedTone::Happy,
        &["happy", "excited", "great", "awesome", "wonderful", "yay"],
    ),
    (
        DetectedTone::Angry,
        &["angry", "mad", "hate", "annoyed", "frustrated", "upset"],
    ),
    (
        DetectedTone::Casual,
        &["hey", "hi", "hello", "what's up", "sup", "yo"],
    ),
    (
        DetectedTone::Formal,
        &["please", "could you", "would you", "thank you", "kindly"],
    ),
    (
        DetectedTone::Playful,
        &["lol", "haha", "funny", "joke", "roast", "tease"],
    ),
];

/// Detect the tone of a user utterance. Returns `Neutral` when no keyword
/// matches.
pub fn detect_tone(input: &str) -> DetectedTone {
    let input = input.to_lowercase();

    for (tone, keywords) in TONE_PATTERNS {
        for keyword in *keywords {
            if input.contains(keyword) {
                return *tone;
            }
        }
    }

    DetectedTone::Neutral
}
