// Translation gateway
//
// This module defines the seam between the orchestrator and the language model:
// - Translator: one line plus bounded context in, translated text out
// - prompt: the instruction text sent with every request
// - gemini: the Gemini generateContent implementation

pub mod gemini;
pub mod prompt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use gemini::GeminiTranslator;

use crate::config::TranslateConfig;
use crate::error::{Result, ZirnevisError};

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-04-17";

/// Models accepted for translation
pub const AVAILABLE_MODELS: &[&str] = &[DEFAULT_MODEL];

/// Largest number of neighbouring lines sent on each side of a cue
pub const MAX_CONTEXT_WINDOW: usize = 10;

/// Default number of neighbouring lines sent on each side of a cue
pub const DEFAULT_CONTEXT_WINDOW: usize = 4;

/// Fixed categories that select the instruction framing sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectProfile {
    Film,
    TvSeries,
    MusicVideo,
    GeneralEducation,
    SpecializedEducation,
    SpecializedProgrammingEducation,
    SpecializedComputerEducation,
    Documentary,
    /// Fallback for labels that match no profile
    Generic,
}

impl SubjectProfile {
    /// Selectable profiles, in display order
    pub const ALL: [SubjectProfile; 8] = [
        Self::Film,
        Self::TvSeries,
        Self::MusicVideo,
        Self::GeneralEducation,
        Self::SpecializedEducation,
        Self::SpecializedProgrammingEducation,
        Self::SpecializedComputerEducation,
        Self::Documentary,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Film => "Film",
            Self::TvSeries => "TV Series",
            Self::MusicVideo => "Music Video",
            Self::GeneralEducation => "General Education",
            Self::SpecializedEducation => "Specialized Education",
            Self::SpecializedProgrammingEducation => "Specialized Programming Education",
            Self::SpecializedComputerEducation => "Specialized Computer Education",
            Self::Documentary => "Documentary",
            Self::Generic => "General",
        }
    }

    /// Lowercase, dash-separated label used in output file names
    pub fn slug(&self) -> String {
        self.label()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase()
    }

    /// System instruction opening the translation prompt
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Film => "You are an expert subtitle translator specializing in Film scripts and dialogue.",
            Self::TvSeries => "You are an expert subtitle translator specializing in dialogue for TV Series.",
            Self::MusicVideo => "You are an expert subtitle translator specializing in song lyrics and dialogue for Music Videos. Pay attention to rhythm and artistic expression if applicable.",
            Self::GeneralEducation => "You are an expert subtitle translator specializing in general educational content.",
            Self::SpecializedEducation => "You are an expert subtitle translator specializing in specific academic or professional educational material.",
            Self::SpecializedProgrammingEducation => "You are an expert subtitle translator specializing in technical content for Programming Education. Maintain accuracy of technical terms and code-related phrasing.",
            Self::SpecializedComputerEducation => "You are an expert subtitle translator specializing in technical content for Computer Education and IT. Maintain accuracy of technical terms.",
            Self::Documentary => "You are an expert subtitle translator specializing in narration and interviews for Documentaries.",
            Self::Generic => "You are an expert subtitle translator.",
        }
    }
}

impl fmt::Display for SubjectProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SubjectProfile {
    type Err = ZirnevisError;

    /// Accepts either the label ("TV Series") or the slug ("tv-series"), ignoring case
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .chain(std::iter::once(Self::Generic))
            .find(|profile| profile.label().to_lowercase() == wanted || profile.slug() == wanted)
            .ok_or_else(|| {
                ZirnevisError::Config(format!(
                    "Unknown subject '{}'. Valid subjects: {}",
                    s,
                    Self::ALL.map(|p| p.label()).join(", ")
                ))
            })
    }
}

/// Everything the gateway needs to translate one cue
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    /// Text to translate
    pub main_text: String,
    /// Original text of the cues before this one, oldest first
    pub preceding_lines: Vec<String>,
    /// Original text of the cues after this one, nearest first
    pub following_lines: Vec<String>,
    pub subject: SubjectProfile,
    pub model: String,
    pub context_window_size: usize,
}

impl TranslationRequest {
    /// Preceding lines cut to the last `context_window_size` entries
    pub fn bounded_preceding(&self) -> &[String] {
        let keep = self.context_window_size.min(self.preceding_lines.len());
        &self.preceding_lines[self.preceding_lines.len() - keep..]
    }

    /// Following lines cut to the first `context_window_size` entries
    pub fn bounded_following(&self) -> &[String] {
        let keep = self.context_window_size.min(self.following_lines.len());
        &self.following_lines[..keep]
    }
}

/// Main trait for translation operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate the main text of `request` into Persian.
    ///
    /// Fails rather than returning an empty string; any error marks the cue as failed.
    async fn translate(&self, request: &TranslationRequest) -> Result<String>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create the Gemini translator, failing when credentials are missing
    pub fn create_translator(config: &TranslateConfig) -> Result<Box<dyn Translator>> {
        Ok(Box::new(GeminiTranslator::from_config(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(preceding: &[&str], following: &[&str], window: usize) -> TranslationRequest {
        TranslationRequest {
            main_text: "main".to_string(),
            preceding_lines: preceding.iter().map(|s| s.to_string()).collect(),
            following_lines: following.iter().map(|s| s.to_string()).collect(),
            subject: SubjectProfile::Film,
            model: DEFAULT_MODEL.to_string(),
            context_window_size: window,
        }
    }

    #[test]
    fn test_bounded_context_trims_to_window() {
        let req = request(&["a", "b", "c", "d"], &["e", "f", "g"], 2);
        assert_eq!(req.bounded_preceding(), &["c".to_string(), "d".to_string()]);
        assert_eq!(req.bounded_following(), &["e".to_string(), "f".to_string()]);
    }

    #[test]
    fn test_bounded_context_with_short_input() {
        let req = request(&["a"], &[], 4);
        assert_eq!(req.bounded_preceding().len(), 1);
        assert!(req.bounded_following().is_empty());

        let req = request(&["a", "b"], &["c"], 0);
        assert!(req.bounded_preceding().is_empty());
        assert!(req.bounded_following().is_empty());
    }

    #[test]
    fn test_subject_parsing() {
        assert_eq!("TV Series".parse::<SubjectProfile>().unwrap(), SubjectProfile::TvSeries);
        assert_eq!("tv-series".parse::<SubjectProfile>().unwrap(), SubjectProfile::TvSeries);
        assert_eq!("documentary".parse::<SubjectProfile>().unwrap(), SubjectProfile::Documentary);
        assert!("Cooking Show".parse::<SubjectProfile>().is_err());
    }

    #[test]
    fn test_subject_slug() {
        assert_eq!(SubjectProfile::Film.slug(), "film");
        assert_eq!(
            SubjectProfile::SpecializedProgrammingEducation.slug(),
            "specialized-programming-education"
        );
    }

    #[test]
    fn test_generic_instruction() {
        assert_eq!(SubjectProfile::Generic.instruction(), "You are an expert subtitle translator.");
        for profile in SubjectProfile::ALL {
            assert!(profile.instruction().starts_with("You are an expert subtitle translator"));
        }
    }
}
