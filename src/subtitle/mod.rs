// Subtitle cue model
//
// This module holds the format-neutral cue types plus the two line-oriented
// readers/writers:
// - SRT: numbered blocks, `,` as the sub-second separator
// - VTT: optional WEBVTT header and NOTE lines, `.` as the sub-second separator

pub mod srt;
pub mod vtt;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Result, ZirnevisError};

/// Literal text written in place of a cue whose translation failed
pub const FAILURE_MARKER: &str = "[Translation Error]";

/// Token separating start and end timecodes on a cue timing line
pub const TIMECODE_SEPARATOR: &str = "-->";

/// One subtitle display unit as read from the source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cue {
    /// Sequence number (parsed for SRT, synthesized from 1 for VTT)
    pub id: i64,
    /// Start timecode, verbatim from the source file
    pub start_time: String,
    /// End timecode, verbatim from the source file
    pub end_time: String,
    /// Original text, lines joined with `\n`
    pub text: String,
}

/// Translation state of a single cue, kept index-aligned with the cues
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Translation {
    /// Not attempted yet
    #[default]
    Pending,
    /// Last attempt failed
    Failed,
    /// Successfully translated content
    Translated(String),
}

impl Translation {
    pub fn is_translated(&self) -> bool {
        matches!(self, Self::Translated(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Pending and failed cues are both eligible for another attempt
    pub fn needs_translation(&self) -> bool {
        !self.is_translated()
    }

    /// Text to render for this state, `None` when the original should be used
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Pending => None,
            Self::Failed => Some(FAILURE_MARKER),
            Self::Translated(text) if text.is_empty() => None,
            Self::Translated(text) => Some(text.as_str()),
        }
    }
}

/// Result of one block attempt inside a parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    Parsed(Cue),
    Skipped { line: usize, reason: SkipReason },
}

/// Why a block attempt did not yield a cue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// SRT block does not start with an integer identifier
    MissingIdentifier,
    /// No timing line where one was expected
    MissingTimecode,
    /// Timing line does not split into exactly a start and an end
    MalformedTimecode,
    /// Timing line was not followed by any text
    EmptyText,
}

/// Supported subtitle file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubtitleFormat {
    Srt,
    Vtt,
}

impl SubtitleFormat {
    /// Pick the format from a file name's extension (case-insensitive)
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" => Ok(Self::Vtt),
            _ => Err(ZirnevisError::UnsupportedFormat(format!(
                "{}: please provide an .srt or .vtt file",
                path.display()
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
        }
    }

    pub fn parse(&self, content: &str) -> Vec<Cue> {
        match self {
            Self::Srt => srt::parse(content),
            Self::Vtt => vtt::parse(content),
        }
    }

    pub fn format(&self, cues: &[Cue], translations: &[Translation]) -> String {
        match self {
            Self::Srt => srt::format(cues, translations),
            Self::Vtt => vtt::format(cues, translations),
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

/// Parse a whole file, rejecting non-empty input that yields no cues.
///
/// Empty or whitespace-only content is a valid, empty subtitle file.
pub fn parse_document(content: &str, format: SubtitleFormat) -> Result<Vec<Cue>> {
    let cues = format.parse(content);

    if cues.is_empty() && !content.trim().is_empty() {
        return Err(ZirnevisError::Parse(format!(
            "Could not parse {0} file. It might be empty, malformed, or not a valid {0} file.",
            format
        )));
    }

    Ok(cues)
}

/// Collapse block outcomes into the cues they produced
pub(crate) fn collect_cues(outcomes: Vec<BlockOutcome>) -> Vec<Cue> {
    outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            BlockOutcome::Parsed(cue) => Some(cue),
            BlockOutcome::Skipped { .. } => None,
        })
        .collect()
}

/// Drop a leading byte order mark and unify line endings to `\n`
pub(crate) fn normalize_line_endings(content: &str) -> String {
    content
        .strip_prefix('\u{feff}')
        .unwrap_or(content)
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Split a timing line into trimmed start and end parts
pub(crate) fn split_timecode(line: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = line.split(TIMECODE_SEPARATOR).collect();
    match parts.as_slice() {
        [start, end] => Some((start.trim().to_string(), end.trim().to_string())),
        _ => None,
    }
}

/// Rewrite the sub-second separator of the leading timestamp token.
///
/// Anything after the first whitespace (VTT cue settings) is left untouched.
pub(crate) fn with_fraction_separator(timecode: &str, separator: char) -> String {
    let other = if separator == ',' { '.' } else { ',' };
    let split_at = timecode
        .find(char::is_whitespace)
        .unwrap_or(timecode.len());
    let (stamp, rest) = timecode.split_at(split_at);
    format!("{}{}", stamp.replace(other, &separator.to_string()), rest)
}

/// Text to write for a cue: its translation if any, otherwise the original
pub(crate) fn display_text<'a>(cue: &'a Cue, translation: Option<&'a Translation>) -> &'a str {
    translation
        .and_then(Translation::as_text)
        .unwrap_or(cue.text.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(SubtitleFormat::from_path("movie.srt").unwrap(), SubtitleFormat::Srt);
        assert_eq!(SubtitleFormat::from_path("Movie.VTT").unwrap(), SubtitleFormat::Vtt);
        assert!(matches!(
            SubtitleFormat::from_path("movie.ass"),
            Err(ZirnevisError::UnsupportedFormat(_))
        ));
        assert!(SubtitleFormat::from_path("movie").is_err());
    }

    #[test]
    fn test_parse_document_empty_input_is_not_an_error() {
        assert!(parse_document("", SubtitleFormat::Srt).unwrap().is_empty());
        assert!(parse_document("  \n\n\t\n", SubtitleFormat::Vtt).unwrap().is_empty());
    }

    #[test]
    fn test_parse_document_rejects_garbage() {
        let err = parse_document("just some words\nand more words\n", SubtitleFormat::Srt).unwrap_err();
        match err {
            ZirnevisError::Parse(message) => assert!(message.contains("SRT")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(parse_document("WEBVTT\n\nno cues here\n", SubtitleFormat::Vtt).is_err());
    }

    #[test]
    fn test_split_timecode() {
        assert_eq!(
            split_timecode(" 00:00:01,000 --> 00:00:02,000 "),
            Some(("00:00:01,000".to_string(), "00:00:02,000".to_string()))
        );
        assert_eq!(split_timecode("00:01 --> 00:02 --> 00:03"), None);
        assert_eq!(split_timecode("00:01 - 00:02"), None);
    }

    #[test]
    fn test_with_fraction_separator() {
        assert_eq!(with_fraction_separator("00:00:01.500", ','), "00:00:01,500");
        assert_eq!(with_fraction_separator("00:00:01,500", '.'), "00:00:01.500");
        assert_eq!(
            with_fraction_separator("00:00:01,500 position:10%,line-left", '.'),
            "00:00:01.500 position:10%,line-left"
        );
    }

    #[test]
    fn test_translation_text() {
        assert_eq!(Translation::Pending.as_text(), None);
        assert_eq!(Translation::Failed.as_text(), Some(FAILURE_MARKER));
        assert_eq!(Translation::Translated("سلام".into()).as_text(), Some("سلام"));
        assert!(Translation::Failed.needs_translation());
        assert!(!Translation::Translated("x".into()).needs_translation());
    }
}
