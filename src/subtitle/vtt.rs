use super::{
    collect_cues, display_text, normalize_line_endings, split_timecode, with_fraction_separator,
    BlockOutcome, Cue, SkipReason, Translation, TIMECODE_SEPARATOR,
};

const HEADER: &str = "WEBVTT";
const NOTE_PREFIX: &str = "NOTE";

/// Parse WebVTT content into cues with sequential ids starting at 1
pub fn parse(content: &str) -> Vec<Cue> {
    collect_cues(scan(content))
}

/// Walk WebVTT content cue by cue, reporting every cue attempt.
///
/// Cue identifiers are optional and discarded; a line that is neither a
/// timing line nor followed by one is treated as noise and skipped.
pub fn scan(content: &str) -> Vec<BlockOutcome> {
    let normalized = normalize_line_endings(content);
    let lines: Vec<&str> = normalized.split('\n').collect();
    let mut outcomes = Vec::new();
    let mut next_id = 1;
    let mut i = 0;

    // Header, leading comments and blank lines
    while i < lines.len() {
        let line = lines[i].trim();
        if line.starts_with(HEADER) || line.is_empty() || line.starts_with(NOTE_PREFIX) {
            i += 1;
            continue;
        }
        break;
    }

    while i < lines.len() {
        if is_blank_or_note(lines[i]) {
            i += 1;
            continue;
        }

        let current = lines[i].trim();
        let (timing_line, text_start) = if current.contains(TIMECODE_SEPARATOR) {
            (current, i + 1)
        } else if lines
            .get(i + 1)
            .is_some_and(|line| line.contains(TIMECODE_SEPARATOR))
        {
            (lines[i + 1].trim(), i + 2)
        } else {
            outcomes.push(BlockOutcome::Skipped { line: i, reason: SkipReason::MissingTimecode });
            i += 1;
            continue;
        };

        let Some((start_time, end_time)) = split_timecode(timing_line) else {
            outcomes.push(BlockOutcome::Skipped { line: i, reason: SkipReason::MalformedTimecode });
            i = text_start;
            continue;
        };

        let block_start = i;
        i = text_start;
        let mut text_lines = Vec::new();
        while i < lines.len() && !lines[i].trim().is_empty() {
            let line = lines[i].trim();
            if !line.starts_with(NOTE_PREFIX) {
                text_lines.push(line);
            }
            i += 1;
        }

        if text_lines.is_empty() {
            outcomes.push(BlockOutcome::Skipped { line: block_start, reason: SkipReason::EmptyText });
            continue;
        }

        outcomes.push(BlockOutcome::Parsed(Cue {
            id: next_id,
            start_time: with_fraction_separator(&start_time, '.'),
            end_time: with_fraction_separator(&end_time, '.'),
            text: text_lines.join("\n"),
        }));
        next_id += 1;
    }

    outcomes
}

/// Render cues as WebVTT without cue identifiers
pub fn format(cues: &[Cue], translations: &[Translation]) -> String {
    let body = cues
        .iter()
        .enumerate()
        .map(|(idx, cue)| {
            format!(
                "{} --> {}\n{}",
                with_fraction_separator(&cue.start_time, '.'),
                with_fraction_separator(&cue.end_time, '.'),
                display_text(cue, translations.get(idx))
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{}\n\n{}", HEADER, body)
}

fn is_blank_or_note(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with(NOTE_PREFIX)
}
