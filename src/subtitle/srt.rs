use super::{
    collect_cues, display_text, normalize_line_endings, split_timecode, with_fraction_separator,
    BlockOutcome, Cue, SkipReason, Translation, TIMECODE_SEPARATOR,
};

/// Parse SRT content into cues, skipping blocks that cannot be read
pub fn parse(content: &str) -> Vec<Cue> {
    collect_cues(scan(content))
}

/// Walk SRT content block by block, reporting every block attempt.
///
/// A line that is not an integer identifier followed by a timing line is
/// skipped on its own so one broken block never hides the rest of the file.
pub fn scan(content: &str) -> Vec<BlockOutcome> {
    let normalized = normalize_line_endings(content);
    let lines: Vec<&str> = normalized.split('\n').collect();
    let mut outcomes = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let id_line = lines[i].trim();
        if id_line.is_empty() {
            i += 1;
            continue;
        }

        let block_start = i;
        let followed_by_timecode = lines
            .get(i + 1)
            .is_some_and(|line| line.contains(TIMECODE_SEPARATOR));

        let id = match id_line.parse::<i64>() {
            Ok(id) if followed_by_timecode => id,
            Ok(_) => {
                outcomes.push(BlockOutcome::Skipped { line: i, reason: SkipReason::MissingTimecode });
                i += 1;
                continue;
            }
            Err(_) => {
                outcomes.push(BlockOutcome::Skipped { line: i, reason: SkipReason::MissingIdentifier });
                i += 1;
                continue;
            }
        };

        i += 1;
        let Some((start_time, end_time)) = split_timecode(lines[i].trim()) else {
            outcomes.push(BlockOutcome::Skipped { line: i, reason: SkipReason::MalformedTimecode });
            i += 1;
            continue;
        };

        i += 1;
        let mut text_lines = Vec::new();
        while i < lines.len() && !lines[i].trim().is_empty() {
            text_lines.push(lines[i].trim());
            i += 1;
        }

        if text_lines.is_empty() {
            outcomes.push(BlockOutcome::Skipped { line: block_start, reason: SkipReason::EmptyText });
        } else {
            outcomes.push(BlockOutcome::Parsed(Cue {
                id,
                start_time,
                end_time,
                text: text_lines.join("\n"),
            }));
        }

        if i < lines.len() && lines[i].trim().is_empty() {
            i += 1;
        }
    }

    outcomes
}

/// Render cues as SRT, preferring translated text over the original
pub fn format(cues: &[Cue], translations: &[Translation]) -> String {
    cues.iter()
        .enumerate()
        .map(|(idx, cue)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                cue.id,
                with_fraction_separator(&cue.start_time, ','),
                with_fraction_separator(&cue.end_time, ','),
                display_text(cue, translations.get(idx))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle::FAILURE_MARKER;

    const TWO_CUES: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n00:00:03,000 --> 00:00:04,000\nWorld\n";

    fn cue(id: i64, start: &str, end: &str, text: &str) -> Cue {
        Cue {
            id,
            start_time: start.to_string(),
            end_time: end.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_parse_two_cues() {
        let cues = parse(TWO_CUES);
        assert_eq!(
            cues,
            vec![
                cue(1, "00:00:01,000", "00:00:02,000", "Hello"),
                cue(2, "00:00:03,000", "00:00:04,000", "World"),
            ]
        );
    }

    #[test]
    fn test_format_with_translations() {
        let cues = parse(TWO_CUES);
        let translations = vec![
            Translation::Translated("سلام".to_string()),
            Translation::Translated("دنیا".to_string()),
        ];
        assert_eq!(
            format(&cues, &translations),
            "1\n00:00:01,000 --> 00:00:02,000\nسلام\n\n2\n00:00:03,000 --> 00:00:04,000\nدنیا\n"
        );
    }

    #[test]
    fn test_format_falls_back_to_original() {
        let cues = parse(TWO_CUES);
        assert_eq!(format(&cues, &[]), TWO_CUES);

        let translations = vec![Translation::Pending, Translation::Failed];
        let output = format(&cues, &translations);
        assert!(output.contains("\nHello\n"));
        assert!(output.contains(FAILURE_MARKER));
    }

    #[test]
    fn test_format_uses_comma_separator() {
        let cues = vec![cue(7, "00:00:01.250", "00:00:02.500", "Hi")];
        assert_eq!(format(&cues, &[]), "7\n00:00:01,250 --> 00:00:02,500\nHi\n");
    }

    #[test]
    fn test_round_trip_is_stable() {
        let input = "3\r\n00:01:00,000 --> 00:01:02,000\r\n  First line  \r\nSecond line\r\n\r\n\r\n\r\n9\r\n00:01:05,000 --> 00:01:06,000\r\nLast\r\n";
        let cues = parse(input);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "First line\nSecond line");
        assert_eq!(parse(&format(&cues, &[])), cues);
    }

    #[test]
    fn test_crlf_and_cr_line_endings() {
        let crlf = TWO_CUES.replace('\n', "\r\n");
        let cr = TWO_CUES.replace('\n', "\r");
        assert_eq!(parse(&crlf), parse(TWO_CUES));
        assert_eq!(parse(&cr), parse(TWO_CUES));
    }

    #[test]
    fn test_byte_order_mark_keeps_first_cue() {
        let with_bom = format!("\u{feff}{}", TWO_CUES);
        assert_eq!(parse(&with_bom), parse(TWO_CUES));
        assert_eq!(parse(&with_bom.replace('\n', "\r\n")).len(), 2);
    }

    #[test]
    fn test_identifier_must_be_a_whole_integer() {
        let input = "12abc\n00:00:01,000 --> 00:00:02,000\nSuffixed\n\n+5\n00:00:03,000 --> 00:00:04,000\nSigned\n\n-3\n00:00:05,000 --> 00:00:06,000\nNegative\n";
        let outcomes = scan(input);
        assert_eq!(
            outcomes[0],
            BlockOutcome::Skipped { line: 0, reason: SkipReason::MissingIdentifier }
        );
        let cues = parse(input);
        assert_eq!(
            cues,
            vec![
                cue(5, "00:00:03,000", "00:00:04,000", "Signed"),
                cue(-3, "00:00:05,000", "00:00:06,000", "Negative"),
            ]
        );
    }

    #[test]
    fn test_skips_block_without_text() {
        let input = "1\n00:00:01,000 --> 00:00:02,000\n\n2\n00:00:03,000 --> 00:00:04,000\nWorld\n";
        let outcomes = scan(input);
        assert_eq!(
            outcomes[0],
            BlockOutcome::Skipped { line: 0, reason: SkipReason::EmptyText }
        );
        let cues = parse(input);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].id, 2);
    }

    #[test]
    fn test_recovers_from_missing_identifier() {
        let input = "garbage\n00:00:00,500 --> 00:00:00,900\nlost text\n\n2\n00:00:03,000 --> 00:00:04,000\nWorld\n";
        let outcomes = scan(input);
        assert!(outcomes.contains(&BlockOutcome::Skipped {
            line: 0,
            reason: SkipReason::MissingIdentifier
        }));
        let cues = parse(input);
        assert_eq!(cues, vec![cue(2, "00:00:03,000", "00:00:04,000", "World")]);
    }

    #[test]
    fn test_identifier_without_timecode_is_skipped() {
        let input = "1\nnot a timing line\n\n2\n00:00:03,000 --> 00:00:04,000\nWorld\n";
        let outcomes = scan(input);
        assert_eq!(
            outcomes[0],
            BlockOutcome::Skipped { line: 0, reason: SkipReason::MissingTimecode }
        );
        assert_eq!(parse(input).len(), 1);
    }

    #[test]
    fn test_malformed_timecode_is_skipped() {
        let input = "1\n00:00:01,000 --> 00:00:02,000 --> 00:00:03,000\nBroken\n\n2\n00:00:03,000 --> 00:00:04,000\nWorld\n";
        let outcomes = scan(input);
        assert_eq!(
            outcomes[0],
            BlockOutcome::Skipped { line: 1, reason: SkipReason::MalformedTimecode }
        );
        let cues = parse(input);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "World");
    }

    #[test]
    fn test_trailing_identifier_at_end_of_input() {
        let input = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2";
        assert_eq!(parse(input).len(), 1);
    }

    #[test]
    fn test_duplicate_and_sparse_ids_are_kept() {
        let input = "5\n00:00:01,000 --> 00:00:02,000\nA\n\n5\n00:00:03,000 --> 00:00:04,000\nB\n\n40\n00:00:05,000 --> 00:00:06,000\nC\n";
        let ids: Vec<i64> = parse(input).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![5, 5, 40]);
    }

    #[test]
    fn test_blank_input() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n   \n").is_empty());
    }
}
