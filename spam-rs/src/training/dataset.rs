//! Labeled dataset parsing and deterministic train/test split

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;

use crate::classifier::{Label, LabeledExample};
use crate::config::Delimiter;
use crate::error::{Result, SpamError};

/// Read a two-column `label<delimiter>text` dataset from disk
pub fn load_dataset<P: AsRef<Path>>(path: P, delimiter: Delimiter) -> Result<Vec<LabeledExample>> {
    let content = std::fs::read_to_string(path)?;
    parse_dataset(&content, delimiter)
}

/// Parse dataset content.
///
/// Blank lines and a leading `label<delimiter>text` header are skipped.
/// Tab-delimited rows must hold exactly two fields; comma-delimited rows
/// split on the first comma so the message may itself contain commas.
pub fn parse_dataset(content: &str, delimiter: Delimiter) -> Result<Vec<LabeledExample>> {
    let delimiter = match delimiter {
        Delimiter::Auto => detect_delimiter(content),
        other => other,
    };

    let mut examples = Vec::new();
    let mut seen_row = false;

    for (i, raw) in content.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let (label, text) = split_row(line, delimiter).ok_or_else(|| SpamError::DatasetFormat {
            line: line_no,
            reason: "expected exactly two fields (label, text)".to_string(),
        })?;

        if !seen_row && is_header(label, text) {
            seen_row = true;
            continue;
        }
        seen_row = true;

        let label: Label = label.parse().map_err(|_| SpamError::DatasetFormat {
            line: line_no,
            reason: format!("unknown label '{}'", label.trim()),
        })?;

        examples.push(LabeledExample::new(label, text.trim()));
    }

    if examples.is_empty() {
        return Err(SpamError::DatasetEmpty);
    }

    Ok(examples)
}

fn detect_delimiter(content: &str) -> Delimiter {
    match content.lines().find(|l| !l.trim().is_empty()) {
        Some(line) if line.contains('\t') => Delimiter::Tab,
        _ => Delimiter::Comma,
    }
}

fn split_row(line: &str, delimiter: Delimiter) -> Option<(&str, &str)> {
    match delimiter {
        Delimiter::Comma => line.split_once(','),
        _ => {
            let mut fields = line.split('\t');
            match (fields.next(), fields.next(), fields.next()) {
                (Some(label), Some(text), None) => Some((label, text)),
                _ => None,
            }
        }
    }
}

fn is_header(label: &str, text: &str) -> bool {
    label.trim().eq_ignore_ascii_case("label") && text.trim().eq_ignore_ascii_case("text")
}

/// Shuffle with a seeded generator and hold out `ceil(n * test_ratio)` examples.
///
/// At least one example always stays in the training partition. The same
/// input, ratio and seed always give the same partitions.
pub fn train_test_split(
    examples: &[LabeledExample],
    test_ratio: f64,
    seed: u64,
) -> Result<(Vec<LabeledExample>, Vec<LabeledExample>)> {
    if examples.is_empty() {
        return Err(SpamError::DatasetEmpty);
    }
    if !(0.0..1.0).contains(&test_ratio) {
        return Err(SpamError::Training(format!(
            "test ratio must be in [0, 1), got {}",
            test_ratio
        )));
    }

    let n = examples.len();
    let test_size = ((n as f64 * test_ratio).ceil() as usize).min(n - 1);

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices[..test_size]
        .iter()
        .map(|&i| examples[i].clone())
        .collect();
    let train = indices[test_size..]
        .iter()
        .map(|&i| examples[i].clone())
        .collect();

    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tab_delimited() {
        let content = "ham\tGo until jurong point, crazy..\nspam\tFree entry in 2 a wkly comp\n\nham\tOk lar...\n";
        let examples = parse_dataset(content, Delimiter::Auto).unwrap();
        assert_eq!(examples.len(), 3);
        assert_eq!(examples[0].label, Label::Ham);
        assert_eq!(examples[0].text, "Go until jurong point, crazy..");
        assert_eq!(examples[1].label, Label::Spam);
    }

    #[test]
    fn test_parse_comma_delimited_with_header() {
        let content = "label,text\nspam,\"Win cash, now\"\nHAM,see you soon\r\n";
        let examples = parse_dataset(content, Delimiter::Auto).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].label, Label::Spam);
        assert_eq!(examples[0].text, "\"Win cash, now\"");
        assert_eq!(examples[1].label, Label::Ham);
        assert_eq!(examples[1].text, "see you soon");
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        let content = "ham\thello\nspam\tone\ttwo\n";
        match parse_dataset(content, Delimiter::Tab) {
            Err(SpamError::DatasetFormat { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {:?}", other.map(|e| e.len())),
        }

        let content = "ham,hello\njust text without delimiter\n";
        assert!(matches!(
            parse_dataset(content, Delimiter::Comma),
            Err(SpamError::DatasetFormat { line: 2, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_label() {
        let content = "ham\thello\neggs\tbacon\n";
        assert!(matches!(
            parse_dataset(content, Delimiter::Tab),
            Err(SpamError::DatasetFormat { line: 2, .. })
        ));
    }

    #[test]
    fn test_parse_empty_dataset() {
        assert!(matches!(parse_dataset("", Delimiter::Auto), Err(SpamError::DatasetEmpty)));
        assert!(matches!(
            parse_dataset("\n  \nlabel\ttext\n", Delimiter::Auto),
            Err(SpamError::DatasetEmpty)
        ));
    }

    fn numbered(n: usize) -> Vec<LabeledExample> {
        (0..n)
            .map(|i| {
                let label = if i % 2 == 0 { Label::Ham } else { Label::Spam };
                LabeledExample::new(label, format!("message {}", i))
            })
            .collect()
    }

    #[test]
    fn test_split_sizes() {
        let (train, test) = train_test_split(&numbered(10), 0.2, 42).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);

        let (train, test) = train_test_split(&numbered(11), 0.2, 42).unwrap();
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);

        let (train, test) = train_test_split(&numbered(1), 0.2, 42).unwrap();
        assert_eq!(train.len(), 1);
        assert!(test.is_empty());
    }

    #[test]
    fn test_split_is_reproducible() {
        let examples = numbered(50);
        let first = train_test_split(&examples, 0.2, 42).unwrap();
        let second = train_test_split(&examples, 0.2, 42).unwrap();
        assert_eq!(first, second);

        let (train, test) = first;
        let mut all: Vec<String> = train.into_iter().chain(test).map(|e| e.text).collect();
        all.sort();
        let mut expected: Vec<String> = examples.into_iter().map(|e| e.text).collect();
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_split_rejects_bad_ratio() {
        assert!(train_test_split(&numbered(10), 1.0, 42).is_err());
        assert!(train_test_split(&numbered(10), -0.1, 42).is_err());
    }
}
