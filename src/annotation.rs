use serde::Serialize;
use std::ops::Range;

/// Identifier of a selectable span, unique within one decoded article
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SpanId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum SpanKind {
    Plain,
    /// `[...]` - the player scores by selecting it
    FalseClaim,
    /// `(...)` - looks suspicious but is true; selecting it costs points and time
    SurprisingTruth,
}

impl SpanKind {
    /// Kind and closing byte for an opening delimiter
    fn from_opener(byte: u8) -> Option<(Self, u8)> {
        match byte {
            b'[' => Some((SpanKind::FalseClaim, b']')),
            b'(' => Some((SpanKind::SurprisingTruth, b')')),
            _ => None,
        }
    }

    /// Opening and closing delimiter, `None` for plain text
    pub fn delimiters(&self) -> Option<(char, char)> {
        match self {
            SpanKind::Plain => None,
            SpanKind::FalseClaim => Some(('[', ']')),
            SpanKind::SurprisingTruth => Some(('(', ')')),
        }
    }
}

/// One decoded segment of an annotated article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub kind: SpanKind,
    pub text: String,
    /// Byte range in the source, delimiters included
    pub source_range: Range<usize>,
    pub id: Option<SpanId>,
}

impl Span {
    fn plain(source: &str, range: Range<usize>) -> Self {
        Self {
            kind: SpanKind::Plain,
            text: source[range.clone()].to_string(),
            source_range: range,
            id: None,
        }
    }

    /// The span as it appeared in the source
    pub fn to_markup(&self) -> String {
        match self.kind.delimiters() {
            Some((open, close)) => format!("{open}{}{close}", self.text),
            None => self.text.clone(),
        }
    }
}

/// Decode annotated text into spans, left to right.
///
/// An opener closes at the nearest matching closer on the same line. Openers
/// without one, and stray closers, stay in the surrounding plain text.
pub fn decode(source: &str) -> Vec<Span> {
    let bytes = source.as_bytes();
    let mut spans = Vec::new();
    let mut next_id = 0;
    let mut plain_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        let Some((kind, closer)) = SpanKind::from_opener(bytes[pos]) else {
            pos += 1;
            continue;
        };

        match find_closer(&bytes[pos + 1..], closer) {
            Some(offset) => {
                let end = pos + offset + 2;
                if plain_start < pos {
                    spans.push(Span::plain(source, plain_start..pos));
                }
                spans.push(Span {
                    kind,
                    text: source[pos + 1..end - 1].to_string(),
                    source_range: pos..end,
                    id: Some(SpanId(next_id)),
                });
                next_id += 1;
                pos = end;
                plain_start = end;
            }
            // no backtracking: the opener is literal text
            None => pos += 1,
        }
    }

    if plain_start < bytes.len() {
        spans.push(Span::plain(source, plain_start..bytes.len()));
    }

    spans
}

fn find_closer(rest: &[u8], closer: u8) -> Option<usize> {
    rest.iter()
        .position(|&b| b == closer || b == b'\n' || b == b'\r')
        .filter(|&i| rest[i] == closer)
}

/// Reassemble spans into markup; `encode(&decode(s)) == s`
pub fn encode(spans: &[Span]) -> String {
    spans.iter().map(Span::to_markup).collect()
}

/// Number of spans the player has to catch
pub fn false_claim_count(spans: &[Span]) -> usize {
    spans
        .iter()
        .filter(|s| s.kind == SpanKind::FalseClaim)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_text(spans: &[Span]) -> Vec<(SpanKind, &str)> {
        spans.iter().map(|s| (s.kind, s.text.as_str())).collect()
    }

    #[test]
    fn decodes_mixed_article() {
        let text = "(Last week) McDonalds corp bought [starbucks] for ($2 million).";
        let spans = decode(text);

        assert_eq!(
            kinds_and_text(&spans),
            vec![
                (SpanKind::SurprisingTruth, "Last week"),
                (SpanKind::Plain, " McDonalds corp bought "),
                (SpanKind::FalseClaim, "starbucks"),
                (SpanKind::Plain, " for "),
                (SpanKind::SurprisingTruth, "$2 million"),
                (SpanKind::Plain, "."),
            ]
        );
        assert_eq!(spans[0].source_range, 0..11);
        assert_eq!(&text[spans[2].source_range.clone()], "[starbucks]");
    }

    #[test]
    fn ids_number_annotated_spans_only() {
        let spans = decode("a [b] c (d) e [f]");
        let ids: Vec<Option<SpanId>> = spans.iter().map(|s| s.id).collect();

        assert_eq!(
            ids,
            vec![
                None,
                Some(SpanId(0)),
                None,
                Some(SpanId(1)),
                None,
                Some(SpanId(2)),
            ]
        );
    }

    #[test]
    fn plain_only_text_is_one_span() {
        let spans = decode("nothing to see here");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::Plain);
        assert_eq!(spans[0].id, None);
    }

    #[test]
    fn empty_input_has_no_spans() {
        assert!(decode("").is_empty());
    }

    #[test]
    fn empty_annotations_are_selectable() {
        let spans = decode("[]()");
        assert_eq!(
            kinds_and_text(&spans),
            vec![(SpanKind::FalseClaim, ""), (SpanKind::SurprisingTruth, "")]
        );
        assert_eq!(spans[0].id, Some(SpanId(0)));
        assert_eq!(spans[1].id, Some(SpanId(1)));
    }

    #[test]
    fn adjacent_same_kind_spans_are_not_merged() {
        let spans = decode("[one][two]");
        assert_eq!(
            kinds_and_text(&spans),
            vec![(SpanKind::FalseClaim, "one"), (SpanKind::FalseClaim, "two")]
        );
    }

    #[test]
    fn openers_pair_with_their_own_closer() {
        assert_eq!(SpanKind::from_opener(b'['), Some((SpanKind::FalseClaim, b']')));
        assert_eq!(
            SpanKind::from_opener(b'('),
            Some((SpanKind::SurprisingTruth, b')'))
        );
        assert_eq!(SpanKind::from_opener(b']'), None);

        let spans = decode("[a) b] (c] d)");
        assert_eq!(
            kinds_and_text(&spans),
            vec![
                (SpanKind::FalseClaim, "a) b"),
                (SpanKind::Plain, " "),
                (SpanKind::SurprisingTruth, "c] d"),
            ]
        );
    }

    #[test]
    fn closes_at_nearest_closer_without_nesting() {
        let spans = decode("[a (b] c)");
        assert_eq!(
            kinds_and_text(&spans),
            vec![(SpanKind::FalseClaim, "a (b"), (SpanKind::Plain, " c)")]
        );
    }

    #[test]
    fn stray_opener_passes_through_as_plain() {
        let spans = decode("costs (about [10] dollars");
        assert_eq!(
            kinds_and_text(&spans),
            vec![
                (SpanKind::Plain, "costs (about "),
                (SpanKind::FalseClaim, "10"),
                (SpanKind::Plain, " dollars"),
            ]
        );
    }

    #[test]
    fn stray_closer_passes_through_as_plain() {
        let spans = decode("a) b] [c]");
        assert_eq!(
            kinds_and_text(&spans),
            vec![(SpanKind::Plain, "a) b] "), (SpanKind::FalseClaim, "c")]
        );
    }

    #[test]
    fn annotations_do_not_cross_line_breaks() {
        let spans = decode("[first\nline] (ok)");
        assert_eq!(
            kinds_and_text(&spans),
            vec![
                (SpanKind::Plain, "[first\nline] "),
                (SpanKind::SurprisingTruth, "ok"),
            ]
        );
    }

    #[test]
    fn multibyte_text_keeps_byte_ranges() {
        let text = "Le (€300 million) — [triple]";
        let spans = decode(text);
        for span in &spans {
            assert_eq!(text[span.source_range.clone()], span.to_markup());
        }
        assert_eq!(spans[0].text, "Le ");
        assert_eq!(spans[1].text, "€300 million");
    }

    #[test]
    fn decoding_is_deterministic() {
        let text = "The [ECB] partnered with (Amazon) [(twice)]";
        assert_eq!(decode(text), decode(text));
    }

    #[test]
    fn encode_restores_source() {
        let samples = [
            "",
            "plain",
            "(Last week) McDonalds corp bought [starbucks] for ($2 million).",
            "[]()[x](y)",
            "unbalanced ( [ ] ) ] ( [",
            "(open\n) [x]",
            "nested [a [b] c] and (d (e) f)",
            "tail opener [",
        ];
        for sample in samples {
            assert_eq!(encode(&decode(sample)), sample, "round trip of {sample:?}");
        }
    }

    #[test]
    fn counts_false_claims() {
        let spans = decode("[a] (b) [c] d");
        assert_eq!(false_claim_count(&spans), 2);
    }
}
