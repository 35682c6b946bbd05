/// Guideline chunking for retrieval.
///
/// The guideline is cut into windows of at most `chunk_size` characters. Inside each
/// window the cut falls on the last paragraph break, else the last line break, else the
/// last whitespace, and only without any of those on a hard `chunk_size` cut. Window
/// `i + 1` starts exactly `overlap` characters before window `i` ends, so text straddling
/// a cut is present in both neighbours. Lengths are counted in `char`s, never bytes:
/// guidelines are Korean and a byte window would split syllables.
use crate::error::AppError;

/// Validated chunking parameters. `overlap < chunk_size` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkConfig {
    pub const DEFAULT_CHUNK_SIZE: usize = 400;
    pub const DEFAULT_OVERLAP: usize = 50;

    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, AppError> {
        if overlap >= chunk_size {
            return Err(AppError::InvalidChunking {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into ordered, overlapping segments. Empty text yields no segments.
    pub fn split(&self, text: &str) -> Vec<Segment> {
        let chars: Vec<char> = text.chars().collect();

        let mut segments = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let limit = (start + self.chunk_size).min(chars.len());
            let end = if limit == chars.len() {
                limit
            } else {
                // The cut must leave more than `overlap` characters so the next window advances.
                natural_cut(&chars, start + self.overlap, limit).unwrap_or(limit)
            };
            segments.push(Segment {
                index: segments.len(),
                text: chars[start..end].iter().collect(),
            });
            if end == chars.len() {
                break;
            }
            start = end - self.overlap;
        }
        segments
    }
}

/// Best cut position in `(floor, limit]`: just after the last paragraph break, else the
/// last line break, else the last whitespace character.
fn natural_cut(chars: &[char], floor: usize, limit: usize) -> Option<usize> {
    let candidates = || (floor + 1..=limit).rev();
    candidates()
        .find(|&cut| cut >= 2 && chars[cut - 2] == '\n' && chars[cut - 1] == '\n')
        .or_else(|| candidates().find(|&cut| chars[cut - 1] == '\n'))
        .or_else(|| candidates().find(|&cut| chars[cut - 1].is_whitespace()))
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            overlap: Self::DEFAULT_OVERLAP,
        }
    }
}

/// One retrieval unit of the guideline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Position in the guideline, 0-based. Used to break similarity ties.
    pub index: usize,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(segments: &[Segment], overlap: usize) -> String {
        let mut out = String::new();
        for (i, segment) in segments.iter().enumerate() {
            if i == 0 {
                out.push_str(&segment.text);
            } else {
                out.extend(segment.text.chars().skip(overlap));
            }
        }
        out
    }

    fn expected_count(len: usize, size: usize, overlap: usize) -> usize {
        if len == 0 {
            0
        } else if len <= size {
            1
        } else {
            1 + (len - size).div_ceil(size - overlap)
        }
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        assert!(matches!(
            ChunkConfig::new(50, 50),
            Err(AppError::InvalidChunking {
                chunk_size: 50,
                overlap: 50
            })
        ));
        assert!(ChunkConfig::new(50, 80).is_err());
        assert!(ChunkConfig::new(50, 0).is_ok());
    }

    #[test]
    fn empty_text_has_no_segments() {
        assert!(ChunkConfig::default().split("").is_empty());
    }

    #[test]
    fn short_text_is_one_segment() {
        let segments = ChunkConfig::default().split("평가 가이드");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "평가 가이드");
        assert_eq!(segments[0].index, 0);
    }

    #[test]
    fn windows_overlap_by_configured_amount() {
        let config = ChunkConfig::new(4, 1).unwrap();
        let texts: Vec<String> = config
            .split("abcdefghij")
            .into_iter()
            .map(|s| s.text)
            .collect();
        assert_eq!(texts, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn segments_never_exceed_chunk_size_and_reconstruct_text() {
        let text = "가나다라마바사아자차카타파하".repeat(37);
        for (size, overlap) in [(400, 50), (10, 3), (7, 0), (2, 1)] {
            let config = ChunkConfig::new(size, overlap).unwrap();
            let segments = config.split(&text);
            let len = text.chars().count();

            assert_eq!(segments.len(), expected_count(len, size, overlap));
            assert!(segments.iter().all(|s| s.text.chars().count() <= size));
            assert_eq!(reconstruct(&segments, overlap), text);
            for (i, segment) in segments.iter().enumerate() {
                assert_eq!(segment.index, i);
            }
        }
    }

    #[test]
    fn cut_falls_on_paragraph_break_inside_window() {
        let text = format!("{}\n\n{}", "가".repeat(30), "나".repeat(30));
        let config = ChunkConfig::new(40, 5).unwrap();
        let segments = config.split(&text);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, format!("{}\n\n", "가".repeat(30)));
        assert_eq!(segments[1].text, format!("가가가\n\n{}", "나".repeat(30)));
        assert_eq!(reconstruct(&segments, 5), text);
    }

    #[test]
    fn paragraph_break_beats_later_line_break() {
        let text = format!("{}\n\n{}\n{}", "가".repeat(10), "나".repeat(10), "다".repeat(30));
        let segments = ChunkConfig::new(30, 2).unwrap().split(&text);
        assert!(segments[0].text.ends_with("가\n\n"));
    }

    #[test]
    fn falls_back_to_line_break_then_whitespace() {
        let lines = format!("{}\n{}", "가".repeat(20), "나".repeat(20));
        let segments = ChunkConfig::new(25, 3).unwrap().split(&lines);
        assert_eq!(segments[0].text, format!("{}\n", "가".repeat(20)));

        let words = "평가 가이드는 공정하게 적용한다 모든 항목에".to_string();
        let segments = ChunkConfig::new(12, 2).unwrap().split(&words);
        assert!(segments[0].text.ends_with(' '));
        assert!(segments.iter().all(|s| s.text.chars().count() <= 12));
        assert_eq!(reconstruct(&segments, 2), words);
    }

    #[test]
    fn boundary_cuts_still_reconstruct_text() {
        let text = "등급 기준은 다음과 같다.\n\nS 등급은 81점 이상이다.\nA 등급은 61점 이상이다. \
                    코멘트는 실적을 근거로 작성한다.\n\n평가는 공정해야 한다."
            .repeat(5);
        for (size, overlap) in [(40, 5), (25, 0), (60, 10), (8, 7)] {
            let segments = ChunkConfig::new(size, overlap).unwrap().split(&text);
            assert!(segments.iter().all(|s| s.text.chars().count() <= size));
            assert_eq!(reconstruct(&segments, overlap), text, "size {size} overlap {overlap}");
        }
    }

    #[test]
    fn hard_cut_count_matches_stride_formula() {
        // No whitespace anywhere, so every cut is a hard cut.
        let config = ChunkConfig::new(400, 50).unwrap();
        for len in [51usize, 399, 400, 401, 750, 751, 1_000] {
            let text = "x".repeat(len);
            let formula = (len - 50).div_ceil(350);
            assert_eq!(config.split(&text).len(), formula, "len {len}");
        }
    }
}
