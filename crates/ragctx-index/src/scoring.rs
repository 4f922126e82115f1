//! Confidence scoring for chunks.

use ragctx_chunker::text::{char_len, sentence_fragments};
use ragctx_core::{ChunkingConfig, MAX_CONFIDENCE, MIN_CONFIDENCE};

/// Punctuation that does not count as noise.
const PROSE_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"', '(', ')', '-'];

/// Multiplicative quality heuristic in `[0.1, 1.0]`.
///
/// Starts at 1.0 and applies, in order:
/// - a size penalty when `len / target_chunk_size` is outside the configured band
/// - a sentence completeness factor `base + (1 - base) * complete / fragments`
/// - a noise penalty when symbol characters exceed the noise threshold
#[must_use]
pub fn score_confidence(content: &str, config: &ChunkingConfig) -> f64 {
    let scoring = &config.scoring;
    let len = char_len(content);
    let mut score = 1.0;

    let ratio = len as f64 / config.target_chunk_size.max(1) as f64;
    if ratio < scoring.size_ratio_min || ratio > scoring.size_ratio_max {
        score *= scoring.size_penalty;
    }

    let fragments = sentence_fragments(content);
    let completeness = if fragments.is_empty() {
        0.0
    } else {
        let complete = fragments
            .iter()
            .filter(|f| char_len(f) > scoring.complete_fragment_len)
            .count();
        complete as f64 / fragments.len() as f64
    };
    score *= scoring.completeness_base + (1.0 - scoring.completeness_base) * completeness;

    if len > 0 && noise_ratio(content, len) > scoring.noise_threshold {
        score *= scoring.noise_penalty;
    }

    score.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

fn noise_ratio(content: &str, len: usize) -> f64 {
    let noise = content
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !PROSE_PUNCTUATION.contains(c))
        .count();
    noise as f64 / len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(target: usize) -> ChunkingConfig {
        ChunkingConfig {
            target_chunk_size: target,
            min_chunk_size: 1,
            max_chunk_size: target * 4,
            overlap_size: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_prose_scores_full() {
        let content = "This sentence is complete. So is this second sentence.";
        let score = score_confidence(content, &config(60));
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_size_penalty() {
        let content = "This sentence is complete. So is this second sentence.";
        // len 54 against a target of 1000 is below the 0.3 ratio
        let score = score_confidence(content, &config(1000));
        assert!((score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_completeness_factor() {
        // One complete fragment, one short one
        let content = "A complete sentence here. Short.";
        let score = score_confidence(content, &config(40));
        assert!((score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_noise_penalty() {
        let content = "### ### ### @@@ %%% &&& *** Words in here";
        let score = score_confidence(content, &config(40));
        // completeness 1/1 (fragment > 10 chars), noisy
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_score_is_clamped() {
        let config = ChunkingConfig {
            scoring: ragctx_core::ScoringConfig {
                size_penalty: 0.1,
                completeness_base: 0.1,
                noise_penalty: 0.1,
                ..Default::default()
            },
            ..config(1000)
        };
        let score = score_confidence("@@@@", &config);
        assert!((score - MIN_CONFIDENCE).abs() < 1e-9);
    }

    #[test]
    fn test_empty_content() {
        let score = score_confidence("", &config(100));
        assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&score));
    }
}
