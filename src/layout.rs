//! Greedy word wrap under a pixel-width budget.
//!
//! The wrap is generic over a [`MeasureText`] metric source so tests can use
//! fixed-advance metrics while production code measures through shaped text.
//! Lines are produced lazily and recomputed per call; there is no cached
//! state.

/// Pixel-width metric source for a fixed font and size.
pub(crate) trait MeasureText {
    /// Measured width of `text` in pixels.
    fn width_px(&mut self, text: &str) -> f64;
}

/// Fixed per-character advance, used by tests and as a font-less fallback.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FixedAdvance(pub(crate) f64);

impl MeasureText for FixedAdvance {
    fn width_px(&mut self, text: &str) -> f64 {
        text.chars().count() as f64 * self.0
    }
}

/// Lazy greedy word-wrap iterator, created by [`wrap`].
pub(crate) struct WrappedLines<'a, M> {
    words: std::str::SplitWhitespace<'a>,
    carry: Option<&'a str>,
    measure: M,
    max_width: f64,
}

impl<'a, M: MeasureText> Iterator for WrappedLines<'a, M> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mut cur = self.carry.take().or_else(|| self.words.next())?.to_string();

        for word in self.words.by_ref() {
            let candidate_len = cur.len() + 1 + word.len();
            let mut candidate = String::with_capacity(candidate_len);
            candidate.push_str(&cur);
            candidate.push(' ');
            candidate.push_str(word);

            if self.measure.width_px(&candidate) <= self.max_width {
                cur = candidate;
            } else {
                self.carry = Some(word);
                break;
            }
        }
        Some(cur)
    }
}

/// Wrap `text` into lines whose measured width fits `max_width`.
///
/// Words accumulate onto the current line while the candidate line still
/// fits; a word that doesn't fit starts the next line. A single word wider
/// than `max_width` is still emitted on its own line, unsplit. Whitespace
/// runs collapse to single spaces; empty input yields no lines.
pub(crate) fn wrap<M: MeasureText>(text: &str, measure: M, max_width: f64) -> WrappedLines<'_, M> {
    WrappedLines {
        words: text.split_whitespace(),
        carry: None,
        measure,
        max_width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str, advance: f64, max_width: f64) -> Vec<String> {
        wrap(text, FixedAdvance(advance), max_width).collect()
    }

    #[test]
    fn fits_words_greedily() {
        // 10px per char, 100px budget: "hello big" (9 chars) fits, adding
        // " world" (16 chars) does not.
        let out = lines("hello big world", 10.0, 100.0);
        assert_eq!(out, vec!["hello big", "world"]);
    }

    #[test]
    fn no_line_exceeds_budget_except_oversized_words() {
        let text = "a few short words and one absurdly lengthy compound";
        let max = 120.0;
        let mut measure = FixedAdvance(10.0);
        for line in lines(text, 10.0, max) {
            let w = measure.width_px(&line);
            let single_word = !line.contains(' ');
            assert!(w <= max || single_word, "line '{line}' is {w}px");
        }
    }

    #[test]
    fn oversized_single_word_is_emitted_unsplit() {
        let word = "x".repeat(500);
        let out = lines(&word, 10.0, 100.0);
        assert_eq!(out, vec![word]);
    }

    #[test]
    fn empty_and_whitespace_input_yield_no_lines() {
        assert!(lines("", 10.0, 100.0).is_empty());
        assert!(lines("   \t \n ", 10.0, 100.0).is_empty());
    }

    #[test]
    fn whitespace_runs_collapse() {
        let out = lines("alpha    beta\tgamma", 10.0, 1000.0);
        assert_eq!(out, vec!["alpha beta gamma"]);
    }

    #[test]
    fn iterator_is_lazy_and_restartable() {
        let text = "one two three four five six seven eight";
        // Callers cap rendered lines by take(); dropped lines are silent.
        let capped: Vec<_> = wrap(text, FixedAdvance(10.0), 90.0).take(2).collect();
        assert_eq!(capped.len(), 2);
        // A fresh call recomputes from the start.
        let again: Vec<_> = wrap(text, FixedAdvance(10.0), 90.0).take(2).collect();
        assert_eq!(capped, again);
    }
}
