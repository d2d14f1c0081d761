use super::metrics::TextMetrics;

/// One row of wrapped text.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub text: String,
    /// Measured width. At most the wrap width unless the row is a single
    /// character that is wider on its own.
    pub width: f32,
    pub height: f32,
}

/// Greedy word-fill wrapping.
///
/// Words are the whitespace-separated pieces of `text` and are re-joined with
/// single spaces. Each word is appended to the current row while the row still
/// fits `max_width`; otherwise the row is committed and the word starts a new
/// one. Words wider than `max_width` on their own are broken with
/// [`split_word`].
///
/// Every returned line fits `max_width`, except a line holding one character
/// that is wider than `max_width` by itself. That overflow is passed through.
pub fn wrap_text<M: TextMetrics + ?Sized>(text: &str, metrics: &M, max_width: f32) -> Vec<Line> {
    let height = metrics.line_height();
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0;

    let commit = |text: String, width: f32, lines: &mut Vec<Line>| {
        lines.push(Line {
            text,
            width,
            height,
        });
    };

    for word in text.split_whitespace() {
        let test_line = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        let test_width = metrics.text_width(&test_line);

        if test_width <= max_width {
            current = test_line;
            current_width = test_width;
            continue;
        }

        if !current.is_empty() {
            commit(std::mem::take(&mut current), current_width, &mut lines);
        }

        let word_width = metrics.text_width(word);
        if word_width <= max_width {
            current = word.to_string();
            current_width = word_width;
            continue;
        }

        let mut parts = split_word(word, metrics, max_width);
        // Never empty: `word` is non-empty and the splitter consumes every char.
        let Some(last) = parts.pop() else {
            continue;
        };
        for part in parts {
            let width = metrics.text_width(&part);
            commit(part, width, &mut lines);
        }
        current_width = metrics.text_width(&last);
        current = last;
    }

    if !current.is_empty() {
        commit(current, current_width, &mut lines);
    }

    lines
}

/// Breaks `word` into the longest prefixes that fit `max_width`.
///
/// A character that does not fit even on its own becomes a part by itself, so
/// the scan always advances and the parts concatenate back to `word`. With a
/// zero or negative width every character is its own part.
pub fn split_word<M: TextMetrics + ?Sized>(word: &str, metrics: &M, max_width: f32) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current_part = String::new();

    for ch in word.chars() {
        let mut test_part = current_part.clone();
        test_part.push(ch);

        if metrics.text_width(&test_part) <= max_width {
            current_part = test_part;
        } else {
            if !current_part.is_empty() {
                parts.push(std::mem::take(&mut current_part));
            }
            current_part.push(ch);
        }
    }

    if !current_part.is_empty() {
        parts.push(current_part);
    }

    parts
}
