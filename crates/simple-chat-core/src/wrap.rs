//! Greedy word wrap for styled text.

/// Pack whitespace-delimited words of `text` into lines narrower than the
/// `(start_column, end_column)` window.
///
/// `measure` gives the visual width of a candidate line; pass
/// [`crate::color::visible_len`] so escape sequences don't count. A word is
/// appended while the measured line stays strictly under the window width.
/// A word wider than the window ends up alone on its line, unmodified.
pub fn wrap_text<F>(text: &str, window: (usize, usize), measure: F) -> Vec<String>
where
    F: Fn(&str) -> usize,
{
    let (start_column, end_column) = window;
    let max_width = end_column.saturating_sub(start_column);

    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    let mut line = first.to_string();
    for word in words {
        let candidate = format!("{} {}", line, word);
        if measure(&candidate) < max_width {
            line = candidate;
        } else {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        }
    }
    lines.push(line);
    lines.retain(|l| !l.is_empty());
    lines
}
