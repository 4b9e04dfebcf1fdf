/// Verdict extraction from a model's free-text answer.

/// Which option the model picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    A,
    B,
}

fn letter_to_pick(c: char) -> Option<Pick> {
    match c.to_ascii_uppercase() {
        'A' => Some(Pick::A),
        'B' => Some(Pick::B),
        _ => None,
    }
}

/// Find the letter following the last "Verdict" marker.
///
/// Accepts "Verdict: A", "Verdict:\nB", "**Verdict:** A" and similar.
fn parse_after_marker(text: &str) -> Option<Pick> {
    let lower = text.to_ascii_lowercase();
    let idx = lower.rfind("verdict")?;
    text[idx + "verdict".len()..]
        .chars()
        .find(|c| c.is_ascii_alphanumeric())
        .and_then(letter_to_pick)
}

/// Fallback: a line like "A: Option A ranks higher" among the last few lines.
fn parse_from_trailing_lines(text: &str) -> Option<Pick> {
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(5);
    for line in lines[start..].iter().rev() {
        let chars: Vec<char> = line.trim().chars().take(2).collect();
        if chars.len() == 2 && chars[1] == ':' {
            if let Some(pick) = letter_to_pick(chars[0]) {
                return Some(pick);
            }
        }
    }
    None
}

/// Parse the model's answer. `None` if no verdict can be found.
pub fn parse_verdict(text: &str) -> Option<Pick> {
    parse_after_marker(text).or_else(|| parse_from_trailing_lines(text))
}
