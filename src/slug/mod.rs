//! Candidate slug derivation.
//!
//! The slug is a pure function of the buffer text. The server may still
//! rename the document, so this is only ever a candidate.

/// Shortest candidate that is accepted as a slug.
const MIN_SLUG_LEN: usize = 2;

/// Derive a URL-safe candidate name from the first line that yields one.
///
/// Each line is lowercased, whitespace runs become `-`, anything outside
/// `[A-Za-z0-9_-]` is dropped, repeated hyphens collapse and leading or
/// trailing hyphens are trimmed. Returns `""` when no line qualifies.
pub fn slugify(text: &str) -> String {
    text.split('\n')
        .map(slugify_line)
        .find(|slug| slug.len() >= MIN_SLUG_LEN)
        .unwrap_or_default()
}

fn slugify_line(line: &str) -> String {
    let lowered = line.to_lowercase();

    let mut out = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for c in lowered.chars() {
        if is_slug_whitespace(c) {
            if !in_whitespace {
                push_hyphen(&mut out);
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;

        if c == '-' {
            push_hyphen(&mut out);
        } else if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        }
    }

    out.trim_matches('-').to_string()
}

fn push_hyphen(out: &mut String) {
    if !out.ends_with('-') {
        out.push('-');
    }
}

// Browser regex `\s`: Unicode White_Space minus NEL, plus the BOM.
fn is_slug_whitespace(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}
