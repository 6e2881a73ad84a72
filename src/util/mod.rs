/// The editable surface may hand back literal `<br>` tags for line breaks.
pub(crate) fn normalize_line_breaks(text: &str) -> String {
    text.replace("<br>", "\n")
}

/// Read a query parameter from a full href the way the browser page did:
/// absent -> `None`, bare flag (`?edit`) -> `Some("")`, otherwise the
/// `+`-as-space, percent-decoded value.
pub(crate) fn query_param(href: &str, name: &str) -> Option<String> {
    let without_fragment = href.split('#').next().unwrap_or("");
    let (_, query) = without_fragment.split_once('?')?;

    for pair in query.split('&') {
        let (key, value) = match pair.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (pair, None),
        };
        if key != name {
            continue;
        }

        let Some(value) = value else {
            return Some(String::new());
        };
        let spaced = value.replace('+', " ");
        return Some(
            urlencoding::decode(&spaced)
                .map(|v| v.into_owned())
                .unwrap_or(spaced),
        );
    }

    None
}

/// Convert a DOM selection offset (UTF-16 code units) into a byte index,
/// clamped to the end of `s`.
pub(crate) fn utf16_to_byte_index(s: &str, utf16_idx: u32) -> usize {
    let mut units: u32 = 0;
    for (byte_idx, ch) in s.char_indices() {
        if units >= utf16_idx {
            return byte_idx;
        }
        units += ch.len_utf16() as u32;
    }
    s.len()
}
