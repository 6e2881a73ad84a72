use crate::error::{SyncError, SyncResult};
use crate::util::utf16_to_byte_index;
use wasm_bindgen::JsCast;

/// The text surface the user types into.
pub trait EditorSurface {
    fn text(&self) -> String;
    fn set_text(&self, text: &str);

    /// Switch from the rendered view to editing. No-op by default.
    fn reveal(&self) {}
}

/// Clear the host page's intro placeholder when the user focuses the editor.
/// Returns whether the buffer was cleared.
pub fn clear_intro_placeholder(editor: &dyn EditorSurface, intro_text: &str) -> bool {
    let intro = intro_text.trim();
    if intro.is_empty() || editor.text().trim() != intro {
        return false;
    }
    // A single space keeps the textarea from collapsing.
    editor.set_text(" ");
    true
}

/// Replace the selection `[start, end)` (UTF-16 offsets) with a tab.
/// Returns the new value and the caret offset right after the tab.
pub fn insert_tab(value: &str, start: u32, end: u32) -> (String, u32) {
    let (start, end) = (start.min(end), start.max(end));
    let start_byte = utf16_to_byte_index(value, start);
    let end_byte = utf16_to_byte_index(value, end);

    let mut out = String::with_capacity(value.len() + 1);
    out.push_str(&value[..start_byte]);
    out.push('\t');
    out.push_str(&value[end_byte..]);

    let caret = value[..start_byte].encode_utf16().count() as u32 + 1;
    (out, caret)
}

/// The host page's `<textarea>` plus the rendered-markdown container that
/// is emptied when editing starts.
pub struct BrowserEditor {
    textarea: web_sys::HtmlTextAreaElement,
    preview: Option<web_sys::Element>,
}

impl BrowserEditor {
    pub fn find(document: &web_sys::Document, editor_id: &str, preview_id: &str) -> SyncResult<Self> {
        let textarea = document
            .get_element_by_id(editor_id)
            .ok_or_else(|| SyncError::dom(&format!("#{editor_id} not found")))?
            .dyn_into::<web_sys::HtmlTextAreaElement>()
            .map_err(|_| SyncError::dom(&format!("#{editor_id} is not a textarea")))?;

        Ok(Self {
            textarea,
            preview: document.get_element_by_id(preview_id),
        })
    }

    pub fn element(&self) -> &web_sys::HtmlTextAreaElement {
        &self.textarea
    }

    pub fn is_visible(&self) -> bool {
        self.textarea
            .style()
            .get_property_value("display")
            .map(|d| d != "none")
            .unwrap_or(true)
    }

    pub fn focus(&self) {
        let _ = self.textarea.focus();
    }

    /// Tab inserts a literal tab instead of moving focus.
    pub fn insert_tab_at_selection(&self) {
        let value = self.textarea.value();
        let start = self.textarea.selection_start().ok().flatten().unwrap_or(0);
        let end = self.textarea.selection_end().ok().flatten().unwrap_or(start);

        let (next, caret) = insert_tab(&value, start, end);
        self.textarea.set_value(&next);
        let _ = self.textarea.set_selection_range(caret, caret);
    }
}

impl EditorSurface for BrowserEditor {
    fn text(&self) -> String {
        self.textarea.value()
    }

    fn set_text(&self, text: &str) {
        self.textarea.set_value(text);
    }

    fn reveal(&self) {
        if let Some(preview) = &self.preview {
            preview.set_inner_html("");
        }
        // inline-block so trailing line breaks still take up room.
        let _ = self.textarea.style().set_property("display", "inline-block");
        self.focus();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryEditor;

    #[test]
    fn test_intro_placeholder_is_cleared() {
        let editor = MemoryEditor::with_text("  Welcome! Start typing.\n");
        assert!(clear_intro_placeholder(&editor, "Welcome! Start typing."));
        assert_eq!(editor.text(), " ");
    }

    #[test]
    fn test_real_content_is_kept() {
        let editor = MemoryEditor::with_text("my notes");
        assert!(!clear_intro_placeholder(&editor, "Welcome! Start typing."));
        assert_eq!(editor.text(), "my notes");
    }

    #[test]
    fn test_empty_intro_never_clears() {
        let editor = MemoryEditor::with_text("");
        assert!(!clear_intro_placeholder(&editor, ""));
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn test_insert_tab_at_caret() {
        assert_eq!(insert_tab("ab", 1, 1), ("a\tb".to_string(), 2));
        assert_eq!(insert_tab("", 0, 0), ("\t".to_string(), 1));
    }

    #[test]
    fn test_insert_tab_replaces_selection() {
        assert_eq!(insert_tab("hello world", 5, 11), ("hello\t".to_string(), 6));
        // Reversed offsets behave like a normal selection.
        assert_eq!(insert_tab("hello world", 11, 5), ("hello\t".to_string(), 6));
    }

    #[test]
    fn test_insert_tab_counts_utf16_units() {
        // The emoji is two UTF-16 units.
        let (out, caret) = insert_tab("😀x", 2, 2);
        assert_eq!(out, "😀\tx");
        assert_eq!(caret, 3);
    }

    #[test]
    fn test_insert_tab_clamps_past_end() {
        assert_eq!(insert_tab("ab", 9, 9), ("ab\t".to_string(), 3));
    }
}
