//! UI markers the scenarios wait for and assert on

/// Window title text.
pub const TITLE_TEXT: &str = "Always On Top";

/// Toolbar Open control.
pub const OPEN_BUTTON: &str = "#openBtn";

/// Region showing the selected file's basename.
pub const FILE_NAME: &str = "#fileName";

/// Status / message region; empty when nothing went wrong.
pub const STATUS: &str = "#status";

/// Placeholder shown in `#fileName` before any selection.
pub const NO_FILE_PLACEHOLDER: &str = "No file selected";

/// Playwright selector matching an element by its text.
pub fn text_selector(text: &str) -> String {
    format!("text={}", text)
}

/// Playwright selector for `selector` once it contains `text`.
pub fn has_text(selector: &str, text: &str) -> String {
    format!("{}:has-text(\"{}\")", selector, text.replace('"', "\\\""))
}
