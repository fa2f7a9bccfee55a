//! Page visibility

/// Whether the current document is hidden (background tab, minimized window).
///
/// Without a document (e.g. inside a worker) the page counts as foreground,
/// so suspended attempts keep consuming the resume budget.
pub fn document_hidden() -> bool {
    web_sys::window()
        .and_then(|window| window.document())
        .map(|document| document.hidden())
        .unwrap_or(false)
}
