//! Focus Module - the current focus key
//!
//! The focus key is the externally selected "current concept". It is set by
//! user input (clicking an overlay vertex, cycling with the keyboard) or by
//! sequencer step activation, and read by the host once per frame.

use spark_signals::{signal, Signal};

thread_local! {
    /// Current focus key (None = nothing focused)
    static FOCUS_KEY: Signal<Option<String>> = signal(None);
    /// Free text the host falls back to when nothing is focused
    static FALLBACK_TEXT: Signal<String> = signal(String::new());
}

/// Get the current focus key.
pub fn focus_key() -> Option<String> {
    FOCUS_KEY.with(|s| s.get())
}

/// Check whether anything is focused.
pub fn has_focus() -> bool {
    FOCUS_KEY.with(|s| s.get().is_some())
}

/// Set the focus key. Empty strings clear focus.
pub fn set_focus(key: Option<&str>) {
    let key = key.filter(|k| !k.is_empty()).map(str::to_string);
    FOCUS_KEY.with(|s| {
        if s.get() != key {
            s.set(key);
        }
    });
}

/// Clear focus.
pub fn blur() {
    set_focus(None);
}

/// Text hashed for profile selection when nothing is focused.
pub fn fallback_text() -> String {
    FALLBACK_TEXT.with(|s| s.get())
}

/// Set the fallback text (e.g. the contents of a prompt field).
pub fn set_fallback_text(text: &str) {
    FALLBACK_TEXT.with(|s| s.set(text.to_string()));
}

/// Move focus to the key after the current one in `keys`, wrapping.
///
/// With nothing focused the first key is chosen. Returns the new key.
pub fn focus_next<'a>(keys: &[&'a str]) -> Option<&'a str> {
    if keys.is_empty() {
        return None;
    }
    let current = focus_key();
    let next = match current
        .as_deref()
        .and_then(|c| keys.iter().position(|k| *k == c))
    {
        Some(i) => keys[(i + 1) % keys.len()],
        None => keys[0],
    };
    set_focus(Some(next));
    Some(next)
}

/// Reset focus state (for testing).
pub fn reset_focus_state() {
    FOCUS_KEY.with(|s| s.set(None));
    FALLBACK_TEXT.with(|s| s.set(String::new()));
}
