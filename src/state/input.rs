//! Input Module - Event conversion and polling
//!
//! Bridges crossterm's event system with the pointer registry and the host's
//! key bindings.
//!
//! Terminal mouse events arrive in cell coordinates. The raster behind the
//! terminal is one logical pixel per column and two per row (half blocks),
//! so a cell maps to the center of its 1x2 pixel block.
//!
//! # API
//!
//! - `convert_mouse_event` - crossterm MouseEvent to a surface PointerEvent
//! - `convert_key_event` - crossterm KeyEvent to a host KeyAction
//! - `poll_event` - Non-blocking event check with timeout
//! - `read_event` - Blocking event read

use crossterm::event::{
    poll, read, Event as CrosstermEvent, KeyCode, KeyEvent as CrosstermKeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent as CrosstermMouseEvent, MouseEventKind,
};
use std::time::Duration;

use super::pointer::PointerEvent;
use crate::types::Point;

// =============================================================================
// INPUT EVENT ENUM
// =============================================================================

/// Host key bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// `q`, Ctrl+C
    Quit,
    /// Space: play the selected program, or stop it if playing
    TogglePlayback,
    /// `s`: cycle the system status
    CycleStatus,
    /// Tab: focus the next concept
    NextConcept,
    /// Esc: clear focus
    Blur,
}

/// Unified event type for the exhibit loop
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Key(KeyAction),
    /// Terminal resize (columns, rows)
    Resize(u16, u16),
    /// No event or unhandled event type
    None,
}

// =============================================================================
// MOUSE EVENT CONVERSION
// =============================================================================

/// Surface point at the center of a terminal cell.
pub fn cell_to_surface(column: u16, row: u16) -> Point {
    Point::new(column as f32 + 0.5, row as f32 * 2.0 + 1.0)
}

/// Convert a crossterm MouseEvent. Left press clicks; moves and drags move.
pub fn convert_mouse_event(event: CrosstermMouseEvent) -> Option<PointerEvent> {
    let at = cell_to_surface(event.column, event.row);
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(PointerEvent::click(at)),
        MouseEventKind::Moved | MouseEventKind::Drag(_) => Some(PointerEvent::move_to(at)),
        _ => None,
    }
}

// =============================================================================
// KEY EVENT CONVERSION
// =============================================================================

/// Convert a crossterm KeyEvent. Only presses are bound.
pub fn convert_key_event(event: CrosstermKeyEvent) -> Option<KeyAction> {
    if event.kind != KeyEventKind::Press {
        return None;
    }
    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
    match event.code {
        KeyCode::Char('c') if ctrl => Some(KeyAction::Quit),
        KeyCode::Char('q') => Some(KeyAction::Quit),
        KeyCode::Char(' ') => Some(KeyAction::TogglePlayback),
        KeyCode::Char('s') => Some(KeyAction::CycleStatus),
        KeyCode::Tab => Some(KeyAction::NextConcept),
        KeyCode::Esc => Some(KeyAction::Blur),
        _ => None,
    }
}

/// Convert any crossterm event.
pub fn convert_event(event: CrosstermEvent) -> InputEvent {
    match event {
        CrosstermEvent::Mouse(mouse) => convert_mouse_event(mouse)
            .map(InputEvent::Pointer)
            .unwrap_or(InputEvent::None),
        CrosstermEvent::Key(key) => convert_key_event(key)
            .map(InputEvent::Key)
            .unwrap_or(InputEvent::None),
        CrosstermEvent::Resize(w, h) => InputEvent::Resize(w, h),
        CrosstermEvent::FocusLost => InputEvent::Pointer(PointerEvent::leave()),
        _ => InputEvent::None,
    }
}

// =============================================================================
// EVENT POLLING
// =============================================================================

/// Poll for an event with timeout.
/// Returns None if no event within timeout.
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<InputEvent>> {
    if poll(timeout)? {
        Ok(Some(read_event()?))
    } else {
        Ok(None)
    }
}

/// Read the next event (blocking).
pub fn read_event() -> std::io::Result<InputEvent> {
    Ok(convert_event(read()?))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::pointer::PointerKind;
    use crossterm::event::KeyEventState;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> CrosstermMouseEvent {
        CrosstermMouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::empty(),
        }
    }

    fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> CrosstermKeyEvent {
        CrosstermKeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        }
    }

    fn press(code: KeyCode) -> CrosstermKeyEvent {
        key(code, KeyModifiers::empty(), KeyEventKind::Press)
    }

    #[test]
    fn test_convert_mouse_down_is_click() {
        let event = convert_mouse_event(mouse(MouseEventKind::Down(MouseButton::Left), 10, 5)).unwrap();
        assert_eq!(event.kind, PointerKind::Click);
        assert_eq!(event.position, Point::new(10.5, 11.0));
    }

    #[test]
    fn test_convert_mouse_move_and_drag() {
        for kind in [MouseEventKind::Moved, MouseEventKind::Drag(MouseButton::Left)] {
            let event = convert_mouse_event(mouse(kind, 0, 0)).unwrap();
            assert_eq!(event.kind, PointerKind::Move);
            assert_eq!(event.position, Point::new(0.5, 1.0));
        }
    }

    #[test]
    fn test_unbound_mouse_events_ignored() {
        for kind in [
            MouseEventKind::Down(MouseButton::Right),
            MouseEventKind::Up(MouseButton::Left),
            MouseEventKind::ScrollUp,
        ] {
            assert!(convert_mouse_event(mouse(kind, 3, 3)).is_none());
        }
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(convert_key_event(press(KeyCode::Char('q'))), Some(KeyAction::Quit));
        assert_eq!(
            convert_key_event(key(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press)),
            Some(KeyAction::Quit)
        );
        assert_eq!(convert_key_event(press(KeyCode::Char('c'))), None);
        assert_eq!(convert_key_event(press(KeyCode::Char(' '))), Some(KeyAction::TogglePlayback));
        assert_eq!(convert_key_event(press(KeyCode::Char('s'))), Some(KeyAction::CycleStatus));
        assert_eq!(convert_key_event(press(KeyCode::Tab)), Some(KeyAction::NextConcept));
        assert_eq!(convert_key_event(press(KeyCode::Esc)), Some(KeyAction::Blur));
    }

    #[test]
    fn test_only_presses_are_bound() {
        for kind in [KeyEventKind::Repeat, KeyEventKind::Release] {
            assert_eq!(
                convert_key_event(key(KeyCode::Char('q'), KeyModifiers::empty(), kind)),
                None
            );
        }
    }

    #[test]
    fn test_convert_event_routes_variants() {
        assert_eq!(convert_event(CrosstermEvent::Resize(120, 40)), InputEvent::Resize(120, 40));
        assert_eq!(
            convert_event(CrosstermEvent::FocusLost),
            InputEvent::Pointer(PointerEvent::leave())
        );
        assert_eq!(convert_event(CrosstermEvent::FocusGained), InputEvent::None);
        assert_eq!(
            convert_event(CrosstermEvent::Key(press(KeyCode::Char('s')))),
            InputEvent::Key(KeyAction::CycleStatus)
        );
    }
}
