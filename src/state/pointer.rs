//! Pointer Module - pointer position and listener registry
//!
//! Holds the latest pointer position (in surface-local coordinates) and a
//! registry of pointer listeners. The host translates terminal mouse events
//! into [`PointerEvent`]s and calls [`dispatch`]; the particle field attaches
//! a listener so hover and click hit-testing see every event.
//!
//! # API
//!
//! - `pointer_position` - Latest pointer position, `None` after leave
//! - `last_event` - Last dispatched event
//! - `dispatch(event)` - Update state and notify listeners
//! - `on_pointer(fn)` - Register a listener, returns cleanup
//!
//! # Example
//!
//! ```ignore
//! use spark_flow::state::pointer::{self, PointerEvent};
//! use spark_flow::types::Point;
//!
//! let cleanup = pointer::on_pointer(|event| {
//!     println!("{:?} at ({}, {})", event.kind, event.position.x, event.position.y);
//! });
//!
//! pointer::dispatch(PointerEvent::click(Point::new(10.0, 4.0)));
//! cleanup();
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use spark_signals::{signal, Signal};

use crate::types::Point;

// =============================================================================
// TYPES
// =============================================================================

/// Pointer action type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Move,
    Click,
    /// Pointer left the surface.
    Leave,
}

/// Pointer event in surface-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub position: Point,
}

impl PointerEvent {
    pub fn move_to(position: Point) -> Self {
        Self {
            kind: PointerKind::Move,
            position,
        }
    }

    pub fn click(position: Point) -> Self {
        Self {
            kind: PointerKind::Click,
            position,
        }
    }

    pub fn leave() -> Self {
        Self {
            kind: PointerKind::Leave,
            position: Point::ZERO,
        }
    }
}

/// Cleanup function returned by registrations.
pub type Cleanup = Box<dyn FnOnce()>;

/// Listener for pointer events.
pub type PointerHandler = Rc<RefCell<dyn FnMut(&PointerEvent)>>;

// =============================================================================
// REACTIVE STATE
// =============================================================================

thread_local! {
    static POINTER_POSITION: Signal<Option<Point>> = signal(None);
    static LAST_EVENT: Signal<Option<PointerEvent>> = signal(None);
}

/// Latest pointer position, `None` if the pointer is off the surface.
pub fn pointer_position() -> Option<Point> {
    POINTER_POSITION.with(|s| s.get())
}

/// Last dispatched pointer event.
pub fn last_event() -> Option<PointerEvent> {
    LAST_EVENT.with(|s| s.get())
}

// =============================================================================
// LISTENER REGISTRY
// =============================================================================

struct ListenerRegistry {
    listeners: Vec<(usize, PointerHandler)>,
    next_id: usize,
}

impl ListenerRegistry {
    fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

thread_local! {
    static REGISTRY: RefCell<ListenerRegistry> = RefCell::new(ListenerRegistry::new());
}

/// Register a pointer listener. Returns cleanup function.
///
/// Calling the cleanup more than once is impossible (it is `FnOnce`); dropping
/// it without calling leaves the listener attached.
pub fn on_pointer<F>(handler: F) -> Cleanup
where
    F: FnMut(&PointerEvent) + 'static,
{
    let handler: PointerHandler = Rc::new(RefCell::new(handler));
    let id = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let id = reg.next_id();
        reg.listeners.push((id, handler));
        id
    });

    Box::new(move || {
        REGISTRY.with(|reg| {
            reg.borrow_mut().listeners.retain(|(lid, _)| *lid != id);
        });
    })
}

/// Number of attached listeners.
pub fn listener_count() -> usize {
    REGISTRY.with(|reg| reg.borrow().listeners.len())
}

/// Dispatch a pointer event: update state, then notify listeners.
///
/// Listeners are snapshotted first, so a listener may register or remove
/// listeners while being called.
pub fn dispatch(event: PointerEvent) {
    let position = match event.kind {
        PointerKind::Leave => None,
        PointerKind::Move | PointerKind::Click => Some(event.position),
    };
    POINTER_POSITION.with(|s| s.set(position));
    LAST_EVENT.with(|s| s.set(Some(event)));

    let listeners: Vec<PointerHandler> = REGISTRY.with(|reg| {
        reg.borrow()
            .listeners
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect()
    });

    for handler in listeners {
        if let Ok(mut handler) = handler.try_borrow_mut() {
            handler(&event);
        }
    }
}

/// Reset all pointer state (for testing).
pub fn reset_pointer_state() {
    POINTER_POSITION.with(|s| s.set(None));
    LAST_EVENT.with(|s| s.set(None));
    REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        reg.listeners.clear();
        reg.next_id = 0;
    });
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn setup() {
        reset_pointer_state();
    }

    #[test]
    fn test_dispatch_updates_position() {
        setup();

        dispatch(PointerEvent::move_to(Point::new(3.0, 4.0)));
        assert_eq!(pointer_position(), Some(Point::new(3.0, 4.0)));

        dispatch(PointerEvent::leave());
        assert_eq!(pointer_position(), None);
        assert_eq!(last_event().map(|e| e.kind), Some(PointerKind::Leave));
    }

    #[test]
    fn test_listener_receives_events_until_cleanup() {
        setup();

        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        let cleanup = on_pointer(move |_| count_clone.set(count_clone.get() + 1));
        assert_eq!(listener_count(), 1);

        dispatch(PointerEvent::click(Point::new(1.0, 1.0)));
        dispatch(PointerEvent::move_to(Point::new(2.0, 1.0)));
        assert_eq!(count.get(), 2);

        cleanup();
        assert_eq!(listener_count(), 0);

        dispatch(PointerEvent::click(Point::new(1.0, 1.0)));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_listener_may_register_during_dispatch() {
        setup();

        let inner_cleanups: Rc<RefCell<Vec<Cleanup>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = inner_cleanups.clone();
        let _outer = on_pointer(move |_| {
            sink.borrow_mut().push(on_pointer(|_| {}));
        });

        dispatch(PointerEvent::move_to(Point::ZERO));
        assert_eq!(listener_count(), 2);
    }
}
