//! State Module - Runtime state shared between the host and the field
//!
//! Thread-local reactive state, read by the host once per frame and written
//! by input handling, the sequencer and external collaborators:
//!
//! - **Focus** - current focus key and fallback text
//! - **Status** - externally reported system status
//! - **Pointer** - latest pointer position, listener registry
//! - **Input** - crossterm event conversion and polling

pub mod focus;
pub mod input;
pub mod pointer;
pub mod status;

pub use focus::{
    blur, fallback_text, focus_key, focus_next, has_focus, reset_focus_state, set_fallback_text,
    set_focus,
};
pub use input::{InputEvent, KeyAction};
pub use pointer::{on_pointer, pointer_position, Cleanup, PointerEvent, PointerKind};
pub use status::{cycle_system_status, reset_status_state, set_system_status, system_status};
