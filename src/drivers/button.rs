//! ISR-debounced front-panel buttons.
//!
//! ## Hardware
//!
//! Active-low momentary switches with internal pull-ups.  Each GPIO fires
//! on the falling edge; the ISR records the raw timestamp into that
//! button's [`ButtonLatch`], and [`ButtonDriver::tick`] (called from the
//! main loop at control-tick rate) runs the debounce state machine.
//!
//! | State        | Leaves when                          | Event     |
//! |--------------|--------------------------------------|-----------|
//! | Idle         | a new edge is latched                |           |
//! | DebounceWait | `debounce_ms` elapsed, still pressed | `Pressed` |
//! | Held         | pin reads released                   |           |
//!
//! One `Pressed` per physical press; holding a button does not repeat.

use core::sync::atomic::{AtomicU32, Ordering};
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::AtomicBool;

/// Edge latch shared between one button's ISR and its driver.
pub struct ButtonLatch {
    /// Milliseconds since boot at the last falling edge (0 = never).
    edge_ms: AtomicU32,
    #[cfg(not(target_os = "espidf"))]
    sim_pressed: AtomicBool,
}

impl ButtonLatch {
    pub const fn new() -> Self {
        Self {
            edge_ms: AtomicU32::new(0),
            #[cfg(not(target_os = "espidf"))]
            sim_pressed: AtomicBool::new(false),
        }
    }

    /// Record a falling edge.  Safe to call from interrupt context
    /// (lock-free atomic store).
    pub fn record_edge(&self, now_ms: u32) {
        // 0 is the "never" marker; an edge at boot time still counts.
        self.edge_ms.store(now_ms.max(1), Ordering::Release);
    }

    fn last_edge(&self) -> u32 {
        self.edge_ms.load(Ordering::Acquire)
    }

    /// Drive the simulated pin level (host builds only).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_pressed(&self, pressed: bool) {
        self.sim_pressed.store(pressed, Ordering::Relaxed);
    }
}

impl Default for ButtonLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Latch for the "show settings" button.
pub static SETTINGS_BUTTON: ButtonLatch = ButtonLatch::new();
/// Latch for the light on/off button.
pub static LIGHT_BUTTON: ButtonLatch = ButtonLatch::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Pressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Idle,
    DebounceWait { since_ms: u32 },
    Held,
}

pub struct ButtonDriver {
    latch: &'static ButtonLatch,
    gpio: i32,
    debounce_ms: u32,
    state: DebounceState,
    last_edge_ms: u32,
}

impl ButtonDriver {
    pub fn new(latch: &'static ButtonLatch, gpio: i32, debounce_ms: u32) -> Self {
        Self {
            latch,
            gpio,
            debounce_ms,
            state: DebounceState::Idle,
            // Edges latched before the driver existed are ignored.
            last_edge_ms: latch.last_edge(),
        }
    }

    /// GPIO pin this button is attached to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Call from the main loop at each control tick.
    /// `now_ms` is the current monotonic time in milliseconds.
    pub fn tick(&mut self, now_ms: u32) -> Option<ButtonEvent> {
        let edge_ms = self.latch.last_edge();
        let new_edge = edge_ms != 0 && edge_ms != self.last_edge_ms;

        match self.state {
            DebounceState::Idle => {
                if new_edge {
                    self.last_edge_ms = edge_ms;
                    self.state = DebounceState::DebounceWait { since_ms: now_ms };
                }
                None
            }

            DebounceState::DebounceWait { since_ms } => {
                if new_edge {
                    // Contact bounce: restart the window.
                    self.last_edge_ms = edge_ms;
                    self.state = DebounceState::DebounceWait { since_ms: now_ms };
                    return None;
                }
                if now_ms.wrapping_sub(since_ms) < self.debounce_ms {
                    return None;
                }
                if self.is_pressed_hw() {
                    self.state = DebounceState::Held;
                    Some(ButtonEvent::Pressed)
                } else {
                    self.state = DebounceState::Idle;
                    None
                }
            }

            DebounceState::Held => {
                if !self.is_pressed_hw() {
                    // Edges seen while held are bounce from this press.
                    self.last_edge_ms = edge_ms;
                    self.state = DebounceState::Idle;
                }
                None
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn is_pressed_hw(&self) -> bool {
        !crate::drivers::hw_init::gpio_read(self.gpio)
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_pressed_hw(&self) -> bool {
        self.latch.sim_pressed.load(Ordering::Relaxed)
    }
}
