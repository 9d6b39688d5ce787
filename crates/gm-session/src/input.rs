//! Input abstraction layer.
//!
//! Normalizes the map surface's pointer events into a unified `InputEvent`
//! consumed by the controller. Every event carries both coordinate spaces:
//! the screen position (for hit-testing) and the map position (for placing
//! points and waypoints).

use gm_core::{MapPosition, ScreenPosition};

/// A click on the map surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickEvent {
    pub screen: ScreenPosition,
    pub map: MapPosition,
}

impl ClickEvent {
    pub fn new(screen: ScreenPosition, map: MapPosition) -> Self {
        Self { screen, map }
    }

    /// Click at a map position with the screen position at the origin.
    /// Handy for modes that never hit-test.
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            screen: ScreenPosition::default(),
            map: MapPosition::new(latitude, longitude),
        }
    }
}

/// A normalized input event from the map surface.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Click(ClickEvent),

    /// Pointer moved. Only traced while Shift is held.
    PointerMove { map: MapPosition, shift: bool },
}
