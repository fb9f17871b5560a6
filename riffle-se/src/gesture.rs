//! Gesture input adapters
//!
//! Normalizes raw pointer/touch sequences from the frontend shell into one
//! of three intents. The touch adapter compares down/up coordinates; the
//! pointer adapter additionally tracks movement so a click is distinguished
//! from a drag before the button is released. Exactly one intent is emitted
//! per completed gesture.

/// Net horizontal displacement (in frontend units) separating a directional
/// swipe from a tap/click.
pub const SWIPE_THRESHOLD: f32 = 50.0;

/// Normalized user action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Audition the next sample
    Next,
    /// Archive the current sample, then audition the next
    Save,
    /// Restart playback from the beginning, or toggle it off
    Toggle,
}

/// Raw pointer/touch event from the frontend shell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Up { x: f32, y: f32 },
}

/// Device class detected once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Touch,
    Pointer,
}

impl std::str::FromStr for DeviceClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "touch" => Ok(DeviceClass::Touch),
            "pointer" => Ok(DeviceClass::Pointer),
            other => Err(format!("unknown device class: {other}")),
        }
    }
}

/// Intent for a completed gesture with the given net horizontal displacement
fn directional_intent(dx: f32) -> Intent {
    if dx <= -SWIPE_THRESHOLD {
        Intent::Next
    } else if dx >= SWIPE_THRESHOLD {
        Intent::Save
    } else {
        Intent::Toggle
    }
}

/// Gesture adapter selected once at initialization; no runtime switching.
#[derive(Debug)]
pub enum GestureAdapter {
    Touch(TouchAdapter),
    Drag(DragAdapter),
}

impl GestureAdapter {
    pub fn for_device(class: DeviceClass) -> Self {
        match class {
            DeviceClass::Touch => GestureAdapter::Touch(TouchAdapter::default()),
            DeviceClass::Pointer => GestureAdapter::Drag(DragAdapter::default()),
        }
    }

    /// Feed one raw event; returns an intent only when a gesture completes.
    pub fn handle(&mut self, event: PointerEvent) -> Option<Intent> {
        match self {
            GestureAdapter::Touch(adapter) => adapter.handle(event),
            GestureAdapter::Drag(adapter) => adapter.handle(event),
        }
    }
}

/// Swipe detection for touch devices: start and end coordinates only.
#[derive(Debug, Default)]
pub struct TouchAdapter {
    start: Option<(f32, f32)>,
}

impl TouchAdapter {
    pub fn handle(&mut self, event: PointerEvent) -> Option<Intent> {
        match event {
            PointerEvent::Down { x, y } => {
                self.start = Some((x, y));
                None
            }
            PointerEvent::Move { .. } => None,
            PointerEvent::Up { x, .. } => {
                let (start_x, _) = self.start.take()?;
                Some(directional_intent(x - start_x))
            }
        }
    }
}

/// Drag detection for pointer devices.
///
/// A movement beyond the threshold marks the gesture as a drag before the
/// button is released; a non-drag release is a click (Toggle).
#[derive(Debug, Default)]
pub struct DragAdapter {
    start: Option<(f32, f32)>,
    dragging: bool,
}

impl DragAdapter {
    pub fn handle(&mut self, event: PointerEvent) -> Option<Intent> {
        match event {
            PointerEvent::Down { x, y } => {
                self.start = Some((x, y));
                self.dragging = false;
                None
            }
            PointerEvent::Move { x, y } => {
                if let Some((start_x, start_y)) = self.start {
                    let distance = ((x - start_x).powi(2) + (y - start_y).powi(2)).sqrt();
                    if distance >= SWIPE_THRESHOLD {
                        self.dragging = true;
                    }
                }
                None
            }
            PointerEvent::Up { x, .. } => {
                let (start_x, _) = self.start.take()?;
                let dragging = std::mem::take(&mut self.dragging);

                if dragging {
                    Some(directional_intent(x - start_x))
                } else {
                    Some(Intent::Toggle)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swipe(adapter: &mut GestureAdapter, from_x: f32, to_x: f32) -> Vec<Intent> {
        [
            PointerEvent::Down { x: from_x, y: 100.0 },
            PointerEvent::Move {
                x: (from_x + to_x) / 2.0,
                y: 100.0,
            },
            PointerEvent::Up { x: to_x, y: 100.0 },
        ]
        .into_iter()
        .filter_map(|event| adapter.handle(event))
        .collect()
    }

    #[test]
    fn test_touch_swipe_left_is_next() {
        let mut adapter = GestureAdapter::for_device(DeviceClass::Touch);
        assert_eq!(swipe(&mut adapter, 200.0, 100.0), vec![Intent::Next]);
    }

    #[test]
    fn test_touch_swipe_right_is_save() {
        let mut adapter = GestureAdapter::for_device(DeviceClass::Touch);
        assert_eq!(swipe(&mut adapter, 100.0, 200.0), vec![Intent::Save]);
    }

    #[test]
    fn test_touch_below_threshold_is_toggle() {
        let mut adapter = GestureAdapter::for_device(DeviceClass::Touch);
        assert_eq!(swipe(&mut adapter, 100.0, 140.0), vec![Intent::Toggle]);
        assert_eq!(swipe(&mut adapter, 140.0, 100.0), vec![Intent::Toggle]);
    }

    #[test]
    fn test_threshold_boundary() {
        let mut adapter = GestureAdapter::for_device(DeviceClass::Touch);
        assert_eq!(
            swipe(&mut adapter, 100.0, 100.0 + SWIPE_THRESHOLD),
            vec![Intent::Save]
        );
        assert_eq!(
            swipe(&mut adapter, 100.0, 100.0 + SWIPE_THRESHOLD - 1.0),
            vec![Intent::Toggle]
        );
    }

    #[test]
    fn test_up_without_down_emits_nothing() {
        let mut adapter = GestureAdapter::for_device(DeviceClass::Touch);
        assert_eq!(adapter.handle(PointerEvent::Up { x: 10.0, y: 10.0 }), None);
    }

    #[test]
    fn test_one_intent_per_gesture() {
        let mut adapter = GestureAdapter::for_device(DeviceClass::Touch);
        for _ in 0..5 {
            let intents = swipe(&mut adapter, 300.0, 100.0);
            assert_eq!(intents, vec![Intent::Next]);
        }
    }

    #[test]
    fn test_drag_click_is_toggle() {
        let mut adapter = GestureAdapter::for_device(DeviceClass::Pointer);

        adapter.handle(PointerEvent::Down { x: 100.0, y: 100.0 });
        // Wiggle within the dead zone
        adapter.handle(PointerEvent::Move { x: 110.0, y: 105.0 });
        let intent = adapter.handle(PointerEvent::Up { x: 108.0, y: 104.0 });

        assert_eq!(intent, Some(Intent::Toggle));
    }

    #[test]
    fn test_drag_left_is_next() {
        let mut adapter = GestureAdapter::for_device(DeviceClass::Pointer);
        assert_eq!(swipe(&mut adapter, 300.0, 150.0), vec![Intent::Next]);
    }

    #[test]
    fn test_vertical_drag_is_toggle() {
        let mut adapter = GestureAdapter::for_device(DeviceClass::Pointer);

        adapter.handle(PointerEvent::Down { x: 100.0, y: 100.0 });
        adapter.handle(PointerEvent::Move { x: 100.0, y: 300.0 });
        let intent = adapter.handle(PointerEvent::Up { x: 105.0, y: 300.0 });

        // A drag with sub-threshold horizontal displacement is not directional
        assert_eq!(intent, Some(Intent::Toggle));
    }
}
