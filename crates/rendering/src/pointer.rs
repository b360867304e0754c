//! Host-agnostic pointer events and the click-versus-drag tracker.
//!
//! Hosts push [`PointerEvent`]s into an [`InputQueue`]; the engine drains the
//! queue at the start of each frame. Positions are viewport pixels, origin at
//! the top-left.

use std::collections::VecDeque;

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { button: PointerButton, position: Vec2 },
    Moved { position: Vec2 },
    Up { button: PointerButton, position: Vec2 },
    /// The pointer left the viewport.
    Left,
    /// Wheel notches; positive zooms in.
    Wheel { position: Vec2, steps: f32 },
    /// Multiplicative pinch zoom around `position`.
    Pinch { position: Vec2, factor: f32 },
    /// Keyboard pan held for `dt` seconds, `direction` in screen axes.
    Pan { direction: Vec2, dt: f32 },
}

#[derive(Debug, Default)]
pub struct InputQueue {
    events: VecDeque<PointerEvent>,
}

impl InputQueue {
    pub fn push(&mut self, event: PointerEvent) {
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = PointerEvent> + '_ {
        self.events.drain(..)
    }
}

/// What a pointer event means once click/drag disambiguation is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    Hover(Vec2),
    BeginDrag(Vec2),
    DragTo(Vec2),
    EndDrag,
    Click(Vec2),
    SecondaryClick(Vec2),
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Press {
    start: Vec2,
    dragging: bool,
}

/// Tracks the primary button. A press turns into a drag only after the
/// pointer travels more than `threshold` pixels; releasing before that is a click.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerTracker {
    press: Option<Press>,
    threshold: f32,
}

impl PointerTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            press: None,
            threshold: threshold.max(0.0),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.press.is_some_and(|p| p.dragging)
    }

    /// Translate `event` into zero or more actions appended to `out`.
    /// Wheel, pinch and pan events are not pointer actions and produce nothing.
    pub fn handle(&mut self, event: &PointerEvent, out: &mut Vec<PointerAction>) {
        match *event {
            PointerEvent::Down {
                button: PointerButton::Primary,
                position,
            } => {
                if self.is_dragging() {
                    out.push(PointerAction::EndDrag);
                }
                self.press = Some(Press {
                    start: position,
                    dragging: false,
                });
            }
            PointerEvent::Down {
                button: PointerButton::Secondary,
                position,
            } => out.push(PointerAction::SecondaryClick(position)),
            PointerEvent::Moved { position } => {
                out.push(PointerAction::Hover(position));
                if let Some(press) = self.press.as_mut() {
                    if !press.dragging && position.distance(press.start) > self.threshold {
                        press.dragging = true;
                        out.push(PointerAction::BeginDrag(position));
                    } else if press.dragging {
                        out.push(PointerAction::DragTo(position));
                    }
                }
            }
            PointerEvent::Up {
                button: PointerButton::Primary,
                position,
            } => match self.press.take() {
                Some(Press { dragging: true, .. }) => {
                    out.push(PointerAction::DragTo(position));
                    out.push(PointerAction::EndDrag);
                }
                Some(Press {
                    dragging: false, ..
                }) => out.push(PointerAction::Click(position)),
                None => {}
            },
            PointerEvent::Up {
                button: PointerButton::Secondary,
                ..
            } => {}
            PointerEvent::Left => {
                if let Some(Press { dragging: true, .. }) = self.press.take() {
                    out.push(PointerAction::EndDrag);
                }
                out.push(PointerAction::Leave);
            }
            PointerEvent::Wheel { .. } | PointerEvent::Pinch { .. } | PointerEvent::Pan { .. } => {}
        }
    }
}
