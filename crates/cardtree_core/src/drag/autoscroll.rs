//! Edge autoscroll while dragging.
//!
//! Scrolling is a repeating frame step: fire, check the zone is still active,
//! scroll, request the next frame. It keeps running without pointer movement
//! and stops as soon as the zone is left or the drag ends.
//!
//! # Invariants
//! - At most one frame request is pending at any time.
//! - `stop()` and leaving the zone cancel the pending request.
//! - Frames fired for a cancelled or superseded request do nothing.

use crate::drag::layout::{Point, Rect};
use log::trace;

/// Opaque id of one requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Host animation-frame scheduler (e.g. `requestAnimationFrame`).
pub trait FrameScheduler {
    /// Requests one callback on the next frame.
    fn request_frame(&mut self) -> FrameHandle;
    /// Cancels a pending request.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// An edge band of one column's scroll viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollZone {
    pub column_index: usize,
    pub direction: ScrollDirection,
}

/// Scroll to apply to a column this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollStep {
    pub column_index: usize,
    /// Negative scrolls up.
    pub delta_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScrollSettings {
    /// Height of the trigger band at the top and bottom edges, in px.
    pub edge: f32,
    /// Distance scrolled per frame, in px.
    pub speed: f32,
}

impl Default for AutoScrollSettings {
    fn default() -> Self {
        Self {
            edge: 40.0,
            speed: 12.0,
        }
    }
}

impl AutoScrollSettings {
    /// Edge band of `viewport` that contains `point`, if any.
    pub fn direction_for(&self, viewport: Rect, point: Point) -> Option<ScrollDirection> {
        if !viewport.contains(point) {
            return None;
        }
        if point.y < viewport.top() + self.edge {
            Some(ScrollDirection::Up)
        } else if point.y >= viewport.bottom() - self.edge {
            Some(ScrollDirection::Down)
        } else {
            None
        }
    }
}

/// Drives constant-speed scrolling through a `FrameScheduler`.
#[derive(Debug)]
pub struct AutoScroller<S: FrameScheduler> {
    scheduler: S,
    settings: AutoScrollSettings,
    zone: Option<ScrollZone>,
    pending: Option<FrameHandle>,
}

impl<S: FrameScheduler> AutoScroller<S> {
    pub fn new(scheduler: S, settings: AutoScrollSettings) -> Self {
        Self {
            scheduler,
            settings,
            zone: None,
            pending: None,
        }
    }

    pub fn settings(&self) -> &AutoScrollSettings {
        &self.settings
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn zone(&self) -> Option<ScrollZone> {
        self.zone
    }

    pub fn is_active(&self) -> bool {
        self.pending.is_some()
    }

    /// Enters, switches or leaves a zone.
    pub fn update(&mut self, zone: Option<ScrollZone>) {
        if zone == self.zone {
            return;
        }
        self.zone = zone;
        match zone {
            Some(_) => {
                if self.pending.is_none() {
                    self.pending = Some(self.scheduler.request_frame());
                }
            }
            None => self.cancel_pending(),
        }
    }

    /// Handles a fired frame. Returns the scroll to apply, if still active.
    pub fn on_frame(&mut self, handle: FrameHandle) -> Option<ScrollStep> {
        if self.pending != Some(handle) {
            trace!("event=autoscroll module=drag status=noop reason=stale_frame");
            return None;
        }
        self.pending = None;
        let zone = self.zone?;
        let delta_y = match zone.direction {
            ScrollDirection::Up => -self.settings.speed,
            ScrollDirection::Down => self.settings.speed,
        };
        self.pending = Some(self.scheduler.request_frame());
        Some(ScrollStep {
            column_index: zone.column_index,
            delta_y,
        })
    }

    /// Leaves any zone and cancels the pending frame.
    pub fn stop(&mut self) {
        self.zone = None;
        self.cancel_pending();
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
    }
}
