/*
[INPUT]:  Arm/disarm requests and pointer events in surface pixels.
[OUTPUT]: Overlay boxes to draw while dragging and the completed device-space
          region for the armed block.
[POS]:    Interaction layer - drag-selection state machine.
[UPDATE]: When the drag protocol or overlay math changes.
*/

use crate::block::BlockId;
use crate::geometry::{
    DevicePoint, Region, ScreenPoint, SurfaceBounds, to_device_space, to_screen_space,
};

/// Where the selector is in a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectorState {
    Idle,
    Dragging {
        start: ScreenPoint,
        current: ScreenPoint,
    },
}

/// The on-screen box a UI draws during a drag: origin at the min corner,
/// extents non-negative. Dragging up or left of the press point flips the
/// origin rather than producing negative extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionOverlay {
    pub origin: ScreenPoint,
    pub width: f64,
    pub height: f64,
}

/// Outcome of a completed drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSelection {
    pub block_id: BlockId,
    pub region: Region,
}

/// Drag-selection state machine. One tap block is armed at a time, so a drag
/// can never land on two blocks. Pointer events that arrive outside the
/// expected state are ignored, not errors: the surface delivers moves and
/// releases whether or not a drag is underway.
#[derive(Debug)]
pub struct RegionSelector {
    state: SelectorState,
    armed: Option<BlockId>,
}

impl RegionSelector {
    pub fn new() -> Self {
        Self {
            state: SelectorState::Idle,
            armed: None,
        }
    }

    /// Arm the selector for `block_id`. Re-arming replaces the previous
    /// target and cancels any drag in progress. When the block already has a
    /// region, the returned overlay shows it at its current screen position.
    pub fn arm(
        &mut self,
        block_id: BlockId,
        existing: Option<Region>,
        surface: SurfaceBounds,
    ) -> Option<SelectionOverlay> {
        self.state = SelectorState::Idle;
        self.armed = Some(block_id);
        existing.map(|region| overlay_for_region(region, surface))
    }

    pub fn disarm(&mut self) {
        self.state = SelectorState::Idle;
        self.armed = None;
    }

    pub fn armed(&self) -> Option<BlockId> {
        self.armed
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }

    /// Start a drag at `point`. Ignored unless a block is armed.
    pub fn begin(&mut self, point: ScreenPoint) -> Option<SelectionOverlay> {
        self.armed?;
        self.state = SelectorState::Dragging {
            start: point,
            current: point,
        };
        Some(overlay_between(point, point))
    }

    /// Move the drag corner. Ignored unless a drag is underway.
    pub fn update(&mut self, point: ScreenPoint) -> Option<SelectionOverlay> {
        match &mut self.state {
            SelectorState::Dragging { start, current } => {
                *current = point;
                Some(overlay_between(*start, point))
            }
            SelectorState::Idle => None,
        }
    }

    /// Complete the drag: the overlay box corners, converted to device
    /// space, become the armed block's region. Degenerate boxes are yielded
    /// too, so a plain click pins a tap to an exact point. The block stays
    /// armed for a follow-up drag.
    pub fn end(&mut self, surface: SurfaceBounds) -> Option<RegionSelection> {
        let SelectorState::Dragging { start, current } = self.state else {
            return None;
        };
        self.state = SelectorState::Idle;
        let block_id = self.armed?;

        let overlay = overlay_between(start, current);
        let near = to_device_space(overlay.origin, surface);
        let far = to_device_space(
            ScreenPoint::new(
                overlay.origin.x + overlay.width,
                overlay.origin.y + overlay.height,
            ),
            surface,
        );
        Some(RegionSelection {
            block_id,
            region: Region::new(near.x, near.y, far.x, far.y),
        })
    }
}

impl Default for RegionSelector {
    fn default() -> Self {
        Self::new()
    }
}

fn overlay_between(a: ScreenPoint, b: ScreenPoint) -> SelectionOverlay {
    SelectionOverlay {
        origin: ScreenPoint::new(a.x.min(b.x), a.y.min(b.y)),
        width: (b.x - a.x).abs(),
        height: (b.y - a.y).abs(),
    }
}

/// Project an existing device-space region back onto the surface.
pub fn overlay_for_region(region: Region, surface: SurfaceBounds) -> SelectionOverlay {
    let origin = to_screen_space(DevicePoint::new(region.min_x(), region.min_y()), surface);
    let far = to_screen_space(DevicePoint::new(region.max_x(), region.max_y()), surface);
    SelectionOverlay {
        origin,
        width: far.x - origin.x,
        height: far.y - origin.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn surface() -> SurfaceBounds {
        SurfaceBounds::new(300.0, 600.0).expect("valid surface")
    }

    #[test]
    fn selector_full_drag_assigns_device_region() {
        let mut selector = RegionSelector::new();
        let block = BlockId::new();

        assert!(selector.arm(block, None, surface()).is_none());
        assert!(selector.begin(ScreenPoint::new(50.0, 50.0)).is_some());
        assert!(selector.update(ScreenPoint::new(10.0, 10.0)).is_some());

        let selection = selector.end(surface()).expect("completed drag");
        assert_eq!(selection.block_id, block);
        assert!((selection.region.x1 - 32.0 / 3.0).abs() < EPS);
        assert!((selection.region.y1 - 12.0).abs() < EPS);
        assert!((selection.region.x2 - 160.0 / 3.0).abs() < EPS);
        assert!((selection.region.y2 - 60.0).abs() < EPS);
    }

    #[test]
    fn selector_overlay_flips_origin_when_dragging_up_left() {
        let mut selector = RegionSelector::new();
        selector.arm(BlockId::new(), None, surface());

        let initial = selector.begin(ScreenPoint::new(50.0, 50.0)).expect("drag started");
        assert_eq!(initial.origin, ScreenPoint::new(50.0, 50.0));
        assert_eq!(initial.width, 0.0);
        assert_eq!(initial.height, 0.0);

        let overlay = selector.update(ScreenPoint::new(10.0, 30.0)).expect("dragging");
        assert_eq!(overlay.origin, ScreenPoint::new(10.0, 30.0));
        assert_eq!(overlay.width, 40.0);
        assert_eq!(overlay.height, 20.0);
    }

    #[test]
    fn selector_click_yields_degenerate_region() {
        let mut selector = RegionSelector::new();
        let block = BlockId::new();
        selector.arm(block, None, surface());
        selector.begin(ScreenPoint::new(30.0, 40.0));

        let selection = selector.end(surface()).expect("click completes");
        assert!(selection.region.is_degenerate());
        assert!((selection.region.x1 - 32.0).abs() < EPS);
        assert!((selection.region.y1 - 48.0).abs() < EPS);
        assert_eq!(selection.region.x1, selection.region.x2);
        assert_eq!(selection.region.y1, selection.region.y2);
    }

    #[test]
    fn selector_ignores_pointer_noise() {
        let mut selector = RegionSelector::new();

        // Nothing armed: a press is not a drag.
        assert!(selector.begin(ScreenPoint::new(5.0, 5.0)).is_none());
        assert_eq!(selector.state(), SelectorState::Idle);

        // Armed but idle: moves and releases pass through.
        selector.arm(BlockId::new(), None, surface());
        assert!(selector.update(ScreenPoint::new(5.0, 5.0)).is_none());
        assert!(selector.end(surface()).is_none());
    }

    #[test]
    fn selector_rearm_cancels_drag_in_progress() {
        let mut selector = RegionSelector::new();
        let first = BlockId::new();
        let second = BlockId::new();

        selector.arm(first, None, surface());
        selector.begin(ScreenPoint::new(10.0, 10.0));
        selector.arm(second, None, surface());

        assert_eq!(selector.state(), SelectorState::Idle);
        assert!(selector.end(surface()).is_none());

        selector.begin(ScreenPoint::new(20.0, 20.0));
        let selection = selector.end(surface()).expect("drag for new target");
        assert_eq!(selection.block_id, second);
    }

    #[test]
    fn selector_block_stays_armed_after_drag() {
        let mut selector = RegionSelector::new();
        let block = BlockId::new();
        selector.arm(block, None, surface());

        selector.begin(ScreenPoint::new(10.0, 10.0));
        selector.end(surface());
        assert_eq!(selector.armed(), Some(block));
        assert!(selector.begin(ScreenPoint::new(15.0, 15.0)).is_some());
    }

    #[test]
    fn selector_disarm_clears_everything() {
        let mut selector = RegionSelector::new();
        selector.arm(BlockId::new(), None, surface());
        selector.begin(ScreenPoint::new(10.0, 10.0));

        selector.disarm();
        assert_eq!(selector.state(), SelectorState::Idle);
        assert_eq!(selector.armed(), None);
        assert!(selector.update(ScreenPoint::new(20.0, 20.0)).is_none());
    }

    #[test]
    fn selector_arm_projects_existing_region() {
        let mut selector = RegionSelector::new();
        let bounds = SurfaceBounds::new(160.0, 360.0).expect("valid surface");
        let existing = Region::new(64.0, 144.0, 32.0, 72.0);

        let overlay = selector
            .arm(BlockId::new(), Some(existing), bounds)
            .expect("existing region projected");
        assert!((overlay.origin.x - 16.0).abs() < EPS);
        assert!((overlay.origin.y - 36.0).abs() < EPS);
        assert!((overlay.width - 16.0).abs() < EPS);
        assert!((overlay.height - 36.0).abs() < EPS);
    }
}
