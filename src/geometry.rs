//! Screen geometry and initial window placement.
//!
//! Everything here is a pure function of the monitor layout so it can be
//! exercised without a display.

use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Size { width, height }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Insets {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

/// Integer pixel rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl WindowBounds {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        WindowBounds { x, y, width, height }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn contains(&self, other: &WindowBounds) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// One monitor as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRegion {
    pub origin: Point,
    pub size: Size,
    pub insets: Insets,
    pub primary: bool,
}

impl ScreenRegion {
    pub fn bounds(&self) -> WindowBounds {
        WindowBounds::new(self.origin.x, self.origin.y, self.size.width, self.size.height)
    }

    /// The area left after removing panels and docks.
    pub fn usable(&self) -> WindowBounds {
        let width = (self.size.width - self.insets.left - self.insets.right).max(0);
        let height = (self.size.height - self.insets.top - self.insets.bottom).max(0);
        WindowBounds::new(
            self.origin.x + self.insets.left,
            self.origin.y + self.insets.top,
            width,
            height,
        )
    }

    pub fn contains_point(&self, point: Point) -> bool {
        self.bounds().contains_point(point)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRules {
    pub width: i32,
    pub margin: i32,
    pub min_size: Size,
}

/// Picks the monitor under the pointer, falling back to the primary one and
/// then to whatever comes first.
pub fn monitor_for_pointer(
    monitors: &[ScreenRegion],
    pointer: Option<Point>,
) -> Option<&ScreenRegion> {
    pointer
        .and_then(|p| monitors.iter().find(|m| m.contains_point(p)))
        .or_else(|| monitors.iter().find(|m| m.primary))
        .or_else(|| monitors.first())
}

/// Bounds hugging the right edge of the monitor's usable area, spanning its
/// height minus `margin` above and below.
///
/// The minimum size is honored as long as the monitor is large enough; the
/// result never leaves the usable area.
pub fn resolve_placement(region: &ScreenRegion, rules: &PlacementRules) -> WindowBounds {
    let usable = region.usable();

    let width = rules
        .width
        .max(rules.min_size.width)
        .min(usable.width);

    let margin = rules.margin.max(0);
    let mut height = usable.height - 2 * margin;
    if height < rules.min_size.height {
        height = rules.min_size.height;
    }
    let height = height.min(usable.height);

    let x = usable.right() - width;
    let y = usable.y + (usable.height - height) / 2;

    let placed = WindowBounds::new(x, y, width, height);
    tracing::debug!(?placed, ?usable, "resolved window placement");
    placed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> PlacementRules {
        PlacementRules {
            width: 400,
            margin: 40,
            min_size: Size::new(300, 200),
        }
    }

    fn monitor(x: i32, y: i32, w: i32, h: i32, primary: bool) -> ScreenRegion {
        ScreenRegion {
            origin: Point::new(x, y),
            size: Size::new(w, h),
            insets: Insets::default(),
            primary,
        }
    }

    #[test]
    fn hugs_right_edge_of_usable_area() {
        let mut region = monitor(0, 0, 1920, 1080, true);
        region.insets.bottom = 40;

        let placed = resolve_placement(&region, &rules());

        assert_eq!(placed, WindowBounds::new(1520, 40, 400, 960));
        assert_eq!(placed.right(), region.usable().right());
        assert!(region.usable().contains(&placed));
    }

    #[test]
    fn placement_stays_inside_every_monitor_shape() {
        let monitors = [
            monitor(0, 0, 1920, 1080, true),
            monitor(1920, -200, 1080, 1920, false),
            monitor(-1280, 0, 1280, 720, false),
            monitor(0, 0, 320, 150, false),
            monitor(100, 100, 0, 0, false),
        ];

        for m in &monitors {
            for insets in [
                Insets::default(),
                Insets { top: 30, right: 10, bottom: 48, left: 64 },
            ] {
                let region = ScreenRegion { insets, ..*m };
                let usable = region.usable();
                let placed = resolve_placement(&region, &rules());
                assert!(usable.contains(&placed), "{placed:?} outside {usable:?}");
                assert_eq!(placed.right(), usable.right());
            }
        }
    }

    #[test]
    fn small_monitor_keeps_minimum_height_when_it_fits() {
        let region = monitor(0, 0, 1024, 250, true);
        let placed = resolve_placement(&region, &rules());
        assert_eq!(placed.height, 200);
        assert_eq!(placed.y, 25);
    }

    #[test]
    fn pointer_monitor_wins_over_primary() {
        let monitors = [monitor(0, 0, 1920, 1080, true), monitor(1920, 0, 2560, 1440, false)];

        let picked = monitor_for_pointer(&monitors, Some(Point::new(2000, 500))).unwrap();
        assert_eq!(picked.origin.x, 1920);

        let fallback = monitor_for_pointer(&monitors, Some(Point::new(-50, -50))).unwrap();
        assert!(fallback.primary);

        let no_pointer = monitor_for_pointer(&monitors, None).unwrap();
        assert!(no_pointer.primary);

        assert!(monitor_for_pointer(&[], None).is_none());
    }
}
