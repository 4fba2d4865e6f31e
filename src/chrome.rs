//! Custom window chrome for a frameless window: drag-to-move, edge resize
//! and the cursor feedback that goes with it.
//!
//! Only South/East growth changes the bounds. North/West edges are detected
//! so the cursor can react, but pressing them does not start a resize.

use bitflags::bitflags;

use crate::geometry::{Point, Size, WindowBounds};

pub const DEFAULT_EDGE_THICKNESS: i32 = 15;

bitflags! {
    /// Window edges a pointer is close to. Corners are two edges at once.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Edges: u8 {
        const NORTH = 0b0001;
        const SOUTH = 0b0010;
        const EAST = 0b0100;
        const WEST = 0b1000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeCursor {
    Default,
    Horizontal,
    Vertical,
    /// North-west / south-east diagonal.
    DiagonalNwSe,
    /// North-east / south-west diagonal.
    DiagonalNeSw,
}

impl Edges {
    pub fn cursor(self) -> ResizeCursor {
        let vertical = self.intersects(Edges::NORTH | Edges::SOUTH);
        let horizontal = self.intersects(Edges::EAST | Edges::WEST);

        match (vertical, horizontal) {
            (false, false) => ResizeCursor::Default,
            (true, false) => ResizeCursor::Vertical,
            (false, true) => ResizeCursor::Horizontal,
            (true, true) => {
                if self.contains(Edges::NORTH | Edges::WEST)
                    || self.contains(Edges::SOUTH | Edges::EAST)
                {
                    ResizeCursor::DiagonalNwSe
                } else {
                    ResizeCursor::DiagonalNeSw
                }
            }
        }
    }

    /// The subset of edges that can actually drive a resize.
    pub fn resizable(self) -> Edges {
        self & (Edges::SOUTH | Edges::EAST)
    }
}

/// Which edges `local` (window coordinates) lies within `thickness` of.
pub fn hit_test_edge(local: Point, window: Size, thickness: i32) -> Edges {
    let mut edges = Edges::empty();

    if local.y <= thickness {
        edges |= Edges::NORTH;
    }
    if local.y >= window.height - thickness {
        edges |= Edges::SOUTH;
    }
    if local.x <= thickness {
        edges |= Edges::WEST;
    }
    if local.x >= window.width - thickness {
        edges |= Edges::EAST;
    }

    edges
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    /// Pointer position minus window origin at press time.
    pub anchor: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSession {
    pub edges: Edges,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Drag(DragSession),
    Resize(ResizeSession),
}

/// What a pointer press turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    Drag,
    Resize(Edges),
    /// Press on a North/West-only edge: cursor feedback, nothing else.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct WindowController {
    /// Bounds last requested from the host.
    bounds: WindowBounds,
    /// Where the host last reported the window. Pointer positions arrive
    /// relative to this origin, which trails `bounds` while a move is pending.
    host_origin: Point,
    min_size: Size,
    edge_thickness: i32,
    gesture: Option<Gesture>,
}

impl WindowController {
    pub fn new(bounds: WindowBounds, min_size: Size, edge_thickness: i32) -> Self {
        let mut controller = WindowController {
            bounds,
            host_origin: bounds.origin(),
            min_size,
            edge_thickness,
            gesture: None,
        };
        controller.set_bounds(bounds);
        controller
    }

    pub fn bounds(&self) -> WindowBounds {
        self.bounds
    }

    pub fn gesture(&self) -> Option<Gesture> {
        self.gesture
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Some(Gesture::Drag(_)))
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self.gesture, Some(Gesture::Resize(_)))
    }

    pub fn host_origin(&self) -> Point {
        self.host_origin
    }

    /// Replaces the bounds wholesale, clamped to the minimum size. The
    /// window is taken to already sit at the new origin.
    pub fn set_bounds(&mut self, bounds: WindowBounds) -> WindowBounds {
        self.bounds = WindowBounds {
            width: bounds.width.max(self.min_size.width),
            height: bounds.height.max(self.min_size.height),
            ..bounds
        };
        self.host_origin = self.bounds.origin();
        self.bounds
    }

    /// Host-reported move. Always tracked for pointer conversion; only
    /// adopted as the requested origin when no gesture is steering it.
    pub fn sync_position(&mut self, origin: Point) {
        self.host_origin = origin;
        if self.gesture.is_none() {
            self.bounds.x = origin.x;
            self.bounds.y = origin.y;
        }
    }

    /// Host-reported resize. Ignored mid-gesture so a lagging echo does not
    /// fight the pointer.
    pub fn sync_size(&mut self, size: Size) {
        if self.gesture.is_none() {
            self.bounds.width = size.width.max(self.min_size.width);
            self.bounds.height = size.height.max(self.min_size.height);
        }
    }

    /// Converts a window-local pointer position using the host's origin.
    pub fn to_screen(&self, local: Point) -> Point {
        self.host_origin + local
    }

    pub fn hit_test(&self, local: Point) -> Edges {
        hit_test_edge(local, self.bounds.size(), self.edge_thickness)
    }

    /// Cursor to show while hovering at `local`. An active resize keeps its
    /// own cursor regardless of where the pointer wandered.
    pub fn hover_cursor(&self, local: Point) -> ResizeCursor {
        match self.gesture {
            Some(Gesture::Resize(session)) => session.edges.cursor(),
            _ => self.hit_test(local).cursor(),
        }
    }

    /// Starts whichever gesture a press at `local` calls for.
    pub fn press(&mut self, local: Point) -> Press {
        let edges = self.hit_test(local);

        if edges.is_empty() {
            self.begin_drag(self.to_screen(local));
            Press::Drag
        } else if self.begin_resize(edges) {
            Press::Resize(edges.resizable())
        } else {
            Press::Ignored
        }
    }

    /// Press that a widget (text input, scrollbar) already consumed. The
    /// edge band still wins so resizing works over those widgets, but the
    /// body never starts a drag.
    pub fn press_edge(&mut self, local: Point) -> Press {
        let edges = self.hit_test(local);
        if self.begin_resize(edges) {
            Press::Resize(edges.resizable())
        } else {
            Press::Ignored
        }
    }

    pub fn begin_drag(&mut self, pointer: Point) {
        let anchor = pointer - self.host_origin;
        tracing::debug!(?anchor, "drag started");
        self.gesture = Some(Gesture::Drag(DragSession { anchor }));
    }

    /// Moves the window so the press offset is preserved. `None` when no
    /// drag is active or nothing moved.
    pub fn continue_drag(&mut self, pointer: Point) -> Option<WindowBounds> {
        let Some(Gesture::Drag(session)) = self.gesture else {
            return None;
        };

        let origin = pointer - session.anchor;
        if origin == self.bounds.origin() {
            return None;
        }

        self.bounds.x = origin.x;
        self.bounds.y = origin.y;
        Some(self.bounds)
    }

    pub fn end_drag(&mut self) {
        if self.is_dragging() {
            tracing::debug!(bounds = ?self.bounds, "drag finished");
            self.gesture = None;
        }
    }

    /// Starts a resize if `edges` contains South or East. Returns whether a
    /// session was opened.
    pub fn begin_resize(&mut self, edges: Edges) -> bool {
        let edges = edges.resizable();
        if edges.is_empty() {
            return false;
        }

        tracing::debug!(?edges, "resize started");
        self.gesture = Some(Gesture::Resize(ResizeSession { edges }));
        true
    }

    /// Grows or shrinks toward the pointer from the fixed top-left origin.
    pub fn continue_resize(&mut self, pointer: Point) -> Option<WindowBounds> {
        let Some(Gesture::Resize(session)) = self.gesture else {
            return None;
        };

        let mut next = self.bounds;
        if session.edges.contains(Edges::EAST) {
            next.width = (pointer.x - self.bounds.x).max(self.min_size.width);
        }
        if session.edges.contains(Edges::SOUTH) {
            next.height = (pointer.y - self.bounds.y).max(self.min_size.height);
        }

        if next == self.bounds {
            return None;
        }

        self.bounds = next;
        Some(self.bounds)
    }

    pub fn end_resize(&mut self) {
        if self.is_resizing() {
            tracing::debug!(bounds = ?self.bounds, "resize finished");
            self.gesture = None;
        }
    }

    /// Pointer moved to `local`; continues whatever gesture is active.
    pub fn pointer_moved(&mut self, local: Point) -> Option<WindowBounds> {
        let screen = self.to_screen(local);
        match self.gesture {
            Some(Gesture::Drag(_)) => self.continue_drag(screen),
            Some(Gesture::Resize(_)) => self.continue_resize(screen),
            None => None,
        }
    }

    pub fn release(&mut self) {
        self.end_drag();
        self.end_resize();
    }
}
