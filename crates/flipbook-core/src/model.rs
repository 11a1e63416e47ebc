use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

/// Grid cell within a print page. `row` counts from the top, `col` from the left.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PageSlot {
    pub row: u32,
    pub col: u32,
}

impl PageSlot {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
    /// Pixel origin of this slot for cells of `cell_w` x `cell_h`.
    pub fn origin(&self, cell_w: u32, cell_h: u32) -> (u32, u32) {
        (self.col * cell_w, self.row * cell_h)
    }
}

/// One frame assigned to one slot of one page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assignment {
    /// Position of the frame in the source sequence (0-based).
    pub frame_index: usize,
    /// Page receiving the frame (0-based, equals flush order).
    pub page_index: usize,
    pub slot: PageSlot,
}

/// A single print page (logical record).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub id: usize,
    pub assignments: Vec<Assignment>,
}

/// Grid geometry and the full ordered list of pages for one frame sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationPlan {
    pub frame_count: usize,
    pub rows: u32,
    pub cols: u32,
    pub pages: Vec<Page>,
}

/// Statistics about how well the frames fill the print pages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlanStats {
    /// Total number of print pages.
    pub num_pages: usize,
    /// Total number of frames placed.
    pub num_frames: usize,
    /// Slots per page (rows * cols).
    pub capacity: usize,
    /// Slots across all pages (num_pages * capacity).
    pub total_slots: usize,
    /// Slots left empty on the last page.
    pub empty_slots: usize,
    /// num_frames / total_slots (0.0 to 1.0).
    pub fill_ratio: f64,
}

impl PaginationPlan {
    /// Slots per page.
    pub fn capacity(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Number of flush events (one per page).
    pub fn flush_count(&self) -> usize {
        self.pages.len()
    }

    /// All assignments in page order, then slot order.
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.pages.iter().flat_map(|p| p.assignments.iter())
    }

    /// Computes fill statistics for this plan.
    pub fn stats(&self) -> PlanStats {
        let num_pages = self.pages.len();
        let capacity = self.capacity();
        let total_slots = num_pages * capacity;
        let fill_ratio = if total_slots > 0 {
            self.frame_count as f64 / total_slots as f64
        } else {
            0.0
        };
        PlanStats {
            num_pages,
            num_frames: self.frame_count,
            capacity,
            total_slots,
            empty_slots: total_slots.saturating_sub(self.frame_count),
            fill_ratio,
        }
    }
}

impl PlanStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Pages: {}, Frames: {}, Slots: {}/{} ({:.2}% filled), Empty: {}",
            self.num_pages,
            self.num_frames,
            self.num_frames,
            self.total_slots,
            self.fill_ratio * 100.0,
            self.empty_slots,
        )
    }
}
