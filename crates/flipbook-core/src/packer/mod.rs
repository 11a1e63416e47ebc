use crate::error::{FlipbookError, Result};
use crate::model::{Assignment, Page, PageSlot, PaginationPlan};

/// Fixed `rows` x `cols` grid of frame slots on a print page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    rows: u32,
    cols: u32,
}

impl GridGeometry {
    /// Fails with `Configuration` when either dimension is zero.
    pub fn new(rows: u32, cols: u32) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(FlipbookError::Configuration(format!(
                "grid capacity must be at least 1 (got {rows} rows x {cols} cols)"
            )));
        }
        Ok(Self { rows, cols })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Frames per page.
    pub fn capacity(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Number of pages needed for `frame_count` frames.
    pub fn page_count(&self, frame_count: usize) -> usize {
        frame_count.div_ceil(self.capacity())
    }

    /// Page and row-major slot of the frame at `frame_index`.
    pub fn assign(&self, frame_index: usize) -> Assignment {
        let capacity = self.capacity();
        let slot = frame_index % capacity;
        let cols = self.cols as usize;
        Assignment {
            frame_index,
            page_index: frame_index / capacity,
            slot: PageSlot::new((slot / cols) as u32, (slot % cols) as u32),
        }
    }
}

/// Step of a packing run, in the order a renderer has to act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackEvent {
    /// A fresh page begins; always followed by at least one `Place`.
    StartPage { page_index: usize },
    /// Put a frame into a slot of the current page.
    Place(Assignment),
    /// The current page is complete (full, or the frames ran out).
    Flush { page_index: usize },
}

/// Lazily walks `frame_count` frames over pages of a fixed grid.
///
/// Emits `StartPage`, then one `Place` per frame on that page, then `Flush`,
/// for each page in order. The last page is flushed even when partially filled.
/// No events at all are produced for zero frames.
#[derive(Debug, Clone)]
pub struct PagePacker {
    grid: GridGeometry,
    frame_count: usize,
    next_frame: usize,
    open_page: Option<usize>,
}

impl PagePacker {
    pub fn new(grid: GridGeometry, frame_count: usize) -> Self {
        Self {
            grid,
            frame_count,
            next_frame: 0,
            open_page: None,
        }
    }

    /// Validates the grid before creating the packer.
    pub fn with_grid(frame_count: usize, rows: u32, cols: u32) -> Result<Self> {
        Ok(Self::new(GridGeometry::new(rows, cols)?, frame_count))
    }

    pub fn grid(&self) -> GridGeometry {
        self.grid
    }
}

impl Iterator for PagePacker {
    type Item = PackEvent;

    fn next(&mut self) -> Option<PackEvent> {
        if self.next_frame >= self.frame_count {
            return self
                .open_page
                .take()
                .map(|page_index| PackEvent::Flush { page_index });
        }
        let assignment = self.grid.assign(self.next_frame);
        match self.open_page {
            None => {
                self.open_page = Some(assignment.page_index);
                Some(PackEvent::StartPage {
                    page_index: assignment.page_index,
                })
            }
            Some(open) if open != assignment.page_index => {
                self.open_page = None;
                Some(PackEvent::Flush { page_index: open })
            }
            Some(_) => {
                self.next_frame += 1;
                Some(PackEvent::Place(assignment))
            }
        }
    }
}

/// Computes the whole pagination plan eagerly.
pub fn plan_pages(frame_count: usize, rows: u32, cols: u32) -> Result<PaginationPlan> {
    let packer = PagePacker::with_grid(frame_count, rows, cols)?;
    let mut pages: Vec<Page> = Vec::with_capacity(packer.grid().page_count(frame_count));
    let mut current: Option<Page> = None;
    for event in packer {
        match event {
            PackEvent::StartPage { page_index } => {
                current = Some(Page {
                    id: page_index,
                    assignments: Vec::new(),
                });
            }
            PackEvent::Place(a) => {
                if let Some(page) = current.as_mut() {
                    page.assignments.push(a);
                }
            }
            PackEvent::Flush { .. } => {
                if let Some(page) = current.take() {
                    pages.push(page);
                }
            }
        }
    }
    Ok(PaginationPlan {
        frame_count,
        rows,
        cols,
        pages,
    })
}
