use std::path::PathBuf;

use flipbook_core::prelude::*;
use image::{Rgba, RgbaImage};

/// Records every call in order; pages are plain vectors of (frame, slot).
#[derive(Default)]
struct Recorder {
    log: Vec<String>,
    fail_on_page: Option<usize>,
}

impl RasterBackend for Recorder {
    type Content = usize;
    type Page = Vec<(usize, PageSlot)>;

    fn copy_frame_content(&mut self, frame_index: usize) -> Result<usize> {
        self.log.push(format!("copy {frame_index}"));
        Ok(frame_index)
    }

    fn create_page_canvas(&mut self, width: u32, height: u32) -> Result<Self::Page> {
        self.log.push(format!("canvas {width}x{height}"));
        Ok(Vec::new())
    }

    fn place_content(
        &mut self,
        page: &mut Self::Page,
        content: &usize,
        slot: PageSlot,
        cell: CellSize,
    ) -> Result<()> {
        let (x, y) = slot.origin(cell.width, cell.height);
        self.log.push(format!("place {content} at {x},{y}"));
        page.push((*content, slot));
        Ok(())
    }

    fn page_path(&self, target: &OutputTarget, page_number: usize) -> PathBuf {
        target
            .output_dir
            .join(format!("{}-fbook{}.jpg", target.base_name, page_number))
    }

    fn flush_page(
        &mut self,
        page: Self::Page,
        target: &OutputTarget,
        page_number: usize,
    ) -> Result<PathBuf> {
        if self.fail_on_page == Some(page_number) {
            return Err(FlipbookError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )));
        }
        self.log.push(format!("flush {page_number} ({} frames)", page.len()));
        Ok(self.page_path(target, page_number))
    }
}

#[test]
fn backend_sees_fresh_canvas_per_page_and_flushes_in_order() {
    let mut rec = Recorder::default();
    let grid = GridGeometry::new(2, 2).unwrap();
    let cell = CellSize {
        width: 10,
        height: 5,
    };
    let target = OutputTarget::new("/tmp/fb", "anim");
    let files = generate_pages(&mut rec, 5, grid, cell, &target).expect("generate");

    assert_eq!(
        files,
        vec![
            PathBuf::from("/tmp/fb/anim-fbook0.jpg"),
            PathBuf::from("/tmp/fb/anim-fbook1.jpg"),
        ]
    );
    assert_eq!(
        rec.log,
        vec![
            "canvas 20x10",
            "copy 0",
            "place 0 at 0,0",
            "copy 1",
            "place 1 at 10,0",
            "copy 2",
            "place 2 at 0,5",
            "copy 3",
            "place 3 at 10,5",
            "flush 0 (4 frames)",
            "canvas 20x10",
            "copy 4",
            "place 4 at 0,0",
            "flush 1 (1 frames)",
        ]
    );
}

#[test]
fn no_frames_means_no_calls() {
    let mut rec = Recorder::default();
    let grid = GridGeometry::new(3, 2).unwrap();
    let cell = CellSize {
        width: 1,
        height: 1,
    };
    let files = generate_pages(&mut rec, 0, grid, cell, &OutputTarget::new(".", "x")).unwrap();
    assert!(files.is_empty());
    assert!(rec.log.is_empty());
}

#[test]
fn flush_failure_reports_page_number_and_stops() {
    let mut rec = Recorder {
        fail_on_page: Some(1),
        ..Default::default()
    };
    let grid = GridGeometry::new(1, 2).unwrap();
    let cell = CellSize {
        width: 1,
        height: 1,
    };
    let target = OutputTarget::new("out", "x");
    let err = generate_pages(&mut rec, 6, grid, cell, &target).unwrap_err();
    assert_eq!(err.page(), Some(1));
    match &err {
        FlipbookError::Export { page: 1, path, .. } => {
            assert_eq!(path, &PathBuf::from("out/x-fbook1.jpg"));
        }
        other => panic!("expected export error, got {other:?}"),
    }
    assert!(err.to_string().contains("x-fbook1.jpg"));
    // page 0 went out, nothing after the failing page was started
    assert!(rec.log.iter().any(|l| l == "flush 0 (2 frames)"));
    assert!(!rec.log.iter().any(|l| l == "copy 4"));
}

#[test]
fn oversized_page_canvas_is_a_configuration_error() {
    let mut rec = Recorder::default();
    let grid = GridGeometry::new(1, 5_000_000).unwrap();
    let cell = CellSize {
        width: 900,
        height: 400,
    };
    let err = generate_pages(&mut rec, 1, grid, cell, &OutputTarget::new(".", "x")).unwrap_err();
    assert!(matches!(err, FlipbookError::Configuration(_)));
    assert!(rec.log.is_empty());
}

#[test]
fn image_backend_writes_pages_and_keeps_earlier_ones_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = FlipbookConfig::builder()
        .grid(1, 1)
        .output_format(OutputFormat::Png)
        .build();
    let frames: Vec<RgbaImage> = (0..3)
        .map(|i| RgbaImage::from_pixel(8, 6, Rgba([i * 80, 0, 0, 255])))
        .collect();

    // first run succeeds
    let out = generate_flipbook(&frames, &cfg, &OutputTarget::new(dir.path(), "run"), false)
        .expect("generate");
    assert_eq!(out.files.len(), 3);
    for (i, f) in out.files.iter().enumerate() {
        assert_eq!(f.file_name().unwrap().to_str().unwrap(), format!("run-fbook{i}.png"));
        assert!(f.exists());
    }

    // make page 1's path a directory so that writing it fails
    std::fs::create_dir(dir.path().join("blocked-fbook1.png")).unwrap();
    let err = generate_flipbook(&frames, &cfg, &OutputTarget::new(dir.path(), "blocked"), false)
        .unwrap_err();
    assert_eq!(err.page(), Some(1));
    assert!(dir.path().join("blocked-fbook0.png").is_file());
    assert!(!dir.path().join("blocked-fbook2.png").exists());
}

#[test]
fn generated_page_has_grid_and_print_margin_size() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = FlipbookConfig::builder()
        .grid(3, 2)
        .output_format(OutputFormat::Png)
        .build();
    let frames: Vec<RgbaImage> = (0..7)
        .map(|_| RgbaImage::from_pixel(100, 50, Rgba([0, 0, 255, 255])))
        .collect();
    let out = generate_flipbook(&frames, &cfg, &OutputTarget::new(dir.path(), "g"), false)
        .expect("generate");
    assert_eq!(out.plan.flush_count(), 2);
    assert_eq!(out.files.len(), 2);

    let page = image::open(&out.files[1]).unwrap().to_rgba8();
    // 2 cols * 100 = 200 -> 204; 3 rows * 50 = 150 -> 153
    assert_eq!(page.dimensions(), (204, 153));
    let (ox, oy) = (2, 1);
    // frame 6 sits in slot (0,0), the rest of the page is background
    assert_eq!(*page.get_pixel(ox + 5, oy + 5), Rgba([0, 0, 255, 255]));
    assert_eq!(*page.get_pixel(ox + 150, oy + 25), Rgba(cfg.page_background));
    assert_eq!(*page.get_pixel(0, 0), Rgba(cfg.page_background));
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = FlipbookConfig::default();
    let frames = vec![RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255])); 2];
    let out = generate_flipbook(&frames, &cfg, &OutputTarget::new(dir.path(), "d"), true)
        .expect("generate");
    assert_eq!(out.files.len(), 1);
    assert!(!out.files[0].exists());
}
