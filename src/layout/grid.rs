//! Grid layout for an upload batch
//!
//! Images are arranged row-major (left to right, then top to bottom) in a
//! grid with a deterministic column count. Each row reserves extra vertical
//! room for the seed label under every image. The grid is then wrapped in a
//! padded canvas that leaves room for the title above and the generation
//! data panel below.
//!
//! ```text
//! +------------------ canvas ------------------+
//! |  title                                     |
//! |  +-----+  +-----+  +-----+  +-----+        |
//! |  | img |  | img |  | img |  | img |        |
//! |  +-----+  +-----+  +-----+  +-----+        |
//! |   seed     seed     seed     seed          |
//! |  +-----+                                   |
//! |  | img |                                   |
//! |  +-----+                                   |
//! |   seed                                     |
//! |  generation data                           |
//! |  info bar                                  |
//! +--------------------------------------------+
//! ```

use super::config::{CanvasPadding, GridLayoutConfig};
use super::error::LayoutError;
use super::types::{BoundingBox, ImageSize, Point, TextLocation};
use super::truncate;

/// Images at least this wide get a narrower minimum grid
const WIDE_IMAGE_THRESHOLD: u32 = 768;

/// Maximum length of the canvas name shown by the destination workspace
pub const CANVAS_TITLE_MAX_LEN: usize = 100;

/// Maximum length of the title text block inside the canvas
pub const TOP_TITLE_MAX_LEN: usize = 145;

/// Minimum number of columns for images of the given width
pub fn min_columns_for(image_width: u32) -> usize {
    if image_width >= WIDE_IMAGE_THRESHOLD {
        3
    } else {
        4
    }
}

/// Number of grid columns for a batch: `max(min_columns, floor(sqrt(count)))`
pub fn column_count(image_count: usize, image_size: ImageSize) -> usize {
    min_columns_for(image_size.width).max(integer_sqrt(image_count))
}

fn integer_sqrt(n: usize) -> usize {
    let mut root = (n as f64).sqrt() as usize;
    // Correct for floating point rounding on large inputs
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}

/// Computed layout of one upload batch
#[derive(Debug, Clone)]
pub struct GridLayout {
    config: GridLayoutConfig,
    verbose: bool,
    image_size: ImageSize,
    columns: usize,
    rows: usize,
    grid_width: i64,
    grid_height: i64,
    /// Top-left corner of every image, row-major
    positions: Vec<Point>,
    canvas_bounds: BoundingBox,
}

impl GridLayout {
    /// Lay out `image_count` images with the default configuration
    pub fn new(
        image_count: usize,
        image_size: ImageSize,
        verbose: bool,
    ) -> Result<Self, LayoutError> {
        Self::with_config(image_count, image_size, verbose, &GridLayoutConfig::default())
    }

    /// Lay out `image_count` images with a custom configuration
    ///
    /// The canvas is anchored at the origin and the grid is inset by the
    /// left/top canvas padding.
    pub fn with_config(
        image_count: usize,
        image_size: ImageSize,
        verbose: bool,
        config: &GridLayoutConfig,
    ) -> Result<Self, LayoutError> {
        if image_count == 0 {
            return Err(LayoutError::EmptyBatch);
        }
        if image_size.width == 0 || image_size.height == 0 {
            return Err(LayoutError::invalid_size(image_size.width, image_size.height));
        }

        let columns = column_count(image_count, image_size);
        let rows = image_count.div_ceil(columns);

        let width = image_size.width_i64();
        let height = image_size.height_i64();
        let margin = config.margin;
        let seed_margin = config.vertical_seed_margin;
        let cols = columns as i64;
        let rows_i = rows as i64;

        let grid_width = cols * width + (cols - 1) * margin;
        let grid_height = rows_i * height + (rows_i - 1) * margin + rows_i * seed_margin;

        let positions = (0..image_count)
            .map(|i| {
                let col = (i % columns) as i64;
                let row = (i / columns) as i64;
                Point::new(
                    col * (width + margin),
                    row * (height + margin + seed_margin),
                )
            })
            .collect();

        let padding = config.padding(verbose);
        let canvas_bounds = BoundingBox::at_origin(grid_width, grid_height)
            .padded(padding.top, padding.bottom, padding.left, padding.right)
            .moved_to(0, 0);

        let mut layout = Self {
            config: config.clone(),
            verbose,
            image_size,
            columns,
            rows,
            grid_width,
            grid_height,
            positions,
            canvas_bounds,
        };
        layout.move_grid_to(padding.left, padding.top);
        Ok(layout)
    }

    /// Move the canvas origin to the target's origin, carrying the grid along
    ///
    /// The target's width and height are ignored. The delta is computed from
    /// the current first image position, so translating twice to the same
    /// target is the same as translating once.
    pub fn translate(&mut self, target: &BoundingBox) {
        self.canvas_bounds = self.canvas_bounds.moved_to(target.x, target.y);
        let padding = self.padding();
        self.move_grid_to(target.x + padding.left, target.y + padding.top);
    }

    fn move_grid_to(&mut self, x: i64, y: i64) {
        let Some(first) = self.positions.first().copied() else {
            return;
        };
        let dx = x - first.x;
        let dy = y - first.y;
        for position in &mut self.positions {
            *position = position.translated(dx, dy);
        }
    }

    fn padding(&self) -> CanvasPadding {
        self.config.padding(self.verbose)
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn image_count(&self) -> usize {
        self.positions.len()
    }

    pub fn image_size(&self) -> ImageSize {
        self.image_size
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Top-left corner of each image, in upload order
    pub fn image_positions(&self) -> &[Point] {
        &self.positions
    }

    /// Full bounds of each image, in upload order
    pub fn image_bounds(&self) -> Vec<BoundingBox> {
        let width = self.image_size.width_i64();
        let height = self.image_size.height_i64();
        self.positions
            .iter()
            .map(|p| BoundingBox::new(p.x, p.y, width, height))
            .collect()
    }

    /// Top-left corner of each image's seed label, directly beneath the image
    pub fn label_positions(&self) -> Vec<Point> {
        let nudge = self.config.seed_label_nudge;
        let dy = self.image_size.height_i64() + nudge;
        self.positions
            .iter()
            .map(|p| p.translated(nudge, dy))
            .collect()
    }

    /// Bounds of each seed label, as wide as the image
    pub fn label_bounds(&self) -> Vec<BoundingBox> {
        let width = self.image_size.width_i64();
        let height = self.config.label_height;
        self.label_positions()
            .into_iter()
            .map(|p| BoundingBox::new(p.x, p.y, width, height))
            .collect()
    }

    /// Bounds of the image grid itself, labels included
    pub fn grid_bounds(&self) -> BoundingBox {
        let origin = self.positions.first().copied().unwrap_or_default();
        BoundingBox::new(origin.x, origin.y, self.grid_width, self.grid_height)
    }

    /// Bounds of the whole canvas, padding included
    pub fn canvas_bounds(&self) -> BoundingBox {
        self.canvas_bounds
    }

    fn text_row(&self, y: i64) -> TextLocation {
        let inset = self.config.text_padding_left;
        TextLocation::new(
            self.canvas_bounds.x + inset,
            y,
            self.canvas_bounds.width - inset * 2,
        )
    }

    pub fn top_title_location(&self) -> TextLocation {
        self.text_row(self.canvas_bounds.y + self.config.top_title_padding_top)
    }

    pub fn bottom_infobar_location(&self) -> TextLocation {
        self.text_row(self.canvas_bounds.bottom() - self.config.bottom_infobar_from_bottom)
    }

    pub fn generation_data_location(&self) -> TextLocation {
        let offset = self.config.generation_data_offset(self.verbose);
        self.text_row(self.canvas_bounds.bottom() - offset)
    }

    pub fn generation_data_label_location(&self) -> TextLocation {
        let data = self.generation_data_location();
        self.text_row(data.y - self.config.label_row_offset)
    }

    pub fn extended_data_label_location(&self) -> TextLocation {
        let infobar = self.bottom_infobar_location();
        self.text_row(infobar.y - self.config.label_row_offset)
    }

    /// Canvas name, shortened to what the workspace displays
    pub fn canvas_title(&self, text: &str) -> String {
        truncate(text, CANVAS_TITLE_MAX_LEN)
    }

    /// Title text shown inside the canvas
    pub fn top_title(&self, text: &str) -> String {
        truncate(text, TOP_TITLE_MAX_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn square(side: u32) -> ImageSize {
        ImageSize::new(side, side)
    }

    #[test]
    fn test_min_columns() {
        assert_eq!(min_columns_for(512), 4);
        assert_eq!(min_columns_for(767), 4);
        assert_eq!(min_columns_for(768), 3);
        assert_eq!(min_columns_for(1000), 3);
    }

    #[test]
    fn test_column_count_examples() {
        assert_eq!(column_count(9, square(512)), 4);
        assert_eq!(column_count(16, square(1000)), 4);
        assert_eq!(column_count(1, square(1000)), 3);
        assert_eq!(column_count(25, square(512)), 5);
        assert_eq!(column_count(48, square(512)), 6);
    }

    #[test]
    fn test_column_count_property() {
        for count in 1..=400usize {
            for side in [64u32, 512, 767, 768, 1024] {
                let min = if side >= 768 { 3 } else { 4 };
                let root = (1..=count).take_while(|r| r * r <= count).last().unwrap();
                assert_eq!(column_count(count, square(side)), min.max(root));
            }
        }
    }

    #[test]
    fn test_integer_sqrt() {
        assert_eq!(integer_sqrt(0), 0);
        assert_eq!(integer_sqrt(3), 1);
        assert_eq!(integer_sqrt(4), 2);
        assert_eq!(integer_sqrt(99), 9);
        assert_eq!(integer_sqrt(100), 10);
    }

    #[test]
    fn test_empty_batch_rejected() {
        let err = GridLayout::new(0, square(512), false).unwrap_err();
        assert_eq!(err, LayoutError::EmptyBatch);
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = GridLayout::new(4, ImageSize::new(512, 0), false).unwrap_err();
        assert_eq!(err, LayoutError::invalid_size(512, 0));
    }

    #[test]
    fn test_row_major_order() {
        let layout = GridLayout::new(5, square(512), false).unwrap();
        assert_eq!(layout.columns(), 4);
        assert_eq!(layout.rows(), 2);

        let row_step = 512 + 50 + 50;
        let rows: Vec<i64> = layout
            .image_positions()
            .iter()
            .map(|p| (p.y - 400) / row_step)
            .collect();
        assert_eq!(rows, vec![0, 0, 0, 0, 1]);

        let cols: Vec<i64> = layout
            .image_positions()
            .iter()
            .map(|p| (p.x - 50) / (512 + 50))
            .collect();
        assert_eq!(cols, vec![0, 1, 2, 3, 0]);
    }

    #[test]
    fn test_grid_and_canvas_dimensions() {
        let layout = GridLayout::new(5, square(512), false).unwrap();
        // 4 * 512 + 3 * 50
        assert_eq!(layout.grid_bounds(), BoundingBox::new(50, 400, 2198, 1174));
        assert_eq!(layout.canvas_bounds(), BoundingBox::new(0, 0, 2298, 2074));
    }

    #[test]
    fn test_verbose_padding() {
        let normal = GridLayout::new(5, square(512), false).unwrap();
        let verbose = GridLayout::new(5, square(512), true).unwrap();
        assert_eq!(
            verbose.canvas_bounds().height - normal.canvas_bounds().height,
            250
        );
        assert_eq!(verbose.image_positions(), normal.image_positions());
    }

    #[test]
    fn test_canvas_contains_grid() {
        for count in 1..=30 {
            for verbose in [false, true] {
                let mut layout = GridLayout::new(count, ImageSize::new(640, 960), verbose).unwrap();
                assert!(layout.canvas_bounds().contains(&layout.grid_bounds()));
                layout.translate(&BoundingBox::new(-3000, 7000, 1, 1));
                assert!(layout.canvas_bounds().contains(&layout.grid_bounds()));
                for image in layout.image_bounds() {
                    assert!(layout.grid_bounds().contains(&image));
                }
            }
        }
    }

    #[test]
    fn test_translate_moves_everything() {
        let mut layout = GridLayout::new(5, square(512), false).unwrap();
        let before = layout.image_positions().to_vec();

        layout.translate(&BoundingBox::new(1000, 2000, 10, 10));

        assert_eq!(layout.canvas_bounds(), BoundingBox::new(1000, 2000, 2298, 2074));
        let after = layout.image_positions();
        for (b, a) in before.iter().zip(after) {
            assert_eq!(*a, b.translated(1000, 2000));
        }
    }

    #[test]
    fn test_translate_twice_same_target() {
        let target = BoundingBox::new(4500, -120, 0, 0);
        let mut once = GridLayout::new(7, square(768), true).unwrap();
        once.translate(&target);

        let mut twice = GridLayout::new(7, square(768), true).unwrap();
        twice.translate(&BoundingBox::new(99, 99, 0, 0));
        twice.translate(&target);
        twice.translate(&target);

        assert_eq!(once.image_positions(), twice.image_positions());
        assert_eq!(once.canvas_bounds(), twice.canvas_bounds());
    }

    #[test]
    fn test_label_positions() {
        let layout = GridLayout::new(2, ImageSize::new(512, 768), false).unwrap();
        let labels = layout.label_positions();
        assert_eq!(labels[0], Point::new(50 + 13, 400 + 768 + 13));
        assert_eq!(labels[1], Point::new(50 + 562 + 13, 400 + 768 + 13));
        let bounds = layout.label_bounds();
        assert_eq!(bounds[0].width, 512);
        assert_eq!(bounds[0].height, 50);
    }

    #[test]
    fn test_text_locations() {
        let mut layout = GridLayout::new(5, square(512), false).unwrap();
        layout.translate(&BoundingBox::new(100, 1000, 0, 0));
        // canvas: x=100 y=1000 w=2298 h=2074, bottom=3074
        assert_eq!(layout.top_title_location(), TextLocation::new(200, 1090, 2098));
        assert_eq!(layout.bottom_infobar_location(), TextLocation::new(200, 2874, 2098));
        assert_eq!(layout.generation_data_location(), TextLocation::new(200, 2824, 2098));
        assert_eq!(
            layout.generation_data_label_location(),
            TextLocation::new(200, 2750, 2098)
        );
        assert_eq!(
            layout.extended_data_label_location(),
            TextLocation::new(200, 2800, 2098)
        );
    }

    #[test]
    fn test_text_locations_verbose() {
        let layout = GridLayout::new(5, square(512), true).unwrap();
        // canvas height = 1174 + 400 + 750
        assert_eq!(layout.canvas_bounds().height, 2324);
        assert_eq!(layout.generation_data_location().y, 2324 - 500);
        assert_eq!(layout.generation_data_label_location().y, 2324 - 574);
    }

    #[test]
    fn test_title_truncation() {
        let layout = GridLayout::new(1, square(512), false).unwrap();
        let long = "p".repeat(200);
        assert_eq!(layout.canvas_title(&long).chars().count(), 100);
        assert_eq!(layout.top_title(&long).chars().count(), 145);
        assert_eq!(layout.top_title("short"), "short");
    }
}
