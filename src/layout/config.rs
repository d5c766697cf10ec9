//! Configuration for the grid layout engine

/// Padding added around the image grid to form the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasPadding {
    pub top: i64,
    pub bottom: i64,
    pub left: i64,
    pub right: i64,
}

impl CanvasPadding {
    pub fn new(top: i64, bottom: i64, left: i64, right: i64) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }
}

/// Configuration options for grid layout computation
#[derive(Debug, Clone)]
pub struct GridLayoutConfig {
    /// Spacing between neighbouring images, horizontally and vertically
    pub margin: i64,

    /// Extra vertical room below each image row for its seed label
    pub vertical_seed_margin: i64,

    /// Canvas padding in normal mode
    pub canvas_padding: CanvasPadding,

    /// Canvas padding in verbose mode (larger bottom for the extended data panel)
    pub verbose_canvas_padding: CanvasPadding,

    /// Horizontal inset of every text block from the canvas edges
    pub text_padding_left: i64,

    /// Vertical offset of the top title from the canvas top
    pub top_title_padding_top: i64,

    /// Distance from the canvas bottom to the generation data block
    pub generation_data_from_bottom: i64,

    /// Same, in verbose mode
    pub verbose_generation_data_from_bottom: i64,

    /// Distance from the canvas bottom to the bottom info bar
    pub bottom_infobar_from_bottom: i64,

    /// Distance between a text block and the label row above it
    pub label_row_offset: i64,

    /// Offset of a seed label from the bottom-left corner of its image
    pub seed_label_nudge: i64,

    /// Height reserved for a seed label
    pub label_height: i64,
}

impl Default for GridLayoutConfig {
    fn default() -> Self {
        Self {
            margin: 50,
            vertical_seed_margin: 50,
            canvas_padding: CanvasPadding::new(400, 500, 50, 50),
            verbose_canvas_padding: CanvasPadding::new(400, 750, 50, 50),
            text_padding_left: 100,
            top_title_padding_top: 90,
            generation_data_from_bottom: 250,
            verbose_generation_data_from_bottom: 500,
            bottom_infobar_from_bottom: 200,
            label_row_offset: 74,
            seed_label_nudge: 13,
            label_height: 50,
        }
    }
}

impl GridLayoutConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the margin between images
    pub fn with_margin(mut self, margin: i64) -> Self {
        self.margin = margin;
        self
    }

    /// Set the vertical room reserved for seed labels
    pub fn with_vertical_seed_margin(mut self, margin: i64) -> Self {
        self.vertical_seed_margin = margin;
        self
    }

    /// Set the canvas padding used in normal mode
    pub fn with_canvas_padding(mut self, padding: CanvasPadding) -> Self {
        self.canvas_padding = padding;
        self
    }

    /// Set the canvas padding used in verbose mode
    pub fn with_verbose_canvas_padding(mut self, padding: CanvasPadding) -> Self {
        self.verbose_canvas_padding = padding;
        self
    }

    /// Padding for the given mode
    pub fn padding(&self, verbose: bool) -> CanvasPadding {
        if verbose {
            self.verbose_canvas_padding
        } else {
            self.canvas_padding
        }
    }

    /// Generation data distance from the canvas bottom for the given mode
    pub fn generation_data_offset(&self, verbose: bool) -> i64 {
        if verbose {
            self.verbose_generation_data_from_bottom
        } else {
            self.generation_data_from_bottom
        }
    }
}
