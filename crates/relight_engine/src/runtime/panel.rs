//! Live color sources for panel arrays

use crate::foundation::color::LinearColor;
use thiserror::Error;

/// Live per-cell colors of one panel array
///
/// The cell count must stay fixed once the collector has sized its vector.
/// Colors must be linear.
pub trait PanelColorSampler {
    /// Current cell colors, row-major
    fn colors(&self) -> &[LinearColor];
}

/// Errors feeding a panel grid
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PanelError {
    /// Pixel buffer does not match the stated image size
    #[error("expected {expected} pixels, got {actual}")]
    ImageSizeMismatch {
        /// `width * height`
        expected: usize,
        /// Buffer length
        actual: usize,
    },
}

/// Panel sampler that box-filters a linear image down to a fixed grid
#[derive(Debug, Clone, PartialEq)]
pub struct PanelColorGrid {
    columns: usize,
    rows: usize,
    colors: Vec<LinearColor>,
}

impl PanelColorGrid {
    /// Black grid of `columns * rows` cells
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            colors: vec![LinearColor::BLACK; columns * rows],
        }
    }

    /// Grid width in cells
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Grid height in cells
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Set one cell directly
    pub fn set_cell(&mut self, index: usize, color: LinearColor) {
        if let Some(cell) = self.colors.get_mut(index) {
            *cell = color;
        }
    }

    /// Average a row-major, top-down image into the grid
    ///
    /// Every cell averages at least one pixel, so images smaller than the
    /// grid still fill every cell.
    pub fn update_from_image(&mut self, width: usize, height: usize, pixels: &[LinearColor]) -> Result<(), PanelError> {
        if pixels.len() != width * height {
            return Err(PanelError::ImageSizeMismatch { expected: width * height, actual: pixels.len() });
        }
        if width == 0 || height == 0 {
            self.colors.fill(LinearColor::BLACK);
            return Ok(());
        }

        for row in 0..self.rows {
            let (y0, y1) = cell_span(row, self.rows, height);
            for column in 0..self.columns {
                let (x0, x1) = cell_span(column, self.columns, width);

                let mut sum = [0.0f32; 4];
                for y in y0..y1 {
                    for pixel in &pixels[y * width + x0..y * width + x1] {
                        for (acc, channel) in sum.iter_mut().zip(pixel.to_array()) {
                            *acc += channel;
                        }
                    }
                }
                #[allow(clippy::cast_precision_loss)]
                let count = ((y1 - y0) * (x1 - x0)) as f32;
                self.colors[row * self.columns + column] =
                    LinearColor::rgba(sum[0] / count, sum[1] / count, sum[2] / count, sum[3] / count);
            }
        }
        Ok(())
    }
}

/// Pixel span `[start, end)` covered by cell `index` of `cells` over `extent`
fn cell_span(index: usize, cells: usize, extent: usize) -> (usize, usize) {
    let start = (index * extent / cells).min(extent - 1);
    let end = ((index + 1) * extent / cells).clamp(start + 1, extent);
    (start, end)
}

impl PanelColorSampler for PanelColorGrid {
    fn colors(&self) -> &[LinearColor] {
        &self.colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_box_filter_averages_quadrants() {
        let mut grid = PanelColorGrid::new(2, 1);
        let red = LinearColor::rgb(1.0, 0.0, 0.0);
        let blue = LinearColor::rgb(0.0, 0.0, 1.0);
        // 4x2 image: left half red, right half one blue and one black per row
        let pixels = [red, red, blue, LinearColor::BLACK, red, red, LinearColor::BLACK, blue];

        grid.update_from_image(4, 2, &pixels).unwrap();
        assert_relative_eq!(grid.colors()[0], red);
        assert_relative_eq!(grid.colors()[1], LinearColor::rgb(0.0, 0.0, 0.5));
    }

    #[test]
    fn test_image_smaller_than_grid() {
        let mut grid = PanelColorGrid::new(3, 3);
        let white = LinearColor::WHITE;
        grid.update_from_image(1, 1, &[white]).unwrap();
        assert!(grid.colors().iter().all(|&c| c == white));
    }

    #[test]
    fn test_size_mismatch() {
        let mut grid = PanelColorGrid::new(2, 2);
        assert_eq!(
            grid.update_from_image(2, 2, &[LinearColor::WHITE]),
            Err(PanelError::ImageSizeMismatch { expected: 4, actual: 1 })
        );
    }
}
