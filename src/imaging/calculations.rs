//! Pure calculation functions for thumbnail dimensions and mosaic layout.
//!
//! All functions here are pure and testable without any I/O or images.

fn round_div(numerator: f64, denominator: f64) -> u32 {
    (numerator / denominator).round() as u32
}

/// Scale `(width, height)` so that the longer side is `max`.
///
/// # Examples
/// ```
/// # use diary_gal::imaging::size_thumbnail;
/// assert_eq!(size_thumbnail(4000, 3000, 300), (300, 225));
/// assert_eq!(size_thumbnail(3000, 4000, 300), (225, 300));
/// ```
pub fn size_thumbnail(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (max, max);
    }
    if width >= height {
        (max, round_div(max as f64 * height as f64, width as f64).max(1))
    } else {
        (round_div(max as f64 * width as f64, height as f64).max(1), max)
    }
}

/// Canvas of a subdirectory mosaic: `max` wide, 4:3.
pub fn subdir_canvas(max: u32) -> (u32, u32) {
    (max, round_div(max as f64 * 480.0, 640.0))
}

/// Grid of a mosaic: column widths, row heights and their offsets.
///
/// Cells are separated by 2 px and inset by 1 px from the canvas border.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MosaicGeometry {
    pub columns: u32,
    pub rows: u32,
    pub widths: Vec<u32>,
    pub heights: Vec<u32>,
    pub offsets_x: Vec<u32>,
    pub offsets_y: Vec<u32>,
}

impl MosaicGeometry {
    /// Number of cells in the grid.
    pub fn capacity(&self) -> usize {
        (self.columns * self.rows) as usize
    }
}

/// Split `size` into `n` cells: `n - 1` equal ones, the last takes the rest.
fn split_side(size: u32, n: u32) -> (Vec<u32>, Vec<u32>) {
    let lengths = if n == 1 {
        vec![size.saturating_sub(2)]
    } else {
        let mut lengths = vec![(size / n).saturating_sub(2); (n - 1) as usize];
        let used: u32 = lengths.iter().sum::<u32>() + 2 * lengths.len() as u32;
        lengths.push(size.saturating_sub(1 + used + 1));
        lengths
    };
    let mut offsets = vec![1];
    for length in &lengths[..lengths.len() - 1] {
        let last = offsets[offsets.len() - 1];
        offsets.push(last + length + 2);
    }
    (lengths, offsets)
}

/// Layout for `count` child thumbnails on a `canvas`.
///
/// One thumbnail fills the canvas; up to 3 stack in two rows; up to 8 use a
/// 2x2 grid; more use 3x3. Extra thumbnails are left out.
pub fn mosaic_geometry(canvas: (u32, u32), count: usize) -> MosaicGeometry {
    let (columns, rows) = match count {
        0 | 1 => (1, 1),
        2..=3 => (1, 2),
        4..=8 => (2, 2),
        _ => (3, 3),
    };
    let (widths, offsets_x) = split_side(canvas.0, columns);
    let (heights, offsets_y) = split_side(canvas.1, rows);
    MosaicGeometry {
        columns,
        rows,
        widths,
        heights,
        offsets_x,
        offsets_y,
    }
}

/// Smallest size with the source's aspect ratio covering `target`.
///
/// Width is tried first; height wins when width alone leaves a gap.
pub fn cover_size(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (w, h) = (source.0.max(1) as f64, source.1.max(1) as f64);
    let (xmax, ymax) = target;
    let scaled_h = round_div(xmax as f64 * h, w);
    if scaled_h < ymax {
        (round_div(ymax as f64 * w, h), ymax)
    } else {
        (xmax, scaled_h)
    }
}

/// Top-left corner of a centered `target` crop inside `size`.
pub fn center_crop_origin(size: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    (
        size.0.saturating_sub(target.0) / 2,
        size.1.saturating_sub(target.1) / 2,
    )
}

/// Second of the video used for its thumbnail: `thumb_delay`, but never past
/// the last full second.
pub fn video_frame_offset(duration: u32, thumb_delay: u32) -> u32 {
    thumb_delay.min(duration.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // size_thumbnail
    // =========================================================================

    #[test]
    fn size_landscape() {
        assert_eq!(size_thumbnail(4000, 3000, 300), (300, 225));
        assert_eq!(size_thumbnail(1920, 1080, 400), (400, 225));
    }

    #[test]
    fn size_portrait() {
        assert_eq!(size_thumbnail(3000, 4000, 300), (225, 300));
    }

    #[test]
    fn size_square() {
        assert_eq!(size_thumbnail(500, 500, 300), (300, 300));
    }

    #[test]
    fn size_rounds_to_nearest() {
        // 300 * 2 / 3 = 200; 300 * 1000 / 1499 = 200.13
        assert_eq!(size_thumbnail(1499, 1000, 300), (300, 200));
        // 400 * 333 / 1000 = 133.2
        assert_eq!(size_thumbnail(1000, 333, 400), (400, 133));
    }

    #[test]
    fn size_degenerate_source() {
        assert_eq!(size_thumbnail(0, 0, 300), (300, 300));
        assert_eq!(size_thumbnail(10000, 1, 300), (300, 1));
    }

    #[test]
    fn subdir_canvas_is_four_thirds() {
        assert_eq!(subdir_canvas(300), (300, 225));
        assert_eq!(subdir_canvas(400), (400, 300));
    }

    // =========================================================================
    // mosaic_geometry
    // =========================================================================

    #[test]
    fn mosaic_grid_by_count() {
        let grid = |n| {
            let g = mosaic_geometry((300, 225), n);
            (g.columns, g.rows)
        };
        assert_eq!(grid(1), (1, 1));
        assert_eq!(grid(2), (1, 2));
        assert_eq!(grid(3), (1, 2));
        assert_eq!(grid(4), (2, 2));
        assert_eq!(grid(8), (2, 2));
        assert_eq!(grid(9), (3, 3));
        assert_eq!(grid(40), (3, 3));
    }

    #[test]
    fn mosaic_single_cell_has_one_pixel_border() {
        let g = mosaic_geometry((300, 225), 1);
        assert_eq!(g.widths, vec![298]);
        assert_eq!(g.heights, vec![223]);
        assert_eq!(g.offsets_x, vec![1]);
        assert_eq!(g.offsets_y, vec![1]);
    }

    #[test]
    fn mosaic_three_by_three() {
        let g = mosaic_geometry((300, 225), 9);
        assert_eq!(g.widths, vec![98, 98, 98]);
        assert_eq!(g.offsets_x, vec![1, 101, 201]);
        assert_eq!(g.heights, vec![73, 73, 73]);
        assert_eq!(g.offsets_y, vec![1, 76, 151]);
    }

    #[test]
    fn mosaic_cells_fill_canvas() {
        for count in [1, 2, 5, 12] {
            let g = mosaic_geometry((301, 227), count);
            let last = g.widths.len() - 1;
            assert_eq!(g.offsets_x[last] + g.widths[last] + 1, 301);
            let last = g.heights.len() - 1;
            assert_eq!(g.offsets_y[last] + g.heights[last] + 1, 227);
        }
    }

    #[test]
    fn mosaic_capacity() {
        assert_eq!(mosaic_geometry((300, 225), 5).capacity(), 4);
        assert_eq!(mosaic_geometry((300, 225), 20).capacity(), 9);
    }

    // =========================================================================
    // cover_size / crop
    // =========================================================================

    #[test]
    fn cover_wide_source_matches_height() {
        // 300x100 into 98x73: 98 wide gives 33 high, too short
        assert_eq!(cover_size((300, 100), (98, 73)), (219, 73));
    }

    #[test]
    fn cover_tall_source_matches_width() {
        assert_eq!(cover_size((225, 300), (98, 73)), (98, 131));
    }

    #[test]
    fn center_crop() {
        assert_eq!(center_crop_origin((219, 73), (98, 73)), (60, 0));
        assert_eq!(center_crop_origin((98, 131), (98, 73)), (0, 29));
    }

    // =========================================================================
    // video_frame_offset
    // =========================================================================

    #[test]
    fn frame_offset_uses_delay() {
        assert_eq!(video_frame_offset(60, 5), 5);
    }

    #[test]
    fn frame_offset_short_video() {
        assert_eq!(video_frame_offset(3, 5), 2);
        assert_eq!(video_frame_offset(1, 5), 0);
        assert_eq!(video_frame_offset(0, 5), 0);
    }
}
