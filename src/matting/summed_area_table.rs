/// Summed-area table over a single channel plane
///
/// Stores a `(width + 1) x (height + 1)` table with a zero first row and
/// column so any rectangle sum takes four lookups and no branches.
/// Accumulation happens in `f64` so variance terms of the guided filter
/// survive subtraction of nearly equal sums.
pub struct SummedAreaTable {
    data: Vec<f64>,
    width: u32,
    height: u32,
}

impl SummedAreaTable {
    /// Builds a table from row-major single channel data
    #[must_use]
    pub fn from_data<T>(data: &[T], width: u32, height: u32) -> Self
    where
        T: Copy + Into<f64>,
    {
        let stride = width as usize + 1;
        let mut table = vec![0.0f64; stride * (height as usize + 1)];

        for y in 0..height as usize {
            let mut row_sum = 0.0;
            for x in 0..width as usize {
                row_sum += data[y * width as usize + x].into();
                // sat(x, y) = row prefix + sat(x, y - 1)
                table[(y + 1) * stride + x + 1] = row_sum + table[y * stride + x + 1];
            }
        }

        Self {
            data: table,
            width,
            height,
        }
    }

    /// Sum over the inclusive rectangle `[x1, x2] x [y1, y2]`
    #[inline]
    #[must_use]
    pub fn rectangle_sum(&self, x1: u32, y1: u32, x2: u32, y2: u32) -> f64 {
        let stride = self.width as usize + 1;
        let (x1, y1) = (x1 as usize, y1 as usize);
        let (x2, y2) = (x2 as usize + 1, y2 as usize + 1);
        self.data[y2 * stride + x2] - self.data[y1 * stride + x2] - self.data[y2 * stride + x1]
            + self.data[y1 * stride + x1]
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}
