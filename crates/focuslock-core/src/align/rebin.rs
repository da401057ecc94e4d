use ndarray::{Array2, ArrayView2};
use num_traits::AsPrimitive;

/// Sum `downsample x downsample` blocks of `image` into the top-left quadrant
/// of `out`, subtracting `background` from every source pixel.
///
/// Cells of `out` outside the binned area are zeroed, which realizes the
/// zero padding of the correlation grid.
pub fn rebin_into<T>(image: &ArrayView2<T>, background: f64, downsample: usize, out: &mut Array2<f64>)
where
    T: AsPrimitive<f64>,
{
    out.fill(0.0);
    for ((row, col), &value) in image.indexed_iter() {
        out[[row / downsample, col / downsample]] += value.as_() - background;
    }
}

/// Copy the `height x width` quadrant of `src` into `dst`, reversed along both
/// axes, leaving the rest of `dst` untouched.
pub fn flip_quadrant(src: &Array2<f64>, height: usize, width: usize, dst: &mut Array2<f64>) {
    for row in 0..height {
        let src_row = height - row - 1;
        for col in 0..width {
            dst[[row, col]] = src[[src_row, width - col - 1]];
        }
    }
}
