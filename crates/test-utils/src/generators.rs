//! Test data generators for packed, scientific-looking arrays.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

use cdm_common::Array;

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 100 + row`, so that
/// `grid[row * width + col] == col * 100 + row` identifies every cell.
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.shape(), &[5, 10]);
/// assert_eq!(grid.get_f64(1), Some(100.0)); // col=1, row=0
/// assert_eq!(grid.get_f64(10), Some(1.0));  // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Array {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 100 + row) as i32);
        }
    }
    Array::with_shape(vec![height, width], data).expect("grid storage matches shape")
}

/// Creates temperature-like values in Kelvin, 250K (top-left) to 310K.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f64 / width.max(1) as f64;
            let y_factor = row as f64 / height.max(1) as f64;
            data.push(250.0 + (x_factor * 30.0) + (y_factor * 30.0));
        }
    }
    data
}

/// Packs physical values into signed 16-bit storage: `round((v - offset) / scale)`.
///
/// NaN packs to `fill`.
pub fn pack_i16(values: &[f64], scale: f64, offset: f64, fill: i16) -> Vec<i16> {
    values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                fill
            } else {
                ((v - offset) / scale).round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
            }
        })
        .collect()
}

/// Temperature grid packed into shorts with the given scale and offset.
pub fn create_packed_temperature_grid(
    width: usize,
    height: usize,
    scale: f64,
    offset: f64,
) -> Array {
    let values = create_temperature_grid(width, height);
    let packed = pack_i16(&values, scale, offset, i16::MIN);
    Array::with_shape(vec![height, width], packed).expect("grid storage matches shape")
}

/// Signed bytes whose unsigned reading walks 0..=255 and wraps.
pub fn create_unsigned_byte_ramp(len: usize) -> Array {
    Array::from_vec((0..len).map(|i| (i % 256) as u8 as i8).collect::<Vec<i8>>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_round_trip_within_half_step() {
        let values = create_temperature_grid(8, 4);
        let packed = pack_i16(&values, 0.01, 273.15, -32768);
        for (v, p) in values.iter().zip(&packed) {
            assert!((*p as f64 * 0.01 + 273.15 - v).abs() <= 0.005 + 1e-9);
        }
    }

    #[test]
    fn test_pack_nan_to_fill() {
        assert_eq!(pack_i16(&[f64::NAN], 1.0, 0.0, -999), vec![-999]);
    }

    #[test]
    fn test_byte_ramp_wraps_negative() {
        let ramp = create_unsigned_byte_ramp(200);
        assert_eq!(ramp.get_f64(127), Some(127.0));
        assert_eq!(ramp.get_f64(128), Some(-128.0));
        assert_eq!(ramp.get_f64(199), Some(-57.0));
    }
}
