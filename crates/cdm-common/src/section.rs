//! Hyperslab selections over an n-dimensional array.

use std::fmt;
use std::str::FromStr;

use crate::error::{CdmError, CdmResult};

/// Strided selection along one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub first: usize,
    pub length: usize,
    pub stride: usize,
}

impl Range {
    /// Contiguous range of `length` elements starting at `first`.
    pub fn new(first: usize, length: usize) -> Self {
        Self {
            first,
            length,
            stride: 1,
        }
    }

    pub fn with_stride(first: usize, length: usize, stride: usize) -> Self {
        Self {
            first,
            length,
            stride,
        }
    }

    /// The whole extent of a dimension.
    pub fn full(extent: usize) -> Self {
        Self::new(0, extent)
    }

    /// Last selected index, `None` for an empty range.
    pub fn last(&self) -> Option<usize> {
        if self.length == 0 {
            None
        } else {
            Some(self.first + (self.length - 1) * self.stride)
        }
    }

    /// Index of the `i`-th selected element.
    pub fn element(&self, i: usize) -> usize {
        self.first + i * self.stride
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last() {
            None => write!(f, "{}:empty", self.first),
            Some(last) if self.stride == 1 => write!(f, "{}:{}", self.first, last),
            Some(last) => write!(f, "{}:{}:{}", self.first, last, self.stride),
        }
    }
}

/// A selection with one range per dimension.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Section {
    ranges: Vec<Range>,
}

impl Section {
    pub fn new(ranges: Vec<Range>) -> Self {
        Self { ranges }
    }

    /// Section covering the entire shape.
    pub fn from_shape(shape: &[usize]) -> Self {
        Self::new(shape.iter().map(|&n| Range::full(n)).collect())
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn rank(&self) -> usize {
        self.ranges.len()
    }

    /// Shape of the array this section selects.
    pub fn shape(&self) -> Vec<usize> {
        self.ranges.iter().map(|r| r.length).collect()
    }

    /// Number of selected elements.
    pub fn compute_size(&self) -> usize {
        self.ranges.iter().map(|r| r.length).product()
    }

    /// Check that the section fits inside `shape`.
    pub fn check_in_range(&self, shape: &[usize]) -> CdmResult<()> {
        if self.ranges.len() != shape.len() {
            return Err(CdmError::invalid_range(format!(
                "section rank {} does not match variable rank {}",
                self.ranges.len(),
                shape.len()
            )));
        }
        for (dim, (range, &extent)) in self.ranges.iter().zip(shape).enumerate() {
            if range.stride == 0 {
                return Err(CdmError::invalid_range(format!(
                    "stride must be > 0 in dimension {dim}"
                )));
            }
            if let Some(last) = range.last() {
                if last >= extent {
                    return Err(CdmError::invalid_range(format!(
                        "range {range} exceeds extent {extent} in dimension {dim}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Whether the section selects every element of `shape`.
    pub fn covers(&self, shape: &[usize]) -> bool {
        self.ranges.len() == shape.len() && self.compute_size() == shape.iter().product::<usize>()
    }

    /// Row-major offsets into an array of `shape` for every selected element.
    ///
    /// The section must already have been checked against `shape`.
    pub fn offsets(&self, shape: &[usize]) -> Vec<usize> {
        let size = self.compute_size();
        let mut offsets = Vec::with_capacity(size);
        if size == 0 {
            return offsets;
        }

        let mut strides = vec![1usize; shape.len()];
        for dim in (0..shape.len().saturating_sub(1)).rev() {
            strides[dim] = strides[dim + 1] * shape[dim + 1];
        }

        let mut counter = vec![0usize; self.ranges.len()];
        for _ in 0..size {
            let offset = counter
                .iter()
                .zip(&self.ranges)
                .zip(&strides)
                .map(|((&i, range), &stride)| range.element(i) * stride)
                .sum();
            offsets.push(offset);

            for dim in (0..counter.len()).rev() {
                counter[dim] += 1;
                if counter[dim] < self.ranges[dim].length {
                    break;
                }
                counter[dim] = 0;
            }
        }
        offsets
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.ranges.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Parse `first:last[:stride]` per dimension, comma separated.
///
/// `last` is inclusive, and a single index selects one element. A lone `:`
/// cannot be resolved without the variable shape, so it is rejected here; use
/// [`Section::parse_for_shape`] instead.
impl FromStr for Section {
    type Err = CdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ranges = s
            .split(',')
            .map(|part| parse_range(part.trim(), None))
            .collect::<CdmResult<Vec<_>>>()?;
        Ok(Self::new(ranges))
    }
}

impl Section {
    /// Parse section text, resolving `:` to the whole dimension of `shape`.
    pub fn parse_for_shape(s: &str, shape: &[usize]) -> CdmResult<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != shape.len() {
            return Err(CdmError::invalid_range(format!(
                "section '{s}' has {} dimensions, expected {}",
                parts.len(),
                shape.len()
            )));
        }
        let ranges = parts
            .iter()
            .zip(shape)
            .map(|(part, &extent)| parse_range(part, Some(extent)))
            .collect::<CdmResult<Vec<_>>>()?;
        Ok(Self::new(ranges))
    }
}

fn parse_range(text: &str, extent: Option<usize>) -> CdmResult<Range> {
    let bad = || CdmError::invalid_range(format!("malformed range '{text}'"));
    let number = |t: &str| t.trim().parse::<usize>().map_err(|_| bad());

    if text == ":" {
        return extent.map(Range::full).ok_or_else(bad);
    }

    let fields: Vec<&str> = text.split(':').collect();
    match fields.as_slice() {
        [index] => Ok(Range::new(number(index)?, 1)),
        [first, last] | [first, last, _] => {
            let first = number(first)?;
            let last = number(last)?;
            let stride = match fields.get(2) {
                Some(s) => number(s)?,
                None => 1,
            };
            if last < first || stride == 0 {
                return Err(bad());
            }
            Ok(Range::with_stride(first, (last - first) / stride + 1, stride))
        }
        _ => Err(bad()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_row_major() {
        let section = Section::new(vec![Range::new(1, 2), Range::with_stride(0, 2, 2)]);
        // shape [3, 4]: rows 1..=2, cols 0 and 2
        assert_eq!(section.offsets(&[3, 4]), vec![4, 6, 8, 10]);
    }

    #[test]
    fn test_scalar_section() {
        let section = Section::from_shape(&[]);
        assert_eq!(section.compute_size(), 1);
        assert_eq!(section.offsets(&[]), vec![0]);
    }
}
