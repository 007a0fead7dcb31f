//! Missing-value masking: fill value, `missing_value` list and valid range.

use cdm_common::{names, Array, ArrayData, Attribute, AttributeContainer, DataType};
use tracing::debug;

use crate::config::MissingPolicy;
use crate::filter::nearly_equals;

/// Decides which unpacked values are missing and rewrites them to NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertMissing {
    valid_min: Option<f64>,
    valid_max: Option<f64>,
    missing_values: Vec<f64>,
    fill_value: Option<f64>,
    policy: MissingPolicy,
}

impl ConvertMissing {
    /// Build the rule from a variable's attributes.
    ///
    /// `missing_value` entries are packed and go through `unpack`. Valid-range
    /// attributes are unpacked only when typed like the packed data (`raw_type`).
    /// `fill_value` must already be unpacked.
    pub fn from_attributes(
        attributes: &AttributeContainer,
        raw_type: DataType,
        fill_value: Option<f64>,
        policy: MissingPolicy,
        unpack: impl Fn(f64, DataType) -> f64,
    ) -> Self {
        let unpack_valid = |att: &Attribute, value: f64| {
            if att.data_type() == raw_type {
                unpack(value, att.data_type())
            } else {
                value
            }
        };

        let (mut valid_min, mut valid_max) = match attributes.find(names::VALID_RANGE) {
            Some(range) if range.len() == 2 && !range.is_string() => (
                range.numeric_value_at(0).map(|v| unpack_valid(range, v)),
                range.numeric_value_at(1).map(|v| unpack_valid(range, v)),
            ),
            Some(range) => {
                debug!(values = ?range.value_list(), "ignoring malformed valid_range");
                (None, None)
            }
            None => (
                attributes
                    .find(names::VALID_MIN)
                    .and_then(|a| a.numeric_value().map(|v| unpack_valid(a, v))),
                attributes
                    .find(names::VALID_MAX)
                    .and_then(|a| a.numeric_value().map(|v| unpack_valid(a, v))),
            ),
        };

        // a negative scale factor flips the unpacked range
        if let (Some(min), Some(max)) = (valid_min, valid_max) {
            if min > max {
                valid_min = Some(max);
                valid_max = Some(min);
            }
        }

        let missing_values = attributes
            .find(names::MISSING_VALUE)
            .map(|att| {
                let value_type = att.data_type();
                att.numeric_values()
                    .into_iter()
                    .filter(|v| !v.is_nan())
                    .map(|v| unpack(v, value_type))
                    .collect()
            })
            .unwrap_or_default();

        let rule = Self {
            valid_min,
            valid_max,
            missing_values,
            fill_value,
            policy,
        };
        debug!(?rule, "missing-value conversion enabled");
        rule
    }

    pub fn policy(&self) -> MissingPolicy {
        self.policy
    }

    /// Any source of missing values is defined.
    pub fn has_missing(&self) -> bool {
        self.has_valid_data() || self.has_fill_value() || self.has_missing_value()
    }

    pub fn has_valid_data(&self) -> bool {
        self.valid_min.is_some() || self.valid_max.is_some()
    }

    pub fn valid_min(&self) -> f64 {
        self.valid_min.unwrap_or(-f64::MAX)
    }

    pub fn valid_max(&self) -> f64 {
        self.valid_max.unwrap_or(f64::MAX)
    }

    pub fn has_missing_value(&self) -> bool {
        !self.missing_values.is_empty()
    }

    pub fn missing_values(&self) -> &[f64] {
        &self.missing_values
    }

    pub fn has_fill_value(&self) -> bool {
        self.fill_value.is_some()
    }

    pub fn fill_value(&self) -> Option<f64> {
        self.fill_value
    }

    /// Outside the valid range, regardless of policy.
    /// Bounds match within tolerance, so a bound unpacked in `f64` still
    /// admits the same value held as `f32`.
    pub fn is_invalid_data(&self, value: f64) -> bool {
        let below = self
            .valid_min
            .is_some_and(|min| value < min && !nearly_equals(value, min));
        let above = self
            .valid_max
            .is_some_and(|max| value > max && !nearly_equals(value, max));
        below || above
    }

    /// Equal to the fill value, regardless of policy.
    pub fn is_fill_value(&self, value: f64) -> bool {
        self.fill_value.is_some_and(|fill| nearly_equals(value, fill))
    }

    /// Listed in `missing_value`, regardless of policy.
    pub fn is_missing_value(&self, value: f64) -> bool {
        self.missing_values.iter().any(|&m| nearly_equals(value, m))
    }

    /// NaN, or missing under the configured policy.
    pub fn is_missing(&self, value: f64) -> bool {
        if value.is_nan() {
            return true;
        }
        (self.policy.missing_data_is_missing && self.is_missing_value(value))
            || (self.policy.fill_value_is_missing && self.is_fill_value(value))
            || (self.policy.invalid_data_is_missing && self.is_invalid_data(value))
    }

    pub fn convert_missing_scalar(&self, value: f64) -> f64 {
        if self.is_missing(value) {
            f64::NAN
        } else {
            value
        }
    }

    /// Replace missing elements of a floating array by NaN.
    ///
    /// Integral arrays are returned unchanged.
    pub fn convert_missing(&self, data: Array) -> Array {
        let converted = match data.data() {
            ArrayData::Float(v) => ArrayData::Float(
                v.iter()
                    .map(|&x| if self.is_missing(x as f64) { f32::NAN } else { x })
                    .collect(),
            ),
            ArrayData::Double(v) => ArrayData::Double(
                v.iter()
                    .map(|&x| if self.is_missing(x) { f64::NAN } else { x })
                    .collect(),
            ),
            _ => return data,
        };
        data.replace_data(data.data_type(), converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(v: f64, _: DataType) -> f64 {
        v
    }

    fn rule(
        attrs: &AttributeContainer,
        fill: Option<f64>,
        policy: MissingPolicy,
    ) -> ConvertMissing {
        ConvertMissing::from_attributes(attrs, DataType::Float, fill, policy, identity)
    }

    #[test]
    fn test_nan_always_missing() {
        let never = MissingPolicy {
            fill_value_is_missing: false,
            invalid_data_is_missing: false,
            missing_data_is_missing: false,
        };
        for policy in [never, MissingPolicy::default()] {
            let r = rule(&AttributeContainer::new(), None, policy);
            assert!(r.is_missing(f64::NAN));
        }
    }

    #[test]
    fn test_missing_value_list_policy() {
        let attrs = AttributeContainer::new()
            .with(Attribute::values(names::MISSING_VALUE, &[-999.0f32, -888.0]));
        let on = rule(&attrs, None, MissingPolicy::default());
        assert!(on.is_missing(-999.0));
        assert!(on.is_missing(-888.0));
        assert!(!on.is_missing(0.0));

        let off = rule(
            &attrs,
            None,
            MissingPolicy {
                missing_data_is_missing: false,
                ..MissingPolicy::default()
            },
        );
        assert!(!off.is_missing(-999.0));
        assert!(off.is_missing_value(-999.0));
    }

    #[test]
    fn test_fill_policy() {
        let on = rule(&AttributeContainer::new(), Some(-1.0), MissingPolicy::default());
        assert!(on.is_missing(-1.0));

        let off = rule(
            &AttributeContainer::new(),
            Some(-1.0),
            MissingPolicy {
                fill_value_is_missing: false,
                ..MissingPolicy::default()
            },
        );
        assert!(!off.is_missing(-1.0));
        assert!(off.is_fill_value(-1.0));
    }

    #[test]
    fn test_valid_range_and_min_max() {
        let range =
            AttributeContainer::new().with(Attribute::values(names::VALID_RANGE, &[0.0f32, 100.0]));
        let r = rule(&range, None, MissingPolicy::default());
        assert!(r.is_missing(-0.5));
        assert!(r.is_missing(100.5));
        assert!(!r.is_missing(50.0));

        let min_only =
            AttributeContainer::new().with(Attribute::scalar(names::VALID_MIN, 10.0f32));
        let r = rule(&min_only, None, MissingPolicy::default());
        assert!(r.is_missing(9.0));
        assert!(!r.is_missing(1e30));
        assert_eq!(r.valid_max(), f64::MAX);
    }

    #[test]
    fn test_valid_range_unpacked_only_when_packed_type() {
        let attrs = AttributeContainer::new()
            .with(Attribute::values(names::VALID_RANGE, &[0i16, 1000]))
            .with(Attribute::scalar(names::VALID_MAX, 5.0f64));
        let unpack = |v: f64, _: DataType| v * -0.1;
        let policy = MissingPolicy::default();
        let r = ConvertMissing::from_attributes(&attrs, DataType::Short, None, policy, unpack);
        // negative scale swaps the unpacked bounds
        assert_eq!(r.valid_min(), -100.0);
        assert_eq!(r.valid_max(), 0.0);

        let float_range =
            AttributeContainer::new().with(Attribute::values(names::VALID_RANGE, &[0.0f32, 50.0]));
        let r =
            ConvertMissing::from_attributes(&float_range, DataType::Short, None, policy, unpack);
        assert_eq!(r.valid_max(), 50.0);
    }

    #[test]
    fn test_bound_held_as_f32_is_valid() {
        let attrs =
            AttributeContainer::new().with(Attribute::values(names::VALID_RANGE, &[0i16, 4095]));
        let unpack = |v: f64, _: DataType| v * 0.047_203_224_f32 as f64 + 16.0;
        let policy = MissingPolicy::default();
        let r = ConvertMissing::from_attributes(&attrs, DataType::Short, None, policy, unpack);

        let top = r.valid_max() as f32 as f64;
        assert!(!r.is_invalid_data(top));
        assert!(r.is_invalid_data(r.valid_max() + 1.0));
        assert!(r.is_invalid_data(r.valid_min() - 1.0));
    }

    #[test]
    fn test_missing_values_are_unpacked() {
        let attrs = AttributeContainer::new().with(Attribute::scalar(names::MISSING_VALUE, -1i16));
        let unpack = |v: f64, _: DataType| v * 0.5 + 10.0;
        let policy = MissingPolicy::default();
        let r = ConvertMissing::from_attributes(&attrs, DataType::Short, None, policy, unpack);
        assert_eq!(r.missing_values(), &[9.5]);
        assert!(r.is_missing(9.5));
    }

    #[test]
    fn test_convert_missing_array() {
        let attrs =
            AttributeContainer::new().with(Attribute::scalar(names::MISSING_VALUE, -999.0f64));
        let r = rule(&attrs, None, MissingPolicy::default());

        let out = r.convert_missing(Array::from_vec(vec![1.0f32, -999.0, 3.0]));
        let values = out.to_f64_vec();
        assert_eq!(values[0], 1.0);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 3.0);

        let ints = Array::from_vec(vec![-999i32]);
        assert_eq!(r.convert_missing(ints.clone()), ints);
    }
}
