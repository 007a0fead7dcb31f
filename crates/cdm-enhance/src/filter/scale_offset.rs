//! Linear unpacking: `raw * scale_factor + add_offset`.

use cdm_common::{names, Array, Attribute, AttributeContainer, DataType};
use tracing::debug;

/// Scale/offset rule built from `scale_factor` and `add_offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleOffset {
    scale: f64,
    offset: f64,
    scaled_type: DataType,
}

impl ScaleOffset {
    /// Build the rule for a variable currently of `data_type`.
    ///
    /// A missing attribute defaults to identity (scale 1, offset 0); with neither
    /// present, or neither numeric, no rule is built.
    pub fn from_attributes(data_type: DataType, attributes: &AttributeContainer) -> Option<Self> {
        Self::for_stored(data_type, data_type, attributes)
    }

    /// Like [`from_attributes`](Self::from_attributes) for data stored as
    /// `stored_type` and already widened to `data_type` (by an unsigned
    /// reinterpretation). Output width is judged on the stored type.
    pub fn for_stored(
        stored_type: DataType,
        data_type: DataType,
        attributes: &AttributeContainer,
    ) -> Option<Self> {
        let scale_att = numeric_attribute(attributes, names::SCALE_FACTOR);
        let offset_att = numeric_attribute(attributes, names::ADD_OFFSET);

        let scale = scale_att.and_then(Attribute::numeric_value);
        let offset = offset_att.and_then(Attribute::numeric_value);
        if scale.is_none() && offset.is_none() {
            return None;
        }

        let attribute_types: Vec<DataType> = [scale_att, offset_att]
            .into_iter()
            .flatten()
            .map(Attribute::data_type)
            .collect();
        let scaled_type = scaled_type(data_type, stored_type, &attribute_types);

        let rule = Self {
            scale: scale.unwrap_or(1.0),
            offset: offset.unwrap_or(0.0),
            scaled_type,
        };
        debug!(scale = rule.scale, offset = rule.offset, %scaled_type, "scale/offset enabled");
        Some(rule)
    }

    /// Rule with explicit parameters.
    pub fn new(scale: f64, offset: f64, scaled_type: DataType) -> Self {
        Self {
            scale,
            offset,
            scaled_type,
        }
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Element type of unpacked values.
    pub fn scaled_offset_type(&self) -> DataType {
        self.scaled_type
    }

    pub fn apply_scalar(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }

    /// Unpack an array; arrays without numeric storage pass through.
    pub fn apply(&self, data: Array) -> Array {
        match data.map_f64(self.scaled_type, |v| self.apply_scalar(v)) {
            Some(scaled) => scaled,
            None => data,
        }
    }
}

fn numeric_attribute<'a>(attributes: &'a AttributeContainer, name: &str) -> Option<&'a Attribute> {
    let att = attributes.find(name)?;
    if att.numeric_value().is_none() {
        debug!(attribute = name, "ignoring non-numeric attribute");
        return None;
    }
    Some(att)
}

/// Pick the unpacked type so precision is not lost.
///
/// Double attributes give double output. Float attributes give float output
/// unless the stored integers are wider than 16 bits. Integral attributes keep
/// the wider of the input and attribute types.
fn scaled_type(in_type: DataType, stored_type: DataType, attribute_types: &[DataType]) -> DataType {
    if attribute_types.contains(&DataType::Double) || in_type == DataType::Double {
        return DataType::Double;
    }
    if attribute_types.contains(&DataType::Float) {
        return if stored_type.is_integral() && stored_type.size() >= 4 {
            DataType::Double
        } else {
            DataType::Float
        };
    }
    if in_type.is_floating_point() {
        return in_type;
    }

    let widest_attribute = attribute_types
        .iter()
        .copied()
        .filter(DataType::is_numeric)
        .max_by_key(DataType::size);
    match widest_attribute {
        Some(att) if !in_type.is_numeric() || att.size() > in_type.size() => att,
        _ if in_type.is_numeric() => in_type,
        _ => DataType::Double,
    }
}
