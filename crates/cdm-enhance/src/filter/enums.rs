//! Projection of enumeration codes onto their labels.

use cdm_common::{Array, ArrayData, DataType};

/// Replace every integral code in `data` by `lookup(code)`.
///
/// The result is a string array of the same shape. Arrays that do not hold
/// integral codes are returned unchanged.
pub fn convert_enums(data: Array, lookup: impl Fn(i64) -> String) -> Array {
    let codes = data.data_type();
    let var_len = matches!(data.data(), ArrayData::VarLen(_));
    let holds_codes = codes.is_enum() || (codes.is_integral() && !var_len);
    if !holds_codes {
        return data;
    }

    let stored = data.data();
    let labels: Vec<String> = (0..stored.storage_len())
        .filter_map(|i| stored.value_f64(i))
        .map(|code| lookup(code as i64))
        .collect();
    data.replace_data(DataType::String, ArrayData::String(labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdm_common::EnumTypedef;

    fn cloud() -> EnumTypedef {
        EnumTypedef::new("cloud_t", DataType::Enum1)
            .with_member(0, "clear")
            .with_member(1, "cloudy")
    }

    #[test]
    fn test_codes_become_labels() {
        let typedef = cloud();
        let data = Array::from_vec(vec![0i8, 1, 5])
            .with_data_type(DataType::Enum1)
            .unwrap();
        let out = convert_enums(data, |c| typedef.lookup_enum_string(c));
        assert_eq!(out.data_type(), DataType::String);
        assert_eq!(
            out.data(),
            &ArrayData::String(vec![
                "clear".to_string(),
                "cloudy".to_string(),
                "Unknown enum value=5".to_string(),
            ])
        );
    }

    #[test]
    fn test_plain_integers_as_codes() {
        let typedef = cloud();
        let data = Array::with_shape(vec![1, 2], vec![1i32, 0]).unwrap();
        let out = convert_enums(data, |c| typedef.lookup_enum_string(c));
        assert_eq!(out.shape(), &[1, 2]);
        assert_eq!(out.get_string(0).as_deref(), Some("cloudy"));
        assert_eq!(out.get_string(1).as_deref(), Some("clear"));
    }

    #[test]
    fn test_non_integral_passthrough() {
        let typedef = cloud();
        let data = Array::from_vec(vec![0.5f32]);
        let out = convert_enums(data.clone(), |c| typedef.lookup_enum_string(c));
        assert_eq!(out, data);
    }
}
