//! End-to-end conversion through leaf and enhanced variables.

use cdm_common::{names, Array, ArrayData, Attribute, AttributeContainer, DataFormat, DataType};
use cdm_enhance::{
    Dataset, Enhance, EnhanceConfig, EnhanceSet, EnhancedVariableBuilder, LeafVariable,
};
use test_utils::{assert_approx_eq, assert_values_approx_eq, fixtures};

fn mode(kinds: &[Enhance]) -> EnhanceSet {
    kinds.iter().copied().collect()
}

#[test]
fn test_int_scale_offset() {
    let mut dataset = Dataset::default();
    let raw = dataset.add_leaf(
        LeafVariable::in_memory("t2m", Array::from_vec(vec![500i32, 0]))
            .with_attribute(Attribute::scalar(names::SCALE_FACTOR, 0.1f64))
            .with_attribute(Attribute::scalar(names::ADD_OFFSET, -40.0f64)),
    );
    let var = dataset.wrap(raw).unwrap();

    let data = dataset.read(var).unwrap();
    assert_eq!(data.data_type(), DataType::Double);
    assert_values_approx_eq!(&data.to_f64_vec(), &[10.0, -40.0], 1e-9);

    let enhanced = dataset.enhanced(var).unwrap();
    assert_approx_eq!(enhanced.scale_factor(), 0.1, 1e-12);
    assert_approx_eq!(enhanced.offset(), -40.0, 1e-12);
    assert!(!enhanced.has_fill_value());
}

#[test]
fn test_float_missing_value_policy() {
    let attrs =
        AttributeContainer::new().with(Attribute::values(names::MISSING_VALUE, &[-999.0f32]));
    let mut dataset = Dataset::default();
    let raw = dataset.add_leaf(
        LeafVariable::in_memory("sst", Array::from_vec(vec![-999.0f32, 12.5]))
            .with_attributes(attrs),
    );

    let masked = dataset
        .build(
            EnhancedVariableBuilder::copy_from(&dataset, raw)
                .unwrap()
                .set_fill_value_is_missing(false)
                .set_missing_data_is_missing(true),
        )
        .unwrap();
    let values = dataset.read(masked).unwrap().to_f64_vec();
    assert!(values[0].is_nan());
    assert_eq!(values[1], 12.5);

    let kept = dataset
        .build(
            EnhancedVariableBuilder::copy_from(&dataset, raw)
                .unwrap()
                .set_fill_value_is_missing(false)
                .set_missing_data_is_missing(false),
        )
        .unwrap();
    assert_eq!(dataset.read(kept).unwrap().to_f64_vec(), vec![-999.0, 12.5]);
}

#[test]
fn test_unwrapped_variable_reads_fill() {
    let mut dataset = Dataset::default();
    let var = dataset
        .build(
            EnhancedVariableBuilder::new("placeholder")
                .set_data_type(DataType::Int)
                .set_shape(vec![3])
                .add_attribute(Attribute::scalar(names::FILL_VALUE, -1i32)),
        )
        .unwrap();

    let enhanced = dataset.enhanced(var).unwrap();
    assert_eq!(enhanced.fill_value(), Some(-1.0));

    let data = dataset.read(var).unwrap();
    assert_eq!(data.data_type(), DataType::Int);
    assert_eq!(data.shape(), &[3]);
    assert_eq!(data.to_f64_vec(), vec![-1.0, -1.0, -1.0]);
}

#[test]
fn test_unwrapped_float_reads_nan() {
    let mut dataset = Dataset::default();
    let var = dataset
        .build(
            EnhancedVariableBuilder::new("placeholder")
                .set_data_type(DataType::Float)
                .set_shape(vec![2, 2])
                .set_file_type(DataFormat::NetCdf4),
        )
        .unwrap();

    let data = dataset.read(var).unwrap();
    assert_eq!(data.len(), 4);
    assert!(data.iter_f64().all(f64::is_nan));
}

#[test]
fn test_variable_length_passes_through() {
    let rows = vec![
        Array::from_vec(vec![1i16, 2, 3]),
        Array::from_vec(vec![4i16]),
    ];
    let stored = Array::var_len(DataType::Short, rows);
    let mut dataset = Dataset::default();
    let raw = dataset.add_leaf(
        LeafVariable::in_memory("ragged", stored.clone())
            .with_variable_length(true)
            .with_attribute(Attribute::scalar(names::SCALE_FACTOR, 10.0f64)),
    );
    let var = dataset
        .build(
            EnhancedVariableBuilder::copy_from(&dataset, raw)
                .unwrap()
                .set_enhance_mode(mode(&[Enhance::ApplyScaleOffset])),
        )
        .unwrap();

    assert_eq!(dataset.read(var).unwrap(), stored);
    assert!(!dataset.enhanced(var).unwrap().has_scale_offset());
}

#[test]
fn test_enum_short_circuits_scale_offset() {
    let codes = Array::from_vec(vec![0i8, 3, 9])
        .with_data_type(DataType::Enum1)
        .unwrap();
    let mut dataset = Dataset::default();
    let raw = dataset.add_leaf(
        LeafVariable::in_memory("cloud_mask", codes)
            .with_enum_typedef(fixtures::cloud_mask_typedef())
            .with_attribute(Attribute::scalar(names::SCALE_FACTOR, 2.0f64)),
    );
    let var = dataset
        .build(
            EnhancedVariableBuilder::copy_from(&dataset, raw)
                .unwrap()
                .set_enhance_mode(mode(&[Enhance::ConvertEnums, Enhance::ApplyScaleOffset])),
        )
        .unwrap();

    let enhanced = dataset.enhanced(var).unwrap();
    assert_eq!(enhanced.data_type(), DataType::String);
    assert!(!enhanced.has_scale_offset());

    let data = dataset.read(var).unwrap();
    assert_eq!(
        data.data(),
        &ArrayData::String(vec![
            "clear".to_string(),
            "cloudy".to_string(),
            "Unknown enum value=9".to_string(),
        ])
    );
    assert_eq!(dataset.lookup_enum_string(var, 1).unwrap(), "probably_clear");
}

#[test]
fn test_enum_codes_kept_without_convert_enums() {
    let codes = Array::from_vec(vec![1i8]).with_data_type(DataType::Enum1).unwrap();
    let mut dataset = Dataset::new(EnhanceConfig::raw());
    let raw = dataset.add_leaf(
        LeafVariable::in_memory("cloud_mask", codes)
            .with_enum_typedef(fixtures::cloud_mask_typedef()),
    );
    let var = dataset.wrap(raw).unwrap();
    let data = dataset.read(var).unwrap();
    assert_eq!(data.data_type(), DataType::Enum1);
    assert_eq!(data.to_f64_vec(), vec![1.0]);
}

#[test]
fn test_goes_cmi_unsigned_scaled_and_masked() {
    // stored bits: 0, 4095, 4096 (outside valid range), -1 (fill)
    let stored = Array::from_vec(vec![0i16, 4095, 4096, -1]);
    let mut dataset = Dataset::default();
    let raw = dataset.add_leaf(
        LeafVariable::in_memory("CMI", stored)
            .with_attributes(fixtures::goes_cmi::attributes())
            .with_file_type(DataFormat::NetCdf4),
    );
    let var = dataset.wrap(raw).unwrap();

    let enhanced = dataset.enhanced(var).unwrap();
    assert_eq!(enhanced.original_data_type(), DataType::Short);
    assert_eq!(enhanced.unsigned_conversion_type(), DataType::Int);
    // float attributes on 16-bit storage unpack to float
    assert_eq!(enhanced.data_type(), DataType::Float);

    let scale = fixtures::goes_cmi::SCALE_FACTOR as f64;
    let offset = fixtures::goes_cmi::ADD_OFFSET as f64;
    let fill = enhanced.fill_value().unwrap();
    assert_approx_eq!(fill, 65535.0 * scale + offset, 1e-6);
    assert!(enhanced.is_missing(fill));
    assert_approx_eq!(enhanced.valid_max(), 4095.0 * scale + offset, 1e-6);

    let data = dataset.read(var).unwrap();
    assert_eq!(data.data_type(), DataType::Float);
    assert_values_approx_eq!(
        &data.to_f64_vec(),
        &[offset, 4095.0 * scale + offset, f64::NAN, f64::NAN],
        1e-3
    );
}

#[test]
fn test_packed_temperature_float_output() {
    let packed = test_utils::create_packed_temperature_grid(4, 2, 0.01, 273.15);
    let expected = test_utils::create_temperature_grid(4, 2);
    let mut dataset = Dataset::default();
    let raw = dataset.add_leaf(
        LeafVariable::in_memory("t", packed)
            .with_attributes(fixtures::packed_temperature::attributes()),
    );
    let var = dataset.wrap(raw).unwrap();

    let data = dataset.read(var).unwrap();
    assert_eq!(data.data_type(), DataType::Double);
    assert_eq!(data.shape(), &[2, 4]);
    assert_values_approx_eq!(&data.to_f64_vec(), &expected, 0.0051);
    assert_eq!(dataset.units(var).unwrap().as_deref(), Some("K"));
}

#[test]
fn test_wrapping_does_not_convert_twice() {
    let mut dataset = Dataset::default();
    let raw = dataset.add_leaf(
        LeafVariable::in_memory("b", Array::from_vec(vec![-1i8, 5]))
            .with_attribute(Attribute::string(names::UNSIGNED, "true")),
    );
    let inner = dataset
        .build(
            EnhancedVariableBuilder::copy_from(&dataset, raw)
                .unwrap()
                .set_enhance_mode(mode(&[Enhance::ConvertUnsigned])),
        )
        .unwrap();
    let outer = dataset
        .build(
            EnhancedVariableBuilder::copy_from(&dataset, inner)
                .unwrap()
                .set_enhance_mode(mode(&[Enhance::ConvertUnsigned, Enhance::ConvertMissing])),
        )
        .unwrap();

    assert_eq!(dataset.active_enhancements(outer).unwrap(), mode(&[Enhance::ConvertMissing]));
    assert_eq!(
        dataset.effective_enhancements(outer).unwrap(),
        mode(&[Enhance::ConvertUnsigned, Enhance::ConvertMissing])
    );
    assert_eq!(dataset.original(outer).unwrap(), Some(inner));

    let data = dataset.read(outer).unwrap();
    assert_eq!(data.data_type(), DataType::Short);
    assert_eq!(data.to_f64_vec(), vec![255.0, 5.0]);
}

#[test]
fn test_outer_layer_scales_inner_unsigned_fill() {
    let mut dataset = Dataset::default();
    let raw = dataset.add_leaf(
        LeafVariable::in_memory("b", Array::from_vec(vec![-1i8, 10]))
            .with_attribute(Attribute::string(names::UNSIGNED, "true"))
            .with_attribute(Attribute::scalar(names::FILL_VALUE, -1i8))
            .with_attribute(Attribute::scalar(names::SCALE_FACTOR, 0.5f64)),
    );
    let inner = dataset
        .build(
            EnhancedVariableBuilder::copy_from(&dataset, raw)
                .unwrap()
                .set_enhance_mode(mode(&[Enhance::ConvertUnsigned])),
        )
        .unwrap();
    let outer = dataset.wrap(inner).unwrap();

    let enhanced = dataset.enhanced(outer).unwrap();
    assert_eq!(enhanced.fill_value(), Some(127.5));

    let values = dataset.read(outer).unwrap().to_f64_vec();
    assert!(values[0].is_nan());
    assert_eq!(values[1], 5.0);
}

#[test]
fn test_nan_and_fill_properties() {
    let mut dataset = Dataset::default();
    let raw = dataset.add_leaf(
        LeafVariable::in_memory("x", Array::from_vec(vec![1.0f64]))
            .with_attribute(Attribute::scalar(names::FILL_VALUE, -5.0f64)),
    );
    let policies = [(true, true, true), (false, false, false), (true, false, true)];
    for (fill, invalid, missing) in policies {
        let var = dataset
            .build(
                EnhancedVariableBuilder::copy_from(&dataset, raw)
                    .unwrap()
                    .set_fill_value_is_missing(fill)
                    .set_invalid_data_is_missing(invalid)
                    .set_missing_data_is_missing(missing),
            )
            .unwrap();
        let enhanced = dataset.enhanced(var).unwrap();
        assert!(enhanced.is_missing(f64::NAN));
        assert_eq!(enhanced.is_missing(-5.0), fill);
        assert!(enhanced.is_fill_value(-5.0));
    }
}

#[test]
fn test_standardizer_over_unpacked_data() {
    let mut dataset = Dataset::new(EnhanceConfig {
        enhance_mode: EnhanceSet::all(),
        ..EnhanceConfig::default()
    });
    let raw = dataset.add_leaf(
        LeafVariable::in_memory("z", Array::from_vec(vec![10i16, 30, -999]))
            .with_attribute(Attribute::scalar(names::SCALE_FACTOR, 0.1f32))
            .with_attribute(Attribute::scalar(names::MISSING_VALUE, -999i16))
            .with_attribute(Attribute::string(names::STANDARDIZE, "true")),
    );
    let var = dataset.wrap(raw).unwrap();

    let data = dataset.read(var).unwrap();
    assert_eq!(data.data_type(), DataType::Float);
    assert_values_approx_eq!(&data.to_f64_vec(), &[-1.0, 1.0, f64::NAN], 1e-5);
}

#[test]
fn test_standardizer_needs_attribute() {
    let mut dataset = Dataset::new(EnhanceConfig {
        enhance_mode: EnhanceSet::all(),
        ..EnhanceConfig::default()
    });
    let raw = dataset.add_leaf(LeafVariable::in_memory("z", Array::from_vec(vec![1.0f64, 3.0])));
    let var = dataset.wrap(raw).unwrap();
    assert_eq!(dataset.read(var).unwrap().to_f64_vec(), vec![1.0, 3.0]);
    assert!(dataset.enhanced(var).unwrap().enhancements().standardizer.is_none());
}

#[test]
fn test_reenhance_changes_rules() {
    let mut dataset = Dataset::default();
    let raw = dataset.add_leaf(
        LeafVariable::in_memory("t", Array::from_vec(vec![100i16]))
            .with_attribute(Attribute::scalar(names::SCALE_FACTOR, 0.5f32)),
    );
    let var = dataset.wrap(raw).unwrap();
    assert_eq!(dataset.read(var).unwrap().to_f64_vec(), vec![50.0]);

    assert!(dataset.remove_enhancement(var, Enhance::ApplyScaleOffset).unwrap());
    assert!(!dataset.remove_enhancement(var, Enhance::ApplyScaleOffset).unwrap());
    let enhanced = dataset.enhanced(var).unwrap();
    assert_eq!(enhanced.data_type(), DataType::Short);
    assert_eq!(dataset.read(var).unwrap().to_f64_vec(), vec![100.0]);

    assert!(dataset.add_enhancement(var, Enhance::ApplyScaleOffset).unwrap());
    assert_eq!(dataset.enhanced(var).unwrap().data_type(), DataType::Float);
}

#[test]
fn test_add_inherited_enhancement_is_no_change() {
    let mut dataset = Dataset::default();
    let raw = dataset.add_leaf(LeafVariable::in_memory("t", Array::from_vec(vec![1u8])));
    let inner = dataset.wrap(raw).unwrap();
    let outer = dataset
        .build(
            EnhancedVariableBuilder::copy_from(&dataset, inner)
                .unwrap()
                .set_enhance_mode(EnhanceSet::empty()),
        )
        .unwrap();
    assert!(!dataset.add_enhancement(outer, Enhance::ConvertUnsigned).unwrap());
    assert!(dataset.active_enhancements(outer).unwrap().is_empty());
}

#[test]
fn test_rename_and_description() {
    let mut dataset = Dataset::default();
    let raw = dataset.add_leaf(
        LeafVariable::in_memory("t", Array::from_vec(vec![1.0f32]))
            .with_attribute(Attribute::string(names::LONG_NAME, "air temperature")),
    );
    let var = dataset
        .build(
            EnhancedVariableBuilder::copy_from(&dataset, raw)
                .unwrap()
                .set_units(" degC "),
        )
        .unwrap();

    dataset.rename(var, "air_temp").unwrap();
    let enhanced = dataset.enhanced(var).unwrap();
    assert_eq!(enhanced.name(), "air_temp");
    assert_eq!(enhanced.original_name(), Some("t"));
    assert_eq!(enhanced.units(), Some("degC"));
    assert_eq!(dataset.description(var).unwrap().as_deref(), Some("air temperature"));
    assert_eq!(dataset.find("air_temp"), Some(var));
}
