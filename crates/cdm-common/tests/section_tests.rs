//! Tests for section parsing, validation and array extraction.

use cdm_common::{Array, CdmError, DataType, Range, Section};

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_inclusive_ranges() {
    let section: Section = "0:2,1:5:2".parse().unwrap();
    assert_eq!(section.ranges()[0], Range::new(0, 3));
    assert_eq!(section.ranges()[1], Range::with_stride(1, 3, 2));
    assert_eq!(section.shape(), vec![3, 3]);
}

#[test]
fn test_parse_single_index() {
    let section: Section = "4".parse().unwrap();
    assert_eq!(section.ranges()[0], Range::new(4, 1));
}

#[test]
fn test_parse_colon_needs_shape() {
    assert!("0:1,:".parse::<Section>().is_err());

    let section = Section::parse_for_shape("0:1,:", &[4, 6]).unwrap();
    assert_eq!(section.shape(), vec![2, 6]);
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(matches!(
        "a:b".parse::<Section>(),
        Err(CdmError::InvalidRange(_))
    ));
    assert!("3:1".parse::<Section>().is_err());
    assert!("0:4:0".parse::<Section>().is_err());
    assert!(Section::parse_for_shape("0:1", &[2, 2]).is_err());
}

#[test]
fn test_display_roundtrip() {
    let section: Section = "1:3,0:8:4".parse().unwrap();
    assert_eq!(section.to_string(), "1:3,0:8:4");
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_check_in_range() {
    let shape = [3, 4];
    assert!(Section::from_shape(&shape).check_in_range(&shape).is_ok());

    let too_far = Section::new(vec![Range::new(2, 2), Range::full(4)]);
    assert!(matches!(
        too_far.check_in_range(&shape),
        Err(CdmError::InvalidRange(_))
    ));

    let wrong_rank = Section::new(vec![Range::full(3)]);
    assert!(wrong_rank.check_in_range(&shape).is_err());
}

#[test]
fn test_covers() {
    let shape = [2, 5];
    assert!(Section::from_shape(&shape).covers(&shape));
    assert!(!Section::new(vec![Range::new(0, 1), Range::full(5)]).covers(&shape));
}

// ============================================================================
// Array extraction
// ============================================================================

#[test]
fn test_strided_section_of_grid() {
    let values: Vec<f32> = (0..12).map(|v| v as f32).collect();
    let array = Array::with_shape(vec![3, 4], values).unwrap();

    let section = Section::parse_for_shape("0:2:2,1:3:2", array.shape()).unwrap();
    let sub = array.section(&section).unwrap();

    assert_eq!(sub.shape(), &[2, 2]);
    assert_eq!(sub.to_f64_vec(), vec![1.0, 3.0, 9.0, 11.0]);
}

#[test]
fn test_section_of_constant_array_stays_constant() {
    let array = Array::constant(DataType::Short, vec![10, 10], -32767.0);
    let sub = array
        .section(&Section::new(vec![Range::new(2, 3), Range::new(0, 2)]))
        .unwrap();

    assert!(sub.is_constant());
    assert_eq!(sub.len(), 6);
    assert!(sub.iter_f64().all(|v| v == -32767.0));
}

#[test]
fn test_section_out_of_bounds_fails() {
    let array = Array::from_vec(vec![1u8, 2, 3]);
    let err = array.section(&Section::new(vec![Range::new(2, 2)])).unwrap_err();
    assert!(matches!(err, CdmError::InvalidRange(_)));
}
