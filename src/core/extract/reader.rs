//! Typed attribute reads with caller-supplied defaults
//!
//! The type of the default selects the coercion: floats and integers both
//! read as `f64`, booleans accept `Y/N` style flags, and text has parentheses
//! and commas stripped. An absent attribute always yields the default
//! unchanged. Coercion failures are returned as [`ReadError`] and the caller
//! decides whether to substitute the default ([`read_or_default`]).

use super::document::{Attribute, AttributeSource};
use crate::domain::{PlaneLabel, ReadError};
use tracing::debug;

/// Separator between components of a multi-valued attribute
pub const VALUE_SEPARATOR: char = '\\';

/// A default value that also determines how the raw attribute is coerced
pub trait AttributeDefault: Clone {
    type Output;

    fn coerce(attribute: Attribute, raw: &str) -> Result<Self::Output, ReadError>;

    fn into_output(self) -> Self::Output;
}

impl AttributeDefault for f64 {
    type Output = f64;

    fn coerce(attribute: Attribute, raw: &str) -> Result<f64, ReadError> {
        parse_float(attribute, raw)
    }

    fn into_output(self) -> f64 {
        self
    }
}

impl AttributeDefault for i64 {
    type Output = f64;

    fn coerce(attribute: Attribute, raw: &str) -> Result<f64, ReadError> {
        parse_float(attribute, raw)
    }

    fn into_output(self) -> f64 {
        self as f64
    }
}

impl AttributeDefault for bool {
    type Output = bool;

    fn coerce(attribute: Attribute, raw: &str) -> Result<bool, ReadError> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "Y" | "YES" | "TRUE" | "1" => Ok(true),
            "N" | "NO" | "FALSE" | "0" => Ok(false),
            _ => Err(malformed(attribute, raw, "boolean flag")),
        }
    }

    fn into_output(self) -> bool {
        self
    }
}

impl AttributeDefault for &str {
    type Output = String;

    fn coerce(_attribute: Attribute, raw: &str) -> Result<String, ReadError> {
        Ok(sanitize_text(raw))
    }

    fn into_output(self) -> String {
        self.to_string()
    }
}

impl AttributeDefault for String {
    type Output = String;

    fn coerce(_attribute: Attribute, raw: &str) -> Result<String, ReadError> {
        Ok(sanitize_text(raw))
    }

    fn into_output(self) -> String {
        self
    }
}

/// Read `attribute` coerced to the type of `default`.
///
/// `PixelSpacing` yields its first component only.
pub fn read_attribute<S, D>(doc: &S, attribute: Attribute, default: D) -> Result<D::Output, ReadError>
where
    S: AttributeSource + ?Sized,
    D: AttributeDefault,
{
    let Some(raw) = doc.get_optional(attribute) else {
        return Ok(default.into_output());
    };

    match attribute {
        Attribute::PixelSpacing => {
            let first = component(attribute, raw, 0)?;
            D::coerce(attribute, first)
        }
        _ => D::coerce(attribute, raw),
    }
}

/// Read `attribute`, falling back to `default` on any coercion failure
pub fn read_or_default<S, D>(doc: &S, attribute: Attribute, default: D) -> D::Output
where
    S: AttributeSource + ?Sized,
    D: AttributeDefault,
{
    let result = read_attribute(doc, attribute, default.clone());
    or_default(attribute.keyword(), result, default.into_output())
}

/// Substitute `fallback` for a failed read, logging the failure at debug level
pub fn or_default<T>(field: &str, result: Result<T, ReadError>, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            debug!(field = field, error = %e, "Unreadable attribute, using default");
            fallback
        }
    }
}

/// `PixelSpacing[0] * Rows` when both are present, else `0.0`
pub fn read_field_of_view<S>(doc: &S) -> Result<f64, ReadError>
where
    S: AttributeSource + ?Sized,
{
    match (
        doc.get_optional(Attribute::PixelSpacing),
        doc.get_optional(Attribute::Rows),
    ) {
        (Some(spacing), Some(rows)) => {
            let spacing_x = parse_float(
                Attribute::PixelSpacing,
                component(Attribute::PixelSpacing, spacing, 0)?,
            )?;
            let rows = parse_float(Attribute::Rows, rows)?;
            Ok(spacing_x * rows)
        }
        _ => Ok(0.0),
    }
}

/// Component of `ImagePositionPatient` along the normal of `plane`
///
/// Axial selects index 2, coronal 1, sagittal 0. Any other plane, or an
/// absent position, yields `fallback`.
pub fn read_image_position<S>(doc: &S, plane: PlaneLabel, fallback: f64) -> Result<f64, ReadError>
where
    S: AttributeSource + ?Sized,
{
    let index = match plane {
        PlaneLabel::Axial => 2,
        PlaneLabel::Coronal => 1,
        PlaneLabel::Sagittal => 0,
        PlaneLabel::Oblique | PlaneLabel::Unknown => return Ok(fallback),
    };

    let Some(raw) = doc.get_optional(Attribute::ImagePositionPatient) else {
        return Ok(fallback);
    };

    parse_float(
        Attribute::ImagePositionPatient,
        component(Attribute::ImagePositionPatient, raw, index)?,
    )
}

/// Parse every component of a multi-valued numeric attribute
pub fn parse_components(attribute: Attribute, raw: &str) -> Result<Vec<f64>, ReadError> {
    raw.split(VALUE_SEPARATOR)
        .map(|part| parse_float(attribute, part))
        .collect()
}

fn component(attribute: Attribute, raw: &str, index: usize) -> Result<&str, ReadError> {
    raw.split(VALUE_SEPARATOR)
        .nth(index)
        .ok_or_else(|| ReadError::MissingComponent {
            attribute: attribute.keyword().to_string(),
            index,
        })
}

fn parse_float(attribute: Attribute, raw: &str) -> Result<f64, ReadError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| malformed(attribute, raw, "float"))
}

fn malformed(attribute: Attribute, raw: &str, expected: &'static str) -> ReadError {
    ReadError::Malformed {
        attribute: attribute.keyword().to_string(),
        value: raw.to_string(),
        expected,
    }
}

fn sanitize_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '(' | ')' | ','))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extract::document::TagDocument;

    #[test]
    fn test_absent_attribute_returns_default_with_coerced_type() {
        let doc = TagDocument::new();
        assert_eq!(read_attribute(&doc, Attribute::Kvp, 0.0).unwrap(), 0.0);
        assert_eq!(read_attribute(&doc, Attribute::Rows, 7_i64).unwrap(), 7.0);
        assert!(!read_attribute(&doc, Attribute::AngioFlag, false).unwrap());
        assert_eq!(
            read_attribute(&doc, Attribute::Modality, "NA").unwrap(),
            "NA".to_string()
        );
    }

    #[test]
    fn test_int_default_coerces_to_float() {
        let doc = TagDocument::new().with(Attribute::Rows, "512");
        let rows: f64 = read_attribute(&doc, Attribute::Rows, 0_i64).unwrap();
        assert_eq!(rows, 512.0);
    }

    #[test]
    fn test_text_strips_parentheses_and_commas() {
        let doc = TagDocument::new().with(Attribute::Manufacturer, "ACME (Medical), Inc ");
        assert_eq!(
            read_attribute(&doc, Attribute::Manufacturer, "Unknown").unwrap(),
            "ACME Medical Inc"
        );
    }

    #[test]
    fn test_boolean_flags() {
        let yes = TagDocument::new().with(Attribute::AngioFlag, "Y");
        let no = TagDocument::new().with(Attribute::AngioFlag, "n");
        let bad = TagDocument::new().with(Attribute::AngioFlag, "maybe");
        assert!(read_attribute(&yes, Attribute::AngioFlag, false).unwrap());
        assert!(!read_attribute(&no, Attribute::AngioFlag, true).unwrap());
        assert!(read_attribute(&bad, Attribute::AngioFlag, false).is_err());
    }

    #[test]
    fn test_pixel_spacing_takes_first_component() {
        let doc = TagDocument::new().with(Attribute::PixelSpacing, "0.48828125\\0.5");
        assert_eq!(
            read_attribute(&doc, Attribute::PixelSpacing, 0.0).unwrap(),
            0.48828125
        );
    }

    #[test]
    fn test_malformed_number_is_an_error_and_defaults_when_absorbed() {
        let doc = TagDocument::new().with(Attribute::SliceThickness, "thick");
        let err = read_attribute(&doc, Attribute::SliceThickness, 0.0).unwrap_err();
        assert!(matches!(err, ReadError::Malformed { .. }));
        assert_eq!(read_or_default(&doc, Attribute::SliceThickness, 1.5), 1.5);
    }

    #[test]
    fn test_field_of_view() {
        let both = TagDocument::new()
            .with(Attribute::PixelSpacing, "0.5\\0.5")
            .with(Attribute::Rows, "512");
        assert_eq!(read_field_of_view(&both).unwrap(), 256.0);

        let rows_only = TagDocument::new().with(Attribute::Rows, "512");
        assert_eq!(read_field_of_view(&rows_only).unwrap(), 0.0);

        let spacing_only = TagDocument::new().with(Attribute::PixelSpacing, "0.5\\0.5");
        assert_eq!(read_field_of_view(&spacing_only).unwrap(), 0.0);
    }

    #[test]
    fn test_image_position_selected_by_plane() {
        let doc = TagDocument::new().with(Attribute::ImagePositionPatient, "-120.5\\-98.25\\42");
        assert_eq!(read_image_position(&doc, PlaneLabel::Axial, 0.0).unwrap(), 42.0);
        assert_eq!(read_image_position(&doc, PlaneLabel::Coronal, 0.0).unwrap(), -98.25);
        assert_eq!(read_image_position(&doc, PlaneLabel::Sagittal, 0.0).unwrap(), -120.5);
        assert_eq!(read_image_position(&doc, PlaneLabel::Oblique, 0.0).unwrap(), 0.0);
        assert_eq!(read_image_position(&doc, PlaneLabel::Unknown, 3.0).unwrap(), 3.0);
    }

    #[test]
    fn test_image_position_missing_component() {
        let doc = TagDocument::new().with(Attribute::ImagePositionPatient, "1.0\\2.0");
        let err = read_image_position(&doc, PlaneLabel::Axial, 0.0).unwrap_err();
        assert_eq!(
            err,
            ReadError::MissingComponent {
                attribute: "ImagePositionPatient".to_string(),
                index: 2
            }
        );
    }
}
