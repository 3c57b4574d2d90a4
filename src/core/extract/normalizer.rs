//! Record normalization
//!
//! Turns one decoded document into a [`CanonicalRecord`], applying the
//! defaulting and derivation rules for every field. Only a missing file, a
//! decoder failure or an unparseable series date/time fails the record;
//! every other unreadable attribute falls back to its default.

use super::document::{Attribute, AttributeSource};
use super::orientation::classify_plane;
use super::reader::{
    or_default, parse_components, read_field_of_view, read_image_position, read_or_default,
};
use crate::adapters::dicom::DocumentDecoder;
use crate::domain::{CanonicalRecord, ExtractionError, PlaneLabel, UNKNOWN_ID};
use chrono::NaiveDateTime;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_SERIES_DATE: &str = "19800101";
pub const DEFAULT_SERIES_TIME: &str = "010101";
const SERIES_DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Decodes files and normalizes them into records
#[derive(Clone)]
pub struct RecordNormalizer {
    decoder: Arc<dyn DocumentDecoder>,
}

impl RecordNormalizer {
    pub fn new(decoder: Arc<dyn DocumentDecoder>) -> Self {
        Self { decoder }
    }

    /// Decode `path` and normalize it
    ///
    /// Blocking; run it on the blocking pool from async code.
    pub fn extract(&self, path: &Path) -> Result<CanonicalRecord, ExtractionError> {
        if !path.is_file() {
            return Err(ExtractionError::FileVanished(path.display().to_string()));
        }

        let document = self.decoder.decode(path)?;
        normalize_document(path, &document)
    }
}

/// Build the canonical record for an already decoded document
pub fn normalize_document<S>(path: &Path, doc: &S) -> Result<CanonicalRecord, ExtractionError>
where
    S: AttributeSource + ?Sized,
{
    let series_datetime = series_datetime(doc)?;
    let orientation_label = orientation_label(doc);
    let is_diffusion = doc.contains(Attribute::DiffusionBValue);

    let image_position = or_default(
        "image_position",
        read_image_position(doc, orientation_label, 0.0),
        0.0,
    );
    let field_of_view = or_default("field_of_view", read_field_of_view(doc), 0.0);

    Ok(CanonicalRecord {
        file_path: path.display().to_string(),
        modality: read_or_default(doc, Attribute::Modality, "NA"),
        study_instance_id: read_or_default(doc, Attribute::StudyInstanceUid, UNKNOWN_ID),
        series_instance_id: read_or_default(doc, Attribute::SeriesInstanceUid, UNKNOWN_ID),
        sop_instance_id: read_or_default(doc, Attribute::SopInstanceUid, UNKNOWN_ID),
        patient_id: read_or_default(doc, Attribute::PatientId, UNKNOWN_ID),
        series_datetime,
        orientation_label,
        image_position,
        pixel_spacing: read_or_default(doc, Attribute::PixelSpacing, 0.0),
        field_of_view,
        slice_thickness: read_or_default(doc, Attribute::SliceThickness, 0.0),
        kvp: read_or_default(doc, Attribute::Kvp, 0.0),
        exposure: read_or_default(doc, Attribute::Exposure, 0.0),
        repetition_time: read_or_default(doc, Attribute::RepetitionTime, 0.0),
        echo_time: read_or_default(doc, Attribute::EchoTime, 0.0),
        inversion_time: read_or_default(doc, Attribute::InversionTime, 0.0),
        study_description: description(doc, Attribute::StudyDescription),
        series_description: description(doc, Attribute::SeriesDescription),
        convolution_kernel: read_or_default(doc, Attribute::ConvolutionKernel, "NA"),
        receive_coil_name: read_or_default(doc, Attribute::ReceiveCoilName, "NA"),
        body_part: read_or_default(doc, Attribute::BodyPartExamined, "Unknown"),
        manufacturer: read_or_default(doc, Attribute::Manufacturer, "Unknown"),
        software_version: read_or_default(doc, Attribute::SoftwareVersions, "NA"),
        model_name: read_or_default(doc, Attribute::ManufacturerModelName, "Unknown"),
        angio_flag: read_or_default(doc, Attribute::AngioFlag, false),
        is_diffusion,
    })
}

fn series_datetime<S>(doc: &S) -> Result<NaiveDateTime, ExtractionError>
where
    S: AttributeSource + ?Sized,
{
    let date = doc
        .get_optional(Attribute::SeriesDate)
        .unwrap_or(DEFAULT_SERIES_DATE)
        .trim();
    let time = doc
        .get_optional(Attribute::SeriesTime)
        .unwrap_or(DEFAULT_SERIES_TIME)
        .trim();
    let value = format!("{date}{time}");

    let invalid = |message: &str| ExtractionError::InvalidDateTime {
        value: value.clone(),
        message: message.to_string(),
    };

    if value.len() != 14 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected YYYYMMDDHHMMSS"));
    }

    NaiveDateTime::parse_from_str(&value, SERIES_DATETIME_FORMAT)
        .map_err(|e| invalid(&e.to_string()))
}

fn orientation_label<S>(doc: &S) -> PlaneLabel
where
    S: AttributeSource + ?Sized,
{
    let Some(raw) = doc.get_optional(Attribute::ImageOrientationPatient) else {
        return PlaneLabel::Unknown;
    };

    match parse_components(Attribute::ImageOrientationPatient, raw) {
        Ok(c) if c.len() == 6 => classify_plane([c[0], c[1], c[2]], [c[3], c[4], c[5]]),
        Ok(c) => {
            debug!(components = c.len(), "ImageOrientationPatient needs 6 components");
            PlaneLabel::Unknown
        }
        Err(e) => {
            debug!(error = %e, "Unreadable ImageOrientationPatient");
            PlaneLabel::Unknown
        }
    }
}

fn description<S>(doc: &S, attribute: Attribute) -> String
where
    S: AttributeSource + ?Sized,
{
    read_or_default(doc, attribute, "NA").replace('^', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extract::document::TagDocument;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("/archive/study1/IM0001")
    }

    fn full_document() -> TagDocument {
        TagDocument::new()
            .with(Attribute::Modality, "MR")
            .with(Attribute::StudyInstanceUid, "1.2.840.1")
            .with(Attribute::SeriesInstanceUid, "1.2.840.1.2")
            .with(Attribute::SopInstanceUid, "1.2.840.1.2.3")
            .with(Attribute::PatientId, "PAT42")
            .with(Attribute::SeriesDate, "20230412")
            .with(Attribute::SeriesTime, "134501")
            .with(Attribute::ImageOrientationPatient, "1\\0\\0\\0\\1\\0")
            .with(Attribute::ImagePositionPatient, "-110\\-95.5\\33.25")
            .with(Attribute::PixelSpacing, "0.9375\\0.9375")
            .with(Attribute::Rows, "256")
            .with(Attribute::SliceThickness, "5")
            .with(Attribute::RepetitionTime, "4000")
            .with(Attribute::EchoTime, "98")
            .with(Attribute::StudyDescription, "BRAIN^ROUTINE (ADULT)")
            .with(Attribute::SeriesDescription, "AX^T2^FLAIR")
            .with(Attribute::AngioFlag, "N")
            .with(Attribute::DiffusionBValue, "1000")
    }

    #[test]
    fn test_normalizes_full_document() {
        let record = normalize_document(&path(), &full_document()).unwrap();

        assert_eq!(record.file_path, "/archive/study1/IM0001");
        assert_eq!(record.modality, "MR");
        assert_eq!(record.sop_instance_id, "1.2.840.1.2.3");
        assert_eq!(record.patient_id, "PAT42");
        assert_eq!(
            record.series_datetime,
            NaiveDate::from_ymd_opt(2023, 4, 12)
                .and_then(|d| d.and_hms_opt(13, 45, 1))
                .unwrap()
        );
        assert_eq!(record.orientation_label, PlaneLabel::Axial);
        assert_eq!(record.image_position, 33.25);
        assert_eq!(record.pixel_spacing, 0.9375);
        assert_eq!(record.field_of_view, 240.0);
        assert_eq!(record.slice_thickness, 5.0);
        assert_eq!(record.study_description, "BRAIN ROUTINE ADULT");
        assert_eq!(record.series_description, "AX T2 FLAIR");
        assert!(!record.angio_flag);
        assert!(record.is_diffusion);
    }

    #[test]
    fn test_empty_document_uses_every_default() {
        let record = normalize_document(&path(), &TagDocument::new()).unwrap();

        assert_eq!(record.modality, "NA");
        assert_eq!(record.study_instance_id, UNKNOWN_ID);
        assert_eq!(record.series_instance_id, UNKNOWN_ID);
        assert_eq!(record.sop_instance_id, UNKNOWN_ID);
        assert_eq!(record.patient_id, UNKNOWN_ID);
        assert_eq!(
            record.series_datetime,
            NaiveDate::from_ymd_opt(1980, 1, 1)
                .and_then(|d| d.and_hms_opt(1, 1, 1))
                .unwrap()
        );
        assert_eq!(record.orientation_label, PlaneLabel::Unknown);
        assert_eq!(record.image_position, 0.0);
        assert_eq!(record.pixel_spacing, 0.0);
        assert_eq!(record.field_of_view, 0.0);
        assert_eq!(record.kvp, 0.0);
        assert_eq!(record.study_description, "NA");
        assert_eq!(record.body_part, "Unknown");
        assert_eq!(record.manufacturer, "Unknown");
        assert_eq!(record.model_name, "Unknown");
        assert_eq!(record.software_version, "NA");
        assert!(!record.angio_flag);
        assert!(!record.is_diffusion);
    }

    #[test]
    fn test_malformed_series_date_fails_record() {
        let doc = full_document().with(Attribute::SeriesDate, "2023-04-12");
        let err = normalize_document(&path(), &doc).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidDateTime { .. }));
    }

    #[test]
    fn test_fractional_series_time_fails_record() {
        let doc = full_document().with(Attribute::SeriesTime, "134501.123");
        assert!(normalize_document(&path(), &doc).is_err());
    }

    #[test]
    fn test_impossible_calendar_date_fails_record() {
        let doc = full_document().with(Attribute::SeriesDate, "20231341");
        assert!(normalize_document(&path(), &doc).is_err());
    }

    #[test]
    fn test_malformed_single_attribute_degrades_to_default() {
        let doc = full_document()
            .with(Attribute::SliceThickness, "n/a")
            .with(Attribute::PixelSpacing, "abc\\def");
        let record = normalize_document(&path(), &doc).unwrap();
        assert_eq!(record.slice_thickness, 0.0);
        assert_eq!(record.pixel_spacing, 0.0);
        assert_eq!(record.field_of_view, 0.0);
    }

    #[test]
    fn test_oblique_orientation_has_no_position() {
        let doc = full_document().with(
            Attribute::ImageOrientationPatient,
            "0.7\\0.7\\0\\0\\0.7\\0.7",
        );
        let record = normalize_document(&path(), &doc).unwrap();
        assert_eq!(record.orientation_label, PlaneLabel::Oblique);
        assert_eq!(record.image_position, 0.0);
    }

    #[test]
    fn test_sagittal_selects_x_position() {
        let doc = full_document().with(Attribute::ImageOrientationPatient, "0\\1\\0\\0\\0\\-1");
        let record = normalize_document(&path(), &doc).unwrap();
        assert_eq!(record.orientation_label, PlaneLabel::Sagittal);
        assert_eq!(record.image_position, -110.0);
    }

    #[test]
    fn test_short_orientation_is_unknown() {
        let doc = full_document().with(Attribute::ImageOrientationPatient, "1\\0\\0");
        let record = normalize_document(&path(), &doc).unwrap();
        assert_eq!(record.orientation_label, PlaneLabel::Unknown);
        assert_eq!(record.image_position, 0.0);
    }

    #[test]
    fn test_extract_reports_vanished_file() {
        struct NeverDecoder;
        impl DocumentDecoder for NeverDecoder {
            fn decode(&self, _path: &Path) -> Result<TagDocument, ExtractionError> {
                panic!("decode must not be reached for a missing file");
            }
        }

        let normalizer = RecordNormalizer::new(Arc::new(NeverDecoder));
        let err = normalizer
            .extract(Path::new("/definitely/not/here.dcm"))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::FileVanished(_)));
    }
}
