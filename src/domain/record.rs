//! Canonical record model
//!
//! One [`CanonicalRecord`] is produced per successfully decoded DICOM file.
//! Field names are the persisted column/field names in every backend.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Placeholder used for identifiers that are absent from the source file
pub const UNKNOWN_ID: &str = "NotKnown";

/// Anatomical plane derived from the image orientation cosines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaneLabel {
    #[serde(rename = "AXL")]
    Axial,
    #[serde(rename = "COR")]
    Coronal,
    #[serde(rename = "SAG")]
    Sagittal,
    #[serde(rename = "OBL")]
    Oblique,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl PlaneLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaneLabel::Axial => "AXL",
            PlaneLabel::Coronal => "COR",
            PlaneLabel::Sagittal => "SAG",
            PlaneLabel::Oblique => "OBL",
            PlaneLabel::Unknown => "Unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "AXL" => Some(PlaneLabel::Axial),
            "COR" => Some(PlaneLabel::Coronal),
            "SAG" => Some(PlaneLabel::Sagittal),
            "OBL" => Some(PlaneLabel::Oblique),
            "Unknown" => Some(PlaneLabel::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for PlaneLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized descriptive attributes of one image instance
///
/// Built once by the normalizer and never mutated afterwards.
/// `sop_instance_id` is the deduplication key in every store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub file_path: String,
    pub modality: String,
    pub study_instance_id: String,
    pub series_instance_id: String,
    pub sop_instance_id: String,
    pub patient_id: String,

    #[serde(with = "series_datetime_format")]
    pub series_datetime: NaiveDateTime,

    pub orientation_label: PlaneLabel,
    pub image_position: f64,
    pub pixel_spacing: f64,
    pub field_of_view: f64,

    pub slice_thickness: f64,
    pub kvp: f64,
    pub exposure: f64,
    pub repetition_time: f64,
    pub echo_time: f64,
    pub inversion_time: f64,

    pub study_description: String,
    pub series_description: String,
    pub convolution_kernel: String,
    pub receive_coil_name: String,
    pub body_part: String,
    pub manufacturer: String,
    pub software_version: String,
    pub model_name: String,

    pub angio_flag: bool,
    pub is_diffusion: bool,
}

impl CanonicalRecord {
    /// Whether this record carries a real SOP instance id
    ///
    /// Records without one are never deduplicated.
    pub fn has_instance_id(&self) -> bool {
        self.sop_instance_id != UNKNOWN_ID
    }

    /// Typed value of a catalog field, used for in-process filtering
    pub fn field_value(&self, field: RecordField) -> FieldValue {
        use RecordField as F;
        let text = |s: &str| FieldValue::Text(s.to_string());
        match field {
            F::FilePath => text(&self.file_path),
            F::Modality => text(&self.modality),
            F::StudyInstanceId => text(&self.study_instance_id),
            F::SeriesInstanceId => text(&self.series_instance_id),
            F::SopInstanceId => text(&self.sop_instance_id),
            F::PatientId => text(&self.patient_id),
            F::SeriesDatetime => FieldValue::Timestamp(self.series_datetime),
            F::OrientationLabel => text(self.orientation_label.as_str()),
            F::ImagePosition => FieldValue::Number(self.image_position),
            F::PixelSpacing => FieldValue::Number(self.pixel_spacing),
            F::FieldOfView => FieldValue::Number(self.field_of_view),
            F::SliceThickness => FieldValue::Number(self.slice_thickness),
            F::Kvp => FieldValue::Number(self.kvp),
            F::Exposure => FieldValue::Number(self.exposure),
            F::RepetitionTime => FieldValue::Number(self.repetition_time),
            F::EchoTime => FieldValue::Number(self.echo_time),
            F::InversionTime => FieldValue::Number(self.inversion_time),
            F::StudyDescription => text(&self.study_description),
            F::SeriesDescription => text(&self.series_description),
            F::ConvolutionKernel => text(&self.convolution_kernel),
            F::ReceiveCoilName => text(&self.receive_coil_name),
            F::BodyPart => text(&self.body_part),
            F::Manufacturer => text(&self.manufacturer),
            F::SoftwareVersion => text(&self.software_version),
            F::ModelName => text(&self.model_name),
            F::AngioFlag => FieldValue::Boolean(self.angio_flag),
            F::IsDiffusion => FieldValue::Boolean(self.is_diffusion),
        }
    }
}

/// A record as returned by a store, with the backend's own key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    #[serde(flatten)]
    pub record: CanonicalRecord,
}

/// Storage type of a catalog field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Timestamp,
}

/// Catalog of persisted fields
///
/// Drives schema provisioning and search-filter validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    FilePath,
    Modality,
    StudyInstanceId,
    SeriesInstanceId,
    SopInstanceId,
    PatientId,
    SeriesDatetime,
    OrientationLabel,
    ImagePosition,
    PixelSpacing,
    FieldOfView,
    SliceThickness,
    Kvp,
    Exposure,
    RepetitionTime,
    EchoTime,
    InversionTime,
    StudyDescription,
    SeriesDescription,
    ConvolutionKernel,
    ReceiveCoilName,
    BodyPart,
    Manufacturer,
    SoftwareVersion,
    ModelName,
    AngioFlag,
    IsDiffusion,
}

impl RecordField {
    pub const ALL: [RecordField; 27] = [
        RecordField::FilePath,
        RecordField::Modality,
        RecordField::StudyInstanceId,
        RecordField::SeriesInstanceId,
        RecordField::SopInstanceId,
        RecordField::PatientId,
        RecordField::SeriesDatetime,
        RecordField::OrientationLabel,
        RecordField::ImagePosition,
        RecordField::PixelSpacing,
        RecordField::FieldOfView,
        RecordField::SliceThickness,
        RecordField::Kvp,
        RecordField::Exposure,
        RecordField::RepetitionTime,
        RecordField::EchoTime,
        RecordField::InversionTime,
        RecordField::StudyDescription,
        RecordField::SeriesDescription,
        RecordField::ConvolutionKernel,
        RecordField::ReceiveCoilName,
        RecordField::BodyPart,
        RecordField::Manufacturer,
        RecordField::SoftwareVersion,
        RecordField::ModelName,
        RecordField::AngioFlag,
        RecordField::IsDiffusion,
    ];

    /// Persisted field name
    pub fn name(&self) -> &'static str {
        match self {
            RecordField::FilePath => "file_path",
            RecordField::Modality => "modality",
            RecordField::StudyInstanceId => "study_instance_id",
            RecordField::SeriesInstanceId => "series_instance_id",
            RecordField::SopInstanceId => "sop_instance_id",
            RecordField::PatientId => "patient_id",
            RecordField::SeriesDatetime => "series_datetime",
            RecordField::OrientationLabel => "orientation_label",
            RecordField::ImagePosition => "image_position",
            RecordField::PixelSpacing => "pixel_spacing",
            RecordField::FieldOfView => "field_of_view",
            RecordField::SliceThickness => "slice_thickness",
            RecordField::Kvp => "kvp",
            RecordField::Exposure => "exposure",
            RecordField::RepetitionTime => "repetition_time",
            RecordField::EchoTime => "echo_time",
            RecordField::InversionTime => "inversion_time",
            RecordField::StudyDescription => "study_description",
            RecordField::SeriesDescription => "series_description",
            RecordField::ConvolutionKernel => "convolution_kernel",
            RecordField::ReceiveCoilName => "receive_coil_name",
            RecordField::BodyPart => "body_part",
            RecordField::Manufacturer => "manufacturer",
            RecordField::SoftwareVersion => "software_version",
            RecordField::ModelName => "model_name",
            RecordField::AngioFlag => "angio_flag",
            RecordField::IsDiffusion => "is_diffusion",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            RecordField::SeriesDatetime => FieldKind::Timestamp,
            RecordField::ImagePosition
            | RecordField::PixelSpacing
            | RecordField::FieldOfView
            | RecordField::SliceThickness
            | RecordField::Kvp
            | RecordField::Exposure
            | RecordField::RepetitionTime
            | RecordField::EchoTime
            | RecordField::InversionTime => FieldKind::Number,
            RecordField::AngioFlag | RecordField::IsDiffusion => FieldKind::Boolean,
            _ => FieldKind::Text,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

/// Typed field value for comparisons
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a.partial_cmp(b),
            (FieldValue::Number(a), FieldValue::Number(b)) => a.partial_cmp(b),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a.partial_cmp(b),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Serde format for `series_datetime`
///
/// Written as `YYYY-MM-DD HH:MM:SS`. Reads also accept the ISO `T` separator
/// and PocketBase's `YYYY-MM-DD HH:MM:SS.fffZ` form.
pub mod series_datetime_format {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    const ACCEPTED: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("unrecognized series_datetime '{raw}'"))
        })
    }

    /// Parse any accepted representation
    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        ACCEPTED
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn sample_record(sop: &str) -> CanonicalRecord {
        CanonicalRecord {
            file_path: format!("/data/{sop}.dcm"),
            modality: "MR".to_string(),
            study_instance_id: "1.2.3".to_string(),
            series_instance_id: "1.2.3.4".to_string(),
            sop_instance_id: sop.to_string(),
            patient_id: "PAT-001".to_string(),
            series_datetime: NaiveDate::from_ymd_opt(2021, 3, 14)
                .and_then(|d| d.and_hms_opt(9, 26, 53))
                .unwrap(),
            orientation_label: PlaneLabel::Axial,
            image_position: -42.5,
            pixel_spacing: 0.5,
            field_of_view: 256.0,
            slice_thickness: 3.0,
            kvp: 0.0,
            exposure: 0.0,
            repetition_time: 2000.0,
            echo_time: 90.0,
            inversion_time: 0.0,
            study_description: "BRAIN WO".to_string(),
            series_description: "AX T2".to_string(),
            convolution_kernel: "NA".to_string(),
            receive_coil_name: "HEAD 32".to_string(),
            body_part: "HEAD".to_string(),
            manufacturer: "ACME".to_string(),
            software_version: "NA".to_string(),
            model_name: "Unknown".to_string(),
            angio_flag: false,
            is_diffusion: false,
        }
    }

    #[test]
    fn test_plane_label_serializes_short_codes() {
        assert_eq!(serde_json::to_string(&PlaneLabel::Axial).unwrap(), "\"AXL\"");
        assert_eq!(
            serde_json::to_string(&PlaneLabel::Unknown).unwrap(),
            "\"Unknown\""
        );
        assert_eq!(PlaneLabel::parse("SAG"), Some(PlaneLabel::Sagittal));
        assert_eq!(PlaneLabel::parse("axl"), None);
    }

    #[test]
    fn test_record_serializes_flat_with_persisted_names() {
        let value = serde_json::to_value(sample_record("1.2.3.4.5")).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), RecordField::ALL.len());
        for field in RecordField::ALL {
            assert!(obj.contains_key(field.name()), "missing {}", field.name());
        }
        assert_eq!(obj["series_datetime"], "2021-03-14 09:26:53");
        assert_eq!(obj["orientation_label"], "AXL");
    }

    #[test]
    fn test_stored_record_flattens_id() {
        let stored = StoredRecord {
            id: "abc".to_string(),
            record: sample_record("9.9"),
        };
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(value["sop_instance_id"], "9.9");
    }

    #[test]
    fn test_series_datetime_accepts_pocketbase_format() {
        let parsed = series_datetime_format::parse("2021-03-14 09:26:53.000Z").unwrap();
        assert_eq!(parsed, sample_record("x").series_datetime);
        assert!(series_datetime_format::parse("2021-03-14T09:26:53").is_some());
        assert!(series_datetime_format::parse("20210314").is_none());
    }

    #[test]
    fn test_field_catalog_lookup() {
        assert_eq!(RecordField::from_name("kvp"), Some(RecordField::Kvp));
        assert_eq!(RecordField::Kvp.kind(), FieldKind::Number);
        assert_eq!(
            RecordField::SeriesDatetime.kind(),
            FieldKind::Timestamp
        );
        assert_eq!(RecordField::IsDiffusion.kind(), FieldKind::Boolean);
        assert_eq!(RecordField::from_name("nope"), None);
    }

    #[test]
    fn test_unknown_instance_id() {
        assert!(sample_record("1.2").has_instance_id());
        assert!(!sample_record(UNKNOWN_ID).has_instance_id());
    }
}
