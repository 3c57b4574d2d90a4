//! Decoded document abstraction
//!
//! The external decoder is reduced to a keyword-to-string lookup. Multi-valued
//! attributes keep DICOM's backslash separator (`"0.5\\0.5"`).

use std::collections::BTreeMap;

/// DICOM attributes consumed by the normalizer, by standard keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Modality,
    StudyInstanceUid,
    SeriesInstanceUid,
    SopInstanceUid,
    PatientId,
    SeriesDate,
    SeriesTime,
    ImageOrientationPatient,
    ImagePositionPatient,
    PixelSpacing,
    Rows,
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
    BodyPartExamined,
    Manufacturer,
    SoftwareVersions,
    ManufacturerModelName,
    AngioFlag,
    DiffusionBValue,
}

impl Attribute {
    pub const ALL: [Attribute; 27] = [
        Attribute::Modality,
        Attribute::StudyInstanceUid,
        Attribute::SeriesInstanceUid,
        Attribute::SopInstanceUid,
        Attribute::PatientId,
        Attribute::SeriesDate,
        Attribute::SeriesTime,
        Attribute::ImageOrientationPatient,
        Attribute::ImagePositionPatient,
        Attribute::PixelSpacing,
        Attribute::Rows,
        Attribute::SliceThickness,
        Attribute::Kvp,
        Attribute::Exposure,
        Attribute::RepetitionTime,
        Attribute::EchoTime,
        Attribute::InversionTime,
        Attribute::StudyDescription,
        Attribute::SeriesDescription,
        Attribute::ConvolutionKernel,
        Attribute::ReceiveCoilName,
        Attribute::BodyPartExamined,
        Attribute::Manufacturer,
        Attribute::SoftwareVersions,
        Attribute::ManufacturerModelName,
        Attribute::AngioFlag,
        Attribute::DiffusionBValue,
    ];

    /// Standard DICOM data dictionary keyword
    pub fn keyword(&self) -> &'static str {
        match self {
            Attribute::Modality => "Modality",
            Attribute::StudyInstanceUid => "StudyInstanceUID",
            Attribute::SeriesInstanceUid => "SeriesInstanceUID",
            Attribute::SopInstanceUid => "SOPInstanceUID",
            Attribute::PatientId => "PatientID",
            Attribute::SeriesDate => "SeriesDate",
            Attribute::SeriesTime => "SeriesTime",
            Attribute::ImageOrientationPatient => "ImageOrientationPatient",
            Attribute::ImagePositionPatient => "ImagePositionPatient",
            Attribute::PixelSpacing => "PixelSpacing",
            Attribute::Rows => "Rows",
            Attribute::SliceThickness => "SliceThickness",
            Attribute::Kvp => "KVP",
            Attribute::Exposure => "Exposure",
            Attribute::RepetitionTime => "RepetitionTime",
            Attribute::EchoTime => "EchoTime",
            Attribute::InversionTime => "InversionTime",
            Attribute::StudyDescription => "StudyDescription",
            Attribute::SeriesDescription => "SeriesDescription",
            Attribute::ConvolutionKernel => "ConvolutionKernel",
            Attribute::ReceiveCoilName => "ReceiveCoilName",
            Attribute::BodyPartExamined => "BodyPartExamined",
            Attribute::Manufacturer => "Manufacturer",
            Attribute::SoftwareVersions => "SoftwareVersions",
            Attribute::ManufacturerModelName => "ManufacturerModelName",
            Attribute::AngioFlag => "AngioFlag",
            Attribute::DiffusionBValue => "DiffusionBValue",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.keyword() == keyword)
    }
}

/// Named-attribute lookup over a decoded document
pub trait AttributeSource {
    /// Raw string value of the attribute, or `None` when absent
    fn get_optional(&self, attribute: Attribute) -> Option<&str>;

    fn contains(&self, attribute: Attribute) -> bool {
        self.get_optional(attribute).is_some()
    }
}

/// Owned snapshot of the attributes read from one file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagDocument {
    values: BTreeMap<Attribute, String>,
}

impl TagDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, attribute: Attribute, value: impl Into<String>) {
        self.values.insert(attribute, value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, attribute: Attribute, value: impl Into<String>) -> Self {
        self.insert(attribute, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl AttributeSource for TagDocument {
    fn get_optional(&self, attribute: Attribute) -> Option<&str> {
        self.values.get(&attribute).map(String::as_str)
    }
}

// Ord is needed for BTreeMap keys; keyword order keeps Debug output stable.
impl PartialOrd for Attribute {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Attribute {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.keyword().cmp(other.keyword())
    }
}
