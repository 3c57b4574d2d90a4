//! DICOM file decoding
//!
//! The normalizer only sees a [`TagDocument`]; this module is the one place
//! that knows how to read a Part 10 file.

use crate::core::extract::{Attribute, TagDocument};
use crate::domain::ExtractionError;
use std::path::Path;
use tracing::debug;

/// Turns a file into the attributes the normalizer reads
pub trait DocumentDecoder: Send + Sync {
    /// Decode `path`
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Decode`] when the file is not a readable
    /// DICOM object.
    fn decode(&self, path: &Path) -> Result<TagDocument, ExtractionError>;
}

/// Decoder backed by `dicom-object`
///
/// Pixel data is parsed along with the header; only the catalog attributes
/// are kept in the returned document.
#[derive(Debug, Clone, Copy, Default)]
pub struct DicomFileDecoder;

impl DicomFileDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentDecoder for DicomFileDecoder {
    fn decode(&self, path: &Path) -> Result<TagDocument, ExtractionError> {
        let object = dicom_object::open_file(path).map_err(|e| ExtractionError::Decode {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut document = TagDocument::new();
        for attribute in Attribute::ALL {
            let element = match object.element_by_name_opt(attribute.keyword()) {
                Ok(Some(element)) => element,
                Ok(None) => continue,
                Err(e) => {
                    debug!(
                        path = %path.display(),
                        attribute = attribute.keyword(),
                        error = %e,
                        "Attribute lookup failed"
                    );
                    continue;
                }
            };

            match element.to_str() {
                Ok(value) => document.insert(attribute, value.trim_end_matches('\0').to_string()),
                Err(e) => debug!(
                    path = %path.display(),
                    attribute = attribute.keyword(),
                    error = %e,
                    "Attribute value is not textual"
                ),
            }
        }

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extract::{normalize_document, AttributeSource};
    use crate::domain::PlaneLabel;
    use dicom_core::{dicom_value, DataElement, PrimitiveValue, Tag, VR};
    use dicom_object::{FileMetaTableBuilder, InMemDicomObject};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
    const MR_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.4";

    fn write_mr_instance(path: &Path) {
        let mut obj = InMemDicomObject::new_empty();
        obj.put(DataElement::new(Tag(0x0008, 0x0060), VR::CS, PrimitiveValue::from("MR")));
        obj.put(DataElement::new(
            Tag(0x0008, 0x0018),
            VR::UI,
            PrimitiveValue::from("1.2.3.4\0"),
        ));
        obj.put(DataElement::new(Tag(0x0008, 0x0021), VR::DA, PrimitiveValue::from("20210314")));
        obj.put(DataElement::new(Tag(0x0008, 0x0031), VR::TM, PrimitiveValue::from("092653")));
        obj.put(DataElement::new(
            Tag(0x0020, 0x0037),
            VR::DS,
            dicom_value!(Strs, ["1", "0", "0", "0", "1", "0"]),
        ));
        obj.put(DataElement::new(
            Tag(0x0020, 0x0032),
            VR::DS,
            dicom_value!(Strs, ["-120.5", "-98.2", "42.0"]),
        ));
        obj.put(DataElement::new(
            Tag(0x0028, 0x0030),
            VR::DS,
            dicom_value!(Strs, ["0.5", "0.5"]),
        ));
        obj.put(DataElement::new(Tag(0x0028, 0x0010), VR::US, PrimitiveValue::from(512_u16)));
        obj.put(DataElement::new(
            Tag(0x0018, 0x9087),
            VR::FD,
            PrimitiveValue::from(1000.0_f64),
        ));

        let file = obj
            .with_meta(
                FileMetaTableBuilder::new()
                    .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN)
                    .media_storage_sop_class_uid(MR_IMAGE_STORAGE)
                    .media_storage_sop_instance_uid("1.2.3.4"),
            )
            .unwrap();
        file.write_to_file(path).unwrap();
    }

    #[test]
    fn test_decodes_part10_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("IM0001.dcm");
        write_mr_instance(&path);

        let doc = DicomFileDecoder::new().decode(&path).unwrap();

        assert_eq!(doc.get_optional(Attribute::Modality), Some("MR"));
        assert_eq!(doc.get_optional(Attribute::SopInstanceUid), Some("1.2.3.4"));
        assert_eq!(doc.get_optional(Attribute::PixelSpacing), Some("0.5\\0.5"));
        assert_eq!(doc.get_optional(Attribute::Rows), Some("512"));
        assert_eq!(doc.get_optional(Attribute::DiffusionBValue), Some("1000"));
        assert_eq!(doc.get_optional(Attribute::PatientId), None);

        let record = normalize_document(&path, &doc).unwrap();
        assert_eq!(record.sop_instance_id, "1.2.3.4");
        assert_eq!(record.orientation_label, PlaneLabel::Axial);
        assert_eq!(record.field_of_view, 256.0);
        assert_eq!(record.image_position, 42.0);
        assert_eq!(record.pixel_spacing, 0.5);
        assert!(record.is_diffusion);
        assert_eq!(
            record.series_datetime.format("%Y%m%d%H%M%S").to_string(),
            "20210314092653"
        );
    }

    #[test]
    fn test_non_dicom_file_is_decode_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "definitely not a DICOM file").unwrap();

        let result = DicomFileDecoder::new().decode(file.path());
        match result {
            Err(ExtractionError::Decode { path, message }) => {
                assert_eq!(path, file.path().display().to_string());
                assert!(!message.is_empty());
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = DicomFileDecoder::new().decode(&dir.path().join("gone.dcm"));
        assert!(matches!(result, Err(ExtractionError::Decode { .. })));
    }
}
