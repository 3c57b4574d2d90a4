//! SQL construction and row mapping for the `dicom_records` table
//!
//! Column names come from the [`RecordField`] catalog, so search filters can
//! only reference real columns.

use crate::adapters::database::query::SearchQuery;
use crate::domain::{
    CanonicalRecord, FieldValue, IndexerError, PlaneLabel, RecordField, Result, StoredRecord,
};
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;

pub const TABLE_NAME: &str = "dicom_records";

/// Comma separated column list in catalog order
pub fn column_list() -> String {
    RecordField::ALL
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Plain insert returning the new id
pub fn insert_sql() -> String {
    format!(
        "INSERT INTO {TABLE_NAME} ({}) VALUES ({}) RETURNING id",
        column_list(),
        placeholders(RecordField::ALL.len())
    )
}

/// Overwrite every catalog column of the row with id `$N+1`
pub fn update_sql() -> String {
    let assignments = RecordField::ALL
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{} = ${}", f.name(), i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {TABLE_NAME} SET {assignments}, updated_at = NOW() WHERE id = ${}",
        RecordField::ALL.len() + 1
    )
}

/// Single-statement upsert against the partial unique index
///
/// Returns one row with `inserted` when a row was written; with
/// `overwrite = false` a conflicting row yields no result.
pub fn upsert_sql(overwrite: bool) -> String {
    let conflict_action = if overwrite {
        let assignments = RecordField::ALL
            .iter()
            .filter(|f| **f != RecordField::SopInstanceId)
            .map(|f| format!("{0} = EXCLUDED.{0}", f.name()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("DO UPDATE SET {assignments}, updated_at = NOW()")
    } else {
        "DO NOTHING".to_string()
    };

    format!(
        "INSERT INTO {TABLE_NAME} ({}) VALUES ({}) \
         ON CONFLICT (sop_instance_id) WHERE sop_instance_id <> 'NotKnown' {conflict_action} \
         RETURNING (xmax = 0) AS inserted",
        column_list(),
        placeholders(RecordField::ALL.len())
    )
}

pub fn find_by_instance_id_sql() -> String {
    format!(
        "SELECT id, {} FROM {TABLE_NAME} WHERE sop_instance_id = $1 ORDER BY id LIMIT 1",
        column_list()
    )
}

/// Search statement and its owned parameters
pub fn search_sql(query: &SearchQuery) -> (String, Vec<Box<dyn ToSql + Sync + Send>>) {
    let mut params: Vec<Box<dyn ToSql + Sync + Send>> = Vec::new();
    let mut clauses = Vec::new();

    for condition in query.conditions() {
        let param: Box<dyn ToSql + Sync + Send> = match &condition.value {
            FieldValue::Text(v) => Box::new(v.clone()),
            FieldValue::Number(v) => Box::new(*v),
            FieldValue::Boolean(v) => Box::new(*v),
            FieldValue::Timestamp(v) => Box::new(*v),
        };
        params.push(param);
        clauses.push(format!(
            "{} {} ${}",
            condition.field.name(),
            condition.comparison.sql(),
            params.len()
        ));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let sql = format!(
        "SELECT id, {} FROM {TABLE_NAME}{where_clause} ORDER BY id LIMIT {}",
        column_list(),
        query.limit()
    );
    (sql, params)
}

/// Borrowed statement parameters for one record, in catalog order
pub struct RecordParams<'a> {
    record: &'a CanonicalRecord,
    orientation_label: &'static str,
}

impl<'a> RecordParams<'a> {
    pub fn new(record: &'a CanonicalRecord) -> Self {
        Self {
            record,
            orientation_label: record.orientation_label.as_str(),
        }
    }

    pub fn as_params(&self) -> Vec<&(dyn ToSql + Sync)> {
        let r = self.record;
        vec![
            &r.file_path as &(dyn ToSql + Sync),
            &r.modality,
            &r.study_instance_id,
            &r.series_instance_id,
            &r.sop_instance_id,
            &r.patient_id,
            &r.series_datetime,
            &self.orientation_label,
            &r.image_position,
            &r.pixel_spacing,
            &r.field_of_view,
            &r.slice_thickness,
            &r.kvp,
            &r.exposure,
            &r.repetition_time,
            &r.echo_time,
            &r.inversion_time,
            &r.study_description,
            &r.series_description,
            &r.convolution_kernel,
            &r.receive_coil_name,
            &r.body_part,
            &r.manufacturer,
            &r.software_version,
            &r.model_name,
            &r.angio_flag,
            &r.is_diffusion,
        ]
    }
}

/// Map a `SELECT id, <columns>` row back into a stored record
pub fn row_to_stored(row: &Row) -> Result<StoredRecord> {
    let get_err = |e: tokio_postgres::Error| IndexerError::Database(format!("Bad row: {e}"));

    let id: i64 = row.try_get("id").map_err(get_err)?;
    let label: String = row.try_get("orientation_label").map_err(get_err)?;
    let orientation_label = PlaneLabel::parse(&label).ok_or_else(|| {
        IndexerError::Database(format!("Unexpected orientation_label '{label}' in row {id}"))
    })?;

    let record = CanonicalRecord {
        file_path: row.try_get("file_path").map_err(get_err)?,
        modality: row.try_get("modality").map_err(get_err)?,
        study_instance_id: row.try_get("study_instance_id").map_err(get_err)?,
        series_instance_id: row.try_get("series_instance_id").map_err(get_err)?,
        sop_instance_id: row.try_get("sop_instance_id").map_err(get_err)?,
        patient_id: row.try_get("patient_id").map_err(get_err)?,
        series_datetime: row.try_get("series_datetime").map_err(get_err)?,
        orientation_label,
        image_position: row.try_get("image_position").map_err(get_err)?,
        pixel_spacing: row.try_get("pixel_spacing").map_err(get_err)?,
        field_of_view: row.try_get("field_of_view").map_err(get_err)?,
        slice_thickness: row.try_get("slice_thickness").map_err(get_err)?,
        kvp: row.try_get("kvp").map_err(get_err)?,
        exposure: row.try_get("exposure").map_err(get_err)?,
        repetition_time: row.try_get("repetition_time").map_err(get_err)?,
        echo_time: row.try_get("echo_time").map_err(get_err)?,
        inversion_time: row.try_get("inversion_time").map_err(get_err)?,
        study_description: row.try_get("study_description").map_err(get_err)?,
        series_description: row.try_get("series_description").map_err(get_err)?,
        convolution_kernel: row.try_get("convolution_kernel").map_err(get_err)?,
        receive_coil_name: row.try_get("receive_coil_name").map_err(get_err)?,
        body_part: row.try_get("body_part").map_err(get_err)?,
        manufacturer: row.try_get("manufacturer").map_err(get_err)?,
        software_version: row.try_get("software_version").map_err(get_err)?,
        model_name: row.try_get("model_name").map_err(get_err)?,
        angio_flag: row.try_get("angio_flag").map_err(get_err)?,
        is_diffusion: row.try_get("is_diffusion").map_err(get_err)?,
    };

    Ok(StoredRecord {
        id: id.to_string(),
        record,
    })
}
