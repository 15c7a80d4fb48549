use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{parse_ts, DatabaseError};
use crate::models::{NewPatient, Patient};

const PATIENT_COLUMNS: &str =
    "id, name, phone, age, gender, village, district, worker_id, created_at";

/// Register a patient. Returns the new row id. Village is stored trimmed,
/// blank becomes NULL.
pub fn insert_patient(conn: &Connection, patient: &NewPatient) -> Result<i64, DatabaseError> {
    let village = patient
        .village
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty());
    conn.execute(
        "INSERT INTO patients (name, phone, age, gender, village, district, worker_id)
         VALUES (?1, ?2, ?3, ?4, ?5, COALESCE(?6, 'Dhule'), ?7)",
        params![
            patient.name,
            patient.phone,
            patient.age,
            patient.gender,
            village,
            patient.district,
            patient.worker_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1");
    conn.query_row(&sql, params![id], row_to_patient)
        .optional()
        .map_err(DatabaseError::from)
}

/// Like [`get_patient`] but a missing patient is an error.
pub fn require_patient(conn: &Connection, id: i64) -> Result<Patient, DatabaseError> {
    get_patient(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "patient".into(),
        id: id.to_string(),
    })
}

/// Patients assigned to a health worker, ordered by name.
pub fn get_patients_for_worker(
    conn: &Connection,
    worker_id: &str,
) -> Result<Vec<Patient>, DatabaseError> {
    let sql = format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE worker_id = ?1 ORDER BY name, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![worker_id], row_to_patient)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Distinct non-empty worker ids with at least one patient.
pub fn list_worker_ids(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT worker_id FROM patients
         WHERE worker_id IS NOT NULL AND worker_id != ''
         ORDER BY worker_id",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn row_to_patient(row: &rusqlite::Row) -> Result<Patient, rusqlite::Error> {
    let created: String = row.get(8)?;
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        age: row.get(3)?,
        gender: row.get(4)?,
        village: row.get(5)?,
        district: row.get(6)?,
        worker_id: row.get(7)?,
        created_at: parse_ts(8, &created)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::add_patient;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn insert_and_retrieve() {
        let conn = open_memory_database().unwrap();
        let id = add_patient(&conn, "Sita Patil", "Udane", "9800000001");
        let patient = get_patient(&conn, id).unwrap().unwrap();
        assert_eq!(patient.name, "Sita Patil");
        assert_eq!(patient.village.as_deref(), Some("Udane"));
        assert_eq!(patient.district, "Dhule");
        assert_eq!(patient.age, Some(45));
    }

    #[test]
    fn explicit_district_is_kept() {
        let conn = open_memory_database().unwrap();
        let id = insert_patient(
            &conn,
            &NewPatient {
                name: "Ravi".into(),
                district: Some("Nashik".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(get_patient(&conn, id).unwrap().unwrap().district, "Nashik");
    }

    #[test]
    fn village_is_trimmed_and_blank_is_null() {
        let conn = open_memory_database().unwrap();
        let padded = add_patient(&conn, "Sita", "  Udane ", "w1");
        let blank = add_patient(&conn, "Ravi", "   ", "w1");
        assert_eq!(get_patient(&conn, padded).unwrap().unwrap().village.as_deref(), Some("Udane"));
        assert_eq!(get_patient(&conn, blank).unwrap().unwrap().village, None);
    }

    #[test]
    fn missing_patient_is_none_or_not_found() {
        let conn = open_memory_database().unwrap();
        assert!(get_patient(&conn, 42).unwrap().is_none());
        assert!(matches!(
            require_patient(&conn, 42),
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn worker_roster_is_sorted_and_isolated() {
        let conn = open_memory_database().unwrap();
        add_patient(&conn, "Meena", "Udane", "w1");
        add_patient(&conn, "Anil", "Udane", "w1");
        add_patient(&conn, "Kavita", "Sakri", "w2");

        let roster = get_patients_for_worker(&conn, "w1").unwrap();
        let names: Vec<_> = roster.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Anil", "Meena"]);
        assert_eq!(list_worker_ids(&conn).unwrap(), vec!["w1", "w2"]);
    }
}
