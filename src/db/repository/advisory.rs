use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use crate::db::{format_ts, parse_ts, DatabaseError};
use crate::models::{Advisory, NewAdvisory};

/// Insert an advisory unless one for the same village (case-insensitive)
/// was sent at or after `window_start`. Single statement; returns `None`
/// when suppressed.
pub fn insert_advisory_if_absent(
    conn: &Connection,
    advisory: &NewAdvisory,
    now: &NaiveDateTime,
    window_start: &NaiveDateTime,
) -> Result<Option<i64>, DatabaseError> {
    let inserted = conn.execute(
        "INSERT INTO ministry_advisories
         (title, message, village, district, urgency, case_count, sent_at)
         SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7
         WHERE NOT EXISTS (
             SELECT 1 FROM ministry_advisories
             WHERE village = ?3 COLLATE NOCASE AND sent_at >= ?8
         )",
        params![
            advisory.title,
            advisory.message,
            advisory.village,
            advisory.district,
            advisory.urgency,
            advisory.case_count,
            format_ts(now),
            format_ts(window_start),
        ],
    )?;
    if inserted == 0 {
        Ok(None)
    } else {
        Ok(Some(conn.last_insert_rowid()))
    }
}

/// Advisories for a village, newest first.
pub fn get_advisories_for_village(
    conn: &Connection,
    village: &str,
) -> Result<Vec<Advisory>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, title, message, village, district, urgency, case_count, sent_at
         FROM ministry_advisories
         WHERE village = ?1 COLLATE NOCASE
         ORDER BY sent_at DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![village], |row| {
        let sent: String = row.get(7)?;
        Ok(Advisory {
            id: row.get(0)?,
            title: row.get(1)?,
            message: row.get(2)?,
            village: row.get(3)?,
            district: row.get(4)?,
            urgency: row.get(5)?,
            case_count: row.get(6)?,
            sent_at: parse_ts(7, &sent)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::ts;
    use crate::db::sqlite::open_memory_database;

    fn advisory(village: &str, count: i64) -> NewAdvisory {
        NewAdvisory {
            title: format!("Outbreak Alert: {village}"),
            message: format!("{count} recent triage reports in {village}"),
            village: village.into(),
            district: "Dhule".into(),
            urgency: "High".into(),
            case_count: count,
        }
    }

    #[test]
    fn one_advisory_per_village_per_window() {
        let conn = open_memory_database().unwrap();
        let now = ts("2026-03-06 10:00:00");
        let since = ts("2026-03-05 10:00:00");
        assert!(insert_advisory_if_absent(&conn, &advisory("Udane", 3), &now, &since).unwrap().is_some());

        let later = ts("2026-03-06 18:00:00");
        let later_since = ts("2026-03-05 18:00:00");
        assert!(insert_advisory_if_absent(&conn, &advisory("UDANE", 5), &later, &later_since).unwrap().is_none());
        assert!(insert_advisory_if_absent(&conn, &advisory("Sakri", 3), &later, &later_since).unwrap().is_some());

        let udane = get_advisories_for_village(&conn, "udane").unwrap();
        assert_eq!(udane.len(), 1);
        assert_eq!(udane[0].case_count, 3);
    }

    #[test]
    fn advisory_after_cooldown_is_created() {
        let conn = open_memory_database().unwrap();
        insert_advisory_if_absent(&conn, &advisory("Udane", 3), &ts("2026-03-01 10:00:00"), &ts("2026-02-28 10:00:00")).unwrap();
        let next = insert_advisory_if_absent(&conn, &advisory("Udane", 4), &ts("2026-03-03 10:00:00"), &ts("2026-03-02 10:00:00")).unwrap();
        assert!(next.is_some());
        assert_eq!(get_advisories_for_village(&conn, "Udane").unwrap()[0].case_count, 4);
    }
}
