use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{Feedback, Rating};

/// Insert or replace the feedback for `feedback.analysis_id`.
/// An existing row keeps its id and creation time. Returns the feedback id.
pub fn upsert_feedback(
    conn: &Connection,
    feedback: &Feedback,
    now: &NaiveDateTime,
) -> Result<Uuid, DatabaseError> {
    let analysis_id = feedback.analysis_id.to_string();
    let existing = conn.query_row(
        "SELECT id FROM feedback WHERE analysis_id = ?1",
        params![analysis_id],
        |row| row.get::<_, String>(0),
    );

    match existing {
        Ok(id) => {
            conn.execute(
                "UPDATE feedback SET rating = ?2, comment = ?3, is_helpful = ?4, updated_at = ?5
                 WHERE id = ?1",
                params![
                    id,
                    feedback.rating.value(),
                    feedback.comment,
                    feedback.is_helpful as i32,
                    format_timestamp(now),
                ],
            )?;
            parse_uuid(&id)
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            let id = Uuid::new_v4();
            let ts = format_timestamp(now);
            conn.execute(
                "INSERT INTO feedback (id, analysis_id, rating, comment, is_helpful, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    id.to_string(),
                    analysis_id,
                    feedback.rating.value(),
                    feedback.comment,
                    feedback.is_helpful as i32,
                    ts,
                ],
            )?;
            Ok(id)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn get_feedback(conn: &Connection, analysis_id: &Uuid) -> Result<Option<Feedback>, DatabaseError> {
    let result = conn.query_row(
        "SELECT analysis_id, rating, comment, is_helpful FROM feedback WHERE analysis_id = ?1",
        params![analysis_id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u8>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i32>(3)?,
            ))
        },
    );

    match result {
        Ok((id, rating, comment, is_helpful)) => Ok(Some(Feedback {
            analysis_id: parse_uuid(&id)?,
            rating: Rating::new(rating)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            comment,
            is_helpful: is_helpful != 0,
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
