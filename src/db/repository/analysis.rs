use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

const ANALYSIS_COLUMNS: &str = "id, modality, input_text, medications, findings, safety_score,
     recommendation, narrative_source, narrative_model, created_at, is_favorite, notes";

pub fn insert_analysis(
    conn: &Connection,
    id: &Uuid,
    created_at: &NaiveDateTime,
    result: &AnalysisResult,
) -> Result<(), DatabaseError> {
    let narrative = result.narrative();
    conn.execute(
        "INSERT INTO analyses (id, modality, input_text, medications, findings, safety_score,
         recommendation, narrative_source, narrative_model, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id.to_string(),
            result.modality().as_str(),
            result.input_text(),
            serde_json::to_string(result.medications())?,
            serde_json::to_string(result.findings())?,
            result.safety_score(),
            narrative.text,
            narrative.source.as_str(),
            narrative.model,
            format_timestamp(created_at),
        ],
    )?;
    Ok(())
}

pub fn get_analysis(conn: &Connection, id: &Uuid) -> Result<Option<StoredAnalysis>, DatabaseError> {
    let result = conn.query_row(
        &format!("SELECT {ANALYSIS_COLUMNS} FROM analyses WHERE id = ?1"),
        params![id.to_string()],
        analysis_row_from_rusqlite,
    );

    match result {
        Ok(row) => Ok(Some(analysis_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Analyses matching `filter`, newest first.
pub fn list_analyses(
    conn: &Connection,
    filter: &HistoryFilter,
) -> Result<Vec<StoredAnalysis>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ANALYSIS_COLUMNS} FROM analyses
         WHERE (?1 IS NULL OR modality = ?1) AND (?2 = 0 OR is_favorite = 1)
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?3"
    ))?;

    let limit = filter.limit.map_or(-1, |l| l as i64);
    let rows = stmt.query_map(
        params![
            filter.modality.map(|m| m.as_str()),
            filter.favorites_only as i32,
            limit,
        ],
        analysis_row_from_rusqlite,
    )?;

    let mut analyses = Vec::new();
    for row in rows {
        analyses.push(analysis_from_row(row?)?);
    }
    Ok(analyses)
}

pub fn analysis_exists(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM analyses WHERE id = ?1)",
        params![id.to_string()],
        |row| row.get::<_, bool>(0),
    )?;
    Ok(exists)
}

/// Flip the favorite flag. `None` if the analysis does not exist.
pub fn toggle_favorite(conn: &Connection, id: &Uuid) -> Result<Option<bool>, DatabaseError> {
    let changed = conn.execute(
        "UPDATE analyses SET is_favorite = 1 - is_favorite WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    let flag = conn.query_row(
        "SELECT is_favorite FROM analyses WHERE id = ?1",
        params![id.to_string()],
        |row| row.get::<_, i32>(0),
    )?;
    Ok(Some(flag != 0))
}

/// Replace the user notes. Returns false if the analysis does not exist.
pub fn update_notes(conn: &Connection, id: &Uuid, notes: &str) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE analyses SET notes = ?2 WHERE id = ?1",
        params![id.to_string(), notes],
    )?;
    Ok(changed > 0)
}

/// Delete an analysis; its feedback goes with it (`ON DELETE CASCADE`).
/// Returns false if the analysis does not exist.
pub fn delete_analysis(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM analyses WHERE id = ?1", params![id.to_string()])?;
    Ok(deleted > 0)
}

struct AnalysisRow {
    id: String,
    modality: String,
    input_text: String,
    medications: String,
    findings: String,
    safety_score: f64,
    recommendation: String,
    narrative_source: String,
    narrative_model: Option<String>,
    created_at: String,
    is_favorite: i32,
    notes: String,
}

fn analysis_row_from_rusqlite(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnalysisRow> {
    Ok(AnalysisRow {
        id: row.get(0)?,
        modality: row.get(1)?,
        input_text: row.get(2)?,
        medications: row.get(3)?,
        findings: row.get(4)?,
        safety_score: row.get(5)?,
        recommendation: row.get(6)?,
        narrative_source: row.get(7)?,
        narrative_model: row.get(8)?,
        created_at: row.get(9)?,
        is_favorite: row.get(10)?,
        notes: row.get(11)?,
    })
}

fn analysis_from_row(row: AnalysisRow) -> Result<StoredAnalysis, DatabaseError> {
    let medications: Vec<Medication> = serde_json::from_str(&row.medications)?;
    let findings: Vec<InteractionFinding> = serde_json::from_str(&row.findings)?;
    let narrative = Narrative {
        text: row.recommendation,
        source: NarrativeSource::from_str(&row.narrative_source)?,
        model: row.narrative_model,
    };

    Ok(StoredAnalysis {
        id: parse_uuid(&row.id)?,
        created_at: parse_timestamp(&row.created_at)?,
        is_favorite: row.is_favorite != 0,
        notes: row.notes,
        result: AnalysisResult::new(
            Modality::from_str(&row.modality)?,
            &row.input_text,
            medications,
            findings,
            row.safety_score,
            narrative,
        ),
    })
}
