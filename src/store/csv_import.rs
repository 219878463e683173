//! Load a league dataset from CSV files.
//!
//! `players.csv`: id,name,kind,skill_tier,current_rating (kind, tier and rating optional).
//! `matches.csv`: id,kind,side_1,side_2,score_1,score_2,status,created_at,completed_at,declared_winner
//! with sides as `;`-separated participant ids and RFC 3339 timestamps.
//! `history.csv` (optional): the RatingHistoryRecord columns.

use crate::models::{
    LeagueMatch, MatchId, MatchStatus, Participant, ParticipantId, ParticipantKind,
    RatingHistoryRecord, Side, SkillTier,
};
use crate::store::{MemoryStore, StoreError};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ParticipantRow {
    id: ParticipantId,
    name: String,
    #[serde(default)]
    kind: Option<ParticipantKind>,
    #[serde(default)]
    skill_tier: Option<SkillTier>,
    #[serde(default)]
    current_rating: Option<i32>,
}

impl From<ParticipantRow> for Participant {
    fn from(row: ParticipantRow) -> Self {
        let mut p = Participant::new(row.name);
        p.id = row.id;
        p.kind = row.kind.unwrap_or_default();
        p.skill_tier = row.skill_tier;
        p.current_rating = row.current_rating.unwrap_or_else(|| p.seed_rating());
        p
    }
}

#[derive(Debug, Deserialize)]
struct MatchRow {
    id: MatchId,
    #[serde(default)]
    kind: Option<ParticipantKind>,
    side_1: String,
    side_2: String,
    score_1: i32,
    score_2: i32,
    status: MatchStatus,
    created_at: DateTime<Utc>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    declared_winner: Option<Side>,
}

fn parse_roster(raw: &str, match_id: MatchId) -> Result<Vec<ParticipantId>, StoreError> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|e| StoreError::InvalidRecord {
                file: "matches.csv".to_string(),
                message: format!("match {match_id}: bad participant id {s:?}: {e}"),
            })
        })
        .collect()
}

impl TryFrom<MatchRow> for LeagueMatch {
    type Error = StoreError;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            kind: row.kind.unwrap_or_default(),
            side_1: parse_roster(&row.side_1, row.id)?,
            side_2: parse_roster(&row.side_2, row.id)?,
            score_1: row.score_1,
            score_2: row.score_2,
            status: row.status,
            created_at: row.created_at,
            completed_at: row.completed_at,
            declared_winner: row.declared_winner,
        })
    }
}

pub fn read_participants<R: Read>(reader: R) -> Result<Vec<Participant>, StoreError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut participants = Vec::new();
    for row in rdr.deserialize::<ParticipantRow>() {
        participants.push(row?.into());
    }
    Ok(participants)
}

pub fn read_matches<R: Read>(reader: R) -> Result<Vec<LeagueMatch>, StoreError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut matches = Vec::new();
    for row in rdr.deserialize::<MatchRow>() {
        matches.push(row?.try_into()?);
    }
    Ok(matches)
}

pub fn read_history<R: Read>(reader: R) -> Result<Vec<RatingHistoryRecord>, StoreError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for row in rdr.deserialize::<RatingHistoryRecord>() {
        records.push(row?);
    }
    Ok(records)
}

/// Build a store from `players.csv`, `matches.csv` and, if present, `history.csv` in `dir`.
pub fn load_dataset(dir: &Path) -> Result<MemoryStore, StoreError> {
    let participants = read_participants(File::open(dir.join("players.csv"))?)?;
    let matches = read_matches(File::open(dir.join("matches.csv"))?)?;
    let store = MemoryStore::with_records(participants, matches);

    let history_path = dir.join("history.csv");
    if history_path.exists() {
        let records = read_history(File::open(history_path)?)?;
        store.import_history(records)?;
    }
    Ok(store)
}
