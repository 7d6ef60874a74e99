use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{notes::RecordedNote, scale::ScaleType, DomainError};

/// A finished capture. Fields are read-only once the session exists.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Session {
    id: String,
    created_at: OffsetDateTime,
    notes: Vec<RecordedNote>,
    scale: ScaleType,
    bpm: f32,
}

impl Session {
    pub fn new(notes: Vec<RecordedNote>, scale: ScaleType, bpm: f32) -> Result<Self, DomainError> {
        let created_at = OffsetDateTime::now_utc();
        let id = format!("{:x}", created_at.unix_timestamp_nanos());
        Self::with_id(id, created_at, notes, scale, bpm)
    }

    pub fn with_id(
        id: impl Into<String>,
        created_at: OffsetDateTime,
        notes: Vec<RecordedNote>,
        scale: ScaleType,
        bpm: f32,
    ) -> Result<Self, DomainError> {
        if !(10.0..=400.0).contains(&bpm) {
            return Err(DomainError::validation(
                "session bpm must be between 10 and 400",
            ));
        }
        if let Some(bad) = notes
            .iter()
            .find(|note| !note.time.is_finite() || !note.duration.is_finite())
        {
            return Err(DomainError::validation(format!(
                "note {} has a non-finite time",
                bad.note
            )));
        }
        Ok(Self {
            id: id.into(),
            created_at,
            notes,
            scale,
            bpm,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn notes(&self) -> &[RecordedNote] {
        &self.notes
    }

    pub fn scale(&self) -> ScaleType {
        self.scale
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm as f64
    }

    /// End of the last sounding note, in seconds.
    pub fn duration(&self) -> f64 {
        self.notes
            .iter()
            .map(RecordedNote::end)
            .fold(0.0, f64::max)
    }
}
