//! Agenda events, sessions and attendance records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Sessao,
    Evento,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Sessao => "sessao",
            EventType::Evento => "evento",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sessao" => Some(EventType::Sessao),
            "evento" => Some(EventType::Evento),
            _ => None,
        }
    }
}

/// A calendar entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: NaiveDate,
    /// Time of day as `HH:MM`.
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub event_type: EventType,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_event_type")]
    pub event_type: EventType,
}

fn default_event_type() -> EventType {
    EventType::Sessao
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub event_type: Option<EventType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

/// Candidate slot checked against the agenda without writing anything.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictQuery {
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub exclude_id: Option<String>,
}

/// An existing event that sits too close to the one being scheduled.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventConflict {
    pub event_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
}

/// A saved event plus the non-blocking conflict warnings for it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEvent {
    pub event: Event,
    pub conflicts: Vec<EventConflict>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Aberta,
    Finalizada,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Aberta => "aberta",
            SessionStatus::Finalizada => "finalizada",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "aberta" => Some(SessionStatus::Aberta),
            "finalizada" => Some(SessionStatus::Finalizada),
            _ => None,
        }
    }
}

/// The attendance-taking instance of an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub event_id: String,
    pub status: SessionStatus,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub event_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Presente,
    Ausente,
    Justificado,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Presente => "presente",
            AttendanceStatus::Ausente => "ausente",
            AttendanceStatus::Justificado => "justificado",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "presente" => Some(AttendanceStatus::Presente),
            "ausente" => Some(AttendanceStatus::Ausente),
            "justificado" => Some(AttendanceStatus::Justificado),
            _ => None,
        }
    }

    /// Whether this status counts towards a member's frequency.
    pub fn counts_as_presence(&self) -> bool {
        matches!(self, AttendanceStatus::Presente | AttendanceStatus::Justificado)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub session_id: String,
    pub brother_id: String,
    pub status: AttendanceStatus,
    pub recorded_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAttendanceRequest {
    pub brother_id: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttendanceRequest {
    pub status: AttendanceStatus,
}

/// Frequency line for one member of the roster.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemberFrequency {
    pub brother_id: String,
    pub brother_name: String,
    pub presences: u32,
    pub total_sessions: u32,
    pub percentage: u32,
}
