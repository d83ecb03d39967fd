//! Meeting minutes and their signatures.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MinutesStatus {
    Rascunho,
    Aprovada,
}

impl MinutesStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MinutesStatus::Rascunho => "rascunho",
            MinutesStatus::Aprovada => "aprovada",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rascunho" => Some(MinutesStatus::Rascunho),
            "aprovada" => Some(MinutesStatus::Aprovada),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Minutes {
    pub id: String,
    pub title: String,
    pub meeting_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Rich text produced by the editor; stored verbatim.
    pub content: String,
    pub status: MinutesStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMinutesRequest {
    pub title: String,
    pub meeting_date: NaiveDate,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMinutesRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub meeting_date: Option<NaiveDate>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub status: Option<MinutesStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinutesSignature {
    pub id: String,
    pub minutes_id: String,
    pub brother_id: String,
    pub brother_name: String,
    pub role: String,
    pub signed_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignMinutesRequest {
    pub brother_id: String,
    pub role: String,
}

/// Minutes with their collected signatures.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinutesWithSignatures {
    #[serde(flatten)]
    pub minutes: Minutes,
    pub signatures: Vec<MinutesSignature>,
}
