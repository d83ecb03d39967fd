//! Lodge officer positions and their archived terms.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The six fixed officer roles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PositionType {
    Veneravel,
    PrimeiroVigilante,
    SegundoVigilante,
    Orador,
    Secretario,
    Tesoureiro,
}

impl PositionType {
    pub const ALL: [PositionType; 6] = [
        PositionType::Veneravel,
        PositionType::PrimeiroVigilante,
        PositionType::SegundoVigilante,
        PositionType::Orador,
        PositionType::Secretario,
        PositionType::Tesoureiro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PositionType::Veneravel => "veneravel",
            PositionType::PrimeiroVigilante => "primeiro_vigilante",
            PositionType::SegundoVigilante => "segundo_vigilante",
            PositionType::Orador => "orador",
            PositionType::Secretario => "secretario",
            PositionType::Tesoureiro => "tesoureiro",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }

    pub fn title(&self) -> &'static str {
        match self {
            PositionType::Veneravel => "Venerável Mestre",
            PositionType::PrimeiroVigilante => "Primeiro Vigilante",
            PositionType::SegundoVigilante => "Segundo Vigilante",
            PositionType::Orador => "Orador",
            PositionType::Secretario => "Secretário",
            PositionType::Tesoureiro => "Tesoureiro",
        }
    }
}

/// Why a term ended up in the history table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveReason {
    /// A new holder was assigned.
    Substituido,
    /// The position was vacated.
    Removido,
}

impl ArchiveReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveReason::Substituido => "substituido",
            ArchiveReason::Removido => "removido",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "substituido" => Some(ArchiveReason::Substituido),
            "removido" => Some(ArchiveReason::Removido),
            _ => None,
        }
    }
}

/// The current holder of an officer role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LodgePosition {
    pub id: String,
    pub position_type: PositionType,
    pub title: String,
    pub brother_id: String,
    pub brother_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: String,
}

/// An archived term. Never mutated after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LodgePositionHistory {
    pub id: String,
    pub position_type: PositionType,
    pub brother_id: String,
    pub brother_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub archived_at: String,
    pub reason: ArchiveReason,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignPositionRequest {
    pub position_type: PositionType,
    pub brother_id: String,
    pub start_date: NaiveDate,
    /// Defaults to the standard mandate length when omitted.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryFilter {
    #[serde(default)]
    pub position_type: Option<PositionType>,
}

/// Default end of a mandate starting at `start`.
///
/// Feb 29 starts fall back to Feb 28 when the target year is not a leap year.
pub fn default_term_end(start: NaiveDate, years: u32) -> NaiveDate {
    start
        .checked_add_months(chrono::Months::new(years * 12))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_type_round_trip_names() {
        for p in PositionType::ALL {
            assert_eq!(PositionType::parse(p.as_str()), Some(p));
        }
        assert_eq!(PositionType::parse("chanceler"), None);
    }

    #[test]
    fn test_default_term_end_two_years() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 21).unwrap();
        assert_eq!(
            default_term_end(start, 2),
            NaiveDate::from_ymd_opt(2026, 3, 21).unwrap()
        );
    }

    #[test]
    fn test_default_term_end_leap_day() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            default_term_end(start, 2),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
    }

    #[test]
    fn test_position_type_wire_name() {
        let json = serde_json::to_string(&PositionType::PrimeiroVigilante).unwrap();
        assert_eq!(json, "\"primeiro_vigilante\"");
    }
}
