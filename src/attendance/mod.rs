//! Attendance frequency over finalized sessions.

use std::collections::{HashMap, HashSet};

use crate::models::{AttendanceRecord, Brother, MemberFrequency, SessionRecord, SessionStatus};

/// Compute each roster member's frequency.
///
/// Only finalized sessions count. Presences are records marked present or
/// excused; a roster with no finalized sessions gets 0% everywhere.
pub fn frequency(
    roster: &[Brother],
    sessions: &[SessionRecord],
    records: &[AttendanceRecord],
) -> Vec<MemberFrequency> {
    let finalized: HashSet<&str> = sessions
        .iter()
        .filter(|s| s.status == SessionStatus::Finalizada)
        .map(|s| s.id.as_str())
        .collect();
    let total = finalized.len() as u32;

    let mut presences: HashMap<&str, u32> = HashMap::new();
    for record in records {
        if record.status.counts_as_presence() && finalized.contains(record.session_id.as_str()) {
            *presences.entry(record.brother_id.as_str()).or_default() += 1;
        }
    }

    roster
        .iter()
        .map(|brother| {
            let count = presences.get(brother.id.as_str()).copied().unwrap_or(0);
            MemberFrequency {
                brother_id: brother.id.clone(),
                brother_name: brother.name.clone(),
                presences: count,
                total_sessions: total,
                percentage: percentage(count, total),
            }
        })
        .collect()
}

fn percentage(presences: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(presences) / f64::from(total) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, Degree};

    fn brother(id: &str) -> Brother {
        Brother {
            id: id.to_string(),
            name: format!("Irmão {}", id),
            cim: None,
            degree: Degree::Mestre,
            email: None,
            phone: None,
            birth_date: None,
            initiation_date: None,
            photo_url: None,
            active: true,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn session(id: &str, status: SessionStatus) -> SessionRecord {
        SessionRecord {
            id: id.to_string(),
            event_id: format!("ev-{}", id),
            status,
            created_at: String::new(),
            finalized_at: None,
        }
    }

    fn record(session: &str, brother: &str, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("{}-{}", session, brother),
            session_id: session.to_string(),
            brother_id: brother.to_string(),
            status,
            recorded_at: String::new(),
        }
    }

    #[test]
    fn test_zero_finalized_sessions_is_zero_percent() {
        let roster = vec![brother("a"), brother("b")];
        let sessions = vec![session("s1", SessionStatus::Aberta)];
        let records = vec![record("s1", "a", AttendanceStatus::Presente)];

        let result = frequency(&roster, &sessions, &records);
        assert_eq!(result.len(), 2);
        for line in result {
            assert_eq!(line.total_sessions, 0);
            assert_eq!(line.percentage, 0);
        }
    }

    #[test]
    fn test_empty_inputs() {
        assert!(frequency(&[], &[], &[]).is_empty());
        let result = frequency(&[brother("a")], &[], &[]);
        assert_eq!(result[0].percentage, 0);
    }

    #[test]
    fn test_present_and_excused_count() {
        let roster = vec![brother("a"), brother("b")];
        let sessions = vec![
            session("s1", SessionStatus::Finalizada),
            session("s2", SessionStatus::Finalizada),
            session("s3", SessionStatus::Finalizada),
            session("s4", SessionStatus::Aberta),
        ];
        let records = vec![
            record("s1", "a", AttendanceStatus::Presente),
            record("s2", "a", AttendanceStatus::Justificado),
            record("s3", "a", AttendanceStatus::Ausente),
            record("s4", "a", AttendanceStatus::Presente),
            record("s1", "b", AttendanceStatus::Presente),
        ];

        let result = frequency(&roster, &sessions, &records);
        assert_eq!(result[0].presences, 2);
        assert_eq!(result[0].total_sessions, 3);
        assert_eq!(result[0].percentage, 67);
        assert_eq!(result[1].presences, 1);
        assert_eq!(result[1].percentage, 33);
    }

    #[test]
    fn test_percentage_is_rounded_ratio() {
        for total in 1..=12u32 {
            for present in 0..=total {
                let expected = (present as f64 / total as f64 * 100.0).round() as u32;
                assert_eq!(percentage(present, total), expected);
            }
        }
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 2), 50);
    }
}
