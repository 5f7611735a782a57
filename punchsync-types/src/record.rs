//! Attendance record structures

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// How the user proved their identity at the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerifyType {
    Password,
    Fingerprint,
    Card,
    FingerprintAndPassword,
    FingerprintAndCard,
    Face,
    /// Code not in the device table (raw byte kept for diagnostics)
    Unknown(u8),
}

impl VerifyType {
    /// Map a raw verify byte from an attendance record
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Password,
            1 => Self::Fingerprint,
            2 => Self::Card,
            3 => Self::FingerprintAndPassword,
            4 => Self::FingerprintAndCard,
            15 => Self::Face,
            other => Self::Unknown(other),
        }
    }

    /// Raw device code
    pub fn code(self) -> u8 {
        match self {
            Self::Password => 0,
            Self::Fingerprint => 1,
            Self::Card => 2,
            Self::FingerprintAndPassword => 3,
            Self::FingerprintAndCard => 4,
            Self::Face => 15,
            Self::Unknown(code) => code,
        }
    }

    /// Human-readable label, as sent to the collector
    pub fn label(self) -> &'static str {
        match self {
            Self::Password => "Password",
            Self::Fingerprint => "Fingerprint",
            Self::Card => "Card",
            Self::FingerprintAndPassword => "Fingerprint and Password",
            Self::FingerprintAndCard => "Fingerprint and Card",
            Self::Face => "Face",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for VerifyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for VerifyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Punch state selected at the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunchStatus {
    CheckIn,
    CheckOut,
    BreakOut,
    BreakIn,
    OvertimeIn,
    OvertimeOut,
    Unknown(u8),
}

impl PunchStatus {
    /// Map a raw status byte from an attendance record
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::CheckIn,
            1 => Self::CheckOut,
            2 => Self::BreakOut,
            3 => Self::BreakIn,
            4 => Self::OvertimeIn,
            5 => Self::OvertimeOut,
            other => Self::Unknown(other),
        }
    }

    /// Raw device code
    pub fn code(self) -> u8 {
        match self {
            Self::CheckIn => 0,
            Self::CheckOut => 1,
            Self::BreakOut => 2,
            Self::BreakIn => 3,
            Self::OvertimeIn => 4,
            Self::OvertimeOut => 5,
            Self::Unknown(code) => code,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CheckIn => "Check In",
            Self::CheckOut => "Check Out",
            Self::BreakOut => "Break Out",
            Self::BreakIn => "Break In",
            Self::OvertimeIn => "Overtime In",
            Self::OvertimeOut => "Overtime Out",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for PunchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for PunchStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Wall-clock format used for record timestamps on the wire
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One punch read from a terminal
///
/// Serialized shape (one element of the upload `records` array):
///
/// ```text
/// {"user_id":"42","timestamp":"2023-11-14 22:13:20",
///  "verify_type":"Fingerprint","status":"Check In","raw_timestamp":1700000000}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceRecord {
    /// Enrolled user identifier (as typed on the device, not necessarily numeric)
    pub user_id: String,

    /// Punch time derived from `raw_timestamp`
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: NaiveDateTime,

    pub verify_type: VerifyType,

    pub status: PunchStatus,

    /// Timestamp exactly as stored by the device
    pub raw_timestamp: u32,
}

fn serialize_timestamp<S: Serializer>(
    timestamp: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&timestamp.format(TIMESTAMP_FORMAT))
}

impl fmt::Display for AttendanceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} ({}, {})",
            self.user_id,
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.verify_type,
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn sample() -> AttendanceRecord {
        AttendanceRecord {
            user_id: "42".into(),
            timestamp: NaiveDate::from_ymd_opt(2023, 11, 14)
                .unwrap()
                .and_hms_opt(22, 13, 20)
                .unwrap(),
            verify_type: VerifyType::FingerprintAndPassword,
            status: PunchStatus::CheckOut,
            raw_timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn test_verify_type_table() {
        assert_eq!(VerifyType::from_code(0), VerifyType::Password);
        assert_eq!(VerifyType::from_code(4).label(), "Fingerprint and Card");
        assert_eq!(VerifyType::from_code(15), VerifyType::Face);
        assert_eq!(VerifyType::from_code(7), VerifyType::Unknown(7));
        assert_eq!(VerifyType::from_code(7).label(), "Unknown");
        assert_eq!(VerifyType::Unknown(7).code(), 7);
    }

    #[test]
    fn test_status_table() {
        assert_eq!(PunchStatus::from_code(1).label(), "Check Out");
        assert_eq!(PunchStatus::from_code(5), PunchStatus::OvertimeOut);
        assert_eq!(PunchStatus::from_code(200).label(), "Unknown");
        assert_eq!(PunchStatus::BreakIn.code(), 3);
    }

    #[test]
    fn test_record_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "user_id": "42",
                "timestamp": "2023-11-14 22:13:20",
                "verify_type": "Fingerprint and Password",
                "status": "Check Out",
                "raw_timestamp": 1_700_000_000u32,
            })
        );
    }

    #[test]
    fn test_record_display() {
        assert_eq!(
            sample().to_string(),
            "42 @ 2023-11-14 22:13:20 (Fingerprint and Password, Check Out)"
        );
    }
}
