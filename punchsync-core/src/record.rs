//! Attendance record decoding
//!
//! A GET_ATTENDANCE reply is the 8-byte header followed by back-to-back
//! 40-byte record slots. A short tail is discarded and a slot that fails to
//! decode is skipped without affecting its neighbours.

use byteorder::{ByteOrder, LittleEndian};
use chrono::DateTime;
use punchsync_types::{AttendanceRecord, PunchStatus, VerifyType};
use tracing::{debug, warn};

use crate::{
    constants::attlog::{RECORD_SIZE, STATUS_OFFSET, TIMESTAMP_OFFSET, USER_ID_LEN, VERIFY_OFFSET},
    error::{Error, Result},
    HEADER_SIZE,
};

/// Decode a single 40-byte record slot
///
/// # Errors
///
/// - [`Error::RecordTooShort`] if fewer than 40 bytes are given
/// - [`Error::InvalidUserId`] if the user id is not valid UTF-8
/// - [`Error::TimestampOutOfRange`] if the timestamp has no calendar date
pub fn decode_record(slot: &[u8]) -> Result<AttendanceRecord> {
    if slot.len() < RECORD_SIZE {
        return Err(Error::RecordTooShort {
            expected: RECORD_SIZE,
            actual: slot.len(),
        });
    }

    let user_id = decode_user_id(&slot[..USER_ID_LEN])?;
    let verify_type = VerifyType::from_code(slot[VERIFY_OFFSET]);
    let raw_timestamp = LittleEndian::read_u32(&slot[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 4]);
    let status = PunchStatus::from_code(slot[STATUS_OFFSET]);

    let timestamp = DateTime::from_timestamp(i64::from(raw_timestamp), 0)
        .ok_or(Error::TimestampOutOfRange(raw_timestamp))?
        .naive_utc();

    Ok(AttendanceRecord {
        user_id,
        timestamp,
        verify_type,
        status,
        raw_timestamp,
    })
}

/// User id stops at the first NUL
fn decode_user_id(field: &[u8]) -> Result<String> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    let bytes = &field[..end];

    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|reason| Error::InvalidUserId {
            bytes: bytes.to_vec(),
            reason,
        })
}

/// Decode every complete record in a GET_ATTENDANCE reply
///
/// # Examples
///
/// ```
/// use punchsync_core::decode_attendance_reply;
///
/// // Header only: nothing to decode
/// assert!(decode_attendance_reply(&[0u8; 8]).is_empty());
/// ```
pub fn decode_attendance_reply(reply: &[u8]) -> Vec<AttendanceRecord> {
    let Some(body) = reply.get(HEADER_SIZE..) else {
        return Vec::new();
    };

    let slots = body.chunks_exact(RECORD_SIZE);
    let tail = slots.remainder().len();

    let records: Vec<_> = slots
        .enumerate()
        .filter_map(|(index, slot)| match decode_record(slot) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(index, error = %e, "Skipping undecodable attendance record");
                None
            }
        })
        .collect();

    debug!(
        records = records.len(),
        discarded_tail = tail,
        "Decoded attendance reply"
    );

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn slot(user_id: &[u8], verify: u8, timestamp: u32, status: u8) -> [u8; RECORD_SIZE] {
        let mut slot = [0u8; RECORD_SIZE];
        slot[..user_id.len()].copy_from_slice(user_id);
        slot[VERIFY_OFFSET] = verify;
        slot[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 4].copy_from_slice(&timestamp.to_le_bytes());
        slot[STATUS_OFFSET] = status;
        slot
    }

    fn reply(slots: &[[u8; RECORD_SIZE]], tail: usize) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE];
        for s in slots {
            buf.extend_from_slice(s);
        }
        buf.extend(std::iter::repeat(0xAA).take(tail));
        buf
    }

    #[test]
    fn test_decode_known_record() {
        let record = decode_record(&slot(b"42", 3, 1_700_000_000, 1)).unwrap();

        assert_eq!(record.user_id, "42");
        assert_eq!(record.verify_type, VerifyType::FingerprintAndPassword);
        assert_eq!(record.verify_type.label(), "Fingerprint and Password");
        assert_eq!(record.status.label(), "Check Out");
        assert_eq!(record.raw_timestamp, 1_700_000_000);
        assert_eq!(
            record.timestamp,
            NaiveDate::from_ymd_opt(2023, 11, 14)
                .unwrap()
                .and_hms_opt(22, 13, 20)
                .unwrap()
        );
    }

    #[test]
    fn test_user_id_uses_full_field() {
        let record = decode_record(&slot(b"123456789", 1, 0, 0)).unwrap();
        assert_eq!(record.user_id, "123456789");
    }

    #[test]
    fn test_user_id_ignores_bytes_after_nul() {
        let record = decode_record(&slot(b"7\0garbage", 1, 0, 0)).unwrap();
        assert_eq!(record.user_id, "7");
    }

    #[test]
    fn test_invalid_user_id() {
        let result = decode_record(&slot(&[0xFF, 0xFE], 1, 0, 0));
        assert!(matches!(result, Err(Error::InvalidUserId { .. })));
    }

    #[test]
    fn test_record_too_short() {
        assert!(matches!(
            decode_record(&[0u8; 39]),
            Err(Error::RecordTooShort { expected: 40, actual: 39 })
        ));
    }

    #[test]
    fn test_short_tail_discarded() {
        let buf = reply(&[slot(b"42", 1, 1_700_000_000, 0)], 15);
        assert_eq!(buf.len(), 63);

        let records = decode_attendance_reply(&buf);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id, "42");
    }

    #[test]
    fn test_bad_slot_skipped() {
        let buf = reply(
            &[
                slot(b"1", 1, 1_700_000_000, 0),
                slot(&[0xC3, 0x28], 1, 1_700_000_000, 0),
                slot(b"3", 2, 1_700_000_060, 1),
            ],
            0,
        );

        let ids: Vec<_> = decode_attendance_reply(&buf)
            .into_iter()
            .map(|r| r.user_id)
            .collect();
        assert_eq!(ids, vec!["1".to_string(), "3".to_string()]);
    }

    #[test]
    fn test_header_only_and_truncated() {
        assert!(decode_attendance_reply(&[0u8; 8]).is_empty());
        assert!(decode_attendance_reply(&[0u8; 3]).is_empty());
        assert!(decode_attendance_reply(&[0u8; 47]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_record_count_is_full_slots(len in 0usize..1024) {
            let buf = vec![0x31u8; len];
            let expected = len.saturating_sub(HEADER_SIZE) / RECORD_SIZE;
            prop_assert_eq!(decode_attendance_reply(&buf).len(), expected);
        }

        #[test]
        fn prop_timestamp_roundtrips(raw in any::<u32>()) {
            let record = decode_record(&slot(b"9", 1, raw, 0)).unwrap();
            prop_assert_eq!(record.raw_timestamp, raw);
            prop_assert_eq!(record.timestamp.and_utc().timestamp(), i64::from(raw));
        }
    }
}
