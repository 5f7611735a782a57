//! Frame checksum algorithm
//!
//! The terminal silently drops any frame whose checksum is wrong, so this has
//! to match the firmware bit for bit:
//! 1. Build buffer: [Command, 0x00, 0x00, SessionID, ReplyID, Payload]
//! 2. Sum as unsigned 16-bit little-endian words (odd trailing byte added as-is)
//! 3. Fold carries above bit 15 back into the low 16 bits until it fits
//! 4. Take ones-complement: ~sum
//! 5. Return as unsigned 16-bit

use tracing::trace;

/// Ones-complement checksum over an arbitrary buffer
///
/// # Examples
///
/// ```
/// use punchsync_core::checksum;
///
/// // CMD_CONNECT header with session 0, reply 0
/// let header = [0xE8, 0x03, 0, 0, 0, 0, 0, 0];
/// assert_eq!(checksum::checksum16(&header), 0xFC17);
/// ```
pub fn checksum16(buf: &[u8]) -> u16 {
    let mut sum: u64 = 0;

    for chunk in buf.chunks(2) {
        let word = if chunk.len() == 2 {
            u16::from_le_bytes([chunk[0], chunk[1]])
        } else {
            // Odd byte - added as the low byte
            u16::from(chunk[0])
        };

        sum += u64::from(word);
    }

    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !(sum as u16)
}

/// Calculate the checksum of a frame from its header fields and payload
///
/// # Examples
///
/// ```
/// use punchsync_core::checksum;
///
/// let checksum = checksum::calculate(1000, 0, 0, &[]);
/// assert_eq!(checksum, 0xFC17);
/// ```
pub fn calculate(command: u16, session_id: u16, reply_id: u16, payload: &[u8]) -> u16 {
    let mut buf = Vec::with_capacity(8 + payload.len());

    // Header (checksum field is 0x0000 for calculation)
    buf.extend_from_slice(&command.to_le_bytes());
    buf.extend_from_slice(&[0, 0]);
    buf.extend_from_slice(&session_id.to_le_bytes());
    buf.extend_from_slice(&reply_id.to_le_bytes());
    buf.extend_from_slice(payload);

    let checksum = checksum16(&buf);

    trace!(
        command = command,
        session_id = session_id,
        reply_id = reply_id,
        payload_len = payload.len(),
        checksum = format!("0x{:04X}", checksum),
        "Calculated checksum"
    );

    checksum
}

/// Verify checksum
pub fn verify(
    command: u16,
    session_id: u16,
    reply_id: u16,
    payload: &[u8],
    expected: u16,
) -> bool {
    calculate(command, session_id, reply_id, payload) == expected
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_checksum_connect() {
        // Captured from a real CMD_CONNECT exchange
        assert_eq!(calculate(1000, 0, 0, &[]), 0xFC17);
        assert_eq!(calculate(1000, 0, 0, &[]), calculate(1000, 0, 0, &[]));
    }

    #[test]
    fn test_checksum_odd_payload_length() {
        // 0x000D + 0x1234 + 0x0005 + 0x0201 + 0x03 = 0x144A
        assert_eq!(calculate(13, 0x1234, 5, &[1, 2, 3]), 0xEBB5);
    }

    #[test]
    fn test_checksum_folds_carry() {
        // 0xFFFF + 0x0001 = 0x10000 -> 0x0001
        assert_eq!(checksum16(&[0xFF, 0xFF, 0x01, 0x00]), 0xFFFE);
        // 0xFFFF + 0xFFFF + 0x0002 = 0x20000 -> 0x0002
        assert_eq!(checksum16(&[0xFF, 0xFF, 0xFF, 0xFF, 0x02, 0x00]), 0xFFFD);
    }

    #[test]
    fn test_checksum_empty_buffer() {
        assert_eq!(checksum16(&[]), 0xFFFF);
    }

    #[test]
    fn test_checksum_verify() {
        let payload = vec![0xAB, 0xCD];
        let checksum = calculate(1002, 50, 100, &payload);

        assert!(verify(1002, 50, 100, &payload, checksum));
        assert!(!verify(1002, 50, 100, &payload, checksum.wrapping_add(1)));
    }

    #[test]
    fn test_checksum_different_sessions() {
        assert_ne!(calculate(1000, 100, 0, &[]), calculate(1000, 200, 0, &[]));
    }

    #[test]
    fn test_checksum_large_payload() {
        // Enough words to overflow a naive u32 accumulator many times over
        let payload = vec![0xFF; 200_000];
        assert_eq!(calculate(13, 0, 0, &payload), calculate(13, 0, 0, &payload));
    }

    proptest! {
        #[test]
        fn prop_appending_checksum_cancels(words in proptest::collection::vec(any::<u16>(), 0..256)) {
            let mut buf: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
            let checksum = checksum16(&buf);
            buf.extend_from_slice(&checksum.to_le_bytes());

            prop_assert_eq!(checksum16(&buf), 0);
        }

        #[test]
        fn prop_calculate_matches_buffer(
            command in any::<u16>(),
            session_id in any::<u16>(),
            reply_id in any::<u16>(),
            payload in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let mut buf = Vec::new();
            buf.extend_from_slice(&command.to_le_bytes());
            buf.extend_from_slice(&[0, 0]);
            buf.extend_from_slice(&session_id.to_le_bytes());
            buf.extend_from_slice(&reply_id.to_le_bytes());
            buf.extend_from_slice(&payload);

            prop_assert_eq!(calculate(command, session_id, reply_id, &payload), checksum16(&buf));
        }
    }
}
