//! Process-unique identifiers for sheets, columns, and rows.
//!
//! An identifier is `<millis>-<counter>-<random>`, each part in base 36. The
//! counter alone guarantees uniqueness within the process; the timestamp and
//! random suffix keep identifiers from different processes apart in practice.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use uuid::Uuid;

const RANDOM_SUFFIX_LEN: usize = 6;

static COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn new_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let sequence = COUNTER.fetch_add(1, Ordering::Relaxed);
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        to_base36(millis),
        to_base36(sequence),
        &random[..RANDOM_SUFFIX_LEN]
    )
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::with_capacity(13);
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn base36_encodes_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "zz");
    }

    #[test]
    fn ids_are_unique_within_a_tight_loop() {
        let ids = (0..10_000).map(|_| new_id()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn ids_have_three_parts() {
        let id = new_id();
        let parts = id.split('-').collect::<Vec<_>>();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), RANDOM_SUFFIX_LEN);
        assert!(
            id.chars()
                .all(|c| c == '-' || c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }
}
