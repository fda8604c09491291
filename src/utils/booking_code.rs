use chrono::{DateTime, Utc};
use rand::Rng;

/// Alphabet for the random segment. Excludes visually ambiguous characters
/// (I, L, O, 0, 1) so codes survive being read over the phone.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Build the code for a booking whose id has already been reserved.
///
/// Format: `BK` + date (yymmdd) + time (HHMM) + 4 random characters +
/// zero-padded 6-digit booking id. The id suffix is what makes the code
/// unique; the random segment only makes codes hard to guess.
pub fn booking_code(booking_id: i32, now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let random: String = (0..4)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();

    format!(
        "BK{}{}{}{:06}",
        now.format("%y%m%d"),
        now.format("%H%M"),
        random,
        booking_id
    )
}

/// Code for the return leg of a round-trip group.
pub fn return_leg_code(parent_code: &str) -> String {
    format!("{}-RTN", parent_code)
}

/// Code for leg `leg_sequence` (>= 2) of a multi-city group.
pub fn multi_city_leg_code(parent_code: &str, leg_sequence: i32) -> String {
    format!("{}-L{}", parent_code, leg_sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 1, 14, 35, 0).unwrap()
    }

    #[test]
    fn code_embeds_date_time_and_padded_id() {
        let code = booking_code(7, fixed_now());

        assert!(code.starts_with("BK2512011435"));
        assert!(code.ends_with("000007"));
        assert_eq!(code.len(), 22);
    }

    #[test]
    fn random_segment_avoids_ambiguous_characters() {
        for _ in 0..100 {
            let code = booking_code(123456, fixed_now());
            let random = &code[12..16];
            for c in random.chars() {
                assert!(!"ILO01".contains(c), "ambiguous char {} in {}", c, code);
            }
        }
    }

    #[test]
    fn large_ids_are_not_truncated() {
        let code = booking_code(1_234_567, fixed_now());
        assert!(code.ends_with("1234567"));
    }

    #[test]
    fn group_member_codes_derive_from_parent() {
        assert_eq!(return_leg_code("BK2512011435ABCD000007"), "BK2512011435ABCD000007-RTN");
        assert_eq!(multi_city_leg_code("BK2512011435ABCD000007", 3), "BK2512011435ABCD000007-L3");
    }
}
