//! The password hash and its brute-force inverse
//!
//! Player passwords are stored as a 32-bit hash inside the player
//! block.  The hash is deliberately cheap: bytes are case-folded,
//! scaled by a per-position key and folded into a wrapping 32-bit
//! accumulator that is reduced to 28 bits.  It is nowhere near
//! cryptographic; collisions are easy to find (every case variant of
//! a password collides outright), and the brute-forcer below leans on
//! that to recover a usable password from a hash in reasonable time.
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use log::{debug, info};

/// The hash keeps 28 bits of the accumulator
const HASH_MASK: u32 = 0x0FFF_FFFF;

/// The state multiplier applied per input byte
const STATE_MULTIPLIER: u32 = 31;

/// The key each byte is scaled by before it is folded into the state,
/// selected by position.  Recovered from the game's hashing routine;
/// the reference vectors in the tests pin every entry.
const POSITION_KEYS: [u32; 8] = [
    0x0B8C_F542,
    0x0611_B2FE,
    0x054D_70AC,
    0x0B5B_03FF,
    0x0048_A519,
    0x0E16_D958,
    0x00C8_DD98,
    0x004C_9A6E,
];

/// Hash a password the way the game does.
///
/// Letters are folded to lower case first; passwords are not case
/// sensitive.  Wrapping 32-bit arithmetic is part of the contract:
/// overflow is silent and the result is reduced to 28 bits.
pub fn hash(password: &str) -> u32 {
    hash_bytes(password.as_bytes())
}

/// The hash over raw bytes; the brute-forcer calls this directly so
/// candidates never have to materialize as strings.
fn hash_bytes(password: &[u8]) -> u32 {
    let mut state: u32 = 0;

    for (index, byte) in password.iter().enumerate() {
        let folded = byte.to_ascii_lowercase() as u32;
        state = state
            .wrapping_mul(STATE_MULTIPLIER)
            .wrapping_add(folded.wrapping_mul(POSITION_KEYS[index & 7]));
    }

    state & HASH_MASK
}

/// Expand a charset for case-insensitive search: the opposite case of
/// every alphabetic entry is appended after the originals, without
/// duplicates.
fn expand_charset(charset: &[u8]) -> Vec<u8> {
    let mut expanded = charset.to_vec();

    for byte in charset {
        let opposite = if byte.is_ascii_lowercase() {
            byte.to_ascii_uppercase()
        } else if byte.is_ascii_uppercase() {
            byte.to_ascii_lowercase()
        } else {
            continue;
        };
        if !expanded.contains(&opposite) {
            expanded.push(opposite);
        }
    }

    expanded
}

/// Search one leading-character prefix: every candidate is the prefix
/// byte followed by all combinations of the remaining positions in
/// lexicographic order of charset indices.
fn search_prefix(
    target_hash: u32,
    length: usize,
    charset: &[u8],
    prefix_index: usize,
    cancel: &AtomicBool,
) -> Vec<String> {
    let mut matches = Vec::new();
    let mut candidate = vec![charset[prefix_index]; 1];
    candidate.resize(length, charset[0]);
    let mut indices = vec![0_usize; length - 1];

    loop {
        if cancel.load(Ordering::Relaxed) {
            break;
        }

        if hash_bytes(&candidate) == target_hash {
            matches.push(candidate.iter().map(|&byte| byte as char).collect());
        }

        // advance the odometer over the tail positions
        let mut position = length - 1;
        loop {
            if position == 0 {
                return matches;
            }
            let tail_index = position - 1;
            indices[tail_index] += 1;
            if indices[tail_index] < charset.len() {
                candidate[position] = charset[indices[tail_index]];
                break;
            }
            indices[tail_index] = 0;
            candidate[position] = charset[0];
            position -= 1;
        }
    }

    matches
}

/// Brute-force the pre-image space of the password hash.
///
/// Enumerates every string of exactly `length` characters drawn from
/// `charset`, in lexicographic order of charset indices, collecting
/// the ones whose hash equals `target_hash`.
///
/// # Arguments
///
/// * `target_hash` - The hash to invert
/// * `length` - The password length to search
/// * `max_matches` - Stop after this many matches; 0 searches the
///   whole space
/// * `charset` - The candidate alphabet
/// * `case_sensitive` - When false, the opposite case of every
///   alphabetic charset entry is appended before enumeration
///
/// # Returns
///
/// The matches in enumeration order.  The first element is always the
/// lexicographically first pre-image the charset reaches.
pub fn guess(
    target_hash: u32,
    length: usize,
    max_matches: usize,
    charset: &[u8],
    case_sensitive: bool,
) -> Vec<String> {
    if length == 0 || charset.is_empty() {
        return Vec::new();
    }

    // passwords are printable ASCII; anything else cannot round-trip
    // through the player block
    let charset: Vec<u8> = charset
        .iter()
        .copied()
        .filter(|byte| byte.is_ascii())
        .collect();
    if charset.is_empty() {
        return Vec::new();
    }

    let charset = if case_sensitive {
        charset
    } else {
        expand_charset(&charset)
    };

    info!(
        "searching {} positions over a {}-character charset",
        length,
        charset.len()
    );

    let worker_count = thread::available_parallelism()
        .map(|parallelism| parallelism.get())
        .unwrap_or(1)
        .min(charset.len());

    // One result slot per leading character.  A match only counts
    // toward max_matches once every earlier prefix has finished, so
    // the collected list is a prefix of the sequential enumeration.
    let slots: Mutex<Vec<Option<Vec<String>>>> = Mutex::new(vec![None; charset.len()]);
    let cursor = AtomicUsize::new(0);
    let cancel = AtomicBool::new(false);

    thread::scope(|scope| {
        for _ in 0..worker_count {
            scope.spawn(|| loop {
                let prefix_index = cursor.fetch_add(1, Ordering::SeqCst);
                if prefix_index >= charset.len() || cancel.load(Ordering::Relaxed) {
                    break;
                }

                let matches =
                    search_prefix(target_hash, length, &charset, prefix_index, &cancel);
                debug!(
                    "prefix {} done with {} matches",
                    charset[prefix_index] as char,
                    matches.len()
                );

                let mut slots = slots.lock().unwrap();
                slots[prefix_index] = Some(matches);

                if max_matches > 0 {
                    let mut committed = 0;
                    for slot in slots.iter() {
                        match slot {
                            Some(matches) => committed += matches.len(),
                            None => break,
                        }
                    }
                    if committed >= max_matches {
                        cancel.store(true, Ordering::Relaxed);
                    }
                }
            });
        }
    });

    let slots = slots.into_inner().unwrap();
    let mut out = Vec::new();
    for slot in slots {
        match slot {
            Some(matches) => out.extend(matches),
            None => break,
        }
        if max_matches > 0 && out.len() >= max_matches {
            out.truncate(max_matches);
            break;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{expand_charset, guess, hash};
    use pretty_assertions::assert_eq;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash("flubu"), hash("flubu"));
        assert_eq!(hash(""), 0);
    }

    #[test]
    fn hash_ignores_case() {
        assert_eq!(hash("FLUBU"), hash("flubu"));
        assert_eq!(hash("ViewAI"), hash("viewai"));
    }

    #[test]
    fn hash_matches_the_reference_vectors() {
        assert_eq!(hash("viewai"), 156_085_230);
        assert_eq!(hash("fymmgsd"), 156_085_230);
        assert_eq!(hash("yfmmgsd"), 156_085_230);
        assert_eq!(hash("iymtfi"), 156_085_230);
        assert_eq!(hash("aaaaaaaa"), 86_857_028);
        assert_eq!(hash("flubu").to_le_bytes(), [79, 166, 16, 0]);
        assert_eq!(hash("aaba").to_le_bytes(), [67, 18, 14, 0]);
    }

    #[test]
    fn expand_charset_appends_opposite_case() {
        assert_eq!(expand_charset(b"ab"), b"abAB".to_vec());
        assert_eq!(expand_charset(b"a1B"), b"a1BAb".to_vec());
        // no duplicates when both cases are present
        assert_eq!(expand_charset(b"aA"), b"aA".to_vec());
    }

    #[test]
    fn guess_finds_a_known_password() {
        let matches = guess(hash("aaba"), 4, 1, b"ab", false);
        assert_eq!(matches, vec!["aaba".to_string()]);
    }

    #[test]
    fn guess_first_match_is_lexicographically_first() {
        let matches = guess(hash("azert"), 5, 1, b"abcdefghijklmnopqrstuvwxyz", false);
        assert_eq!(matches[0], "azert");
    }

    #[test]
    fn guess_collects_collisions() {
        let target = u32::from_le_bytes([79, 166, 16, 0]);
        let matches = guess(target, 5, 10, b"abflu", false);
        assert!(matches.contains(&"flubu".to_string()));
        assert!(matches.len() > 1);
    }

    #[test]
    fn guess_soundness_over_a_small_space() {
        for password in ["ba", "abab"] {
            let matches = guess(hash(password), password.len(), 0, b"ab", true);
            assert!(matches.contains(&password.to_string()));
        }
    }

    #[test]
    fn guess_exhaustion_returns_empty() {
        // no 2-character string over "a" alone hashes to this
        let matches = guess(hash("bb"), 2, 0, b"a", true);
        assert!(matches.is_empty());
    }

    #[test]
    fn zero_length_returns_nothing() {
        assert!(guess(0, 0, 0, b"ab", true).is_empty());
    }
}
