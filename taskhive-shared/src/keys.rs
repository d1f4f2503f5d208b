/// Sequential human-readable keys for tasks ("T3") and requirements ("REQ-3")
///
/// Keys are server-assigned and kept contiguous starting at 1: adding an item
/// takes the current maximum suffix plus one, and removing an item decrements
/// the suffix of every item numbered after it. A key whose suffix is not a
/// single contiguous digit run is rejected rather than renumbered by guess.
use thiserror::Error;

/// Error type for key parsing and renumbering
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Key does not end in exactly one contiguous run of digits
    #[error("malformed sequential key: {0:?}")]
    Malformed(String),
}

/// Items carrying a sequential key
///
/// Implemented by `Task` (prefix "T") and `Requirement` (prefix "REQ-").
pub trait Keyed {
    /// Prefix the numeric suffix is appended to
    const PREFIX: &'static str;

    /// Current key value
    fn key(&self) -> &str;

    /// Replaces the key value
    fn set_key(&mut self, key: String);
}

/// Extracts the numeric suffix from a key
///
/// The key must contain exactly one contiguous run of digits, at its end
/// ("T3" parses to 3, "REQ-12" to 12). Anything else (no digits, several
/// separate digit runs, trailing text after the digits, or a suffix too
/// large for `u32`) is `KeyError::Malformed`.
pub fn numeric_suffix(key: &str) -> Result<u32, KeyError> {
    let malformed = || KeyError::Malformed(key.to_string());

    let run_start = key
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(malformed)?;

    let digits = &key[run_start..];
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        // A second digit run (or trailing text) after the first run.
        return Err(malformed());
    }

    digits.parse::<u32>().map_err(|_| malformed())
}

/// Assigns the next key in sequence: prefix + (max suffix + 1)
///
/// Returns prefix + "1" for an empty collection. Fails if any existing key is
/// malformed, so corruption is surfaced instead of silently extended.
pub fn next_key<T: Keyed>(items: &[T]) -> Result<String, KeyError> {
    let mut max = 0u32;
    for item in items {
        max = max.max(numeric_suffix(item.key())?);
    }
    Ok(format!("{}{}", T::PREFIX, max + 1))
}

/// Closes the gap left by deleting the item whose key held `removed_suffix`
///
/// Every remaining item with a suffix strictly greater than `removed_suffix`
/// is decremented by exactly one; smaller suffixes are untouched. The caller
/// removes the item itself before invoking this.
pub fn renumber_after_removal<T: Keyed>(
    items: &mut [T],
    removed_suffix: u32,
) -> Result<(), KeyError> {
    for item in items.iter_mut() {
        let suffix = numeric_suffix(item.key())?;
        if suffix > removed_suffix {
            item.set_key(format!("{}{}", T::PREFIX, suffix - 1));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeTask {
        key: String,
    }

    impl Keyed for FakeTask {
        const PREFIX: &'static str = "T";

        fn key(&self) -> &str {
            &self.key
        }

        fn set_key(&mut self, key: String) {
            self.key = key;
        }
    }

    fn tasks(keys: &[&str]) -> Vec<FakeTask> {
        keys.iter()
            .map(|k| FakeTask {
                key: k.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_numeric_suffix() {
        assert_eq!(numeric_suffix("T3"), Ok(3));
        assert_eq!(numeric_suffix("REQ-12"), Ok(12));
        assert_eq!(numeric_suffix("T10"), Ok(10));
    }

    #[test]
    fn test_numeric_suffix_rejects_malformed() {
        // No digits at all.
        assert!(numeric_suffix("TASK").is_err());
        // Two separate digit runs.
        assert!(numeric_suffix("T1-2").is_err());
        // Digits not at the end.
        assert!(numeric_suffix("T3x").is_err());
        // Overflow.
        assert!(numeric_suffix("T99999999999").is_err());
    }

    #[test]
    fn test_next_key_starts_at_one() {
        let items: Vec<FakeTask> = Vec::new();
        assert_eq!(next_key(&items).unwrap(), "T1");
    }

    #[test]
    fn test_next_key_is_max_plus_one() {
        let items = tasks(&["T1", "T3", "T2"]);
        assert_eq!(next_key(&items).unwrap(), "T4");
    }

    #[test]
    fn test_next_key_surfaces_corruption() {
        let items = tasks(&["T1", "Tbroken"]);
        assert!(next_key(&items).is_err());
    }

    #[test]
    fn test_renumber_closes_gap() {
        // T3 was deleted from T1..T5; the survivors are passed in.
        let mut items = tasks(&["T1", "T2", "T4", "T5"]);
        renumber_after_removal(&mut items, 3).unwrap();

        let keys: Vec<&str> = items.iter().map(|t| t.key()).collect();
        assert_eq!(keys, vec!["T1", "T2", "T3", "T4"]);
    }

    #[test]
    fn test_renumber_leaves_lower_suffixes_untouched() {
        let mut items = tasks(&["T1", "T2"]);
        renumber_after_removal(&mut items, 3).unwrap();

        let keys: Vec<&str> = items.iter().map(|t| t.key()).collect();
        assert_eq!(keys, vec!["T1", "T2"]);
    }

    #[test]
    fn test_renumber_rejects_malformed_survivor() {
        let mut items = tasks(&["T1", "oops"]);
        assert_eq!(
            renumber_after_removal(&mut items, 1),
            Err(KeyError::Malformed("oops".to_string()))
        );
    }
}
