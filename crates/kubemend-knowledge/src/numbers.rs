//! English word-number and boolean-string tables.

use std::sync::LazyLock;

use indexmap::IndexMap;

const UNITS: &[(&str, u64)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
];

const TEENS: &[(&str, u64)] = &[
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
];

const TENS: &[(&str, u64)] = &[
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
];

/// Simple word numbers: zero through nineteen, the tens, and the two
/// magnitude words that show up in resource requests.
pub static WORD_TO_NUMBER: LazyLock<IndexMap<&'static str, u64>> = LazyLock::new(|| {
    let mut map = IndexMap::from([("zero", 0)]);
    map.extend(UNITS.iter().copied());
    map.extend(TEENS.iter().copied());
    map.extend(TENS.iter().copied());
    map.extend([("hundred", 100), ("thousand", 1000)]);
    map
});

/// Compound word numbers, hyphenated and spaced: `twenty-one` / `twenty one`
/// through `ninety-nine`. Substituted before the simple table so the longest
/// match wins.
pub static COMPOUND_WORD_NUMBERS: LazyLock<IndexMap<String, u64>> = LazyLock::new(|| {
    let mut map = IndexMap::new();
    for (tens_word, tens_value) in TENS {
        for (unit_word, unit_value) in UNITS {
            let value = tens_value + unit_value;
            map.insert(format!("{tens_word}-{unit_word}"), value);
            map.insert(format!("{tens_word} {unit_word}"), value);
        }
    }
    map
});

/// Strings YAML 1.1 coerces (or users intend) as booleans, with their
/// canonical value. `true`/`false` are included so quoted copies of them
/// are also normalized.
pub const BOOLEAN_STRINGS: &[(&str, bool)] = &[
    ("true", true),
    ("yes", true),
    ("on", true),
    ("1", true),
    ("false", false),
    ("no", false),
    ("off", false),
    ("0", false),
];

/// Look up a simple word number, case-insensitively.
pub fn word_number(word: &str) -> Option<u64> {
    WORD_TO_NUMBER.get(word.to_ascii_lowercase().as_str()).copied()
}

/// Look up a compound word number, case-insensitively.
pub fn compound_word_number(phrase: &str) -> Option<u64> {
    COMPOUND_WORD_NUMBERS
        .get(phrase.to_ascii_lowercase().as_str())
        .copied()
}

/// Canonical boolean for a string value, case-insensitively.
pub fn boolean_for(value: &str) -> Option<bool> {
    let lower = value.to_ascii_lowercase();
    BOOLEAN_STRINGS
        .iter()
        .find(|(s, _)| *s == lower)
        .map(|(_, b)| *b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_words() {
        assert_eq!(word_number("three"), Some(3));
        assert_eq!(word_number("Three"), Some(3));
        assert_eq!(word_number("ninety"), Some(90));
        assert_eq!(word_number("thousand"), Some(1000));
        assert_eq!(word_number("threeve"), None);
    }

    #[test]
    fn compound_words() {
        assert_eq!(compound_word_number("twenty-one"), Some(21));
        assert_eq!(compound_word_number("twenty one"), Some(21));
        assert_eq!(compound_word_number("ninety nine"), Some(99));
        assert_eq!(compound_word_number("ten one"), None);
    }

    #[test]
    fn compound_table_is_complete() {
        // 8 tens x 9 units, hyphenated and spaced.
        assert_eq!(COMPOUND_WORD_NUMBERS.len(), 8 * 9 * 2);
    }

    #[test]
    fn boolean_strings() {
        assert_eq!(boolean_for("yes"), Some(true));
        assert_eq!(boolean_for("Yes"), Some(true));
        assert_eq!(boolean_for("OFF"), Some(false));
        assert_eq!(boolean_for("0"), Some(false));
        assert_eq!(boolean_for("maybe"), None);
    }
}
