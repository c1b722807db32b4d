// src/core/abbrev.rs

//! Abbreviation matching for alias and script names.
//!
//! An abbreviation is split into camel/kebab parts and each part must be a prefix of the
//! part at the same position in the candidate name. `foBa` and `fB` both match `fooBar`
//! and `foo-bar`; trailing parts of the candidate are don't-cares.

/// Splits a name into lower-cased camel/kebab parts.
///
/// `-` followed by a word character starts a new part (the character is upper-cased first,
/// so `-1` does not split), every upper-case letter starts a new part, and the first
/// character never does.
pub fn to_camel_parts(name: &str) -> Vec<String> {
    let mut camel = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '-'
            && let Some(&next) = chars.peek()
            && (next.is_alphanumeric() || next == '_')
        {
            chars.next();
            camel.extend(next.to_uppercase());
        } else {
            camel.push(c);
        }
    }

    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    for (i, c) in camel.chars().enumerate() {
        if i > 0 && c.is_uppercase() && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Returns `true` if every part of `abbrev` is a prefix of the candidate part at the same position.
pub fn camel_match(abbrev: &str, candidate: &str) -> bool {
    let abbrev_parts = to_camel_parts(abbrev);
    let full_parts = to_camel_parts(candidate);
    if abbrev_parts.len() > full_parts.len() {
        return false;
    }
    abbrev_parts
        .iter()
        .zip(full_parts.iter())
        .all(|(short, full)| full.starts_with(short.as_str()))
}

/// Finds every name matching the abbreviation.
///
/// An exact match short-circuits to a single result, even when the abbreviation is also a
/// prefix of other names. Otherwise all matches are returned sorted.
pub fn find_matches<'a, I>(abbrev: &str, names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = names.into_iter().collect();
    if names.contains(&abbrev) {
        return vec![abbrev.to_string()];
    }
    let mut matches: Vec<String> = names
        .into_iter()
        .filter(|name| camel_match(abbrev, name))
        .map(str::to_string)
        .collect();
    matches.sort();
    matches.dedup();
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: &[&str] = &[
        "aaa-bbb-ccc",
        "aaaBbbDdd",
        "b123-c123-d123",
        "c123D123",
        "d123-E123",
        "E",
        "aliased-script",
        "script-a",
        "script-b",
    ];

    #[test]
    fn test_to_camel_parts() {
        assert_eq!(to_camel_parts("aaa-bbb-ccc"), vec!["aaa", "bbb", "ccc"]);
        assert_eq!(to_camel_parts("aaaBbbDdd"), vec!["aaa", "bbb", "ddd"]);
        assert_eq!(to_camel_parts("d123-E123"), vec!["d123", "e123"]);
        assert_eq!(to_camel_parts("pHe"), vec!["p", "he"]);
        assert_eq!(to_camel_parts("Build"), vec!["build"]);
        assert!(to_camel_parts("").is_empty());
    }

    #[test]
    fn test_find_matches_table() {
        let cases: &[(&str, &[&str])] = &[
            ("aaa-bbb-ccc", &["aaa-bbb-ccc"]),
            ("aaaBbbDdd", &["aaaBbbDdd"]),
            ("b123-c123-d123", &["b123-c123-d123"]),
            ("c123D123", &["c123D123"]),
            ("d123-E123", &["d123-E123"]),
            ("aBC", &["aaa-bbb-ccc"]),
            ("aaBbCc", &["aaa-bbb-ccc"]),
            ("e", &["E"]),
            ("aC", &[]),
            ("E", &["E"]),
            ("a", &["aaa-bbb-ccc", "aaaBbbDdd", "aliased-script"]),
            ("aB", &["aaa-bbb-ccc", "aaaBbbDdd"]),
            ("b", &["b123-c123-d123"]),
            ("bCD", &["b123-c123-d123"]),
            ("c1D1", &["c123D123"]),
            ("dE", &["d123-E123"]),
            ("s", &["script-a", "script-b"]),
            ("script-a", &["script-a"]),
            ("x", &[]),
        ];
        for (abbrev, expected) in cases {
            assert_eq!(
                find_matches(abbrev, NAMES.iter().copied()),
                expected.to_vec(),
                "abbreviation '{}'",
                abbrev
            );
        }
    }

    #[test]
    fn test_exact_match_is_reflexive() {
        let names = ["pycowsay", "pycowsay-hi", "pycowsay-hello"];
        for name in names {
            assert_eq!(find_matches(name, names), vec![name]);
        }
    }

    #[test]
    fn test_abbreviation_selects_by_second_part() {
        let names = ["pycowsay-hi", "pycowsay-hello"];
        assert_eq!(find_matches("pHe", names), vec!["pycowsay-hello"]);
        assert_eq!(find_matches("pHi", names), vec!["pycowsay-hi"]);
    }

    #[test]
    fn test_ambiguous_prefix_returns_all_candidates() {
        let names = ["pycowsay", "pycowsay-hi", "pycowsay-hello"];
        assert_eq!(
            find_matches("pycow", names),
            vec!["pycowsay", "pycowsay-hello", "pycowsay-hi"]
        );
    }

    #[test]
    fn test_longer_abbreviation_does_not_match_shorter_name() {
        assert!(!camel_match("fooBarBaz", "foo-bar"));
        assert!(camel_match("fB", "foo-bar"));
    }
}
