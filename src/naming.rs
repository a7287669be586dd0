//! Centralized name parsing for the `NN-name` ordering convention.
//!
//! Pattern directories and pattern files share one naming rule: an optional
//! numeric prefix (`NN-`) followed by a name. The prefix controls ordering and
//! is never part of a pattern's identity:
//!
//! - `01-atoms/` → collection `atoms`, order 1
//! - `02-button-group.html` → id `button-group`, order 2
//! - `card.html` → id `card`, no order
//!
//! ## Display Titles
//!
//! Titles are derived by splitting on separators and capitalizing each word:
//! - `button-group` → "Button Group"
//! - `form_fields` → "Form Fields"

/// Result of parsing an entry name like `02-button-group`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Number prefix if present (e.g., `2` from `02-button-group`)
    pub number: Option<u32>,
    /// Name part after `NN-`, dashes preserved. For unnumbered entries, this
    /// is the full input. A number-only entry keeps its digits as the name so
    /// it still has an identity.
    pub name: String,
    /// Display title: name split on separators and title-cased.
    pub display_title: String,
}

/// Parse an entry name following the `NN-name` convention.
///
/// - `"02-button-group"` → number=Some(2), name="button-group", display_title="Button Group"
/// - `"01-atoms"` → number=Some(1), name="atoms", display_title="Atoms"
/// - `"01"` → number=Some(1), name="01", display_title="01"
/// - `"card"` → number=None, name="card", display_title="Card"
pub fn parse_entry_name(name: &str) -> ParsedName {
    if let Some((prefix, rest)) = name.split_once('-')
        && !prefix.is_empty()
        && prefix.chars().all(|c| c.is_ascii_digit())
        && let Ok(num) = prefix.parse::<u32>()
        && !rest.is_empty()
    {
        return ParsedName {
            number: Some(num),
            name: rest.to_string(),
            display_title: title_case(rest),
        };
    }
    if !name.is_empty()
        && name.chars().all(|c| c.is_ascii_digit())
        && let Ok(num) = name.parse::<u32>()
    {
        return ParsedName {
            number: Some(num),
            name: name.to_string(),
            display_title: name.to_string(),
        };
    }
    ParsedName {
        number: None,
        name: name.to_string(),
        display_title: title_case(name),
    }
}

/// Title-case a dashed/underscored identifier: `"button-group"` → `"Button Group"`.
pub fn title_case(name: &str) -> String {
    name.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Join collection segments and an id into a composite pattern key.
///
/// `(["atoms", "forms"], "input")` → `"atoms-forms-input"`; a pattern at the
/// scan root is keyed by its id alone.
pub fn compose_key<S: AsRef<str>>(segments: &[S], id: &str) -> String {
    let mut parts: Vec<&str> = segments.iter().map(|s| s.as_ref()).collect();
    parts.push(id);
    parts.join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_with_multi_word_name() {
        let p = parse_entry_name("02-button-group");
        assert_eq!(p.number, Some(2));
        assert_eq!(p.name, "button-group");
        assert_eq!(p.display_title, "Button Group");
    }

    #[test]
    fn numbered_single_word() {
        let p = parse_entry_name("01-atoms");
        assert_eq!(p.number, Some(1));
        assert_eq!(p.name, "atoms");
        assert_eq!(p.display_title, "Atoms");
    }

    #[test]
    fn number_only_keeps_digits_as_name() {
        let p = parse_entry_name("01");
        assert_eq!(p.number, Some(1));
        assert_eq!(p.name, "01");
    }

    #[test]
    fn number_with_trailing_dash_is_not_a_prefix() {
        let p = parse_entry_name("01-");
        assert_eq!(p.number, None);
        assert_eq!(p.name, "01-");
    }

    #[test]
    fn unnumbered_with_dashes() {
        let p = parse_entry_name("wip-drafts");
        assert_eq!(p.number, None);
        assert_eq!(p.name, "wip-drafts");
        assert_eq!(p.display_title, "Wip Drafts");
    }

    #[test]
    fn title_case_handles_underscores_and_repeats() {
        assert_eq!(title_case("form_fields"), "Form Fields");
        assert_eq!(title_case("nav--primary"), "Nav Primary");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn compose_key_root_and_nested() {
        assert_eq!(compose_key::<&str>(&[], "button"), "button");
        assert_eq!(compose_key(&["atoms"], "button"), "atoms-button");
        assert_eq!(
            compose_key(&["atoms", "forms"], "input"),
            "atoms-forms-input"
        );
    }
}
