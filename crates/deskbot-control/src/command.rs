//! Natural-language command parsing.
//!
//! Keyword matching over lowercased text, checked in a fixed priority order
//! so overlapping phrasings resolve the same way every time. Compound
//! commands are split into clauses before parsing; each clause compiles to
//! its own plan.

use tracing::warn;

use deskbot_core::bounds::Zone;
use deskbot_core::types::ObjectGroup;

/// Parsed command intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Remove all trash from the desk.
    CleanTable,
    /// Utensils to the left zone, books to the right zone.
    OrganizeDesk,
    /// Cluster objects by color tag across zones.
    OrganizeByColor,
    /// Move one named group to one named zone.
    MoveGroup { group: ObjectGroup, zone: Zone },
    /// Gather everything around the desk center.
    GroupItems,
    /// Unrecognized; compiles to an empty plan.
    Unknown,
}

/// Split compound input on conjunctions, yielding one clause per command.
///
/// `"clean the desk and then organize it"` parses as two clauses.
#[must_use]
pub fn split_clauses(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(" and ")
        .flat_map(|part| part.split(" then "))
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parse one clause into an [`Intent`].
#[must_use]
pub fn parse(text: &str) -> Intent {
    let t = text.trim().to_lowercase();
    if t.is_empty() {
        return Intent::Unknown;
    }

    // Priority order matters: "organize by color" must win over plain
    // "organize", and "move X to Y" over the group-together family.
    if t.contains("clean")
        || (t.contains("trash")
            && (t.contains("remove") || t.contains("throw") || t.contains("take out")))
    {
        return Intent::CleanTable;
    }

    if t.contains("color") && (t.contains("organize") || t.contains("sort")) {
        return Intent::OrganizeByColor;
    }

    if t.contains("organize") || t.contains("tidy") {
        return Intent::OrganizeDesk;
    }

    if let Some(intent) = parse_move(&t) {
        return intent;
    }

    if t.contains("group") || t.contains("together") || t.contains("gather") {
        return Intent::GroupItems;
    }

    warn!(command = %text, "unrecognized command");
    Intent::Unknown
}

/// `move <group> to <zone>`. Both parts must resolve or the clause is
/// unknown; a half-understood move is worse than no move.
fn parse_move(t: &str) -> Option<Intent> {
    if !t.starts_with("move ") && !t.starts_with("put ") {
        return None;
    }
    let (group_part, zone_part) = t.split_once(" to ")?;
    let group = ObjectGroup::from_keyword(group_part)?;
    let zone = Zone::from_keyword(zone_part)?;
    Some(Intent::MoveGroup { group, zone })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_family() {
        assert_eq!(parse("clean my desk"), Intent::CleanTable);
        assert_eq!(parse("Clean the table please"), Intent::CleanTable);
        assert_eq!(parse("remove the trash"), Intent::CleanTable);
        assert_eq!(parse("throw away the trash"), Intent::CleanTable);
        assert_eq!(parse("take out the trash"), Intent::CleanTable);
    }

    #[test]
    fn organize_family() {
        assert_eq!(parse("organize my desk"), Intent::OrganizeDesk);
        assert_eq!(parse("tidy up"), Intent::OrganizeDesk);
    }

    #[test]
    fn color_beats_plain_organize() {
        assert_eq!(parse("organize by color"), Intent::OrganizeByColor);
        assert_eq!(parse("sort everything by color"), Intent::OrganizeByColor);
    }

    #[test]
    fn move_group_to_zone() {
        assert_eq!(
            parse("move the books to the left"),
            Intent::MoveGroup {
                group: ObjectGroup::Books,
                zone: Zone::Left,
            }
        );
        assert_eq!(
            parse("put the pens to the corner"),
            Intent::MoveGroup {
                group: ObjectGroup::Utensils,
                zone: Zone::Corner,
            }
        );
    }

    #[test]
    fn half_resolved_move_is_unknown() {
        assert_eq!(parse("move the lamp to the left"), Intent::Unknown);
        assert_eq!(parse("move the books to the ceiling"), Intent::Unknown);
    }

    #[test]
    fn group_family() {
        assert_eq!(parse("group the items"), Intent::GroupItems);
        assert_eq!(parse("gather everything up"), Intent::GroupItems);
        assert_eq!(parse("put it all together"), Intent::GroupItems);
    }

    #[test]
    fn nonsense_and_empty_are_unknown() {
        assert_eq!(parse("make me a sandwich"), Intent::Unknown);
        assert_eq!(parse(""), Intent::Unknown);
        assert_eq!(parse("   "), Intent::Unknown);
    }

    #[test]
    fn clauses_split_on_conjunctions() {
        let clauses = split_clauses("clean the desk and then organize my desk");
        assert_eq!(clauses.len(), 2);
        assert_eq!(parse(&clauses[0]), Intent::CleanTable);
        assert_eq!(parse(&clauses[1]), Intent::OrganizeDesk);
    }

    #[test]
    fn single_clause_passes_through() {
        let clauses = split_clauses("clean my desk");
        assert_eq!(clauses, vec!["clean my desk".to_owned()]);
    }
}
