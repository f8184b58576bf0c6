//! Colour palette filtering
//!
//! Picks the colour sets that apply to the current skin selection. The result
//! is the authoritative list of controls a colour override may target.

use crate::catalog::{ColourCatalog, ColourSet, Skin};

/// Colour key that is never offered or emitted
pub const RESERVED_COLOUR_KEY: &str = "last";

/// Sets from every skin group gated to a selected skin, in group order,
/// followed by all global sets.
///
/// Repeated sets are kept as-is. Returns nothing while colours are unloaded.
pub fn applicable_colour_sets(all: Option<&ColourCatalog>, selected: &[Skin]) -> Vec<ColourSet> {
    let Some(all) = all else {
        return Vec::new();
    };

    let mut sets: Vec<ColourSet> = all
        .skins
        .iter()
        .filter(|group| selected.iter().any(|s| group.skins.contains(&s.name)))
        .flat_map(|group| group.sets.iter().cloned())
        .collect();
    sets.extend(all.global.iter().cloned());

    sets.into_iter().map(strip_reserved).collect()
}

fn strip_reserved(mut set: ColourSet) -> ColourSet {
    set.controls.retain(|c| c.key != RESERVED_COLOUR_KEY);
    set
}

/// True if `key` names a control in one of `sets`
pub fn is_applicable_key(sets: &[ColourSet], key: &str) -> bool {
    key != RESERVED_COLOUR_KEY && sets.iter().any(|set| set.control(key).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColourControl, SkinColourGroup};

    fn set(key: &str, value: &str) -> ColourSet {
        ColourSet::global(vec![ColourControl::new(key, value)])
    }

    fn catalog() -> ColourCatalog {
        ColourCatalog {
            global: vec![set("MARKINGS", "#000000")],
            skins: vec![
                SkinColourGroup::new(["Fox"], vec![set("HEAD_SKIN_TOP", "#ff8800")]),
                SkinColourGroup::new(["Wolf"], vec![set("HEAD_SKIN_TOP", "#888888")]),
            ],
        }
    }

    #[test]
    fn test_matching_group_then_global() {
        let sets = applicable_colour_sets(Some(&catalog()), &[Skin::new("Fox")]);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].controls[0].default_value, "#ff8800");
        assert!(sets[0].applicable_skins.contains("Fox"));
        assert!(sets[1].is_global());
    }

    #[test]
    fn test_unloaded_is_empty() {
        assert!(applicable_colour_sets(None, &[Skin::new("Fox")]).is_empty());
    }

    #[test]
    fn test_no_matching_group_only_global() {
        let sets = applicable_colour_sets(Some(&catalog()), &[Skin::new("Deer")]);
        assert_eq!(sets, vec![set("MARKINGS", "#000000")]);
    }

    #[test]
    fn test_duplicates_kept() {
        let mut all = catalog();
        all.skins.push(SkinColourGroup::new(["Fox"], vec![set("HEAD_SKIN_TOP", "#ff8800")]));
        let sets = applicable_colour_sets(Some(&all), &[Skin::new("Fox")]);
        assert_eq!(sets.len(), 3);
        assert_eq!(sets[0].controls, sets[1].controls);
    }

    #[test]
    fn test_reserved_key_stripped() {
        let mut all = catalog();
        all.global[0].controls.push(ColourControl::new(RESERVED_COLOUR_KEY, "7"));
        let sets = applicable_colour_sets(Some(&all), &[Skin::new("Fox")]);
        assert!(sets.iter().all(|s| s.control(RESERVED_COLOUR_KEY).is_none()));
        assert!(!is_applicable_key(&sets, RESERVED_COLOUR_KEY));
        assert!(is_applicable_key(&sets, "MARKINGS"));
    }
}
