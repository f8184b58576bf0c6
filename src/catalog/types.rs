use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Capability token: the actor can be rendered head-only
pub const FEATURE_ONLY_HEAD: &str = "only_head";
/// Capability token: the actor's skeleton exposes recolourable slots
pub const FEATURE_SLOT_COLOURS: &str = "slot_colours";

/// Category label used for actors that belong to no group
pub const UNGROUPED_CATEGORY: &str = "None";

fn default_category() -> String {
    UNGROUPED_CATEGORY.to_string()
}

/// A renderable character definition exposed by the rendering service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub slug: String,
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub default_skins: Vec<String>,
    #[serde(default)]
    pub default_animation: String,
    #[serde(default)]
    pub default_scale: Scale,
    #[serde(default)]
    pub feature_flags: BTreeSet<String>,
}

impl Actor {
    pub fn has_feature(&self, flag: &str) -> bool {
        self.feature_flags.contains(flag)
    }

    pub fn supports_only_head(&self) -> bool {
        self.has_feature(FEATURE_ONLY_HEAD)
    }

    pub fn has_slot_colours(&self) -> bool {
        self.has_feature(FEATURE_SLOT_COLOURS)
    }

    pub fn is_ungrouped(&self) -> bool {
        self.category == UNGROUPED_CATEGORY
    }
}

/// A named texture variant layerable onto an actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skin {
    pub name: String,
    /// Anything else the service reports about the skin
    #[serde(flatten, default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Skin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    /// Seconds, never negative
    #[serde(default, deserialize_with = "deserialize_duration")]
    pub duration: f64,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f64) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(0.0),
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(if value.is_finite() { value.max(0.0) } else { 0.0 })
}

/// Per-actor skins and animations, both sorted by name
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActorDetail {
    #[serde(default)]
    pub skins: Vec<Skin>,
    #[serde(default)]
    pub animations: Vec<AnimationClip>,
}

impl ActorDetail {
    pub fn skin(&self, name: &str) -> Option<&Skin> {
        self.skins.iter().find(|s| s.name == name)
    }

    pub fn animation(&self, name: &str) -> Option<&AnimationClip> {
        self.animations.iter().find(|a| a.name == name)
    }
}

/// Named fixed-pixel output targets understood by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizePreset {
    #[serde(rename = "discord128x128")]
    Discord128x128,
}

impl SizePreset {
    pub fn token(&self) -> &'static str {
        match self {
            SizePreset::Discord128x128 => "discord128x128",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "discord128x128" => Some(SizePreset::Discord128x128),
            _ => None,
        }
    }
}

impl std::fmt::Display for SizePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Output scale: a plain multiplier or a named size preset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scale {
    Factor(f64),
    Preset(SizePreset),
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Factor(1.0)
    }
}

impl Scale {
    pub fn is_identity(&self) -> bool {
        matches!(self, Scale::Factor(f) if *f == 1.0)
    }
}

impl std::str::FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(preset) = SizePreset::from_token(s) {
            return Ok(Scale::Preset(preset));
        }
        s.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f > 0.0)
            .map(Scale::Factor)
            .ok_or_else(|| format!("invalid scale {:?}, expected a positive number or a preset", s))
    }
}

/// One recolourable control and its default value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColourControl {
    pub key: String,
    pub default_value: String,
}

impl ColourControl {
    pub fn new(key: impl Into<String>, default_value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            default_value: default_value.into(),
        }
    }
}

/// A group of recolour controls, either global or gated to specific skins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColourSet {
    /// Empty for global sets
    pub applicable_skins: BTreeSet<String>,
    pub controls: Vec<ColourControl>,
}

impl ColourSet {
    pub fn global(controls: Vec<ColourControl>) -> Self {
        Self {
            applicable_skins: BTreeSet::new(),
            controls,
        }
    }

    pub fn control(&self, key: &str) -> Option<&ColourControl> {
        self.controls.iter().find(|c| c.key == key)
    }

    pub fn is_global(&self) -> bool {
        self.applicable_skins.is_empty()
    }
}

// On the wire a colour set is a JSON object keyed by control, in display order.
impl<'de> Deserialize<'de> for ColourSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let controls = map
            .into_iter()
            .map(|(key, value)| {
                let default_value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                ColourControl { key, default_value }
            })
            .collect();
        Ok(ColourSet::global(controls))
    }
}

/// Colour sets that only apply when one of `skins` is selected
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SkinColourGroup {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub skins: BTreeSet<String>,
    #[serde(default)]
    pub sets: Vec<ColourSet>,
}

impl SkinColourGroup {
    pub fn new(skins: impl IntoIterator<Item = impl Into<String>>, sets: Vec<ColourSet>) -> Self {
        let mut group = Self {
            name: None,
            skins: skins.into_iter().map(Into::into).collect(),
            sets,
        };
        group.gate_sets();
        group
    }

    /// Copy this group's skin gate onto each of its sets
    pub fn gate_sets(&mut self) {
        for set in &mut self.sets {
            set.applicable_skins = self.skins.clone();
        }
    }
}

/// Every colour set known for one actor
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ColourCatalog {
    #[serde(default)]
    pub global: Vec<ColourSet>,
    #[serde(default)]
    pub skins: Vec<SkinColourGroup>,
}

impl ColourCatalog {
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.skins.iter().all(|g| g.sets.is_empty())
    }

    pub(crate) fn gated(mut self) -> Self {
        for group in &mut self.skins {
            group.gate_sets();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_defaults() {
        let actor: Actor = serde_json::from_str(r#"{"slug": "follower", "name": "Follower"}"#).unwrap();
        assert_eq!(actor.category, UNGROUPED_CATEGORY);
        assert!(actor.is_ungrouped());
        assert_eq!(actor.default_scale, Scale::Factor(1.0));
        assert!(actor.default_skins.is_empty());
        assert!(!actor.supports_only_head());
    }

    #[test]
    fn test_scale_deserialize_number_or_preset() {
        let numeric: Scale = serde_json::from_str("0.5").unwrap();
        assert_eq!(numeric, Scale::Factor(0.5));

        let preset: Scale = serde_json::from_str(r#""discord128x128""#).unwrap();
        assert_eq!(preset, Scale::Preset(SizePreset::Discord128x128));
    }

    #[test]
    fn test_scale_from_str() {
        assert_eq!("2".parse::<Scale>(), Ok(Scale::Factor(2.0)));
        assert_eq!(
            "discord128x128".parse::<Scale>(),
            Ok(Scale::Preset(SizePreset::Discord128x128))
        );
        assert!("-1".parse::<Scale>().is_err());
        assert!("huge".parse::<Scale>().is_err());
    }

    #[test]
    fn test_colour_set_keeps_wire_order() {
        let set: ColourSet = serde_json::from_str(
            r##"{"MARKINGS": "#ff0000", "HEAD_SKIN_TOP": "#00ff00", "last": 3}"##,
        )
        .unwrap();
        let keys: Vec<_> = set.controls.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["MARKINGS", "HEAD_SKIN_TOP", "last"]);
        assert_eq!(set.control("last").unwrap().default_value, "3");
        assert!(set.is_global());
    }

    #[test]
    fn test_colour_catalog_gates_group_sets() {
        let catalog: ColourCatalog = serde_json::from_str(
            r##"{
                "global": [{"MARKINGS": "#000000"}],
                "skins": [{"name": "Foxes", "skins": ["Fox", "Fox2"], "sets": [{"MARKINGS": "#ffffff"}]}]
            }"##,
        )
        .unwrap();
        let catalog = catalog.gated();
        assert!(catalog.global[0].is_global());
        let gate = &catalog.skins[0].sets[0].applicable_skins;
        assert!(gate.contains("Fox") && gate.contains("Fox2"));
    }

    #[test]
    fn test_negative_duration_clamped() {
        let clip: AnimationClip = serde_json::from_str(r#"{"name": "idle", "duration": -2.0}"#).unwrap();
        assert_eq!(clip.duration, 0.0);
    }
}
