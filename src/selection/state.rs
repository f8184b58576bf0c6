//! Selection state machine
//!
//! `SelectionState` moves through `Empty -> Loading(actor) -> Ready(..)` and
//! re-enters `Loading` on every actor switch. All choice mutation happens on
//! the `Ready` payload, [`Selection`], whose methods return `true` when they
//! changed something and `false` when the request was rejected. Rejections
//! are silent by design of the picker: the state is simply left unchanged.

use super::palette::{applicable_colour_sets, is_applicable_key};
use crate::catalog::{Actor, ActorDetail, AnimationClip, ColourCatalog, ColourSet, Scale, Skin};
use tracing::{debug, info, warn};

/// Selecting this skin drops every other skin
pub const JUST_HEAD_SKIN: &str = "JustHead";

/// Text size the service uses when none is given
pub const DEFAULT_TEXT_SIZE: u32 = 32;

/// Render option toggles and overlay text
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFlags {
    pub only_head: bool,
    pub single_frame: bool,
    /// Seconds into the animation for single-frame output
    pub single_frame_timestamp: f64,
    pub petpet: bool,
    pub flip: bool,
    pub top_text: String,
    pub top_text_size: u32,
    pub bottom_text: String,
    pub bottom_text_size: u32,
}

impl Default for RenderFlags {
    fn default() -> Self {
        Self {
            only_head: false,
            single_frame: false,
            single_frame_timestamp: 0.0,
            petpet: false,
            flip: false,
            top_text: String::new(),
            top_text_size: DEFAULT_TEXT_SIZE,
            bottom_text: String::new(),
            bottom_text_size: DEFAULT_TEXT_SIZE,
        }
    }
}

/// Colour overrides keyed by control, kept in the order they were first set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColourOverrides {
    entries: Vec<(String, String)>,
}

impl ColourOverrides {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Replace the value in place, or append a new key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() != before
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(k, _)| keep(k));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `skins` with `skin` added: unchanged if already present, alone if it is
/// the head-only skin, otherwise appended.
pub fn with_skin_added(skins: &[Skin], skin: &Skin) -> Vec<Skin> {
    if skins.iter().any(|s| s.name == skin.name) {
        return skins.to_vec();
    }
    if skin.name == JUST_HEAD_SKIN {
        return vec![skin.clone()];
    }
    let mut next = skins.to_vec();
    next.push(skin.clone());
    next
}

/// `skins` without `name`, or `None` if that would leave nothing selected
pub fn with_skin_removed(skins: &[Skin], name: &str) -> Option<Vec<Skin>> {
    let next: Vec<Skin> = skins.iter().filter(|s| s.name != name).cloned().collect();
    if next.is_empty() {
        None
    } else {
        Some(next)
    }
}

/// The choices for one loaded actor
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    actor: Actor,
    detail: ActorDetail,
    colour_catalog: Option<ColourCatalog>,
    skins: Vec<Skin>,
    animation: Option<AnimationClip>,
    scale: Scale,
    colours: ColourOverrides,
    flags: RenderFlags,
}

impl Selection {
    /// Seed a fresh selection from the actor's defaults
    pub fn seeded(actor: Actor, detail: ActorDetail) -> Self {
        let mut skins: Vec<Skin> = detail
            .skins
            .iter()
            .filter(|s| actor.default_skins.iter().any(|d| *d == s.name))
            .cloned()
            .collect();
        if skins.is_empty() {
            if let Some(first) = detail.skins.first() {
                warn!("🎭 {} has no matching default skins, falling back to {}", actor.slug, first.name);
                skins.push(first.clone());
            }
        }

        let animation = detail
            .animation(&actor.default_animation)
            .or_else(|| detail.animations.first())
            .cloned();

        Self {
            scale: actor.default_scale,
            actor,
            detail,
            colour_catalog: None,
            skins,
            animation,
            colours: ColourOverrides::default(),
            flags: RenderFlags::default(),
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn detail(&self) -> &ActorDetail {
        &self.detail
    }

    pub fn skins(&self) -> &[Skin] {
        &self.skins
    }

    /// Index 0: the path component of the render request
    pub fn primary_skin(&self) -> Option<&Skin> {
        self.skins.first()
    }

    pub fn animation(&self) -> Option<&AnimationClip> {
        self.animation.as_ref()
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn colours(&self) -> &ColourOverrides {
        &self.colours
    }

    pub fn flags(&self) -> &RenderFlags {
        &self.flags
    }

    pub fn colour_catalog(&self) -> Option<&ColourCatalog> {
        self.colour_catalog.as_ref()
    }

    /// Recolourable: flagged `slot_colours`, or colour sets were served for it
    pub fn supports_colours(&self) -> bool {
        self.actor.has_slot_colours() || self.colour_catalog.as_ref().map_or(false, |c| !c.is_empty())
    }

    /// Colour sets applicable to the current skins, recomputed on every call
    pub fn palette(&self) -> Vec<ColourSet> {
        applicable_colour_sets(self.colour_catalog.as_ref(), &self.skins)
    }

    pub fn set_colour_catalog(&mut self, catalog: ColourCatalog) {
        self.colour_catalog = Some(catalog);
        self.prune_colours();
    }

    pub fn add_skin(&mut self, skin: &Skin) -> bool {
        if self.detail.skin(&skin.name).is_none() {
            debug!("Ignoring unknown skin {:?} for {}", skin.name, self.actor.slug);
            return false;
        }
        let next = with_skin_added(&self.skins, skin);
        if next == self.skins {
            return false;
        }
        self.skins = next;
        self.prune_colours();
        true
    }

    pub fn remove_skin(&mut self, name: &str) -> bool {
        match with_skin_removed(&self.skins, name) {
            Some(next) if next != self.skins => {
                self.skins = next;
                self.prune_colours();
                true
            }
            _ => false,
        }
    }

    pub fn set_animation(&mut self, name: &str) -> bool {
        let Some(clip) = self.detail.animation(name).cloned() else {
            return false;
        };
        self.flags.single_frame_timestamp = self.flags.single_frame_timestamp.clamp(0.0, clip.duration);
        self.animation = Some(clip);
        true
    }

    pub fn set_scale(&mut self, scale: Scale) -> bool {
        if let Scale::Factor(f) = scale {
            if !f.is_finite() || f <= 0.0 {
                return false;
            }
        }
        self.scale = scale;
        true
    }

    /// Override a colour control; only keys offered by the palette are accepted
    pub fn set_colour(&mut self, key: &str, value: &str) -> bool {
        if !is_applicable_key(&self.palette(), key) {
            debug!("Ignoring colour {:?}: not in the current palette", key);
            return false;
        }
        self.colours.set(key, value);
        true
    }

    pub fn clear_colour(&mut self, key: &str) -> bool {
        self.colours.remove(key)
    }

    pub fn set_only_head(&mut self, on: bool) {
        self.flags.only_head = on;
    }

    pub fn set_single_frame(&mut self, on: bool) {
        self.flags.single_frame = on;
    }

    /// Clamped into the selected clip's duration
    pub fn set_single_frame_timestamp(&mut self, seconds: f64) {
        let max = self.animation.as_ref().map(|a| a.duration).unwrap_or(0.0);
        self.flags.single_frame_timestamp = if seconds.is_finite() { seconds.clamp(0.0, max) } else { 0.0 };
    }

    pub fn set_petpet(&mut self, on: bool) {
        self.flags.petpet = on;
    }

    pub fn set_flip(&mut self, on: bool) {
        self.flags.flip = on;
    }

    pub fn set_top_text(&mut self, text: impl Into<String>) {
        self.flags.top_text = text.into();
    }

    pub fn set_top_text_size(&mut self, size: u32) {
        self.flags.top_text_size = size;
    }

    pub fn set_bottom_text(&mut self, text: impl Into<String>) {
        self.flags.bottom_text = text.into();
    }

    pub fn set_bottom_text_size(&mut self, size: u32) {
        self.flags.bottom_text_size = size;
    }

    // Overrides must always target a currently applicable control
    fn prune_colours(&mut self) {
        let palette = self.palette();
        let before = self.colours.len();
        self.colours.retain(|key| is_applicable_key(&palette, key));
        if self.colours.len() != before {
            debug!("🎨 Dropped {} colour overrides no longer in the palette", before - self.colours.len());
        }
    }
}

/// Issued when an actor detail fetch starts; finishing requires the same ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub slug: String,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionPhase {
    /// No actor chosen yet
    Empty,
    /// Waiting for the actor's detail
    Loading { actor: Actor },
    Ready(Selection),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    phase: SelectionPhase,
    generation: u64,
    /// Colours that arrived before the detail did
    pending_colours: Option<(String, ColourCatalog)>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self {
            phase: SelectionPhase::Empty,
            generation: 0,
            pending_colours: None,
        }
    }

    pub fn phase(&self) -> &SelectionPhase {
        &self.phase
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, SelectionPhase::Ready(_))
    }

    pub fn ready(&self) -> Option<&Selection> {
        match &self.phase {
            SelectionPhase::Ready(selection) => Some(selection),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut Selection> {
        match &mut self.phase {
            SelectionPhase::Ready(selection) => Some(selection),
            _ => None,
        }
    }

    /// The actor being loaded or shown
    pub fn target_actor(&self) -> Option<&Actor> {
        match &self.phase {
            SelectionPhase::Empty => None,
            SelectionPhase::Loading { actor } => Some(actor),
            SelectionPhase::Ready(selection) => Some(selection.actor()),
        }
    }

    /// Enter `Loading` for `actor`; any earlier ticket becomes stale
    pub fn select_actor(&mut self, actor: Actor) -> LoadTicket {
        self.generation += 1;
        info!("🎭 Selecting actor {} (load #{})", actor.slug, self.generation);
        let ticket = LoadTicket {
            slug: actor.slug.clone(),
            generation: self.generation,
        };
        self.pending_colours = None;
        self.phase = SelectionPhase::Loading { actor };
        ticket
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
            && matches!(&self.phase, SelectionPhase::Loading { actor } if actor.slug == ticket.slug)
    }

    /// Apply a detail fetch result. Stale tickets are discarded and `false`
    /// is returned.
    pub fn finish_loading(&mut self, ticket: &LoadTicket, detail: ActorDetail) -> bool {
        if !self.is_current(ticket) {
            debug!("Discarding stale detail for {} (load #{})", ticket.slug, ticket.generation);
            return false;
        }
        let SelectionPhase::Loading { actor } = std::mem::replace(&mut self.phase, SelectionPhase::Empty) else {
            return false;
        };

        let mut selection = Selection::seeded(actor, detail);
        if let Some((slug, colours)) = self.pending_colours.take() {
            if slug == selection.actor().slug {
                selection.set_colour_catalog(colours);
            }
        }
        debug!(
            "🎭 {} ready: skins={:?} animation={:?}",
            selection.actor().slug,
            selection.skins().iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            selection.animation().map(|a| a.name.as_str())
        );
        self.phase = SelectionPhase::Ready(selection);
        true
    }

    /// Attach colour sets loaded for `slug`; ignored if another actor is
    /// targeted by now.
    pub fn apply_colours(&mut self, slug: &str, colours: ColourCatalog) -> bool {
        match &mut self.phase {
            SelectionPhase::Ready(selection) if selection.actor().slug == slug => {
                selection.set_colour_catalog(colours);
                true
            }
            SelectionPhase::Loading { actor } if actor.slug == slug => {
                self.pending_colours = Some((slug.to_string(), colours));
                true
            }
            _ => {
                debug!("Discarding colours for {}: no longer selected", slug);
                false
            }
        }
    }

    /// Back to `Empty`, invalidating in-flight loads
    pub fn reset(&mut self) {
        self.generation += 1;
        self.pending_colours = None;
        self.phase = SelectionPhase::Empty;
    }

    pub fn add_skin(&mut self, skin: &Skin) -> bool {
        self.ready_mut().map_or(false, |s| s.add_skin(skin))
    }

    pub fn remove_skin(&mut self, name: &str) -> bool {
        self.ready_mut().map_or(false, |s| s.remove_skin(name))
    }

    pub fn set_animation(&mut self, name: &str) -> bool {
        self.ready_mut().map_or(false, |s| s.set_animation(name))
    }

    pub fn set_scale(&mut self, scale: Scale) -> bool {
        self.ready_mut().map_or(false, |s| s.set_scale(scale))
    }

    pub fn set_colour(&mut self, key: &str, value: &str) -> bool {
        self.ready_mut().map_or(false, |s| s.set_colour(key, value))
    }
}
