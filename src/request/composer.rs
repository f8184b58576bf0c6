//! Render request composition
//!
//! Turns a [`Selection`] into the canonical request for the rendering
//! service. Parameter order is fixed so identical choices always produce
//! byte-identical URLs, which keeps the service's cache effective.

use super::output::OutputMode;
use crate::catalog::Scale;
use crate::config::LimitSettings;
use crate::selection::{is_applicable_key, Selection, DEFAULT_TEXT_SIZE, RESERVED_COLOUR_KEY};
use crate::utils::{encode_component, encode_query};
use tracing::debug;

/// Animation used for head previews regardless of the selected clip
pub const HEAD_PREVIEW_ANIMATION: &str = "Avatars/avatar-normal";
/// Fixed scale for head previews
pub const HEAD_PREVIEW_SCALE: &str = "0.25";

/// A composed request: path from actor and primary skin, ordered parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub actor_slug: String,
    pub primary_skin: String,
    pub params: Vec<(String, String)>,
}

impl RenderRequest {
    /// `/v1/{slug}/{primary skin}`
    pub fn path(&self) -> String {
        format!("/v1/{}/{}", self.actor_slug, encode_component(&self.primary_skin))
    }

    pub fn query(&self) -> String {
        encode_query(&self.params)
    }

    /// Path plus query, ready to resolve against the service base URL
    pub fn path_and_query(&self) -> String {
        if self.params.is_empty() {
            self.path()
        } else {
            format!("{}?{}", self.path(), self.query())
        }
    }

    /// The same request marked as a file download
    pub fn with_download(mut self) -> Self {
        self.push("download", "true");
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn push(&mut self, key: &str, value: impl Into<String>) {
        self.params.push((key.to_string(), value.into()));
    }
}

impl std::fmt::Display for RenderRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path_and_query())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestComposer {
    limits: Option<LimitSettings>,
}

impl RequestComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamp values to the service's public limits before composing
    pub fn with_limits(limits: LimitSettings) -> Self {
        Self {
            limits: limits.enabled.then_some(limits),
        }
    }

    /// `None` when there is no skin or no animation to render
    pub fn compose(&self, selection: &Selection, mode: OutputMode) -> Option<RenderRequest> {
        let primary = selection.primary_skin()?;
        let animation = selection.animation()?;
        let actor = selection.actor();
        let flags = selection.flags();

        let mut request = RenderRequest {
            actor_slug: actor.slug.clone(),
            primary_skin: primary.name.clone(),
            params: Vec::new(),
        };

        let overlays = &selection.skins()[1..];
        let overlay_count = self.limits.as_ref().map_or(overlays.len(), |l| overlays.len().min(l.max_overlay_skins));
        for skin in &overlays[..overlay_count] {
            request.push("add_skin", skin.name.clone());
        }

        if mode == OutputMode::HeadPreview {
            request.push("scale", HEAD_PREVIEW_SCALE);
            request.push("animation", HEAD_PREVIEW_ANIMATION);
        } else {
            match selection.scale() {
                Scale::Preset(preset) => request.push("custom_size", preset.token()),
                Scale::Factor(factor) => {
                    let factor = self.limits.as_ref().map_or(factor, |l| factor.min(l.max_scale));
                    if !Scale::Factor(factor).is_identity() {
                        request.push("scale", factor.to_string());
                    }
                }
            }
            request.push("animation", animation.name.clone());
        }

        if selection.supports_colours() {
            let palette = selection.palette();
            for (key, value) in selection.colours().iter() {
                if key == RESERVED_COLOUR_KEY || !is_applicable_key(&palette, key) {
                    continue;
                }
                request.push(key, value);
            }
        }

        if actor.supports_only_head() && flags.only_head {
            request.push("only_head", "true");
        }
        if flags.petpet {
            request.push("petpet", "true");
        }
        if flags.flip {
            request.push("flip", "horizontal");
        }

        self.push_text(&mut request, "top_text", &flags.top_text, flags.top_text_size);
        self.push_text(&mut request, "bottom_text", &flags.bottom_text, flags.bottom_text_size);

        match mode {
            OutputMode::Animated(format) => {
                request.push("format", super::OutputFormat::from(format).token());
            }
            OutputMode::SingleFrame => {
                let start = self.limits.as_ref().map_or(flags.single_frame_timestamp, |l| {
                    flags.single_frame_timestamp.min(l.max_start_time)
                });
                request.push("format", "png");
                request.push("start_time", start.to_string());
            }
            OutputMode::HeadPreview => {
                request.push("format", "png");
            }
        }

        debug!("🧩 Composed {}", request);
        Some(request)
    }

    fn push_text(&self, request: &mut RenderRequest, key: &str, text: &str, size: u32) {
        if text.is_empty() {
            return;
        }
        let (text, size) = match &self.limits {
            Some(limits) => (
                text.chars().take(limits.max_text_len).collect::<String>(),
                size.min(limits.max_text_size),
            ),
            None => (text.to_string(), size),
        };
        request.push(key, text);
        if size != DEFAULT_TEXT_SIZE {
            request.push(&format!("{}_size", key), size.to_string());
        }
    }
}

/// Compose without limits
pub fn compose(selection: &Selection, mode: OutputMode) -> Option<RenderRequest> {
    RequestComposer::new().compose(selection, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        Actor, ActorDetail, AnimationClip, ColourCatalog, ColourControl, ColourSet, SizePreset, Skin,
        FEATURE_ONLY_HEAD, FEATURE_SLOT_COLOURS,
    };
    use crate::request::AnimatedFormat;
    use std::collections::BTreeSet;

    fn actor(flags: &[&str]) -> Actor {
        Actor {
            slug: "follower".to_string(),
            name: "Follower".to_string(),
            category: "None".to_string(),
            default_skins: vec!["Fox".to_string()],
            default_animation: "idle".to_string(),
            default_scale: Scale::Factor(1.0),
            feature_flags: flags.iter().map(|f| f.to_string()).collect::<BTreeSet<_>>(),
        }
    }

    fn selection(flags: &[&str]) -> Selection {
        let detail = ActorDetail {
            skins: ["Fox", "Hat", "Scarf"].into_iter().map(Skin::new).collect(),
            animations: vec![AnimationClip::new("idle", 2.0)],
        };
        Selection::seeded(actor(flags), detail)
    }

    const GIF: OutputMode = OutputMode::Animated(AnimatedFormat::Gif);

    #[test]
    fn test_scale_preset_replaces_scale() {
        let mut s = selection(&[]);
        s.set_scale(Scale::Preset(SizePreset::Discord128x128));
        let request = compose(&s, GIF).unwrap();
        assert_eq!(request.param("custom_size"), Some("discord128x128"));
        assert_eq!(request.param("scale"), None);
    }

    #[test]
    fn test_non_unit_scale_emitted() {
        let mut s = selection(&[]);
        s.set_scale(Scale::Factor(0.5));
        let request = compose(&s, GIF).unwrap();
        assert_eq!(request.path_and_query(), "/v1/follower/Fox?scale=0.5&animation=idle&format=gif");
    }

    #[test]
    fn test_empty_text_never_emitted() {
        let mut s = selection(&[]);
        s.set_top_text("");
        s.set_top_text_size(90);
        let request = compose(&s, GIF).unwrap();
        assert_eq!(request.param("top_text"), None);
        assert_eq!(request.param("top_text_size"), None);
    }

    #[test]
    fn test_text_size_only_when_non_default() {
        let mut s = selection(&[]);
        s.set_top_text("hello world");
        s.set_bottom_text("bye");
        s.set_bottom_text_size(64);
        let request = compose(&s, GIF).unwrap();
        assert_eq!(
            request.query(),
            "animation=idle&top_text=hello%20world&bottom_text=bye&bottom_text_size=64&format=gif"
        );
    }

    #[test]
    fn test_only_head_requires_capability() {
        let mut s = selection(&[]);
        s.set_only_head(true);
        assert_eq!(compose(&s, GIF).unwrap().param("only_head"), None);

        let mut s = selection(&[FEATURE_ONLY_HEAD]);
        s.set_only_head(true);
        assert_eq!(compose(&s, GIF).unwrap().param("only_head"), Some("true"));
    }

    #[test]
    fn test_flag_order() {
        let mut s = selection(&[FEATURE_ONLY_HEAD]);
        s.set_flip(true);
        s.set_petpet(true);
        s.set_only_head(true);
        let request = compose(&s, GIF).unwrap();
        assert_eq!(
            request.query(),
            "animation=idle&only_head=true&petpet=true&flip=horizontal&format=gif"
        );
    }

    #[test]
    fn test_colours_need_slot_flag_or_loaded_sets() {
        let colours = ColourCatalog {
            global: vec![ColourSet::global(vec![
                ColourControl::new("HEAD_SKIN_TOP", "#000000"),
                ColourControl::new("MARKINGS", "#000000"),
            ])],
            skins: vec![],
        };

        // No flag and no colour data: nothing to recolour
        let mut plain = selection(&[]);
        plain.set_colour_catalog(ColourCatalog::default());
        assert!(!plain.set_colour("MARKINGS", "#ff0000"));
        assert_eq!(compose(&plain, GIF).unwrap().param("MARKINGS"), None);

        // The service's catalog carries no feature flags; loaded sets are enough
        let mut unflagged = selection(&[]);
        unflagged.set_colour_catalog(colours.clone());
        assert!(unflagged.set_colour("MARKINGS", "#ff0000"));
        assert_eq!(compose(&unflagged, GIF).unwrap().param("MARKINGS"), Some("#ff0000"));

        let mut colourable = selection(&[FEATURE_SLOT_COLOURS]);
        colourable.set_colour_catalog(colours);
        colourable.set_colour("MARKINGS", "#ff0000");
        colourable.set_colour("HEAD_SKIN_TOP", "#00ff00");
        let request = compose(&colourable, GIF).unwrap();
        assert_eq!(
            request.query(),
            "animation=idle&MARKINGS=%23ff0000&HEAD_SKIN_TOP=%2300ff00&format=gif"
        );
    }

    #[test]
    fn test_single_frame_mode() {
        let mut s = selection(&[]);
        s.set_single_frame(true);
        s.set_single_frame_timestamp(1.5);
        let mode = OutputMode::for_selection(&s, AnimatedFormat::Gif);
        assert_eq!(mode, OutputMode::SingleFrame);
        let request = compose(&s, mode).unwrap();
        assert_eq!(request.query(), "animation=idle&format=png&start_time=1.5");
    }

    #[test]
    fn test_head_preview_overrides_scale_and_animation() {
        let mut s = selection(&[]);
        s.set_scale(Scale::Factor(2.0));
        s.add_skin(&Skin::new("Hat"));
        let request = compose(&s, OutputMode::HeadPreview).unwrap();
        assert_eq!(
            request.path_and_query(),
            "/v1/follower/Fox?add_skin=Hat&scale=0.25&animation=Avatars%2Favatar-normal&format=png"
        );
    }

    #[test]
    fn test_download_appended_last() {
        let s = selection(&[]);
        let request = compose(&s, OutputMode::Animated(AnimatedFormat::Apng)).unwrap().with_download();
        assert_eq!(request.query(), "animation=idle&format=apng&download=true");
    }

    #[test]
    fn test_primary_skin_is_encoded_in_path() {
        let detail = ActorDetail {
            skins: vec![Skin::new("Clothes/Robe")],
            animations: vec![AnimationClip::new("idle", 1.0)],
        };
        let mut a = actor(&[]);
        a.default_skins = vec!["Clothes/Robe".to_string()];
        let s = Selection::seeded(a, detail);
        assert_eq!(compose(&s, GIF).unwrap().path(), "/v1/follower/Clothes%2FRobe");
    }

    #[test]
    fn test_nothing_to_render_without_animation() {
        let detail = ActorDetail {
            skins: vec![Skin::new("Fox")],
            animations: vec![],
        };
        let s = Selection::seeded(actor(&[]), detail);
        assert!(compose(&s, GIF).is_none());
    }

    #[test]
    fn test_limits_clamp_values() {
        let limits = LimitSettings {
            enabled: true,
            max_overlay_skins: 1,
            max_text_len: 3,
            max_text_size: 100,
            ..LimitSettings::default()
        };
        let mut s = selection(&[]);
        s.add_skin(&Skin::new("Hat"));
        s.add_skin(&Skin::new("Scarf"));
        s.set_scale(Scale::Factor(10.0));
        s.set_top_text("abcdef");
        s.set_top_text_size(150);

        let request = RequestComposer::with_limits(limits).compose(&s, GIF).unwrap();
        assert_eq!(
            request.query(),
            "add_skin=Hat&scale=3&animation=idle&top_text=abc&top_text_size=100&format=gif"
        );
    }

    #[test]
    fn test_disabled_limits_are_ignored() {
        let mut s = selection(&[]);
        s.set_scale(Scale::Factor(10.0));
        let request = RequestComposer::with_limits(LimitSettings::default()).compose(&s, GIF).unwrap();
        assert_eq!(request.param("scale"), Some("10"));
    }
}
