//! Actor catalog: data model and the store that loads it

pub mod store;
pub mod types;

pub use store::{ActorGroup, CatalogStats, CatalogStore};
pub use types::{
    Actor, ActorDetail, AnimationClip, ColourCatalog, ColourControl, ColourSet, Scale,
    SizePreset, Skin, SkinColourGroup, FEATURE_ONLY_HEAD, FEATURE_SLOT_COLOURS,
    UNGROUPED_CATEGORY,
};
