//! Catalog loading and caching
//!
//! CatalogStore fetches the actor list, per-actor details and colour sets,
//! normalises their ordering and caches them per slug. Collaborator errors are
//! returned untouched; recovery is the session guard's job.

use super::{Actor, ActorDetail, ColourCatalog};
use crate::networking::{Collaborator, NetworkResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Cache statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CatalogStats {
    pub hits: u64,
    pub misses: u64,
}

/// Actors sharing one category label
#[derive(Debug, Clone, PartialEq)]
pub struct ActorGroup {
    pub category: String,
    pub actors: Vec<Actor>,
}

pub struct CatalogStore {
    collaborator: Arc<dyn Collaborator>,
    actors: RwLock<Option<Vec<Actor>>>,
    details: RwLock<HashMap<String, ActorDetail>>,
    colours: RwLock<HashMap<String, ColourCatalog>>,
    stats: RwLock<CatalogStats>,
}

impl CatalogStore {
    pub fn new(collaborator: Arc<dyn Collaborator>) -> Self {
        Self {
            collaborator,
            actors: RwLock::new(None),
            details: RwLock::new(HashMap::new()),
            colours: RwLock::new(HashMap::new()),
            stats: RwLock::new(CatalogStats::default()),
        }
    }

    /// Load the actor list, sorted case-sensitively by display name
    pub async fn load_catalog(&self) -> NetworkResult<Vec<Actor>> {
        let mut actors = self.collaborator.fetch_catalog().await?;
        sort_actors(&mut actors);

        info!("📚 Catalog loaded with {} actors", actors.len());
        *self.actors.write().await = Some(actors.clone());
        Ok(actors)
    }

    /// Load skins and animations for one actor, each sorted by name
    pub async fn load_actor_detail(&self, slug: &str) -> NetworkResult<ActorDetail> {
        if let Some(detail) = self.details.read().await.get(slug) {
            self.stats.write().await.hits += 1;
            debug!("📋 Detail cache HIT for {}", slug);
            return Ok(detail.clone());
        }
        self.stats.write().await.misses += 1;
        debug!("📋 Detail cache MISS for {}", slug);

        let mut detail = self.collaborator.fetch_actor_detail(slug).await?;
        sort_detail(&mut detail);

        self.details.write().await.insert(slug.to_string(), detail.clone());
        Ok(detail)
    }

    /// Load the global and skin-gated colour sets for one actor
    pub async fn load_colour_sets(&self, slug: &str) -> NetworkResult<ColourCatalog> {
        if let Some(colours) = self.colours.read().await.get(slug) {
            self.stats.write().await.hits += 1;
            debug!("📋 Colour cache HIT for {}", slug);
            return Ok(colours.clone());
        }
        self.stats.write().await.misses += 1;

        let colours = self.collaborator.fetch_colour_sets(slug).await?.gated();

        self.colours.write().await.insert(slug.to_string(), colours.clone());
        Ok(colours)
    }

    /// Actors from the last catalog load, if any
    pub async fn actors(&self) -> Option<Vec<Actor>> {
        self.actors.read().await.clone()
    }

    pub async fn actor(&self, slug: &str) -> Option<Actor> {
        self.actors
            .read()
            .await
            .as_ref()
            .and_then(|actors| actors.iter().find(|a| a.slug == slug).cloned())
    }

    /// Cached actors grouped by category: ungrouped first, then categories
    /// in order of first appearance.
    pub async fn grouped(&self) -> Vec<ActorGroup> {
        match self.actors.read().await.as_ref() {
            Some(actors) => group_by_category(actors),
            None => Vec::new(),
        }
    }

    pub async fn stats(&self) -> CatalogStats {
        self.stats.read().await.clone()
    }

    /// Forget everything; the next load goes back to the service
    pub async fn clear(&self) {
        *self.actors.write().await = None;
        self.details.write().await.clear();
        self.colours.write().await.clear();
        info!("📋 Catalog caches cleared");
    }
}

pub fn sort_actors(actors: &mut [Actor]) {
    actors.sort_by(|a, b| a.name.cmp(&b.name));
}

pub fn sort_detail(detail: &mut ActorDetail) {
    detail.skins.sort_by(|a, b| a.name.cmp(&b.name));
    detail.animations.sort_by(|a, b| a.name.cmp(&b.name));
}

pub fn group_by_category(actors: &[Actor]) -> Vec<ActorGroup> {
    let mut groups: Vec<ActorGroup> = Vec::new();
    for actor in actors {
        match groups.iter_mut().find(|g| g.category == actor.category) {
            Some(group) => group.actors.push(actor.clone()),
            None => groups.push(ActorGroup {
                category: actor.category.clone(),
                actors: vec![actor.clone()],
            }),
        }
    }
    // Stable: keeps first-seen order among the named categories
    groups.sort_by_key(|g| g.category != super::UNGROUPED_CATEGORY);
    groups
}
