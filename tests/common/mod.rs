#![allow(dead_code)]

use actor_picker::catalog::{
    Actor, ActorDetail, AnimationClip, ColourCatalog, ColourControl, ColourSet, Scale, Skin,
    SkinColourGroup,
};
use actor_picker::networking::{Collaborator, NetworkError, NetworkResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const PASSWORD: &str = "letmein";
pub const REJECTION: &str = "Incorrect password";

/// In-memory rendering service with call recording and fault injection
pub struct MockCollaborator {
    actors: Vec<Actor>,
    details: HashMap<String, ActorDetail>,
    colours: HashMap<String, ColourCatalog>,
    delays: Mutex<HashMap<String, Duration>>,
    unauthorized: AtomicBool,
    fail_status: Mutex<Option<u16>>,
    calls: Mutex<Vec<String>>,
}

pub fn actor(slug: &str, name: &str, default_skins: &[&str], default_animation: &str, flags: &[&str]) -> Actor {
    Actor {
        slug: slug.to_string(),
        name: name.to_string(),
        category: "None".to_string(),
        default_skins: default_skins.iter().map(|s| s.to_string()).collect(),
        default_animation: default_animation.to_string(),
        default_scale: Scale::default(),
        feature_flags: flags.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
    }
}

pub fn detail(skins: &[&str], animations: &[(&str, f64)]) -> ActorDetail {
    ActorDetail {
        skins: skins.iter().map(|s| Skin::new(*s)).collect(),
        animations: animations.iter().map(|(n, d)| AnimationClip::new(*n, *d)).collect(),
    }
}

impl MockCollaborator {
    /// Two actors: `follower` (recolourable) and `ratau`
    pub fn new() -> Self {
        let mut details = HashMap::new();
        details.insert(
            "follower".to_string(),
            detail(&["Hat", "Fox", "Cat"], &[("idle", 2.0), ("run", 1.0)]),
        );
        details.insert(
            "ratau".to_string(),
            detail(&["Ratau", "Cloak"], &[("talk", 3.0), ("idle", 1.5)]),
        );

        let mut colours = HashMap::new();
        colours.insert(
            "follower".to_string(),
            ColourCatalog {
                global: vec![ColourSet::global(vec![
                    ColourControl::new("ARM_LEFT_SKIN", "#ffffff"),
                    ColourControl::new("last", "1"),
                ])],
                skins: vec![SkinColourGroup::new(
                    ["Fox"],
                    vec![ColourSet::global(vec![ColourControl::new("MARKINGS", "#ff8800")])],
                )],
            },
        );

        Self {
            actors: vec![
                actor("ratau", "Ratau", &["Ratau"], "idle", &[]),
                actor("follower", "Follower", &["Fox"], "idle", &["only_head", "slot_colours"]),
            ],
            details,
            colours,
            delays: Mutex::new(HashMap::new()),
            unauthorized: AtomicBool::new(false),
            fail_status: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Delay detail responses for one actor
    pub fn delay_detail(&self, slug: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(slug.to_string(), delay);
    }

    /// Answer every data call with 401 while set
    pub fn set_unauthorized(&self, on: bool) {
        self.unauthorized.store(on, Ordering::SeqCst);
    }

    /// Answer every data call with this status while set
    pub fn set_fail_status(&self, status: Option<u16>) {
        *self.fail_status.lock().unwrap() = status;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: String) -> NetworkResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.unauthorized.load(Ordering::SeqCst) {
            return Err(NetworkError::Unauthorized);
        }
        if let Some(status) = *self.fail_status.lock().unwrap() {
            return Err(NetworkError::HttpStatus { status, body: "boom".to_string() });
        }
        Ok(())
    }
}

#[async_trait]
impl Collaborator for MockCollaborator {
    async fn fetch_catalog(&self) -> NetworkResult<Vec<Actor>> {
        self.record("catalog".to_string())?;
        Ok(self.actors.clone())
    }

    async fn fetch_actor_detail(&self, slug: &str) -> NetworkResult<ActorDetail> {
        self.record(format!("detail:{}", slug))?;
        let delay = self.delays.lock().unwrap().get(slug).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.details
            .get(slug)
            .cloned()
            .ok_or(NetworkError::HttpStatus { status: 404, body: slug.to_string() })
    }

    async fn fetch_colour_sets(&self, slug: &str) -> NetworkResult<ColourCatalog> {
        self.record(format!("colours:{}", slug))?;
        Ok(self.colours.get(slug).cloned().unwrap_or_default())
    }

    async fn fetch_render(&self, path_and_query: &str) -> NetworkResult<Bytes> {
        self.record(format!("render:{}", path_and_query))?;
        Ok(Bytes::from_static(b"GIF89a"))
    }

    async fn login(&self, password: &str) -> NetworkResult<()> {
        self.calls.lock().unwrap().push("login".to_string());
        if password == PASSWORD {
            self.unauthorized.store(false, Ordering::SeqCst);
            Ok(())
        } else {
            Err(NetworkError::LoginRejected { message: REJECTION.to_string() })
        }
    }

    async fn logout(&self) -> NetworkResult<()> {
        self.record("logout".to_string())
    }
}
