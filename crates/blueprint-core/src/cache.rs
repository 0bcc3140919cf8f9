//! File-backed read-through cache of plans and onboarding state.
//!
//! One JSON file per key under the cache directory. Every entry carries a
//! schema version and the time it was cached; entries from another schema
//! version or older than the TTL read as absent. The database stays
//! authoritative: the cache only mirrors it. Write failures are logged and
//! never surface to callers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::plan::GeneratedPlan;
use crate::request::{ClientProfile, OnboardingData, OnboardingSource};
use crate::store::PlanStore;

pub const CACHE_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub const PLANS_KEY: &str = "generated-app-plans";
pub const LATEST_PLAN_KEY: &str = "latest-app-plan";
pub const ONBOARDING_KEY: &str = "business-onboarding-data";
pub const PROFILE_KEY: &str = "client-profile";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub schema_version: u32,
    pub cached_at: DateTime<Utc>,
    pub value: T,
}

impl<T> CacheEntry<T> {
    fn new(value: T) -> Self {
        Self {
            schema_version: CACHE_SCHEMA_VERSION,
            cached_at: Utc::now(),
            value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlanCache {
    dir: PathBuf,
    ttl: Duration,
}

/// `$XDG_CACHE_HOME/blueprint`, falling back to the platform cache dir.
pub fn default_dir() -> Option<PathBuf> {
    match std::env::var("XDG_CACHE_HOME") {
        Ok(xdg) if !xdg.is_empty() => return Some(PathBuf::from(xdg).join("blueprint")),
        _ => {}
    }
    dirs::cache_dir().map(|d| d.join("blueprint"))
}

impl PlanCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn is_fresh<T>(&self, entry: &CacheEntry<T>, now: DateTime<Utc>) -> bool {
        if entry.schema_version != CACHE_SCHEMA_VERSION {
            return false;
        }
        let age = now.signed_duration_since(entry.cached_at);
        match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => age <= ttl,
            // A TTL too large for chrono never expires.
            Err(_) => true,
        }
    }

    /// Read and parse `key`. Missing, unreadable or malformed files are
    /// `None`.
    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read cache entry");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "ignoring unparseable cache entry");
                None
            }
        }
    }

    fn try_write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let json = serde_json::to_vec_pretty(value).context("failed to serialize cache entry")?;
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
        let path = self.path(key);
        fs::rename(&tmp, &path).with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_write(key, value) {
            warn!(key, error = %format!("{e:#}"), "cache write failed");
        }
    }

    fn remove(&self, key: &str) {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                warn!(path = %path.display(), error = %e, "failed to remove cache entry");
            }
            _ => {}
        }
    }

    fn read_single<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let entry: CacheEntry<T> = self.read(key)?;
        self.is_fresh(&entry, now).then_some(entry.value)
    }

    /// Mirror a saved plan: replace the "latest" slot and add it to the
    /// collection (an entry with the same id is replaced in place).
    pub fn record_plan(&self, plan: &GeneratedPlan) {
        self.write(LATEST_PLAN_KEY, &CacheEntry::new(plan));

        let mut entries: Vec<CacheEntry<GeneratedPlan>> = self.read(PLANS_KEY).unwrap_or_default();
        let entry = CacheEntry::new(plan.clone());
        match entries.iter_mut().find(|e| e.value.id == plan.id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        self.write(PLANS_KEY, &entries);
    }

    pub fn latest_plan(&self, now: DateTime<Utc>) -> Option<GeneratedPlan> {
        self.read_single(LATEST_PLAN_KEY, now)
    }

    /// Fresh entries of the plan collection, oldest first.
    pub fn cached_plans(&self, now: DateTime<Utc>) -> Vec<GeneratedPlan> {
        let entries: Vec<CacheEntry<GeneratedPlan>> = self.read(PLANS_KEY).unwrap_or_default();
        entries
            .into_iter()
            .filter(|e| self.is_fresh(e, now))
            .map(|e| e.value)
            .collect()
    }

    pub fn invalidate_latest(&self) {
        self.remove(LATEST_PLAN_KEY);
    }

    pub fn save_onboarding(&self, data: &OnboardingData) {
        self.write(ONBOARDING_KEY, &CacheEntry::new(data));
    }

    pub fn onboarding_data(&self, now: DateTime<Utc>) -> Option<OnboardingData> {
        self.read_single(ONBOARDING_KEY, now)
    }

    pub fn save_profile(&self, profile: &ClientProfile) {
        self.write(PROFILE_KEY, &CacheEntry::new(profile));
    }

    pub fn profile(&self, now: DateTime<Utc>) -> Option<ClientProfile> {
        self.read_single(PROFILE_KEY, now)
    }

    /// The cached latest plan, or the store's latest (which then refreshes
    /// the cache).
    pub async fn latest_or_fetch(&self, store: &dyn PlanStore) -> Result<Option<GeneratedPlan>> {
        if let Some(plan) = self.latest_plan(Utc::now()) {
            debug!(plan_id = %plan.id, "latest plan served from cache");
            return Ok(Some(plan));
        }
        let Some(stored) = store.latest().await? else {
            return Ok(None);
        };
        self.record_plan(&stored.plan);
        Ok(Some(stored.plan))
    }
}

#[async_trait]
impl OnboardingSource for PlanCache {
    fn name(&self) -> &str {
        "cache"
    }

    async fn onboarding(&self) -> Result<Option<OnboardingData>> {
        Ok(self.onboarding_data(Utc::now()))
    }

    async fn client_profile(&self) -> Result<Option<ClientProfile>> {
        Ok(self.profile(Utc::now()))
    }
}
