use super::{CacheStats, CachedPromptEntry};
use crate::config::ResolverConfig;
use crate::context::PromptContext;
use crate::prompt::ResolvedPrompt;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

const MIN_TTL: Duration = Duration::from_secs(1);

/// In-memory store of resolved templates keyed by guild + context fingerprint.
///
/// Expired entries stay readable so the fallback chain can serve them as stale;
/// freshness is the caller's decision. Construct once and share via `Arc`.
pub struct PromptCacheManager {
    entries: RwLock<HashMap<String, CachedPromptEntry>>,
    ttl: chrono::Duration,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    stale_hits: AtomicU64,
    invalidations: AtomicU64,
}

impl PromptCacheManager {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let ttl = if ttl.is_zero() {
            log::warn!("Cache TTL of zero requested, using {:?}", MIN_TTL);
            MIN_TTL
        } else {
            ttl
        };
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365)),
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stale_hits: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.cache_ttl, config.cache_capacity)
    }

    fn key(guild_id: &str, fingerprint: &str) -> String {
        format!("{guild_id}:{fingerprint}")
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CachedPromptEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CachedPromptEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Entry for this guild and context, fresh or stale.
    pub fn get(&self, guild_id: &str, context: &PromptContext) -> Option<CachedPromptEntry> {
        let entry = self.peek(guild_id, context);

        match &entry {
            Some(e) if e.is_fresh() => self.hits.fetch_add(1, Ordering::Relaxed),
            Some(_) => self.stale_hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        entry
    }

    /// Like [`get`](Self::get) but leaves the counters alone.
    pub fn peek(&self, guild_id: &str, context: &PromptContext) -> Option<CachedPromptEntry> {
        let fingerprint = context.fingerprint();
        self.read()
            .get(&Self::key(guild_id, &fingerprint))
            .filter(|e| e.context_hash == fingerprint)
            .cloned()
    }

    /// Entry only if still within its TTL.
    pub fn get_fresh(&self, guild_id: &str, context: &PromptContext) -> Option<CachedPromptEntry> {
        self.get(guild_id, context).filter(CachedPromptEntry::is_fresh)
    }

    /// Cache `resolved` for this guild and context. Stale results are not
    /// re-cached. Returns whether an entry was written.
    pub fn set(&self, guild_id: &str, context: &PromptContext, resolved: &ResolvedPrompt) -> bool {
        if resolved.is_stale {
            log::debug!("Not caching stale prompt for guild {}", guild_id);
            return false;
        }

        let now = Utc::now();
        let entry = CachedPromptEntry {
            guild_id: guild_id.to_string(),
            content: resolved.content.clone(),
            source: resolved.source,
            version: resolved.version,
            cached_at: now,
            expires_at: now + self.ttl,
            repo_url: resolved.repo_url.clone(),
            file_path: resolved.file_path.clone(),
            view_url: resolved.view_url.clone(),
            routing_pattern: resolved.routing_pattern.clone(),
            routing_variables: resolved.routing_variables.clone(),
            context_hash: context.fingerprint(),
        };
        self.insert_entry(entry);
        true
    }

    pub(crate) fn insert_entry(&self, entry: CachedPromptEntry) {
        let key = Self::key(&entry.guild_id, &entry.context_hash);
        let mut entries = self.write();

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.cached_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(key, entry);
    }

    /// Drop every entry belonging to `guild_id`. Returns the number removed.
    pub fn invalidate_guild(&self, guild_id: &str) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, e| e.guild_id != guild_id);
        let removed = before - entries.len();

        self.invalidations.fetch_add(removed as u64, Ordering::Relaxed);
        log::info!("Invalidated {} cached prompt(s) for guild {}", removed, guild_id);
        removed
    }

    /// Remove expired entries. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, e| e.is_fresh_at(now));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let now = Utc::now();
        let entries = self.read();
        let fresh_entries = entries.values().filter(|e| e.is_fresh_at(now)).count();

        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            size: entries.len(),
            fresh_entries,
            stale_entries: entries.len() - fresh_entries,
            capacity: self.capacity,
        }
    }
}
