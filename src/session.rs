//! 会话：持有共享资源缓存与转换选项，是服务层使用的唯一入口。

use std::sync::{Arc, PoisonError};

use tracing::{debug, info};

use crate::cache::{Resource, ResourceCache};
use crate::core::{parse_archive_file, MhtmlOptions, Result};

/// Summary of one successful archive conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Cache key of the rewritten root document (the archive path)
    pub html_key: String,
    /// Cache keys of the auxiliary resources, in part order
    pub resource_keys: Vec<String>,
    /// Number of element references repointed at cached resources
    pub rewritten: usize,
}

/// Owns the resource cache and the conversion options
///
/// Cheap to share: the cache sits behind an `Arc`, so a serving layer can hold
/// clones of the session (or of [`Session::cache`]) across request handlers.
#[derive(Debug, Clone)]
pub struct Session {
    cache: Arc<ResourceCache>,
    options: MhtmlOptions,
}

impl Session {
    pub fn new(options: MhtmlOptions) -> Self {
        Self::with_cache(Arc::new(ResourceCache::new()), options)
    }

    pub fn with_cache(cache: Arc<ResourceCache>, options: MhtmlOptions) -> Self {
        Session { cache, options }
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    pub fn options(&self) -> &MhtmlOptions {
        &self.options
    }

    /// Converts the archive at `archive_path` and commits the result to the cache
    ///
    /// The rewritten document lands under `archive_path` itself, each auxiliary
    /// part under its synthesized key. On error the cache is left untouched.
    /// Parses of the same path are serialized; different paths run independently.
    pub fn parse(&self, archive_path: &str) -> Result<ArchiveReport> {
        let result = {
            let lock = self.cache.parse_lock(archive_path);
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.parse_locked(archive_path)
        };
        self.cache.release_parse_lock(archive_path);

        result.map(|(_, report)| report)
    }

    /// Returns the rewritten document for `path`, converting the archive on a cache miss
    pub fn resolve_archive(&self, path: &str) -> Result<Arc<Resource>> {
        if let Some(resource) = self.cache.get(path) {
            return Ok(resource);
        }

        let result = {
            let lock = self.cache.parse_lock(path);
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

            // 等锁期间可能已有其他请求完成了解析
            match self.cache.get(path) {
                Some(resource) => {
                    debug!(archive = path, "archive converted by a concurrent request");
                    Ok(resource)
                }
                None => self.parse_locked(path).map(|(html, _)| html),
            }
        };
        self.cache.release_parse_lock(path);

        result
    }

    /// 按键读取缓存条目
    pub fn cache_get(&self, key: &str) -> Option<Arc<Resource>> {
        self.cache.get(key)
    }

    /// 清空缓存
    pub fn cache_clear(&self) {
        self.cache.clear();
        info!("resource cache cleared");
    }

    fn parse_locked(&self, archive_path: &str) -> Result<(Arc<Resource>, ArchiveReport)> {
        let converted = parse_archive_file(archive_path, &self.options)?;

        let html = Arc::new(converted.html);
        let report = ArchiveReport {
            html_key: archive_path.to_string(),
            resource_keys: converted
                .resources
                .iter()
                .map(|(key, _)| key.clone())
                .collect(),
            rewritten: converted.rewritten,
        };

        let entries = converted
            .resources
            .into_iter()
            .map(|(key, resource)| (key, Arc::new(resource)))
            .chain(std::iter::once((archive_path.to_string(), html.clone())));
        self.cache.put_all(entries);

        info!(
            archive = archive_path,
            resources = report.resource_keys.len(),
            rewritten = report.rewritten,
            "archive converted"
        );

        Ok((html, report))
    }
}
