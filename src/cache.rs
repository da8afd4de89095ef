//! 资源缓存模块
//!
//! 保存归档转换产生的全部资源：每个辅助资源以合成键存放，
//! 重写后的根文档以归档自身的路径存放。
//!
//! 所有读写都经过读写锁；一次转换的全部条目在同一把写锁下提交，
//! 因此与 `clear()` 并发时不会出现只写入一半的状态。
//! 另外为每个归档路径维护一把解析锁，同一路径同一时刻最多只有一个解析在进行。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use dashmap::DashMap;

/// 缓存中的单个资源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub content_type: String,
    pub content: Arc<[u8]>,
}

impl Resource {
    pub fn new(content_type: impl Into<String>, content: impl Into<Arc<[u8]>>) -> Self {
        Resource {
            content_type: content_type.into(),
            content: content.into(),
        }
    }
}

/// 进程内资源缓存
///
/// 没有淘汰策略、容量上限或过期时间；条目一直保留到 `clear()`。
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: RwLock<HashMap<String, Arc<Resource>>>,
    parse_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ResourceCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取缓存条目
    pub fn get(&self, key: &str) -> Option<Arc<Resource>> {
        self.read().get(key).cloned()
    }

    /// 插入缓存条目，覆盖同键的旧条目
    pub fn put(&self, key: impl Into<String>, resource: Resource) {
        self.write().insert(key.into(), Arc::new(resource));
    }

    /// 在一次写锁内插入一批条目
    pub fn put_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, Arc<Resource>)>,
    {
        let mut map = self.write();
        for (key, resource) in entries {
            map.insert(key, resource);
        }
    }

    /// 清空缓存
    pub fn clear(&self) {
        *self.write() = HashMap::new();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// 当前所有键（排序后）
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// 获取某个归档路径的解析锁
    ///
    /// 锁与缓存条目无关，`clear()` 不会影响正在进行的解析。
    pub fn parse_lock(&self, archive_path: &str) -> Arc<Mutex<()>> {
        self.parse_locks
            .entry(archive_path.to_string())
            .or_default()
            .clone()
    }

    /// 释放解析锁：没有其他持有者时从锁表中移除
    ///
    /// 调用方必须先丢弃自己从 [`parse_lock`](Self::parse_lock) 得到的句柄。
    pub fn release_parse_lock(&self, archive_path: &str) {
        self.parse_locks
            .remove_if(archive_path, |_, lock| Arc::strong_count(lock) == 1);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<Resource>>> {
        // 条目在插入前已完整构造，锁中毒不会留下半写状态
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<Resource>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
