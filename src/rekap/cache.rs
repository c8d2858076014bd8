// A small time-bounded store for configuration and sheet reads.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;

use crate::rekap::*;

pub const CONFIG_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const RANGE_TTL: Duration = Duration::from_secs(300);

/// Nulls, empty lists and empty objects are never stored: an empty read is
/// more often a transient failure than real data.
fn worth_storing(js: &JSValue) -> bool {
    match js {
        JSValue::Null => false,
        JSValue::Array(a) => !a.is_empty(),
        JSValue::Object(o) => !o.is_empty(),
        _ => true,
    }
}

pub trait Cache {
    /// The stored value, if present and younger than `ttl`.
    fn get_raw(&self, key: &str, ttl: Duration) -> Option<JSValue>;

    fn put_raw(&self, key: &str, value: &JSValue);

    fn invalidate(&self, key: &str);

    fn get_or_compute<T, F>(&self, key: &str, ttl: Duration, compute: F) -> BRekapResult<T>
    where
        Self: Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> BRekapResult<T>,
    {
        if let Some(js) = self.get_raw(key, ttl) {
            match serde_json::from_value::<T>(js) {
                Ok(v) => {
                    debug!("cache: hit for {}", key);
                    return Ok(v);
                }
                Err(e) => {
                    warn!("cache: dropping unreadable entry {}: {}", key, e);
                    self.invalidate(key);
                }
            }
        }
        let v = compute()?;
        match serde_json::to_value(&v) {
            Ok(js) if worth_storing(&js) => self.put_raw(key, &js),
            Ok(_) => debug!("cache: not storing the empty value of {}", key),
            Err(e) => warn!("cache: could not serialize {}: {}", key, e),
        }
        Ok(v)
    }
}

/// One JSON file per key under a directory. Without a directory nothing is
/// ever stored and every read is computed.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct FileCache {
    dir: Option<PathBuf>,
}

impl FileCache {
    pub fn new(dir: Option<&str>) -> FileCache {
        FileCache {
            dir: dir.map(PathBuf::from),
        }
    }

    pub fn disabled() -> FileCache {
        FileCache { dir: None }
    }

    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        self.dir
            .as_ref()
            .map(|d| d.join(format!("{:016x}.json", hasher.finish())))
    }
}

impl Cache for FileCache {
    fn get_raw(&self, key: &str, ttl: Duration) -> Option<JSValue> {
        let path = self.entry_path(key)?;
        let contents = fs::read_to_string(&path).ok()?;
        let entry: JSValue = match serde_json::from_str(&contents) {
            Ok(js) => js,
            Err(e) => {
                warn!("cache: corrupt entry {:?}: {}", path, e);
                self.invalidate(key);
                return None;
            }
        };
        // Two keys may share a file name.
        if entry["key"].as_str() != Some(key) {
            return None;
        }
        let stored_at = entry["storedAt"].as_i64()?;
        let age = Utc::now().timestamp() - stored_at;
        if age < 0 || age as u64 > ttl.as_secs() {
            debug!("cache: entry {} expired ({}s old)", key, age);
            return None;
        }
        Some(entry["value"].clone())
    }

    fn put_raw(&self, key: &str, value: &JSValue) {
        let (dir, path) = match (self.dir.as_ref(), self.entry_path(key)) {
            (Some(d), Some(p)) => (d, p),
            _ => return,
        };
        let entry = json!({
            "key": key,
            "storedAt": Utc::now().timestamp(),
            "value": value,
        });
        let res = fs::create_dir_all(dir).and_then(|_| fs::write(&path, entry.to_string()));
        if let Err(e) = res {
            warn!("cache: could not write {:?}: {}", path, e);
        }
    }

    fn invalidate(&self, key: &str) {
        if let Some(path) = self.entry_path(key) {
            match fs::remove_file(&path) {
                Ok(_) => debug!("cache: invalidated {}", key),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("cache: could not remove {:?}: {}", path, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn scratch_dir(name: &str) -> String {
        let p = std::env::temp_dir().join(format!("rekap-cache-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&p);
        p.to_string_lossy().to_string()
    }

    #[test]
    fn computes_once_within_ttl() {
        let dir = scratch_dir("once");
        let cache = FileCache::new(Some(&dir));
        let calls = Cell::new(0);
        let compute = || -> BRekapResult<Vec<String>> {
            calls.set(calls.get() + 1);
            Ok(vec!["DEPOBOS".to_string()])
        };
        let a = cache.get_or_compute("names", RANGE_TTL, compute).unwrap();
        let b = cache
            .get_or_compute("names", RANGE_TTL, || -> BRekapResult<Vec<String>> {
                calls.set(calls.get() + 1);
                Ok(vec![])
            })
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(calls.get(), 1);

        cache.invalidate("names");
        let c: Vec<String> = cache
            .get_or_compute("names", RANGE_TTL, || Ok(vec!["PATIHTOTO".to_string()]))
            .unwrap();
        assert_eq!(c, vec!["PATIHTOTO".to_string()]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_values_are_not_stored() {
        let dir = scratch_dir("empty");
        let cache = FileCache::new(Some(&dir));
        let _: Vec<String> = cache
            .get_or_compute("rows", RANGE_TTL, || Ok(vec![]))
            .unwrap();
        assert_eq!(cache.get_raw("rows", RANGE_TTL), None);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_entries_are_recomputed() {
        let dir = scratch_dir("corrupt");
        let cache = FileCache::new(Some(&dir));
        cache.put_raw("k", &json!(3));
        let path = cache.entry_path("k").unwrap();
        fs::write(&path, "{not json").unwrap();
        let v: u32 = cache.get_or_compute("k", RANGE_TTL, || Ok(4)).unwrap();
        assert_eq!(v, 4);
        assert_eq!(cache.get_raw("k", RANGE_TTL), Some(json!(4)));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn disabled_cache_always_computes() {
        let cache = FileCache::disabled();
        cache.put_raw("k", &json!(1));
        assert_eq!(cache.get_raw("k", CONFIG_TTL), None);
        let v: u32 = cache.get_or_compute("k", CONFIG_TTL, || Ok(2)).unwrap();
        assert_eq!(v, 2);
    }
}
