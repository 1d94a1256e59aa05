//! CSV ingestion and a caller-owned table cache.
//!
//! [`load_csv`] reads a file with polars' CSV reader. [`TableCache`] keeps
//! parsed tables keyed by digests of the raw bytes and the read options, so a
//! caller re-analysing the same upload does not parse it twice. The core
//! algorithms never touch the cache.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ResultExt, StatsError};

/// Rows sampled for schema inference.
const INFER_SCHEMA_ROWS: usize = 1000;

/// Text encoding of the input file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// Replace invalid UTF-8 sequences instead of failing.
    LossyUtf8,
}

impl From<TextEncoding> for CsvEncoding {
    fn from(encoding: TextEncoding) -> Self {
        match encoding {
            TextEncoding::Utf8 => CsvEncoding::Utf8,
            TextEncoding::LossyUtf8 => CsvEncoding::LossyUtf8,
        }
    }
}

/// How to parse a delimited file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadOptions {
    pub separator: u8,
    /// Parse `3,14` as 3.14. Requires a separator other than `,`.
    pub decimal_comma: bool,
    pub encoding: TextEncoding,
    pub has_header: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            separator: b',',
            decimal_comma: false,
            encoding: TextEncoding::Utf8,
            has_header: true,
        }
    }
}

impl ReadOptions {
    fn validate(&self) -> Result<()> {
        if self.decimal_comma && self.separator == b',' {
            return Err(StatsError::ParseError(
                "decimal comma needs a separator other than ','".to_string(),
            ));
        }
        Ok(())
    }

    fn csv_options(&self) -> CsvReadOptions {
        let (separator, decimal_comma, encoding) =
            (self.separator, self.decimal_comma, self.encoding);
        CsvReadOptions::default()
            .with_has_header(self.has_header)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .map_parse_options(move |parse| {
                parse
                    .with_separator(separator)
                    .with_decimal_comma(decimal_comma)
                    .with_encoding(encoding.into())
            })
    }
}

/// Read a CSV file into a `DataFrame`.
pub fn load_csv(path: impl AsRef<Path>, options: &ReadOptions) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(StatsError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("file not found: {}", path.display()),
        )));
    }
    options.validate()?;

    let df = options
        .csv_options()
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .context(format!("Opening '{}'", path.display()))?
        .finish()
        .context(format!("Parsing '{}'", path.display()))?;

    debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "Loaded CSV"
    );
    Ok(df)
}

/// Parse CSV content already held in memory.
pub fn read_csv_bytes(bytes: &[u8], options: &ReadOptions) -> Result<DataFrame> {
    options.validate()?;
    let df = options
        .csv_options()
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .context("Parsing CSV content")?;
    Ok(df)
}

/// Caller-owned cache of parsed tables.
///
/// Entries are keyed by the read options, the content length and two
/// independently seeded 64-bit digests of the content. The content itself is
/// not kept, so a lookup trusts a full key match. When full, the table
/// inserted first is evicted.
pub struct TableCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

static_assertions::assert_impl_all!(TableCache: Send, Sync);

#[derive(Default)]
struct CacheInner {
    tables: HashMap<ContentKey, Arc<DataFrame>>,
    order: VecDeque<ContentKey>,
}

/// Identity of a parsed table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ContentKey {
    len: usize,
    digests: [u64; 2],
    options: ReadOptions,
}

impl ContentKey {
    fn new(bytes: &[u8], options: &ReadOptions) -> Self {
        Self {
            len: bytes.len(),
            digests: [digest(0, bytes), digest(1, bytes)],
            options: options.clone(),
        }
    }
}

fn digest(seed: u64, bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    bytes.hash(&mut hasher);
    hasher.finish()
}

impl TableCache {
    /// Create a cache holding at most `capacity` tables (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.tables.clear();
        inner.order.clear();
    }

    /// Return the cached table for `bytes` + `options`, parsing on a miss.
    pub fn get_or_parse(&self, bytes: &[u8], options: &ReadOptions) -> Result<Arc<DataFrame>> {
        let key = ContentKey::new(bytes, options);
        if let Some(df) = self.inner.lock().tables.get(&key) {
            debug!(len = key.len, "Table cache hit");
            return Ok(Arc::clone(df));
        }

        // Parse without holding the lock.
        let df = Arc::new(read_csv_bytes(bytes, options)?);

        let mut inner = self.inner.lock();
        if let Some(existing) = inner.tables.get(&key) {
            return Ok(Arc::clone(existing));
        }
        while inner.tables.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.tables.remove(&oldest);
            debug!(len = oldest.len, "Evicted table from cache");
        }
        inner.order.push_back(key.clone());
        inner.tables.insert(key, Arc::clone(&df));
        Ok(df)
    }

    /// Read `path` and return its cached table.
    pub fn load(&self, path: impl AsRef<Path>, options: &ReadOptions) -> Result<Arc<DataFrame>> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| StatsError::Io(e).with_context(format!("Reading '{}'", path.display())))?;
        self.get_or_parse(&bytes, options)
    }
}
