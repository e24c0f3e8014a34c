//! RocksDB-backed state store
//!
//! # Column Families
//!
//! - `state` - Flat keyed state (accounts, parameters)
//!
//! Keys are already namespaced by [`crate::keys`], so a single column family
//! is enough. Writes go through one `WriteBatch` and commit atomically.

use crate::{
    error::StoreError,
    store::{
        check_read, check_write, ReadRequest, ReadResponse, ReadResult, StateStore,
        WriteRequest, WriteResponse,
    },
    Config,
};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Options, SingleThreaded, WriteBatch,
};
use std::sync::Arc;

/// Column family handles are plain references with a single-threaded DB
type DB = DBWithThreadMode<SingleThreaded>;

/// Column family names
const CF_STATE: &str = "state";

/// State store wrapper for RocksDB
pub struct RocksStore {
    db: Arc<DB>,
}

impl RocksStore {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self, StoreError> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path).map_err(|e| StoreError::Request(e.to_string()))?;

        // Database options
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![ColumnFamilyDescriptor::new(
            CF_STATE,
            Self::cf_options_state(),
        )];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB state store at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_options_state() -> Options {
        let mut opts = Options::default();
        // State is point-read on every transaction, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false); // 10 bits per key
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(CF_STATE)
            .ok_or_else(|| StoreError::Request(format!("Column family {} not found", CF_STATE)))
    }

    /// Get a value directly
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let cf = self.cf_handle()?;
        Ok(self.db.get_cf(cf, key)?)
    }

    /// Set a value directly, bypassing the batch contract
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let cf = self.cf_handle()?;
        self.db.put_cf(cf, key, value)?;
        Ok(())
    }

    /// Close database (graceful shutdown)
    pub fn close(self) {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
    }
}

impl std::fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksStore")
            .field("path", &self.db.path())
            .finish()
    }
}

impl StateStore for RocksStore {
    fn state_read(&self, request: &ReadRequest) -> Result<ReadResponse, StoreError> {
        if let Some(error) = check_read(request) {
            return Ok(ReadResponse {
                results: vec![],
                error: Some(error),
            });
        }

        let cf = self.cf_handle()?;
        let mut results = Vec::with_capacity(request.keys.len());
        for read in &request.keys {
            results.push(ReadResult {
                query_id: read.query_id,
                value: self.db.get_cf(cf, &read.key)?,
            });
        }

        Ok(ReadResponse {
            results,
            error: None,
        })
    }

    fn state_write(&self, request: &WriteRequest) -> Result<WriteResponse, StoreError> {
        if let Some(error) = check_write(request) {
            return Ok(WriteResponse { error: Some(error) });
        }

        let cf = self.cf_handle()?;
        let mut batch = WriteBatch::default();
        for set in &request.sets {
            batch.put_cf(cf, &set.key, &set.value);
        }
        for delete in &request.deletes {
            batch.delete_cf(cf, &delete.key);
        }

        // Atomic commit
        self.db.write(batch)?;

        tracing::debug!(
            sets = request.sets.len(),
            deletes = request.deletes.len(),
            "Batch committed"
        );

        Ok(WriteResponse { error: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{value_for, DeleteOp, KeyRead, SetOp};
    use tempfile::TempDir;

    fn test_config() -> (Config, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (config, temp_dir)
    }

    #[test]
    fn test_storage_open() {
        let (config, _temp) = test_config();
        let store = RocksStore::open(&config).unwrap();
        assert!(store.db.cf_handle(CF_STATE).is_some());
    }

    #[test]
    fn test_batched_read() {
        let (config, _temp) = test_config();
        let store = RocksStore::open(&config).unwrap();
        store.put(b"present", b"1").unwrap();

        let request = ReadRequest {
            keys: vec![
                KeyRead {
                    query_id: 1,
                    key: b"present".to_vec(),
                },
                KeyRead {
                    query_id: 2,
                    key: b"absent".to_vec(),
                },
            ],
        };
        let results = store.state_read(&request).unwrap().into_result().unwrap();

        assert_eq!(value_for(&results, 1), Some(&b"1"[..]));
        assert_eq!(value_for(&results, 2), None);
    }

    #[test]
    fn test_atomic_write() {
        let (config, _temp) = test_config();
        let store = RocksStore::open(&config).unwrap();
        store.put(b"drained", b"x").unwrap();

        let request = WriteRequest {
            sets: vec![SetOp {
                key: b"credited".to_vec(),
                value: b"y".to_vec(),
            }],
            deletes: vec![DeleteOp {
                key: b"drained".to_vec(),
            }],
        };
        store.state_write(&request).unwrap().into_result().unwrap();

        assert_eq!(store.get(b"credited").unwrap(), Some(b"y".to_vec()));
        assert_eq!(store.get(b"drained").unwrap(), None);
    }

    #[test]
    fn test_reopen_persists() {
        let (config, _temp) = test_config();
        {
            let store = RocksStore::open(&config).unwrap();
            store.put(b"k", b"v").unwrap();
            store.close();
        }

        let store = RocksStore::open(&config).unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_conflicting_write_rejected() {
        let (config, _temp) = test_config();
        let store = RocksStore::open(&config).unwrap();

        let request = WriteRequest {
            sets: vec![SetOp {
                key: b"k".to_vec(),
                value: b"v".to_vec(),
            }],
            deletes: vec![DeleteOp { key: b"k".to_vec() }],
        };
        let response = store.state_write(&request).unwrap();

        assert!(response.error.is_some());
        assert_eq!(store.get(b"k").unwrap(), None);
    }
}
