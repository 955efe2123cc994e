/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Opening, versioning, and closing the discovery database, and its expiry thread.

use std::{
    fs,
    ops::Deref,
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, RecvTimeoutError, Sender},
        Once,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use parking_lot::Mutex;
use typed_builder::TypedBuilder;

use crate::{
    events::Event,
    kv_store::{KVStore, KVStoreError, MemDB, SledDB},
    types::data_types::NodeID,
};

use super::{codec, keys, records::NodeRecords};

/// Nodes that have not answered a ping for this long are deleted by the expiry sweep.
pub const NODE_EXPIRATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Time between two runs of the expiry sweep.
pub const CLEANUP_CYCLE: Duration = Duration::from_secs(60 * 60);

/// Stores the parameters of a [`NodeDB`]:
/// 1. The id of the local node, whose records are never expired.
/// 2. Where to keep the database on disk. If unset, [`NodeDB::open`] keeps it in memory.
/// 3. The schema version. A database written with a different version is wiped on open.
/// 4. How long a node may go without answering a ping before it is expired.
/// 5. How often the expiry sweep runs.
///
/// ```ignore
/// let configuration = NodeDBConfiguration::builder()
///     .me(node_id)
///     .path(PathBuf::from("nodes"))
///     .version(4)
///     .build();
/// ```
#[derive(Clone, Debug, TypedBuilder)]
#[builder(builder_method(doc = "
    Create a builder for building a [NodeDBConfiguration]. On the builder call the following methods to construct a valid [NodeDBConfiguration].

    Required:
    - `.me(...)`

    Optional:
    - `.path(...)`
    - `.version(...)`
    - `.expiration(...)`
    - `.cleanup_cycle(...)`
"))]
pub struct NodeDBConfiguration {
    #[builder(setter(doc = "Set the id of the local node. Required."))]
    pub me: NodeID,
    #[builder(default, setter(strip_option, doc = "Set the directory of the on-disk database. Optional (default: in memory)."))]
    pub path: Option<PathBuf>,
    #[builder(default, setter(doc = "Set the schema version. Optional (default 0)."))]
    pub version: u32,
    #[builder(default = NODE_EXPIRATION, setter(doc = "Set the expiration period of nodes. Optional (default 24 hours)."))]
    pub expiration: Duration,
    #[builder(default = CLEANUP_CYCLE, setter(doc = "Set the time between two expiry sweeps. Optional (default 1 hour)."))]
    pub cleanup_cycle: Duration,
}

/// The discovery database: every node known to the discovery layer, and when it was last seen.
///
/// All record accessors live on [`NodeRecords`], which `NodeDB` dereferences to. On top of them,
/// `NodeDB` owns the database's lifecycle:
/// - Opening checks the stored schema version, and wipes the database if it differs.
/// - [`ensure_expirer`](Self::ensure_expirer) starts the background expiry sweep, at most once.
/// - [`close`](Self::close) stops the sweep and flushes the store. Dropping a `NodeDB` stops the
///   sweep too, but does not report flush errors.
pub struct NodeDB<K: KVStore> {
    records: NodeRecords<K>,
    cleanup_cycle: Duration,
    runner: Once,
    expirer: Mutex<Option<(Sender<()>, JoinHandle<()>)>>,
}

impl NodeDB<MemDB> {
    /// Open a database that lives in memory only.
    pub fn in_memory(configuration: NodeDBConfiguration) -> Result<NodeDB<MemDB>, NodeDBError> {
        NodeDB::with_store(MemDB::new(), configuration)
    }
}

impl NodeDB<SledDB> {
    /// Open the database at `configuration.path`, or a temporary in-memory sled database if no path
    /// is set.
    pub fn open(configuration: NodeDBConfiguration) -> Result<NodeDB<SledDB>, NodeDBError> {
        if configuration.path.is_some() {
            NodeDB::persistent(configuration)
        } else {
            NodeDB::with_store(SledDB::temporary()?, configuration)
        }
    }

    /// Open the on-disk database at `configuration.path`.
    ///
    /// If the database there was written with a different schema version, its directory is
    /// removed and a fresh database is created in its place. No data is carried over.
    pub fn persistent(configuration: NodeDBConfiguration) -> Result<NodeDB<SledDB>, NodeDBError> {
        let path = configuration
            .path
            .clone()
            .ok_or(NodeDBError::MissingPath)?;

        let kv_store = SledDB::open(&path)?;
        let kv_store = match check_version(&kv_store, configuration.version)? {
            VersionCheck::Matches => kv_store,
            VersionCheck::Mismatch(stored) => {
                warn_version_mismatch(stored, configuration.version);
                drop(kv_store);
                recreate(&path, configuration.version)?
            }
        };

        Ok(NodeDB::from_parts(kv_store, configuration))
    }
}

impl<K: KVStore> NodeDB<K> {
    /// Open a database over a caller-provided store.
    ///
    /// The store should be dedicated to the database: on a schema version mismatch, the whole store
    /// is [cleared](KVStore::clear), not just the discovery keys.
    pub fn with_store(
        kv_store: K,
        configuration: NodeDBConfiguration,
    ) -> Result<NodeDB<K>, NodeDBError> {
        if let VersionCheck::Mismatch(stored) = check_version(&kv_store, configuration.version)? {
            warn_version_mismatch(stored, configuration.version);
            kv_store.clear()?;
            write_version(&kv_store, configuration.version)?;
        }
        Ok(NodeDB::from_parts(kv_store, configuration))
    }

    fn from_parts(kv_store: K, configuration: NodeDBConfiguration) -> NodeDB<K> {
        NodeDB {
            records: NodeRecords {
                kv_store,
                me: configuration.me,
                expiration: configuration.expiration,
                event_publisher: None,
            },
            cleanup_cycle: configuration.cleanup_cycle,
            runner: Once::new(),
            expirer: Mutex::new(None),
        }
    }

    /// Publish events about expired nodes and finished sweeps on `event_publisher`. Must be called
    /// before [`ensure_expirer`](Self::ensure_expirer) for the sweep thread to publish too.
    pub fn with_event_publisher(mut self, event_publisher: Sender<Event>) -> Self {
        self.records.event_publisher = Some(event_publisher);
        self
    }

    pub fn records(&self) -> &NodeRecords<K> {
        &self.records
    }

    /// Start the expiry sweep in a background thread, unless it has already been started. The
    /// sweep runs once every cleanup cycle, starting one cycle from now.
    pub fn ensure_expirer(&self) {
        self.runner.call_once(|| {
            let (shutdown, shutdown_receiver) = mpsc::channel();
            let records = self.records.clone();
            let cleanup_cycle = self.cleanup_cycle;
            let handle = thread::spawn(move || loop {
                match shutdown_receiver.recv_timeout(cleanup_cycle) {
                    Err(RecvTimeoutError::Timeout) => {
                        if let Err(err) = records.expire_nodes() {
                            log::error!("Failed to expire nodes: {}", err);
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                }
            });
            *self.expirer.lock() = Some((shutdown, handle));
        });
    }

    /// Stop the expiry sweep and flush the store.
    ///
    /// A sweep that is already running finishes before this returns. Once it has returned, the
    /// same on-disk database can be opened again right away.
    pub fn close(self) -> Result<(), NodeDBError> {
        self.shutdown()
    }

    // Shared by `close` and owners that cannot give up their `NodeDB` by value.
    pub(crate) fn shutdown(&self) -> Result<(), NodeDBError> {
        self.stop_expirer();
        self.records.kv_store.flush()?;
        Ok(())
    }

    fn stop_expirer(&self) {
        let expirer = self.expirer.lock().take();
        if let Some((shutdown, handle)) = expirer {
            let _ = shutdown.send(());
            if handle.join().is_err() {
                log::error!("Node expiry thread panicked");
            }
        }
    }
}

impl<K: KVStore> Deref for NodeDB<K> {
    type Target = NodeRecords<K>;

    fn deref(&self) -> &NodeRecords<K> {
        &self.records
    }
}

impl<K: KVStore> Drop for NodeDB<K> {
    fn drop(&mut self) {
        self.stop_expirer();
    }
}

enum VersionCheck {
    Matches,
    Mismatch(Option<i64>),
}

// Writes the version into a fresh store.
fn check_version<K: KVStore>(kv_store: &K, version: u32) -> Result<VersionCheck, NodeDBError> {
    let current = codec::encode_i64(i64::from(version));
    match kv_store.try_get(keys::VERSION_KEY)? {
        None => {
            kv_store.set(keys::VERSION_KEY, &current)?;
            Ok(VersionCheck::Matches)
        }
        Some(stored) if stored == current => Ok(VersionCheck::Matches),
        Some(stored) => Ok(VersionCheck::Mismatch(codec::decode_i64(&stored))),
    }
}

fn write_version<K: KVStore>(kv_store: &K, version: u32) -> Result<(), NodeDBError> {
    Ok(kv_store.set(keys::VERSION_KEY, &codec::encode_i64(i64::from(version)))?)
}

fn warn_version_mismatch(stored: Option<i64>, version: u32) {
    log::warn!(
        "Discovery database version mismatch (stored {:?}, expected {}), discarding all records",
        stored,
        version
    );
}

fn recreate(path: &Path, version: u32) -> Result<SledDB, NodeDBError> {
    fs::remove_dir_all(path)?;
    let kv_store = SledDB::open(path)?;
    write_version(&kv_store, version)?;
    Ok(kv_store)
}

/// Error when opening, writing to, or closing a [`NodeDB`].
#[derive(Debug, thiserror::Error)]
pub enum NodeDBError {
    #[error(transparent)]
    KVStoreError(#[from] KVStoreError),

    #[error("failed to remove outdated database: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize value for key {key:?}: {source}")]
    SerializeValueError {
        key: Vec<u8>,
        source: std::io::Error,
    },

    #[error("no path configured for an on-disk database")]
    MissingPath,
}
