/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Methods to build and start the storage core of a full node.
//!
//! The key components of this module are:
//! - The builder-pattern interface to construct a [specification of the node](NodeSpec) with:
//!   1. `NodeSpec::builder` to construct a `NodeSpecBuilder`,
//!   2. The setters of the `NodeSpecBuilder`, and
//!   3. The `NodeSpecBuilder::build` method to construct a [NodeSpec],
//! - The function to [start](NodeSpec::start) a [Node] given its specification,
//! - [The type](Node) which keeps the node's background threads alive.
//!
//! ## Starting a node
//!
//! ```ignore
//! let node =
//!     NodeSpec::builder()
//!     .chain_store(chain_store)
//!     .discovery_store(discovery_store)
//!     .engine(engine)
//!     .genesis(genesis)
//!     .node_db_configuration(node_db_configuration)
//!     .log_events(true)
//!     .on_rewind_chain(rewind_handler)
//!     .build()
//!     .start()?;
//! ```
//!
//! ### Required setters
//!
//! - `.chain_store(...)`: the key-value store of the header chain.
//! - `.discovery_store(...)`: the key-value store of the discovery database. It must be a different
//!   store from the chain store, since a schema version change clears it entirely.
//! - `.engine(...)`
//! - `.genesis(...)`: written into the chain store if the store is fresh.
//! - `.node_db_configuration(...)`
//!
//! ### Optional setters
//!
//! - `.header_chain_configuration(...)`
//! - `.log_events(...)`
//! - The handlers for events from [crate::events]: `.on_update_head(...)`, `.on_rewind_chain(...)`,
//!   `.on_insert_header(...)`, `.on_expire_node(...)`, `.on_sweep_nodes(...)`.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::{self, Sender},
    Arc,
};
use std::thread::JoinHandle;

use typed_builder::TypedBuilder;

use crate::{
    blockchain::BlockChain,
    consensus::ConsensusEngine,
    discovery::{NodeDB, NodeDBConfiguration, NodeDBError},
    event_bus::*,
    events::*,
    header_chain::{setup_genesis, HeaderChain, HeaderChainConfiguration, HeaderChainError},
    kv_store::KVStore,
    types::header::Header,
};

/// Stores all parameters and trait implementations required to start a [Node].
#[derive(TypedBuilder)]
#[builder(builder_method(doc = "
    Create a builder for building a [NodeSpec]. On the builder call the following methods to construct a valid [NodeSpec].

    Required:
    - `.chain_store(...)`
    - `.discovery_store(...)`
    - `.engine(...)`
    - `.genesis(...)`
    - `.node_db_configuration(...)`

    Optional:
    - `.header_chain_configuration(...)`
    - `.log_events(...)`
    - `.on_update_head(...)`
    - `.on_rewind_chain(...)`
    - `.on_insert_header(...)`
    - `.on_expire_node(...)`
    - `.on_sweep_nodes(...)`
"))]
pub struct NodeSpec<K: KVStore, D: KVStore, E: ConsensusEngine> {
    #[builder(setter(doc = "Set the key-value store of the header chain. Required."))]
    chain_store: K,
    #[builder(setter(doc = "Set the key-value store of the discovery database. Required."))]
    discovery_store: D,
    #[builder(setter(doc = "Set the consensus engine that verifies inserted headers. Required."))]
    engine: E,
    #[builder(setter(doc = "Set the genesis header. Required."))]
    genesis: Header,
    #[builder(setter(doc = "Set the [configuration](NodeDBConfiguration) of the discovery database. Required."))]
    node_db_configuration: NodeDBConfiguration,
    #[builder(default, setter(doc = "Set the [configuration](HeaderChainConfiguration) of the header chain. Optional."))]
    header_chain_configuration: HeaderChainConfiguration,
    #[builder(default, setter(doc = "Enable logging of events? Optional (default false)."))]
    log_events: bool,

    // Event handlers
    #[builder(default, setter(transform = |handler: impl Fn(&UpdateHeadEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<UpdateHeadEvent>),
    doc = "Register a user-defined handler for [UpdateHeadEvent]. Optional."))]
    on_update_head: Option<HandlerPtr<UpdateHeadEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&RewindChainEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<RewindChainEvent>),
    doc = "Register a user-defined handler for [RewindChainEvent]. Optional."))]
    on_rewind_chain: Option<HandlerPtr<RewindChainEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&InsertHeaderEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<InsertHeaderEvent>),
    doc = "Register a user-defined handler for [InsertHeaderEvent]. Optional."))]
    on_insert_header: Option<HandlerPtr<InsertHeaderEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ExpireNodeEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<ExpireNodeEvent>),
    doc = "Register a user-defined handler for [ExpireNodeEvent]. Optional."))]
    on_expire_node: Option<HandlerPtr<ExpireNodeEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&SweepNodesEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<SweepNodesEvent>),
    doc = "Register a user-defined handler for [SweepNodesEvent]. Optional."))]
    on_sweep_nodes: Option<HandlerPtr<SweepNodesEvent>>,
}

impl<K: KVStore, D: KVStore, E: ConsensusEngine> NodeSpec<K, D, E> {
    /// Open the header chain and the discovery database, start the expiry sweep and (if any
    /// handler is registered) the event bus, and return the handles to them in a [Node].
    pub fn start(self) -> Result<Node<K, D, E>, NodeError> {
        setup_genesis(&self.chain_store, &self.genesis)?;

        let event_handlers = EventHandlers::new(
            self.log_events,
            self.on_update_head,
            self.on_rewind_chain,
            self.on_insert_header,
            self.on_expire_node,
            self.on_sweep_nodes,
        );

        let (event_publisher, event_subscriber) = if !event_handlers.is_empty() {
            Some(mpsc::channel()).unzip()
        } else {
            (None, None)
        };

        let interrupted = Arc::new(AtomicBool::new(false));
        let interrupt = {
            let interrupted = Arc::clone(&interrupted);
            move || interrupted.load(Ordering::Relaxed)
        };

        let mut header_chain = HeaderChain::with_configuration(
            self.chain_store,
            self.engine,
            interrupt,
            self.header_chain_configuration,
        )?;
        let mut node_db = NodeDB::with_store(self.discovery_store, self.node_db_configuration)?;
        if let Some(event_publisher) = &event_publisher {
            header_chain = header_chain.with_event_publisher(event_publisher.clone());
            node_db = node_db.with_event_publisher(event_publisher.clone());
        }
        node_db.ensure_expirer();

        let (event_bus, event_bus_shutdown) = match event_subscriber {
            Some(event_subscriber) => {
                let (event_bus_shutdown, event_bus_shutdown_receiver) = mpsc::channel();
                let event_bus =
                    start_event_bus(event_handlers, event_subscriber, event_bus_shutdown_receiver);
                (Some(event_bus), Some(event_bus_shutdown))
            }
            None => (None, None),
        };

        Ok(Node {
            blockchain: Arc::new(BlockChain::new(header_chain)),
            node_db,
            interrupted,
            event_bus,
            event_bus_shutdown,
        })
    }
}

/// A handle to a running node. When this value is dropped, any header insertion in progress is
/// interrupted, and all background threads are shut down.
pub struct Node<K: KVStore, D: KVStore, E: ConsensusEngine> {
    blockchain: Arc<BlockChain<K, E>>,
    node_db: NodeDB<D>,
    interrupted: Arc<AtomicBool>,
    event_bus: Option<JoinHandle<()>>,
    event_bus_shutdown: Option<Sender<()>>,
}

impl<K: KVStore, D: KVStore, E: ConsensusEngine> Node<K, D, E> {
    /// Get the block chain. The returned handle can be shared with other threads.
    pub fn blockchain(&self) -> &Arc<BlockChain<K, E>> {
        &self.blockchain
    }

    pub fn node_db(&self) -> &NodeDB<D> {
        &self.node_db
    }

    /// Shut the node down, and flush the discovery database.
    pub fn close(self) -> Result<(), NodeError> {
        self.interrupted.store(true, Ordering::Relaxed);
        self.node_db.shutdown()?;
        Ok(())
    }
}

impl<K: KVStore, D: KVStore, E: ConsensusEngine> Drop for Node<K, D, E> {
    fn drop(&mut self) {
        self.interrupted.store(true, Ordering::Relaxed);

        if let Some(shutdown) = self.event_bus_shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(event_bus) = self.event_bus.take() {
            if event_bus.join().is_err() {
                log::error!("Event bus thread panicked");
            }
        }
    }
}

/// Error when starting or closing a [`Node`].
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error(transparent)]
    HeaderChainError(#[from] HeaderChainError),

    #[error(transparent)]
    NodeDBError(#[from] NodeDBError),
}
