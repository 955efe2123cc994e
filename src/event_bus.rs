/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The thread that receives [events](crate::events) and fires the handlers registered for them.

use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::events::*;
use crate::logging::Logger;

pub(crate) type HandlerPtr<T> = Box<dyn Fn(&T) + Send>;

// How long the event bus waits for an event before checking for the shutdown signal again.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The handlers registered for each kind of event. If logging is enabled, the default
/// [logger](crate::logging::Logger) of each event is registered first.
pub(crate) struct EventHandlers {
    pub(crate) update_head_handlers: Vec<HandlerPtr<UpdateHeadEvent>>,
    pub(crate) rewind_chain_handlers: Vec<HandlerPtr<RewindChainEvent>>,
    pub(crate) insert_header_handlers: Vec<HandlerPtr<InsertHeaderEvent>>,
    pub(crate) expire_node_handlers: Vec<HandlerPtr<ExpireNodeEvent>>,
    pub(crate) sweep_nodes_handlers: Vec<HandlerPtr<SweepNodesEvent>>,
}

impl EventHandlers {
    pub(crate) fn new(
        log_events: bool,
        on_update_head: Option<HandlerPtr<UpdateHeadEvent>>,
        on_rewind_chain: Option<HandlerPtr<RewindChainEvent>>,
        on_insert_header: Option<HandlerPtr<InsertHeaderEvent>>,
        on_expire_node: Option<HandlerPtr<ExpireNodeEvent>>,
        on_sweep_nodes: Option<HandlerPtr<SweepNodesEvent>>,
    ) -> EventHandlers {
        EventHandlers {
            update_head_handlers: handlers(log_events, on_update_head),
            rewind_chain_handlers: handlers(log_events, on_rewind_chain),
            insert_header_handlers: handlers(log_events, on_insert_header),
            expire_node_handlers: handlers(log_events, on_expire_node),
            sweep_nodes_handlers: handlers(log_events, on_sweep_nodes),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.update_head_handlers.is_empty()
            && self.rewind_chain_handlers.is_empty()
            && self.insert_header_handlers.is_empty()
            && self.expire_node_handlers.is_empty()
            && self.sweep_nodes_handlers.is_empty()
    }

    pub(crate) fn fire_handlers(&self, event: Event) {
        match event {
            Event::UpdateHead(update_head_event) => self
                .update_head_handlers
                .iter()
                .for_each(|handler| handler(&update_head_event)),

            Event::RewindChain(rewind_chain_event) => self
                .rewind_chain_handlers
                .iter()
                .for_each(|handler| handler(&rewind_chain_event)),

            Event::InsertHeader(insert_header_event) => self
                .insert_header_handlers
                .iter()
                .for_each(|handler| handler(&insert_header_event)),

            Event::ExpireNode(expire_node_event) => self
                .expire_node_handlers
                .iter()
                .for_each(|handler| handler(&expire_node_event)),

            Event::SweepNodes(sweep_nodes_event) => self
                .sweep_nodes_handlers
                .iter()
                .for_each(|handler| handler(&sweep_nodes_event)),
        }
    }
}

fn handlers<T: Logger>(
    log_events: bool,
    user_handler: Option<HandlerPtr<T>>,
) -> Vec<HandlerPtr<T>> {
    let mut handlers = Vec::new();
    if log_events {
        handlers.push(T::get_logger());
    }
    if let Some(user_handler) = user_handler {
        handlers.push(user_handler);
    }
    handlers
}

/// Start the event bus thread. The thread exits when `shutdown_signal` fires, or when every
/// publisher of `event_subscriber` has been dropped and the remaining events have been handled.
pub(crate) fn start_event_bus(
    event_handlers: EventHandlers,
    event_subscriber: Receiver<Event>,
    shutdown_signal: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || loop {
        match shutdown_signal.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => return,
            Err(TryRecvError::Empty) => (),
        }

        match event_subscriber.recv_timeout(POLL_INTERVAL) {
            Ok(event) => event_handlers.fire_handlers(event),
            Err(RecvTimeoutError::Timeout) => (),
            Err(RecvTimeoutError::Disconnected) => return,
        }
    })
}
