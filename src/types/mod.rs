/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types that are used across multiple components of the node.
//!
//! Types specific to a single component live next to that component, e.g., the error types of
//! [`crate::header_chain`].

pub mod data_types;

pub mod header;

pub mod node;
