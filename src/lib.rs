// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Parameter Mutation Library
 * Exposes the mutation engine, XML mutator and dispatcher for testing
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod config;
pub mod errors;
pub mod http_client;
pub mod input;
pub mod modifiers;
pub mod request;
pub mod reporting;
pub mod runner;

// Mutation engine (structured bodies and query maps)
pub mod mutation;

// Element-tree bodies
pub mod xml_mutator;

pub use errors::{DispatchError, MutatorError, MutatorResult};
pub use modifiers::{Modifier, ModifierCatalog, ValuePattern};
pub use mutation::{classify, DataType};
pub use request::{Body, FuzzRequest, Section};
