// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extract-and-load pipeline for deskline.
//!
//! The [`Pipeline`] is the central coordinator that:
//! - Checks the upstream is reachable before every operation
//! - Fetches tickets, message threads, agents, tags, and users
//! - Resolves message senders and receivers against the agent directory
//! - Shapes each batch (timezone shift, custom field unwrapping, pruning)
//! - Infers a schema and hands the batch to the warehouse loader

pub mod crossref;
pub mod envelope;
pub mod orchestrator;
pub mod transform;

pub use crossref::{Parties, PartyType, TicketContext, message_rows, resolve_parties};
pub use envelope::{ErrorEnvelope, ErrorStatus, OperationResult};
pub use orchestrator::{Operation, Pipeline};
pub use transform::Localizer;
