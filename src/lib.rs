//! Tool Agents
//!
//! Two LLM tool-use programs over hosted model APIs, a local vector index
//! and a transactional email provider.
//!
//! # Programs
//!
//! - **sales-email**: a Sales Manager agent gathers three drafts from
//!   differently-styled writer agents, picks one, and hands it to an Email
//!   Manager that writes a subject, renders HTML, and sends it via SendGrid
//! - **hybrid-search**: an interactive loop where the model decides per turn
//!   between local vector search, hosted web search, or a direct answer
//!
//! # Modules
//!
//! - [`llm`]: LLM driver trait and Chat Completions / Responses drivers
//! - [`agents`]: agent definitions, the run loop, and the sales workflow
//! - [`hybrid`]: the hybrid search chat loop
//! - [`tools`]: tool trait, registry, and the built-in tools
//! - [`vector`]: embeddings and the persistent local index
//! - [`email`]: email sender trait and SendGrid client
//! - [`history`]: append-only conversation history

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod agents;
pub mod config;
pub mod email;
pub mod error;
pub mod history;
pub mod hybrid;
pub mod llm;
pub mod telemetry;
pub mod tools;
pub mod vector;

pub use error::{Error, Result};
