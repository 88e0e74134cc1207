//! Core data models for Issue Scribe.
//!
//! This crate provides the fundamental data types shared by every Issue Scribe
//! crate: sessions and their collected bundles, generated and created issues,
//! and the typed records returned by project board queries.

pub mod ids;
pub mod issue;
pub mod project;
pub mod session;

// Re-export main types
pub use ids::SessionId;
pub use issue::{CreatedIssue, GeneratedIssue, IssueBatch};
pub use project::{IssueContent, ProjectHandle, ProjectItem, StatusField, StatusOption};
pub use session::{
    Bundle, Contribution, Conversation, InboundMessage, InvalidTransition, Session, SessionMode,
    SessionState, UserRef, EDIT_INSTRUCTION_TAG,
};
