//! Pipeline stages for document-to-illustration generation.
//!
//! Each submodule implements exactly one step, so each can be tested without
//! a live provider.
//!
//! ## Data Flow
//!
//! ```text
//! request ──▶ analysis ──▶ normalize ──▶ parse ──▶ illustration ──▶ data URI
//!            (text model)  (fences)     (JSON)   (image model)
//! ```
//!
//! 1. [`analysis`]: build the grounded prompt, call the reasoning model in
//!    the mode the source kind requires, parse explanation + image prompt
//! 2. [`normalize`]: strip code fences from replies that had no schema
//! 3. [`illustration`]: call the image model and pull the first inline image
//!    out of its reply
//!
//! The image stage never starts before the analysis stage has produced a
//! parsed result.

pub mod analysis;
pub mod illustration;
pub mod normalize;
