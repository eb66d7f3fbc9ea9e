//! # arbor-core
//!
//! Foundation types for the Arbor conversation-tree service.
//!
//! This crate provides the shared vocabulary that all other Arbor crates
//! depend on:
//!
//! - **Messages**: [`messages::ChatMessage`] and [`messages::Role`], the
//!   ordered role-tagged message list fed to the language model
//! - **Text**: [`text::clamp_words`] word-bounded clamping used by the
//!   summarizer safety net
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other arbor crates.

#![deny(unsafe_code)]

pub mod messages;
pub mod text;
