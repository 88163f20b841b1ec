//! # ql-core
//!
//! Core types for quizlink, the account-linking and access-control layer of
//! the quiz platform.
//!
//! This crate provides the foundational types shared across all quizlink
//! crates:
//! - Entity structs for all domain objects (students, creators, question
//!   banks, access requests, answer logs)
//! - The access-request status enum with its state machine transitions
//! - ID prefix constants

pub mod entities;
pub mod enums;
pub mod ids;
