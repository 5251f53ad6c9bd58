//! Shared utilities and common types for the wiki admin backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Offset pagination metadata
//! - Password hashing with Argon2id and temporary password generation
//! - Session token signing and verification
//! - Common validation logic

pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
