//! VaultNexus - A digital-asset marketplace ledger
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Marketplace
//! - [`marketplace`] - Asset registry state machine and its operations
//! - [`registry`] - Asset, purchase and feedback record types
//! - [`settlement`] - Payment settlement and royalty splits
//!
//! ## State Management
//! - [`persistence`] - Database layer (SQLite)
//!
//! ## Integration
//! - [`api`] - REST API server
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`identity`] - Principal identities
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Marketplace
// ============================================================================
pub mod marketplace;
pub mod registry;
pub mod settlement;

// ============================================================================
// State Management
// ============================================================================
pub mod persistence;

// ============================================================================
// Integration
// ============================================================================
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
pub mod identity;
