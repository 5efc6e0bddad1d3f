// ABOUTME: Library root for the gymkit routine assistant server
// ABOUTME: Declares the persistence, generation, protocol, and route modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! # Gymkit
//!
//! An AI-assisted workout routine server. Clients create a routine from
//! a structured questionnaire, then refine it conversationally over a
//! per-routine WebSocket channel (or the equivalent HTTP fallback
//! endpoint). Every accepted edit replaces the whole routine document
//! and is fanned out to all live subscribers of that routine, so
//! multiple open tabs converge on the same state.
//!
//! Generation and image analysis are pluggable capabilities; when they
//! are not configured the server still serves reads, deletes, and the
//! streaming channel, degrading generation requests to clear errors.

#![deny(unsafe_code)]

pub mod config;
pub mod coordinator;
pub mod database;
pub mod errors;
pub mod images;
pub mod llm;
pub mod logging;
pub mod models;
pub mod registry;
pub mod resources;
pub mod routes;
pub mod websocket;
