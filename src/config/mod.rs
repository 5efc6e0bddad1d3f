// ABOUTME: Configuration module grouping environment-driven server settings
// ABOUTME: All configuration is read from environment variables at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! Configuration management.

/// Environment-variable driven server configuration
pub mod environment;

pub use environment::ServerConfig;
