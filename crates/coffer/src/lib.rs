// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `coffer`: drive the authenticated banking client from the command line.

pub mod command;
pub mod config;
