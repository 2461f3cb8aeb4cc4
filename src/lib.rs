// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Stakeledger - pooled staking ledger service.
//!
//! This repository provides:
//! - Fixed-point amounts, identifiers and canonical record encoding
//! - Pool and stake ledgers with integer reward accrual
//! - A sled-backed store with atomic multi-record commits
//! - An orchestration layer that verifies transactions before committing
//! - An axum HTTP surface, Prometheus metrics and structured logging

/// HTTP routes, envelope and caller authentication.
pub mod api;
/// Ledger primitives (types, economics, state, service, config).
pub mod core;
/// Observability (metrics).
pub mod monitoring;
