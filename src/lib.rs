// Copyright (c) 2026 Aclinspect
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

//! Aclinspect - operator tooling for space ACL logs.
//!
//! This crate provides:
//! - Decoding of the nested root and delta record envelopes, with the failing stage named
//! - Tab-separated audit lines per root record and per delta operation
//! - Membership summaries (owner, open invites, per-status and per-role counts)
//! - Record sources and state builders behind traits, with file and replay implementations

/// ACL record interpretation.
pub mod acl;
/// Configuration loading.
pub mod config;
/// Wire types, identities and keys.
pub mod core;
/// Log and summary commands.
pub mod inspector;
/// Observability (structured logging).
pub mod monitoring;
/// Record sources.
pub mod source;
