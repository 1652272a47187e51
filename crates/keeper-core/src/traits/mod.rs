// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Traits use `#[async_trait]` so backends can be held as `Arc<dyn _>`.

pub mod storage;

pub use storage::StorageAdapter;
