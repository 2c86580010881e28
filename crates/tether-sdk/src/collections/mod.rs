// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared in-memory containers.

mod concurrent_map;
mod priority_queue;

pub use concurrent_map::ConcurrentMap;
pub use priority_queue::{Item, PriorityQueue};
