// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod crawl_session_test;
pub mod helpers;
pub mod redis_backend_test;
pub mod retry_exhaustion_test;
pub mod worker_pool_test;
