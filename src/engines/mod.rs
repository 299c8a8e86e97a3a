// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod browser_engine;
pub mod dynamic_extractor;
pub mod reqwest_engine;
pub mod scroll_discovery;
pub mod static_extractor;
pub mod traits;
