// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model: boxes, labels and per-image records.

pub mod annotation;
pub mod labels;
pub mod project;
