// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! annobox - bounding-box annotation for image datasets.
//!
//! The [`editor`] module is a headless editing engine: coordinate mapping,
//! hit-testing, the draw/move/resize state machine and a surface-agnostic
//! renderer. The desktop host in the `annobox` binary drives it with egui.

pub mod config;
pub mod editor;
pub mod io;
pub mod models;
pub mod util;
