// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline adapters for the Freedom migration pipeline.
//!
//! - [`ArchiveSource`] pages through a downloaded JSON export of a social
//!   network account.
//! - [`ExportDestination`] writes each post and comment as a JSON file, laid
//!   out the way the Dropbox destination lays out its files.

pub mod archive;
pub mod export;
pub mod filter;

pub use archive::ArchiveSource;
pub use export::ExportDestination;
