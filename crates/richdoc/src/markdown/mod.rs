// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Markdown transformers.
//!
//! Raw `<iframe src="...">` markup stands for a video node in both
//! directions.

mod export;
mod import;

pub use export::export_markdown;
pub use import::import_markdown;
