// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

pub mod exporter;
pub mod importer;
pub(crate) mod padom;
pub(crate) mod padom_creator;
pub(crate) mod panode_container;
pub(crate) mod rules;
pub mod sanitizer;
pub mod url_policy;

pub use exporter::{export_html, ExportContext, ExportOptions, Exported};
pub use importer::{
    import_html, ImportOptions, Imported, MAX_IMPORT_DEPTH,
};
pub use sanitizer::{
    sanitize, sanitize_with, SanitizeOptions, SanitizeReport, Sanitized,
};
pub use url_policy::{is_allowed_frame, is_safe_url, UrlUse};
