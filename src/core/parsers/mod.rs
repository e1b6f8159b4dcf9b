// src/core/parsers/mod.rs
//
// Pure functions over captured stdout text. The underlying tool's listing
// and help output is not a stable machine format, so each parser anchors on
// structural cues (quotes, identifier shape, header phrases) instead of
// exact column layout.

pub mod dir_list;
pub mod name_list;
pub mod runners;
