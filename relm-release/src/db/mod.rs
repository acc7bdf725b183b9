//! JSON-backed stores for relm-release
//!
//! Every store is a single JSON document read whole at the start of a step and
//! written whole at its end (see `relm_common::json_store`).

pub mod composers;
pub mod isrc;
pub mod sessions;
