//! HTTP middleware helpers.

pub mod request_id;
