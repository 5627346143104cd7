//! Observability for the forward-auth core.
//!
//! Tracing is initialised by the embedding process through
//! `common::observability`. This module only defines the metrics the
//! decision core records.

pub mod metrics;
