//! Web boundary helpers. Service code never imports from here.

pub mod trace_ctx;
