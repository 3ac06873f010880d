pub mod request_trace;
pub mod structured_logger;
