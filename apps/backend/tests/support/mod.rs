#![allow(dead_code)]

pub mod fakes;
pub mod harness;

pub use harness::{TestApp, TestAppBuilder};
