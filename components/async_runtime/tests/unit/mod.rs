//! Unit tests for async_runtime

mod completion_test;
