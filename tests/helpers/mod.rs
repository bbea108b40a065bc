// ABOUTME: Test helper module exports
// ABOUTME: HTTP testing utilities shared across integration tests

pub mod axum_test;
