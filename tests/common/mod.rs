//! Shared helpers for integration test targets.

#![allow(dead_code)]
