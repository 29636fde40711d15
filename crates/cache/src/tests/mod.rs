//! End-to-end tests for the cache
