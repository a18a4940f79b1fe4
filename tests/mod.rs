//! Test suite for the report queue
//!
//! This module organizes all integration and property tests
