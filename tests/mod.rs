//! Test suite for the pipeline dashboard
//!
//! This module organizes all integration and property tests

pub mod property;
