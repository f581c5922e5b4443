// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for the contact gate.
//!
//! Provides a recording delivery double and fixtures shared by the
//! integration tests.

#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;
