// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Common Modul for the GPS driver
//!
//! Provides the common data types that are used across every modul: the decoded
//! sentence fields, the reported coordinates and altitude and the power state of
//! the receiver.

pub mod position;
pub mod power;
pub mod sentence;
pub mod serde;
