// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Record output helpers

use anyhow::{Context, Result};
use serde::Serialize;

/// Pretty JSON rendering of any record or list of records
pub fn render<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", render(value)?);
    Ok(())
}
