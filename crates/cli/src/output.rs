// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text/JSON output switch: the one helper this CLI's commands need.

use clap::ValueEnum;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Prints `data` as pretty JSON when `format` is `Json`, otherwise runs
/// `text_fn`.
pub fn format_or_json(
    format: OutputFormat,
    data: serde_json::Value,
    text_fn: impl FnOnce(),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&data)?),
        OutputFormat::Text => text_fn(),
    }
    Ok(())
}
