// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

mod app;

fn main() -> anyhow::Result<()> {
    app::run()
}
