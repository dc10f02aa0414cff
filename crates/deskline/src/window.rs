// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket window flags.

use chrono::{Days, NaiveDate, NaiveDateTime};
use clap::Args;
use deskline_core::DesklineError;
use deskline_liveagent::TicketWindow;

/// Either a created-between range or a changed-since bound. With no flags
/// the window is yesterday's tickets.
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// First creation day, inclusive (YYYY-MM-DD).
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last creation day, inclusive. Defaults to --start.
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Select tickets changed at or after this time instead.
    #[arg(long, value_parser = parse_timestamp, conflicts_with_all = ["start", "end"])]
    pub changed_since: Option<NaiveDateTime>,
}

impl WindowArgs {
    pub fn resolve(&self, today: NaiveDate) -> Result<TicketWindow, DesklineError> {
        if let Some(since) = self.changed_since {
            return Ok(TicketWindow::ChangedSince(since));
        }

        let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
        let start = self.start.or(self.end).unwrap_or(yesterday);
        let end = self.end.unwrap_or(start);
        if end < start {
            return Err(DesklineError::Config(format!(
                "window end {end} is before start {start}"
            )));
        }
        Ok(TicketWindow::Created { start, end })
    }
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, or a bare date.
fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("expected YYYY-MM-DD [HH:MM:SS], got `{raw}`"))
}
