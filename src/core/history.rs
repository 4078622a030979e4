//! Realized PnL history
//!
//! The venue's history endpoint returns at most one page (`page_limit`
//! records, latest first within the window) and refuses windows wider than
//! `max_lookback_ms`. `fetch_pnls` walks backwards from `end` in sub-windows:
//!
//! - a full page moves `end` back to the oldest record seen (or 1ms
//!   earlier when every record on the page sits at `end`)
//! - a short or empty page from a clamped sub-window moves `end` back to the
//!   sub-window's start
//! - otherwise, or once a record at or before `start` appears, it stops
//!
//! Each continuing iteration strictly decreases `end`, so the walk terminates.
//!
//! Limitation: the venue cannot page within a single millisecond. If more
//! than `page_limit` records share one timestamp, only the ones returned on
//! that page are collected; the 1ms step-back skips the rest (logged as a
//! warning). With the venue's page of 1000 this does not occur in practice.

use std::collections::HashMap;

use tracing::{debug, error, warn};

use crate::adapters::errors::ExchangeResult;
use crate::adapters::traits::VenueClient;
use crate::core::gateway::Gateway;
use crate::core::normalize::normalize_pnl;
use crate::core::types::{current_time_ms, PnlRecord};

const ONE_DAY_MS: u64 = 86_400_000;

impl<C: VenueClient + 'static> Gateway<C> {
    /// Single page of PnL records, ascending by timestamp
    ///
    /// Defaults: `end = now + 1 day`, `start = end - max_lookback`; a
    /// `start` further back than the lookback is clamped.
    pub async fn fetch_pnl(&self, start_ms: Option<u64>, end_ms: Option<u64>) -> Option<Vec<PnlRecord>> {
        match self.pnl_page(start_ms, end_ms).await {
            Ok(records) => Some(records),
            Err(e) => {
                error!(start_ms = ?start_ms, end_ms = ?end_ms, error = %e, "[HISTORY] PnL query failed");
                None
            }
        }
    }

    /// Deduplicated PnL records in `[start, end)`, ascending by timestamp
    ///
    /// Without `start` this is a single page. A failed page fails the whole
    /// query.
    pub async fn fetch_pnls(&self, start_ms: Option<u64>, end_ms: Option<u64>) -> Option<Vec<PnlRecord>> {
        let Some(start) = start_ms else {
            return self.fetch_pnl(None, end_ms).await;
        };
        let end = end_ms.unwrap_or_else(|| current_time_ms() + ONE_DAY_MS);
        if start >= end {
            return Some(Vec::new());
        }

        match self.paginate(start, end).await {
            Ok(records) => Some(records),
            Err(e) => {
                error!(start_ms = start, end_ms = end, error = %e, "[HISTORY] PnL pagination failed");
                None
            }
        }
    }

    async fn pnl_page(&self, start_ms: Option<u64>, end_ms: Option<u64>) -> ExchangeResult<Vec<PnlRecord>> {
        let lookback = self.settings.max_lookback_ms;
        let end = end_ms.unwrap_or_else(|| current_time_ms() + ONE_DAY_MS);
        let earliest = end.saturating_sub(lookback);
        let start = start_ms.map_or(earliest, |s| s.max(earliest));

        let raw = self
            .venue
            .fetch_order_history(start, end, self.settings.page_limit)
            .await?;
        let mut records: Vec<PnlRecord> = raw.iter().map(normalize_pnl).collect();
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn paginate(&self, start: u64, end: u64) -> ExchangeResult<Vec<PnlRecord>> {
        let page_limit = self.settings.page_limit;
        let lookback = self.settings.max_lookback_ms;
        let mut seen: HashMap<String, PnlRecord> = HashMap::new();
        let mut cursor = end;
        let mut pages = 0usize;

        loop {
            let window_start = start.max(cursor.saturating_sub(lookback));
            let clamped = window_start > start;
            let page = self.pnl_page(Some(window_start), Some(cursor)).await?;
            pages += 1;

            let fetched = page.len();
            let oldest = page.first().map(|r| r.timestamp);
            for record in page {
                seen.insert(record.id.clone(), record);
            }
            debug!(
                page = pages,
                window_start,
                window_end = cursor,
                fetched,
                total = seen.len(),
                "[HISTORY] PnL page"
            );

            match oldest {
                Some(oldest) if oldest <= start => break,
                Some(oldest) if fetched >= page_limit => {
                    cursor = if oldest < cursor {
                        oldest
                    } else {
                        // the whole page shares the cursor's timestamp
                        warn!(cursor, "[HISTORY] PnL page did not move backwards, stepping back 1ms");
                        cursor.saturating_sub(1)
                    };
                }
                _ if clamped => cursor = window_start,
                _ => break,
            }
        }

        let mut records: Vec<PnlRecord> = seen
            .into_values()
            .filter(|r| r.timestamp >= start && r.timestamp < end)
            .collect();
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }
}
