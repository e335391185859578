//! Batch rule insertion
//!
//! Drives the host page's own "add rule" control once per value, waits
//! (bounded) for the new row to show up, then fills it in. The page gives
//! no acknowledgement beyond its own contents, so every step re-scans.
//! Insertion is not transactional: rows added before a failure stay.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::HelperConfig;
use crate::error::{HelperError, Result};
use crate::host::{fill_text, select_by_label, HostDocument};
use crate::scanner::{scan, RuleRow};
use crate::timing::{Clock, Scheduler, TokioClock, TokioScheduler};
use crate::values::{normalize_for_header, parse_values};
use crate::vocabulary::{matches_any, normalize, ACTION};

/// AND/OR composition of a rule with the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interaction {
    And,
    Or,
}

impl Interaction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match normalize(label).as_str() {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }
}

/// One user-initiated batch. Empty labels leave the matching control as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub interaction: Option<Interaction>,
    #[serde(default)]
    pub action: String,
    pub values: Vec<String>,
}

impl BatchRequest {
    /// Build a request from raw prompt answers, splitting the values.
    pub fn from_input(
        header: &str,
        operator: &str,
        interaction: Option<Interaction>,
        action: &str,
        raw_values: &str,
    ) -> Self {
        Self {
            header: header.trim().to_string(),
            operator: operator.trim().to_string(),
            interaction,
            action: action.trim().to_string(),
            values: parse_values(&normalize_for_header(raw_values, header)),
        }
    }

    /// Interaction applied to every inserted row. Several values always
    /// form an OR group.
    pub fn effective_interaction(&self) -> Option<Interaction> {
        if self.values.len() > 1 {
            Some(Interaction::Or)
        } else {
            self.interaction
        }
    }
}

/// What actually happened during a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub requested: usize,
    pub inserted: usize,
    /// Row count seen after each insertion attempt.
    pub observed_counts: Vec<usize>,
    /// Waits that ran out before the page showed the new row.
    pub timeouts: usize,
    pub action_applied: bool,
}

/// Why a batch stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    AddControlMissing,
    NoRowAfterInsert,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddControlMissing => {
                write!(f, "Could not find an 'Add Rule' button to create additional rows.")
            }
            Self::NoRowAfterInsert => write!(f, "No rule row appeared after adding one."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Completed(BatchReport),
    Partial {
        report: BatchReport,
        reason: AbortReason,
    },
}

impl BatchOutcome {
    pub fn report(&self) -> &BatchReport {
        match self {
            Self::Completed(report) => report,
            Self::Partial { report, .. } => report,
        }
    }
}

/// Runs batches against a host page with an injected clock and scheduler.
pub struct BatchInserter<C, S> {
    clock: C,
    scheduler: S,
    timeout: Duration,
}

impl BatchInserter<TokioClock, TokioScheduler> {
    /// Inserter paced by tokio timers, with timings from `config`.
    pub fn with_tokio(config: &HelperConfig) -> Self {
        Self::new(
            TokioClock::new(),
            TokioScheduler {
                interval: config.poll_interval(),
            },
            config.poll_timeout(),
        )
    }
}

impl<C: Clock, S: Scheduler> BatchInserter<C, S> {
    pub fn new(clock: C, scheduler: S, timeout: Duration) -> Self {
        Self {
            clock,
            scheduler,
            timeout,
        }
    }

    /// Insert one rule row per requested value.
    ///
    /// Fails without touching the page when there are no values or no
    /// existing rows to learn the form from. Stopping midway yields
    /// [`BatchOutcome::Partial`] with the progress so far.
    pub async fn insert_batch<H: HostDocument>(
        &self,
        host: &mut H,
        request: &BatchRequest,
    ) -> Result<BatchOutcome> {
        if request.values.is_empty() {
            return Err(HelperError::NoValues);
        }
        let mut rows = scan(host);
        if rows.is_empty() {
            return Err(HelperError::NoTemplateRows);
        }

        let interaction = request.effective_interaction();
        let mut report = BatchReport {
            requested: request.values.len(),
            ..BatchReport::default()
        };

        for value in &request.values {
            let target = rows.len() + 1;
            let anchor = rows.last().map(|r| r.container);
            let Some(control) = host
                .add_row_control(anchor)
                .or_else(|| host.add_row_control(None))
            else {
                warn!("add-rule control not found, stopping after {} rows", report.inserted);
                return Ok(BatchOutcome::Partial {
                    report,
                    reason: AbortReason::AddControlMissing,
                });
            };
            host.click(control);

            let (latest, timed_out) = self.wait_for_rows(host, target).await;
            report.observed_counts.push(latest.len());
            if timed_out {
                report.timeouts += 1;
            }

            let Some(row) = latest.last().copied() else {
                warn!("no rule row after insertion, stopping after {} rows", report.inserted);
                return Ok(BatchOutcome::Partial {
                    report,
                    reason: AbortReason::NoRowAfterInsert,
                });
            };
            fill_row(host, &row, request, interaction, value);
            report.inserted += 1;
            debug!("filled row {} of {}", report.inserted, report.requested);
            rows = latest;
        }

        if !request.action.is_empty() {
            report.action_applied = apply_action(host, &request.action);
        }

        info!(
            "batch done: {} rows inserted, {} waits timed out",
            report.inserted, report.timeouts
        );
        Ok(BatchOutcome::Completed(report))
    }

    /// Poll until the page shows `target` rows or the timeout elapses.
    /// On timeout the latest scan is returned as is.
    async fn wait_for_rows<H: HostDocument>(
        &self,
        host: &H,
        target: usize,
    ) -> (Vec<RuleRow<H::Node>>, bool) {
        let start = self.clock.now();
        loop {
            let rows = scan(host);
            if rows.len() >= target {
                return (rows, false);
            }
            if self.clock.now().saturating_sub(start) >= self.timeout {
                warn!(
                    "page still shows {} rows after {:?}, expected {}",
                    rows.len(),
                    self.timeout,
                    target
                );
                return (rows, true);
            }
            self.scheduler.pause().await;
        }
    }
}

fn fill_row<H: HostDocument>(
    host: &mut H,
    row: &RuleRow<H::Node>,
    request: &BatchRequest,
    interaction: Option<Interaction>,
    value: &str,
) {
    if !request.header.is_empty() && !select_by_label(host, row.header, &request.header) {
        debug!("no header option matches {:?}", request.header);
    }
    if !request.operator.is_empty() && !select_by_label(host, row.operator, &request.operator) {
        debug!("no operator option matches {:?}", request.operator);
    }
    if let Some(interaction) = interaction {
        match row.interaction {
            Some(select) => {
                if !select_by_label(host, select, interaction.label()) {
                    debug!("no interaction option matches {:?}", interaction.label());
                }
            }
            None => debug!("row has no interaction control"),
        }
    }
    fill_text(host, row.value_input, value);
}

/// Set the page-wide action selector. False if none matches.
fn apply_action<H: HostDocument>(host: &mut H, action: &str) -> bool {
    let control = host
        .page_select_controls()
        .into_iter()
        .find(|s| matches_any(ACTION, &host.option_labels(*s)));
    match control {
        Some(select) => select_by_label(host, select, action),
        None => {
            warn!("no action selector on the page");
            false
        }
    }
}
