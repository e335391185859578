//! Email-filter page helper
//!
//! Reads and batch-edits the rule rows of a third-party email-filter form
//! without any cooperation from the page:
//! - Classifies unlabeled select controls into header / operator / interaction
//! - Scans the page for rule rows and exports them as tab-separated text
//! - Expands pasted values into one new rule row each, driving the page's
//!   own "add rule" control and polling until the row appears
//! - C-compatible entry points over saved page HTML

pub mod actions;
pub mod batch;
pub mod classifier;
pub mod config;
pub mod error;
pub mod extract;
pub mod ffi;
pub mod host;
pub mod location;
pub mod page;
pub mod scanner;
pub mod timing;
pub mod values;
pub mod vocabulary;

pub use actions::{FilterHelper, PromptField, UserSurface};
pub use batch::{AbortReason, BatchInserter, BatchOutcome, BatchReport, BatchRequest, Interaction};
pub use classifier::{classify, Classification, Role};
pub use config::HelperConfig;
pub use error::{HelperError, Result};
pub use extract::{export_filename, extract, to_tsv, ExtractedRule};
pub use ffi::*;
pub use host::{HostDocument, HostEvent, Selectable};
pub use location::is_filters_page;
pub use page::{AddRowBehavior, FilterPage, NodeId};
pub use scanner::{scan, RuleRow};
pub use timing::{Clock, ManualClock, ManualScheduler, Scheduler, TokioClock, TokioScheduler};
pub use values::{normalize_for_header, parse_values};
