//! The two user-facing actions: "extract all rules" and "add new rule".
//!
//! The surrounding UI (prompts, blocking notices, file download) is
//! injected through [`UserSurface`], so the actions hold no hidden state.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::batch::{BatchInserter, BatchOutcome, BatchRequest, Interaction};
use crate::config::HelperConfig;
use crate::error::{HelperError, Result};
use crate::extract::{export_filename, extract, to_tsv};
use crate::host::HostDocument;
use crate::timing::{Clock, Scheduler};

pub const MSG_NO_RULES: &str =
    "No rules detected on this page. Make sure you're on the Email Filters screen.";
pub const MSG_NO_VALUES: &str = "No values provided. Nothing to add.";
pub const MSG_NO_TEMPLATE: &str = "Could not find existing rule rows to clone or update.";
pub const MSG_ADDED: &str = "Rules added. Review them and click Save in cPanel to apply changes.";

/// Questions asked when adding rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptField {
    Header,
    Operator,
    Interaction,
    Action,
    Values,
}

impl PromptField {
    pub fn question(&self) -> &'static str {
        match self {
            Self::Header => {
                "Header/Field to match (example: \"From\", \"Subject\", \"Any Header\"). Leave blank to keep current."
            }
            Self::Operator => {
                "Operator to use (example: \"contains\", \"is\", \"does not contain\"). Leave blank to keep current."
            }
            Self::Interaction => "Combine with previous rule using \"and\" or \"or\".",
            Self::Action => {
                "Action for matching messages (example: \"Discard Message\"). Leave blank to keep current."
            }
            Self::Values => "Enter value(s) for the rule (comma-separated or one per line).",
        }
    }

    pub fn default_answer(&self) -> &'static str {
        match self {
            Self::Operator => "contains",
            Self::Interaction => "and",
            _ => "",
        }
    }
}

/// Prompts, notices and downloads provided by the embedding UI.
pub trait UserSurface {
    /// Ask one question, pre-filled with `default`. `None` means the user
    /// cancelled.
    fn prompt(&mut self, question: &str, default: &str) -> Option<String>;

    /// Show a blocking notice.
    fn notify(&mut self, message: &str);

    /// Hand a finished export to the user.
    fn save_export(&mut self, filename: &str, content: &str) -> Result<()>;
}

pub struct FilterHelper<U, C, S> {
    surface: U,
    inserter: BatchInserter<C, S>,
    config: HelperConfig,
}

impl<U: UserSurface, C: Clock, S: Scheduler> FilterHelper<U, C, S> {
    pub fn new(surface: U, inserter: BatchInserter<C, S>, config: HelperConfig) -> Self {
        Self {
            surface,
            inserter,
            config,
        }
    }

    pub fn surface(&self) -> &U {
        &self.surface
    }

    pub fn extract_all_rules<H: HostDocument>(&mut self, host: &H) -> Result<usize> {
        self.extract_all_rules_at(host, Utc::now())
    }

    /// Export every rule on the page, stamping the file with `now`.
    pub fn extract_all_rules_at<H: HostDocument>(
        &mut self,
        host: &H,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let rules = extract(host);
        if rules.is_empty() {
            self.surface.notify(MSG_NO_RULES);
            return Err(HelperError::NoRulesFound);
        }
        let filename = export_filename(&self.config.export_prefix, now);
        self.surface.save_export(&filename, &to_tsv(&rules))?;
        info!("exported {} rules to {}", rules.len(), filename);
        Ok(rules.len())
    }

    /// Ask the user for a batch and insert it.
    ///
    /// Returns `Ok(None)` when the user cancels a prompt.
    pub async fn add_new_rule<H: HostDocument>(
        &mut self,
        host: &mut H,
    ) -> Result<Option<BatchOutcome>> {
        let Some(request) = self.ask_request() else {
            return Ok(None);
        };
        if request.values.is_empty() {
            self.surface.notify(MSG_NO_VALUES);
            return Err(HelperError::NoValues);
        }

        match self.inserter.insert_batch(host, &request).await {
            Ok(outcome) => {
                match &outcome {
                    BatchOutcome::Completed(_) => self.surface.notify(MSG_ADDED),
                    BatchOutcome::Partial { report, reason } => {
                        let message = format!(
                            "Added {} of {} values. {}",
                            report.inserted, report.requested, reason
                        );
                        self.surface.notify(&message);
                    }
                }
                Ok(Some(outcome))
            }
            Err(HelperError::NoTemplateRows) => {
                self.surface.notify(MSG_NO_TEMPLATE);
                Err(HelperError::NoTemplateRows)
            }
            Err(e) => {
                self.surface.notify(&e.to_string());
                Err(e)
            }
        }
    }

    fn ask(&mut self, field: PromptField) -> Option<String> {
        self.surface.prompt(field.question(), field.default_answer())
    }

    fn ask_request(&mut self) -> Option<BatchRequest> {
        let header = self.ask(PromptField::Header)?;
        let operator = self.ask(PromptField::Operator)?;
        let interaction = self.ask(PromptField::Interaction)?;
        let action = self.ask(PromptField::Action)?;
        let values = self.ask(PromptField::Values)?;
        Some(BatchRequest::from_input(
            &header,
            &operator,
            Interaction::from_label(&interaction),
            &action,
            &values,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;
    use crate::page::{AddRowBehavior, FilterPage};
    use crate::scanner::scan;
    use crate::timing::{ManualClock, ManualScheduler};

    #[derive(Default)]
    struct ScriptedUser {
        answers: VecDeque<Option<String>>,
        questions: Vec<(String, String)>,
        notices: Vec<String>,
        saved: Vec<(String, String)>,
    }

    impl ScriptedUser {
        fn answering(answers: &[Option<&str>]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.map(String::from)).collect(),
                ..Self::default()
            }
        }
    }

    impl UserSurface for ScriptedUser {
        fn prompt(&mut self, question: &str, default: &str) -> Option<String> {
            self.questions.push((question.to_string(), default.to_string()));
            self.answers
                .pop_front()
                .unwrap_or_else(|| Some(default.to_string()))
        }

        fn notify(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }

        fn save_export(&mut self, filename: &str, content: &str) -> Result<()> {
            self.saved.push((filename.to_string(), content.to_string()));
            Ok(())
        }
    }

    const PAGE: &str = r#"
    <table>
      <tr class="ruleRow">
        <td><select><option>From</option><option selected>Subject</option></select></td>
        <td><select><option>contains</option><option>equals</option></select></td>
        <td><input type="text" value="invoice"></td>
      </tr>
    </table>
    <input type="button" value="Add another rule">
    "#;

    fn helper(user: ScriptedUser) -> (FilterHelper<ScriptedUser, ManualClock, ManualScheduler>, FilterPage) {
        let clock = ManualClock::new();
        let page = FilterPage::parse(PAGE, &HelperConfig::default())
            .unwrap()
            .with_clock(Arc::new(clock.clone()))
            .with_add_behavior(AddRowBehavior::Immediate);
        let scheduler = ManualScheduler {
            clock: clock.clone(),
            step: Duration::from_millis(50),
        };
        let inserter = BatchInserter::new(clock, scheduler, Duration::from_secs(2));
        (FilterHelper::new(user, inserter, HelperConfig::default()), page)
    }

    #[test]
    fn test_extract_saves_file() {
        let (mut helper, page) = helper(ScriptedUser::default());
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(helper.extract_all_rules_at(&page, now).unwrap(), 1);

        let (filename, content) = &helper.surface().saved[0];
        assert_eq!(filename, "cpanel-email-filters-2025-01-02-03-04-05.txt");
        assert_eq!(content, "Header\tOperator\tValue\nSubject\tcontains\tinvoice");
    }

    #[test]
    fn test_extract_reports_empty_page() {
        let (mut helper, _) = helper(ScriptedUser::default());
        let empty = FilterPage::parse("<p></p>", &HelperConfig::default()).unwrap();
        assert!(matches!(
            helper.extract_all_rules(&empty),
            Err(HelperError::NoRulesFound)
        ));
        assert_eq!(helper.surface().notices, vec![MSG_NO_RULES]);
        assert!(helper.surface().saved.is_empty());
    }

    #[tokio::test]
    async fn test_add_new_rule_from_prompts() {
        let user = ScriptedUser::answering(&[
            Some("From"),
            Some("equals"),
            Some("and"),
            Some(""),
            Some("Alice <a@x.com>\nBob <b@y.com>"),
        ]);
        let (mut helper, mut page) = helper(user);
        let outcome = helper.add_new_rule(&mut page).await.unwrap().unwrap();

        assert_eq!(outcome.report().inserted, 2);
        assert_eq!(helper.surface().notices, vec![MSG_ADDED]);
        let rows = scan(&page);
        assert_eq!(rows.len(), 3);
        assert_eq!(page.text_value(rows[1].value_input), "a@x.com");
        assert_eq!(page.text_value(rows[2].value_input), "b@y.com");
        assert_eq!(page.selected_label(rows[2].header).as_deref(), Some("From"));
    }

    #[tokio::test]
    async fn test_prompts_show_questions_and_defaults() {
        let (mut helper, mut page) = helper(ScriptedUser::answering(&[]));
        helper.add_new_rule(&mut page).await.unwrap_err();

        let asked = &helper.surface().questions;
        let fields = [
            PromptField::Header,
            PromptField::Operator,
            PromptField::Interaction,
            PromptField::Action,
            PromptField::Values,
        ];
        assert_eq!(asked.len(), fields.len());
        for ((question, default), field) in asked.iter().zip(fields) {
            assert_eq!(question, field.question());
            assert_eq!(default, field.default_answer());
        }
        assert!(asked[4].0.starts_with("Enter value(s)"));
        assert_eq!(asked[1].1, "contains");
    }

    #[tokio::test]
    async fn test_cancel_aborts_silently() {
        let user = ScriptedUser::answering(&[Some("From"), None]);
        let (mut helper, mut page) = helper(user);
        assert!(helper.add_new_rule(&mut page).await.unwrap().is_none());
        assert!(helper.surface().notices.is_empty());
        assert_eq!(page.click_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_values_are_reported() {
        let user = ScriptedUser::answering(&[Some(""), Some(""), Some(""), Some(""), Some(" , ")]);
        let (mut helper, mut page) = helper(user);
        assert!(matches!(
            helper.add_new_rule(&mut page).await,
            Err(HelperError::NoValues)
        ));
        assert_eq!(helper.surface().notices, vec![MSG_NO_VALUES]);
    }

    #[tokio::test]
    async fn test_missing_rows_are_reported() {
        let user = ScriptedUser::answering(&[Some(""), Some(""), Some(""), Some(""), Some("x")]);
        let (mut helper, _) = helper(user);
        let mut empty = FilterPage::parse("<p></p>", &HelperConfig::default()).unwrap();
        assert!(helper.add_new_rule(&mut empty).await.is_err());
        assert_eq!(helper.surface().notices, vec![MSG_NO_TEMPLATE]);
    }

    #[tokio::test]
    async fn test_partial_batch_message() {
        let user = ScriptedUser::answering(&[Some(""), Some(""), Some(""), Some(""), Some("x, y")]);
        let (mut helper, _) = helper(user);
        let html = PAGE.replace(r#"<input type="button" value="Add another rule">"#, "");
        let mut page = FilterPage::parse(&html, &HelperConfig::default()).unwrap();
        let outcome = helper.add_new_rule(&mut page).await.unwrap().unwrap();

        assert!(matches!(outcome, BatchOutcome::Partial { .. }));
        assert_eq!(
            helper.surface().notices,
            vec!["Added 0 of 2 values. Could not find an 'Add Rule' button to create additional rows."]
        );
    }
}
