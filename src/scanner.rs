//! Rule repository scanner
//!
//! Re-reads the host page on every call. Nothing is cached: the page
//! mutates itself and is the only source of truth.

use tracing::debug;

use crate::classifier::classify;
use crate::host::{HostDocument, Selectable};

/// One classified filter condition on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleRow<N> {
    pub container: N,
    pub header: N,
    pub operator: N,
    pub interaction: Option<N>,
    pub value_input: N,
}

/// A select control's options, read once for classification.
#[derive(Debug, Clone)]
pub struct SelectSnapshot<N> {
    pub node: N,
    pub options: Vec<String>,
}

impl<N> Selectable for SelectSnapshot<N> {
    fn option_labels(&self) -> &[String] {
        &self.options
    }
}

/// Classify one container, or `None` if it is not a rule row.
pub fn classify_container<H: HostDocument>(
    host: &H,
    container: H::Node,
) -> Option<RuleRow<H::Node>> {
    let selects = host.select_controls(container);
    if selects.len() < 2 {
        return None;
    }
    let value_input = host.text_control(container)?;

    let snapshots: Vec<SelectSnapshot<H::Node>> = selects
        .into_iter()
        .map(|node| SelectSnapshot {
            node,
            options: host.option_labels(node),
        })
        .collect();

    let roles = classify(&snapshots);
    let (Some(header), Some(operator)) = (roles.header, roles.operator) else {
        debug!(
            "{:?} is not a rule row: {:?}",
            container,
            roles.roles(snapshots.len())
        );
        return None;
    };
    Some(RuleRow {
        container,
        header: snapshots[header].node,
        operator: snapshots[operator].node,
        interaction: roles.interaction.map(|i| snapshots[i].node),
        value_input,
    })
}

/// All rule rows currently on the page, in document order.
pub fn scan<H: HostDocument>(host: &H) -> Vec<RuleRow<H::Node>> {
    let candidates = host.row_containers();
    let rows: Vec<_> = candidates
        .iter()
        .filter_map(|c| classify_container(host, *c))
        .collect();
    debug!(
        "scan: {} candidate containers, {} rule rows",
        candidates.len(),
        rows.len()
    );
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HelperConfig;
    use crate::page::FilterPage;

    const PAGE: &str = r#"
    <html><body><form>
      <table>
        <tr><th>Header</th><th>Operator</th><th>Value</th></tr>
        <tr class="ruleRow">
          <td><select name="part1"><option>From</option><option selected>Subject</option></select></td>
          <td><select name="match1"><option>contains</option><option>equals</option></select></td>
          <td><input type="text" name="val1" value="invoice"></td>
        </tr>
        <tr class="ruleRow">
          <td><select name="opt2"><option>and</option><option selected>or</option></select></td>
          <td><select name="match2"><option>contains</option><option selected>equals</option></select></td>
          <td><select name="part2"><option selected>From</option><option>Subject</option></select></td>
          <td><input name="val2" value="boss@co"></td>
        </tr>
        <tr><td><select><option>only one</option></select><input type="text"></td></tr>
        <tr><td><select><option>a</option></select><select><option>b</option></select></td></tr>
      </table>
    </form></body></html>
    "#;

    fn page() -> FilterPage {
        FilterPage::parse(PAGE, &HelperConfig::default()).unwrap()
    }

    #[test]
    fn test_scan_keeps_only_rule_rows() {
        let page = page();
        let rows = scan(&page);
        assert_eq!(rows.len(), 2);

        assert_eq!(page.selected_label(rows[0].header).as_deref(), Some("Subject"));
        assert_eq!(page.selected_label(rows[0].operator).as_deref(), Some("contains"));
        assert_eq!(rows[0].interaction, None);
        assert_eq!(page.text_value(rows[0].value_input), "invoice");

        assert_eq!(page.selected_label(rows[1].header).as_deref(), Some("From"));
        assert_eq!(page.selected_label(rows[1].operator).as_deref(), Some("equals"));
        let interaction = rows[1].interaction.unwrap();
        assert_eq!(page.selected_label(interaction).as_deref(), Some("or"));
    }

    #[test]
    fn test_scan_is_idempotent() {
        let page = page();
        assert_eq!(scan(&page), scan(&page));
    }

    #[test]
    fn test_empty_page() {
        let page = FilterPage::parse("<html><body><p>nothing</p></body></html>", &HelperConfig::default())
            .unwrap();
        assert!(scan(&page).is_empty());
    }
}
