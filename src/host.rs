//! Host page interface
//!
//! The filter page belongs to a third party. Everything this crate knows
//! about it goes through [`HostDocument`]; handles are opaque and may stop
//! referring to anything once the page rebuilds itself.

use std::fmt::Debug;
use std::hash::Hash;

use crate::vocabulary::normalize;

/// Change signals the host page listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    Input,
    Change,
}

/// Read/write access to the live filter page.
pub trait HostDocument {
    /// Opaque handle to a container or control.
    type Node: Copy + Eq + Hash + Debug;

    /// Candidate row containers in document order. Over-inclusive.
    fn row_containers(&self) -> Vec<Self::Node>;

    /// Selectable controls inside a container, in document order.
    fn select_controls(&self, container: Self::Node) -> Vec<Self::Node>;

    /// The container's primary free-text control.
    fn text_control(&self, container: Self::Node) -> Option<Self::Node>;

    /// Every selectable control on the page, in document order.
    fn page_select_controls(&self) -> Vec<Self::Node>;

    fn option_labels(&self, select: Self::Node) -> Vec<String>;

    /// Label of the currently selected option.
    fn selected_label(&self, select: Self::Node) -> Option<String>;

    fn set_selected_index(&mut self, select: Self::Node, index: usize);

    fn text_value(&self, input: Self::Node) -> String;

    fn set_text_value(&mut self, input: Self::Node, value: &str);

    fn dispatch(&mut self, node: Self::Node, event: HostEvent);

    /// Locate the "add rule" control inside `scope`, or anywhere on the
    /// page when `scope` is `None`.
    fn add_row_control(&self, scope: Option<Self::Node>) -> Option<Self::Node>;

    fn click(&mut self, control: Self::Node);
}

/// Anything the classifier can inspect for its option labels.
pub trait Selectable {
    fn option_labels(&self) -> &[String];
}

/// Pick the option for `label`: exact match first, then substring.
pub fn best_match<S: AsRef<str>>(options: &[S], label: &str) -> Option<usize> {
    let target = normalize(label);
    if target.is_empty() {
        return None;
    }
    let normalized: Vec<String> = options.iter().map(|o| normalize(o.as_ref())).collect();
    normalized
        .iter()
        .position(|o| *o == target)
        .or_else(|| normalized.iter().position(|o| o.contains(&target)))
}

/// Select the best-matching option and tell the host about it.
///
/// Returns false when `label` is empty or nothing matches; the control is
/// left untouched in that case.
pub fn select_by_label<H: HostDocument>(host: &mut H, select: H::Node, label: &str) -> bool {
    let options = host.option_labels(select);
    match best_match(&options, label) {
        Some(index) => {
            host.set_selected_index(select, index);
            host.dispatch(select, HostEvent::Change);
            true
        }
        None => false,
    }
}

/// Write a text value and emit the input/change pair hosts react to.
pub fn fill_text<H: HostDocument>(host: &mut H, input: H::Node, value: &str) {
    host.set_text_value(input, value);
    host.dispatch(input, HostEvent::Input);
    host.dispatch(input, HostEvent::Change);
}
