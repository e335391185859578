//! In-memory filter page
//!
//! Parses a saved email-filter page with the scraper crate into a small
//! mutable node arena that implements [`HostDocument`]. Clicking an
//! "add rule" button behaves the way the live page does: a copy of a
//! template row appears, optionally after a delay.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::config::HelperConfig;
use crate::error::{HelperError, Result};
use crate::host::{HostDocument, HostEvent};
use crate::timing::{Clock, ManualClock};

/// Handle to one node of a [`FilterPage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

/// How the page reacts to its "add rule" button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddRowBehavior {
    Immediate,
    /// The new row shows up only after this much clock time.
    Delayed(Duration),
    /// The click is swallowed and no row appears.
    Ignored,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Container {
        selects: Vec<NodeId>,
        text: Option<NodeId>,
        buttons: Vec<NodeId>,
    },
    Select {
        options: Vec<String>,
        selected: Option<usize>,
    },
    Text {
        value: String,
    },
    Button {
        label: String,
    },
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    visible_at: Duration,
}

pub struct FilterPage {
    nodes: Vec<Node>,
    containers: Vec<NodeId>,
    selects: Vec<NodeId>,
    buttons: Vec<NodeId>,
    add_pattern: Regex,
    clock: Arc<dyn Clock + Send + Sync>,
    behavior: AddRowBehavior,
    events: Vec<(NodeId, HostEvent)>,
    clicked: Vec<NodeId>,
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| HelperError::InvalidSelector(format!("{selector}: {e:?}")))
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

impl FilterPage {
    /// Parse page HTML using the selectors from `config`.
    pub fn parse(html: &str, config: &HelperConfig) -> Result<Self> {
        let document = Html::parse_document(html);

        let row_sel = parse_selector(&config.row_selector)?;
        let text_sel = parse_selector(&config.text_input_selector)?;
        let button_sel = parse_selector(&config.button_selector)?;
        let select_sel = parse_selector("select")?;
        let option_sel = parse_selector("option")?;
        let add_pattern = RegexBuilder::new(&config.add_button_pattern)
            .case_insensitive(true)
            .build()?;

        let mut page = Self {
            nodes: Vec::new(),
            containers: Vec::new(),
            selects: Vec::new(),
            buttons: Vec::new(),
            add_pattern,
            clock: Arc::new(ManualClock::new()),
            behavior: AddRowBehavior::Immediate,
            events: Vec::new(),
            clicked: Vec::new(),
        };
        let mut ids = HashMap::new();

        for el in document.select(&select_sel) {
            let options: Vec<String> = el.select(&option_sel).map(|opt| element_text(&opt)).collect();
            let selected = el
                .select(&option_sel)
                .position(|opt| opt.value().attr("selected").is_some())
                .or(if options.is_empty() { None } else { Some(0) });
            let id = page.push(NodeKind::Select { options, selected }, Duration::ZERO);
            page.selects.push(id);
            ids.insert(el.id(), id);
        }

        for el in document.select(&text_sel) {
            let value = el.value().attr("value").unwrap_or_default().to_string();
            let id = page.push(NodeKind::Text { value }, Duration::ZERO);
            ids.insert(el.id(), id);
        }

        for el in document.select(&button_sel) {
            let mut label = element_text(&el);
            if label.is_empty() {
                label = el.value().attr("value").unwrap_or_default().trim().to_string();
            }
            let id = page.push(NodeKind::Button { label }, Duration::ZERO);
            page.buttons.push(id);
            ids.insert(el.id(), id);
        }

        for row in document.select(&row_sel) {
            let selects = row
                .select(&select_sel)
                .filter_map(|el| ids.get(&el.id()).copied())
                .collect();
            let text = row
                .select(&text_sel)
                .find_map(|el| ids.get(&el.id()).copied());
            let buttons = row
                .select(&button_sel)
                .filter_map(|el| ids.get(&el.id()).copied())
                .collect();
            let id = page.push(
                NodeKind::Container {
                    selects,
                    text,
                    buttons,
                },
                Duration::ZERO,
            );
            page.containers.push(id);
        }

        Ok(page)
    }

    /// Measure add-row delays against `clock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_add_behavior(mut self, behavior: AddRowBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Notifications dispatched so far, oldest first.
    pub fn events(&self) -> &[(NodeId, HostEvent)] {
        &self.events
    }

    /// Controls clicked so far, oldest first.
    pub fn clicked(&self) -> &[NodeId] {
        &self.clicked
    }

    pub fn click_count(&self) -> usize {
        self.clicked.len()
    }

    fn push(&mut self, kind: NodeKind, visible_at: Duration) -> NodeId {
        self.nodes.push(Node { kind, visible_at });
        NodeId(self.nodes.len() - 1)
    }

    fn visible(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.0)
            .map_or(false, |n| n.visible_at <= self.clock.now())
    }

    fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    fn is_add_button(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Button { label }) if self.add_pattern.is_match(label))
    }

    fn is_row_shaped(&self, id: NodeId) -> bool {
        matches!(
            self.kind(id),
            Some(NodeKind::Container { selects, text: Some(_), .. }) if selects.len() >= 2
        )
    }

    fn owns_button(&self, container: NodeId, button: NodeId) -> bool {
        matches!(self.kind(container), Some(NodeKind::Container { buttons, .. }) if buttons.contains(&button))
    }

    fn container_selects(&self, id: NodeId) -> &[NodeId] {
        match self.kind(id) {
            Some(NodeKind::Container { selects, .. }) => selects,
            _ => &[],
        }
    }

    /// A row-shaped container with no smaller row-shaped container inside.
    fn is_leaf_row(&self, id: NodeId, shaped: &[NodeId]) -> bool {
        let outer = self.container_selects(id);
        !shaped.iter().any(|other| {
            let inner = self.container_selects(*other);
            *other != id && inner.len() < outer.len() && inner.iter().all(|s| outer.contains(s))
        })
    }

    /// Row the host copies when `button` is clicked: the innermost row
    /// owning the button, else the last innermost row on the page.
    fn template_for(&self, button: NodeId) -> Option<NodeId> {
        let shaped: Vec<NodeId> = self
            .containers
            .iter()
            .copied()
            .filter(|c| self.visible(*c) && self.is_row_shaped(*c))
            .collect();
        let leaves: Vec<NodeId> = shaped
            .iter()
            .copied()
            .filter(|c| self.is_leaf_row(*c, &shaped))
            .collect();
        leaves
            .iter()
            .rev()
            .find(|c| self.owns_button(**c, button))
            .or_else(|| leaves.last())
            .copied()
    }

    fn append_row(&mut self, template: NodeId) {
        let visible_at = match self.behavior {
            AddRowBehavior::Immediate => self.clock.now(),
            AddRowBehavior::Delayed(delay) => self.clock.now() + delay,
            AddRowBehavior::Ignored => return,
        };
        let Some(NodeKind::Container {
            selects,
            text,
            buttons,
        }) = self.kind(template).cloned()
        else {
            return;
        };

        let mut new_selects = Vec::with_capacity(selects.len());
        for select in selects {
            if let Some(NodeKind::Select { options, .. }) = self.kind(select).cloned() {
                let selected = if options.is_empty() { None } else { Some(0) };
                let id = self.push(NodeKind::Select { options, selected }, visible_at);
                self.selects.push(id);
                new_selects.push(id);
            }
        }
        let new_text = text.map(|_| {
            self.push(
                NodeKind::Text {
                    value: String::new(),
                },
                visible_at,
            )
        });
        let mut new_buttons = Vec::with_capacity(buttons.len());
        for button in buttons {
            if let Some(kind @ NodeKind::Button { .. }) = self.kind(button).cloned() {
                let id = self.push(kind, visible_at);
                self.buttons.push(id);
                new_buttons.push(id);
            }
        }

        let id = self.push(
            NodeKind::Container {
                selects: new_selects,
                text: new_text,
                buttons: new_buttons,
            },
            visible_at,
        );
        self.containers.push(id);
    }
}

impl HostDocument for FilterPage {
    type Node = NodeId;

    fn row_containers(&self) -> Vec<NodeId> {
        self.containers
            .iter()
            .copied()
            .filter(|c| self.visible(*c))
            .collect()
    }

    fn select_controls(&self, container: NodeId) -> Vec<NodeId> {
        match self.kind(container) {
            Some(NodeKind::Container { selects, .. }) => selects.clone(),
            _ => Vec::new(),
        }
    }

    fn text_control(&self, container: NodeId) -> Option<NodeId> {
        match self.kind(container) {
            Some(NodeKind::Container { text, .. }) => *text,
            _ => None,
        }
    }

    fn page_select_controls(&self) -> Vec<NodeId> {
        self.selects
            .iter()
            .copied()
            .filter(|s| self.visible(*s))
            .collect()
    }

    fn option_labels(&self, select: NodeId) -> Vec<String> {
        match self.kind(select) {
            Some(NodeKind::Select { options, .. }) => {
                options.clone()
            }
            _ => Vec::new(),
        }
    }

    fn selected_label(&self, select: NodeId) -> Option<String> {
        match self.kind(select) {
            Some(NodeKind::Select { options, selected }) => {
                selected.and_then(|i| options.get(i)).cloned()
            }
            _ => None,
        }
    }

    fn set_selected_index(&mut self, select: NodeId, index: usize) {
        if let Some(Node {
            kind: NodeKind::Select { options, selected },
            ..
        }) = self.nodes.get_mut(select.0)
        {
            if index < options.len() {
                *selected = Some(index);
            }
        }
    }

    fn text_value(&self, input: NodeId) -> String {
        match self.kind(input) {
            Some(NodeKind::Text { value }) => value.clone(),
            _ => String::new(),
        }
    }

    fn set_text_value(&mut self, input: NodeId, value: &str) {
        if let Some(Node {
            kind: NodeKind::Text { value: current },
            ..
        }) = self.nodes.get_mut(input.0)
        {
            *current = value.to_string();
        }
    }

    fn dispatch(&mut self, node: NodeId, event: HostEvent) {
        self.events.push((node, event));
    }

    fn add_row_control(&self, scope: Option<NodeId>) -> Option<NodeId> {
        let candidates = match scope {
            Some(container) => match self.kind(container) {
                Some(NodeKind::Container { buttons, .. }) => buttons.clone(),
                _ => return None,
            },
            None => self.buttons.clone(),
        };
        candidates
            .into_iter()
            .find(|b| self.visible(*b) && self.is_add_button(*b))
    }

    fn click(&mut self, control: NodeId) {
        self.clicked.push(control);
        if !self.is_add_button(control) {
            return;
        }
        if let Some(template) = self.template_for(control) {
            self.append_row(template);
        }
    }
}
