//! Scripted in-memory page backend
//!
//! Backs the test suite and the demo binary: the scenario sets up a node
//! tree with explicit rects and styles, perturbs it between frames, and
//! reads back what the engine did (placements, subscriptions, widget queue).
//!
//! Mutating helpers queue a [`PageEvent::Mutation`] the way a document-wide
//! mutation observer would report them; discrete events (`Scroll`,
//! `Resize`, ...) are queued by the scenario itself and delivered only to
//! active subscriptions.

use std::collections::VecDeque;

use hashbrown::HashMap;
use tokio::sync::oneshot;

use crate::error::PageError;
use crate::geometry::Rect;
use crate::locator::MountRequest;

use super::{CssPosition, EventInterest, NodeId, Page, PageEvent, Placement, ScriptLoad};

#[derive(Debug, Default)]
struct SimNode {
    tag: String,
    dom_id: Option<String>,
    classes: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    rect: Rect,
    hidden: bool,
    display_none: bool,
    visibility_hidden: bool,
    position: CssPosition,
    placement: Option<Placement>,
}

pub struct SimPage {
    nodes: HashMap<NodeId, SimNode>,
    next_id: u64,
    root: NodeId,
    body: NodeId,
    fullscreen: Option<NodeId>,
    viewport: (f64, f64),

    pending: VecDeque<PageEvent>,
    subscriptions: Vec<EventInterest>,
    size_observed: Vec<NodeId>,
    mutation_observers: usize,
    visual_viewport: bool,
    size_observer_support: bool,

    injected_scripts: Vec<String>,
    script_load_fails: bool,
    widget_queue: Vec<MountRequest>,

    refuse_moves: bool,
    reload_count: usize,
    reload_fails: bool,
}

impl Default for SimPage {
    fn default() -> Self {
        Self::new()
    }
}

impl SimPage {
    pub fn new() -> Self {
        let mut page = Self {
            nodes: HashMap::new(),
            next_id: 0,
            root: NodeId(0),
            body: NodeId(0),
            fullscreen: None,
            viewport: (1280.0, 720.0),
            pending: VecDeque::new(),
            subscriptions: Vec::new(),
            size_observed: Vec::new(),
            mutation_observers: 0,
            visual_viewport: true,
            size_observer_support: true,
            injected_scripts: Vec::new(),
            script_load_fails: false,
            widget_queue: Vec::new(),
            refuse_moves: false,
            reload_count: 0,
            reload_fails: false,
        };
        let root = page.alloc("html");
        page.root = root;
        let body = page.alloc("body");
        page.body = body;
        page.attach(root, body);
        page
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(
            id,
            SimNode {
                tag: tag.to_string(),
                ..SimNode::default()
            },
        );
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get(&child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|c| *c != child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
        }
    }

    /// Document-order walk.
    fn dfs(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(node) = self.nodes.get(&id) {
                for child in node.children.iter().rev() {
                    stack.push(*child);
                }
            }
        }
        order
    }

    fn matches(&self, id: NodeId, part: &str) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        if let Some(dom_id) = part.strip_prefix('#') {
            node.dom_id.as_deref() == Some(dom_id)
        } else if let Some(class) = part.strip_prefix('.') {
            node.classes.iter().any(|c| c == class)
        } else {
            node.tag == part
        }
    }

    fn note_mutation(&mut self) {
        self.pending.push_back(PageEvent::Mutation);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scenario helpers (not part of the Page contract)
    // ─────────────────────────────────────────────────────────────────────

    /// Create and attach an element.
    pub fn insert(&mut self, tag: &str, parent: NodeId) -> NodeId {
        let id = self.alloc(tag);
        self.attach(parent, id);
        self.note_mutation();
        id
    }

    /// Detach a node (and its subtree) from the document.
    pub fn remove_node(&mut self, node: NodeId) {
        self.detach(node);
        self.note_mutation();
    }

    pub fn set_dom_id(&mut self, node: NodeId, dom_id: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.dom_id = Some(dom_id.to_string());
        }
        self.note_mutation();
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.classes.push(class.to_string());
        }
        self.note_mutation();
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.rect = rect;
        }
    }

    pub fn set_display_none(&mut self, node: NodeId, value: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.display_none = value;
        }
        self.note_mutation();
    }

    pub fn set_visibility_hidden(&mut self, node: NodeId, value: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.visibility_hidden = value;
        }
        self.note_mutation();
    }

    pub fn set_css_position(&mut self, node: NodeId, position: CssPosition) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.position = position;
        }
        self.note_mutation();
    }

    pub fn enter_fullscreen(&mut self, node: NodeId) {
        self.fullscreen = Some(node);
        self.pending.push_back(PageEvent::FullscreenChange);
    }

    pub fn exit_fullscreen(&mut self) {
        self.fullscreen = None;
        self.pending.push_back(PageEvent::FullscreenChange);
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = (width, height);
    }

    pub fn push_event(&mut self, event: PageEvent) {
        self.pending.push_back(event);
    }

    pub fn set_visual_viewport(&mut self, supported: bool) {
        self.visual_viewport = supported;
    }

    pub fn set_size_observer_support(&mut self, supported: bool) {
        self.size_observer_support = supported;
    }

    /// While set, `append_child` refuses every move.
    pub fn set_refuse_moves(&mut self, refuse: bool) {
        self.refuse_moves = refuse;
    }

    /// While set, script injections complete with an error.
    pub fn set_script_load_fails(&mut self, fails: bool) {
        self.script_load_fails = fails;
    }

    pub fn set_reload_fails(&mut self, fails: bool) {
        self.reload_fails = fails;
    }

    /// Pretend another code path already injected a script tag.
    pub fn preload_script(&mut self, src: &str) {
        self.injected_scripts.push(src.to_string());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Assertion accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn subscription_count(&self, interest: EventInterest) -> usize {
        self.subscriptions.iter().filter(|i| **i == interest).count()
    }

    pub fn mutation_observer_count(&self) -> usize {
        self.mutation_observers
    }

    pub fn size_observer_count(&self, node: NodeId) -> usize {
        self.size_observed.iter().filter(|n| **n == node).count()
    }

    pub fn widget_queue(&self) -> &[MountRequest] {
        &self.widget_queue
    }

    pub fn injected_scripts(&self) -> &[String] {
        &self.injected_scripts
    }

    pub fn reload_count(&self) -> usize {
        self.reload_count
    }

    pub fn children_of(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(&node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }
}

impl Page for SimPage {
    fn query(&self, selector: &str) -> Option<NodeId> {
        let parts: Vec<&str> = selector
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        self.dfs()
            .into_iter()
            .find(|id| parts.iter().any(|p| self.matches(*id, p)))
    }

    fn first_video(&self) -> Option<NodeId> {
        self.dfs()
            .into_iter()
            .find(|id| self.nodes.get(id).is_some_and(|n| n.tag == "video"))
    }

    fn contains(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes.get(&current).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn rect_of(&self, node: NodeId) -> Option<Rect> {
        if !self.contains(node) {
            return None;
        }
        self.nodes.get(&node).map(|n| n.rect)
    }

    fn is_rendered(&self, node: NodeId) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|n| !n.display_none && !n.visibility_hidden)
    }

    fn computed_position(&self, node: NodeId) -> CssPosition {
        self.nodes
            .get(&node)
            .map(|n| n.position)
            .unwrap_or_default()
    }

    fn fullscreen_node(&self) -> Option<NodeId> {
        self.fullscreen
    }

    fn body(&self) -> NodeId {
        self.body
    }

    fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(tag)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), PageError> {
        if self.refuse_moves {
            return Err(PageError::MoveRejected);
        }
        // A detached parent is fine (subtrees are assembled before they are
        // attached); a freed node is not.
        if !self.nodes.contains_key(&child) || !self.nodes.contains_key(&parent) {
            return Err(PageError::NodeGone);
        }
        self.detach(child);
        self.attach(parent, child);
        self.note_mutation();
        Ok(())
    }

    fn set_hidden(&mut self, node: NodeId, hidden: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.hidden = hidden;
        }
        self.note_mutation();
    }

    fn is_hidden(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_none_or(|n| n.hidden)
    }

    fn clear_children(&mut self, node: NodeId) {
        let children = self
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child in children {
            self.detach(child);
        }
        self.note_mutation();
    }

    fn set_relative_position(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.position = CssPosition::Relative;
        }
        self.note_mutation();
    }

    fn apply_placement(&mut self, node: NodeId, placement: Placement) {
        // Resolve the resulting viewport rect the way layout would.
        let resolved = match placement {
            Placement::Fixed(r) => Rect::new(
                r.left as f64,
                r.top as f64,
                r.width as f64,
                r.height as f64,
            ),
            Placement::Fill => self
                .nodes
                .get(&node)
                .and_then(|n| n.parent)
                .and_then(|p| self.nodes.get(&p))
                .map(|p| p.rect)
                .unwrap_or_default(),
            Placement::FullPage => Rect::new(0.0, 0.0, self.viewport.0, self.viewport.1),
        };
        if let Some(n) = self.nodes.get_mut(&node) {
            n.placement = Some(placement);
            n.rect = resolved;
        }
    }

    fn applied_placement(&self, node: NodeId) -> Option<Placement> {
        self.nodes.get(&node).and_then(|n| n.placement)
    }

    fn reload(&mut self) -> Result<(), PageError> {
        if self.reload_fails {
            return Err(PageError::ReloadRejected);
        }
        self.reload_count += 1;
        Ok(())
    }

    fn script_present(&self, src_fragment: &str) -> bool {
        self.injected_scripts
            .iter()
            .any(|s| s.contains(src_fragment))
    }

    fn inject_script(&mut self, src: &str) -> ScriptLoad {
        let (tx, rx) = oneshot::channel();
        if self.script_load_fails {
            let _ = tx.send(Err(PageError::ScriptLoad {
                src: src.to_string(),
            }));
        } else {
            self.injected_scripts.push(src.to_string());
            let _ = tx.send(Ok(()));
        }
        rx
    }

    fn enqueue_widget(&mut self, request: MountRequest) {
        self.widget_queue.push(request);
    }

    fn subscribe(&mut self, interest: EventInterest) {
        self.subscriptions.push(interest);
    }

    fn unsubscribe(&mut self, interest: EventInterest) {
        self.subscriptions.retain(|i| *i != interest);
    }

    fn has_visual_viewport(&self) -> bool {
        self.visual_viewport
    }

    fn supports_size_observer(&self) -> bool {
        self.size_observer_support
    }

    fn observe_size(&mut self, node: NodeId) {
        self.size_observed.push(node);
    }

    fn unobserve_size(&mut self, node: NodeId) {
        self.size_observed.retain(|n| *n != node);
    }

    fn observe_mutations(&mut self) {
        self.mutation_observers += 1;
    }

    fn unobserve_mutations(&mut self) {
        self.mutation_observers = self.mutation_observers.saturating_sub(1);
    }

    fn poll_events(&mut self) -> Vec<PageEvent> {
        let drained: Vec<PageEvent> = self.pending.drain(..).collect();
        drained
            .into_iter()
            .filter(|event| match event {
                PageEvent::Scroll => self.subscriptions.contains(&EventInterest::Scroll),
                PageEvent::Resize => self.subscriptions.contains(&EventInterest::Resize),
                PageEvent::FullscreenChange => self
                    .subscriptions
                    .contains(&EventInterest::FullscreenChange),
                PageEvent::ViewportResize => {
                    self.subscriptions.contains(&EventInterest::ViewportResize)
                }
                PageEvent::ViewportScroll => {
                    self.subscriptions.contains(&EventInterest::ViewportScroll)
                }
                PageEvent::SizeChanged(node) => self.size_observed.contains(node),
                PageEvent::Mutation => self.mutation_observers > 0,
            })
            .collect()
    }
}
