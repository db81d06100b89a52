#![forbid(unsafe_code)]

//! In-memory [`FlipHost`] that records everything the controller does.
//!
//! Containers are registered under selectors, portals and fragments are
//! plain indices, and every side effect (placement, style write, listener,
//! preview request, activation) is kept for assertions. Failure injection
//! covers the silent-failure paths.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::FlipSelectors;
use crate::error::{FlipError, Result};
use crate::host::{ContainerRole, FlipHost, StyleProperty};
use crate::layout::SCAFFOLD_MARKUP;
use crate::preview::{PreviewRequest, install_preview};
use crate::transition::FlipDirection;

/// Recorded DOM node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Recorded embedding handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortalId(pub usize);

/// Recorded isolated preview fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(pub usize);

#[derive(Debug, Clone)]
struct Node {
    role: Option<ContainerRole>,
    parent: Option<NodeId>,
}

/// How a recorded portal came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalOrigin {
    Created,
    Duplicate(PortalId),
    Adopted,
}

#[derive(Debug, Clone)]
struct Portal {
    src: String,
    origin: PortalOrigin,
    container: Option<NodeId>,
}

#[derive(Debug, Clone)]
struct Fragment {
    container: NodeId,
    markup: String,
    styles: BTreeMap<StyleProperty, String>,
}

/// Recording host for tests.
#[derive(Debug, Clone)]
pub struct RecordingHost {
    nodes: Vec<Node>,
    selectors: HashMap<String, NodeId>,
    portals: Vec<Portal>,
    fragments: Vec<Fragment>,
    styles: BTreeMap<(NodeId, StyleProperty), String>,
    click_listeners: Vec<(FlipDirection, NodeId)>,
    transition_listeners: usize,
    preview_requests: Vec<PreviewRequest<NodeId>>,
    activations: Vec<PortalId>,
    markup_appends: usize,
    failing_attach: BTreeSet<ContainerRole>,
    fail_styles: bool,
}

const BODY: NodeId = NodeId(0);

impl RecordingHost {
    /// Host whose document body is empty.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            nodes: vec![Node {
                role: None,
                parent: None,
            }],
            selectors: HashMap::new(),
            portals: Vec::new(),
            fragments: Vec::new(),
            styles: BTreeMap::new(),
            click_listeners: Vec::new(),
            transition_listeners: 0,
            preview_requests: Vec::new(),
            activations: Vec::new(),
            markup_appends: 0,
            failing_attach: BTreeSet::new(),
            fail_styles: false,
        }
    }

    /// Host whose page already supplies the default containers.
    #[must_use]
    pub fn with_default_scaffold() -> Self {
        Self::with_containers(&FlipSelectors::default())
    }

    /// Host whose page supplies containers under `selectors`.
    #[must_use]
    pub fn with_containers(selectors: &FlipSelectors) -> Self {
        let mut host = Self::empty();
        host.add_containers(selectors);
        host
    }

    fn add_node(&mut self, role: Option<ContainerRole>, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            role,
            parent: Some(parent),
        });
        id
    }

    fn add_containers(&mut self, selectors: &FlipSelectors) {
        let upper_fold = self.add_node(None, BODY);
        let lower_fold = self.add_node(None, BODY);
        for (role, parent) in [
            (ContainerRole::UpperFront, upper_fold),
            (ContainerRole::UpperBack, upper_fold),
            (ContainerRole::LowerFront, lower_fold),
            (ContainerRole::LowerBack, lower_fold),
            (ContainerRole::NextSlot, BODY),
            (ContainerRole::PrevSlot, BODY),
        ] {
            let node = self.add_node(Some(role), parent);
            self.selectors.insert(selectors.get(role).to_owned(), node);
        }
    }

    /// Register a handle as if adopted from a predecessor document.
    pub fn adopt_portal(&mut self, src: &str) -> PortalId {
        self.push_portal(src.to_owned(), PortalOrigin::Adopted)
    }

    fn push_portal(&mut self, src: String, origin: PortalOrigin) -> PortalId {
        let id = PortalId(self.portals.len());
        self.portals.push(Portal {
            src,
            origin,
            container: None,
        });
        id
    }

    /// Make `attach_isolated` fail for containers with `role`.
    pub fn fail_attach_for(&mut self, role: ContainerRole) {
        self.failing_attach.insert(role);
    }

    /// Make every `set_style` fail.
    pub fn fail_styles(&mut self, fail: bool) {
        self.fail_styles = fail;
    }

    /// Complete every pending preview fetch with `markup`.
    pub fn resolve_previews(&mut self, markup: &str) -> Result<usize> {
        let requests = std::mem::take(&mut self.preview_requests);
        let mut attached = 0;
        for request in &requests {
            attached += install_preview(self, request, markup)?;
        }
        Ok(attached)
    }

    #[must_use]
    pub fn role_of(&self, node: &NodeId) -> Option<ContainerRole> {
        self.nodes.get(node.0).and_then(|n| n.role)
    }

    fn node_for(&self, role: ContainerRole) -> Option<NodeId> {
        (0..self.nodes.len())
            .map(NodeId)
            .find(|id| self.role_of(id) == Some(role))
    }

    #[must_use]
    pub const fn markup_appends(&self) -> usize {
        self.markup_appends
    }

    /// Number of handles made by `create_portal` (not duplicates or adopted).
    #[must_use]
    pub fn created_portals(&self) -> usize {
        self.portals
            .iter()
            .filter(|p| p.origin == PortalOrigin::Created)
            .count()
    }

    #[must_use]
    pub fn portal_origin(&self, portal: PortalId) -> Option<PortalOrigin> {
        self.portals.get(portal.0).map(|p| p.origin)
    }

    /// Portals currently placed in the container with `role`.
    #[must_use]
    pub fn portals_in(&self, role: ContainerRole) -> Vec<PortalId> {
        let Some(node) = self.node_for(role) else {
            return Vec::new();
        };
        self.portals
            .iter()
            .enumerate()
            .filter(|(_, p)| p.container == Some(node))
            .map(|(idx, _)| PortalId(idx))
            .collect()
    }

    /// Fragments attached to the container with `role`.
    #[must_use]
    pub fn fragments_in(&self, role: ContainerRole) -> Vec<FragmentId> {
        let Some(node) = self.node_for(role) else {
            return Vec::new();
        };
        self.fragments
            .iter()
            .enumerate()
            .filter(|(_, f)| f.container == node)
            .map(|(idx, _)| FragmentId(idx))
            .collect()
    }

    #[must_use]
    pub fn fragment_markup(&self, fragment: FragmentId) -> Option<&str> {
        self.fragments.get(fragment.0).map(|f| f.markup.as_str())
    }

    /// Write a style on one fragment only.
    pub fn set_fragment_style(&mut self, fragment: FragmentId, property: StyleProperty, value: &str) {
        if let Some(f) = self.fragments.get_mut(fragment.0) {
            f.styles.insert(property, value.to_owned());
        }
    }

    #[must_use]
    pub fn fragment_style(&self, fragment: FragmentId, property: StyleProperty) -> Option<&str> {
        self.fragments
            .get(fragment.0)
            .and_then(|f| f.styles.get(&property))
            .map(String::as_str)
    }

    #[must_use]
    pub fn style(&self, node: NodeId, property: StyleProperty) -> Option<&str> {
        self.styles.get(&(node, property)).map(String::as_str)
    }

    #[must_use]
    pub fn has_click_listener(&self, role: ContainerRole) -> bool {
        self.click_listeners
            .iter()
            .any(|(_, node)| self.role_of(node) == Some(role))
    }

    /// Registered click listeners as `(direction, container role)`.
    #[must_use]
    pub fn click_listeners(&self) -> Vec<(FlipDirection, Option<ContainerRole>)> {
        self.click_listeners
            .iter()
            .map(|(direction, node)| (*direction, self.role_of(node)))
            .collect()
    }

    #[must_use]
    pub const fn has_transition_listener(&self) -> bool {
        self.transition_listeners > 0
    }

    #[must_use]
    pub fn preview_requests(&self) -> &[PreviewRequest<NodeId>] {
        &self.preview_requests
    }

    #[must_use]
    pub fn activations(&self) -> &[PortalId] {
        &self.activations
    }
}

impl FlipHost for RecordingHost {
    type Element = NodeId;
    type Portal = PortalId;

    fn query(&self, selector: &str) -> Option<NodeId> {
        self.selectors.get(selector).copied()
    }

    fn parent(&self, element: &NodeId) -> Option<NodeId> {
        self.nodes.get(element.0).and_then(|n| n.parent)
    }

    fn append_markup(&mut self, markup: &str) -> Result<()> {
        self.markup_appends += 1;
        if markup == SCAFFOLD_MARKUP {
            self.add_containers(&FlipSelectors::default());
        }
        Ok(())
    }

    fn create_portal(&mut self, src: &str) -> Result<PortalId> {
        Ok(self.push_portal(src.to_owned(), PortalOrigin::Created))
    }

    fn duplicate_portal(&mut self, portal: &PortalId) -> Result<PortalId> {
        let src = self
            .portals
            .get(portal.0)
            .map(|p| p.src.clone())
            .ok_or_else(|| FlipError::Host(format!("unknown portal {}", portal.0)))?;
        Ok(self.push_portal(src, PortalOrigin::Duplicate(*portal)))
    }

    fn portal_src(&self, portal: &PortalId) -> String {
        self.portals
            .get(portal.0)
            .map(|p| p.src.clone())
            .unwrap_or_default()
    }

    fn append_portal(&mut self, container: &NodeId, portal: &PortalId) -> Result<()> {
        let entry = self
            .portals
            .get_mut(portal.0)
            .ok_or_else(|| FlipError::Host(format!("unknown portal {}", portal.0)))?;
        entry.container = Some(*container);
        Ok(())
    }

    fn attach_isolated(&mut self, container: &NodeId, markup: &str) -> Result<()> {
        if let Some(role) = self.role_of(container) {
            if self.failing_attach.contains(&role) {
                return Err(FlipError::Host(format!("attach refused for {role}")));
            }
        }
        self.fragments.push(Fragment {
            container: *container,
            markup: markup.to_owned(),
            styles: BTreeMap::new(),
        });
        Ok(())
    }

    fn set_style(&mut self, element: &NodeId, property: StyleProperty, value: &str) -> Result<()> {
        if self.fail_styles {
            return Err(FlipError::Host(format!(
                "style {} refused",
                property.css_name()
            )));
        }
        self.styles.insert((*element, property), value.to_owned());
        Ok(())
    }

    fn listen_click(&mut self, direction: FlipDirection, element: &NodeId) -> Result<()> {
        self.click_listeners.push((direction, *element));
        Ok(())
    }

    fn listen_transition_end(&mut self) -> Result<()> {
        self.transition_listeners += 1;
        Ok(())
    }

    fn fetch_preview(&mut self, request: PreviewRequest<NodeId>) {
        self.preview_requests.push(request);
    }

    fn activate(&mut self, portal: &PortalId) {
        self.activations.push(*portal);
    }
}
