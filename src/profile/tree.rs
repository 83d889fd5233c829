use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, error, trace};

use crate::profile::breakdown::{ProfileBreakdown, TimingType};
use crate::profile::errors::ProfileError;
use crate::search::Query;

/// Identity of a query instance: the address of its shared allocation.
fn query_key(query: &Arc<dyn Query>) -> usize {
    Arc::as_ptr(query) as *const () as usize
}

#[derive(Debug)]
struct ProfileNode {
    // Held so the allocation, and therefore the key, stays unique while the
    // profile is alive.
    query: Arc<dyn Query>,
    // Instances this node was entered as before a rewrite rebound it.
    aliases: SmallVec<[Arc<dyn Query>; 2]>,
    breakdown: Rc<ProfileBreakdown>,
    children: Vec<usize>,
}

impl ProfileNode {
    fn new(query: &Arc<dyn Query>) -> Self {
        Self {
            query: Arc::clone(query),
            aliases: SmallVec::new(),
            breakdown: Rc::new(ProfileBreakdown::new()),
            children: Vec::new(),
        }
    }

    fn key(&self) -> usize {
        query_key(&self.query)
    }

    fn answers_to(&self, key: usize) -> bool {
        self.key() == key || self.aliases.iter().any(|alias| query_key(alias) == key)
    }
}

/// Builds the tree of per-query timings for one search request.
///
/// The searcher calls [`Profiler::get_profile_breakdown`] when it enters a
/// profiled call for a query and [`Profiler::poll_last_element`] when it
/// leaves; the stack top is the node currently being timed. Nodes are keyed by
/// query instance under their parent, so a sub-query shared by two parents is
/// reported twice and two equal queries built separately never merge.
///
/// Not `Send`: one profiler serves one thread.
#[derive(Debug, Default)]
pub struct Profiler {
    nodes: RefCell<Vec<ProfileNode>>,
    stack: RefCell<SmallVec<[usize; 8]>>,
    roots: RefCell<Vec<usize>>,
}

impl Profiler {
    /// Creates an empty profiler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters `query`: finds or creates its node under the current node (or
    /// among the roots), makes it current and returns its breakdown.
    ///
    /// Every call must be paired with [`Profiler::poll_last_element`].
    pub fn get_profile_breakdown(&self, query: &Arc<dyn Query>) -> Rc<ProfileBreakdown> {
        self.push(query).1
    }

    /// Leaves the current node, making its parent current again.
    pub fn poll_last_element(&self) -> Result<(), ProfileError> {
        self.pop().map(|_| ())
    }

    /// Enters `query` for the lifetime of the returned guard.
    pub fn scope(&self, query: &Arc<dyn Query>) -> ProfileScope<'_> {
        let (node, breakdown) = self.push(query);
        ProfileScope {
            profiler: self,
            node,
            breakdown,
        }
    }

    /// Number of open nodes.
    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    /// Whether no node has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    /// Snapshot of the recorded forest, roots in first-visit order.
    pub fn tree(&self) -> Result<Vec<ProfileResult>, ProfileError> {
        let depth = self.depth();
        if depth > 0 {
            return Err(ProfileError::Unbalanced { depth });
        }
        let nodes = self.nodes.borrow();
        Ok(self
            .roots
            .borrow()
            .iter()
            .map(|&root| snapshot(&nodes, root))
            .collect())
    }

    fn push(&self, query: &Arc<dyn Query>) -> (usize, Rc<ProfileBreakdown>) {
        let key = query_key(query);
        let parent = self.stack.borrow().last().copied();
        let mut nodes = self.nodes.borrow_mut();
        let existing = match parent {
            Some(p) => nodes[p].children.iter().copied().find(|&c| nodes[c].answers_to(key)),
            None => self.roots.borrow().iter().copied().find(|&c| nodes[c].answers_to(key)),
        };
        let index = match existing {
            Some(index) => index,
            None => {
                let index = nodes.len();
                nodes.push(ProfileNode::new(query));
                match parent {
                    Some(p) => nodes[p].children.push(index),
                    None => self.roots.borrow_mut().push(index),
                }
                debug!(
                    node = index,
                    parent = ?parent,
                    query_type = query.name(),
                    "profile.node.create"
                );
                index
            }
        };
        let mut stack = self.stack.borrow_mut();
        stack.push(index);
        trace!(node = index, depth = stack.len(), "profile.push");
        (index, Rc::clone(&nodes[index].breakdown))
    }

    fn pop(&self) -> Result<usize, ProfileError> {
        let mut stack = self.stack.borrow_mut();
        let node = stack.pop().ok_or(ProfileError::EmptyStack)?;
        trace!(node, depth = stack.len(), "profile.pop");
        Ok(node)
    }

    /// Rebinds the open `node` to `query`. When a sibling already stands for
    /// `query` the node is folded into it and the sibling takes its place on
    /// the stack. Returns the node now standing for `query`.
    fn rebind(&self, node: usize, query: &Arc<dyn Query>) -> usize {
        let key = query_key(query);
        let mut nodes = self.nodes.borrow_mut();
        match nodes.get(node) {
            Some(entry) if !entry.answers_to(key) => {}
            _ => return node,
        }
        let mut stack = self.stack.borrow_mut();
        let Some(position) = stack.iter().rposition(|&open| open == node) else {
            error!(node, "profile.node.rebind_closed");
            return node;
        };
        let parent = position.checked_sub(1).map(|p| stack[p]);
        let mut roots = self.roots.borrow_mut();
        let siblings = match parent {
            Some(p) => nodes[p].children.clone(),
            None => roots.clone(),
        };
        let target = siblings
            .into_iter()
            .find(|&c| c != node && nodes[c].answers_to(key));

        let previous = std::mem::replace(&mut nodes[node].query, Arc::clone(query));
        trace!(node, from = previous.name(), to = query.name(), "profile.node.rebind");
        nodes[node].aliases.push(previous);
        let Some(target) = target else {
            return node;
        };

        let aliases = std::mem::take(&mut nodes[node].aliases);
        let children = std::mem::take(&mut nodes[node].children);
        let breakdown = Rc::clone(&nodes[node].breakdown);
        let into = &mut nodes[target];
        into.aliases.extend(aliases);
        into.children.extend(children);
        into.breakdown.absorb(&breakdown);
        match parent {
            Some(p) => nodes[p].children.retain(|c| *c != node),
            None => roots.retain(|c| *c != node),
        }
        stack[position] = target;
        debug!(node, into = target, "profile.node.fold");
        target
    }
}

fn snapshot(nodes: &[ProfileNode], index: usize) -> ProfileResult {
    let node = &nodes[index];
    ProfileResult {
        query_type: node.query.name().to_owned(),
        description: node.query.to_string(),
        time_in_nanos: node.breakdown.total_time(),
        breakdown: node.breakdown.to_map(),
        children: node
            .children
            .iter()
            .map(|&child| snapshot(nodes, child))
            .collect(),
    }
}

/// An entered profile node; leaves it when dropped.
#[must_use = "the node is left as soon as the scope is dropped"]
pub struct ProfileScope<'a> {
    profiler: &'a Profiler,
    node: usize,
    breakdown: Rc<ProfileBreakdown>,
}

impl ProfileScope<'_> {
    /// Breakdown of the entered node.
    pub fn breakdown(&self) -> &Rc<ProfileBreakdown> {
        &self.breakdown
    }

    /// Re-identifies the entered node as `query`, used once a query has been
    /// rewritten so later phases land on the same node. If another node
    /// already stands for `query` at this level, the entered node's timings
    /// move there and the scope continues on that node.
    pub fn rebind(&mut self, query: &Arc<dyn Query>) {
        let node = self.profiler.rebind(self.node, query);
        if node != self.node {
            self.node = node;
            if let Some(entry) = self.profiler.nodes.borrow().get(node) {
                self.breakdown = Rc::clone(&entry.breakdown);
            }
        }
    }
}

impl Drop for ProfileScope<'_> {
    fn drop(&mut self) {
        match self.profiler.pop() {
            Ok(node) if node == self.node => {}
            Ok(node) => error!(expected = self.node, found = node, "profile.scope.foreign_node"),
            Err(err) => error!(error = %err, "profile.scope.empty_stack"),
        }
    }
}

/// Timings of one profiled query node and its children.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProfileResult {
    #[serde(rename = "type")]
    query_type: String,
    description: String,
    time_in_nanos: u64,
    breakdown: BTreeMap<String, u64>,
    children: Vec<ProfileResult>,
}

impl ProfileResult {
    /// Query type name, e.g. `TermQuery`.
    pub fn query_type(&self) -> &str {
        &self.query_type
    }

    /// Textual form of the query.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Nanoseconds per phase name; every phase is present.
    pub fn time_breakdown(&self) -> &BTreeMap<String, u64> {
        &self.breakdown
    }

    /// Nanoseconds recorded for `timing`.
    pub fn timing(&self, timing: TimingType) -> u64 {
        self.breakdown.get(timing.as_str()).copied().unwrap_or(0)
    }

    /// Sum over every phase of this node; children are not added.
    pub fn total_time(&self) -> u64 {
        self.time_in_nanos
    }

    /// Child nodes in first-visit order.
    pub fn children(&self) -> &[ProfileResult] {
        &self.children
    }
}
