//! Boykov-Kolmogorov max-flow on an arena graph.
//!
//! Nodes and arcs live in two contiguous buffers addressed by `u32` ids.
//! Arcs are stored in sister pairs at consecutive indices, so the reverse
//! arc of `a` is `a ^ 1`. The two terminals are not materialized: each node
//! carries a single signed residual `cap` toward SOURCE (positive) or SINK
//! (negative).
//!
//! The algorithm grows a SOURCE tree and a SINK tree simultaneously. When
//! the trees touch, the connecting path is augmented; nodes cut off by
//! saturated tree edges become orphans and are re-adopted or freed. The
//! timestamp/distance fields cache distances to the terminals so orphan
//! adoption can prefer short reconnections without rescanning whole trees.

use std::collections::VecDeque;

pub type NodeId = u32;
pub type ArcId = u32;

/// Residual capacity of a single arc or terminal link.
pub type Capacity = i32;

/// Total flow; wider than [`Capacity`] so large graphs cannot overflow it.
pub type Flow = i64;

const NO_ARC: ArcId = ArcId::MAX;

/// Side of the cut a node ends up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    Source,
    Sink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parent {
    /// Free node, in neither tree.
    None,
    /// Tree root, linked directly to its terminal.
    Terminal,
    /// Cut off during augmentation, waiting for adoption.
    Orphan,
    /// In-tree node; the arc leads toward the root.
    Arc(ArcId),
}

struct Node {
    first: ArcId,
    parent: Parent,
    /// Intrusive active-list link. `Some(self)` marks the list tail,
    /// `None` means not queued.
    next: Option<NodeId>,
    /// Timestamp at which `dist` was computed.
    ts: u32,
    /// Cached distance to the terminal.
    dist: u32,
    term: Term,
    /// Residual to SOURCE if positive, to SINK if negative.
    cap: Capacity,
}

struct Arc {
    head: NodeId,
    next: ArcId,
    cap: Capacity,
}

#[inline]
fn sister(a: ArcId) -> ArcId {
    a ^ 1
}

pub struct Graph {
    nodes: Vec<Node>,
    arcs: Vec<Arc>,
    flow: Flow,
    queue_first: Option<NodeId>,
    queue_last: Option<NodeId>,
    orphans: VecDeque<NodeId>,
    time: u32,
}

impl Graph {
    pub fn new() -> Graph {
        Graph::with_capacity(0, 0)
    }

    /// `node_hint` and `arc_hint` pre-size the arenas; `arc_hint` counts
    /// individual arcs, two per `add_edge` call.
    pub fn with_capacity(node_hint: usize, arc_hint: usize) -> Graph {
        Graph {
            nodes: Vec::with_capacity(node_hint),
            arcs: Vec::with_capacity(arc_hint),
            flow: 0,
            queue_first: None,
            queue_last: None,
            orphans: VecDeque::new(),
            time: 0,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn add_node(&mut self) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node {
            first: NO_ARC,
            parent: Parent::None,
            next: None,
            ts: 0,
            dist: 0,
            term: Term::Source,
            cap: 0,
        });
        id
    }

    /// Add the sister pair `i -> j` with capacity `cap` and `j -> i` with
    /// capacity `rev_cap`. Negative capacities and self-loops are
    /// programmer errors.
    pub fn add_edge(&mut self, i: NodeId, j: NodeId, cap: Capacity, rev_cap: Capacity) {
        assert!(i != j, "self-loop on node {i}");
        assert!(cap >= 0 && rev_cap >= 0, "negative edge capacity");

        let ij = self.arcs.len() as ArcId;
        let ji = ij + 1;
        self.arcs.push(Arc {
            head: j,
            next: self.nodes[i as usize].first,
            cap,
        });
        self.arcs.push(Arc {
            head: i,
            next: self.nodes[j as usize].first,
            cap: rev_cap,
        });
        self.nodes[i as usize].first = ij;
        self.nodes[j as usize].first = ji;
    }

    /// Add terminal links `SOURCE -> i` and `i -> SINK`.
    ///
    /// May be called repeatedly per node, and the weights may be negative;
    /// the common part of the two links is pre-saturated into the flow and
    /// only the difference is stored on the node.
    pub fn add_tweights(&mut self, i: NodeId, cap_source: Capacity, cap_sink: Capacity) {
        let delta = self.nodes[i as usize].cap;
        let (mut cap_source, mut cap_sink) = (cap_source, cap_sink);
        if delta > 0 {
            cap_source += delta;
        } else {
            cap_sink -= delta;
        }
        self.flow += Flow::from(cap_source.min(cap_sink));
        self.nodes[i as usize].cap = cap_source - cap_sink;
    }

    /// Cut side of node `i` after [`maxflow`](Self::maxflow). Free nodes can
    /// sit on either side of a minimum cut; they report `default_term`.
    pub fn what_segment(&self, i: NodeId, default_term: Term) -> Term {
        let node = &self.nodes[i as usize];
        if node.parent != Parent::None {
            node.term
        } else {
            default_term
        }
    }

    /// Compute the maximum flow and implicitly the minimum cut.
    pub fn maxflow(&mut self) -> Flow {
        self.init();

        // A node that found an augmenting path stays current as long as it
        // keeps a parent, instead of being re-queued.
        let mut current: Option<NodeId> = None;
        loop {
            let i = match current.take() {
                Some(i) => i,
                None => match self.next_active() {
                    Some(i) => i,
                    None => break,
                },
            };
            let mid = self.grow_tree(i);
            self.time += 1;
            let Some(mid) = mid else { continue };

            // Keep i out of the active queue while augmenting.
            self.nodes[i as usize].next = Some(i);
            self.augment(mid);
            self.adopt_orphans();
            self.nodes[i as usize].next = None;

            if self.nodes[i as usize].parent != Parent::None {
                current = Some(i);
            }
        }
        self.flow
    }

    /// Seed both trees: every node with a terminal residual starts at
    /// distance 1 from its terminal and active.
    fn init(&mut self) {
        self.queue_first = None;
        self.queue_last = None;
        self.orphans.clear();
        self.time = 0;

        for id in 0..self.nodes.len() as NodeId {
            let node = &mut self.nodes[id as usize];
            node.next = None;
            node.ts = 0;
            if node.cap == 0 {
                node.parent = Parent::None;
            } else {
                node.term = if node.cap > 0 { Term::Source } else { Term::Sink };
                node.parent = Parent::Terminal;
                node.dist = 1;
                self.set_active(id);
            }
        }
    }

    fn set_active(&mut self, i: NodeId) {
        if self.nodes[i as usize].next.is_some() {
            return;
        }
        match self.queue_last {
            Some(last) => self.nodes[last as usize].next = Some(i),
            None => self.queue_first = Some(i),
        }
        self.queue_last = Some(i);
        self.nodes[i as usize].next = Some(i);
    }

    /// Pop the next active node, lazily skipping nodes that lost their
    /// parent while queued.
    fn next_active(&mut self) -> Option<NodeId> {
        loop {
            let i = self.queue_first?;
            if self.nodes[i as usize].next == Some(i) {
                self.queue_first = None;
                self.queue_last = None;
            } else {
                self.queue_first = self.nodes[i as usize].next;
            }
            self.nodes[i as usize].next = None;
            if self.nodes[i as usize].parent != Parent::None {
                return Some(i);
            }
        }
    }

    fn set_orphan(&mut self, i: NodeId) {
        self.nodes[i as usize].parent = Parent::Orphan;
        self.orphans.push_back(i);
    }

    /// Residual from tree node `i` outward along `a`, in the direction its
    /// tree grows.
    #[inline]
    fn growth_residual(&self, term: Term, a: ArcId) -> Capacity {
        match term {
            Term::Source => self.arcs[a as usize].cap,
            Term::Sink => self.arcs[sister(a) as usize].cap,
        }
    }

    /// Scan the arcs of active node `i`, adopting free neighbors into its
    /// tree. Returns an arc connecting the two trees if one is found.
    fn grow_tree(&mut self, i: NodeId) -> Option<ArcId> {
        let i_term = self.nodes[i as usize].term;
        let i_ts = self.nodes[i as usize].ts;
        let i_dist = self.nodes[i as usize].dist;

        let mut a = self.nodes[i as usize].first;
        while a != NO_ARC {
            if self.growth_residual(i_term, a) > 0 {
                let j = self.arcs[a as usize].head;
                let jn = &mut self.nodes[j as usize];
                if jn.parent == Parent::None {
                    jn.term = i_term;
                    jn.parent = Parent::Arc(sister(a));
                    jn.ts = i_ts;
                    jn.dist = i_dist + 1;
                    self.set_active(j);
                } else if jn.term != i_term {
                    return Some(a);
                } else if jn.ts <= i_ts && jn.dist > i_dist {
                    // Heuristic: shorten j's path to its terminal.
                    jn.parent = Parent::Arc(sister(a));
                    jn.ts = i_ts;
                    jn.dist = i_dist + 1;
                }
            }
            a = self.arcs[a as usize].next;
        }
        None
    }

    /// Push the bottleneck along the source-to-sink path through `mid`.
    fn augment(&mut self, mid: ArcId) {
        // Orient mid from the source tree into the sink tree.
        let mid = if self.nodes[self.arcs[mid as usize].head as usize].term == Term::Source {
            sister(mid)
        } else {
            mid
        };
        let bottleneck = self.find_bottleneck(mid);
        self.push_flow(mid, bottleneck);
    }

    fn parent_arc(&self, i: NodeId) -> Option<ArcId> {
        match self.nodes[i as usize].parent {
            Parent::Arc(a) => Some(a),
            _ => None,
        }
    }

    fn find_bottleneck(&self, mid: ArcId) -> Capacity {
        let mut cap = self.arcs[mid as usize].cap;

        // Source tree: walk from the tail of mid up to the root.
        let mut i = self.arcs[sister(mid) as usize].head;
        while let Some(a) = self.parent_arc(i) {
            cap = cap.min(self.arcs[sister(a) as usize].cap);
            i = self.arcs[a as usize].head;
        }
        cap = cap.min(self.nodes[i as usize].cap);

        // Sink tree: walk from the head of mid down to the root.
        let mut i = self.arcs[mid as usize].head;
        while let Some(a) = self.parent_arc(i) {
            cap = cap.min(self.arcs[a as usize].cap);
            i = self.arcs[a as usize].head;
        }
        cap.min(-self.nodes[i as usize].cap)
    }

    fn push_flow(&mut self, mid: ArcId, f: Capacity) {
        self.flow += Flow::from(f);
        self.arcs[sister(mid) as usize].cap += f;
        self.arcs[mid as usize].cap -= f;

        // Source tree: tree edges point root-ward, flow runs leaf-ward, so
        // the residual that matters is the sister's.
        let mut i = self.arcs[sister(mid) as usize].head;
        while let Some(a) = self.parent_arc(i) {
            self.arcs[a as usize].cap += f;
            self.arcs[sister(a) as usize].cap -= f;
            if self.arcs[sister(a) as usize].cap == 0 {
                self.set_orphan(i);
            }
            i = self.arcs[a as usize].head;
        }
        self.nodes[i as usize].cap -= f;
        if self.nodes[i as usize].cap == 0 {
            self.set_orphan(i);
        }

        // Sink tree.
        let mut i = self.arcs[mid as usize].head;
        while let Some(a) = self.parent_arc(i) {
            self.arcs[sister(a) as usize].cap += f;
            self.arcs[a as usize].cap -= f;
            if self.arcs[a as usize].cap == 0 {
                self.set_orphan(i);
            }
            i = self.arcs[a as usize].head;
        }
        self.nodes[i as usize].cap += f;
        if self.nodes[i as usize].cap == 0 {
            self.set_orphan(i);
        }
    }

    /// Nodes on the root-ward path from `j`, terminal included, or `None`
    /// if the path dead-ends in an orphan or free node. Stamps the node
    /// next to the terminal so later probes in the same round are O(1).
    fn dist_to_root(&mut self, mut j: NodeId) -> Option<u32> {
        let mut d = 2u32;
        loop {
            match self.nodes[j as usize].parent {
                Parent::Terminal => break,
                Parent::Orphan | Parent::None => return None,
                Parent::Arc(a) => {
                    if self.nodes[j as usize].ts == self.time {
                        return Some(d + self.nodes[j as usize].dist - 1);
                    }
                    d += 1;
                    j = self.arcs[a as usize].head;
                }
            }
        }
        self.nodes[j as usize].ts = self.time;
        self.nodes[j as usize].dist = 1;
        Some(d)
    }

    /// Reconnect orphan `i` through the nearest in-tree neighbor, or free it
    /// and propagate: children become orphans, tree neighbors that can grow
    /// into the vacated region become active.
    fn process_orphan(&mut self, i: NodeId) {
        let i_term = self.nodes[i as usize].term;
        let mut d_min = u32::MAX;
        self.nodes[i as usize].parent = Parent::None;

        let mut a0 = self.nodes[i as usize].first;
        while a0 != NO_ARC {
            // Reconnection needs residual toward i, i.e. against growth.
            let residual = match i_term {
                Term::Source => self.arcs[sister(a0) as usize].cap,
                Term::Sink => self.arcs[a0 as usize].cap,
            };
            if residual > 0 {
                let j = self.arcs[a0 as usize].head;
                if self.nodes[j as usize].term == i_term
                    && self.nodes[j as usize].parent != Parent::None
                {
                    if let Some(d) = self.dist_to_root(j) {
                        if d < d_min {
                            self.nodes[i as usize].parent = Parent::Arc(a0);
                            self.nodes[i as usize].ts = self.time;
                            self.nodes[i as usize].dist = d;
                            d_min = d;
                        }
                        // Stamp distances along the probed path.
                        let mut dd = d;
                        let mut k = j;
                        while self.nodes[k as usize].ts != self.time {
                            self.nodes[k as usize].ts = self.time;
                            self.nodes[k as usize].dist = dd;
                            dd -= 1;
                            k = match self.nodes[k as usize].parent {
                                Parent::Arc(a) => self.arcs[a as usize].head,
                                _ => break,
                            };
                        }
                    }
                }
            }
            a0 = self.arcs[a0 as usize].next;
        }

        if self.nodes[i as usize].parent != Parent::None {
            return;
        }

        // No adopter found: i leaves the tree.
        let mut a0 = self.nodes[i as usize].first;
        while a0 != NO_ARC {
            let j = self.arcs[a0 as usize].head;
            if self.nodes[j as usize].term == i_term {
                let parent = self.nodes[j as usize].parent;
                if parent != Parent::None {
                    if let Parent::Arc(a) = parent {
                        if self.arcs[a as usize].head == i {
                            self.set_orphan(j);
                        }
                    }
                    let residual = match i_term {
                        Term::Source => self.arcs[sister(a0) as usize].cap,
                        Term::Sink => self.arcs[a0 as usize].cap,
                    };
                    if residual > 0 {
                        self.set_active(j);
                    }
                }
            }
            a0 = self.arcs[a0 as usize].next;
        }
    }

    fn adopt_orphans(&mut self) {
        while let Some(i) = self.orphans.pop_front() {
            self.process_orphan(i);
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Graph::new()
    }
}
