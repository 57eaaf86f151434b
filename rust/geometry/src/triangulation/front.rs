// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Advancing front of the sweep
//!
//! A doubly linked list of nodes stored in an arena. A node removed from the
//! front keeps its own `prev`/`next` links so walks started from it still
//! land on live nodes.

use super::point::PointId;
use super::triangle::TriangleId;

/// Index into the front node arena
pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct FrontNode {
    pub point: PointId,
    /// x coordinate of `point`
    pub value: f64,
    /// Triangle filling the gap between this node and `next`
    pub triangle: Option<TriangleId>,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct AdvancingFront {
    nodes: Vec<FrontNode>,
    head: NodeId,
    tail: NodeId,
    search: NodeId,
}

impl AdvancingFront {
    /// Front spanning `left`, `middle` and `right`, the first two owning `triangle`
    pub fn new(
        left: (PointId, f64),
        middle: (PointId, f64),
        right: (PointId, f64),
        triangle: TriangleId,
    ) -> Self {
        let nodes = vec![
            FrontNode {
                point: left.0,
                value: left.1,
                triangle: Some(triangle),
                prev: None,
                next: Some(1),
            },
            FrontNode {
                point: middle.0,
                value: middle.1,
                triangle: Some(triangle),
                prev: Some(0),
                next: Some(2),
            },
            FrontNode {
                point: right.0,
                value: right.1,
                triangle: None,
                prev: Some(1),
                next: None,
            },
        ];
        Self {
            nodes,
            head: 0,
            tail: 2,
            search: 0,
        }
    }

    #[inline]
    pub fn head(&self) -> NodeId {
        self.head
    }

    #[inline]
    pub fn tail(&self) -> NodeId {
        self.tail
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &FrontNode {
        &self.nodes[id]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut FrontNode {
        &mut self.nodes[id]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Link a new node directly after `prev`
    pub fn insert_after(&mut self, prev: NodeId, point: PointId, value: f64) -> NodeId {
        let id = self.nodes.len();
        let next = self.nodes[prev].next;
        self.nodes.push(FrontNode {
            point,
            value,
            triangle: None,
            prev: Some(prev),
            next,
        });
        if let Some(next) = next {
            self.nodes[next].prev = Some(id);
        }
        self.nodes[prev].next = Some(id);
        id
    }

    /// Unlink a node from its neighbours
    pub fn remove(&mut self, id: NodeId) {
        let FrontNode { prev, next, .. } = self.nodes[id];
        if let Some(prev) = prev {
            self.nodes[prev].next = next;
        }
        if let Some(next) = next {
            self.nodes[next].prev = prev;
        }
    }

    /// Node whose x range `[value, next.value)` contains `x`
    pub fn locate_node(&mut self, x: f64) -> Option<NodeId> {
        let mut node = self.search;
        if x < self.nodes[node].value {
            while let Some(prev) = self.nodes[node].prev {
                node = prev;
                if x >= self.nodes[node].value {
                    self.search = node;
                    return Some(node);
                }
            }
        } else {
            while let Some(next) = self.nodes[node].next {
                node = next;
                if x < self.nodes[node].value {
                    let prev = self.nodes[node].prev?;
                    self.search = prev;
                    return Some(prev);
                }
            }
        }
        None
    }

    /// Node holding `point`, whose x coordinate is `x`
    pub fn locate_point(&mut self, point: PointId, x: f64) -> Option<NodeId> {
        let start = self.search;
        let start_node = &self.nodes[start];
        let found = if x == start_node.value {
            if start_node.point == point {
                Some(start)
            } else {
                let prev = start_node.prev.filter(|&n| self.nodes[n].point == point);
                let next = start_node.next.filter(|&n| self.nodes[n].point == point);
                prev.or(next)
            }
        } else if x < start_node.value {
            self.walk(start, point, |n| n.prev)
        } else {
            self.walk(start, point, |n| n.next)
        };

        // Several nodes may share an x coordinate; fall back to a full scan
        let found = found.or_else(|| self.walk_from_head(point));
        if let Some(node) = found {
            self.search = node;
        }
        found
    }

    fn walk(
        &self,
        start: NodeId,
        point: PointId,
        step: impl Fn(&FrontNode) -> Option<NodeId>,
    ) -> Option<NodeId> {
        let mut node = step(&self.nodes[start]);
        while let Some(id) = node {
            if self.nodes[id].point == point {
                return Some(id);
            }
            node = step(&self.nodes[id]);
        }
        None
    }

    fn walk_from_head(&self, point: PointId) -> Option<NodeId> {
        if self.nodes[self.head].point == point {
            return Some(self.head);
        }
        self.walk(self.head, point, |n| n.next)
    }
}
