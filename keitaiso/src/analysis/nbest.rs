/*
 * Copyright (c) 2021 Works Applications Co., Ltd.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::analysis::node::{Node, NodeId, NodeStat, Path};

/// Partial path from some node to EOS
#[derive(Clone, Debug)]
struct QueueElement {
    node: NodeId,
    /// Element of the following node, `None` for EOS
    next: Option<usize>,
    /// Cost of the fixed suffix
    gx: i64,
}

/// Heap entry ordered by the estimated total cost, insertion order breaks ties
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Candidate {
    fx: i64,
    seq: u64,
    element: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap
        other
            .fx
            .cmp(&self.fx)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Enumerates complete paths of a lattice in the order of non-decreasing cost
///
/// Works backwards from EOS with A* search.
/// Viterbi costs of nodes are the exact cost of the best prefix,
/// so the heuristic is both admissible and consistent.
/// Each queue element is a distinct suffix, so a path is never produced twice.
#[derive(Clone, Debug, Default)]
pub struct NBestGenerator {
    elements: Vec<QueueElement>,
    heap: BinaryHeap<Candidate>,
    seq: u64,
}

impl NBestGenerator {
    pub fn new(eos: &Node) -> NBestGenerator {
        let mut gen = NBestGenerator::default();
        gen.push(
            QueueElement {
                node: eos.id(),
                next: None,
                gx: 0,
            },
            eos.total_cost(),
        );
        gen
    }

    fn push(&mut self, element: QueueElement, fx: i64) {
        let idx = self.elements.len();
        self.elements.push(element);
        self.heap.push(Candidate {
            fx,
            seq: self.seq,
            element: idx,
        });
        self.seq += 1;
    }

    /// Returns the next path as node ids from the BOS successor to EOS, and its cost
    ///
    /// `None` when all paths were produced.
    pub fn next(&mut self, nodes: &[Node], paths: &[Path]) -> Option<(Vec<NodeId>, i64)> {
        while let Some(top) = self.heap.pop() {
            let element = self.elements[top.element].clone();
            let node = &nodes[element.node.index()];
            tracing::trace!(
                "nbest pop: node {} at {}..{}, fx = {}",
                node.id(),
                node.begin(),
                node.end(),
                top.fx
            );

            if node.stat() == NodeStat::Bos {
                let mut result = Vec::new();
                let mut cur = element.next;
                while let Some(idx) = cur {
                    let e = &self.elements[idx];
                    result.push(e.node);
                    cur = e.next;
                }
                return Some((result, top.fx));
            }

            for path in &paths[node.lpath_range()] {
                let lnode = &nodes[path.lnode.index()];
                let gx = element.gx + path.cost as i64;
                let fx = lnode.total_cost() + gx;
                self.push(
                    QueueElement {
                        node: lnode.id(),
                        next: Some(top.element),
                        gx,
                    },
                    fx,
                );
            }
        }
        None
    }
}
