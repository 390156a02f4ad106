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

use crate::analysis::lattice::Lattice;

/// log(exp(x) + exp(y)) without overflow
fn logsumexp(x: f64, y: f64) -> f64 {
    if x == f64::NEG_INFINITY {
        return y;
    }
    if y == f64::NEG_INFINITY {
        return x;
    }
    let (hi, lo) = if x > y { (x, y) } else { (y, x) };
    hi + (lo - hi).exp().ln_1p()
}

/// Computes forward/backward scores and marginal probabilities of nodes and paths
///
/// Paths are stored in the order of the begin position of their right node,
/// so a single pass in each direction visits every node after all its inputs.
pub(crate) fn forward_backward(lattice: &mut Lattice) {
    let (bos, eos) = match (lattice.best.first(), lattice.best.last()) {
        (Some(b), Some(e)) => (b.index(), e.index()),
        _ => return,
    };
    let theta = lattice.theta;
    let nodes = &mut lattice.nodes;
    let paths = &mut lattice.paths;

    for n in nodes.iter_mut() {
        n.alpha = f64::NEG_INFINITY;
        n.beta = f64::NEG_INFINITY;
        n.prob = 0.0;
    }
    nodes[bos].alpha = 0.0;
    nodes[eos].beta = 0.0;

    for p in paths.iter() {
        let score = nodes[p.lnode.index()].alpha - theta * p.cost as f64;
        let r = &mut nodes[p.rnode.index()];
        r.alpha = logsumexp(r.alpha, score);
    }

    for p in paths.iter().rev() {
        let score = nodes[p.rnode.index()].beta - theta * p.cost as f64;
        let l = &mut nodes[p.lnode.index()];
        l.beta = logsumexp(l.beta, score);
    }

    let z = nodes[eos].alpha;
    for n in nodes.iter_mut() {
        n.prob = (n.alpha + n.beta - z).exp();
    }
    for p in paths.iter_mut() {
        let l = &nodes[p.lnode.index()];
        let r = &nodes[p.rnode.index()];
        p.prob = (l.alpha - theta * p.cost as f64 + r.beta - z).exp();
    }
    lattice.z = z;
}
