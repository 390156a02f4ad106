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

use claim::assert_ok;

use keitaiso::prelude::*;

mod common;
use common::{MODEL, TEST_DIC};

const EPS: f64 = 1e-6;

fn marginal_tagger() -> Tagger<&'static Model> {
    let mut tagger = MODEL.create_tagger();
    tagger.set_marginal(true);
    tagger
}

fn covering_prob(lattice: &Lattice, pos: usize) -> f64 {
    lattice
        .nodes()
        .filter(|n| !n.is_sentinel() && n.begin() <= pos && pos < n.end())
        .map(|n| n.prob())
        .sum()
}

#[test]
fn probabilities_sum_to_one() {
    let mut tagger = marginal_tagger();
    for theta in [0.75, 0.01, 0.001] {
        tagger.set_theta(theta);
        for text in ["東京都に行く", "東京タワー", "京都 東京"] {
            let lattice = assert_ok!(tagger.parse_to_nodes(text));
            assert!(lattice.z().is_finite());
            for (pos, _) in text.char_indices() {
                let p = covering_prob(lattice, pos);
                assert!((p - 1.0).abs() < EPS, "{} at {}: {}", text, pos, p);
            }
            let bos = lattice.bos_node().unwrap();
            let eos = lattice.eos_node().unwrap();
            assert!((bos.prob() - 1.0).abs() < EPS);
            assert!((eos.prob() - 1.0).abs() < EPS);
        }
    }
}

#[test]
fn node_probability_is_sum_of_incoming_paths() {
    let mut tagger = marginal_tagger();
    tagger.set_theta(0.01);
    let lattice = assert_ok!(tagger.parse_to_nodes("東京都に行く"));
    for node in lattice.nodes() {
        if node.stat() == NodeStat::Bos {
            continue;
        }
        let incoming: f64 = lattice.lpaths(node.id()).iter().map(|p| p.prob).sum();
        assert!((incoming - node.prob()).abs() < EPS, "{:?}", node);
    }
}

#[test]
fn ambiguity_with_small_theta() {
    let mut tagger = marginal_tagger();
    tagger.set_theta(0.001);
    let lattice = assert_ok!(tagger.parse_to_nodes("東京都"));
    let east = lattice.begin_nodes(0).find(|n| n.surface() == "東").unwrap();
    let tokyo = lattice.begin_nodes(0).find(|n| n.surface() == "東京").unwrap();
    assert!(east.prob() > 0.0 && east.prob() < 1.0);
    assert!(tokyo.prob() > 0.0 && tokyo.prob() < 1.0);
    // 東+京都 is cheaper than 東京+都
    assert!(east.prob() > tokyo.prob());
}

#[test]
fn best_path_is_unchanged() {
    let mut plain = MODEL.create_tagger();
    let expected = assert_ok!(plain.parse("東京都に行く"));
    let mut tagger = marginal_tagger();
    assert_eq!(assert_ok!(tagger.parse("東京都に行く")), expected);
}

#[test]
fn without_marginal_request() {
    let mut tagger = MODEL.create_tagger();
    let lattice = assert_ok!(tagger.parse_to_nodes("東京"));
    assert!(lattice.paths().is_empty());
    assert!(lattice.nodes().all(|n| n.prob() == 0.0));
}

#[test]
fn probability_format() {
    let model = TEST_DIC.model("-m -t 0.01 -F %m\\t%pP\\n");
    assert!(model.config().request_type.contains(RequestType::MARGINAL_PROB));
    let mut tagger = model.create_tagger();
    let out = assert_ok!(tagger.parse("東京都"));
    let mut lines = out.lines();
    let first = lines.next().unwrap();
    let (surface, prob) = first.split_once('\t').unwrap();
    assert_eq!(surface, "東");
    let prob: f64 = prob.parse().unwrap();
    assert!(prob > 0.5 && prob < 1.0);
    // six decimals
    assert_eq!(first.len(), "東\t0.000000".len());
}
