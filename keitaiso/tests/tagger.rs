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

use std::fs;

use claim::{assert_matches, assert_ok, assert_some};
use tempfile::TempDir;

use keitaiso::error::ParseError;
use keitaiso::prelude::*;

mod common;
use common::{brute_force_min, compile_system, path_cost, surfaces, MODEL, TEST_DIC};

const SENTENCES: &[&str] = &[
    "東京都に行く",
    "東京",
    "京都に行く",
    "東京タワーに行く",
    "行く京都東京",
    "東京 京都",
    "☃☃東京!",
];

fn analyze(text: &str) -> Vec<String> {
    let mut tagger = MODEL.create_tagger();
    let lattice = assert_ok!(tagger.parse_to_nodes(text));
    surfaces(lattice)
}

#[test]
fn longer_word_wins_with_lower_cost() {
    let dir = TempDir::new().unwrap();
    compile_system(
        b"A,0,0,10,a\nB,0,0,10,b\nAB,0,0,15,ab\n",
        b"1 1\n0 0 0\n",
        &dir.path().join("sys.dic"),
    );
    fs::write(dir.path().join("matrix.def"), "1 1\n0 0 0\n").unwrap();
    fs::write(dir.path().join("keitaiso.json"), r#"{"unknownPolicy": "simple"}"#).unwrap();

    let model = assert_ok!(Model::new(&format!("-d {}", dir.path().display())));
    let mut tagger = model.create_tagger();
    let lattice = assert_ok!(tagger.parse_to_nodes("AB"));
    assert_eq!(surfaces(lattice), ["AB"]);
    assert_eq!(lattice.best_cost(), Some(15));
    let out = assert_ok!(tagger.parse("AB"));
    assert_eq!(out, "AB\tab\nEOS\n");
}

#[test]
fn best_path() {
    assert_eq!(analyze("東京都に行く"), ["東", "京都", "に", "行く"]);

    let mut tagger = MODEL.create_tagger();
    let lattice = assert_ok!(tagger.parse_to_nodes("東京都に行く"));
    assert_eq!(lattice.best_cost(), Some(4500));
    assert_eq!(path_cost(&MODEL, lattice), 4500);
}

#[test]
fn default_output_format() {
    let mut tagger = MODEL.create_tagger();
    let out = assert_ok!(tagger.parse("京都に"));
    assert_eq!(
        out,
        "京都\t名詞,固有名詞,地名,*,*,*,京都,キョウト,キョート\n\
         に\t助詞,格助詞,*,*,*,*,に,ニ,ニ\n\
         EOS\n"
    );
}

#[test]
fn best_cost_is_minimal() {
    let mut tagger = MODEL.create_tagger();
    for s in SENTENCES {
        let lattice = assert_ok!(tagger.parse_to_nodes(s));
        let best = assert_some!(lattice.best_cost());
        assert_eq!(Some(best), brute_force_min(&MODEL, lattice), "{}", s);
        assert_eq!(best, path_cost(&MODEL, lattice), "{}", s);
    }
}

#[test]
fn best_path_covers_sentence() {
    let mut tagger = MODEL.create_tagger();
    for s in SENTENCES {
        let lattice = assert_ok!(tagger.parse_to_nodes(s));
        let mut pos = 0;
        let mut last_stat = NodeStat::Bos;
        for node in lattice.best_path() {
            assert_eq!(node.begin(), pos, "{}", s);
            assert!(node.is_best());
            pos = node.end();
            last_stat = node.stat();
        }
        assert_eq!(pos, s.len());
        assert_eq!(last_stat, NodeStat::Eos);
    }
}

#[test]
fn analysis_is_deterministic() {
    let mut tagger = MODEL.create_tagger();
    for s in SENTENCES {
        let first = assert_ok!(tagger.parse(s));
        let second = assert_ok!(tagger.parse(s));
        assert_eq!(first, second);
    }
    let mut other = MODEL.create_tagger();
    assert_eq!(
        assert_ok!(other.parse("東京タワー")),
        assert_ok!(tagger.parse("東京タワー"))
    );
}

#[test]
fn unknown_words() {
    let mut tagger = MODEL.create_tagger();
    let lattice = assert_ok!(tagger.parse_to_nodes("東京タワー"));
    assert_eq!(surfaces(lattice), ["東京", "タワー"]);
    let tower = lattice.best_path().nth(1).unwrap();
    assert_eq!(tower.stat(), NodeStat::Unknown);
    assert!(tower.is_unknown());
    assert_eq!(tower.feature(), "名詞,固有名詞,*,*,*,*,*");
    assert_eq!(lattice.best_cost(), Some(5350));

    assert_eq!(analyze("東京!"), ["東京", "!"]);
    assert_eq!(analyze("☃☃東京"), ["☃☃", "東京"]);
}

#[test]
fn whitespace_is_a_node() {
    assert_eq!(analyze("東京 京都"), ["東京", " ", "京都"]);
    assert_eq!(analyze(" "), [" "]);
}

#[test]
fn user_dictionary() {
    let model = TEST_DIC.model("-u user.dic");
    let mut tagger = model.create_tagger();
    let lattice = assert_ok!(tagger.parse_to_nodes("東京都に行く"));
    assert_eq!(surfaces(lattice), ["東京都", "に", "行く"]);
    assert_eq!(lattice.best_cost(), Some(2600));

    // same cost in both dictionaries, the user entry comes first
    let lattice = assert_ok!(tagger.parse_to_nodes("京都"));
    let node = lattice.best_path().next().unwrap();
    assert!(node.word_id().is_user());
    assert!(node.feature().contains("組織"));
    let both = lattice.begin_nodes(0).filter(|n| n.surface() == "京都").count();
    assert_eq!(both, 2);
}

#[test]
fn lookup_order() {
    let model = TEST_DIC.model("-u user.dic");
    let entries = assert_ok!(model.lookup("京都に", 0));
    let found: Vec<_> = entries.iter().map(|e| e.surface).collect();
    assert_eq!(found, ["京都", "京", "京都"]);
    assert!(entries[0].word_id.is_user());
    assert!(entries[0].feature.contains("組織"));
    assert!(entries[2].word_id.is_system());
    assert_eq!(entries[1].cost, 2500);

    assert!(assert_ok!(model.lookup("京都に", 6)).len() == 1);
    assert!(model.lookup("京都に", 1).is_err());
}

#[test]
fn empty_sentence() {
    let mut tagger = MODEL.create_tagger();
    let err = tagger.parse("").unwrap_err();
    assert_eq!(err.as_parse_error(), Some(&ParseError::EmptySentence));
    assert!(tagger.what().is_some());

    let mut lattice = MODEL.create_lattice();
    lattice.set_sentence("");
    assert!(!tagger.parse_lattice(&mut lattice));
    assert!(lattice.what().is_some());

    // the tagger is still usable
    assert_ok!(tagger.parse("東京"));
    assert!(tagger.what().is_none());
}

#[test]
fn parse_lattice_in_place() {
    let tagger = MODEL.create_tagger();
    let mut lattice = MODEL.create_lattice();
    lattice.set_sentence("東京都に行く");
    assert!(tagger.parse_lattice(&mut lattice));
    assert_eq!(surfaces(&lattice), ["東", "京都", "に", "行く"]);

    lattice.set_sentence("東京");
    assert_ok!(tagger.try_parse_lattice(&mut lattice));
    assert_eq!(surfaces(&lattice), ["東京"]);
    let out = assert_ok!(tagger.format_lattice(&lattice));
    assert!(out.starts_with("東京\t"));
}

#[test]
fn all_morphs() {
    let mut tagger = MODEL.create_tagger();
    tagger.set_all_morphs(true);
    assert!(tagger.all_morphs());
    let out = assert_ok!(tagger.parse("東京"));
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines.len(), 4);
    let mut words: Vec<_> = lines[..3].iter().map(|l| l.split('\t').next().unwrap()).collect();
    // 京 begins after both words at 0
    assert_eq!(words.pop(), Some("京"));
    words.sort_unstable();
    assert_eq!(words, ["東", "東京"]);
    assert_eq!(lines[3], "EOS");
}

#[test]
fn output_formats() {
    let model = TEST_DIC.model("-O wakati");
    let mut tagger = model.create_tagger();
    assert_eq!(assert_ok!(tagger.parse("東京都に行く")), "東 京都 に 行く \n");

    let model = TEST_DIC.model("-F %m/%pw/%pC/%f[7]\\n -E [EOS]\\n -B [%S]\\n");
    let mut tagger = model.create_tagger();
    assert_eq!(
        assert_ok!(tagger.parse("東京")),
        "[東京]\n東京/1000/1100/トウキョウ\n[EOS]\n"
    );

    let model = TEST_DIC.model("-F %m\\s%s\\n -U %m\\s?\\n");
    let mut tagger = model.create_tagger();
    assert_eq!(
        assert_ok!(tagger.parse("東京タワー")),
        "東京 0\nタワー ?\nEOS\n"
    );
}

#[test]
fn invalid_output_format() {
    let err = Model::new(&TEST_DIC.args("-F %m%z")).err().unwrap();
    assert_matches!(err, KeitaisoError::ConfigError(_));
    let err = Model::new(&TEST_DIC.args("-O chasen")).err().unwrap();
    assert_matches!(err, KeitaisoError::ConfigError(_));
}

#[test]
fn unknown_feature_option() {
    let model = TEST_DIC.model("-x 未知語");
    let mut tagger = model.create_tagger();
    let lattice = assert_ok!(tagger.parse_to_nodes("東京タワー"));
    let features: Vec<_> = lattice.best_path().map(|n| n.feature().to_owned()).collect();
    assert_eq!(features[1], "未知語");
    assert!(features[0].starts_with("名詞,固有名詞"));
}

#[test]
fn legacy_tagger() {
    let mut tagger = assert_ok!(Tagger::new(&TEST_DIC.args("")));
    assert_eq!(
        assert_ok!(tagger.parse("東京")),
        assert_ok!(MODEL.create_tagger().parse("東京"))
    );
}
