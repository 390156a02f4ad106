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

#![allow(dead_code)]

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use tempfile::TempDir;

use keitaiso::analysis::DictionaryAccess;
use keitaiso::dic::build::DictBuilder;
use keitaiso::prelude::*;

lazy_static! {
    /// System and user dictionaries compiled from tests/resources
    pub static ref TEST_DIC: TestDic = TestDic::new();
    /// Model of the system dictionary only
    pub static ref MODEL: Model = TEST_DIC.model("");
}

pub fn resource(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/resources")
        .join(name)
}

pub fn read_resource(name: &str) -> Vec<u8> {
    fs::read(resource(name)).unwrap_or_else(|e| panic!("failed to read {}: {}", name, e))
}

/// Compiles a system dictionary to `out`
pub fn compile_system(lexicon: &[u8], matrix: &[u8], out: &Path) {
    let mut builder = DictBuilder::new_system();
    builder.read_conn(matrix).expect("failed to read matrix");
    builder.read_lexicon(lexicon).expect("failed to read lexicon");
    let mut writer = BufWriter::new(fs::File::create(out).expect("failed to create dictionary"));
    builder.compile(&mut writer).expect("failed to compile dictionary");
    writer.flush().expect("failed to flush");
}

/// Compiles a user dictionary for a matrix of the given size to `out`
pub fn compile_user(lexicon: &[u8], num_left: u16, num_right: u16, out: &Path) {
    let mut builder = DictBuilder::new_user();
    builder.set_matrix_size(num_left, num_right);
    builder.read_lexicon(lexicon).expect("failed to read lexicon");
    let mut writer = BufWriter::new(fs::File::create(out).expect("failed to create dictionary"));
    builder.compile(&mut writer).expect("failed to compile dictionary");
    writer.flush().expect("failed to flush");
}

/// Dictionary directory with sys.dic, user.dic, matrix.def, char.def and unk.def
pub struct TestDic {
    dir: TempDir,
}

impl TestDic {
    pub fn new() -> TestDic {
        let dir = TempDir::new().expect("failed to create temporary directory");
        for name in ["char.def", "unk.def", "matrix.def"] {
            fs::copy(resource(name), dir.path().join(name)).expect("failed to copy resource");
        }
        compile_system(
            &read_resource("lex.csv"),
            &read_resource("matrix.def"),
            &dir.path().join("sys.dic"),
        );
        compile_user(&read_resource("user.csv"), 3, 3, &dir.path().join("user.dic"));
        TestDic { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn args(&self, extra: &str) -> String {
        format!("-d {} {}", self.path().display(), extra)
    }

    pub fn model(&self, extra: &str) -> Model {
        Model::new(&self.args(extra)).unwrap_or_else(|e| panic!("failed to load model: {}", e))
    }
}

/// Surfaces of the current path, without BOS and EOS
pub fn surfaces(lattice: &Lattice) -> Vec<String> {
    lattice
        .best_path()
        .filter(|n| !n.is_sentinel())
        .map(|n| n.surface().to_owned())
        .collect()
}

/// Cost of the current path, recomputed from word and connection costs
pub fn path_cost(model: &Model, lattice: &Lattice) -> i64 {
    let conn = model.connection();
    let mut prev_right = lattice.bos_node().expect("lattice is not analyzed").right_id();
    let mut total = 0i64;
    for node in lattice.best_path() {
        total += conn.cost(prev_right, node.left_id()) as i64 + node.word_cost() as i64;
        prev_right = node.right_id();
    }
    total
}

/// Minimal cost over all BOS to EOS paths, enumerating every path
pub fn brute_force_min(model: &Model, lattice: &Lattice) -> Option<i64> {
    fn walk(model: &Model, lattice: &Lattice, pos: usize, right_id: u16) -> Option<i64> {
        let conn = model.connection();
        if pos == lattice.len() {
            return Some(conn.cost(right_id, 0) as i64);
        }
        lattice
            .begin_nodes(pos)
            .filter_map(|n| {
                let rest = walk(model, lattice, n.end(), n.right_id())?;
                Some(conn.cost(right_id, n.left_id()) as i64 + n.word_cost() as i64 + rest)
            })
            .min()
    }
    walk(model, lattice, 0, 0)
}
