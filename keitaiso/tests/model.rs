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
use std::path::Path;
use std::sync::Arc;
use std::thread;

use claim::{assert_matches, assert_ok};
use tempfile::TempDir;

use keitaiso::config::ConfigError;
use keitaiso::dic::header::{DictionaryType, HeaderError};
use keitaiso::error::DictionaryLoadError;
use keitaiso::prelude::*;

mod common;
use common::{MODEL, TEST_DIC};

/// Copy of the test dictionary directory which can be broken by the test
fn copy_dic() -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in ["char.def", "unk.def", "matrix.def", "sys.dic", "user.dic"] {
        fs::copy(TEST_DIC.path().join(name), dir.path().join(name)).unwrap();
    }
    dir
}

fn load(dir: &Path, extra: &str) -> KeitaisoResult<Model> {
    Model::new(&format!("-d {} {}", dir.display(), extra))
}

fn load_error(dir: &Path, extra: &str) -> DictionaryLoadError {
    match load(dir, extra) {
        Err(KeitaisoError::DictionaryLoad(e)) => e,
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("model was loaded"),
    }
}

#[test]
fn dictionary_info() {
    let infos: Vec<_> = MODEL.dictionary_info().collect();
    assert_eq!(infos.len(), 1);
    let sys = infos[0];
    assert_eq!(sys.dic_type, DictionaryType::System);
    assert_eq!(sys.size, 9);
    assert_eq!((sys.lsize, sys.rsize), (3, 3));
    assert_eq!(sys.version, 102);
    assert_eq!(sys.charset, "utf-8");
    assert!(sys.filename.ends_with("sys.dic"));

    let model = TEST_DIC.model("-u user.dic");
    let infos: Vec<_> = model.dictionary_info().collect();
    assert_eq!(infos.len(), 2);
    assert_eq!(infos[1].dic_type, DictionaryType::User);
    assert_eq!(infos[1].size, 2);
    assert!(infos[1].to_string().contains("size:\t2\n"));
}

#[test]
fn features_by_word_id() {
    let entries = assert_ok!(MODEL.lookup("行く", 0));
    assert_eq!(entries.len(), 2);
    for e in entries {
        assert_eq!(MODEL.feature(e.word_id), Some(e.feature));
    }
}

#[test]
fn incompatible_matrix() {
    let dir = copy_dic();
    fs::write(dir.path().join("matrix.def"), "2 2\n0 0 0\n0 1 0\n1 0 0\n1 1 0\n").unwrap();
    assert_matches!(
        load_error(dir.path(), ""),
        DictionaryLoadError::IncompatibleMatrix { matrix_left: 2, dic_left: 3, .. }
    );
}

#[test]
fn truncated_dictionary() {
    let dir = copy_dic();
    let path = dir.path().join("sys.dic");
    let mut data = fs::read(&path).unwrap();
    data.truncate(data.len() - 4);
    fs::write(&path, data).unwrap();
    assert_matches!(
        load_error(dir.path(), ""),
        DictionaryLoadError::InvalidHeader(_, HeaderError::InvalidMagic { .. })
    );
}

#[test]
fn unsupported_version() {
    let dir = copy_dic();
    let path = dir.path().join("sys.dic");
    let mut data = fs::read(&path).unwrap();
    data[4..8].copy_from_slice(&101u32.to_le_bytes());
    fs::write(&path, data).unwrap();
    assert_matches!(
        load_error(dir.path(), ""),
        DictionaryLoadError::InvalidHeader(_, HeaderError::InvalidVersion(101))
    );
}

#[test]
fn wrong_dictionary_type() {
    let dir = copy_dic();
    fs::write(dir.path().join("keitaiso.json"), r#"{"systemDict": "user.dic"}"#).unwrap();
    assert_matches!(
        load_error(dir.path(), ""),
        DictionaryLoadError::InvalidDictionaryType { expected: "system", actual: "user", .. }
    );

    let dir = copy_dic();
    assert_matches!(
        load_error(dir.path(), "-u sys.dic"),
        DictionaryLoadError::InvalidDictionaryType { expected: "user", actual: "system", .. }
    );
}

#[test]
fn missing_files() {
    let dir = copy_dic();
    fs::remove_file(dir.path().join("sys.dic")).unwrap();
    assert_matches!(load_error(dir.path(), ""), DictionaryLoadError::NotFound(_));

    let dir = copy_dic();
    fs::remove_file(dir.path().join("unk.def")).unwrap();
    assert_matches!(load_error(dir.path(), ""), DictionaryLoadError::NotFound(_));

    let dir = copy_dic();
    assert_matches!(load_error(dir.path(), "-u missing.dic"), DictionaryLoadError::NotFound(_));
}

#[test]
fn missing_dicdir() {
    let err = Model::new("").err().unwrap();
    assert_matches!(err, KeitaisoError::ConfigError(ConfigError::MissingArgument(_)));

    let err = Model::new("-d /nonexistent/keitaiso/dic").err().unwrap();
    assert_matches!(err, KeitaisoError::ConfigError(_));
}

#[test]
fn settings_file_in_dicdir() {
    let dir = copy_dic();
    fs::write(
        dir.path().join("keitaiso.json"),
        r#"{"userDict": ["user.dic"], "eosFormat": "[EOS]\n"}"#,
    )
    .unwrap();
    let model = assert_ok!(load(dir.path(), ""));
    assert_eq!(model.dictionary_info().count(), 2);
    let mut tagger = model.create_tagger();
    assert_eq!(
        assert_ok!(tagger.parse("東京都")),
        "東京都\t名詞,固有名詞,地名,*,*,*,東京都,トウキョウト,トーキョート\n[EOS]\n"
    );

    // options win over the settings file
    let model = assert_ok!(load(dir.path(), "-E EOS\\n"));
    let mut tagger = model.create_tagger();
    assert!(assert_ok!(tagger.parse("東京都")).ends_with("\nEOS\n"));
}

#[test]
fn shared_between_threads() {
    let model = Arc::new(TEST_DIC.model(""));
    let expected = assert_ok!(MODEL.create_tagger().parse("東京都に行く"));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let model = Arc::clone(&model);
            thread::spawn(move || {
                let mut tagger = Tagger::with_model(model);
                (0..10)
                    .map(|_| tagger.parse("東京都に行く").unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    for h in handles {
        for out in h.join().unwrap() {
            assert_eq!(out, expected);
        }
    }
}
