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

use std::path::PathBuf;

use claim::{assert_matches, assert_ok};

use crate::dic::build::error::BuildFailure;
use crate::dic::build::DictBuilder;
use crate::dic::header::{DictionaryType, Header, HeaderError};
use crate::dic::lexicon::Lexicon;
use crate::dic::lexicon_set::LexiconSet;
use crate::dic::word_id::WordId;
use crate::error::{DictionaryLoadError, KeitaisoError};

const MATRIX: &[u8] = b"3 3\n0 0 0\n0 1 10\n1 0 -5\n2 2 7\n";
const LEXICON: &[u8] = "\
京都,1,1,100,名詞,固有名詞,地名
京,2,2,300,名詞,一般
都,2,2,200,名詞,一般
京都,2,1,150,名詞,普通
東,1,2,50,名詞,方角
".as_bytes();

fn build(dic_type: DictionaryType, lexicon: &[u8]) -> Vec<u8> {
    let mut bldr = DictBuilder::new_system();
    bldr.set_type(dic_type);
    bldr.read_conn(MATRIX).unwrap();
    bldr.read_lexicon(lexicon).unwrap();
    let mut built = Vec::new();
    bldr.compile(&mut built).unwrap();
    built
}

fn load(data: Vec<u8>) -> Result<Lexicon, DictionaryLoadError> {
    Lexicon::from_storage(data.into(), PathBuf::from("test.dic"))
}

#[test]
fn lookup_prefixes_and_homographs() {
    let lex = load(build(DictionaryType::System, LEXICON)).unwrap();
    assert_eq!(lex.size(), 5);
    let found: Vec<_> = lex.lookup("京都府".as_bytes(), 0).collect();
    assert_eq!(found.len(), 3);
    assert_eq!(found[0].end, 3);
    assert_eq!(found[1].end, 6);
    assert_eq!(found[2].end, 6);

    let features: Vec<_> = found
        .iter()
        .map(|e| {
            let t = lex.token(e.word_id.word()).unwrap();
            (t.cost, lex.feature(&t).to_owned())
        })
        .collect();
    assert_eq!(features[0], (300, "名詞,一般".to_owned()));
    // homographs keep csv order
    assert_eq!(features[1], (100, "名詞,固有名詞,地名".to_owned()));
    assert_eq!(features[2], (150, "名詞,普通".to_owned()));
}

#[test]
fn lookup_at_offset() {
    let lex = load(build(DictionaryType::System, LEXICON)).unwrap();
    let found: Vec<_> = lex.lookup("東京都".as_bytes(), 3).collect();
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|e| e.end > 3));
    assert_eq!(lex.lookup("府".as_bytes(), 0).count(), 0);
}

#[test]
fn header_fields() {
    let lex = load(build(DictionaryType::User, LEXICON)).unwrap();
    let info = lex.info();
    assert_eq!(info.size, 5);
    assert_eq!(info.lsize, 3);
    assert_eq!(info.rsize, 3);
    assert_eq!(info.charset, "utf-8");
    assert_eq!(info.dic_type, DictionaryType::User);
    assert_eq!(info.version, 102);
}

#[test]
fn truncated_file_is_rejected() {
    let mut data = build(DictionaryType::System, LEXICON);
    data.pop();
    assert_matches!(
        load(data),
        Err(DictionaryLoadError::InvalidHeader(_, HeaderError::InvalidMagic { .. }))
    );
}

/// Rewrites the magic number so it matches the buffer length
fn reseal(data: &mut [u8]) {
    let magic = (data.len() as u32) ^ Header::MAGIC_ID;
    data[..4].copy_from_slice(&magic.to_le_bytes());
}

#[test]
fn body_sizes_must_match_file() {
    let mut header = Header::new(DictionaryType::System);
    header.fsize = 100;
    let mut data = Vec::new();
    header.write_to(&mut data).unwrap();
    reseal(&mut data);
    assert_matches!(load(data), Err(DictionaryLoadError::Truncated(..)));

    let mut data = build(DictionaryType::System, LEXICON);
    data.extend_from_slice(b"trailing");
    reseal(&mut data);
    assert_matches!(load(data), Err(DictionaryLoadError::Truncated(..)));
}

#[test]
fn wrong_version_is_rejected() {
    let mut data = build(DictionaryType::System, LEXICON);
    data[4] = 101;
    assert_matches!(
        load(data),
        Err(DictionaryLoadError::InvalidHeader(_, HeaderError::InvalidVersion(101)))
    );
}

#[test]
fn too_short_file_is_rejected() {
    assert_matches!(
        load(vec![1, 2, 3]),
        Err(DictionaryLoadError::InvalidHeader(_, HeaderError::CannotParse))
    );
}

#[test]
fn context_ids_checked_against_matrix() {
    let lex = load(build(DictionaryType::System, LEXICON)).unwrap();
    assert_ok!(lex.check_context_ids(3, 3));
    assert_matches!(
        lex.check_context_ids(4, 3),
        Err(DictionaryLoadError::IncompatibleMatrix { matrix_left: 4, dic_left: 3, .. })
    );
}

#[test]
fn lexicon_set_order_and_types() {
    let sys = load(build(DictionaryType::System, LEXICON)).unwrap();
    let user = load(build(DictionaryType::User, "京,0,0,1,ユーザ\n".as_bytes())).unwrap();

    let mut set = LexiconSet::new(sys).unwrap();
    set.append(user).unwrap();
    assert_eq!(set.len(), 2);

    let found: Vec<_> = set.lookup("京".as_bytes(), 0).collect();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].word_id, WordId::new(1, 0));
    assert!(found[1].word_id.is_system());
    let (token, feature) = set.entry(found[0].word_id).unwrap();
    assert_eq!(token.cost, 1);
    assert_eq!(feature, "ユーザ");

    let infos = set.infos();
    assert_eq!(infos[0].dic_type, DictionaryType::System);
    assert_eq!(infos[1].dic_type, DictionaryType::User);
}

#[test]
fn user_dictionary_in_system_slot() {
    let user = load(build(DictionaryType::User, LEXICON)).unwrap();
    assert_matches!(
        LexiconSet::new(user),
        Err(DictionaryLoadError::InvalidDictionaryType { expected: "system", actual: "user", .. })
    );
}

#[test]
fn compile_without_matrix() {
    let mut bldr = DictBuilder::new_user();
    bldr.read_lexicon(LEXICON).unwrap();
    let mut built = Vec::new();
    assert_matches!(
        bldr.compile(&mut built),
        Err(KeitaisoError::DictionaryCompilationError(e))
            if matches!(e.cause, BuildFailure::MissingMatrix)
    );
}

#[test]
fn user_dictionary_with_matrix_size() {
    let mut bldr = DictBuilder::new_user();
    bldr.set_matrix_size(3, 3);
    bldr.read_lexicon(LEXICON).unwrap();
    let mut built = Vec::new();
    assert_ok!(bldr.compile(&mut built));
    let lex = load(built).unwrap();
    assert_eq!(lex.header().dic_type, DictionaryType::User);
    assert!(!bldr.report().is_empty());
}

#[test]
fn empty_lexicon_compiles() {
    let data = build(DictionaryType::System, b"");
    let lex = load(data).unwrap();
    assert_eq!(lex.size(), 0);
    assert_eq!(lex.lookup(b"abc", 0).count(), 0);
}

#[test]
fn matrix_is_written() {
    let mut bldr = DictBuilder::new_system();
    bldr.read_conn(MATRIX).unwrap();
    let mut out = Vec::new();
    let size = bldr.write_matrix(&mut out).unwrap();
    assert_eq!(size, 4 + 3 * 3 * 2);
    assert_eq!(out.len(), size);
}
