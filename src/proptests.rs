//! Model-based property tests for the engine.
//!
//! A reference model mirrors the promotion policy exactly: the ladder is a
//! `VecDeque` of slots bottom..top where `None` marks a free slot, and the
//! map mirrors occupied entries. After every operation the real engine is
//! structurally validated and compared against the model.

use std::collections::{HashMap, VecDeque};

use proptest::prelude::*;

use crate::engine::CacheEngine;
use crate::error::CacheError;

struct Model {
    ladder: VecDeque<Option<String>>,
    map: HashMap<String, u32>,
}

impl Model {
    fn new(capacity: usize) -> Self {
        Self {
            ladder: (0..capacity).map(|_| None).collect(),
            map: HashMap::new(),
        }
    }

    fn one_up(&mut self, key: &str) {
        let pos = self
            .ladder
            .iter()
            .position(|s| s.as_deref() == Some(key))
            .expect("occupied key must sit in the model ladder");
        if pos + 1 < self.ladder.len() {
            self.ladder.swap(pos, pos + 1);
        }
    }

    fn update(&mut self, key: &str, value: u32) {
        if self.map.contains_key(key) {
            self.one_up(key);
            self.map.insert(key.to_owned(), value);
            return;
        }
        let bottom = self.ladder.pop_front().expect("model ladder non-empty");
        if let Some(stale) = bottom {
            self.map.remove(&stale);
        }
        self.ladder.push_back(Some(key.to_owned()));
        self.map.insert(key.to_owned(), value);
    }

    fn resolve(&mut self, key: &str) -> Option<u32> {
        let value = self.map.get(key).copied();
        if value.is_some() {
            self.one_up(key);
        }
        value
    }
}

#[derive(Clone, Debug)]
enum Op {
    Update(u8, u8),
    Resolve(u8),
}

fn key_name(k: u8) -> String {
    format!("host{k}.test.example")
}

fn raw_addr(v: u8) -> u32 {
    0x0a00_0000 | u32::from(v)
}

fn ops() -> impl Strategy<Value = (usize, Vec<Op>)> {
    let op = prop_oneof![
        3 => (0u8..12, any::<u8>()).prop_map(|(k, v)| Op::Update(k, v)),
        2 => (0u8..12).prop_map(Op::Resolve),
    ];
    (3usize..=8, prop::collection::vec(op, 0..=400))
}

proptest! {
    #[test]
    fn engine_matches_reference_model((capacity, ops) in ops()) {
        let mut engine = CacheEngine::new(capacity).unwrap();
        let mut model = Model::new(capacity);

        for op in ops {
            match op {
                Op::Update(k, v) => {
                    let key = key_name(k);
                    engine.insert(&key, raw_addr(v)).unwrap();
                    model.update(&key, raw_addr(v));
                }
                Op::Resolve(k) => {
                    let key = key_name(k);
                    let got = match engine.lookup(&key) {
                        Ok(v) => Some(v),
                        Err(CacheError::NotFound) => None,
                        Err(err) => panic!("lookup failed: {err}"),
                    };
                    prop_assert_eq!(got, model.resolve(&key));
                }
            }
            engine.validate();
            prop_assert_eq!(engine.len(), model.map.len());
            prop_assert!(engine.len() <= capacity);
        }

        // Every surviving key still resolves to the model's value.
        for (key, value) in &model.map {
            prop_assert_eq!(engine.lookup(key), Ok(*value));
        }
    }
}
