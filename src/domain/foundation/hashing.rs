//! SHA-256 content-addressing helpers.
//!
//! Every immutable artifact in the pipeline is identified, in part, by a
//! hex-encoded SHA-256 digest over some canonical serialization (the raw
//! generated text, a canonicalized JSON input, a block tree). Centralizing
//! the digest call here keeps that convention consistent across C1–C7.

use sha2::{Digest, Sha256};

/// Hex-encodes the SHA-256 digest of raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

/// Hex-encodes the SHA-256 digest of a UTF-8 string.
pub fn sha256_hex_str(text: &str) -> String {
    sha256_hex(text.as_bytes())
}

/// Hashes the canonical (key-sorted) JSON serialization of any `Serialize`
/// value, so that two logically-equal values with differently-ordered map
/// keys hash identically.
pub fn sha256_hex_canonical_json<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let canonical = serde_json::to_value(value)?;
    let sorted = canonicalize(canonical);
    let bytes = serde_json::to_vec(&sorted)?;
    Ok(sha256_hex(&bytes))
}

/// Recursively sorts object keys so serialization is order-independent.
fn canonicalize(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut sorted: std::collections::BTreeMap<String, serde_json::Value> =
                std::collections::BTreeMap::new();
            for (k, v) in map {
                sorted.insert(k, canonicalize(v));
            }
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k, v);
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(canonicalize).collect())
        }
        other => other,
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(s, "{:02x}", byte).expect("writing to a String never fails");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sha256_hex_is_stable_for_same_input() {
        assert_eq!(sha256_hex_str("hello"), sha256_hex_str("hello"));
    }

    #[test]
    fn sha256_hex_differs_for_different_input() {
        assert_ne!(sha256_hex_str("hello"), sha256_hex_str("world"));
    }

    #[test]
    fn sha256_hex_matches_known_vector() {
        assert_eq!(
            sha256_hex_str("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn canonical_json_hash_is_order_independent() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(
            sha256_hex_canonical_json(&a).unwrap(),
            sha256_hex_canonical_json(&b).unwrap()
        );
    }

    #[test]
    fn canonical_json_hash_differs_for_different_values() {
        let a = json!({"a": 1});
        let b = json!({"a": 2});
        assert_ne!(
            sha256_hex_canonical_json(&a).unwrap(),
            sha256_hex_canonical_json(&b).unwrap()
        );
    }
}

#[cfg(test)]
mod laws {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{Map, Value};

    fn permute<T: Clone>(items: &[T], mut order: usize) -> Vec<T> {
        let mut pool: Vec<T> = items.to_vec();
        let mut out = Vec::with_capacity(pool.len());
        for len in (1..=pool.len()).rev() {
            let idx = order % len;
            order /= len;
            out.push(pool.remove(idx));
        }
        out
    }

    proptest! {
        #[test]
        fn canonical_hash_is_stable_across_key_permutations(
            keys in prop::collection::vec("[a-z]{1,6}", 1..6),
            values in prop::collection::vec(any::<i64>(), 1..6),
            permutation_seed in 0usize..720,
        ) {
            let n = keys.len().min(values.len());
            let mut object = Map::new();
            for i in 0..n {
                object.insert(keys[i].clone(), Value::from(values[i]));
            }
            let base = sha256_hex_canonical_json(&Value::Object(object.clone())).unwrap();

            let shuffled_keys = permute(&object.keys().cloned().collect::<Vec<_>>(), permutation_seed);
            let mut shuffled = Map::new();
            for key in shuffled_keys {
                let value = object.get(&key).unwrap().clone();
                shuffled.insert(key, value);
            }
            let reordered = sha256_hex_canonical_json(&Value::Object(shuffled)).unwrap();

            prop_assert_eq!(base, reordered);
        }

        #[test]
        fn canonical_hash_is_deterministic_across_repeated_calls(text in ".*") {
            prop_assert_eq!(sha256_hex_canonical_json(&text).unwrap(), sha256_hex_canonical_json(&text).unwrap());
        }
    }
}
