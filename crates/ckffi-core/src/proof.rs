//! Parsed output of a proving call.
//!
//! The native library returns `{ "proof": <object>, "publicSignals": [..] }`.
//! The proof is kept as free-form JSON; this layer never checks it beyond
//! "valid JSON produced by the native library". [`ProofResult::groth16`] gives
//! an optional typed view for callers that know they asked for a Groth16 proof.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// Proof plus ordered public signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofResult {
    /// Backend-defined proof object.
    pub proof: Value,
    /// Field elements as decimal strings, in circuit order.
    #[serde(rename = "publicSignals", alias = "public_signals")]
    pub public_signals: Vec<String>,
}

/// snarkjs-style Groth16 proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groth16Proof {
    /// A point in G1.
    pub pi_a: Vec<String>,
    /// A point in G2.
    pub pi_b: Vec<Vec<String>>,
    /// A point in G1.
    pub pi_c: Vec<String>,
    /// Usually `groth16`.
    pub protocol: String,
    /// e.g. `bn128`; absent in older outputs.
    #[serde(default)]
    pub curve: String,
}

impl ProofResult {
    /// Parse the text returned across the FFI boundary.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Interpret the proof as a Groth16 proof.
    pub fn groth16(&self) -> Result<Groth16Proof> {
        Ok(Groth16Proof::deserialize(&self.proof)?)
    }

    /// JSON-shape equality: same keys and value kinds, values ignored.
    ///
    /// Two backends driving the same native prover are not guaranteed to agree
    /// bit for bit, but their outputs must have the same shape.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.public_signals.len() == other.public_signals.len()
            && shape_eq(&self.proof, &other.proof)
    }
}

fn shape_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| shape_eq(v, w)))
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(v, w)| shape_eq(v, w))
        }
        (Value::String(_), Value::String(_))
        | (Value::Number(_), Value::Number(_))
        | (Value::Bool(_), Value::Bool(_))
        | (Value::Null, Value::Null) => true,
        _ => false,
    }
}
