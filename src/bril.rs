//! JSON-level Bril program model.
//!
//! Mirrors the wire format: a program is a list of functions, and a
//! function's `instrs` array interleaves label markers with instruction
//! objects. Unknown fields ride along in flattened `extra` maps so the
//! pipeline can round-trip IR extensions it does not interpret.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Ops that end a basic block.
pub const TERMINATORS: [&str; 3] = ["jmp", "br", "ret"];

/// Ops that are observable even when their result is unused.
pub const SIDE_EFFECT_OPS: [&str; 5] = ["call", "print", "store", "free", "alloc"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<FuncArg>,
    #[serde(default)]
    pub instrs: Vec<Code>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncArg {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One element of a function's `instrs` array.
///
/// An object with an `op` key is an instruction; otherwise an object with a
/// `label` key is a label marker. Anything else is malformed.
#[derive(Debug, Clone, PartialEq)]
pub enum Code {
    Label(Label),
    Instr(Instruction),
}

impl Code {
    pub fn as_instr(&self) -> Option<&Instruction> {
        match self {
            Code::Instr(inst) => Some(inst),
            Code::Label(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub label: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        TERMINATORS.contains(&self.op.as_str())
    }

    pub fn has_side_effect(&self) -> bool {
        SIDE_EFFECT_OPS.contains(&self.op.as_str())
    }

    /// The argument list, empty when the `args` field is absent.
    pub fn args(&self) -> &[String] {
        self.args.as_deref().unwrap_or_default()
    }

    /// Branch targets, empty when the `labels` field is absent.
    pub fn labels(&self) -> &[String] {
        self.labels.as_deref().unwrap_or_default()
    }
}

impl Serialize for Code {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Code::Label(label) => label.serialize(serializer),
            Code::Instr(inst) => inst.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Code {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let obj = value
            .as_object()
            .ok_or_else(|| D::Error::custom("instruction is not a JSON object"))?;
        if obj.contains_key("op") {
            serde_json::from_value(value)
                .map(Code::Instr)
                .map_err(D::Error::custom)
        } else if obj.contains_key("label") {
            serde_json::from_value(value)
                .map(Code::Label)
                .map_err(D::Error::custom)
        } else {
            Err(D::Error::custom(
                "instruction object has neither an `op` nor a `label`",
            ))
        }
    }
}
