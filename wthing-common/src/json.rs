//! Streaming structured-document output
//!
//! Properties describe themselves by calling a [`JsonWriter`] in a fixed order
//! instead of building a tree, so the field order of the output is exactly the
//! order of the calls. [`JsonBuffer`] is the compact text implementation.

use alloc::{string::String, vec::Vec};

use crate::Value;

/// A single scalar to be written into a document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(&'a str),
}

impl From<bool> for Scalar<'_> {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i32> for Scalar<'_> {
    fn from(value: i32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<u32> for Scalar<'_> {
    fn from(value: u32) -> Self {
        Scalar::UInt(value.into())
    }
}

impl From<u8> for Scalar<'_> {
    fn from(value: u8) -> Self {
        Scalar::UInt(value.into())
    }
}

impl From<f64> for Scalar<'_> {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl<'a> From<&'a str> for Scalar<'a> {
    fn from(value: &'a str) -> Self {
        Scalar::Str(value)
    }
}

impl<'a> From<&'a Value> for Scalar<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Boolean(v) => Scalar::Bool(*v),
            Value::Double(v) => Scalar::Float(*v),
            Value::Integer(v) => Scalar::Int((*v).into()),
            Value::Long(v) => Scalar::UInt((*v).into()),
            Value::Byte(v) => Scalar::UInt((*v).into()),
            Value::String(v) => Scalar::Str(v.as_str()),
        }
    }
}

/// Sink for structured documents.
///
/// `key` is `None` for values inside arrays and for the root object.
pub trait JsonWriter {
    fn begin_object(&mut self, key: Option<&str>);
    fn end_object(&mut self);
    fn begin_array(&mut self, key: &str);
    fn end_array(&mut self);
    fn scalar(&mut self, value: Scalar<'_>);
    fn property(&mut self, key: &str, value: Scalar<'_>);

    fn string(&mut self, value: &str) {
        self.scalar(Scalar::Str(value));
    }

    fn number(&mut self, value: f64) {
        self.scalar(Scalar::Float(value));
    }

    fn boolean(&mut self, value: bool) {
        self.scalar(Scalar::Bool(value));
    }
}

/// Compact JSON text, written as the calls come in.
#[derive(Debug, Default, Clone)]
pub struct JsonBuffer {
    out: String,
    // one entry per open container, true until its first member is written
    first: Vec<bool>,
}

impl JsonBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn separator(&mut self) {
        if let Some(first) = self.first.last_mut() {
            if !*first {
                self.out.push(',');
            }
            *first = false;
        }
    }

    fn key(&mut self, key: &str) {
        self.separator();
        self.quoted(key);
        self.out.push(':');
    }

    fn quoted(&mut self, s: &str) {
        match serde_json::to_string(s) {
            Ok(escaped) => self.out.push_str(&escaped),
            // strings always serialize
            Err(_) => self.out.push_str("\"\""),
        }
    }

    fn raw_scalar(&mut self, value: Scalar<'_>) {
        use core::fmt::Write as _;

        // fmt::Write for String never fails
        let _ = match value {
            Scalar::Bool(v) => write!(self.out, "{v}"),
            Scalar::Int(v) => write!(self.out, "{v}"),
            Scalar::UInt(v) => write!(self.out, "{v}"),
            Scalar::Float(v) => match serde_json::to_string(&v) {
                Ok(text) => write!(self.out, "{text}"),
                Err(_) => write!(self.out, "null"),
            },
            Scalar::Str(v) => {
                self.quoted(v);
                Ok(())
            }
        };
    }
}

impl JsonWriter for JsonBuffer {
    fn begin_object(&mut self, key: Option<&str>) {
        match key {
            Some(key) => self.key(key),
            None => self.separator(),
        }
        self.out.push('{');
        self.first.push(true);
    }

    fn end_object(&mut self) {
        self.first.pop();
        self.out.push('}');
    }

    fn begin_array(&mut self, key: &str) {
        self.key(key);
        self.out.push('[');
        self.first.push(true);
    }

    fn end_array(&mut self) {
        self.first.pop();
        self.out.push(']');
    }

    fn scalar(&mut self, value: Scalar<'_>) {
        self.separator();
        self.raw_scalar(value);
    }

    fn property(&mut self, key: &str, value: Scalar<'_>) {
        self.key(key);
        self.raw_scalar(value);
    }
}
