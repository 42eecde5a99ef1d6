//! Callback argument values.
//!
//! Publishers pass positional and keyword arguments; subscribers can bind
//! extra ones at registration time. Arguments are plain data so that two
//! registrations can be compared structurally.

use indexmap::IndexMap;
use std::fmt;

/// A single callback argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// (width, height) pairs, used by "configure"
    Size(usize, usize),
}

impl Arg {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Arg::Float(v) => Some(*v),
            Arg::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Arg::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Bool(b) => write!(f, "{}", b),
            Arg::Int(v) => write!(f, "{}", v),
            Arg::Float(v) => write!(f, "{}", v),
            Arg::Str(s) => write!(f, "{:?}", s),
            Arg::Size(w, h) => write!(f, "{}x{}", w, h),
        }
    }
}

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Arg::Bool(v)
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Int(v)
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Arg::Int(v as i64)
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Float(v)
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Str(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Str(v)
    }
}

/// Keyword arguments keep insertion order so logs read predictably.
pub type KwArgs = IndexMap<String, Arg>;

/// Arguments as seen by a handler: call-site args followed by bound args,
/// call-site kwargs overlaid with bound kwargs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallbackArgs {
    pub args: Vec<Arg>,
    pub kwargs: KwArgs,
}

impl CallbackArgs {
    pub fn new(args: Vec<Arg>) -> Self {
        Self {
            args,
            kwargs: KwArgs::new(),
        }
    }

    /// Merge call-site arguments with a subscription's bound ones.
    ///
    /// Bound args extend the positional list; bound kwargs win on conflict.
    pub(crate) fn merged(call: &CallbackArgs, bound_args: &[Arg], bound_kwargs: &KwArgs) -> Self {
        let mut args = Vec::with_capacity(call.args.len() + bound_args.len());
        args.extend_from_slice(&call.args);
        args.extend_from_slice(bound_args);

        let mut kwargs = call.kwargs.clone();
        for (k, v) in bound_kwargs {
            kwargs.insert(k.clone(), v.clone());
        }
        Self { args, kwargs }
    }

    pub fn get(&self, idx: usize) -> Option<&Arg> {
        self.args.get(idx)
    }

    pub fn float(&self, idx: usize) -> Option<f64> {
        self.args.get(idx).and_then(Arg::as_f64)
    }

    pub fn str(&self, idx: usize) -> Option<&str> {
        self.args.get(idx).and_then(Arg::as_str)
    }

    pub fn kwarg(&self, name: &str) -> Option<&Arg> {
        self.kwargs.get(name)
    }

    pub fn with_kwarg(mut self, name: &str, value: impl Into<Arg>) -> Self {
        self.kwargs.insert(name.to_string(), value.into());
        self
    }
}

impl From<Vec<Arg>> for CallbackArgs {
    fn from(args: Vec<Arg>) -> Self {
        Self::new(args)
    }
}
