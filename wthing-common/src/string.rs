use core::{
    fmt::Display,
    ops::{Add, Deref},
};

use compact_str::{CompactString, ToCompactString};
use serde::{Deserialize, Serialize};

/// Short, mostly inline string used for ids, titles and units.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThingString(CompactString);

impl ThingString {
    pub fn new(compact_string: CompactString) -> Self {
        Self(compact_string)
    }

    pub const fn const_new(s: &'static str) -> Self {
        Self(CompactString::const_new(s))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Shortens the string to at most `max` bytes, never splitting a character.
    pub fn truncate_to(&mut self, max: usize) {
        if self.0.len() <= max {
            return;
        }

        let mut end = max;
        while !self.0.is_char_boundary(end) {
            end -= 1;
        }

        self.0.truncate(end);
    }
}

impl Deref for ThingString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl<T: AsRef<str>> From<T> for ThingString {
    fn from(value: T) -> Self {
        ThingString(CompactString::from(value.as_ref()))
    }
}

impl<T: AsRef<str>> Add<T> for ThingString {
    type Output = Self;

    fn add(self, rhs: T) -> Self::Output {
        ThingString(self.0 + rhs.as_ref())
    }
}

impl<T: AsRef<str> + ?Sized> PartialEq<T> for ThingString {
    fn eq(&self, other: &T) -> bool {
        self.0.as_str() == other.as_ref()
    }
}

impl Display for ThingString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

pub trait ToThingString: ToCompactString {
    fn to_thing_string(&self) -> ThingString {
        ThingString(self.to_compact_string())
    }
}

impl<T: ToCompactString> ToThingString for T {}
