//! Observable typed properties for web-connected devices.
//!
//! A [`Property`] is a named value cell with a fixed [`PropertyType`]. It
//! notifies observers on change and can describe itself as a Thing Description
//! schema. A [`Thing`] groups the properties of one device and routes incoming
//! MQTT-style commands to them.

use wthing_common::ThingString;

pub mod log;

mod property;
mod thing;

pub use property::*;
pub use thing::Thing;
pub use wthing_common as common;
pub use wthing_common::{
    PropertyType, Topic, Value, Visibility,
    json::{JsonBuffer, JsonWriter, Scalar},
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("serde json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("bad topic: {0}")]
    BadTopic(&'static str),
    #[error("unknown thing: {0}")]
    UnknownThing(ThingString),
    #[error("unknown property: {0}")]
    UnknownProperty(ThingString),
    #[error("property is read-only: {0}")]
    ReadOnly(ThingString),
}
