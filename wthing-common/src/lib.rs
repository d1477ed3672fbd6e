#![cfg_attr(not(test), no_std)]

extern crate alloc;

use core::{fmt::Display, str::FromStr};

pub mod json;

mod string;
mod value;
pub use string::*;
pub use value::*;

/// Addresses of property state and commands on a message bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    /// Every property of a thing, as one JSON object
    Properties { thing: ThingString },
    /// A single property value
    Property { thing: ThingString, property: ThingString },
    /// Request to change a single property
    Set { thing: ThingString, property: ThingString },
}

impl Topic {
    pub fn thing(&self) -> &ThingString {
        match self {
            Topic::Properties { thing } | Topic::Property { thing, .. } | Topic::Set { thing, .. } => {
                thing
            }
        }
    }
}

impl Display for Topic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Topic::Properties { thing } => write!(f, "things/{}/properties", thing),
            Topic::Property { thing, property } => {
                write!(f, "things/{}/properties/{}", thing, property)
            }
            Topic::Set { thing, property } => {
                write!(f, "things/{}/properties/{}/set", thing, property)
            }
        }
    }
}

impl FromStr for Topic {
    type Err = &'static str;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let mut parts = s.split('/');
        if parts.next() != Some("things") {
            return Err("does not start with things/");
        }

        match parts.next() {
            Some("") | None => Err("things/{id}"),
            Some(thing) => match parts.next() {
                Some("properties") => match parts.next() {
                    None => Ok(Topic::Properties { thing: thing.to_thing_string() }),
                    Some("") => Err("things/{id}/properties/{property}"),
                    Some(property) => match parts.next() {
                        None => Ok(Topic::Property {
                            thing: thing.to_thing_string(),
                            property: property.to_thing_string(),
                        }),
                        Some("set") if parts.next().is_none() => Ok(Topic::Set {
                            thing: thing.to_thing_string(),
                            property: property.to_thing_string(),
                        }),
                        Some(_) => Err("things/{id}/properties/{property}/set"),
                    },
                },
                Some(_) => Err("things/{id}/properties"),
                None => Err("things/{id}/properties"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_display() {
        assert_eq!(
            Topic::Properties { thing: "thermostat".into() }.to_string(),
            "things/thermostat/properties"
        );

        assert_eq!(
            Topic::Property { thing: "thermostat".into(), property: "temperature".into() }
                .to_string(),
            "things/thermostat/properties/temperature"
        );

        assert_eq!(
            Topic::Set { thing: "thermostat".into(), property: "target".into() }.to_string(),
            "things/thermostat/properties/target/set"
        );
    }

    #[test]
    fn topic_from_str() {
        assert_eq!(
            "things/thermostat/properties".parse::<Topic>().unwrap(),
            Topic::Properties { thing: "thermostat".into() }
        );

        assert_eq!(
            "things/thermostat/properties/temperature"
                .parse::<Topic>()
                .unwrap(),
            Topic::Property { thing: "thermostat".into(), property: "temperature".into() }
        );

        assert_eq!(
            "things/thermostat/properties/target/set"
                .parse::<Topic>()
                .unwrap(),
            Topic::Set { thing: "thermostat".into(), property: "target".into() }
        );

        assert_eq!(
            "things/thermostat/properties/target/set/extra".parse::<Topic>(),
            Err("things/{id}/properties/{property}/set")
        );

        assert_eq!(
            "things/thermostat/properties/target/get".parse::<Topic>(),
            Err("things/{id}/properties/{property}/set")
        );

        assert_eq!("things/thermostat/actions".parse::<Topic>(), Err("things/{id}/properties"));
        assert_eq!("things/thermostat".parse::<Topic>(), Err("things/{id}/properties"));
        assert_eq!("things".parse::<Topic>(), Err("things/{id}"));
        assert_eq!("devices/x".parse::<Topic>(), Err("does not start with things/"));
    }

    #[test]
    fn topic_thing() {
        let topic: Topic = "things/lamp/properties/on/set".parse().unwrap();
        assert_eq!(topic.thing(), "lamp");
    }
}
