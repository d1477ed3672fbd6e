use wthing_common::{
    ThingString, Topic, Visibility,
    json::{JsonWriter, Scalar},
};

use crate::{Error, Property, Result};

const CONTEXT: &str = "https://webthings.io/schemas";

/// A device and the properties it exposes.
#[derive(Debug)]
pub struct Thing {
    id: ThingString,
    title: ThingString,
    href: ThingString,
    at_types: Vec<ThingString>,
    properties: Vec<Property>,
}

impl Thing {
    pub fn new(id: impl Into<ThingString>, title: impl Into<ThingString>) -> Self {
        let id = id.into();
        let href = ThingString::const_new("/things/") + id.as_str();

        Self { id, title: title.into(), href, at_types: Vec::new(), properties: Vec::new() }
    }

    pub fn id(&self) -> &ThingString {
        &self.id
    }

    pub fn title(&self) -> &ThingString {
        &self.title
    }

    pub fn href(&self) -> &ThingString {
        &self.href
    }

    pub fn add_at_type(&mut self, at_type: impl Into<ThingString>) {
        self.at_types.push(at_type.into());
    }

    /// Appends a property. Output keeps the order properties were added in.
    pub fn add_property(&mut self, property: Property) -> &mut Property {
        if self.property(property.id()).is_some() {
            tracing::warn!(thing = %self.id, property = %property.id(), "duplicate property id");
        }

        self.properties.push(property);
        let last = self.properties.len() - 1;
        &mut self.properties[last]
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, id: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.id() == id)
    }

    pub fn property_mut(&mut self, id: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.id() == id)
    }

    /// Writes the Thing Description, listing the properties visible on web things.
    pub fn to_json_structure(&self, json: &mut dyn JsonWriter) {
        json.begin_object(None);
        json.property("id", Scalar::Str(&self.id));
        json.property("title", Scalar::Str(&self.title));
        json.property("@context", Scalar::Str(CONTEXT));

        if !self.at_types.is_empty() {
            json.begin_array("@type");
            for at_type in &self.at_types {
                json.string(at_type);
            }
            json.end_array();
        }

        json.begin_object(Some("properties"));
        for property in self
            .properties
            .iter()
            .filter(|p| p.is_visible(Visibility::WebthingOnly))
        {
            property.to_json_structure(json, &self.href);
        }
        json.end_object();

        json.property("href", Scalar::Str(&self.href));
        json.end_object();
    }

    /// Writes one object with the current value of every property visible on `channel`.
    pub fn to_json_values(&mut self, json: &mut dyn JsonWriter, channel: Visibility) {
        json.begin_object(None);
        for property in self.properties.iter_mut().filter(|p| p.is_visible(channel)) {
            property.to_json_value(json);
        }
        json.end_object();
    }

    /// State messages for every property that is visible on MQTT and has a value
    /// once its value request has run.
    ///
    /// Payloads are the JSON text of the value.
    pub fn mqtt_messages(&mut self) -> Result<Vec<(Topic, String)>> {
        let mut messages = Vec::new();

        for property in self
            .properties
            .iter_mut()
            .filter(|p| p.is_visible(Visibility::MqttOnly))
        {
            property.request_value();
            let Some(value) = property.value() else {
                continue;
            };

            let payload = serde_json::to_string(value)?;
            let topic = Topic::Property { thing: self.id.clone(), property: property.id().clone() };
            messages.push((topic, payload));
        }

        Ok(messages)
    }

    /// Parses `topic` and passes it on to [`handle_message`](Self::handle_message).
    pub fn handle_raw(&mut self, topic: &str, payload: &str) -> Result<bool> {
        let topic = topic.parse::<Topic>().map_err(Error::BadTopic)?;
        self.handle_message(&topic, payload)
    }

    /// Applies an incoming command.
    ///
    /// A `Set` payload is plain text, converted like [`Property::parse`]. A
    /// `Properties` payload is a JSON object of property values, applied in payload
    /// order; unknown and read-only entries in it are skipped. Returns whether any property took a
    /// value.
    pub fn handle_message(&mut self, topic: &Topic, payload: &str) -> Result<bool> {
        let thing = self.id.clone();
        if topic.thing() != &thing {
            return Err(Error::UnknownThing(topic.thing().clone()));
        }

        match topic {
            Topic::Set { property, .. } => {
                let prop = self
                    .visible_mqtt_property(property)
                    .ok_or_else(|| Error::UnknownProperty(property.clone()))?;

                if prop.is_read_only() {
                    return Err(Error::ReadOnly(property.clone()));
                }

                tracing::debug!(%thing, %property, payload, "setting property");
                Ok(prop.parse(payload))
            }
            Topic::Properties { .. } => {
                let values: serde_json::Map<String, serde_json::Value> =
                    serde_json::from_str(payload)?;

                let mut applied = false;
                for (key, value) in &values {
                    let Some(prop) = self.visible_mqtt_property(key) else {
                        tracing::warn!(%thing, property = %key, "unknown property in payload");
                        continue;
                    };

                    if prop.set_from_json(value) {
                        applied = true;
                    } else {
                        tracing::warn!(%thing, property = %key, "property is read-only");
                    }
                }

                Ok(applied)
            }
            Topic::Property { .. } => Err(Error::BadTopic("state topics cannot be written")),
        }
    }

    fn visible_mqtt_property(&mut self, id: &str) -> Option<&mut Property> {
        self.property_mut(id)
            .filter(|p| p.is_visible(Visibility::MqttOnly))
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use wthing_common::{PropertyType, json::JsonBuffer};

    use super::*;

    fn thermostat() -> Thing {
        let mut thing = Thing::new("thermostat", "Thermostat");
        thing.add_at_type("Thermostat");

        let temperature = thing.add_property(Property::new(
            "temperature",
            "Temperature",
            "",
            PropertyType::Double,
        ));
        temperature.set_read_only(true);
        temperature.set_unit("°C");

        let target = thing.add_property(Property::new("target", "Target", "", PropertyType::Double));
        target.set_multiple_of(0.5);

        let mode = thing.add_property(Property::new("mode", "Mode", "", PropertyType::String));
        mode.add_enum_string("off");
        mode.add_enum_string("heat");
        mode.set_visibility(Visibility::MqttOnly);

        let debug = thing.add_property(Property::new("debug", "", "", PropertyType::Boolean));
        debug.set_visibility(Visibility::None);

        thing
    }

    #[test]
    fn thing_description() {
        let thing = thermostat();
        let mut json = JsonBuffer::new();
        thing.to_json_structure(&mut json);

        assert_eq!(
            json.as_str(),
            concat!(
                r#"{"id":"thermostat","title":"Thermostat","@context":"https://webthings.io/schemas","#,
                r#""@type":["Thermostat"],"properties":{"#,
                r#""temperature":{"title":"Temperature","type":"number","readOnly":true,"unit":"°C","#,
                r#""href":"/things/thermostat/properties/temperature"},"#,
                r#""target":{"title":"Target","type":"number","multipleOf":0.5,"#,
                r#""href":"/things/thermostat/properties/target"}},"#,
                r#""href":"/things/thermostat"}"#,
            )
        );
    }

    #[test]
    fn values_per_channel() {
        let mut thing = thermostat();
        thing.property_mut("temperature").unwrap().set_double(21.5);
        thing.property_mut("mode").unwrap().set_string("heat");

        let mut json = JsonBuffer::new();
        thing.to_json_values(&mut json, Visibility::MqttOnly);
        assert_eq!(json.as_str(), r#"{"temperature":21.5,"target":0.0,"mode":"heat"}"#);

        let mut json = JsonBuffer::new();
        thing.to_json_values(&mut json, Visibility::WebthingOnly);
        assert_eq!(json.as_str(), r#"{"temperature":21.5,"target":0.0}"#);
    }

    #[test]
    fn mqtt_messages_skip_null_and_hidden() {
        let mut thing = thermostat();
        thing.property_mut("temperature").unwrap().set_double(19.0);
        thing.property_mut("mode").unwrap().set_string("off");
        thing.property_mut("debug").unwrap().set_boolean(true);

        let messages = thing
            .mqtt_messages()
            .unwrap()
            .into_iter()
            .map(|(topic, payload)| (topic.to_string(), payload))
            .collect::<Vec<_>>();

        assert_eq!(messages, [
            ("things/thermostat/properties/temperature".to_string(), "19.0".to_string()),
            ("things/thermostat/properties/mode".to_string(), r#""off""#.to_string()),
        ]);
    }

    #[test]
    fn mqtt_messages_fill_lazy_properties() {
        let mut thing = Thing::new("sensor", "Sensor");
        thing
            .add_property(Property::new("temperature", "", "", PropertyType::Double))
            .set_on_value_request(|p| p.set_double(21.5));
        thing
            .add_property(Property::new("humidity", "", "", PropertyType::Double))
            .set_on_value_request(|_| {});

        let messages = thing.mqtt_messages().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0.to_string(), "things/sensor/properties/temperature");
        assert_eq!(messages[0].1, "21.5");
    }

    #[test]
    fn set_commands() {
        let mut thing = thermostat();

        assert!(thing.handle_raw("things/thermostat/properties/target/set", "22.5").unwrap());
        assert_eq!(thing.property_mut("target").unwrap().get_double(), 22.5);

        assert!(matches!(
            thing.handle_raw("things/thermostat/properties/temperature/set", "30"),
            Err(Error::ReadOnly(_))
        ));
        assert!(matches!(
            thing.handle_raw("things/thermostat/properties/debug/set", "true"),
            Err(Error::UnknownProperty(_))
        ));
        assert!(matches!(
            thing.handle_raw("things/thermostat/properties/nope/set", "1"),
            Err(Error::UnknownProperty(_))
        ));
        assert!(matches!(
            thing.handle_raw("things/lamp/properties/on/set", "true"),
            Err(Error::UnknownThing(_))
        ));
        assert!(matches!(
            thing.handle_raw("things/thermostat/properties/target", "1"),
            Err(Error::BadTopic(_))
        ));
        assert!(matches!(thing.handle_raw("nonsense", "1"), Err(Error::BadTopic(_))));
    }

    #[test]
    fn bulk_updates() {
        let mut thing = thermostat();

        let applied = thing
            .handle_raw(
                "things/thermostat/properties",
                r#"{"target": 20, "mode": "heat", "temperature": 99, "nope": 1}"#,
            )
            .unwrap();
        assert!(applied);
        assert_eq!(thing.property_mut("target").unwrap().get_double(), 20.0);
        assert_eq!(thing.property_mut("mode").unwrap().get_string(), "heat");
        assert!(thing.property("temperature").unwrap().is_null());

        assert!(
            !thing
                .handle_raw("things/thermostat/properties", r#"{"temperature": 1}"#)
                .unwrap()
        );
        assert!(matches!(
            thing.handle_raw("things/thermostat/properties", "[1, 2]"),
            Err(Error::SerdeJson(_))
        ));
    }

    #[test]
    fn bulk_updates_keep_payload_order() {
        let mut thing = thermostat();
        let order = Rc::new(RefCell::new(Vec::new()));
        for id in ["target", "mode"] {
            let order = order.clone();
            thing
                .property_mut(id)
                .unwrap()
                .set_on_change(move |p| order.borrow_mut().push(p.id().to_string()));
        }

        thing
            .handle_raw("things/thermostat/properties", r#"{"target": 19, "mode": "off"}"#)
            .unwrap();
        assert_eq!(*order.borrow(), ["target", "mode"]);
    }
}
