use wthing_common::json::{JsonWriter, Scalar};

use super::Property;

impl Property {
    /// Writes `"<id>": <current value>` into the enclosing object.
    ///
    /// Fires the value request first, like the typed getters.
    pub fn to_json_value(&mut self, json: &mut dyn JsonWriter) {
        let value = self.get_value();
        json.property(&self.id, Scalar::from(&value));
    }

    /// Writes the schema of this property as an object keyed by its id.
    ///
    /// Consumers snapshot this output, so the field order is fixed: title,
    /// description, type, readOnly, unit, multipleOf, enum, @type, extension
    /// fields, href. Optional fields are left out when unset.
    pub fn to_json_structure(&self, json: &mut dyn JsonWriter, device_href: &str) {
        json.begin_object(Some(&self.id));

        if !self.title.is_empty() {
            json.property("title", Scalar::Str(&self.title));
        }
        if !self.description.is_empty() {
            json.property("description", Scalar::Str(&self.description));
        }

        json.property("type", Scalar::Str(self.ty.schema_type()));

        if self.read_only {
            json.property("readOnly", Scalar::Bool(true));
        }
        if !self.unit.is_empty() {
            json.property("unit", Scalar::Str(&self.unit));
        }
        if self.multiple_of > 0.0 {
            json.property("multipleOf", Scalar::Float(self.multiple_of));
        }

        if self.has_enum() {
            json.begin_array("enum");
            for value in &self.enums {
                json.scalar(Scalar::from(value));
            }
            json.end_array();
        }

        let at_type = self.at_type();
        if !at_type.is_empty() {
            json.property("@type", Scalar::Str(at_type));
        }

        if let Some(extension) = &self.extension {
            extension.additional_parameters(json);
        }

        let href = format!("{device_href}/properties/{}", self.id);
        json.property("href", Scalar::Str(&href));

        json.end_object();
    }
}

#[cfg(test)]
mod tests {
    use wthing_common::{PropertyType, Value, json::JsonBuffer};

    use super::*;
    use crate::PropertyExtension;

    fn structure(prop: &Property, href: &str) -> String {
        let mut json = JsonBuffer::new();
        json.begin_object(None);
        prop.to_json_structure(&mut json, href);
        json.end_object();
        json.into_string()
    }

    fn value(prop: &mut Property) -> String {
        let mut json = JsonBuffer::new();
        json.begin_object(None);
        prop.to_json_value(&mut json);
        json.end_object();
        json.into_string()
    }

    #[test]
    fn minimal_read_only_schema() {
        let mut prop = Property::new("count", "Count", "", PropertyType::Integer);
        prop.set_read_only(true);

        assert_eq!(
            structure(&prop, "/things/dev1"),
            r#"{"count":{"title":"Count","type":"number","readOnly":true,"href":"/things/dev1/properties/count"}}"#
        );
    }

    #[test]
    fn full_schema_field_order() {
        struct Level;

        impl PropertyExtension for Level {
            fn at_type(&self) -> &str {
                "LevelProperty"
            }

            fn additional_parameters(&self, json: &mut dyn JsonWriter) {
                json.property("minimum", Scalar::Int(0));
                json.property("maximum", Scalar::Int(100));
            }
        }

        let mut prop = Property::new("target", "Target", "Target temperature", PropertyType::Double)
            .with_extension(Level);
        prop.set_read_only(true);
        prop.set_unit("°C");
        prop.set_multiple_of(0.5);
        prop.add_enum_number(18.0);
        prop.add_enum_number(21.5);

        assert_eq!(
            structure(&prop, "/things/thermostat"),
            concat!(
                r#"{"target":{"title":"Target","description":"Target temperature","type":"number","#,
                r#""readOnly":true,"unit":"°C","multipleOf":0.5,"enum":[18.0,21.5],"#,
                r#""@type":"LevelProperty","minimum":0,"maximum":100,"#,
                r#""href":"/things/thermostat/properties/target"}}"#,
            )
        );
    }

    #[test]
    fn enum_order_and_native_types() {
        let mut prop = Property::new("mode", "", "", PropertyType::String);
        for mode in ["off", "heat", "cool", "auto"] {
            prop.add_enum_string(mode);
        }
        assert_eq!(
            structure(&prop, ""),
            r#"{"mode":{"type":"string","enum":["off","heat","cool","auto"],"href":"/properties/mode"}}"#
        );

        let mut prop = Property::new("level", "", "", PropertyType::Byte);
        prop.add_enum_byte(1);
        prop.add_enum_byte(2);
        prop.add_enum_byte(3);
        assert_eq!(
            structure(&prop, "/things/fan"),
            r#"{"level":{"type":"number","enum":[1,2,3],"href":"/things/fan/properties/level"}}"#
        );

        let mut prop = Property::new("on", "", "", PropertyType::Boolean);
        prop.add_enum_boolean(true);
        prop.add_enum_boolean(false);
        assert_eq!(
            structure(&prop, ""),
            r#"{"on":{"type":"boolean","enum":[true,false],"href":"/properties/on"}}"#
        );
    }

    #[test]
    fn values_as_native_types() {
        let mut prop = Property::new("on", "", "", PropertyType::Boolean);
        assert_eq!(value(&mut prop), r#"{"on":false}"#);
        prop.set_boolean(true);
        assert_eq!(value(&mut prop), r#"{"on":true}"#);

        let mut prop = Property::new("temp", "", "", PropertyType::Double);
        prop.set_double(21.5);
        assert_eq!(value(&mut prop), r#"{"temp":21.5}"#);

        let mut prop = Property::new("count", "", "", PropertyType::Integer);
        prop.set_integer(-4);
        assert_eq!(value(&mut prop), r#"{"count":-4}"#);

        let mut prop = Property::new("uptime", "", "", PropertyType::Long);
        prop.set_long(4_000_000_000);
        assert_eq!(value(&mut prop), r#"{"uptime":4000000000}"#);

        let mut prop = Property::new("level", "", "", PropertyType::Byte);
        prop.set_byte(255);
        assert_eq!(value(&mut prop), r#"{"level":255}"#);

        let mut prop = Property::new("name", "", "", PropertyType::String);
        assert_eq!(value(&mut prop), r#"{"name":""}"#);
        prop.set_string("desk \"lamp\"");
        assert_eq!(value(&mut prop), r#"{"name":"desk \"lamp\""}"#);
    }

    #[test]
    fn value_emission_requests_value() {
        let mut prop = Property::new("count", "", "", PropertyType::Integer);
        prop.set_on_value_request(|p| p.set_integer(99));

        assert_eq!(value(&mut prop), r#"{"count":99}"#);
        assert_eq!(prop.value(), Some(&Value::Integer(99)));
    }
}
