//! Observable typed values
//!
//! A [`Property`] has a type fixed at construction. Writes of any other type
//! are dropped without a signal, and getters of any other type return the zero
//! value. An effective write fires `on_change` and then `device_notification`.
//! Every getter first fires `on_value_request`, which may refresh the value
//! through the ordinary setters without notifying anyone.

use core::fmt::Debug;

use wthing_common::{
    DEFAULT_STRING_LENGTH, PropertyType, ThingString, Value, Visibility, json::JsonWriter,
    parse_leading_float, parse_leading_int,
};

mod json;

/// Observer fired after an effective change.
pub type ChangeHandler = Box<dyn FnMut(&Property)>;

/// Observer fired before every read, allowed to write the property.
pub type ValueRequestHandler = Box<dyn FnMut(&mut Property)>;

/// Hooks for specialized properties.
pub trait PropertyExtension {
    /// Semantic type annotation, emitted as `@type` in the schema.
    fn at_type(&self) -> &str {
        ""
    }

    /// Called after every effective change, before observers are notified.
    fn value_changed(&mut self, value: &Value) {
        let _ = value;
    }

    /// Extra schema fields, written right before `href`.
    fn additional_parameters(&self, json: &mut dyn JsonWriter) {
        let _ = json;
    }
}

pub struct Property {
    id: ThingString,
    title: ThingString,
    description: ThingString,
    ty: PropertyType,
    length: u8,
    value: Option<Value>,
    requested: bool,
    // set while on_value_request runs
    value_requesting: bool,
    read_only: bool,
    visibility: Visibility,
    unit: ThingString,
    multiple_of: f64,
    enums: Vec<Value>,
    extension: Option<Box<dyn PropertyExtension>>,
    on_value_request: Option<ValueRequestHandler>,
    on_change: Option<ChangeHandler>,
    device_notification: Option<ChangeHandler>,
}

impl Property {
    /// Creates a property; strings get a capacity of [`DEFAULT_STRING_LENGTH`].
    pub fn new(
        id: impl Into<ThingString>,
        title: impl Into<ThingString>,
        description: impl Into<ThingString>,
        ty: PropertyType,
    ) -> Self {
        Self::with_length(id, title, description, ty, DEFAULT_STRING_LENGTH)
    }

    /// Creates a property with a declared capacity.
    ///
    /// `length` is the maximum number of bytes for strings and is ignored for
    /// every other type.
    pub fn with_length(
        id: impl Into<ThingString>,
        title: impl Into<ThingString>,
        description: impl Into<ThingString>,
        ty: PropertyType,
        length: u8,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            ty,
            length: ty.fixed_length().unwrap_or(length),
            value: None,
            requested: false,
            value_requesting: false,
            read_only: false,
            visibility: Visibility::All,
            unit: ThingString::default(),
            multiple_of: 0.0,
            enums: Vec::new(),
            extension: None,
            on_value_request: None,
            on_change: None,
            device_notification: None,
        }
    }

    pub fn with_extension(mut self, extension: impl PropertyExtension + 'static) -> Self {
        self.extension = Some(Box::new(extension));
        self
    }

    pub fn set_on_value_request(&mut self, handler: impl FnMut(&mut Property) + 'static) {
        self.on_value_request = Some(Box::new(handler));
    }

    pub fn set_on_change(&mut self, handler: impl FnMut(&Property) + 'static) {
        self.on_change = Some(Box::new(handler));
    }

    pub fn set_device_notification(&mut self, handler: impl FnMut(&Property) + 'static) {
        self.device_notification = Some(Box::new(handler));
    }

    pub fn id(&self) -> &ThingString {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<ThingString>) {
        self.id = id.into();
    }

    pub fn title(&self) -> &ThingString {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<ThingString>) {
        self.title = title.into();
    }

    pub fn description(&self) -> &ThingString {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<ThingString>) {
        self.description = description.into();
    }

    pub fn ty(&self) -> PropertyType {
        self.ty
    }

    /// Byte size of fixed-size types, or the string capacity.
    pub fn length(&self) -> u8 {
        self.length
    }

    pub fn at_type(&self) -> &str {
        self.extension.as_ref().map_or("", |ext| ext.at_type())
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Forgets the current value. Observers are not notified.
    pub fn set_null(&mut self) {
        self.value = None;
        self.requested = false;
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }

    /// Flags interest in the value; only sticks while the property holds a value.
    pub fn set_requested(&mut self, requested: bool) {
        self.requested = requested && !self.is_null();
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Read-only properties reject [`parse`](Self::parse) and
    /// [`set_from_json`](Self::set_from_json), but typed setters still apply.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn unit(&self) -> &ThingString {
        &self.unit
    }

    pub fn set_unit(&mut self, unit: impl Into<ThingString>) {
        self.unit = unit.into();
    }

    pub fn multiple_of(&self) -> f64 {
        self.multiple_of
    }

    pub fn set_multiple_of(&mut self, multiple_of: f64) {
        self.multiple_of = multiple_of;
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
    }

    pub fn is_visible(&self, channel: Visibility) -> bool {
        self.visibility.allows(channel)
    }

    /// Stored value, without firing the value request.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Fires the value request, then returns the value or the zero of the type.
    pub fn get_value(&mut self) -> Value {
        self.request_value();
        self.value.clone().unwrap_or_else(|| self.ty.zero())
    }

    pub fn get_boolean(&mut self) -> bool {
        self.request_value();
        match self.value {
            Some(Value::Boolean(v)) => v,
            _ => false,
        }
    }

    pub fn set_boolean(&mut self, value: bool) {
        self.set_value(Value::Boolean(value));
    }

    pub fn toggle_boolean(&mut self) {
        if self.ty != PropertyType::Boolean {
            return;
        }
        let current = self.get_boolean();
        self.set_boolean(!current);
    }

    pub fn get_double(&mut self) -> f64 {
        self.request_value();
        match self.value {
            Some(Value::Double(v)) => v,
            _ => 0.0,
        }
    }

    pub fn set_double(&mut self, value: f64) {
        self.set_value(Value::Double(value));
    }

    pub fn get_integer(&mut self) -> i32 {
        self.request_value();
        match self.value {
            Some(Value::Integer(v)) => v,
            _ => 0,
        }
    }

    pub fn set_integer(&mut self, value: i32) {
        self.set_value(Value::Integer(value));
    }

    pub fn get_long(&mut self) -> u32 {
        self.request_value();
        match self.value {
            Some(Value::Long(v)) => v,
            _ => 0,
        }
    }

    pub fn set_long(&mut self, value: u32) {
        self.set_value(Value::Long(value));
    }

    pub fn get_byte(&mut self) -> u8 {
        self.request_value();
        match self.value {
            Some(Value::Byte(v)) => v,
            _ => 0,
        }
    }

    pub fn set_byte(&mut self, value: u8) {
        self.set_value(Value::Byte(value));
    }

    pub fn get_string(&mut self) -> &str {
        self.request_value();
        self.as_str()
    }

    /// Stored string. Unlike [`get_string`](Self::get_string), this never fires
    /// the value request.
    pub fn as_str(&self) -> &str {
        match &self.value {
            Some(Value::String(v)) => v.as_str(),
            _ => "",
        }
    }

    /// Stores `value`, truncated to the declared capacity.
    pub fn set_string(&mut self, value: &str) {
        self.set_value(Value::String(value.into()));
    }

    pub fn equals_boolean(&self, value: bool) -> bool {
        self.value == Some(Value::Boolean(value))
    }

    /// Exact comparison, unlike the tolerance used for change detection.
    pub fn equals_double(&self, value: f64) -> bool {
        self.value == Some(Value::Double(value))
    }

    pub fn equals_integer(&self, value: i32) -> bool {
        self.value == Some(Value::Integer(value))
    }

    pub fn equals_long(&self, value: u32) -> bool {
        self.value == Some(Value::Long(value))
    }

    pub fn equals_byte(&self, value: u8) -> bool {
        self.value == Some(Value::Byte(value))
    }

    /// Converts text to the property's type and stores it.
    ///
    /// Numbers are read from the leading part of the text, so text without one
    /// stores zero. Booleans are true only for `"true"`. Returns false, without
    /// touching the value, if the property is read-only.
    pub fn parse(&mut self, text: &str) -> bool {
        if self.read_only {
            tracing::trace!(property = %self.id, "ignoring parse of read-only property");
            return false;
        }

        let value = match self.ty {
            PropertyType::Boolean => Value::Boolean(text == "true"),
            PropertyType::Double => Value::Double(parse_leading_float(text)),
            PropertyType::Integer => Value::Integer(parse_leading_int(text) as i32),
            PropertyType::Long => Value::Long(parse_leading_int(text) as u32),
            PropertyType::Byte => Value::Byte(parse_leading_int(text) as u8),
            PropertyType::String => Value::String(text.into()),
        };
        self.set_value(value);

        true
    }

    /// JSON counterpart of [`parse`](Self::parse).
    ///
    /// Numbers saturate into the native width; JSON of the wrong kind stores zero.
    pub fn set_from_json(&mut self, json: &serde_json::Value) -> bool {
        if self.read_only {
            tracing::trace!(property = %self.id, "ignoring json for read-only property");
            return false;
        }

        let value = match self.ty {
            PropertyType::Boolean => Value::Boolean(json.as_bool().unwrap_or(false)),
            PropertyType::Double => Value::Double(json.as_f64().unwrap_or(0.0)),
            PropertyType::Integer => {
                Value::Integer(json_int(json).clamp(i32::MIN.into(), i32::MAX.into()) as i32)
            }
            PropertyType::Long => Value::Long(json_int(json).clamp(0, u32::MAX.into()) as u32),
            PropertyType::Byte => Value::Byte(json_int(json).clamp(0, u8::MAX.into()) as u8),
            PropertyType::String => Value::String(json.as_str().unwrap_or("").into()),
        };
        self.set_value(value);

        true
    }

    /// Permitted values, in the order they were added.
    pub fn enums(&self) -> &[Value] {
        &self.enums
    }

    pub fn has_enum(&self) -> bool {
        !self.enums.is_empty()
    }

    /// Adds a permitted value. Values of another type are ignored.
    ///
    /// Enum strings get one byte less capacity than the property itself.
    pub fn add_enum(&mut self, value: Value) {
        if value.ty() != self.ty {
            tracing::trace!(property = %self.id, ty = ?value.ty(), "ignoring enum of mismatched type");
            return;
        }

        let mut node = Property::with_length("", "", "", self.ty, self.length.saturating_sub(1));
        node.set_value(value);
        if let Some(value) = node.value.take() {
            self.enums.push(value);
        }
    }

    pub fn add_enum_boolean(&mut self, value: bool) {
        self.add_enum(Value::Boolean(value));
    }

    pub fn add_enum_number(&mut self, value: f64) {
        self.add_enum(Value::Double(value));
    }

    pub fn add_enum_integer(&mut self, value: i32) {
        self.add_enum(Value::Integer(value));
    }

    pub fn add_enum_long(&mut self, value: u32) {
        self.add_enum(Value::Long(value));
    }

    pub fn add_enum_byte(&mut self, value: u8) {
        self.add_enum(Value::Byte(value));
    }

    pub fn add_enum_string(&mut self, value: &str) {
        self.add_enum(Value::String(value.into()));
    }

    fn set_value(&mut self, value: Value) {
        if value.ty() != self.ty {
            tracing::trace!(
                property = %self.id,
                expected = ?self.ty,
                got = ?value.ty(),
                "ignoring value of mismatched type",
            );
            return;
        }

        let value = match value {
            Value::String(mut s) => {
                s.truncate_to(self.length.into());
                Value::String(s)
            }
            value => value,
        };

        let changed = self
            .value
            .as_ref()
            .is_none_or(|current| current.differs_from(&value));
        if !changed {
            return;
        }

        self.value = Some(value);
        if let (Some(extension), Some(value)) = (self.extension.as_mut(), self.value.as_ref()) {
            extension.value_changed(value);
        }
        self.notify();
    }

    fn notify(&mut self) {
        if self.value_requesting {
            return;
        }

        if let Some(mut handler) = self.on_change.take() {
            handler(&*self);
            self.on_change.get_or_insert(handler);
        }

        if let Some(mut handler) = self.device_notification.take() {
            handler(&*self);
            self.device_notification.get_or_insert(handler);
        }
    }

    pub(crate) fn request_value(&mut self) {
        if let Some(mut handler) = self.on_value_request.take() {
            self.value_requesting = true;
            handler(&mut *self);
            self.value_requesting = false;
            self.on_value_request.get_or_insert(handler);
        }
    }
}

fn json_int(json: &serde_json::Value) -> i64 {
    json.as_i64()
        .or_else(|| json.as_u64().map(|_| i64::MAX))
        .or_else(|| json.as_f64().map(|v| v as i64))
        .unwrap_or(0)
}

impl Debug for Property {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Property")
            .field("id", &self.id)
            .field("ty", &self.ty)
            .field("value", &self.value)
            .field("read_only", &self.read_only)
            .field("visibility", &self.visibility)
            .field("enums", &self.enums)
            .finish_non_exhaustive()
    }
}
