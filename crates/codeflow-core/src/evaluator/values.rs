//! Conversion of script values into owned JSON snapshots.
//!
//! Snapshots have to outlive the interpreter, so every value the tracker
//! receives is copied out at call time. Conversion never fails and never runs
//! script code: properties are read through their descriptors, accessors are
//! reported without being called, and proxies stay opaque.

use std::mem::MaybeUninit;
use std::os::raw::c_int;

use rquickjs::convert::Coerced;
use rquickjs::{qjs, Ctx, Object, Value};
use serde_json::{Map, Number, Value as Json};

use crate::execution_log::Variables;
use crate::UNDEFINED_SENTINEL;

const UNREADABLE: &str = "[Unreadable]";

// Integers beyond this lose precision as f64
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Copies script values into JSON, descending at most `max_depth` container
/// levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshotter {
    max_depth: usize,
    proxy_class: Option<u32>,
}

/// An own property as its descriptor describes it
enum Property<'js> {
    Data(Value<'js>),
    Accessor { getter: bool, setter: bool },
    Unreadable,
}

impl Snapshotter {
    /// Build a snapshotter for `ctx`.
    ///
    /// Has to run before any program code, while `Proxy` is still the builtin.
    pub fn new(ctx: &Ctx<'_>, max_depth: usize) -> Self {
        let proxy_class = ctx
            .eval::<Value, _>("new Proxy({}, {})")
            .ok()
            .map(|proxy| class_id(&proxy));
        Self {
            max_depth,
            proxy_class,
        }
    }

    /// Copy `value` into JSON
    pub fn snapshot(&self, value: &Value<'_>) -> Json {
        self.convert(value, self.max_depth)
    }

    /// Snapshot the variables object passed to `trackLine`
    pub fn variables(&self, value: &Value<'_>) -> Variables {
        let mut variables = Variables::new();
        if let Some(object) = value.as_object().filter(|_| !self.is_proxy(value)) {
            for (name, property) in own_properties(object) {
                let value = self.property(property, self.max_depth);
                variables.insert(name, value);
            }
        }
        variables
    }

    /// Human readable rendering, used for console output and thrown values
    pub fn describe(&self, value: &Value<'_>) -> String {
        match self.convert(value, self.max_depth.min(2)) {
            Json::String(text) => text,
            other => other.to_string(),
        }
    }

    fn convert(&self, value: &Value<'_>, depth: usize) -> Json {
        if value.is_undefined() {
            return Json::String(UNDEFINED_SENTINEL.to_string());
        }
        if value.is_null() {
            return Json::Null;
        }
        if let Some(flag) = value.as_bool() {
            return Json::Bool(flag);
        }
        if let Some(int) = value.as_int() {
            return Json::from(int);
        }
        if let Some(float) = value.as_float() {
            return number(float);
        }
        if let Some(string) = value.as_string() {
            return string
                .to_string()
                .map(Json::String)
                .unwrap_or_else(|_| unreadable());
        }
        if value.as_big_int().is_some() {
            // primitive bigints convert without touching BigInt.prototype
            return match value.get::<Coerced<String>>() {
                Ok(Coerced(digits)) => Json::String(format!("{digits}n")),
                Err(_) => unreadable(),
            };
        }
        if let Some(symbol) = value.as_symbol() {
            let description = symbol
                .description()
                .ok()
                .and_then(|description| description.as_string().and_then(|s| s.to_string().ok()))
                .unwrap_or_default();
            return Json::String(format!("Symbol({description})"));
        }
        if self.is_proxy(value) {
            return Json::String("[Proxy]".to_string());
        }
        if value.is_function() {
            return Json::String(function_label(value));
        }
        if let Some(array) = value.as_array() {
            if depth == 0 {
                return Json::String("[Array]".to_string());
            }
            return Json::Array(
                (0..array.len())
                    .map(|index| match own_property(array.as_object(), &index.to_string()) {
                        Some(property) => self.property(property, depth - 1),
                        None => Json::String(UNDEFINED_SENTINEL.to_string()),
                    })
                    .collect(),
            );
        }
        if let Some(object) = value.as_object() {
            if depth == 0 {
                return Json::String("[Object]".to_string());
            }
            let mut map = Map::new();
            for (key, property) in own_properties(object) {
                map.insert(key, self.property(property, depth - 1));
            }
            return Json::Object(map);
        }
        Json::String("[Unknown]".to_string())
    }

    fn property(&self, property: Property<'_>, depth: usize) -> Json {
        match property {
            Property::Data(value) => self.convert(&value, depth),
            Property::Accessor { getter, setter } => {
                let label = match (getter, setter) {
                    (true, true) => "[Getter/Setter]",
                    (true, false) => "[Getter]",
                    _ => "[Setter]",
                };
                Json::String(label.to_string())
            }
            Property::Unreadable => unreadable(),
        }
    }

    fn is_proxy(&self, value: &Value<'_>) -> bool {
        value.is_object() && self.proxy_class == Some(class_id(value))
    }
}

/// Line argument of a tracker call; anything that is not a usable number is 0
pub fn line_number(value: &Value<'_>) -> u32 {
    if let Some(int) = value.as_int() {
        return u32::try_from(int).unwrap_or(0);
    }
    match value.as_float() {
        Some(float) if float.is_finite() && float >= 0.0 && float <= f64::from(u32::MAX) => {
            float as u32
        }
        _ => 0,
    }
}

fn class_id(value: &Value<'_>) -> u32 {
    // SAFETY: reads the class tag of a live value; non-objects yield the
    // invalid class id.
    unsafe { qjs::JS_GetClassID(value.as_raw()) }
}

/// Own enumerable string-keyed properties, in property order
fn own_properties<'js>(object: &Object<'js>) -> Vec<(String, Property<'js>)> {
    object
        .keys::<String>()
        .flatten()
        .filter_map(|key| own_property(object, &key).map(|property| (key, property)))
        .collect()
}

/// Look up an own property without invoking accessors.
///
/// Not for proxies: their `getOwnPropertyDescriptor` trap is script code.
fn own_property<'js>(object: &Object<'js>, key: &str) -> Option<Property<'js>> {
    let ctx = object.ctx().clone();
    let raw_ctx = ctx.as_raw().as_ptr();

    // SAFETY: the atom is released before returning. On success every
    // descriptor field holds an owned reference, and each is handed to a
    // `Value` that releases it on drop.
    unsafe {
        let atom = qjs::JS_NewAtomLen(raw_ctx, key.as_ptr().cast(), key.len() as _);
        if atom == 0 {
            ctx.catch();
            return None;
        }
        let mut descriptor = MaybeUninit::<qjs::JSPropertyDescriptor>::uninit();
        let found = qjs::JS_GetOwnProperty(raw_ctx, descriptor.as_mut_ptr(), object.as_raw(), atom);
        qjs::JS_FreeAtom(raw_ctx, atom);

        if found < 0 {
            // e.g. an uninitialized module binding
            ctx.catch();
            return Some(Property::Unreadable);
        }
        if found == 0 {
            return None;
        }

        let descriptor = descriptor.assume_init();
        let value = Value::from_raw(ctx.clone(), descriptor.value);
        let getter = Value::from_raw(ctx.clone(), descriptor.getter);
        let setter = Value::from_raw(ctx, descriptor.setter);
        if descriptor.flags & qjs::JS_PROP_GETSET as c_int != 0 {
            Some(Property::Accessor {
                getter: !getter.is_undefined(),
                setter: !setter.is_undefined(),
            })
        } else {
            Some(Property::Data(value))
        }
    }
}

fn function_label(value: &Value<'_>) -> String {
    let name = value
        .as_object()
        .and_then(|object| match own_property(object, "name") {
            Some(Property::Data(name)) => name.as_string().and_then(|name| name.to_string().ok()),
            _ => None,
        })
        .filter(|name| !name.is_empty());
    match name {
        Some(name) => format!("[Function: {name}]"),
        None => "[Function (anonymous)]".to_string(),
    }
}

fn number(value: f64) -> Json {
    if value.is_nan() {
        return Json::String("NaN".to_string());
    }
    if value.is_infinite() {
        let name = if value > 0.0 { "Infinity" } else { "-Infinity" };
        return Json::String(name.to_string());
    }
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        return Json::from(value as i64);
    }
    Number::from_f64(value).map(Json::Number).unwrap_or(Json::Null)
}

fn unreadable() -> Json {
    Json::String(UNREADABLE.to_string())
}
