use goalmap::{MutationError, RegistryError, SessionError, ShareError, StoreError};
use wasm_bindgen::prelude::*;

use crate::interop::{new_obj, set_kv, to_js};

pub fn ok(v: JsValue) -> JsValue {
    let o = new_obj();
    set_kv(&o, "ok", &JsValue::from_bool(true));
    set_kv(&o, "value", &v);
    o.into()
}

pub fn err(code: &'static str, message: impl Into<String>, data: Option<JsValue>) -> JsValue {
    let root = new_obj();
    set_kv(&root, "ok", &JsValue::from_bool(false));
    let e = new_obj();
    set_kv(&e, "code", &JsValue::from_str(code));
    set_kv(&e, "message", &JsValue::from_str(&message.into()));
    if let Some(d) = data { set_kv(&e, "data", &d); }
    set_kv(&root, "error", &e.into());
    root.into()
}

/// Core errors that carry a stable code for the JS side
pub trait Coded: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

macro_rules! coded {
    ($($t:ty),*) => {
        $(impl Coded for $t {
            fn error_code(&self) -> &'static str { self.code() }
        })*
    };
}

coded!(MutationError, SessionError, StoreError, RegistryError, ShareError);

pub fn from_error<E: Coded>(e: &E) -> JsValue {
    err(e.error_code(), e.to_string(), None)
}

/// `ok(value)` on success, the error envelope otherwise
pub fn wrap<T, E: Coded>(r: Result<T, E>, f: impl FnOnce(T) -> JsValue) -> JsValue {
    match r {
        Ok(v) => ok(f(v)),
        Err(e) => from_error(&e),
    }
}

/// Serialize `v` into an ok envelope
pub fn ok_value<T: serde::Serialize + ?Sized>(v: &T) -> JsValue {
    match to_js(v) {
        Ok(js) => ok(js),
        Err(e) => err("serialize", e.to_string(), None),
    }
}

#[inline]
pub fn invalid_arg(param: &str, e: impl std::fmt::Display) -> JsValue {
    let d = new_obj(); set_kv(&d, "param", &JsValue::from_str(param));
    err("invalid_argument", format!("parameter '{}': {}", param, e), Some(d.into()))
}

#[inline]
pub fn non_finite(param: &str) -> JsValue {
    let d = new_obj(); set_kv(&d, "param", &JsValue::from_str(param));
    err("non_finite", format!("parameter '{}' must be finite", param), Some(d.into()))
}

#[inline]
pub fn unavailable(code: &'static str, what: &str) -> JsValue {
    err(code, format!("{} is not available in this environment", what), None)
}
