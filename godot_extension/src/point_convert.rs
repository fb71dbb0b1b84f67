//! Vector Adapter, Godot side
//!
//! GDScript passes either `Vector3` (host-native) or a `{x, y, z}` Dictionary.
//! Hit points go back out in the same shape.

use godot::builtin::{real, Dictionary, Variant, VariantType, Vector3};
use godot::prelude::ToGodot;
use raycast_core::{ConfigurationError, NativeVector, PlainPoint};

pub enum ScriptPoint {
    Native(NativeVector),
    Plain(PlainPoint),
}

pub fn vector3_to_native(v: Vector3) -> NativeVector {
    NativeVector::new(v.x as f64, v.y as f64, v.z as f64)
}

pub fn native_to_vector3(v: NativeVector) -> Vector3 {
    Vector3::new(v.x as real, v.y as real, v.z as real)
}

pub fn plain_to_dictionary(p: PlainPoint) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("x", p.x);
    dict.set("y", p.y);
    dict.set("z", p.z);
    dict
}

/// Hit callback arguments for a native-vector cast.
pub fn native_hit_args(point: NativeVector, normal: NativeVector) -> Vec<Variant> {
    vec![native_to_vector3(point).to_variant(), native_to_vector3(normal).to_variant()]
}

/// Hit callback arguments for a Dictionary cast.
pub fn plain_hit_args(point: PlainPoint, normal: PlainPoint) -> Vec<Variant> {
    vec![plain_to_dictionary(point).to_variant(), plain_to_dictionary(normal).to_variant()]
}

fn number(v: &Variant) -> Option<f64> {
    match v.get_type() {
        VariantType::FLOAT => v.try_to::<f64>().ok(),
        VariantType::INT => v.try_to::<i64>().ok().map(|i| i as f64),
        _ => None,
    }
}

fn dictionary_to_plain(dict: &Dictionary) -> Option<PlainPoint> {
    let x = dict.get("x").as_ref().and_then(number)?;
    let y = dict.get("y").as_ref().and_then(number)?;
    let z = dict.get("z").as_ref().and_then(number)?;
    Some(PlainPoint::new(x, y, z))
}

pub fn from_variant(v: &Variant) -> Result<ScriptPoint, ConfigurationError> {
    match v.get_type() {
        VariantType::VECTOR3 => v
            .try_to::<Vector3>()
            .map(|vec| ScriptPoint::Native(vector3_to_native(vec)))
            .map_err(|e| ConfigurationError::UnsupportedPoint { type_name: e.to_string() }),
        VariantType::DICTIONARY => v
            .try_to::<Dictionary>()
            .ok()
            .as_ref()
            .and_then(dictionary_to_plain)
            .map(ScriptPoint::Plain)
            .ok_or_else(|| ConfigurationError::UnsupportedPoint {
                type_name: "Dictionary without numeric x/y/z".to_string(),
            }),
        other => Err(ConfigurationError::UnsupportedPoint { type_name: format!("{:?}", other) }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector3_round_trip() {
        let v = Vector3::new(1.5, -2.0, 8.25);
        assert_eq!(native_to_vector3(vector3_to_native(v)), v);
    }

    #[test]
    fn native_to_vector3_keeps_components() {
        let v = native_to_vector3(NativeVector::new(3.0, 4.0, 5.0));
        assert_eq!((v.x, v.y, v.z), (3.0, 4.0, 5.0));
    }
}
