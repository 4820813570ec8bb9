use canonize::{
    hash, is_equal, serialize, serialize_with_options, to_canonical_string, Error, Function,
    HostObject, Opaque, Options, TypedArray, Value,
};
use chrono::{TimeZone, Utc};
use num_bigint::BigInt;
use serde::Serialize;
use url::Url;

#[derive(Debug)]
struct Jsonable {
    class: &'static str,
    json: Value,
}

impl HostObject for Jsonable {
    fn tag(&self) -> &str {
        "Object"
    }

    fn class_name(&self) -> &str {
        self.class
    }

    fn to_json(&self) -> Option<Value> {
        Some(self.json.clone())
    }
}

#[derive(Debug)]
struct FormData(Vec<(&'static str, &'static str)>);

impl HostObject for FormData {
    fn tag(&self) -> &str {
        "FormData"
    }

    fn entries(&self) -> Option<Vec<(Value, Value)>> {
        Some(
            self.0
                .iter()
                .map(|(k, v)| (Value::from(*k), Value::from(*v)))
                .collect(),
        )
    }
}

fn ser(value: &Value) -> String {
    serialize(value).unwrap()
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

#[test]
fn test_strings() {
    assert_eq!(ser(&Value::from("hello world 😎")), "'hello world 😎'");
    assert_eq!(
        ser(&Value::object([("msg", Value::from("hello world 😎"))])),
        "{msg:'hello world 😎'}"
    );
}

#[test]
fn test_dates() {
    let epoch = Utc.timestamp_millis_opt(0).unwrap();
    assert_eq!(ser(&Value::date(epoch)), "Date(1970-01-01T00:00:00.000Z)");
    assert_eq!(ser(&Value::invalid_date()), "Date(null)");

    let precise = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    assert_eq!(ser(&Value::date(precise)), "Date(2023-11-14T22:13:20.123Z)");
}

#[test]
fn test_primitives() {
    assert_eq!(ser(&Value::from(true)), "true");
    assert_eq!(ser(&Value::from(false)), "false");
    assert_eq!(ser(&Value::Null), "null");
    assert_eq!(ser(&Value::Undefined), "undefined");
    assert_eq!(ser(&Value::from("x")), "'x'");
    assert_eq!(ser(&Value::from(42)), "42");
}

#[test]
fn test_numbers() {
    assert_eq!(ser(&Value::from(0)), "0");
    assert_eq!(ser(&Value::from(100)), "100");
    assert_eq!(ser(&Value::from(-100)), "-100");
    assert_eq!(ser(&Value::from(f64::NAN)), "NaN");
    assert_eq!(ser(&Value::from(f64::EPSILON)), "2.220446049250313e-16");
    assert_eq!(ser(&Value::from(f64::NEG_INFINITY)), "-Infinity");
    assert_eq!(ser(&Value::from(f64::INFINITY)), "Infinity");
    assert_eq!(ser(&Value::from(1.0)), ser(&Value::from(1)));
}

#[test]
fn test_builtins() {
    assert_eq!(ser(&Value::error("Error", "test")), "Error(Error: test)");
    assert_eq!(ser(&Value::regexp(".*", "")), "RegExp(/.*/)");
    assert_eq!(ser(&Value::regexp("a+", "gi")), "RegExp(/a+/gi)");

    let url = Url::parse("https://example.com").unwrap();
    assert_eq!(ser(&Value::url(url)), "URL(https://example.com/)");

    assert_eq!(ser(&Value::symbol("test")), "Symbol(test)");
    assert_eq!(
        ser(&Value::from(BigInt::from(9_007_199_254_740_991_i64))),
        "9007199254740991n"
    );
}

#[test]
fn test_sets() {
    assert_eq!(ser(&Value::set(ints(&[1, 2, 3]))), "Set[1,2,3]");
    assert_eq!(ser(&Value::set(ints(&[2, 3, 1]))), "Set[1,2,3]");

    let objects = Value::set(vec![
        Value::object([("b", Value::from(1))]),
        Value::object([("a", Value::from(1))]),
    ]);
    assert_eq!(ser(&objects), "Set[{a:1},{b:1}]");
}

#[test]
fn test_map() {
    let map = Value::map(vec![
        (Value::from(1), Value::from(4)),
        (Value::from(2), Value::from(3)),
        (Value::from("z"), Value::from(2)),
        (Value::from("a"), Value::from("1")),
        (Value::object([("x", Value::from(42))]), Value::from("3")),
    ]);
    assert_eq!(ser(&map), "Map{1:4,2:3,a:'1',z:2,{x:42}:'3'}");
}

#[test]
fn test_arrays_keep_position() {
    assert_eq!(
        ser(&Value::array(vec![
            Value::from(1),
            Value::from(2),
            Value::from("x"),
            Value::from(3)
        ])),
        "[1,2,'x',3]"
    );
    assert_ne!(
        ser(&Value::array(ints(&[1, 2, 3]))),
        ser(&Value::array(ints(&[3, 2, 1])))
    );
}

#[test]
fn test_typed_arrays() {
    let cases = vec![
        (TypedArray::Int8(vec![1, 2, 3]), "Int8Array[1,2,3]"),
        (TypedArray::Uint8(vec![1, 2, 3]), "Uint8Array[1,2,3]"),
        (TypedArray::Uint8Clamped(vec![1, 2, 3]), "Uint8ClampedArray[1,2,3]"),
        (TypedArray::Int16(vec![1, 2, 3]), "Int16Array[1,2,3]"),
        (TypedArray::Uint16(vec![1, 2, 3]), "Uint16Array[1,2,3]"),
        (TypedArray::Int32(vec![1, 2, 3]), "Int32Array[1,2,3]"),
        (TypedArray::Uint32(vec![1, 2, 3]), "Uint32Array[1,2,3]"),
        (TypedArray::Float32(vec![1.0, 2.0, 3.0]), "Float32Array[1,2,3]"),
        (TypedArray::Float64(vec![1.0, 2.5, 3.0]), "Float64Array[1,2.5,3]"),
        (TypedArray::BigInt64(vec![1, 2, 3]), "BigInt64Array[1n,2n,3n]"),
        (TypedArray::BigUint64(vec![1, 2, 3]), "BigUint64Array[1n,2n,3n]"),
        (TypedArray::BigInt64(vec![]), "BigInt64Array[]"),
        (TypedArray::BigUint64(vec![]), "BigUint64Array[]"),
    ];
    for (array, expected) in cases {
        assert_eq!(ser(&Value::typed_array(array)), expected);
    }

    assert_eq!(ser(&Value::array_buffer(vec![1, 2, 3])), "ArrayBuffer[1,2,3]");
    assert_eq!(
        ser(&Value::typed_array(TypedArray::Uint8(b"hello".to_vec()))),
        "Uint8Array[104,101,108,108,111]"
    );
}

#[test]
fn test_objects() {
    let ab = Value::object([("a", Value::from(1)), ("b", Value::from(2))]);
    let ba = Value::object([("b", Value::from(2)), ("a", Value::from(1))]);
    assert_eq!(ser(&ab), "{a:1,b:2}");
    assert_eq!(ser(&ba), "{a:1,b:2}");
    assert_eq!(ser(&Value::empty_object()), "{}");
}

#[test]
fn test_class_instances() {
    assert_eq!(
        ser(&Value::instance("Test", [("x", Value::from(1))])),
        "Test{x:1}"
    );
    assert_eq!(
        ser(&Value::instance("CustomEvent", [("y", Value::from(1))])),
        "CustomEvent{y:1}"
    );
    assert_eq!(
        ser(&Value::instance("Object", [("y", Value::from(1))])),
        "{y:1}"
    );
}

#[test]
fn test_to_json_protocol() {
    let array = Value::host(Jsonable {
        class: "TestArray",
        json: Value::array(ints(&[1, 2, 3])),
    });
    assert_eq!(ser(&array), "TestArray[1,2,3]");
    assert_eq!(
        ser(&Value::object([("x", array)])),
        "{x:TestArray[1,2,3]}"
    );

    let object = Value::host(Jsonable {
        class: "TestObject",
        json: Value::object([("b", Value::from(2)), ("a", Value::from(1))]),
    });
    assert_eq!(ser(&object), "TestObject{a:1,b:2}");

    let null = Value::host(Jsonable {
        class: "TestNull",
        json: Value::Null,
    });
    assert_eq!(ser(&null), "TestNull(null)");

    let string = Value::host(Jsonable {
        class: "TestString",
        json: Value::from("value"),
    });
    assert_eq!(ser(&string), "TestString('value')");

    let plain = Value::host(Jsonable {
        class: "Object",
        json: Value::from(1),
    });
    assert_eq!(ser(&plain), "(1)");
}

#[test]
fn test_entries_protocol() {
    let form = Value::host(FormData(vec![("foo", "bar"), ("bar", "baz")]));
    assert_eq!(ser(&form), "FormData{bar:'baz',foo:'bar'}");
}

#[test]
fn test_functions() {
    assert_eq!(ser(&Value::function(Function::native("Array"))), "Array()[native]");

    let sum = Function::new("sum", 2, "function sum(a, b) {\n  return a + b;\n}");
    assert_eq!(
        ser(&Value::function(sum)),
        "sum(2)function sum(a, b) {return a + b;}"
    );

    let arrow = Function::new("sum", 2, "(a, b) => a + b");
    assert_eq!(ser(&Value::function(arrow)), "sum(2)(a, b) => a + b");

    let fetch = Function::new("fetch", 1, "async function fetch(url) {}").with_async(true);
    assert_eq!(
        ser(&Value::function(fetch)),
        "fetch(1)async function fetch(url) {}"
    );
}

#[test]
fn test_unsupported_types() {
    let err = serialize(&Value::host(Opaque::new("Blob"))).unwrap_err();
    assert_eq!(err.to_string(), "Cannot serialize Blob");

    let nested = Value::object([("pending", Value::host(Opaque::new("Promise")))]);
    match serialize(&nested) {
        Err(Error::UnsupportedType { tag }) => assert_eq!(tag, "Promise"),
        other => panic!("Expected unsupported type error, got {:?}", other),
    }
}

#[test]
fn test_simple_circular_reference() {
    let obj = Value::empty_object();
    obj.as_object().unwrap().set("foo", obj.clone());
    assert_eq!(ser(&obj), "{foo:#0}");
}

#[test]
fn test_circular_reference_in_nested_objects() {
    let inner = Value::empty_object();
    let obj = Value::object([("a", inner.clone())]);
    inner.as_object().unwrap().set("b", obj.clone());
    assert_eq!(ser(&obj), "{a:{b:#0}}");
}

#[test]
fn test_circular_reference_in_arrays() {
    let arr = Value::array(vec![]);
    arr.as_object().unwrap().push(arr.clone());
    assert_eq!(ser(&arr), "[#0]");

    let obj = Value::object([("a", Value::array(vec![]))]);
    let inner = Value::array(vec![obj.clone()]);
    obj.as_object().unwrap().set("a", inner);
    assert_eq!(ser(&obj), "{a:[#0]}");
}

#[test]
fn test_deep_circular_references() {
    let c_holder = Value::empty_object();
    let a = Value::object([("b", c_holder.clone())]);
    let obj = Value::object([("a", a.clone())]);
    c_holder.as_object().unwrap().set("c", a);
    assert_eq!(ser(&obj), "{a:{b:{c:#1}}}");
}

#[test]
fn test_self_reference_from_multiple_keys() {
    let a = Value::empty_object();
    let b = Value::empty_object();
    let obj = Value::object([("a", a.clone()), ("b", b.clone())]);
    a.as_object().unwrap().set("ref", obj.clone());
    b.as_object().unwrap().set("ref", obj.clone());
    assert_eq!(ser(&obj), "{a:{ref:#0},b:{ref:#0}}");
}

#[test]
fn test_circular_references_in_maps() {
    let map = Value::map(vec![]);
    map.as_object().unwrap().insert("key", map.clone());
    assert_eq!(ser(&map), "Map{key:#0}");

    let keyed = Value::map(vec![]);
    keyed.as_object().unwrap().insert(keyed.clone(), "value");
    assert_eq!(ser(&keyed), "Map{#0:'value'}");
}

#[test]
fn test_circular_references_in_sets() {
    let set = Value::set(vec![]);
    set.as_object().unwrap().push(set.clone());
    assert_eq!(ser(&set), "Set[#0]");

    let shared = Value::set(vec![Value::from(1)]);
    shared.as_object().unwrap().push(shared.clone());
    let obj = Value::object([("a", shared.clone()), ("b", shared)]);
    assert_eq!(ser(&obj), "{a:Set[#1,1],b:Set[#1,1]}");
}

#[test]
fn test_sort_keys_do_not_consume_markers() {
    let cyclic = Value::empty_object();
    cyclic.as_object().unwrap().set("self", cyclic.clone());
    let set = Value::set(vec![
        Value::object([("y", Value::from(1))]),
        Value::object([("x", Value::from(1))]),
    ]);
    let obj = Value::object([("a", set), ("b", cyclic)]);
    assert_eq!(ser(&obj), "{a:Set[{x:1},{y:1}],b:{self:#4}}");
}

#[test]
fn test_mutual_references() {
    let a = Value::object([("name", Value::from("A"))]);
    let b = Value::object([("name", Value::from("B"))]);
    a.as_object().unwrap().set("ref", b.clone());
    b.as_object().unwrap().set("ref", a.clone());
    let obj = Value::object([("a", a), ("b", b)]);
    assert_eq!(
        ser(&obj),
        "{a:{name:'A',ref:{name:'B',ref:#1}},b:{name:'B',ref:#1}}"
    );
}

#[test]
fn test_multiple_levels_of_references() {
    let z = Value::empty_object();
    let x = Value::object([("y", Value::object([("z", z.clone())]))]);
    let obj = Value::object([("x", x.clone())]);
    z.as_object().unwrap().set("ref1", x);
    z.as_object().unwrap().set("ref2", obj.clone());
    assert_eq!(ser(&obj), "{x:{y:{z:{ref1:#1,ref2:#0}}}}");
}

#[test]
fn test_shared_references_are_transparent() {
    fn nested() -> Value {
        Value::object([
            ("_", Value::from(1)),
            (
                "b",
                Value::object([
                    ("_", Value::from(2)),
                    ("c", Value::object([("_", Value::from(3))])),
                ]),
            ),
        ])
    }

    let simple = Value::object([("a", nested()), ("b", nested())]);
    assert_eq!(
        ser(&simple),
        "{a:{_:1,b:{_:2,c:{_:3}}},b:{_:1,b:{_:2,c:{_:3}}}}"
    );

    let shared = nested();
    let refs = Value::object([("a", shared.clone()), ("b", shared)]);
    assert_eq!(ser(&refs), ser(&simple));
    assert_eq!(hash(&refs).unwrap(), hash(&simple).unwrap());
}

#[test]
fn test_exclude_keys() {
    let value = Value::object([("a", Value::from(1)), ("b", Value::from(2))]);
    let options = Options::new().with_exclude_keys(|key| key == "b");
    let out = serialize_with_options(&value, &options).unwrap();
    assert_eq!(out, "{a:1}");
    assert!(!out.contains('b'));
}

#[test]
fn test_exclude_values() {
    let value = Value::object([
        ("b", Value::object([("deep", Value::from(1))])),
        ("a", Value::from(2)),
    ]);
    let options = Options::new().with_exclude_values(true);
    assert_eq!(serialize_with_options(&value, &options).unwrap(), "{a,b}");
}

#[test]
fn test_replacer_converts_unsupported_kinds() {
    let options = Options::new().with_replacer(|value| match value.as_object() {
        Some(object) if object.tag() == "Promise" => Value::from("[promise]"),
        _ => value.clone(),
    });
    let value = Value::array(vec![Value::host(Opaque::new("Promise"))]);
    assert_eq!(
        serialize_with_options(&value, &options).unwrap(),
        "['[promise]']"
    );
}

#[test]
fn test_ordering_toggles() {
    let set = Value::set(ints(&[3, 1, 2]));
    let options = Options::new().with_unordered_sets(false);
    assert_eq!(serialize_with_options(&set, &options).unwrap(), "Set[3,1,2]");

    let object = Value::object([("b", Value::from(1)), ("a", Value::from(2))]);
    let options = Options::new().with_unordered_objects(false);
    assert_eq!(serialize_with_options(&object, &options).unwrap(), "{b:1,a:2}");

    let array = Value::array(ints(&[3, 1, 2]));
    let options = Options::new().with_unordered_arrays(true);
    assert_eq!(serialize_with_options(&array, &options).unwrap(), "[1,2,3]");
}

#[test]
fn test_function_options() {
    let f = Value::function(Function::native("max").with_property("arity", Value::from(2)));
    assert_eq!(ser(&f), "max()[native]");

    let options = Options::new()
        .with_respect_function_names(false)
        .with_respect_function_properties(true);
    assert_eq!(
        serialize_with_options(&f, &options).unwrap(),
        "()[native]{arity:2}"
    );
}

#[test]
fn test_ignore_unknown() {
    let value = Value::object([("blob", Value::host(Opaque::new("Blob")))]);
    let options = Options::new().with_ignore_unknown(true);
    assert_eq!(serialize_with_options(&value, &options).unwrap(), "{blob:Blob}");
}

#[test]
fn test_handlers_take_precedence() {
    let options = Options::new().with_handler("FormData", |_| Ok(Value::from("redacted")));
    let form = Value::host(FormData(vec![("foo", "bar")]));
    assert_eq!(
        serialize_with_options(&form, &options).unwrap(),
        "FormData('redacted')"
    );
}

#[test]
fn test_serde_types() {
    #[derive(Serialize)]
    struct Order {
        id: u32,
        items: Vec<Item>,
        note: Option<String>,
    }

    #[derive(Serialize)]
    struct Item {
        sku: &'static str,
        qty: u8,
    }

    let order = Order {
        id: 7,
        items: vec![Item { sku: "A-1", qty: 2 }],
        note: None,
    };
    assert_eq!(
        to_canonical_string(&order).unwrap(),
        "Order{id:7,items:[Item{qty:2,sku:'A-1'}],note:null}"
    );

    let json: serde_json::Value = serde_json::json!({"b": [1, 2.5], "a": {"c": null}});
    assert_eq!(to_canonical_string(&json).unwrap(), "{a:{c:null},b:[1,2.5]}");
}

#[test]
fn test_equality() {
    let options = Options::default();
    let a = Value::set(vec![Value::object([("x", Value::from(1))])]);
    let b = Value::set(vec![Value::object([("x", Value::from(1))])]);
    assert!(is_equal(&a, &b, &options).unwrap());
    assert!(!is_equal(&a, &Value::array(vec![]), &options).unwrap());
}

#[test]
fn test_deserialize_from_json() {
    let value: Value = serde_json::from_str(r#"{"z": [1, 2.5, null], "a": "x", "m": {"k": true}}"#).unwrap();
    assert_eq!(ser(&value), "{a:'x',m:{k:true},z:[1,2.5,null]}");
}
