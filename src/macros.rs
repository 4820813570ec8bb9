/// Builds an acyclic [`Value`](crate::Value) from a JSON-like literal.
///
/// Objects become plain objects, arrays become arrays, and any other
/// expression is converted with [`Value::from`](crate::Value).
///
/// ```rust
/// use canonize::{serialize, value};
///
/// let v = value!({
///     "name": "Alice",
///     "tags": ["a", "b"],
///     "manager": null
/// });
/// assert_eq!(serialize(&v).unwrap(), "{manager:null,name:'Alice',tags:['a','b']}");
/// ```
#[macro_export]
macro_rules! value {
    // Handle null
    (null) => {
        $crate::Value::Null
    };

    // Handle undefined
    (undefined) => {
        $crate::Value::Undefined
    };

    // Handle true
    (true) => {
        $crate::Value::Bool(true)
    };

    // Handle false
    (false) => {
        $crate::Value::Bool(false)
    };

    // Handle empty array
    ([]) => {
        $crate::Value::array(::std::vec::Vec::new())
    };

    // Handle non-empty array
    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::array(vec![$($crate::value!($elem)),*])
    };

    // Handle empty object
    ({}) => {
        $crate::Value::empty_object()
    };

    // Handle non-empty object
    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut properties = $crate::PropertyMap::new();
        $(
            properties.insert($key, $crate::value!($value));
        )*
        $crate::Value::from(properties)
    }};

    // Any other expression
    ($e:expr) => {
        $crate::Value::from($e)
    };
}
