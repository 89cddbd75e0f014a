//! Request parameter bags.
//!
//! Parameters arrive either as a JSON object body or as `application/x-www-form-urlencoded`
//! pairs (query string and form body). Form keys use bracket notation for nested values:
//! `moduleids[]=5&moduleids[]=6` becomes `{"moduleids": ["5", "6"]}` and
//! `filter_tags[0][tag]=os` becomes `{"filter_tags": {"0": {"tag": "os"}}}`.

use serde_json::{Map, Value};

pub type Params = Map<String, Value>;

/// Deepest bracket path accepted in a form key. Deeper keys are dropped.
pub const MAX_NESTING_LEVEL: usize = 64;

/// Build a parameter bag from decoded key/value pairs. Later keys win for scalars.
pub fn from_pairs<I, K, V>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut params = Params::new();
    for (key, value) in pairs {
        insert_pair(&mut params, key.as_ref(), Value::String(value.into()));
    }
    params
}

/// Parse a urlencoded string (query string or form body).
pub fn from_urlencoded(input: &[u8]) -> Params {
    from_pairs(url::form_urlencoded::parse(input).map(|(k, v)| (k.into_owned(), v.into_owned())))
}

/// Merge `overlay` into `base`, overlay values replacing base values at the top level.
pub fn merge(mut base: Params, overlay: Params) -> Params {
    for (key, value) in overlay {
        base.insert(key, value);
    }
    base
}

fn insert_pair(params: &mut Params, key: &str, value: Value) {
    let (name, path) = split_key(key);
    if name.is_empty() || path.len() > MAX_NESTING_LEVEL {
        return;
    }

    if path.is_empty() {
        params.insert(name.to_string(), value);
        return;
    }

    let slot = params.entry(name.to_string()).or_insert(Value::Null);
    insert_path(slot, &path, value);
}

fn insert_path(slot: &mut Value, path: &[&str], value: Value) {
    let Some((segment, rest)) = path.split_first() else {
        *slot = value;
        return;
    };

    if segment.is_empty() {
        // `name[]` appends
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            let mut child = Value::Null;
            insert_path(&mut child, rest, value);
            items.push(child);
        }
        return;
    }

    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(map) = slot {
        let child = map.entry(segment.to_string()).or_insert(Value::Null);
        insert_path(child, rest, value);
    }
}

/// Split `name[a][b]` into `("name", ["a", "b"])`. Malformed brackets keep the raw key.
fn split_key(key: &str) -> (&str, Vec<&str>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };

    let name = &key[..open];
    let mut path = Vec::new();
    let mut rest = &key[open..];

    while let Some(stripped) = rest.strip_prefix('[') {
        match stripped.find(']') {
            Some(close) => {
                path.push(&stripped[..close]);
                if path.len() > MAX_NESTING_LEVEL {
                    break;
                }
                rest = &stripped[close + 1..];
            }
            None => return (key, Vec::new()),
        }
    }

    if path.len() > MAX_NESTING_LEVEL {
        return (name, path);
    }

    if !rest.is_empty() {
        return (key, Vec::new());
    }

    (name, path)
}

/// Read a parameter as a string, accepting numbers too.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1".to_string() } else { "0".to_string() }),
        _ => None,
    }
}

/// Array elements of a parameter; PHP-style keyed arrays (objects) yield their values.
pub fn array_values(value: &Value) -> Option<Vec<&Value>> {
    match value {
        Value::Array(items) => Some(items.iter().collect()),
        Value::Object(map) => Some(map.values().collect()),
        _ => None,
    }
}
