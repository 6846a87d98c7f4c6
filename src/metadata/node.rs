use std::collections::HashMap;

use zbus::zvariant::{Dict, OwnedValue, Value};

/// Shape of a D-Bus reply, reduced to what is needed to dig strings out of MPRIS properties.
///
/// Strings, object paths and signatures all become `String`. A nested `v` becomes a `Variant`, an
/// array becomes an `Array` and a dictionary (array of dict entries) becomes a `Dict`. Every other
/// type is kept as `Unsupported`.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A string, object path or signature.
    String(String),
    /// A `v`, holding exactly one value.
    Variant(Box<Node>),
    /// Any array that is not a dictionary.
    Array(Vec<Node>),
    /// Dictionary entries, sorted by key.
    Dict(Vec<(String, Node)>),
    /// Every other D-Bus type.
    Unsupported,
}

impl Node {
    /// Wraps the value in a variant node. A value that already is a D-Bus variant is wrapped only
    /// once.
    pub fn variant(value: Value<'_>) -> Node {
        match value {
            Value::Value(inner) => Node::Variant(Box::new(Node::from(*inner))),
            other => Node::Variant(Box::new(Node::from(other))),
        }
    }

    /// Builds the reply of `Properties.Get` for a property of type `a{sv}`: a variant holding a
    /// dictionary whose values are variants.
    pub fn from_property_map(map: HashMap<String, OwnedValue>) -> Node {
        Node::Variant(Box::new(Node::from_variant_map(map)))
    }

    /// Builds a dictionary node from a decoded `a{sv}`, keeping the variant around each value.
    pub fn from_variant_map(map: HashMap<String, OwnedValue>) -> Node {
        let entries = map
            .into_iter()
            .map(|(key, value)| (key, Node::variant(Value::from(value))))
            .collect();

        Node::Dict(sorted(entries))
    }

    /// The value inside a variant node.
    pub fn as_variant(&self) -> Option<&Node> {
        if let Node::Variant(inner) = self {
            Some(inner)
        } else {
            None
        }
    }

    /// The elements of an array node.
    pub fn as_array(&self) -> Option<&[Node]> {
        if let Node::Array(items) = self {
            Some(items)
        } else {
            None
        }
    }

    /// The entries of a dictionary node.
    pub fn as_dict(&self) -> Option<&[(String, Node)]> {
        if let Node::Dict(entries) = self {
            Some(entries)
        } else {
            None
        }
    }

    /// The text of a string node.
    pub fn as_str(&self) -> Option<&str> {
        if let Node::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Scans a dictionary node for the first entry with the given key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_dict()?
            .iter()
            .find(|(entry_key, _)| entry_key == key)
            .map(|(_, value)| value)
    }

    /// Returns the first element of an array node.
    pub fn first(&self) -> Option<&Node> {
        self.as_array()?.first()
    }
}

// `a{?v}`: zvariant strips the variant off each value when converting the dict, so it has to be
// put back.
fn has_variant_values(dict: &Dict<'_, '_>) -> bool {
    let signature = dict.full_signature().as_str();
    signature.len() == 5 && signature.ends_with("v}")
}

fn sorted(mut entries: Vec<(String, Node)>) -> Vec<(String, Node)> {
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries
}

impl<'a> From<Value<'a>> for Node {
    fn from(value: Value<'a>) -> Self {
        match value {
            Value::Str(v) => Node::String(v.to_string()),
            Value::Signature(v) => Node::String(v.to_string()),
            Value::ObjectPath(v) => Node::String(v.to_string()),

            Value::Value(v) => Node::Variant(Box::new(Node::from(*v))),

            Value::Array(a) => match Vec::<Value<'_>>::try_from(a) {
                Ok(items) => Node::Array(items.into_iter().map(Node::from).collect()),
                Err(_) => Node::Unsupported,
            },

            Value::Dict(d) => {
                let variant_values = has_variant_values(&d);

                match HashMap::<String, Value<'_>>::try_from(d) {
                    Ok(map) => Node::Dict(sorted(
                        map.into_iter()
                            .map(|(key, value)| {
                                let value = if variant_values {
                                    Node::variant(value)
                                } else {
                                    Node::from(value)
                                };
                                (key, value)
                            })
                            .collect(),
                    )),
                    Err(_) => Node::Unsupported,
                }
            }

            _ => Node::Unsupported,
        }
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(String::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(entries: Vec<(&str, Node)>) -> Node {
        Node::Dict(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_owned(), value))
                .collect(),
        )
    }

    #[test]
    fn it_converts_strings_and_paths() {
        assert_eq!(Node::from(Value::from("hello")), Node::from("hello"));

        let path = zbus::zvariant::ObjectPath::try_from("/org/mpris/MediaPlayer2").unwrap();
        assert_eq!(
            Node::from(Value::ObjectPath(path)),
            Node::from("/org/mpris/MediaPlayer2")
        );
    }

    #[test]
    fn it_keeps_other_types_as_unsupported() {
        assert_eq!(Node::from(Value::U64(42)), Node::Unsupported);
        assert_eq!(Node::from(Value::Bool(true)), Node::Unsupported);
        assert_eq!(Node::from(Value::F64(0.5)), Node::Unsupported);
    }

    #[test]
    fn it_converts_string_arrays() {
        let value = Value::from(vec!["Eminem", "Nate Dogg"]);
        assert_eq!(
            Node::from(value),
            Node::Array(vec![Node::from("Eminem"), Node::from("Nate Dogg")])
        );
    }

    #[test]
    fn it_wraps_variants_once() {
        let wrapped = Value::Value(Box::new(Value::from("x")));
        assert_eq!(
            Node::variant(wrapped),
            Node::Variant(Box::new(Node::from("x")))
        );
        assert_eq!(
            Node::variant(Value::from("x")),
            Node::Variant(Box::new(Node::from("x")))
        );
    }

    #[test]
    fn it_builds_property_replies() {
        let mut map = HashMap::new();
        map.insert(String::from("xesam:title"), OwnedValue::from(Value::from("Stan")));

        let node = Node::from_property_map(map);

        let title = node
            .as_variant()
            .and_then(|n| n.get("xesam:title"))
            .and_then(Node::as_variant)
            .and_then(Node::as_str);
        assert_eq!(title, Some("Stan"));
    }

    #[test]
    fn it_keeps_the_variant_around_nested_dict_values() {
        let mut metadata = HashMap::new();
        metadata.insert("mpris:trackid", Value::from("spotify:track:abc"));
        metadata.insert("xesam:artist", Value::from(vec!["Eminem"]));

        let node = Node::from(Value::from(metadata));

        assert_eq!(
            node,
            dict(vec![
                ("mpris:trackid", Node::Variant(Box::new(Node::from("spotify:track:abc")))),
                (
                    "xesam:artist",
                    Node::Variant(Box::new(Node::Array(vec![Node::from("Eminem")])))
                ),
            ])
        );
    }

    #[test]
    fn it_converts_plain_dicts_without_variants() {
        let mut map = HashMap::new();
        map.insert("b", "second");
        map.insert("a", "first");

        assert_eq!(
            Node::from(Value::from(map)),
            dict(vec![("a", Node::from("first")), ("b", Node::from("second"))])
        );
    }

    #[test]
    fn it_keeps_variants_in_nested_property_maps() {
        let mut metadata = HashMap::new();
        metadata.insert("mpris:trackid", Value::from("spotify:track:abc"));

        let mut changed = HashMap::new();
        changed.insert(String::from("Metadata"), OwnedValue::from(Value::from(metadata)));

        let track_id = Node::from_variant_map(changed)
            .get("Metadata")
            .and_then(Node::as_variant)
            .and_then(|n| n.get("mpris:trackid"))
            .and_then(Node::as_variant)
            .and_then(Node::as_str)
            .map(String::from);
        assert_eq!(track_id, Some(String::from("spotify:track:abc")));
    }

    #[test]
    fn it_finds_the_first_matching_key() {
        let node = dict(vec![
            ("a", Node::from("first")),
            ("b", Node::from("other")),
            ("a", Node::from("second")),
        ]);

        assert_eq!(node.get("a"), Some(&Node::from("first")));
        assert_eq!(node.get("c"), None);
    }

    #[test]
    fn accessors_reject_the_wrong_shape() {
        let string = Node::from("s");
        assert_eq!(string.as_variant(), None);
        assert_eq!(string.as_array(), None);
        assert_eq!(string.as_dict(), None);
        assert_eq!(string.get("key"), None);
        assert_eq!(string.first(), None);

        assert_eq!(Node::Array(vec![]).first(), None);
        assert_eq!(Node::Unsupported.as_str(), None);
    }
}
