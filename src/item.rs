use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Simple value {0} out of range")]
pub struct SimpleRangeError(pub i64);

/// A simple ("unallocated") value: a one-byte code in the simple space that
/// carries no payload of its own.
///
/// The wire reserves codes 24..=27 of the inline range for false, true, null
/// and undefined, so a `SimpleValue` in that band encodes as one of those
/// primitives rather than round-tripping as a simple value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleValue(u8);

impl SimpleValue {
    pub fn new(value: i64) -> Result<Self, SimpleRangeError> {
        u8::try_from(value)
            .map(Self)
            .map_err(|_| SimpleRangeError(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl From<u8> for SimpleValue {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

/// A single decoded or to-be-encoded data item.
///
/// The first twelve variants are the wire-level item families. `Timestamp`,
/// `Uri` and `Regex` are the rich values produced by the default tag
/// decoders (tags 11, 15 and 23); they can appear anywhere in a decoded
/// tree, including inside arrays and maps.
#[derive(Debug, Clone)]
pub enum Item {
    Unsigned(u64),
    /// An integer strictly less than zero.
    Negative(i64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Item>),
    /// Key/value pairs in the order they appear on the wire. Duplicate keys
    /// are preserved; folding into an associative container is left to the
    /// caller.
    Map(Vec<(Item, Item)>),
    Simple(SimpleValue),
    /// A tag the decode registry did not recognise, with its inner item.
    Tagged(u64, Box<Item>),
    Bool(bool),
    Null,
    Undefined,
    Float(f64),
    Timestamp(time::OffsetDateTime),
    Uri(url::Url),
    Regex(regex::Regex),
}

impl Item {
    pub fn type_name(&self) -> &'static str {
        match self {
            Item::Unsigned(_) => "Unsigned Integer",
            Item::Negative(_) => "Negative Integer",
            Item::Bytes(_) => "Byte String",
            Item::Text(_) => "Text String",
            Item::Array(_) => "Array",
            Item::Map(_) => "Map",
            Item::Simple(_) => "Simple Value",
            Item::Tagged(..) => "Tagged Item",
            Item::Bool(_) => "Boolean",
            Item::Null => "Null",
            Item::Undefined => "Undefined",
            Item::Float(_) => "Float",
            Item::Timestamp(_) => "Timestamp",
            Item::Uri(_) => "Uri",
            Item::Regex(_) => "Regex",
        }
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Item::Unsigned(a), Item::Unsigned(b)) => a == b,
            (Item::Negative(a), Item::Negative(b)) => a == b,
            (Item::Bytes(a), Item::Bytes(b)) => a == b,
            (Item::Text(a), Item::Text(b)) => a == b,
            (Item::Array(a), Item::Array(b)) => a == b,
            (Item::Map(a), Item::Map(b)) => a == b,
            (Item::Simple(a), Item::Simple(b)) => a == b,
            (Item::Tagged(t1, a), Item::Tagged(t2, b)) => t1 == t2 && a == b,
            (Item::Bool(a), Item::Bool(b)) => a == b,
            (Item::Null, Item::Null) => true,
            (Item::Undefined, Item::Undefined) => true,
            (Item::Float(a), Item::Float(b)) => a == b,
            (Item::Timestamp(a), Item::Timestamp(b)) => a == b,
            (Item::Uri(a), Item::Uri(b)) => a == b,
            // Compiled regexes compare by pattern source
            (Item::Regex(a), Item::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl From<u64> for Item {
    fn from(value: u64) -> Self {
        Item::Unsigned(value)
    }
}

impl From<i64> for Item {
    fn from(value: i64) -> Self {
        if value < 0 {
            Item::Negative(value)
        } else {
            Item::Unsigned(value as u64)
        }
    }
}

impl From<bool> for Item {
    fn from(value: bool) -> Self {
        Item::Bool(value)
    }
}

impl From<f64> for Item {
    fn from(value: f64) -> Self {
        Item::Float(value)
    }
}

impl From<&str> for Item {
    fn from(value: &str) -> Self {
        Item::Text(value.to_string())
    }
}

impl From<String> for Item {
    fn from(value: String) -> Self {
        Item::Text(value)
    }
}

impl From<Vec<u8>> for Item {
    fn from(value: Vec<u8>) -> Self {
        Item::Bytes(value)
    }
}

impl From<Vec<Item>> for Item {
    fn from(value: Vec<Item>) -> Self {
        Item::Array(value)
    }
}
