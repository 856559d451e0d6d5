/*!
A codec for a legacy dialect of the Concise Binary Object Representation.

Every data item is framed by an initial byte whose top three bits select the
major type and whose low five bits carry the additional information: operands
through `0x1b` inline, wider operands behind the big-endian width escapes
`0x1c..=0x1f`. Major 6 is the simple/float space, major 7 the tag space.

**This dialect is not bit-compatible with RFC 7049 / RFC 8949.** The RFC
places its width escapes at 24..=27 and swaps the simple and tag spaces;
bytes produced here will not be understood by a conforming RFC codec, or
vice versa. Indefinite-length items, bignums and canonical (shortest-form)
encoding are not part of the dialect.

# Encoding and decoding

[`encode::pack`] serializes an [`Item`] tree into a byte sequence;
[`decode::unpack`] reconstructs one item from the front of a buffer:

```rust
use ursa_cbor::{decode, encode, Item};

let bytes = encode::pack(&Item::Array(vec![
    Item::Unsigned(1),
    Item::Text("two".into()),
])).unwrap();

let (item, _) = decode::unpack(&bytes).unwrap();
assert_eq!(item, Item::Array(vec![Item::Unsigned(1), Item::Text("two".into())]));
```

Registries extend both directions: [`encode::Packer`] dispatches host-domain
values by runtime type, [`decode::Unpacker`] post-processes tagged items
into rich values (dates, URIs, regexes by default).

# Incremental sources

The parser reads from a [`buffer::ByteBuffer`], an asynchronous byte source
that suspends the decode whenever the next field has not arrived yet.
[`stream::StreamParser`] feeds such a source chunk by chunk and yields one
item per completed decode; [`stream::ItemCodec`] adapts the same machinery
to [`tokio_util::codec::Decoder`] for `AsyncRead` inputs.
*/

pub mod buffer;
pub mod decode;
pub mod encode;
pub mod stream;

mod item;
mod wire;

pub use item::{Item, SimpleRangeError, SimpleValue};



#[cfg(test)]
mod encode_tests;
