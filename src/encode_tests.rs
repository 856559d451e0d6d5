use super::buffer::BufferStream;
use super::encode::*;
use super::item::{Item, SimpleValue};
use hex_literal::hex;

fn packed(item: &Item) -> Vec<u8> {
    pack(item).unwrap().to_vec()
}

#[test]
fn unsigned_framing() {
    // Operand widths across every framing threshold
    assert_eq!(packed(&Item::Unsigned(0)), hex!("00"));
    assert_eq!(packed(&Item::Unsigned(1)), hex!("01"));
    assert_eq!(packed(&Item::Unsigned(23)), hex!("17"));
    assert_eq!(packed(&Item::Unsigned(24)), hex!("18"));
    assert_eq!(packed(&Item::Unsigned(27)), hex!("1b"));
    assert_eq!(packed(&Item::Unsigned(28)), hex!("1c1c"));
    assert_eq!(packed(&Item::Unsigned(255)), hex!("1cff"));
    assert_eq!(packed(&Item::Unsigned(256)), hex!("1d0100"));
    assert_eq!(packed(&Item::Unsigned(65535)), hex!("1dffff"));
    assert_eq!(packed(&Item::Unsigned(65536)), hex!("1e00010000"));
    assert_eq!(packed(&Item::Unsigned(0x7fffffff)), hex!("1e7fffffff"));

    assert!(matches!(
        pack(&Item::Unsigned(1 << 31)),
        Err(Error::IntegerOutOfRange)
    ));
    assert!(matches!(
        pack(&Item::Unsigned(u64::MAX)),
        Err(Error::IntegerOutOfRange)
    ));
}

#[test]
fn negative_framing() {
    // -n - 1 encodes as the natural number n under major 1
    assert_eq!(packed(&Item::Negative(-1)), hex!("20"));
    assert_eq!(packed(&Item::Negative(-10)), hex!("29"));
    assert_eq!(packed(&Item::Negative(-24)), hex!("37"));
    assert_eq!(packed(&Item::Negative(-28)), hex!("3b"));
    assert_eq!(packed(&Item::Negative(-29)), hex!("3c1c"));
    assert_eq!(packed(&Item::Negative(-256)), hex!("3cff"));
    assert_eq!(packed(&Item::Negative(-257)), hex!("3d0100"));
    assert_eq!(packed(&Item::Negative(-65537)), hex!("3e00010000"));
    assert_eq!(packed(&Item::Negative(-(1 << 31))), hex!("3e7fffffff"));

    // encode(-n - 1) is the unsigned framing of n under major 1
    for n in [0u64, 23, 24, 255, 256, 65535, 65536, 0x7fffffff] {
        let negative = packed(&Item::Negative(-1 - n as i64));
        let unsigned = packed(&Item::Unsigned(n));
        assert_eq!(negative[0] >> 5, 1);
        assert_eq!(negative[0] & 0x1f, unsigned[0] & 0x1f);
        assert_eq!(negative[1..], unsigned[1..]);
    }

    assert!(matches!(
        pack(&Item::Negative(-(1 << 31) - 1)),
        Err(Error::IntegerOutOfRange)
    ));
    // The negative domain excludes zero and above
    assert!(matches!(
        pack(&Item::Negative(0)),
        Err(Error::IntegerOutOfRange)
    ));
    assert!(matches!(
        pack(&Item::Negative(5)),
        Err(Error::IntegerOutOfRange)
    ));
}

#[test]
fn strings_and_bytes() {
    assert_eq!(packed(&Item::Text(String::new())), hex!("60"));
    assert_eq!(packed(&"a".into()), hex!("6161"));
    assert_eq!(packed(&"IETF".into()), hex!("6449455446"));
    assert_eq!(packed(&"\u{00fc}".into()), hex!("62c3bc"));
    assert_eq!(packed(&"\u{6c34}".into()), hex!("63e6b0b4"));

    assert_eq!(packed(&Item::Bytes(Vec::new())), hex!("40"));
    assert_eq!(
        packed(&Item::Bytes(hex!("01020304").to_vec())),
        hex!("4401020304")
    );
}

#[test]
fn composites() {
    assert_eq!(packed(&Item::Array(Vec::new())), hex!("80"));
    assert_eq!(
        packed(&Item::Array(vec![1u64.into(), 2u64.into()])),
        hex!("820102")
    );
    assert_eq!(
        packed(&Item::Array(vec![
            1u64.into(),
            Item::Array(vec![2u64.into(), 3u64.into()]),
            Item::Array(vec![4u64.into(), 5u64.into()]),
        ])),
        hex!("8301820203820405")
    );

    assert_eq!(packed(&Item::Map(Vec::new())), hex!("a0"));
    assert_eq!(
        packed(&Item::Map(vec![("a".into(), 1u64.into())])),
        hex!("a1616101")
    );
    assert_eq!(
        packed(&Item::Map(vec![
            ("a".into(), 1u64.into()),
            ("b".into(), Item::Array(vec![2u64.into(), 3u64.into()])),
        ])),
        hex!("a26161016162820203")
    );
}

#[test]
fn length_framing_of_composites() {
    let bytes = packed(&Item::Bytes(vec![0u8; 300]));
    assert_eq!(bytes[..3], hex!("5d012c"));
    assert_eq!(bytes.len(), 303);

    let text = packed(&Item::Text("x".repeat(70000)));
    assert_eq!(text[..5], hex!("7e00011170"));
    assert_eq!(text.len(), 70005);

    let array = packed(&Item::Array(vec![Item::Unsigned(0); 40]));
    assert_eq!(array[..2], hex!("9c28"));
    assert_eq!(array.len(), 42);

    let map = packed(&Item::Map(vec![(Item::Unsigned(0), Item::Unsigned(0)); 40]));
    assert_eq!(map[..2], hex!("bc28"));
    assert_eq!(map.len(), 82);
}

#[test]
fn primitives() {
    assert_eq!(packed(&Item::Bool(true)), hex!("d9"));
    assert_eq!(packed(&Item::Bool(false)), hex!("d8"));
    assert_eq!(packed(&Item::Null), hex!("da"));
    assert_eq!(packed(&Item::Undefined), hex!("db"));
}

#[test]
fn simple_values() {
    assert_eq!(packed(&Item::Simple(SimpleValue::from(0))), hex!("c0"));
    assert_eq!(packed(&Item::Simple(SimpleValue::from(16))), hex!("d0"));
    assert_eq!(packed(&Item::Simple(SimpleValue::from(23))), hex!("d7"));
    assert_eq!(packed(&Item::Simple(SimpleValue::from(28))), hex!("dc1c"));
    assert_eq!(packed(&Item::Simple(SimpleValue::from(255))), hex!("dcff"));

    assert!(SimpleValue::new(0).is_ok());
    assert!(SimpleValue::new(255).is_ok());
    assert!(SimpleValue::new(256).is_err());
    assert!(SimpleValue::new(-1).is_err());
}

#[test]
fn numbers() {
    // Finite integral floats take the integer framing
    assert_eq!(packed(&Item::Float(0.0)), hex!("00"));
    assert_eq!(packed(&Item::Float(-0.0)), hex!("00"));
    assert_eq!(packed(&Item::Float(2.0)), hex!("02"));
    assert_eq!(packed(&Item::Float(-3.0)), hex!("22"));
    assert_eq!(packed(&Item::Float(255.0)), hex!("1cff"));

    // Everything else is an 8-byte big-endian double behind 0xdf
    assert_eq!(packed(&Item::Float(1.5)), hex!("df3ff8000000000000"));
    assert_eq!(packed(&Item::Float(1.1)), hex!("df3ff199999999999a"));
    assert_eq!(packed(&Item::Float(1.0e300)), hex!("df7e37e43c8800759c"));
    assert_eq!(
        packed(&Item::Float(f64::INFINITY)),
        hex!("df7ff0000000000000")
    );
    assert_eq!(
        packed(&Item::Float(f64::NEG_INFINITY)),
        hex!("dffff0000000000000")
    );
    let nan = packed(&Item::Float(f64::NAN));
    assert_eq!(nan.len(), 9);
    assert_eq!(nan[0], 0xdf);
    assert!(f64::from_be_bytes(nan[1..].try_into().unwrap()).is_nan());

    // Integral but outside the 31-bit operand range
    assert!(matches!(
        pack(&Item::Float(2147483648.0)),
        Err(Error::IntegerOutOfRange)
    ));
    assert!(matches!(
        pack(&Item::Float(-1.0e12)),
        Err(Error::IntegerOutOfRange)
    ));
}

#[test]
fn semantic_values() {
    let timestamp = time::OffsetDateTime::from_unix_timestamp(1363896240).unwrap();
    assert_eq!(packed(&Item::Timestamp(timestamp)), hex!("eb1e514b67b0"));

    let fractional =
        time::OffsetDateTime::from_unix_timestamp_nanos(1_363_896_240_500_000_000).unwrap();
    assert_eq!(
        packed(&Item::Timestamp(fractional)),
        hex!("ebdf41d452d9ec200000")
    );

    let mut expected = hex!("f7645e612b24").to_vec();
    assert_eq!(packed(&Item::Regex(regex::Regex::new("^a+$").unwrap())), expected);

    let url = url::Url::parse("http://example.com/").unwrap();
    expected = hex!("ef73").to_vec();
    expected.extend_from_slice(b"http://example.com/");
    assert_eq!(packed(&Item::Uri(url)), expected);

    assert_eq!(
        packed(&Item::Tagged(100, Box::new(Item::Unsigned(5)))),
        hex!("fc6405")
    );
}

#[test]
fn pack_into_appends() {
    let packer = Packer::new();
    let mut buf = BufferStream::new();
    packer.pack_into(&Item::Unsigned(1), &mut buf).unwrap();
    packer.pack_into(&"a".into(), &mut buf).unwrap();
    assert_eq!(*buf.flatten(), hex!("016161"));
}

#[test]
fn semantic_type_registry() {
    struct Opaque;

    let packer = Packer::new();

    // Default registrations cover dates, accumulated buffers and regexes
    let timestamp = time::OffsetDateTime::from_unix_timestamp(60).unwrap();
    assert_eq!(*packer.pack_any(&timestamp).unwrap(), hex!("eb1c3c"));

    let mut stream = BufferStream::new();
    stream.append(&hex!("dead"));
    assert_eq!(*packer.pack_any(&stream).unwrap(), hex!("42dead"));

    let regex = regex::Regex::new("^a+$").unwrap();
    assert_eq!(*packer.pack_any(&regex).unwrap(), hex!("f7645e612b24"));

    // Items fall through the registry untouched
    assert_eq!(*packer.pack_any(&Item::Unsigned(1)).unwrap(), hex!("01"));

    // Unregistered composites are declined, not reflected over
    assert!(matches!(packer.pack_any(&Opaque), Err(Error::UnknownType)));

    // Registration replaces and returns the prior encoder
    let mut packer = Packer::new();
    assert!(packer
        .add_semantic_type::<Opaque>(Box::new(|_, buf| {
            buf.write_u8(0xc1);
            Ok(())
        }))
        .is_none());
    assert_eq!(*packer.pack_any(&Opaque).unwrap(), hex!("c1"));

    let previous = packer.add_semantic_type::<Opaque>(Box::new(|_, buf| {
        buf.write_u8(0xc2);
        Ok(())
    }));
    assert!(previous.is_some());
    assert_eq!(*packer.pack_any(&Opaque).unwrap(), hex!("c2"));
}
