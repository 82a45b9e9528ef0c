use cbor_core::prelude::*;
use hex_literal::hex;

fn decoder(bytes: &[u8]) -> Decoder<'_> {
    Decoder::new(bytes, DecoderConfig::default()).unwrap()
}

#[test]
fn empty_map_round_trips() {
    let bytes = hex!("a0");
    let mut d = decoder(&bytes);
    let item = d.get_next().unwrap();
    assert!(matches!(item.case(), ItemCase::Map(Count::Definite(0))));
    assert_eq!(item.next_level(), 0);
    d.finish().unwrap();

    let mut buf = [0u8; 4];
    let mut enc = Encoder::new(&mut buf, EncoderConfig::default());
    enc.open_map(0).unwrap();
    enc.close_map().unwrap();
    enc.finish().unwrap();
    assert_eq!(enc.written(), &bytes[..]);
}

#[test]
fn tagged_date_epoch_with_callback() {
    let bytes = hex!("c1 1a 5a 0b e0 c0");
    let mut d = decoder(&bytes);
    d.set_dispatch_table(standard_dispatch_table());
    let item = d.get_next().unwrap();
    assert!(matches!(item.case(), ItemCase::DateEpoch(s) if *s == 1_509_928_128.0));
    assert!(item.tags().is_empty());
    d.finish().unwrap();
}

#[test]
fn tagged_date_epoch_without_callback_keeps_tag_on_stack() {
    let bytes = hex!("c1 1a 5a 0b e0 c0");
    let mut d = decoder(&bytes);
    let item = d.get_next().unwrap();
    assert!(matches!(item.case(), ItemCase::SignedInt(1_509_928_128)));
    // Tag 1 is small enough to be stored inline, so any overflow table
    // (even an empty throwaway one) reads it back correctly.
    let overflow = TagOverflowTable::new(0);
    assert_eq!(item.tags().to_vec(&overflow), vec![1]);
    d.finish().unwrap();
}

#[test]
fn indefinite_text_string_needs_an_allocator() {
    // indefinite text string chunked "Hello" + "_wor" + "ld!"
    let raw: [u8; 18] = [
        0x7f, // indefinite text string
        0x65, b'H', b'e', b'l', b'l', b'o', // "Hello"
        0x64, b'_', b'w', b'o', b'r', // "_wor"
        0x63, b'l', b'd', b'!', // "ld!"
        0xff,
    ];

    let mut without_allocator = decoder(&raw);
    assert!(matches!(without_allocator.get_next(), Err(Error::NoStringAllocator)));

    let mut pool = [0u8; 64];
    let mut alloc = BumpAllocator::new(&mut pool).unwrap();
    let mut d = decoder(&raw);
    d.set_allocator(&mut alloc);
    let item = d.get_next().unwrap();
    assert!(matches!(item.case(), ItemCase::TextString(s) if *s == "Hello_world!"));
    d.finish().unwrap();
}

#[test]
fn nested_array_with_break_tracks_levels() {
    let bytes = hex!("9f 01 9f 02 03 ff 04 ff");
    let mut d = decoder(&bytes);

    let outer = d.get_next().unwrap();
    assert!(matches!(outer.case(), ItemCase::Array(Count::Indefinite)));
    assert_eq!(outer.level(), 0);

    let one = d.get_next().unwrap();
    assert!(matches!(one.case(), ItemCase::SignedInt(1)));
    assert_eq!(one.level(), 1);

    let inner = d.get_next().unwrap();
    assert!(matches!(inner.case(), ItemCase::Array(Count::Indefinite)));
    assert_eq!(inner.level(), 1);

    let two = d.get_next().unwrap();
    assert!(matches!(two.case(), ItemCase::SignedInt(2)));
    assert_eq!(two.level(), 2);

    let three = d.get_next().unwrap();
    assert!(matches!(three.case(), ItemCase::SignedInt(3)));
    assert_eq!(three.level(), 2);
    assert_eq!(three.next_level(), 1);

    let four = d.get_next().unwrap();
    assert!(matches!(four.case(), ItemCase::SignedInt(4)));
    assert_eq!(four.level(), 1);
    assert_eq!(four.next_level(), 0);

    d.finish().unwrap();
}

#[test]
fn map_as_array_mode_surfaces_unlabeled_items() {
    let bytes = hex!("a2 01 02 03 04");

    let mut default_mode = decoder(&bytes);
    let map = default_mode.get_next().unwrap();
    assert!(matches!(map.case(), ItemCase::Map(Count::Definite(4))));
    let first = default_mode.get_next().unwrap();
    assert!(matches!(first.label(), Some(Label::Signed(1))));
    assert!(matches!(first.case(), ItemCase::SignedInt(2)));
    let second = default_mode.get_next().unwrap();
    assert!(matches!(second.label(), Some(Label::Signed(3))));
    assert!(matches!(second.case(), ItemCase::SignedInt(4)));
    default_mode.finish().unwrap();

    let config = DecoderConfig::new(DecoderFlags::MAP_AS_ARRAY, Default::default()).unwrap();
    let mut array_mode = Decoder::new(&bytes, config).unwrap();
    let arr = array_mode.get_next().unwrap();
    assert!(matches!(arr.case(), ItemCase::MapAsArray(Count::Definite(4))));
    for expected in [1, 2, 3, 4] {
        let item = array_mode.get_next().unwrap();
        assert!(item.label().is_none());
        assert!(matches!(item.case(), ItemCase::SignedInt(n) if *n == expected));
    }
    array_mode.finish().unwrap();
}

#[test]
fn bstr_wrapped_cbor_enters_and_exits() {
    // tag 24 wrapping a 5-byte bstr holding [1, [2, 3]]
    let bytes = hex!("d8 18 45 82 01 82 02 03");
    let mut d = decoder(&bytes);
    assert_eq!(d.next_tag_number(), Some(24));
    d.enter_bstr_wrapped().unwrap();

    let arr = d.get_next().unwrap();
    assert!(matches!(arr.case(), ItemCase::Array(Count::Definite(2))));
    let one = d.get_next().unwrap();
    assert!(matches!(one.case(), ItemCase::SignedInt(1)));
    let nested = d.get_next().unwrap();
    assert!(matches!(nested.case(), ItemCase::Array(Count::Definite(2))));
    let two = d.get_next().unwrap();
    assert!(matches!(two.case(), ItemCase::SignedInt(2)));
    let three = d.get_next().unwrap();
    assert!(matches!(three.case(), ItemCase::SignedInt(3)));

    d.exit_bstr_wrapped().unwrap();
    assert_eq!(d.remaining(), 0);
    d.finish().unwrap();
}

#[test]
fn preferred_form_head_lengths() {
    let cases: &[(i64, usize)] = &[(0, 1), (23, 1), (24, 2), (255, 2), (256, 3), (65535, 3), (65536, 5)];
    for &(value, expected_len) in cases {
        let mut buf = [0u8; 16];
        let mut enc = Encoder::new(&mut buf, EncoderConfig::default());
        enc.write_int(value).unwrap();
        assert_eq!(enc.position(), expected_len, "value {value}");
    }
}

#[test]
fn round_trip_through_decode_and_reencode() {
    let bytes = hex!("83 01 02 03");
    let mut d = decoder(&bytes);
    let arr = d.get_next().unwrap();
    let Count::Definite(n) = (match arr.case() {
        ItemCase::Array(c) => *c,
        _ => panic!("expected array"),
    }) else {
        panic!("expected definite array")
    };
    let mut values = Vec::new();
    for _ in 0..n {
        let item = d.get_next().unwrap();
        match item.case() {
            ItemCase::SignedInt(v) => values.push(*v),
            _ => panic!("expected int"),
        }
    }
    d.finish().unwrap();

    let mut buf = [0u8; 16];
    let mut enc = Encoder::new(&mut buf, EncoderConfig::default());
    enc.open_array(n).unwrap();
    for v in values {
        enc.write_int(v).unwrap();
    }
    enc.close_array().unwrap();
    enc.finish().unwrap();
    assert_eq!(enc.written(), &bytes[..]);
}
