#![allow(non_snake_case)]

use super::*;
use test_case::test_case;

// encode tests

#[test]
fn encode___hello_into_four_bytes___truncates_to_hel() {
    let mut buffer = [0xAAu8; 4];

    let outcome = encode("hello", &mut buffer, Encoding::Utf8);

    assert_eq!(&buffer, b"hel\0");
    assert_eq!(outcome.bytes_written, 3);
    assert!(outcome.truncated);
}

#[test]
fn encode___exact_fit___not_truncated() {
    let mut buffer = [0xAAu8; 6];

    let outcome = encode("hello", &mut buffer, Encoding::Utf8);

    assert_eq!(&buffer, b"hello\0");
    assert_eq!(outcome.bytes_written, 5);
    assert!(!outcome.truncated);
    assert_eq!(outcome.required, 6);
}

#[test]
fn encode___empty_text___writes_single_terminator() {
    let mut buffer = [0xAAu8; 3];

    let outcome = encode("", &mut buffer, Encoding::Utf8);

    assert_eq!(buffer, [0, 0xAA, 0xAA]);
    assert_eq!(outcome.bytes_written, 0);
    assert!(!outcome.truncated);
}

#[test]
fn encode___zero_capacity___writes_nothing() {
    let mut buffer: [u8; 0] = [];

    let outcome = encode("abc", &mut buffer, Encoding::Utf8);

    assert_eq!(outcome.bytes_written, 0);
    assert!(outcome.truncated);
}

#[test]
fn encode___capacity_one___only_terminator() {
    let mut buffer = [0xAAu8; 1];

    let outcome = encode("abc", &mut buffer, Encoding::Utf8);

    assert_eq!(buffer, [0]);
    assert!(outcome.truncated);
}

#[test]
fn encode___multibyte_char_at_edge___not_split() {
    let mut buffer = [0xAAu8; 3];

    let outcome = encode("aé", &mut buffer, Encoding::Utf8);

    assert_eq!(&buffer[..2], b"a\0");
    assert_eq!(outcome.bytes_written, 1);
    assert!(outcome.truncated);
}

#[test]
fn encode___ansi___one_byte_per_char() {
    let mut buffer = [0u8; 8];

    let outcome = encode("café", &mut buffer, Encoding::Ansi);

    assert_eq!(&buffer[..5], &[b'c', b'a', b'f', 0xE9, 0]);
    assert_eq!(outcome.bytes_written, 4);
    assert!(!outcome.truncated);
}

#[test]
fn encode___embedded_nul___copied_verbatim() {
    let mut buffer = [0xAAu8; 8];

    let outcome = encode("ab\0cd", &mut buffer, Encoding::Utf8);

    assert_eq!(&buffer[..6], b"ab\0cd\0");
    assert_eq!(outcome.bytes_written, 5);
}

#[test_case(5, 3, true)]
#[test_case(5, 5, true)]
#[test_case(5, 6, false)]
#[test_case(0, 1, false)]
fn encode___truncated_iff_length_plus_one_exceeds_capacity(
    len: usize,
    capacity: usize,
    expected: bool,
) {
    let text = "x".repeat(len);
    let mut buffer = vec![0u8; capacity];

    let outcome = encode(&text, &mut buffer, Encoding::Utf8);

    assert_eq!(outcome.truncated, expected);
}

// EncodeOutcome tests

#[test]
fn EncodeOutcome___into_strict_truncated___buffer_too_small() {
    let mut buffer = [0u8; 4];

    let result = encode("hello", &mut buffer, Encoding::Utf8).into_strict();

    assert_eq!(
        result,
        Err(MarshalError::BufferTooSmall {
            required: 6,
            capacity: 4,
        })
    );
}

#[test]
fn EncodeOutcome___into_strict_fits___returns_bytes_written() {
    let mut buffer = [0u8; 16];

    let result = encode("hello", &mut buffer, Encoding::Utf8).into_strict();

    assert_eq!(result, Ok(5));
}

// encode_raw tests

#[test]
fn encode_raw___null_destination___null_pointer_error() {
    let result = unsafe { encode_raw("abc", std::ptr::null_mut(), 8, Encoding::Utf8) };

    assert_eq!(result, Err(MarshalError::NullPointer));
}

#[test_case(0)]
#[test_case(-1)]
#[test_case(i32::MIN)]
fn encode_raw___non_positive_capacity___rejected_before_write(capacity: i32) {
    let mut byte = 0xAAu8;

    let result = unsafe { encode_raw("abc", &mut byte, capacity, Encoding::Utf8) };

    assert_eq!(result, Err(MarshalError::InvalidCapacity(capacity)));
    assert_eq!(byte, 0xAA);
}

#[test]
fn encode_raw___valid_buffer___writes_within_capacity() {
    let mut buffer = [0xAAu8; 8];

    let outcome = unsafe { encode_raw("hello", buffer.as_mut_ptr(), 4, Encoding::Utf8) }.unwrap();

    assert_eq!(&buffer[..4], b"hel\0");
    assert_eq!(&buffer[4..], &[0xAA; 4]);
    assert!(outcome.truncated);
}

// decode tests

#[test]
fn decode___null_pointer___typed_error() {
    let result = unsafe { decode(std::ptr::null(), None, Encoding::Utf8) };

    assert_eq!(result, Err(MarshalError::NullPointer));
}

#[test]
fn decode___null_terminated___reads_to_terminator() {
    let source = b"ready\0ignored";

    let result = unsafe { decode(source.as_ptr() as *const c_char, None, Encoding::Utf8) };

    assert_eq!(result.unwrap(), "ready");
}

#[test]
fn decode___length_hint___stops_at_hint() {
    let source = b"abcdef";

    let result = unsafe { decode(source.as_ptr() as *const c_char, Some(3), Encoding::Utf8) };

    assert_eq!(result.unwrap(), "abc");
}

#[test]
fn decode___length_hint_past_terminator___stops_at_terminator() {
    let source = b"ab\0cdef";

    let result = unsafe { decode(source.as_ptr() as *const c_char, Some(7), Encoding::Utf8) };

    assert_eq!(result.unwrap(), "ab");
}

#[test]
fn decode___invalid_utf8___invalid_encoding() {
    let source = [b'a', 0xC3, 0x28, 0];

    let result = unsafe { decode(source.as_ptr() as *const c_char, None, Encoding::Utf8) };

    assert_eq!(
        result,
        Err(MarshalError::InvalidEncoding {
            encoding: Encoding::Utf8,
            position: 1,
        })
    );
}

#[test]
fn decode___ansi_high_bytes___latin1_text() {
    let source = [b'n', 0xE9, 0];

    let result = unsafe { decode(source.as_ptr() as *const c_char, None, Encoding::Ansi) };

    assert_eq!(result.unwrap(), "né");
}

// allocate_for_return / release tests

#[test]
fn allocate_for_return___decode_round_trip___equals_input() {
    let string = allocate_for_return("round trip", Encoding::Utf8).unwrap();

    let decoded = unsafe { decode(string.as_ptr(), None, Encoding::Utf8) }.unwrap();

    assert_eq!(decoded, "round trip");
    release(string);
}

#[test]
fn allocate_for_return___null_terminated() {
    let string = allocate_for_return("abc", Encoding::Utf8).unwrap();

    assert_eq!(string.as_bytes_with_nul(), b"abc\0");
    release(string);
}

#[test]
fn allocate_for_return___interior_nul___rejected() {
    let result = allocate_for_return("ab\0c", Encoding::Utf8);

    assert_eq!(result.unwrap_err(), MarshalError::InteriorNul { position: 2 });
}

#[test]
fn allocate_for_return___empty_text___single_terminator() {
    let string = allocate_for_return("", Encoding::Ansi).unwrap();

    assert!(string.is_empty());
    assert_eq!(string.as_bytes_with_nul(), &[0]);
    release(string);
}

// NativeStr tests

#[test]
fn NativeStr___from_bytes___stops_at_nul() {
    let view = NativeStr::from_bytes(b"abc\0def");

    assert_eq!(view.as_bytes(), b"abc");
    assert_eq!(view.len(), 3);
}

#[test]
fn NativeStr___from_ptr_null___null_pointer() {
    let result = unsafe { NativeStr::from_ptr(std::ptr::null()) };

    assert_eq!(result, Err(MarshalError::NullPointer));
}

#[test]
fn NativeStr___from_ptr_bounded_zero___empty_view() {
    let source = b"abc\0";

    let view = unsafe { NativeStr::from_ptr_bounded(source.as_ptr() as *const c_char, 0) }.unwrap();

    assert!(view.is_empty());
}
