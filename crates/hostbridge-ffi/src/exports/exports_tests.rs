#![allow(non_snake_case)]

use super::*;
use std::ffi::CStr;
use std::sync::Mutex;
use test_case::test_case;

static RECEIVED: Mutex<Vec<(u32, String)>> = Mutex::new(Vec::new());
// Serializes tests that register handlers
static HANDLER_TEST_LOCK: Mutex<()> = Mutex::new(());

extern "system" fn recording_handler(level: u32, message: *const c_char) {
    let text = unsafe { CStr::from_ptr(message) }
        .to_string_lossy()
        .into_owned();
    RECEIVED.lock().unwrap().push((level, text));
}

fn new_context(config: &str) -> u64 {
    let ctx = unsafe { nb_context_create(config.as_ptr(), config.len()) };
    assert_ne!(ctx, 0, "context creation failed for {}", config);
    ctx
}

// nb_context_create / nb_context_destroy

#[test]
fn nb_context_create___null_config___uses_defaults() {
    let ctx = unsafe { nb_context_create(ptr::null(), 0) };

    assert!(ctx > 0);
    let context = ContextManager::global().get(ctx).unwrap();
    assert_eq!(context.config(), &BoundaryConfig::default());
    assert_eq!(nb_context_destroy(ctx), NB_OK);
}

#[test]
fn nb_context_create___invalid_json___returns_zero() {
    let config = b"{not json";

    let ctx = unsafe { nb_context_create(config.as_ptr(), config.len()) };

    assert_eq!(ctx, 0);
}

#[test]
fn nb_context_create___unknown_log_level___returns_zero() {
    let config = br#"{"log_level": "chatty"}"#;

    let ctx = unsafe { nb_context_create(config.as_ptr(), config.len()) };

    assert_eq!(ctx, 0);
}

#[test]
fn nb_context_create___repeated___panic_hook_installed_once() {
    let first = new_context("{}");
    let second = new_context("{}");

    assert_ne!(first, 0);
    assert_ne!(second, 0);
    assert!(!install_panic_hook());
    nb_context_destroy(first);
    nb_context_destroy(second);
}

#[test]
fn nb_context_destroy___unknown_handle___invalid_handle_status() {
    assert_eq!(nb_context_destroy(999_999), -7);
}

#[test]
fn nb_context_destroy___default_context___invalid_handle_status() {
    assert_eq!(nb_context_destroy(crate::DEFAULT_CONTEXT), -7);
}

#[test]
fn nb_context_destroy___twice___second_is_invalid_handle() {
    let ctx = new_context("{}");

    assert_eq!(nb_context_destroy(ctx), NB_OK);
    assert_eq!(nb_context_destroy(ctx), -7);
}

// nb_encode

#[test]
fn nb_encode___fits___copies_and_terminates() {
    let mut buffer = [0xFFu8; 16];
    let mut truncated = true;

    let written = unsafe {
        nb_encode(0, c"hello".as_ptr(), buffer.as_mut_ptr(), 16, &mut truncated)
    };

    assert_eq!(written, 5);
    assert!(!truncated);
    assert_eq!(&buffer[..6], b"hello\0");
}

#[test]
fn nb_encode___capacity_four___hel_and_truncated() {
    let mut buffer = [0xFFu8; 4];
    let mut truncated = false;

    let written = unsafe {
        nb_encode(0, c"hello".as_ptr(), buffer.as_mut_ptr(), 4, &mut truncated)
    };

    assert_eq!(written, 3);
    assert!(truncated);
    assert_eq!(&buffer, b"hel\0");
}

#[test]
fn nb_encode___null_truncated_flag___still_writes() {
    let mut buffer = [0u8; 8];

    let written = unsafe {
        nb_encode(0, c"ok".as_ptr(), buffer.as_mut_ptr(), 8, ptr::null_mut())
    };

    assert_eq!(written, 2);
}

#[test_case(0 ; "zero capacity")]
#[test_case(-1 ; "negative capacity")]
fn nb_encode___non_positive_capacity___invalid_capacity_status(capacity: i32) {
    let mut buffer = [0xFFu8; 4];

    let status = unsafe {
        nb_encode(0, c"hi".as_ptr(), buffer.as_mut_ptr(), capacity, ptr::null_mut())
    };

    assert_eq!(status, -6);
    assert_eq!(buffer, [0xFF; 4]);
}

#[test]
fn nb_encode___null_destination___null_pointer_status() {
    let status = unsafe { nb_encode(0, c"hi".as_ptr(), ptr::null_mut(), 4, ptr::null_mut()) };

    assert_eq!(status, -1);
}

#[test]
fn nb_encode___null_source___null_pointer_status() {
    let mut buffer = [0u8; 4];

    let status = unsafe { nb_encode(0, ptr::null(), buffer.as_mut_ptr(), 4, ptr::null_mut()) };

    assert_eq!(status, -1);
}

#[test]
fn nb_encode___unknown_context___invalid_handle_status() {
    let mut buffer = [0u8; 4];

    let status = unsafe {
        nb_encode(424_242, c"hi".as_ptr(), buffer.as_mut_ptr(), 4, ptr::null_mut())
    };

    assert_eq!(status, -7);
}

// nb_decode_len

#[test]
fn nb_decode_len___utf8_text___counts_chars() {
    let len = unsafe { nb_decode_len(0, c"héllo".as_ptr(), -1) };

    assert_eq!(len, 5);
}

#[test]
fn nb_decode_len___invalid_utf8___invalid_encoding_status() {
    let bytes = [b'a', 0xC3, 0x28, 0];

    let status = unsafe { nb_decode_len(0, bytes.as_ptr() as *const c_char, -1) };

    assert_eq!(status, -3);
}

#[test]
fn nb_decode_len___ansi_context___never_invalid() {
    let ctx = new_context(r#"{"encoding": "ansi"}"#);
    let bytes = [b'a', 0xC3, 0x28, 0];

    let len = unsafe { nb_decode_len(ctx, bytes.as_ptr() as *const c_char, -1) };

    assert_eq!(len, 3);
    nb_context_destroy(ctx);
}

#[test]
fn nb_decode_len___length_hint___reads_at_most_hint() {
    let bytes = *b"abcdef";

    let len = unsafe { nb_decode_len(0, bytes.as_ptr() as *const c_char, 4) };

    assert_eq!(len, 4);
}

#[test]
fn nb_decode_len___null_source___null_pointer_status() {
    let status = unsafe { nb_decode_len(0, ptr::null(), -1) };

    assert_eq!(status, -1);
}

// nb_string_alloc / nb_string_free

#[test]
fn nb_string_alloc___then_free___no_live_strings() {
    let ctx = new_context("{}");

    let raw = unsafe { nb_string_alloc(ctx, c"returned".as_ptr()) };
    assert!(!raw.is_null());
    assert_eq!(unsafe { CStr::from_ptr(raw) }, c"returned");
    assert_eq!(nb_live_strings(ctx), 1);

    assert_eq!(unsafe { nb_string_free(ctx, raw) }, NB_OK);

    assert_eq!(nb_live_strings(ctx), 0);
    nb_context_destroy(ctx);
}

#[test]
fn nb_string_free___twice___double_release_status() {
    let ctx = new_context("{}");
    let raw = unsafe { nb_string_alloc(ctx, c"once".as_ptr()) };
    assert_eq!(unsafe { nb_string_free(ctx, raw) }, NB_OK);

    let second = unsafe { nb_string_free(ctx, raw) };

    assert_eq!(second, -5);
    nb_context_destroy(ctx);
}

#[test]
fn nb_string_free___null___ignored() {
    assert_eq!(unsafe { nb_string_free(0, ptr::null_mut()) }, NB_OK);
}

#[test]
fn nb_string_alloc___null_source___returns_null() {
    let raw = unsafe { nb_string_alloc(0, ptr::null()) };

    assert!(raw.is_null());
}

#[test]
fn nb_string_alloc___unknown_context___returns_null() {
    let raw = unsafe { nb_string_alloc(777_777, c"x".as_ptr()) };

    assert!(raw.is_null());
}

// nb_struct_read / nb_struct_write

#[test]
fn nb_struct_write___then_read___round_trips() {
    let mut slot = FixedStruct::default();
    let mut out = FixedStruct::default();

    assert_eq!(unsafe { nb_struct_write(&mut slot, FixedStruct::new(42, 43)) }, NB_OK);
    assert_eq!(unsafe { nb_struct_read(&slot, &mut out) }, NB_OK);

    assert_eq!(out, FixedStruct { a: 42, b: 43 });
}

#[test]
fn nb_struct_read___null_source___null_pointer_status() {
    let mut out = FixedStruct::default();

    assert_eq!(unsafe { nb_struct_read(ptr::null(), &mut out) }, -1);
}

#[test]
fn nb_struct_write___null_destination___null_pointer_status() {
    assert_eq!(unsafe { nb_struct_write(ptr::null_mut(), FixedStruct::new(1, 2)) }, -1);
}

// nb_set_log_handler / nb_log / nb_set_log_level

#[test]
fn nb_log___without_handler___returns_zero_and_allocates_nothing() {
    let ctx = new_context("{}");

    let delivered = unsafe { nb_log(ctx, LogLevel::Error as u32, c"nobody".as_ptr()) };

    assert_eq!(delivered, 0);
    let context = ContextManager::global().get(ctx).unwrap();
    assert_eq!(context.ledger().stats().allocations, 0);
    nb_context_destroy(ctx);
}

#[test]
fn nb_log___with_handler___delivers_level_and_message() {
    let _guard = HANDLER_TEST_LOCK.lock().unwrap();
    RECEIVED.lock().unwrap().clear();
    let ctx = new_context("{}");
    assert_eq!(unsafe { nb_set_log_handler(ctx, Some(recording_handler)) }, NB_OK);

    let delivered = unsafe { nb_log(ctx, LogLevel::Info as u32, c"ready".as_ptr()) };

    assert_eq!(delivered, 1);
    assert_eq!(*RECEIVED.lock().unwrap(), vec![(1, "ready".to_string())]);
    assert_eq!(nb_live_strings(ctx), 0);
    nb_context_destroy(ctx);
}

#[test]
fn nb_set_log_handler___null___clears_registration() {
    let _guard = HANDLER_TEST_LOCK.lock().unwrap();
    let ctx = new_context("{}");
    unsafe { nb_set_log_handler(ctx, Some(recording_handler)) };

    assert_eq!(unsafe { nb_set_log_handler(ctx, None) }, NB_OK);

    assert_eq!(unsafe { nb_log(ctx, 1, c"dropped".as_ptr()) }, 0);
    nb_context_destroy(ctx);
}

#[test]
fn nb_log___off_level___not_delivered() {
    let _guard = HANDLER_TEST_LOCK.lock().unwrap();
    let ctx = new_context("{}");
    unsafe { nb_set_log_handler(ctx, Some(recording_handler)) };

    let delivered = unsafe { nb_log(ctx, LogLevel::Off as u32, c"silent".as_ptr()) };

    assert_eq!(delivered, 0);
    nb_context_destroy(ctx);
}

#[test]
fn nb_set_log_level___sets_context_filter() {
    let ctx = new_context("{}");

    assert_eq!(nb_set_log_level(ctx, LogLevel::Error as u32), NB_OK);

    let context = ContextManager::global().get(ctx).unwrap();
    assert_eq!(context.sink().level(), LogLevel::Error);
    nb_context_destroy(ctx);
}

#[test]
fn nb_set_log_level___unknown_context___invalid_handle_status() {
    assert_eq!(nb_set_log_level(888_888, 1), -7);
}

#[test]
fn nb_live_strings___unknown_context___zero() {
    assert_eq!(nb_live_strings(555_555), 0);
}
