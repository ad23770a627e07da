//! Panic handling for FFI boundaries
//!
//! A panic unwinding into the host runtime is undefined behavior, so every
//! export runs its body through [`catch_panic`].

use hostbridge_core::{MarshalError, MarshalResult};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::panic;

/// Set once the tracing panic hook has been installed
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Run `f`, converting a panic into [`MarshalError::Internal`]
///
/// The panic is logged via tracing together with the context id the call
/// was made for (`0` for the default context or calls without one).
///
/// # Example
///
/// ```ignore
/// #[unsafe(no_mangle)]
/// pub unsafe extern "C" fn nb_live_strings(ctx: u64) -> u64 {
///     catch_panic(ctx, || live_strings_impl(ctx)).unwrap_or(0)
/// }
/// ```
pub fn catch_panic<F, R>(context_id: u64, f: F) -> MarshalResult<R>
where
    F: FnOnce() -> R + panic::UnwindSafe,
{
    panic::catch_unwind(f).map_err(|panic_info| {
        let panic_msg = panic_to_string(&panic_info);

        tracing::error!(context = context_id, "FFI panic caught: {}", panic_msg);

        MarshalError::Internal(panic_msg)
    })
}

/// Convert a panic payload to a human-readable string
fn panic_to_string(panic_info: &Box<dyn Any + Send>) -> String {
    match payload_str(panic_info.as_ref()) {
        Some(s) => format!("boundary call panicked: {}", s),
        None => "boundary call panicked with unknown payload".to_string(),
    }
}

fn payload_str(payload: &(dyn Any + Send)) -> Option<&str> {
    if let Some(s) = payload.downcast_ref::<&str>() {
        Some(s)
    } else {
        payload.downcast_ref::<String>().map(|s| s.as_str())
    }
}

/// Install a panic hook that reports panics through tracing
///
/// With the host logging layer installed, the report reaches the host's log
/// handler at `Error` level. The hook is process-wide and installed at most
/// once; later calls leave whatever hook is current untouched.
///
/// Returns `true` if this call installed the hook.
pub fn install_panic_hook() -> bool {
    let mut installed = false;
    PANIC_HOOK.get_or_init(|| {
        set_tracing_hook();
        installed = true;
    });
    installed
}

fn set_tracing_hook() {
    panic::set_hook(Box::new(|panic_info| {
        let payload = payload_str(panic_info.payload()).unwrap_or("Box<dyn Any>");

        let msg = match panic_info.location() {
            Some(location) => format!(
                "Panic at {}:{}:{}: {}",
                location.file(),
                location.line(),
                location.column(),
                payload
            ),
            None => format!("Panic at unknown location: {}", payload),
        };

        tracing::error!("PANIC: {}", msg);
    }));
}
