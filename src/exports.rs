use std::{ffi::CStr, ptr};

use libc::{c_char, c_int};
use log::{debug, warn};

use crate::{
    error::{Error, Result},
    Engine,
};

/// Status returned by the checked configuration functions on success.
pub const RADAMSA_OK: c_int = 0;
/// A handle or string argument was null.
pub const RADAMSA_ERR_NULL: c_int = -1;
/// A string argument was not valid UTF-8.
pub const RADAMSA_ERR_UTF8: c_int = -2;
/// A string argument did not name a valid selection.
pub const RADAMSA_ERR_SELECTION: c_int = -3;

unsafe fn engine_mut<'a>(ctx: *mut Engine) -> Result<&'a mut Engine> {
    ctx.as_mut().ok_or(Error::NullPointer("ctx"))
}

unsafe fn config_str<'a>(config: *const c_char) -> Result<&'a str> {
    if config.is_null() {
        return Err(Error::NullPointer("config"));
    }

    CStr::from_ptr(config)
        .to_str()
        .map_err(|_| Error::InvalidUtf8)
}

fn status(result: Result<()>) -> c_int {
    match result {
        Ok(()) => RADAMSA_OK,
        Err(Error::NullPointer(_)) => RADAMSA_ERR_NULL,
        Err(Error::InvalidUtf8) => RADAMSA_ERR_UTF8,
        Err(_) => RADAMSA_ERR_SELECTION,
    }
}

/// Creates an engine with the default mutators and patterns. The returned
/// handle must be released with [`rusty_radamsa_free`]. Returns null if the
/// engine could not be created.
#[no_mangle]
pub extern "C" fn rusty_radamsa_init() -> *mut Engine {
    match Engine::new() {
        Ok(engine) => Box::into_raw(Box::new(engine)),
        Err(e) => {
            warn!("failed to create engine: {}", e);
            ptr::null_mut()
        }
    }
}

/// Releases a handle created by [`rusty_radamsa_init`]. Null is ignored.
#[no_mangle]
pub extern "C" fn rusty_radamsa_free(ctx: *mut Engine) {
    if ctx.is_null() {
        return;
    }

    unsafe {
        drop(Box::from_raw(ctx));
    }
}

/// Selects the mutators, e.g. `"default"` or `"num=5,bd,bf"`. Invalid
/// selections are logged and leave the engine unchanged.
#[no_mangle]
pub extern "C" fn rusty_radamsa_set_mutator(ctx: *mut Engine, config: *const c_char) {
    if let Err(e) = unsafe { set_mutators(ctx, config) } {
        warn!("ignoring mutator selection: {}", e);
    }
}

/// Like [`rusty_radamsa_set_mutator`], but reports failures: 0 on success,
/// -1 for a null argument, -2 for invalid UTF-8 and -3 for an invalid
/// selection.
#[no_mangle]
pub extern "C" fn rusty_radamsa_try_set_mutator(ctx: *mut Engine, config: *const c_char) -> c_int {
    status(unsafe { set_mutators(ctx, config) })
}

/// Selects the patterns, e.g. `"default"` or `"od,nd=2,bu"`. Returns the same
/// status codes as [`rusty_radamsa_try_set_mutator`].
#[no_mangle]
pub extern "C" fn rusty_radamsa_set_patterns(ctx: *mut Engine, config: *const c_char) -> c_int {
    let result = unsafe { set_patterns(ctx, config) };
    if let Err(e) = &result {
        warn!("ignoring pattern selection: {}", e);
    }

    status(result)
}

unsafe fn set_mutators(ctx: *mut Engine, config: *const c_char) -> Result<()> {
    let engine = engine_mut(ctx)?;
    engine.set_mutators(config_str(config)?)
}

unsafe fn set_patterns(ctx: *mut Engine, config: *const c_char) -> Result<()> {
    let engine = engine_mut(ctx)?;
    engine.set_patterns(config_str(config)?)
}

/// Writes a mutated copy of `data[..size]` to `out` and returns its length,
/// which never exceeds `max_size`. `data` and `out` may overlap. The same
/// handle, input, `max_size` and `seed` always give the same output.
#[no_mangle]
pub extern "C" fn rusty_radamsa(
    ctx: *mut Engine,
    data: *const u8,
    size: usize,
    out: *mut u8,
    max_size: usize,
    seed: usize,
) -> usize {
    let engine = match unsafe { engine_mut(ctx) } {
        Ok(engine) => engine,
        Err(e) => {
            debug!("not mutating: {}", e);
            return 0;
        }
    };
    if out.is_null() || max_size == 0 || (data.is_null() && size > 0) {
        return 0;
    }

    // the input is copied out before anything is written to `out`
    if data.is_null() {
        engine.load_scratch(&[]);
    } else {
        engine.load_scratch(unsafe { std::slice::from_raw_parts(data, size) });
    }
    let output = engine.mutate_scratch(max_size, seed as u64);

    unsafe {
        ptr::copy_nonoverlapping(output.as_ptr(), out, output.len());
    }

    output.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(status(Ok(())), RADAMSA_OK);
        assert_eq!(status(Err(Error::NullPointer("ctx"))), RADAMSA_ERR_NULL);
        assert_eq!(status(Err(Error::InvalidUtf8)), RADAMSA_ERR_UTF8);
        assert_eq!(status(Err(Error::UnknownMutator("x".into()))), RADAMSA_ERR_SELECTION);
        assert_eq!(status(Err(Error::EmptySelection)), RADAMSA_ERR_SELECTION);
    }

    #[test]
    fn null_config_is_rejected() {
        let ctx = rusty_radamsa_init();
        assert_eq!(rusty_radamsa_try_set_mutator(ctx, ptr::null()), RADAMSA_ERR_NULL);
        assert_eq!(rusty_radamsa_set_patterns(ptr::null_mut(), ptr::null()), RADAMSA_ERR_NULL);
        rusty_radamsa_free(ctx);
    }
}
