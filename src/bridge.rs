use log::{debug, info, warn};

use crate::{error::Result, weak_imports::libfuzzer_mutate_fn, Engine};

/// Prefix that makes [`test_one_input`] crash.
pub const CRASH_TRIGGER: &[u8] = b"boommm";

/// The host fuzzer's own mutator, used for inputs the engine cannot start
/// from.
pub trait HostMutator {
    /// Mutates `buf[..size]` in place using `buf` as capacity. Returns the new
    /// size.
    fn mutate(&mut self, buf: &mut [u8], size: usize) -> usize;
}

/// Calls `LLVMFuzzerMutate` when the host provides it. Without it the input
/// is returned unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibFuzzerHost;

impl HostMutator for LibFuzzerHost {
    fn mutate(&mut self, buf: &mut [u8], size: usize) -> usize {
        match libfuzzer_mutate_fn() {
            Some(host_mutate) => unsafe { host_mutate(buf.as_mut_ptr(), size, buf.len()) },
            None => {
                debug!("LLVMFuzzerMutate is not available");
                size
            }
        }
    }
}

/// Glue between a coverage-guided fuzzer and the engine. Holds the single
/// engine the fuzzer's callbacks share.
#[derive(Debug)]
pub struct Bridge<H> {
    engine: Option<Engine>,
    host: H,
    engine_calls: usize,
}

impl<H: HostMutator> Bridge<H> {
    pub fn new(host: H) -> Self {
        Bridge {
            engine: None,
            host,
            engine_calls: 0,
        }
    }

    /// Creates the engine with the default mutators. Calling it again keeps
    /// the existing engine.
    pub fn initialize(&mut self) -> Result<&mut Engine> {
        let engine = match self.engine.take() {
            Some(engine) => engine,
            None => {
                let mut engine = Engine::new()?;
                engine.set_mutators("default")?;
                info!("custom mutator initialized");
                engine
            }
        };

        Ok(self.engine.insert(engine))
    }

    /// Mutates `buf[..size]` in place. The result is at most `max_size` bytes
    /// and never exceeds the buffer. Empty inputs go to the host mutator.
    pub fn custom_mutate(&mut self, buf: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
        let capacity = max_size.min(buf.len());
        if size == 0 {
            return self.host.mutate(&mut buf[..capacity], size);
        }

        match self.initialize() {
            Ok(engine) => {
                let len = engine.mutate_in_place(buf, size, max_size, u64::from(seed));
                self.engine_calls += 1;
                len
            }
            Err(e) => {
                warn!("engine unavailable, input left as is: {}", e);
                size.min(capacity)
            }
        }
    }

    pub fn engine(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Number of inputs handed to the engine so far.
    pub fn engine_calls(&self) -> usize {
        self.engine_calls
    }
}

pub fn is_crash_trigger(data: &[u8]) -> bool {
    data.starts_with(CRASH_TRIGGER)
}

/// Example target: crashes on inputs starting with [`CRASH_TRIGGER`] and
/// returns 0 for everything else.
pub fn test_one_input(data: &[u8]) -> i32 {
    if is_crash_trigger(data) {
        crash();
    }

    0
}

fn crash() -> ! {
    warn!("crash trigger found, crashing");
    unsafe {
        std::ptr::read_volatile(0x4141 as *const u8);
    }
    std::process::abort()
}

/// The libFuzzer entry points, backed by one process-wide [`Bridge`].
#[cfg(feature = "libfuzzer_harness")]
#[allow(non_snake_case)]
pub mod harness {
    use std::sync::{Mutex, MutexGuard, PoisonError};

    use libc::{c_char, c_int, c_uint};
    use log::error;
    use once_cell::sync::OnceCell;

    use super::{test_one_input, Bridge, LibFuzzerHost};

    static BRIDGE: OnceCell<Mutex<Bridge<LibFuzzerHost>>> = OnceCell::new();

    fn bridge() -> MutexGuard<'static, Bridge<LibFuzzerHost>> {
        BRIDGE
            .get_or_init(|| Mutex::new(Bridge::new(LibFuzzerHost)))
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[no_mangle]
    pub extern "C" fn LLVMFuzzerInitialize(
        _argc: *mut c_int,
        _argv: *mut *mut *mut c_char,
    ) -> c_int {
        match bridge().initialize() {
            Ok(_) => 0,
            Err(e) => {
                error!("failed to initialize custom mutator: {}", e);
                1
            }
        }
    }

    #[no_mangle]
    pub extern "C" fn LLVMFuzzerCustomMutator(
        data: *mut u8,
        size: usize,
        max_size: usize,
        seed: c_uint,
    ) -> usize {
        if data.is_null() {
            return 0;
        }

        let buf = unsafe { std::slice::from_raw_parts_mut(data, max_size.max(size)) };
        bridge().custom_mutate(buf, size, max_size, seed)
    }

    #[no_mangle]
    pub extern "C" fn LLVMFuzzerTestOneInput(data: *const u8, size: usize) -> c_int {
        if data.is_null() || size == 0 {
            return 0;
        }

        test_one_input(unsafe { std::slice::from_raw_parts(data, size) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crash_trigger_prefix() {
        assert!(is_crash_trigger(b"boommm!"));
        assert!(is_crash_trigger(b"boommm"));
        assert!(!is_crash_trigger(b"boomm"));
        assert!(!is_crash_trigger(b"hello!"));
        assert_eq!(test_one_input(b"hello!"), 0);
        assert_eq!(test_one_input(b""), 0);
    }

    #[test]
    fn missing_host_mutator_keeps_empty_input() {
        let mut buf = [0u8; 8];
        assert_eq!(LibFuzzerHost.mutate(&mut buf, 0), 0);
    }
}
