use std::{
    ffi::CStr,
    marker::PhantomData,
    mem,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Signature of the host's built-in mutator.
pub(crate) type HostMutateFn = unsafe extern "C" fn(*mut u8, usize, usize) -> usize;

/// Lazily resolved symbol that may be missing from the process.
pub(crate) struct Weak<F> {
    name: &'static str,
    addr: AtomicUsize,
    _marker: PhantomData<F>,
}

const UNRESOLVED: usize = 1;

impl<F: Copy> Weak<F> {
    /// `name` must end with a NUL byte.
    pub(crate) const fn new(name: &'static str) -> Self {
        Weak {
            name,
            addr: AtomicUsize::new(UNRESOLVED),
            _marker: PhantomData,
        }
    }

    pub(crate) fn get(&self) -> Option<F> {
        debug_assert_eq!(mem::size_of::<F>(), mem::size_of::<usize>());

        let mut addr = self.addr.load(Ordering::Relaxed);
        if addr == UNRESOLVED {
            addr = self.lookup();
            self.addr.store(addr, Ordering::Relaxed);
        }

        if addr == 0 {
            None
        } else {
            unsafe { Some(mem::transmute_copy::<usize, F>(&addr)) }
        }
    }

    fn lookup(&self) -> usize {
        let Ok(name) = CStr::from_bytes_with_nul(self.name.as_bytes()) else {
            return 0;
        };

        unsafe { libc::dlsym(libc::RTLD_DEFAULT, name.as_ptr()) as usize }
    }
}

macro_rules! weak {
    (fn $name:ident($($t:ty),*) -> $ret:ty) => {
        #[allow(non_upper_case_globals)]
        static $name: crate::weak_imports::Weak<unsafe extern "C" fn($($t),*) -> $ret> =
            crate::weak_imports::Weak::new(concat!(stringify!($name), '\0'));
    };
}

/// `LLVMFuzzerMutate` from the host fuzzer, if it was linked in.
pub(crate) fn libfuzzer_mutate_fn() -> Option<HostMutateFn> {
    weak!(fn LLVMFuzzerMutate(*mut u8, usize, usize) -> usize);

    LLVMFuzzerMutate.get()
}
