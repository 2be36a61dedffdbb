use std::ptr;

use rusty_radamsa::exports::*;

const INPUT: &[u8] =
    b"ABCDE\nKLMNOPQRSTUV\nZYX\nfeklafnewlka\nkelwflknewfw\n123214324\nhello world\n\0";

fn mutate(ctx: *mut rusty_radamsa::Engine, input: &[u8], max: usize, seed: usize) -> Vec<u8> {
    let mut out = vec![0u8; max];
    let len = rusty_radamsa(ctx, input.as_ptr(), input.len(), out.as_mut_ptr(), max, seed);
    assert!(len <= max);
    out.truncate(len);
    out
}

#[test]
fn demo_seeds_are_bounded_and_repeatable() {
    let ctx = rusty_radamsa_init();
    assert!(!ctx.is_null());

    let first: Vec<Vec<u8>> = (0..10).map(|seed| mutate(ctx, INPUT, 80, seed)).collect();
    let second: Vec<Vec<u8>> = (0..10).map(|seed| mutate(ctx, INPUT, 80, seed)).collect();
    assert_eq!(first, second);
    assert!(first.iter().all(|out| out.len() <= 80));

    rusty_radamsa_free(ctx);
}

#[test]
fn independent_handles_agree() {
    let a = rusty_radamsa_init();
    let b = rusty_radamsa_init();
    rusty_radamsa_set_mutator(a, b"default\0".as_ptr().cast());
    rusty_radamsa_set_mutator(b, b"default\0".as_ptr().cast());

    for seed in [0, 1, 42, usize::MAX] {
        assert_eq!(mutate(a, INPUT, 128, seed), mutate(b, INPUT, 128, seed));
    }

    rusty_radamsa_free(a);
    rusty_radamsa_free(b);
}

#[test]
fn in_place_matches_disjoint_buffers() {
    let ctx = rusty_radamsa_init();
    for seed in 0..20 {
        let expected = mutate(ctx, INPUT, 128, seed);

        let mut buf = [0u8; 128];
        buf[..INPUT.len()].copy_from_slice(INPUT);
        let len = rusty_radamsa(ctx, buf.as_ptr(), INPUT.len(), buf.as_mut_ptr(), buf.len(), seed);
        assert_eq!(&buf[..len], &expected[..]);
    }
    rusty_radamsa_free(ctx);
}

#[test]
fn null_and_empty_arguments() {
    let ctx = rusty_radamsa_init();
    let mut out = [0u8; 16];

    assert_eq!(
        rusty_radamsa(ptr::null_mut(), INPUT.as_ptr(), INPUT.len(), out.as_mut_ptr(), 16, 1),
        0
    );
    assert_eq!(rusty_radamsa(ctx, INPUT.as_ptr(), INPUT.len(), ptr::null_mut(), 16, 1), 0);
    assert_eq!(rusty_radamsa(ctx, INPUT.as_ptr(), INPUT.len(), out.as_mut_ptr(), 0, 1), 0);
    assert_eq!(rusty_radamsa(ctx, ptr::null(), 4, out.as_mut_ptr(), 16, 1), 0);
    assert_eq!(out, [0u8; 16]);

    // an empty input still produces something small
    let len = rusty_radamsa(ctx, ptr::null(), 0, out.as_mut_ptr(), 16, 1);
    assert!(len <= 16);

    rusty_radamsa_free(ctx);
    rusty_radamsa_free(ptr::null_mut());
}

#[test]
fn checked_configuration_reports_status() {
    let ctx = rusty_radamsa_init();

    assert_eq!(rusty_radamsa_try_set_mutator(ctx, b"num=3,bd\0".as_ptr().cast()), RADAMSA_OK);
    assert_eq!(rusty_radamsa_try_set_mutator(ctx, b"zz\0".as_ptr().cast()), RADAMSA_ERR_SELECTION);
    assert_eq!(rusty_radamsa_try_set_mutator(ctx, b"\xff\0".as_ptr().cast()), RADAMSA_ERR_UTF8);
    assert_eq!(rusty_radamsa_try_set_mutator(ptr::null_mut(), b"bd\0".as_ptr().cast()), RADAMSA_ERR_NULL);

    assert_eq!(rusty_radamsa_set_patterns(ctx, b"od,nd=2\0".as_ptr().cast()), RADAMSA_OK);
    assert_eq!(rusty_radamsa_set_patterns(ctx, b"xx\0".as_ptr().cast()), RADAMSA_ERR_SELECTION);

    rusty_radamsa_free(ctx);
}

#[test]
fn unknown_mutator_keeps_configuration() {
    let configured = rusty_radamsa_init();
    let reference = rusty_radamsa_init();
    rusty_radamsa_set_mutator(configured, b"bd,bf\0".as_ptr().cast());
    rusty_radamsa_set_mutator(reference, b"bd,bf\0".as_ptr().cast());

    rusty_radamsa_set_mutator(configured, b"no_such_mutator\0".as_ptr().cast());
    rusty_radamsa_set_mutator(configured, ptr::null());

    for seed in 0..10 {
        assert_eq!(mutate(configured, INPUT, 80, seed), mutate(reference, INPUT, 80, seed));
    }

    rusty_radamsa_free(configured);
    rusty_radamsa_free(reference);
}
