use std::ffi::CString;

use clap::Parser;
use rusty_radamsa::{
    exports::{
        rusty_radamsa, rusty_radamsa_free, rusty_radamsa_init, rusty_radamsa_set_patterns,
        rusty_radamsa_try_set_mutator, RADAMSA_OK,
    },
    Command, Engine, RuntimeOptions,
};

/// NUL terminated, as a C caller would pass it.
const INPUT: &[u8; 72] =
    b"ABCDE\nKLMNOPQRSTUV\nZYX\nfeklafnewlka\nkelwflknewfw\n123214324\nhello world\n\0";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let options = RuntimeOptions::parse();
    let engine_options = options.engine_options()?;

    if let Some(Command::List { json }) = options.command {
        let catalog = Engine::with_options(engine_options)?.catalog();
        if json {
            println!("{}", serde_json::to_string_pretty(&catalog)?);
        } else {
            for (kind, entries) in [("mutators", &catalog.mutators), ("patterns", &catalog.patterns)] {
                println!("{}:", kind);
                for entry in entries {
                    let selected = entry.priority.map(|p| format!(" (priority {})", p));
                    println!("  {:<4} {}{}", entry.id, entry.info, selected.unwrap_or_default());
                }
            }
        }

        return Ok(());
    }

    let ctx = rusty_radamsa_init();
    if ctx.is_null() {
        return Err("failed to create engine".into());
    }

    let mutators = CString::new(engine_options.mutators)?;
    let patterns = CString::new(engine_options.patterns)?;
    if rusty_radamsa_try_set_mutator(ctx, mutators.as_ptr()) != RADAMSA_OK
        || rusty_radamsa_set_patterns(ctx, patterns.as_ptr()) != RADAMSA_OK
    {
        rusty_radamsa_free(ctx);
        return Err("invalid mutator or pattern selection".into());
    }

    let mut out = vec![0u8; options.max_output_len];
    for seed in 0..options.seeds {
        let len = rusty_radamsa(
            ctx,
            INPUT.as_ptr(),
            INPUT.len(),
            out.as_mut_ptr(),
            out.len(),
            seed,
        );

        let output = &out[..len];
        if options.hex {
            println!("{}", hex::encode(output));
        } else {
            println!("{}", String::from_utf8_lossy(output).escape_debug());
        }
    }

    rusty_radamsa_free(ctx);

    Ok(())
}
