#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_http11_parser::{Error, ParserContext, ParserLimits};

#[derive(Arbitrary, Debug)]
struct FuzzLimits {
    max_buffer_size: u16,
    max_header_block_size: u16,
    max_chunk_line_size: u8,
    max_chunk_size: u32,
    data: Vec<u8>,
}

fn build_limits(input: &FuzzLimits) -> ParserLimits {
    ParserLimits {
        max_buffer_size: input.max_buffer_size as usize,
        max_header_block_size: input.max_header_block_size as usize,
        max_chunk_line_size: input.max_chunk_line_size as usize,
        max_chunk_size: input.max_chunk_size as u64,
    }
}

fuzz_target!(|input: FuzzLimits| {
    let limits = build_limits(&input);

    let mut ctx = ParserContext::with_limits(limits.clone());
    match ctx.feed(&input.data) {
        Ok(()) => {}
        Err(Error::BufferOverflow { size, limit }) => {
            assert!(size > limit);
            return;
        }
        Err(e) => panic!("unexpected feed error: {e}"),
    }

    match ctx.decode() {
        Ok(_) => {}
        Err(Error::HeaderBlockTooLarge { size, limit }) => {
            assert_eq!(limit, limits.max_header_block_size);
            assert!(size > limit);
        }
        Err(e) => {
            if e.is_fatal_to_connection() {
                assert!(ctx.is_poisoned());
            }
        }
    }
});
