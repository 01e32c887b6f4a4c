#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_http11_parser::{BodyRead, Error, ParseState, ParserContext, Request};

/// `split` バイトずつ feed しながらパイプライン上のリクエストをすべて読む
fn decode_all(data: &[u8], split: usize) -> Result<Vec<Request>, Error> {
    let mut ctx = ParserContext::new();
    let mut requests = Vec::new();
    for part in data.chunks(split) {
        ctx.feed(part)?;
        while let Some(request) = ctx.decode()? {
            requests.push(request);
            ctx = ctx.next_request()?;
        }
    }
    Ok(requests)
}

fuzz_target!(|data: &[u8]| {
    // 分割の仕方によって結果が変わってはならない
    let whole = decode_all(data, data.len().max(1));
    let split = decode_all(data, 17);
    assert_eq!(whole.is_ok(), split.is_ok());
    if let (Ok(a), Ok(b)) = (&whole, &split) {
        assert_eq!(a, b);
    }

    // ストリーミング API でも状態は単調に進む
    let mut ctx = ParserContext::new();
    if ctx.feed(data).is_err() || ctx.filter_headers().is_err() {
        return;
    }
    let mut previous = ctx.state();
    loop {
        match ctx.read_body() {
            Ok(BodyRead::Data(_)) => {}
            Ok(BodyRead::NeedMore) | Ok(BodyRead::Complete) | Err(_) => break,
        }
        assert!(ctx.state() >= previous);
        previous = ctx.state();
    }
    assert!(ctx.remaining().len() <= data.len());
    if ctx.state() == ParseState::Complete {
        assert!(ctx.is_body_complete());
    }
});
