#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_http11_parser::{ChunkDecoder, ChunkState};

#[derive(Arbitrary, Debug)]
struct FuzzChunked {
    chunks: Vec<Vec<u8>>,
    extension: Option<String>,
    split_hint: u8,
    garbage: Vec<u8>,
}

fn normalize_chunks(mut chunks: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    chunks.retain(|chunk| !chunk.is_empty());
    if chunks.len() > 64 {
        chunks.truncate(64);
    }
    chunks
}

fn encode(chunks: &[Vec<u8>], extension: Option<&str>) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in chunks {
        out.extend_from_slice(format!("{:x}", chunk.len()).as_bytes());
        if let Some(ext) = extension {
            out.push(b';');
            out.extend_from_slice(ext.as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(chunk);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}

/// 呼び出し側が未消費分を保持しながらデコードする
fn decode(encoded: &[u8], split_size: usize) -> Option<(Vec<u8>, Vec<u8>)> {
    let mut decoder = ChunkDecoder::new();
    let mut pending = Vec::new();
    let mut body = Vec::new();
    for part in encoded.chunks(split_size) {
        pending.extend_from_slice(part);
        loop {
            let filtered = decoder.step(&pending).ok()?;
            body.extend_from_slice(filtered.chunk);
            let consumed = filtered.consumed;
            pending.drain(..consumed);
            if consumed == 0 || decoder.is_done() {
                break;
            }
        }
    }
    decoder.is_done().then_some((body, pending))
}

fuzz_target!(|input: FuzzChunked| {
    let chunks = normalize_chunks(input.chunks);
    let expected: Vec<u8> = chunks.concat();
    let split_size = (input.split_hint as usize % 32) + 1;

    // 改行を含む拡張は行の構造を壊すので使わない
    let extension = input
        .extension
        .filter(|ext| ext.len() < 32 && !ext.contains(['\r', '\n']));

    let encoded = encode(&chunks, extension.as_deref());
    if let Some((body, pending)) = decode(&encoded, split_size) {
        assert_eq!(body, expected);
        assert!(pending.is_empty());
    }

    // 任意のバイト列でも panic せず、エラー後は Poisoned を返し続ける
    let mut decoder = ChunkDecoder::new();
    let mut rest: &[u8] = &input.garbage;
    loop {
        match decoder.step(rest) {
            Ok(filtered) if filtered.consumed > 0 && decoder.state() != ChunkState::Done => {
                rest = filtered.remainder;
            }
            Ok(_) => break,
            Err(_) => {
                assert!(decoder.is_poisoned());
                assert!(decoder.step(b"0\r\n\r\n").is_err());
                break;
            }
        }
    }
});
