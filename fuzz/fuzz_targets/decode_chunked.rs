#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use strtok_decoder::{DecoderConfig, MsgpackDecoder, decode_slice_with};
use strtok_tokenizer::Tokenizer;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    payload: Vec<u8>,
    cuts: Vec<u16>,
}

fn config() -> DecoderConfig {
    DecoderConfig {
        max_depth: Some(512),
        ..DecoderConfig::default()
    }
}

// Fuzz target: chunk boundaries never change the decoded result.
//
// The payload is decoded once as a single buffer and once fed through the
// tokenizer in pieces cut at arbitrary offsets. Both runs must agree on
// the values delivered and on the error, if any.
fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(input) = FuzzInput::arbitrary(&mut u) else {
        return;
    };

    let whole = decode_slice_with(&input.payload, config());

    let mut cuts: Vec<usize> = input
        .cuts
        .iter()
        .map(|&c| usize::from(c))
        .filter(|&c| c > 0 && c < input.payload.len())
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let Ok(mut tokenizer) =
        Tokenizer::new(MsgpackDecoder::with_config(Vec::new(), config()))
    else {
        return;
    };
    let mut start = 0;
    for cut in cuts.into_iter().chain(std::iter::once(input.payload.len())) {
        let chunk = Bytes::copy_from_slice(&input.payload[start..cut]);
        start = cut;
        if chunk.is_empty() {
            continue;
        }
        if tokenizer.feed(chunk).is_err() {
            return;
        }
    }

    let mut decoder = tokenizer.into_strategy();
    let error = decoder.take_error();
    match whole {
        Ok(values) => {
            assert!(error.is_none(), "chunked run failed: {error:?}");
            assert_eq!(decoder.into_sink(), values);
        }
        Err(whole_err) => {
            // Truncation is only visible to the whole-buffer path
            if let Some(err) = error {
                assert_eq!(err.to_string(), whole_err.to_string());
            }
        }
    }
});
