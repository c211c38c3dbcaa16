#![no_main]
use libfuzzer_sys::fuzz_target;
use streamxml::{parse_bytes, parse_reader, AttributePolicy, Config, Parser, SliceSource};

fuzz_target!(|data: &[u8]| {
    let whole = parse_bytes(data);

    // Chunk boundaries must not change the outcome
    let chunked = Parser::new(SliceSource::new(data).with_chunk_size(3)).parse();
    assert_eq!(whole, chunked);

    let config = Config::default().with_attribute_policy(AttributePolicy::Unsorted);
    let _ = Parser::from_slice_with_config(data, config).parse();
    let _ = parse_reader(data);
});
