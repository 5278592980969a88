#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use strtok_wire::{ChunkQueue, Primitive};

#[derive(Debug, Arbitrary)]
enum FuzzPrimitive {
    U8,
    U16Be,
    U16Le,
    U32Be,
    U32Le,
    I8,
    I16Be,
    I16Le,
    I32Be,
    I32Le,
    Raw(u8),
}

impl From<&FuzzPrimitive> for Primitive {
    fn from(p: &FuzzPrimitive) -> Self {
        match p {
            FuzzPrimitive::U8 => Primitive::U8,
            FuzzPrimitive::U16Be => Primitive::U16Be,
            FuzzPrimitive::U16Le => Primitive::U16Le,
            FuzzPrimitive::U32Be => Primitive::U32Be,
            FuzzPrimitive::U32Le => Primitive::U32Le,
            FuzzPrimitive::I8 => Primitive::I8,
            FuzzPrimitive::I16Be => Primitive::I16Be,
            FuzzPrimitive::I16Le => Primitive::I16Le,
            FuzzPrimitive::I32Be => Primitive::I32Be,
            FuzzPrimitive::I32Le => Primitive::I32Le,
            FuzzPrimitive::Raw(len) => Primitive::Raw(usize::from(*len)),
        }
    }
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    chunks: Vec<Vec<u8>>,
    reads: Vec<FuzzPrimitive>,
}

// Fuzz target: chunk queue reads plus primitive decode/encode.
//
// Every primitive taken from the queue must re-encode to exactly the
// bytes it was decoded from, regardless of how the input was chunked.
fuzz_target!(|input: FuzzInput| {
    let mut queue = ChunkQueue::new();
    for chunk in input.chunks {
        queue.push(Bytes::from(chunk));
    }

    for read in &input.reads {
        let primitive = Primitive::from(read);
        if !primitive.is_valid() || queue.len() < primitive.width() {
            break;
        }
        let bytes = queue.take(primitive.width());
        assert_eq!(bytes.len(), primitive.width());

        let token = primitive.decode(bytes.clone());
        let mut out = Vec::new();
        let written = primitive.encode(&mut out, &token).unwrap();
        assert_eq!(written, primitive.width());
        assert_eq!(out, bytes);
    }
});
