// Transition store binary format: encoding and validated decoding.
//
// Layout (all integers little-endian, no header, no padding):
//   u64            entry count
//   per entry, in id order:
//     u8           kind tag
//     u64 + bytes  UTF-8 label (REDUCE-L, REDUCE-R and UNARY only)

use std::io::{self, Read, Write};

use transmap_core::{Label, Transition, TransitionKind};

use crate::{TransMapError, TransitionMap};

/// Upper bound on entries reserved up front from a declared count. Larger
/// stores still load; they just grow as entries are actually read.
const MAX_PREALLOCATED: usize = 1 << 16;

/// Write `transitions` in store layout. The slice order is the id order.
pub fn write_transitions<W: Write>(writer: &mut W, transitions: &[Transition]) -> io::Result<()> {
    writer.write_all(&(transitions.len() as u64).to_le_bytes())?;
    for transition in transitions {
        writer.write_all(&[transition.kind().as_u8()])?;
        if let Some(label) = transition.label() {
            let bytes = label.as_str().as_bytes();
            writer.write_all(&(bytes.len() as u64).to_le_bytes())?;
            writer.write_all(bytes)?;
        }
    }
    Ok(())
}

/// Read a map in store layout. Entry `i` of the stream gets id `i`.
///
/// Bytes after the last declared entry are not read.
pub fn read_transitions<R: Read>(reader: &mut R) -> Result<TransitionMap, TransMapError> {
    let count = u64::from_le_bytes(read_array(reader, || {
        "missing transition count".to_string()
    })?);
    let count = usize::try_from(count)
        .map_err(|_| malformed(format!("transition count {count} exceeds address space")))?;

    let mut map = TransitionMap::with_capacity(count.min(MAX_PREALLOCATED));
    for i in 0..count {
        let [tag] = read_array::<1, _>(reader, || {
            format!("too few transitions (declared {count}, found {i})")
        })?;
        let kind = TransitionKind::from_u8(tag)
            .ok_or_else(|| malformed(format!("unknown transition kind {tag} at entry {i}")))?;

        let label = if kind.has_label() {
            Some(read_label(reader, i)?)
        } else {
            None
        };
        let transition = Transition::from_parts(kind, label)
            .map_err(|e| malformed(format!("entry {i}: {e}")))?;

        let id = map.intern_owned(transition);
        if id.index() != i {
            return Err(malformed(format!(
                "duplicate transition at entry {i} (first seen at {id})"
            )));
        }
    }

    Ok(map)
}

/// Consume the rest of `reader`.
///
/// Compressed readers only verify their checksum and length trailer at end of
/// stream, so a store is not trusted until it has been read to the end.
#[cfg(feature = "gzip")]
pub(crate) fn drain<R: Read>(reader: &mut R) -> Result<(), TransMapError> {
    io::copy(reader, &mut io::sink())
        .map_err(|e| read_error(e, || "compressed stream does not end cleanly".to_string()))?;
    Ok(())
}

fn read_label<R: Read>(reader: &mut R, entry: usize) -> Result<Label, TransMapError> {
    let len = u64::from_le_bytes(read_array(reader, || {
        format!("truncated label length at entry {entry}")
    })?);

    // `take` bounds the read so a corrupt length cannot force a huge allocation.
    let mut bytes = Vec::new();
    Read::take(&mut *reader, len)
        .read_to_end(&mut bytes)
        .map_err(|e| read_error(e, || format!("label at entry {entry}")))?;
    if (bytes.len() as u64) < len {
        return Err(malformed(format!(
            "truncated label at entry {entry} (expected {len} bytes, got {})",
            bytes.len()
        )));
    }

    let label = String::from_utf8(bytes)
        .map_err(|_| malformed(format!("label at entry {entry} is not valid UTF-8")))?;
    Ok(Label::from(label))
}

/// Read exactly `N` bytes. End of stream becomes a malformed-store error
/// carrying the message built by `context`.
fn read_array<const N: usize, R: Read>(
    reader: &mut R,
    context: impl FnOnce() -> String,
) -> Result<[u8; N], TransMapError> {
    let mut buf = [0u8; N];
    reader
        .read_exact(&mut buf)
        .map_err(|e| read_error(e, context))?;
    Ok(buf)
}

fn read_error(err: io::Error, context: impl FnOnce() -> String) -> TransMapError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => malformed(context()),
        // Corrupt compressed data surfaces as invalid input/data.
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => {
            malformed(format!("{}: {err}", context()))
        }
        _ => TransMapError::Io(err),
    }
}

fn malformed(reason: String) -> TransMapError {
    TransMapError::MalformedStore(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> TransitionMap {
        [
            Transition::Shift,
            Transition::reduce_left("NP"),
            Transition::reduce_left("VP"),
        ]
        .into_iter()
        .collect()
    }

    fn encode(map: &TransitionMap) -> Vec<u8> {
        let mut buf = Vec::new();
        map.write_to(&mut buf).unwrap();
        buf
    }

    fn decode(bytes: &[u8]) -> Result<TransitionMap, TransMapError> {
        read_transitions(&mut &bytes[..])
    }

    fn assert_malformed(result: Result<TransitionMap, TransMapError>, needle: &str) {
        match result {
            Err(TransMapError::MalformedStore(reason)) => {
                assert!(reason.contains(needle), "unexpected reason: {reason}")
            }
            other => panic!("expected malformed store, got {other:?}"),
        }
    }

    /// Hand-build one labeled entry.
    fn labeled(tag: u8, label: &[u8]) -> Vec<u8> {
        let mut buf = vec![tag];
        buf.extend_from_slice(&(label.len() as u64).to_le_bytes());
        buf.extend_from_slice(label);
        buf
    }

    #[test]
    fn encodes_exact_layout() {
        let bytes = encode(&sample_map());

        let mut expected = Vec::new();
        expected.extend_from_slice(&3u64.to_le_bytes());
        expected.push(0); // SHIFT
        expected.extend_from_slice(&labeled(1, b"NP"));
        expected.extend_from_slice(&labeled(1, b"VP"));
        assert_eq!(bytes, expected);
    }

    #[test]
    fn empty_map_is_just_a_count() {
        let bytes = encode(&TransitionMap::new());
        assert_eq!(bytes, vec![0u8; 8]);
        assert!(decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn decode_preserves_ids_and_labels() {
        let map: TransitionMap = [
            Transition::unary("S"),
            Transition::Idle,
            Transition::reduce_right("NP"),
            Transition::Finalize,
            Transition::reduce_left("NP"),
            Transition::Shift,
            Transition::unary("\u{00e4}\u{00f6}"),
        ]
        .into_iter()
        .collect();

        let reloaded = decode(&encode(&map)).unwrap();
        assert_eq!(reloaded, map);
        for (id, t) in map.iter() {
            assert_eq!(reloaded.transition(id).unwrap(), t);
            assert_eq!(reloaded.id(t).unwrap(), id);
        }
    }

    #[test]
    fn empty_label_roundtrips() {
        let map: TransitionMap = [Transition::unary(""), Transition::unary("S")]
            .into_iter()
            .collect();
        let bytes = encode(&map);
        assert_eq!(&bytes[8..], &[3, 0, 0, 0, 0, 0, 0, 0, 0, 3, 1, 0, 0, 0, 0, 0, 0, 0, b'S']);
        assert_eq!(decode(&bytes).unwrap(), map);
    }

    #[test]
    fn reject_empty_stream() {
        assert_malformed(decode(&[]), "missing transition count");
    }

    #[test]
    fn reject_partial_count() {
        assert_malformed(decode(&[3, 0, 0]), "missing transition count");
    }

    #[test]
    fn reject_count_larger_than_entries() {
        let mut bytes = 5u64.to_le_bytes().to_vec();
        bytes.push(0);
        bytes.extend_from_slice(&labeled(2, b"NP"));
        assert_malformed(decode(&bytes), "too few transitions (declared 5, found 2)");
    }

    #[test]
    fn reject_huge_count_without_allocating_it() {
        let mut bytes = u64::MAX.to_le_bytes().to_vec();
        bytes.push(4);
        let result = decode(&bytes);
        if usize::BITS >= 64 {
            assert_malformed(result, "too few transitions");
        } else {
            assert_malformed(result, "exceeds address space");
        }
    }

    #[test]
    fn reject_truncated_label() {
        let mut bytes = 1u64.to_le_bytes().to_vec();
        bytes.push(3);
        bytes.extend_from_slice(&10u64.to_le_bytes());
        bytes.extend_from_slice(b"NP");
        assert_malformed(decode(&bytes), "truncated label at entry 0 (expected 10 bytes, got 2)");
    }

    #[test]
    fn reject_missing_label_length() {
        let mut bytes = 1u64.to_le_bytes().to_vec();
        bytes.push(1); // REDUCE-L, then end of stream
        assert_malformed(decode(&bytes), "truncated label length at entry 0");
    }

    #[test]
    fn reject_huge_label_length() {
        let mut bytes = 1u64.to_le_bytes().to_vec();
        bytes.push(1);
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        bytes.extend_from_slice(b"NP");
        assert_malformed(decode(&bytes), "truncated label");
    }

    #[test]
    fn reject_unknown_kind() {
        let mut bytes = 2u64.to_le_bytes().to_vec();
        bytes.push(0);
        bytes.push(9);
        assert_malformed(decode(&bytes), "unknown transition kind 9 at entry 1");
    }

    #[test]
    fn reject_invalid_utf8_label() {
        let mut bytes = 1u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&labeled(1, &[0xFF, 0xFE]));
        assert_malformed(decode(&bytes), "not valid UTF-8");
    }

    #[test]
    fn reject_duplicate_entries() {
        let mut bytes = 3u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&labeled(1, b"NP"));
        bytes.push(0);
        bytes.extend_from_slice(&labeled(1, b"NP"));
        assert_malformed(decode(&bytes), "duplicate transition at entry 2 (first seen at 0)");
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = encode(&sample_map());
        bytes.extend_from_slice(b"junk");
        assert_eq!(decode(&bytes).unwrap(), sample_map());
    }

    #[test]
    fn io_errors_are_not_reported_as_malformed() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            }
        }
        let err = read_transitions(&mut Broken).unwrap_err();
        assert!(matches!(err, TransMapError::Io(ref e) if e.kind() == io::ErrorKind::PermissionDenied));
    }

    #[test]
    fn write_errors_propagate() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::StorageFull, "full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let err = sample_map().write_to(&mut Full).unwrap_err();
        assert!(matches!(err, TransMapError::Io(_)));
    }
}
