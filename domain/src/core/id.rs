//! Locally generated identifiers.

use std::sync::atomic::{AtomicU64, Ordering};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generate a UUID-v4-shaped identifier without an external dependency.
///
/// The clock provides the high bits and a process-wide sequence is mixed
/// into the low bits, so two ids generated in the same nanosecond differ.
pub fn generate_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) as u128;
    let mixed = nanos ^ (seq.wrapping_mul(0x9e37_79b9_7f4a_7c15) << 16) ^ seq;

    format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        (mixed >> 96) as u32,
        (mixed >> 80) as u16,
        (mixed >> 64) as u16 & 0x0fff,
        ((mixed >> 48) as u16 & 0x3fff) | 0x8000,
        (mixed & 0xffff_ffff_ffff) as u64
    )
}
