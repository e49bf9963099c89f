//! Injected randomness source for serial number generation (spec.md §9
//! design notes: "global pid+time RNG seed ... becomes an injected source
//! of randomness with a process-unique default, overridable for tests").

use rand::RngCore;

/// Produces serial numbers for new logical streams.
pub trait SerialSource: Send {
    fn next_serial(&mut self) -> u32;
}

/// Process-unique default source, backed by the thread-local CSPRNG-seeded
/// generator `rand` provides (non-cryptographic use: collision avoidance,
/// not security).
#[derive(Default)]
pub struct ThreadRngSerialSource;

impl SerialSource for ThreadRngSerialSource {
    fn next_serial(&mut self) -> u32 {
        rand::thread_rng().next_u32()
    }
}

/// Deterministic source for tests (spec.md S5: `set_serialno` override path
/// still needs *some* default to have been drawn first).
pub struct FixedSerialSource(pub u32);

impl SerialSource for FixedSerialSource {
    fn next_serial(&mut self) -> u32 {
        self.0
    }
}
