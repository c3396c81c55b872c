//! Guard-byte integrity checks.
//!
//! A [`Guard`] owns the two byte patterns stamped around every payload and
//! is the only code that reads or writes them. The tracking heap calls
//! [`Guard::stamp`], [`Guard::stamp_footer`], and [`Guard::verify`] and never
//! touches the patterns directly, so the detection scheme can change
//! without touching allocator call sites.

#![allow(unsafe_code)]

use crate::config::GuardKind;
use crate::error::HeapCorruption;

/// Size in bytes of each guard region.
pub const GUARD_SIZE: usize = 8;

/// Fixed pattern written just before each payload.
pub const HEADER_WATERMARK: [u8; GUARD_SIZE] = *b"STHEADER";

/// Fixed pattern written just after each payload.
pub const FOOTER_WATERMARK: [u8; GUARD_SIZE] = *b"STFOOTER";

/// The pair of patterns a heap stamps around its payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Guard {
    header: [u8; GUARD_SIZE],
    footer: [u8; GUARD_SIZE],
}

impl Guard {
    /// The fixed watermark pair.
    pub const fn watermark() -> Self {
        Self {
            header: HEADER_WATERMARK,
            footer: FOOTER_WATERMARK,
        }
    }

    /// A freshly drawn random pair. Header and footer always differ.
    pub fn random() -> Self {
        let header = rand::random::<u64>().to_le_bytes();
        let mut footer = rand::random::<u64>().to_le_bytes();
        if footer == header {
            footer[0] = !footer[0];
        }
        Self { header, footer }
    }

    /// Build the guard selected by `kind`.
    pub fn from_kind(kind: GuardKind) -> Self {
        match kind {
            GuardKind::Watermark => Self::watermark(),
            GuardKind::RandomCanary => Self::random(),
        }
    }

    /// The header pattern.
    pub fn header(&self) -> [u8; GUARD_SIZE] {
        self.header
    }

    /// The footer pattern.
    pub fn footer(&self) -> [u8; GUARD_SIZE] {
        self.footer
    }

    /// Write both patterns around a payload of `size` bytes.
    ///
    /// # Safety
    ///
    /// `payload - GUARD_SIZE .. payload + size + GUARD_SIZE` must be valid
    /// for writes.
    pub(crate) unsafe fn stamp(&self, payload: *mut u8, size: usize) {
        // SAFETY: the caller guarantees the header region precedes `payload`.
        unsafe {
            payload
                .sub(GUARD_SIZE)
                .cast::<[u8; GUARD_SIZE]>()
                .write_unaligned(self.header);
        }
        // SAFETY: forwarded to the caller's contract.
        unsafe { self.stamp_footer(payload, size) };
    }

    /// Write the footer pattern after a payload of `size` bytes.
    ///
    /// # Safety
    ///
    /// `payload + size .. payload + size + GUARD_SIZE` must be valid for
    /// writes.
    pub(crate) unsafe fn stamp_footer(&self, payload: *mut u8, size: usize) {
        // SAFETY: the caller guarantees the footer region follows the payload.
        unsafe {
            payload
                .add(size)
                .cast::<[u8; GUARD_SIZE]>()
                .write_unaligned(self.footer);
        }
    }

    /// Check both patterns around a payload of `size` bytes.
    ///
    /// # Safety
    ///
    /// `payload - GUARD_SIZE .. payload + size + GUARD_SIZE` must be valid
    /// for reads.
    pub(crate) unsafe fn verify(
        &self,
        payload: *const u8,
        size: usize,
    ) -> Result<(), HeapCorruption> {
        // SAFETY: the caller guarantees both guard regions are readable.
        let (header, footer) = unsafe {
            (
                payload
                    .sub(GUARD_SIZE)
                    .cast::<[u8; GUARD_SIZE]>()
                    .read_unaligned(),
                payload
                    .add(size)
                    .cast::<[u8; GUARD_SIZE]>()
                    .read_unaligned(),
            )
        };
        if header != self.header {
            return Err(HeapCorruption::HeaderGuard);
        }
        if footer != self.footer {
            return Err(HeapCorruption::FooterGuard);
        }
        Ok(())
    }
}

impl Default for Guard {
    fn default() -> Self {
        Self::watermark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Buffer laid out as header | payload | footer.
    fn framed(size: usize) -> Vec<u8> {
        vec![0u8; size + 2 * GUARD_SIZE]
    }

    fn stamp_into(guard: &Guard, buf: &mut [u8], size: usize) {
        let payload = buf[GUARD_SIZE..].as_mut_ptr();
        unsafe { guard.stamp(payload, size) };
    }

    fn verify_in(guard: &Guard, buf: &[u8], size: usize) -> Result<(), HeapCorruption> {
        let payload = buf[GUARD_SIZE..].as_ptr();
        unsafe { guard.verify(payload, size) }
    }

    #[test]
    fn stamp_then_verify_passes() {
        let guard = Guard::watermark();
        for size in [1, 7, 8, 33] {
            let mut buf = framed(size);
            stamp_into(&guard, &mut buf, size);
            assert_eq!(&buf[..GUARD_SIZE], &HEADER_WATERMARK);
            assert_eq!(&buf[GUARD_SIZE + size..], &FOOTER_WATERMARK);
            assert_eq!(verify_in(&guard, &buf, size), Ok(()));
        }
    }

    #[test]
    fn payload_writes_do_not_disturb_guards() {
        let guard = Guard::watermark();
        let mut buf = framed(16);
        stamp_into(&guard, &mut buf, 16);
        buf[GUARD_SIZE..GUARD_SIZE + 16].fill(0xAB);
        assert_eq!(verify_in(&guard, &buf, 16), Ok(()));
    }

    #[test]
    fn overrun_detected() {
        let guard = Guard::watermark();
        let mut buf = framed(16);
        stamp_into(&guard, &mut buf, 16);
        buf[GUARD_SIZE + 16] = 0;
        assert_eq!(verify_in(&guard, &buf, 16), Err(HeapCorruption::FooterGuard));
    }

    #[test]
    fn underrun_detected() {
        let guard = Guard::watermark();
        let mut buf = framed(16);
        stamp_into(&guard, &mut buf, 16);
        buf[GUARD_SIZE - 1] ^= 0xFF;
        assert_eq!(verify_in(&guard, &buf, 16), Err(HeapCorruption::HeaderGuard));
    }

    #[test]
    fn random_guard_halves_differ() {
        let guard = Guard::random();
        assert_ne!(guard.header(), guard.footer());
        let mut buf = framed(4);
        stamp_into(&guard, &mut buf, 4);
        assert_eq!(verify_in(&guard, &buf, 4), Ok(()));
        assert_eq!(
            verify_in(&Guard::watermark(), &buf, 4),
            Err(HeapCorruption::HeaderGuard)
        );
    }

    #[test]
    fn from_kind_selects_watermark() {
        assert_eq!(Guard::from_kind(GuardKind::Watermark), Guard::watermark());
    }
}
