//! Reusable token buffer with bounded growth

use crate::error::ErrorKind;

/// Hard upper bound on a single token: 512 MiB
pub const MAX_TOKEN_SIZE: usize = 512 * 1024 * 1024;

/// Capacity allocated when parsing starts
pub const INITIAL_CAPACITY: usize = 256;

/// Growable byte buffer every token is assembled in.
///
/// Capacity grows by `old + old + old / 4` and never beyond `limit`.
/// Growth failures are reported as [`ErrorKind`]s rather than panics;
/// the lexer attaches the position.
#[derive(Debug)]
pub struct TokenBuffer {
    bytes: Vec<u8>,
    limit: usize,
}

impl TokenBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit: limit.min(MAX_TOKEN_SIZE),
        }
    }

    /// Allocate the starting capacity
    pub fn allocate(&mut self) -> Result<(), ErrorKind> {
        let initial = INITIAL_CAPACITY.min(self.limit);
        self.bytes
            .try_reserve_exact(initial)
            .map_err(|_| ErrorKind::AllocationFailed)
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn push(&mut self, b: u8) -> Result<(), ErrorKind> {
        self.reserve(1)?;
        self.bytes.push(b);
        Ok(())
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), ErrorKind> {
        self.reserve(bytes.len())?;
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    fn reserve(&mut self, additional: usize) -> Result<(), ErrorKind> {
        let required = self
            .bytes
            .len()
            .checked_add(additional)
            .filter(|&n| n <= self.limit)
            .ok_or(ErrorKind::TokenTooLarge { max: self.limit })?;
        let capacity = self.bytes.capacity();
        if required <= capacity {
            return Ok(());
        }
        let mut target = capacity.max(INITIAL_CAPACITY);
        while target < required {
            target = target
                .saturating_add(target)
                .saturating_add(target / 4);
        }
        let target = target.min(self.limit);
        self.bytes
            .try_reserve_exact(target - self.bytes.len())
            .map_err(|_| ErrorKind::AllocationFailed)
    }

    /// Copy the contents out as a string, replacing invalid UTF-8
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_clear() -> Result<(), ErrorKind> {
        let mut buf = TokenBuffer::new(MAX_TOKEN_SIZE);
        buf.allocate()?;
        buf.extend_from_slice(b"abc")?;
        buf.push(b'd')?;
        assert_eq!(buf.as_bytes(), b"abcd");
        buf.clear();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= INITIAL_CAPACITY);
        Ok(())
    }

    #[test]
    fn test_growth_factor() -> Result<(), ErrorKind> {
        let mut buf = TokenBuffer::new(MAX_TOKEN_SIZE);
        buf.allocate()?;
        let before = buf.capacity();
        buf.extend_from_slice(&vec![b'x'; before + 1])?;
        // at least old + old + old/4
        assert!(buf.capacity() >= before * 2 + before / 4);
        Ok(())
    }

    #[test]
    fn test_limit_rejects_growth() {
        let mut buf = TokenBuffer::new(8);
        assert_eq!(buf.extend_from_slice(b"12345678"), Ok(()));
        assert_eq!(buf.push(b'9'), Err(ErrorKind::TokenTooLarge { max: 8 }));
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn test_limit_is_clamped() {
        let buf = TokenBuffer::new(usize::MAX);
        assert_eq!(buf.limit, MAX_TOKEN_SIZE);
    }
}
