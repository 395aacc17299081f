use super::MessageError;

/// Big-endian, length-unprefixed writer matching Solidity's `abi.encodePacked`.
#[derive(Debug, Default)]
pub(crate) struct Packer {
    buf: Vec<u8>,
}

impl Packer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    pub(crate) fn u16(mut self, value: u16) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub(crate) fn u32(mut self, value: u32) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub(crate) fn u64(mut self, value: u64) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub(crate) fn bool(mut self, value: bool) -> Self {
        self.buf.push(u8::from(value));
        self
    }

    pub(crate) fn fixed(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// `uint32(len) ‖ bytes`
    pub(crate) fn prefixed(self, bytes: &[u8]) -> Self {
        self.u32(bytes.len() as u32).fixed(bytes)
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Reader over a packed message. Any read past the end reports the full input length against
/// the number of bytes the message needed up to that point.
#[derive(Debug)]
pub(crate) struct Unpacker<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> Unpacker<'a> {
    pub(crate) fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], MessageError> {
        let end = self.offset + len;
        if end > self.input.len() {
            return Err(MessageError::InvalidMessageLength {
                actual: self.input.len() as u32,
                expected: end as u32,
            });
        }
        let bytes = &self.input[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], MessageError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn u16(&mut self) -> Result<u16, MessageError> {
        self.array().map(u16::from_be_bytes)
    }

    pub(crate) fn u32(&mut self) -> Result<u32, MessageError> {
        self.array().map(u32::from_be_bytes)
    }

    pub(crate) fn u64(&mut self) -> Result<u64, MessageError> {
        self.array().map(u64::from_be_bytes)
    }

    pub(crate) fn bool(&mut self) -> Result<bool, MessageError> {
        Ok(self.take(1)?[0] != 0)
    }

    pub(crate) fn bytes32(&mut self) -> Result<[u8; 32], MessageError> {
        self.array()
    }

    pub(crate) fn bytes20(&mut self) -> Result<[u8; 20], MessageError> {
        self.array()
    }

    pub(crate) fn fixed(&mut self, len: usize) -> Result<Vec<u8>, MessageError> {
        self.take(len).map(<[u8]>::to_vec)
    }

    pub(crate) fn prefixed(&mut self) -> Result<Vec<u8>, MessageError> {
        let len = self.u32()? as usize;
        self.fixed(len)
    }

    /// Fails when bytes remain after the last field.
    pub(crate) fn finish(self) -> Result<(), MessageError> {
        if self.offset != self.input.len() {
            return Err(MessageError::InvalidMessageLength {
                actual: self.input.len() as u32,
                expected: self.offset as u32,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packer_is_big_endian() {
        let packed = Packer::default().u16(1).u32(2).u64(3).bool(true).finish();
        assert_eq!(packed, vec![0, 1, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 3, 1]);
    }

    #[test]
    fn test_unpacker_reports_needed_length() {
        let input = [0u8; 5];
        let mut unpacker = Unpacker::new(&input);
        unpacker.u32().unwrap();
        assert_eq!(
            unpacker.u64().unwrap_err(),
            MessageError::InvalidMessageLength { actual: 5, expected: 12 }
        );
    }

    #[test]
    fn test_unpacker_rejects_trailing_bytes() {
        let input = [0u8; 3];
        let mut unpacker = Unpacker::new(&input);
        unpacker.u16().unwrap();
        assert_eq!(
            unpacker.finish().unwrap_err(),
            MessageError::InvalidMessageLength { actual: 3, expected: 2 }
        );
    }
}
