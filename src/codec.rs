//! IEC 60870-5-104 frame codec for tokio.
//!
//! Encodes and decodes APDUs using the tokio-util codec framework. The
//! codec handles only the link-layer envelope: the ASDU body of an
//! I-frame is carried as raw bytes and parsed one layer up, so a bad
//! application payload can be dropped without losing frame alignment.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::Iec104Error;
use crate::types::{
    Apci, UFunction, MAX_APDU_LENGTH, MAX_ASDU_LENGTH, MIN_APDU_LENGTH, START_BYTE,
};

/// An IEC 104 APDU (Application Protocol Data Unit).
///
/// The payload is the raw ASDU body for I-frames and empty for S/U frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Apdu {
    /// APCI (Application Protocol Control Information)
    pub apci: Apci,
    /// Raw ASDU body (I-frames only)
    pub payload: Bytes,
}

impl Apdu {
    /// Create a new I-frame APDU with an encoded ASDU body.
    pub fn i_frame(send_seq: u16, recv_seq: u16, payload: Bytes) -> Self {
        Self {
            apci: Apci::i_frame(send_seq, recv_seq),
            payload,
        }
    }

    /// Create a new S-frame APDU.
    pub fn s_frame(recv_seq: u16) -> Self {
        Self {
            apci: Apci::s_frame(recv_seq),
            payload: Bytes::new(),
        }
    }

    /// Create a new U-frame APDU.
    pub fn u_frame(function: UFunction) -> Self {
        Self {
            apci: Apci::u_frame(function),
            payload: Bytes::new(),
        }
    }

    /// Check if this is an I-frame.
    pub fn is_i_frame(&self) -> bool {
        self.apci.is_i_frame()
    }

    /// Check if this is an S-frame.
    pub fn is_s_frame(&self) -> bool {
        self.apci.is_s_frame()
    }

    /// Check if this is a U-frame.
    pub fn is_u_frame(&self) -> bool {
        self.apci.is_u_frame()
    }
}

impl std::fmt::Display for Apdu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.apci)?;
        if !self.payload.is_empty() {
            write!(f, " [{} bytes]", self.payload.len())?;
        }
        Ok(())
    }
}

/// IEC 60870-5-104 frame codec.
///
/// A truncated buffer is a resumable condition (`Ok(None)`), never an
/// error. A wrong start byte or an out-of-range length is fatal to the
/// connection: an outstation must not resynchronize on garbage.
#[derive(Debug, Clone, Default)]
pub struct Iec104Codec {
    state: DecodeState,
}

#[derive(Debug, Clone, Copy, Default)]
enum DecodeState {
    #[default]
    Header,
    Body {
        length: usize,
    },
}

impl Iec104Codec {
    /// Create a new IEC 104 codec.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for Iec104Codec {
    type Item = Apdu;
    type Error = Iec104Error;

    fn decode(
        &mut self,
        src: &mut BytesMut,
    ) -> std::result::Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                DecodeState::Header => {
                    if src.len() < 2 {
                        return Ok(None);
                    }

                    if src[0] != START_BYTE {
                        return Err(Iec104Error::InvalidStartByte(src[0]));
                    }

                    let length = src[1] as usize;
                    if length > MAX_APDU_LENGTH {
                        return Err(Iec104Error::FrameTooLarge(length));
                    }
                    if length < MIN_APDU_LENGTH {
                        return Err(Iec104Error::invalid_frame_static(
                            "APDU length below minimum",
                        ));
                    }

                    src.advance(2);
                    self.state = DecodeState::Body { length };
                }

                DecodeState::Body { length } => {
                    if src.len() < length {
                        src.reserve(length - src.len());
                        return Ok(None);
                    }

                    let frame = src.split_to(length);
                    self.state = DecodeState::Header;

                    let apci = Apci::parse(&frame[..4])?;

                    let payload = if frame.len() > 4 {
                        if !apci.is_i_frame() {
                            return Err(Iec104Error::invalid_frame_static(
                                "S/U frame with payload",
                            ));
                        }
                        Bytes::copy_from_slice(&frame[4..])
                    } else {
                        Bytes::new()
                    };

                    return Ok(Some(Apdu { apci, payload }));
                }
            }
        }
    }
}

impl Encoder<Apdu> for Iec104Codec {
    type Error = Iec104Error;

    fn encode(&mut self, item: Apdu, dst: &mut BytesMut) -> std::result::Result<(), Self::Error> {
        if item.payload.len() > MAX_ASDU_LENGTH {
            return Err(Iec104Error::FrameTooLarge(4 + item.payload.len()));
        }

        dst.reserve(6 + item.payload.len());
        dst.extend_from_slice(&item.apci.encode_header(item.payload.len()));
        dst.extend_from_slice(&item.payload);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_u_frame() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::from(&[0x68, 0x04, 0x07, 0x00, 0x00, 0x00][..]);

        let apdu = codec.decode(&mut buf).unwrap().unwrap();
        assert!(apdu.is_u_frame());
        assert_eq!(
            apdu.apci,
            Apci::UFrame {
                function: UFunction::StartDtAct
            }
        );
    }

    #[test]
    fn test_decode_s_frame() {
        let mut codec = Iec104Codec::new();
        // S-frame with recv_seq = 100
        let mut buf = BytesMut::from(&[0x68, 0x04, 0x01, 0x00, 0xC8, 0x00][..]);

        let apdu = codec.decode(&mut buf).unwrap().unwrap();
        assert!(apdu.is_s_frame());
        assert_eq!(apdu.apci.recv_seq(), Some(100));
    }

    #[test]
    fn test_decode_i_frame_carries_payload() {
        let mut codec = Iec104Codec::new();
        // I-frame S=1 R=2 with a 3-byte body
        let mut buf = BytesMut::from(&[0x68, 0x07, 0x02, 0x00, 0x04, 0x00, 0xAA, 0xBB, 0xCC][..]);

        let apdu = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(apdu.apci.send_seq(), Some(1));
        assert_eq!(apdu.apci.recv_seq(), Some(2));
        assert_eq!(&apdu.payload[..], &[0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_encode_u_frame() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::new();

        codec
            .encode(Apdu::u_frame(UFunction::StartDtCon), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], &[0x68, 0x04, 0x0B, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_s_frame() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::new();

        codec.encode(Apdu::s_frame(100), &mut buf).unwrap();
        assert_eq!(&buf[..], &[0x68, 0x04, 0x01, 0x00, 0xC8, 0x00]);
    }

    #[test]
    fn test_decode_partial_frame_resumable() {
        let mut codec = Iec104Codec::new();

        let mut buf = BytesMut::from(&[0x68][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&[0x04, 0x07]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&[0x00, 0x00, 0x00]);
        let apdu = codec.decode(&mut buf).unwrap().unwrap();
        assert!(apdu.is_u_frame());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_invalid_start_byte() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::from(&[0xFF, 0x04, 0x07, 0x00, 0x00, 0x00][..]);

        match codec.decode(&mut buf) {
            Err(Iec104Error::InvalidStartByte(0xFF)) => {}
            other => panic!("expected InvalidStartByte, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_frame_too_large() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::from(&[0x68, 0xFE][..]);

        match codec.decode(&mut buf) {
            Err(Iec104Error::FrameTooLarge(254)) => {}
            other => panic!("expected FrameTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_length_below_minimum() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::from(&[0x68, 0x02][..]);
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn test_encode_oversized_payload() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::new();

        let payload = Bytes::from(vec![0u8; MAX_ASDU_LENGTH + 1]);
        let result = codec.encode(Apdu::i_frame(0, 0, payload), &mut buf);
        assert!(matches!(result, Err(Iec104Error::FrameTooLarge(_))));
    }

    #[test]
    fn test_roundtrip_back_to_back_frames() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::new();

        codec
            .encode(Apdu::u_frame(UFunction::TestFrAct), &mut buf)
            .unwrap();
        codec.encode(Apdu::s_frame(32767), &mut buf).unwrap();
        codec
            .encode(
                Apdu::i_frame(10, 20, Bytes::from_static(&[0x01, 0x02])),
                &mut buf,
            )
            .unwrap();

        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert!(first.is_u_frame());
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(second.apci.recv_seq(), Some(32767));
        let third = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(third.apci.send_seq(), Some(10));
        assert_eq!(&third.payload[..], &[0x01, 0x02]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }
}
