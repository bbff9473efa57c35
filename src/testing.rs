//! Test doubles for the serial link and wire-format builders.

use crate::answers::ResponseHeader;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;

/// Scripted serial port: reads drain a fixed byte script, writes land in a
/// shared transmit log the test keeps a handle to.
#[derive(Debug)]
pub struct MockPort {
    rx: VecDeque<u8>,
    tx: Rc<RefCell<Vec<u8>>>,
}

impl MockPort {
    pub fn new(rx: &[u8]) -> (MockPort, Rc<RefCell<Vec<u8>>>) {
        let tx = Rc::new(RefCell::new(Vec::new()));
        (
            MockPort {
                rx: rx.iter().copied().collect(),
                tx: tx.clone(),
            },
            tx,
        )
    }
}

impl Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut read = 0;
        while read < buf.len() {
            match self.rx.pop_front() {
                Some(byte) => {
                    buf[read] = byte;
                    read += 1;
                }
                None => break,
            }
        }
        Ok(read)
    }
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Wire bytes of a response header.
pub fn header_bytes(ans_type: u8, size: u32) -> Vec<u8> {
    ResponseHeader {
        size,
        sub_type: 0,
        ans_type,
    }
    .encode()
    .to_vec()
}

/// Encodes an angle in degrees the way the sensor does: Q6 shifted left by
/// one with the check bit set.
pub fn encode_angle(degrees: f32) -> u16 {
    (((degrees * 64.0) as u16) << 1) | 1
}

/// Packs one sample record.
pub fn sample_bytes(intensity: u16, distance: u16) -> [u8; 3] {
    [
        (intensity & 0xFF) as u8,
        (((distance & 0x3F) << 2) as u8) | ((intensity >> 8) & 0x03) as u8,
        (distance >> 6) as u8,
    ]
}

/// Builds a complete scan packet; the checksum field is written verbatim.
pub fn scan_packet(ct: u8, fsa: u16, lsa: u16, checksum: u16, samples: &[(u16, u16)]) -> Vec<u8> {
    let mut bytes = vec![0xAA, 0x55, ct, samples.len() as u8];
    bytes.extend_from_slice(&fsa.to_le_bytes());
    bytes.extend_from_slice(&lsa.to_le_bytes());
    bytes.extend_from_slice(&checksum.to_le_bytes());
    for &(intensity, distance) in samples {
        bytes.extend_from_slice(&sample_bytes(intensity, distance));
    }
    bytes
}
