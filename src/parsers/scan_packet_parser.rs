use crate::base::{ByteStream, Deadline, Error, Result};
use crate::checksum::{scan_packet_checksum, SCAN_PACKET_HEAD};
use crate::degree_table::DegreeTable;
use crate::types::{ChecksumMode, PacketType, ScanSample};
use crate::utils::{angle_correction, angle_span, decode_angle, interpolate_angle, normalize_angle};
use log::{debug, trace, warn};
use std::time::Duration;

/// Size of the fixed part of a scan packet.
pub const SCAN_PACKET_PREAMBLE_SIZE: usize = 10;

/// Size of one sample record.
pub const SCAN_SAMPLE_SIZE: usize = 3;

const HEAD_LOW: u8 = (SCAN_PACKET_HEAD & 0xFF) as u8;
const HEAD_HIGH: u8 = (SCAN_PACKET_HEAD >> 8) as u8;

/// A scan packet as framed off the wire, before reconstruction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawScanPacket {
    /// Packet type byte.
    pub ct: u8,
    /// Number of samples (LSN).
    pub lsn: u8,
    /// Encoded angle of the first sample (FSA).
    pub fsa: u16,
    /// Encoded angle of the last sample (LSA).
    pub lsa: u16,
    /// Checksum field as received.
    pub checksum: u16,
    /// `3 * lsn` bytes of sample records.
    pub samples: Vec<u8>,
}

impl RawScanPacket {
    /// Angle of the first sample in degrees.
    pub fn first_angle(&self) -> f32 {
        decode_angle(self.fsa)
    }

    /// Angle of the last sample in degrees.
    pub fn last_angle(&self) -> f32 {
        decode_angle(self.lsa)
    }

    /// Checksum computed over the packet contents.
    pub fn computed_checksum(&self) -> u16 {
        scan_packet_checksum(self.ct, self.lsn, self.fsa, self.lsa, &self.samples)
    }

    /// Rebuilds angle, distance and intensity of every sample.
    pub fn reconstruct(&self, correct_angles: bool) -> Vec<ScanSample> {
        let first = self.first_angle();
        let span = angle_span(first, self.last_angle());
        let count = self.lsn as usize;

        self.samples
            .chunks_exact(SCAN_SAMPLE_SIZE)
            .take(count)
            .enumerate()
            .map(|(index, record)| {
                let intensity = record[0] as u16 + (record[1] & 0x03) as u16 * 256;
                let distance = ((record[2] as u16) << 6) + (record[1] >> 2) as u16;

                let mut angle = interpolate_angle(first, span, index, count);
                if correct_angles {
                    angle += angle_correction(distance);
                }

                ScanSample {
                    angle: normalize_angle(angle),
                    distance,
                    intensity,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ParseState {
    Preamble(usize),
    Samples,
}

/// Byte-fed framing state machine for scan packets.
///
/// The preamble is taken one byte per state: the two packet head bytes are
/// the only validated ones (a mismatch on either restarts at the first),
/// everything after them is stored as is. The sample block that follows is
/// read without any validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPacketParser {
    state: ParseState,
    packet: RawScanPacket,
}

impl ScanPacketParser {
    pub fn new() -> ScanPacketParser {
        ScanPacketParser {
            state: ParseState::Preamble(0),
            packet: RawScanPacket::default(),
        }
    }

    /// Forgets any partial packet.
    pub fn reset(&mut self) {
        self.state = ParseState::Preamble(0);
        self.packet = RawScanPacket::default();
    }

    /// Returns `true` while the fixed preamble is still being read.
    pub fn in_preamble(&self) -> bool {
        matches!(self.state, ParseState::Preamble(_))
    }

    /// Feeds one byte, returning the packet once its last byte arrived.
    pub fn push(&mut self, byte: u8) -> Option<RawScanPacket> {
        match self.state {
            ParseState::Preamble(i) => self.push_preamble(i, byte),
            ParseState::Samples => {
                self.packet.samples.push(byte);
                self.take_if_complete()
            }
        }
    }

    fn push_preamble(&mut self, i: usize, byte: u8) -> Option<RawScanPacket> {
        let packet = &mut self.packet;
        match i {
            0 => {
                if byte != HEAD_LOW {
                    return None;
                }
            }
            1 => {
                if byte != HEAD_HIGH {
                    trace!("Packet head mismatch ({:02X}), rescanning", byte);
                    self.state = ParseState::Preamble(0);
                    return None;
                }
            }
            2 => packet.ct = byte,
            3 => packet.lsn = byte,
            4 => packet.fsa = byte as u16,
            5 => packet.fsa |= (byte as u16) << 8,
            6 => packet.lsa = byte as u16,
            7 => packet.lsa |= (byte as u16) << 8,
            8 => packet.checksum = byte as u16,
            _ => packet.checksum |= (byte as u16) << 8,
        }

        if i + 1 < SCAN_PACKET_PREAMBLE_SIZE {
            self.state = ParseState::Preamble(i + 1);
            return None;
        }

        trace!(
            "Packet preamble: CT={:02X} LSN={} FSA={:04X} LSA={:04X} CS={:04X}",
            self.packet.ct,
            self.packet.lsn,
            self.packet.fsa,
            self.packet.lsa,
            self.packet.checksum
        );
        self.state = ParseState::Samples;
        self.packet
            .samples
            .reserve(self.packet.lsn as usize * SCAN_SAMPLE_SIZE);
        self.take_if_complete()
    }

    fn take_if_complete(&mut self) -> Option<RawScanPacket> {
        if self.packet.samples.len() < self.packet.lsn as usize * SCAN_SAMPLE_SIZE {
            return None;
        }
        let packet = std::mem::take(&mut self.packet);
        self.state = ParseState::Preamble(0);
        Some(packet)
    }
}

impl Default for ScanPacketParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded scan packet.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPacket {
    /// Kind of packet, from the CT byte.
    pub packet_type: PacketType,
    /// Angle of the first sample in degrees, as sent.
    pub first_angle: f32,
    /// Angle of the last sample in degrees, as sent.
    pub last_angle: f32,
    /// Reconstructed samples in wire order.
    pub samples: Vec<ScanSample>,
    /// Checksum field as received.
    pub received_checksum: u16,
    /// Checksum computed over the packet.
    pub computed_checksum: u16,
}

impl ScanPacket {
    /// Returns `true` if this packet opens a new revolution.
    pub fn is_ring_start(&self) -> bool {
        self.packet_type == PacketType::RingStart
    }

    /// Returns `true` if the computed checksum equals the received one.
    pub fn checksum_matches(&self) -> bool {
        self.received_checksum == self.computed_checksum
    }
}

/// Reads scan packets off a byte stream and folds them into a degree table.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPacketDecoder {
    parser: ScanPacketParser,
    checksum: ChecksumMode,
    angle_correction: bool,
}

impl ScanPacketDecoder {
    pub fn new(checksum: ChecksumMode, angle_correction: bool) -> ScanPacketDecoder {
        ScanPacketDecoder {
            parser: ScanPacketParser::new(),
            checksum,
            angle_correction,
        }
    }

    /// Forgets any partial packet.
    pub fn reset(&mut self) {
        self.parser.reset();
    }

    /// Waits for the next complete scan packet on `stream`, decodes it and
    /// folds its samples into `table`.
    ///
    /// The preamble and the sample block each get their own `timeout`
    /// budget. On timeout nothing is aggregated and the partial packet is
    /// dropped. In strict checksum mode a mismatching packet is rejected
    /// before aggregation.
    pub fn wait_packet<S>(
        &mut self,
        stream: &mut S,
        table: &mut DegreeTable,
        timeout: Duration,
    ) -> Result<ScanPacket>
    where
        S: ByteStream + ?Sized,
    {
        self.parser.reset();

        // preamble
        let deadline = Deadline::after(timeout);
        let mut raw = None;
        while raw.is_none() && self.parser.in_preamble() {
            let byte = next_byte(stream, &deadline, "preamble")?;
            raw = self.parser.push(byte);
        }

        // sample block, on a fresh budget
        let deadline = Deadline::after(timeout);
        let raw = loop {
            if let Some(raw) = raw.take() {
                break raw;
            }
            let byte = next_byte(stream, &deadline, "samples")?;
            raw = self.parser.push(byte);
        };

        let packet = self.decode(&raw)?;
        table.begin_packet();
        for sample in &packet.samples {
            table.apply(sample);
        }
        Ok(packet)
    }

    fn decode(&self, raw: &RawScanPacket) -> Result<ScanPacket> {
        let packet = ScanPacket {
            packet_type: PacketType::from(raw.ct),
            first_angle: raw.first_angle(),
            last_angle: raw.last_angle(),
            samples: raw.reconstruct(self.angle_correction),
            received_checksum: raw.checksum,
            computed_checksum: raw.computed_checksum(),
        };

        if !packet.checksum_matches() {
            match self.checksum {
                ChecksumMode::Lenient => debug!(
                    "Scan packet checksum mismatch ignored: received {:04X}, computed {:04X}",
                    packet.received_checksum, packet.computed_checksum
                ),
                ChecksumMode::Strict => {
                    warn!(
                        "Scan packet checksum mismatch: received {:04X}, computed {:04X}",
                        packet.received_checksum, packet.computed_checksum
                    );
                    return Err(Error::protocol(format!(
                        "scan packet checksum mismatch: received {:04X}, computed {:04X}",
                        packet.received_checksum, packet.computed_checksum
                    )));
                }
            }
        }

        Ok(packet)
    }
}

/// Polls `stream` for its next byte until `deadline` passes.
fn next_byte<S>(stream: &mut S, deadline: &Deadline, phase: &str) -> Result<u8>
where
    S: ByteStream + ?Sized,
{
    while !deadline.expired() {
        if stream.bytes_available()? == 0 {
            continue;
        }
        if let Some(byte) = stream.read_byte()? {
            return Ok(byte);
        }
    }
    debug!(
        "Timed out reading scan packet {} after {:?}",
        phase,
        deadline.elapsed()
    );
    Err(Error::OperationTimeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Channel;
    use crate::testing::{encode_angle, sample_bytes, scan_packet, MockPort};

    fn parse_all(bytes: &[u8]) -> Vec<RawScanPacket> {
        let mut parser = ScanPacketParser::new();
        bytes.iter().filter_map(|&b| parser.push(b)).collect()
    }

    fn decode_from(bytes: &[u8], decoder: &mut ScanPacketDecoder, table: &mut DegreeTable) -> Result<ScanPacket> {
        let (port, _tx) = MockPort::new(bytes);
        let mut channel = Channel::new(Box::new(port));
        decoder.wait_packet(&mut channel, table, Duration::from_millis(50))
    }

    #[test]
    fn frames_packet_after_noise() {
        let mut bytes = vec![0x00, 0xAA, 0x00, 0x55];
        bytes.extend(scan_packet(1, 0x0501, 0x0701, 0xBEEF, &[(5, 1000), (6, 2000)]));

        let packets = parse_all(&bytes);
        assert_eq!(packets.len(), 1);
        let packet = &packets[0];
        assert_eq!(packet.ct, 1);
        assert_eq!(packet.lsn, 2);
        assert_eq!(packet.fsa, 0x0501);
        assert_eq!(packet.lsa, 0x0701);
        assert_eq!(packet.checksum, 0xBEEF);
        assert_eq!(packet.samples.len(), 6);
    }

    #[test]
    fn head_high_mismatch_drops_byte() {
        // AA AA 55: the second AA fails the high byte check and is not reused
        let mut bytes = vec![0xAA];
        bytes.extend(scan_packet(0, 0x0501, 0x0501, 0, &[(1, 1)]));
        assert_eq!(parse_all(&bytes).len(), 0);
    }

    #[test]
    fn empty_packet_completes_after_preamble() {
        let packets = parse_all(&scan_packet(1, 0x0501, 0x0501, 0, &[]));
        assert_eq!(packets.len(), 1);
        assert!(packets[0].samples.is_empty());
    }

    #[test]
    fn unpacks_sample_fields() {
        let raw = RawScanPacket {
            ct: 0,
            lsn: 1,
            fsa: encode_angle(10.0),
            lsa: encode_angle(10.0),
            checksum: 0,
            samples: sample_bytes(0x3FF, 0x3FFF).to_vec(),
        };
        let samples = raw.reconstruct(false);
        assert_eq!(samples[0].intensity, 0x3FF);
        assert_eq!(samples[0].distance, 0x3FFF);

        let raw = RawScanPacket {
            samples: vec![0x12, 0b1010_1101, 0x07],
            ..raw
        };
        let samples = raw.reconstruct(false);
        assert_eq!(samples[0].intensity, 0x12 + 256);
        assert_eq!(samples[0].distance, (0x07 << 6) + 0b10_1011);
    }

    #[test]
    fn single_sample_lands_in_shifted_bucket() {
        let bytes = scan_packet(0, encode_angle(10.0), encode_angle(10.0), 0, &[(5, 1000)]);
        let mut decoder = ScanPacketDecoder::new(ChecksumMode::Lenient, false);
        let mut table = DegreeTable::new();

        let packet = decode_from(&bytes, &mut decoder, &mut table).unwrap();
        assert_eq!(packet.samples.len(), 1);
        assert_eq!(packet.samples[0].angle, 10.0);
        assert_eq!(table.distance(9), Some(1000));
        assert_eq!(table.intensity(9), Some(5));
    }

    #[test]
    fn corrected_sample_moves_with_offset() {
        let bytes = scan_packet(0, encode_angle(10.0), encode_angle(10.0), 0, &[(5, 1000)]);
        let mut decoder = ScanPacketDecoder::new(ChecksumMode::Lenient, true);
        let mut table = DegreeTable::new();

        let packet = decode_from(&bytes, &mut decoder, &mut table).unwrap();
        let angle = packet.samples[0].angle;
        assert!(angle > 3.2 && angle < 3.3, "got {}", angle);
        assert_eq!(table.distance(2), Some(1000));
        assert_eq!(table.distance(9), Some(0));
    }

    #[test]
    fn interpolates_across_zero() {
        let bytes = scan_packet(
            0,
            encode_angle(359.0),
            encode_angle(1.0),
            0,
            &[(1, 100), (2, 200), (3, 300)],
        );
        let mut decoder = ScanPacketDecoder::new(ChecksumMode::Lenient, false);
        let mut table = DegreeTable::new();

        let packet = decode_from(&bytes, &mut decoder, &mut table).unwrap();
        let angles: Vec<f32> = packet.samples.iter().map(|s| s.angle).collect();
        assert_eq!(angles, vec![359.0, 360.0, 1.0]);
        assert_eq!(table.distance(358), Some(100));
        assert_eq!(table.distance(359), Some(200));
        assert_eq!(table.distance(0), Some(300));
    }

    #[test]
    fn same_degree_keeps_minimum() {
        // both samples fall in bucket 19
        let bytes = scan_packet(
            0,
            encode_angle(20.0),
            encode_angle(20.5),
            0,
            &[(1, 100), (2, 50)],
        );
        let mut decoder = ScanPacketDecoder::new(ChecksumMode::Lenient, false);
        let mut table = DegreeTable::new();
        decode_from(&bytes, &mut decoder, &mut table).unwrap();
        assert_eq!(table.distance(19), Some(50));
        assert_eq!(table.intensity(19), Some(2));

        let bytes = scan_packet(
            0,
            encode_angle(20.0),
            encode_angle(20.5),
            0,
            &[(1, 50), (2, 100)],
        );
        decode_from(&bytes, &mut decoder, &mut table).unwrap();
        assert_eq!(table.distance(19), Some(50));
        assert_eq!(table.intensity(19), Some(1));
    }

    #[test]
    fn checksum_policy() {
        let fsa = encode_angle(30.0);
        let lsa = encode_angle(31.0);
        let samples = [(1, 400), (2, 500)];
        let mut records = Vec::new();
        for &(intensity, distance) in &samples {
            records.extend_from_slice(&sample_bytes(intensity, distance));
        }
        let good = scan_packet_checksum(0, 2, fsa, lsa, &records);

        let mut strict = ScanPacketDecoder::new(ChecksumMode::Strict, false);
        let mut table = DegreeTable::new();
        let packet =
            decode_from(&scan_packet(0, fsa, lsa, good, &samples), &mut strict, &mut table).unwrap();
        assert!(packet.checksum_matches());
        assert_eq!(table.distance(29), Some(400));

        let mut table = DegreeTable::new();
        let result = decode_from(&scan_packet(0, fsa, lsa, good ^ 1, &samples), &mut strict, &mut table);
        assert!(matches!(result, Err(Error::ProtocolError { .. })));
        assert_eq!(table.distance(29), Some(0));

        let mut lenient = ScanPacketDecoder::new(ChecksumMode::Lenient, false);
        let packet =
            decode_from(&scan_packet(0, fsa, lsa, good ^ 1, &samples), &mut lenient, &mut table).unwrap();
        assert!(!packet.checksum_matches());
        assert_eq!(table.distance(29), Some(400));
    }

    #[test]
    fn timeout_in_either_phase_aggregates_nothing() {
        let mut decoder = ScanPacketDecoder::new(ChecksumMode::Lenient, false);
        let mut table = DegreeTable::new();

        let result = decode_from(&[0x01, 0x02], &mut decoder, &mut table);
        assert!(matches!(result, Err(Error::OperationTimeout)));

        let mut truncated = scan_packet(0, encode_angle(45.0), encode_angle(46.0), 0, &[(1, 10), (2, 20)]);
        truncated.truncate(truncated.len() - 2);
        let result = decode_from(&truncated, &mut decoder, &mut table);
        assert!(matches!(result, Err(Error::OperationTimeout)));
        assert!(table.distances().iter().all(|&d| d == 0));
    }

    #[test]
    fn ring_start_flag() {
        let mut decoder = ScanPacketDecoder::new(ChecksumMode::Lenient, false);
        let mut table = DegreeTable::new();
        let packet = decode_from(
            &scan_packet(1, encode_angle(90.0), encode_angle(90.0), 0, &[]),
            &mut decoder,
            &mut table,
        )
        .unwrap();
        assert!(packet.is_ring_start());
        assert_eq!(packet.first_angle, 90.0);
        assert!(packet.samples.is_empty());
    }
}
