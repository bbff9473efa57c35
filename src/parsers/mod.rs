pub mod scan_packet_parser;

pub use self::scan_packet_parser::{RawScanPacket, ScanPacket, ScanPacketDecoder, ScanPacketParser};
