fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

/// Golden-byte tests pinning the wire format.
///
/// Every frame layout and byte assignment here is load-bearing: peers built
/// against older revisions parse these exact bytes. A failing test in this
/// crate means a wire break, not a bug in the test.
#[cfg(test)]
mod tests {
    use linehaul_protocol::{
        Command, Control, Digest, PACKET_SIZE, Reply, StartFrame, Status, TAG_PACKET, TAG_START,
        crc32, decode_packet, decode_reply_header, decode_request_header, encode_packet,
        encode_reply, encode_request, packet_count,
    };
    use linehaul_transfer::checksum;

    // -- byte tables --------------------------------------------------------

    #[test]
    fn command_byte_assignments_are_stable() {
        let table: [(Command, u8); 7] = [
            (Command::StartDownload, 1),
            (Command::StartUpload, 2),
            (Command::RequestPacket, 3),
            (Command::SendPacket, 4),
            (Command::CancelUpload, 5),
            (Command::CancelDownload, 6),
            (Command::FinalizeUpload, 7),
        ];
        for (command, byte) in table {
            assert_eq!(command.as_byte(), byte);
            assert_eq!(Command::from_byte(byte), Some(command));
        }
        // Byte 0 stays reserved so a zeroed buffer never looks like a command.
        assert_eq!(Command::from_byte(0), None);
        assert_eq!(Command::from_byte(8), None);
    }

    #[test]
    fn status_byte_assignments_are_stable() {
        let table: [(Status, u8); 9] = [
            (Status::Success, 0),
            (Status::FileIo, 1),
            (Status::FileDoesntExist, 2),
            (Status::AlreadyDownloading, 3),
            (Status::AlreadyUploading, 4),
            (Status::NotDownloading, 5),
            (Status::NotUploading, 6),
            (Status::DownloadOver, 7),
            (Status::ShasumMismatch, 8),
        ];
        for (status, byte) in table {
            assert_eq!(status.as_byte(), byte);
            assert_eq!(Status::from_byte(byte), Some(status));
        }
        assert_eq!(Status::from_byte(9), None);
    }

    #[test]
    fn control_byte_assignments_are_stable() {
        let table: [(Control, u8); 4] = [
            (Control::Next, 3),
            (Control::Again, 4),
            (Control::End, 5),
            (Control::Error, 6),
        ];
        for (control, byte) in table {
            assert_eq!(control.as_byte(), byte);
            assert_eq!(Control::from_byte(byte), Some(control));
        }
        assert_eq!(Control::from_byte(0), None);
    }

    #[test]
    fn frame_tags_are_stable() {
        assert_eq!(TAG_START, 1);
        assert_eq!(TAG_PACKET, 2);
    }

    #[test]
    fn packet_size_ceiling_is_stable() {
        assert_eq!(PACKET_SIZE, 0x8000);
    }

    // -- checksum vectors ---------------------------------------------------

    #[test]
    fn crc32_known_vectors() {
        assert_eq!(crc32(b""), 0);
        assert_eq!(crc32(b"hello"), 0x3610_A686);
        assert_eq!(
            crc32(b"The quick brown fox jumps over the lazy dog"),
            0x414F_A339
        );
    }

    #[test]
    fn sha256_known_vectors() {
        assert_eq!(
            checksum::digest_bytes(b"hello").to_string(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(
            checksum::digest_bytes(b"").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    // -- golden frames ------------------------------------------------------

    #[test]
    fn start_frame_golden_bytes() {
        let sha: Digest = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
            .parse()
            .unwrap();
        let frame = StartFrame {
            file_len: 100_000,
            packet_count: 4,
            sha256: sha,
        };

        let mut expected = Vec::with_capacity(49);
        expected.push(0x01); // TAG_START
        expected.extend_from_slice(&[0xA0, 0x86, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]); // 100000 LE
        expected.extend_from_slice(&[0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]); // 4 LE
        expected.extend_from_slice(sha.as_bytes());

        assert_eq!(frame.encode().to_vec(), expected);
        assert_eq!(StartFrame::decode(&expected).unwrap(), frame);
    }

    #[test]
    fn packet_frame_golden_bytes() {
        // crc32("hello") = 0x3610A686, little-endian on the wire.
        let expected = [
            0x02, // TAG_PACKET
            0x05, 0x00, // len = 5 LE
            0x86, 0xA6, 0x10, 0x36, // crc LE
            b'h', b'e', b'l', b'l', b'o',
        ];
        assert_eq!(encode_packet(b"hello").unwrap(), expected);

        let (header, data) = decode_packet(&expected).unwrap();
        assert_eq!(header.len, 5);
        assert_eq!(header.crc32, 0x3610_A686);
        assert_eq!(data, b"hello");
    }

    #[test]
    fn request_frame_golden_bytes() {
        let frame = encode_request(Command::StartDownload, b"/tmp/a.bin").unwrap();
        assert_eq!(frame[0], 0x01);
        assert_eq!(&frame[1..3], &[0x0A, 0x00]); // len = 10 LE
        assert_eq!(&frame[3..], b"/tmp/a.bin");

        let (command, len) = decode_request_header(&frame[..3]).unwrap();
        assert_eq!(command, Command::StartDownload.as_byte());
        assert_eq!(len, 10);
    }

    #[test]
    fn reply_frame_golden_bytes() {
        let frame = encode_reply(&Reply::ok(b"abc".to_vec())).unwrap();
        assert_eq!(frame, [0x00, 0x03, 0x00, b'a', b'b', b'c']);

        let (status, len) = decode_reply_header(&frame[..3]).unwrap();
        assert_eq!(status, Status::Success);
        assert_eq!(len, 3);

        let empty = encode_reply(&Reply::empty(Status::DownloadOver)).unwrap();
        assert_eq!(empty, [0x07, 0x00, 0x00]);
    }

    // -- packetization ------------------------------------------------------

    #[test]
    fn hundred_kilobyte_file_splits_into_four_packets() {
        assert_eq!(packet_count(100_000), 4);
        let sizes: Vec<usize> = (0..4)
            .map(|i| (100_000 - i * PACKET_SIZE).min(PACKET_SIZE))
            .collect();
        assert_eq!(sizes, [32768, 32768, 32768, 2696]);
    }

    #[test]
    fn packet_count_boundaries() {
        assert_eq!(packet_count(0), 0);
        assert_eq!(packet_count(1), 1);
        assert_eq!(packet_count(PACKET_SIZE as u64), 1);
        assert_eq!(packet_count(PACKET_SIZE as u64 + 1), 2);
    }

    #[test]
    fn digest_wire_text_is_lowercase_hex() {
        let digest = checksum::digest_bytes(b"hello");
        let text = digest.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(text.parse::<Digest>().unwrap(), digest);
        assert_eq!(hex::decode(&text).unwrap(), digest.as_bytes());
    }
}
