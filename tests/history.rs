use rust_ruuvitag_decoder::history::{air, legacy};
use rust_ruuvitag_decoder::{
    classify, decode_hex_advertisement, Advertisement, DecodeError, FrameClass, HistoryProtocol,
    LogDownload, Progress, SensorReading,
};

/// E1 bytes 0-27: 24.3°C, 53.49%, 1000.44 hPa, PM 1.1/2.5/4.0/5.2, 450 ppm,
/// VOC/NOx high bits 50/1, 123.45 lux, sequence 0x010203
const AIR_FIELDS: &str = "E112FC5394C37C000B00190028003401C23201003039FFFFFF010203";
const AIR_RESERVED: &str = "FFFFFFFFFF";

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn bytes(hex_str: &str) -> Vec<u8> {
    hex::decode(hex_str).unwrap()
}

fn air_record(timestamp: u32, flags: u8) -> Vec<u8> {
    let mut record = timestamp.to_be_bytes().to_vec();
    record.extend_from_slice(&bytes(AIR_FIELDS));
    record.push(flags);
    record.extend_from_slice(&bytes(AIR_RESERVED));
    record
}

fn air_packet(records: &[Vec<u8>]) -> Vec<u8> {
    let mut packet = bytes("3B3B20");
    packet.push(records.len() as u8);
    packet.push(air::RECORD_LEN as u8);
    for record in records {
        packet.extend_from_slice(record);
    }
    packet
}

#[test]
fn classifies_log_packets() {
    init();
    assert_eq!(classify(&bytes("0501020304")), FrameClass::Ignore);
    assert_eq!(classify(&bytes("3a3a10FFFFFFFFFFFFFFFF")), FrameClass::End);
    assert_eq!(classify(&bytes("3030F0FFFFFFFFFFFFFFFF")), FrameClass::Error);
    assert_eq!(classify(&bytes("3a30106553F1000000098C")), FrameClass::Data);
}

#[test]
fn legacy_records() {
    init();
    let temperature = legacy::decode(&bytes("3a30106553F1000000098C")).unwrap();
    assert_eq!(temperature.timestamp, 1_700_000_000);
    assert_eq!(temperature.temperature, Some(24.44));
    assert_eq!(temperature.humidity, None);

    let pressure = legacy::decode(&bytes("3a32106553F100000003F5")).unwrap();
    assert_eq!(pressure.pressure, Some(1013.0));
    assert_eq!(pressure.temperature, None);

    assert_eq!(
        legacy::try_decode(&bytes("3a33106553F100000003F5")),
        Err(DecodeError::MalformedRecord("unknown measurement"))
    );
    assert_eq!(legacy::decode(&air_packet(&[air_record(1, 0)])), None);
}

#[test]
fn air_quality_packet_with_two_records() {
    init();
    let packet = air_packet(&[air_record(1_700_000_000, 0x00), air_record(1_700_000_600, 0xC1)]);
    assert_eq!(&packet[..5], &bytes("3B3B200226")[..]);

    let records = air::decode(&packet);
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first.timestamp, 1_700_000_000);
    assert_eq!(first.temperature, Some(24.3));
    assert_eq!(first.humidity, Some(53.49));
    assert_eq!(first.pressure, Some(1000.44));
    assert_eq!(first.pm_1_0, Some(1.1));
    assert_eq!(first.pm_10_0, Some(5.2));
    assert_eq!(first.co2, Some(450));
    assert_eq!(first.voc, Some(100));
    assert_eq!(first.nox, Some(2));
    assert_eq!(first.luminosity, Some(123.45));
    assert_eq!(first.measurement_sequence_number, Some(0x010203));
    assert_eq!(first.calibration_in_progress, Some(false));

    let second = &records[1];
    assert_eq!(second.timestamp, 1_700_000_600);
    assert_eq!(second.voc, Some(101));
    assert_eq!(second.nox, Some(3));
    assert_eq!(second.calibration_in_progress, Some(true));
}

#[test]
fn bad_record_leaves_siblings_intact() {
    init();
    let mut bad = air_record(2, 0);
    bad[4] = 0x05;
    let records = air::decode(&air_packet(&[air_record(1, 0), bad, air_record(3, 0)]));
    let timestamps: Vec<u32> = records.iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, vec![1, 3]);
}

#[test]
fn empty_batch_ends_air_quality_download() {
    init();
    let mut download = LogDownload::new(HistoryProtocol::AirQuality);
    assert_eq!(download.push(&bytes("0501020304")), Progress::Continue);
    assert_eq!(
        download.push(&air_packet(&[air_record(10, 0), air_record(20, 0)])),
        Progress::Continue
    );
    assert_eq!(download.push(&bytes("3B3B200026")), Progress::Finished);
    assert_eq!(download.rejected(), 0);
    assert_eq!(download.into_records().len(), 2);
}

#[test]
fn legacy_download_session() {
    init();
    let mut download = LogDownload::new(HistoryProtocol::Legacy);
    for packet in [
        "0501020304",
        "3a30106553F1000000098C",
        "3a31106553F1000000116C",
        "3a32106553F100000003F5",
    ] {
        assert_eq!(download.push(&bytes(packet)), Progress::Continue);
    }
    assert_eq!(download.push(&bytes("3a3a10FFFFFFFFFFFFFFFF")), Progress::Finished);

    let records = download.into_records();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.timestamp == 1_700_000_000));
    assert_eq!(records[1].humidity, Some(44.6));
}

#[test]
fn error_packet_aborts_download() {
    init();
    let mut download = LogDownload::new(HistoryProtocol::Legacy);
    download.push(&bytes("3a30106553F1000000098C"));
    assert_eq!(download.push(&bytes("3030F0FFFFFFFFFFFFFFFF")), Progress::Failed);
    assert_eq!(download.records().len(), 1);
}

#[test]
fn history_record_matches_e1_advertisement() {
    init();
    let advertisement = format!("0201062BFF9904{}00{}CBB8334C884F", AIR_FIELDS, AIR_RESERVED);
    let reading = match decode_hex_advertisement(&advertisement, None).unwrap() {
        Advertisement::Measurement(SensorReading::E1(data)) => data,
        other => panic!("unexpected {:?}", other),
    };

    let record = air::decode_record(&air_record(1, 0)).unwrap();
    assert_eq!(record.temperature, reading.temperature);
    assert_eq!(record.pm_2_5, reading.pm_2_5);
    assert_eq!(record.voc, reading.voc);
    assert_eq!(record.luminosity, reading.luminosity);
    assert_eq!(reading.mac, "CB:B8:33:4C:88:4F");
}
