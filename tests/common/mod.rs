use std::fs;
use std::path::{Path, PathBuf};

/// Header cards for a capture starting 2016-01-01T01:00:00.5Z.
pub fn header_cards(nbits: u32, pktfmt: &str, obsbw: f64, blocsize: usize) -> Vec<String> {
    vec![
        "BACKEND = 'GUPPI   '".to_string(),
        format!("PKTFMT  = '{pktfmt:<8}'"),
        format!("OBSBW   = {obsbw}"),
        "OBSFREQ = 1000".to_string(),
        "STT_IMJD= 57388".to_string(),
        "STT_SMJD= 3600".to_string(),
        "STT_OFFS= 0.5".to_string(),
        format!("BLOCSIZE= {blocsize}"),
        "PKTSIZE = 8192".to_string(),
        "NPKT    = 1".to_string(),
        format!("NBITS   = {nbits}"),
        "END".to_string(),
    ]
}

pub fn header_bytes(cards: &[String]) -> Vec<u8> {
    let mut dat = Vec::new();
    for card in cards {
        dat.extend(format!("{card:<80}").bytes());
    }
    dat
}

/// Write a capture file named `name` in `dir` and return its path.
pub fn write_capture(dir: &Path, name: &str, cards: &[String], data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    let mut dat = header_bytes(cards);
    dat.extend(data);
    fs::write(&path, dat).expect("failed to write capture");
    path
}

/// Deterministic block data.
pub fn block_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 256) as u8).collect()
}
