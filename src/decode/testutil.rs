//! 测试用 WAV 构造器（仅测试编译）

use std::io::Write;

use tempfile::NamedTempFile;

pub(crate) struct WavBuilder {
    sample_rate: u32,
    channels: u16,
    bits: u16,
    format_code: u16,
    fmt_extension: Vec<u8>,
    riff_tag: [u8; 4],
    wave_tag: [u8; 4],
    fmt_tag: [u8; 4],
    data_tag: [u8; 4],
    riff_size: Option<u32>,
    declared_data_len: Option<u32>,
    before_data: Vec<([u8; 4], Vec<u8>)>,
    after_data: Vec<([u8; 4], Vec<u8>)>,
    payload: Vec<u8>,
}

impl WavBuilder {
    pub fn new(sample_rate: u32, channels: u16, bits: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits,
            format_code: 1,
            fmt_extension: Vec::new(),
            riff_tag: *b"RIFF",
            wave_tag: *b"WAVE",
            fmt_tag: *b"fmt ",
            data_tag: *b"data",
            riff_size: None,
            declared_data_len: None,
            before_data: Vec::new(),
            after_data: Vec::new(),
            payload: Vec::new(),
        }
    }

    /// 确定性填充的负载（字节值 = 下标 mod 251）
    pub fn payload_len(mut self, len: usize) -> Self {
        self.payload = (0..len).map(|i| (i % 251) as u8).collect();
        self
    }

    pub fn format_code(mut self, code: u16) -> Self {
        self.format_code = code;
        self
    }

    pub fn fmt_extension(mut self, extra: &[u8]) -> Self {
        self.fmt_extension = extra.to_vec();
        self
    }

    pub fn riff_tag(mut self, tag: &[u8; 4]) -> Self {
        self.riff_tag = *tag;
        self
    }

    pub fn wave_tag(mut self, tag: &[u8; 4]) -> Self {
        self.wave_tag = *tag;
        self
    }

    pub fn fmt_tag(mut self, tag: &[u8; 4]) -> Self {
        self.fmt_tag = *tag;
        self
    }

    pub fn data_tag(mut self, tag: &[u8; 4]) -> Self {
        self.data_tag = *tag;
        self
    }

    pub fn riff_size(mut self, size: u32) -> Self {
        self.riff_size = Some(size);
        self
    }

    pub fn declared_data_len(mut self, len: u32) -> Self {
        self.declared_data_len = Some(len);
        self
    }

    pub fn chunk_before_data(mut self, tag: &[u8; 4], body: &[u8]) -> Self {
        self.before_data.push((*tag, body.to_vec()));
        self
    }

    pub fn chunk_after_data(mut self, tag: &[u8; 4], body: &[u8]) -> Self {
        self.after_data.push((*tag, body.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.riff_tag);
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&self.wave_tag);

        let block_align = self.channels * (self.bits / 8);
        let byte_rate = self.sample_rate * block_align as u32;
        let mut fmt = Vec::new();
        fmt.extend_from_slice(&self.format_code.to_le_bytes());
        fmt.extend_from_slice(&self.channels.to_le_bytes());
        fmt.extend_from_slice(&self.sample_rate.to_le_bytes());
        fmt.extend_from_slice(&byte_rate.to_le_bytes());
        fmt.extend_from_slice(&block_align.to_le_bytes());
        fmt.extend_from_slice(&self.bits.to_le_bytes());
        fmt.extend_from_slice(&self.fmt_extension);
        push_chunk(&mut out, &self.fmt_tag, &fmt, None);

        for (tag, body) in &self.before_data {
            push_chunk(&mut out, tag, body, None);
        }
        push_chunk(&mut out, &self.data_tag, &self.payload, self.declared_data_len);
        for (tag, body) in &self.after_data {
            push_chunk(&mut out, tag, body, None);
        }

        let riff_size = self.riff_size.unwrap_or((out.len() - 8) as u32);
        out[4..8].copy_from_slice(&riff_size.to_le_bytes());
        out
    }

    pub fn write_temp(&self) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&self.build()).unwrap();
        file.flush().unwrap();
        file
    }
}

fn push_chunk(out: &mut Vec<u8>, tag: &[u8; 4], body: &[u8], declared: Option<u32>) {
    out.extend_from_slice(tag);
    out.extend_from_slice(&declared.unwrap_or(body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    if body.len() % 2 == 1 {
        out.push(0);
    }
}
