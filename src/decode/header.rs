//! RIFF/WAVE 头部布局模型
//!
//! 规范最小头部为 44 字节，按位置解释：
//! `RIFF` · size · `WAVE` · `fmt ` · fmt size · format · channels ·
//! sample rate · byte rate · block align · bits · `data` · data size

use std::fmt;

/// 固定头部前缀长度
pub const CANONICAL_HEADER_LEN: usize = 44;

/// 规范 fmt chunk 负载长度（PCM，无扩展）
pub const CANONICAL_FMT_LEN: u32 = 16;

/// chunk 头长度（4 字节 tag + 4 字节 little-endian 长度）
pub const CHUNK_HEADER_LEN: usize = 8;

/// data chunk 头在规范布局中的偏移
pub const CANONICAL_DATA_HEADER_OFFSET: u64 = 36;

/// 规范布局下 data 负载的偏移
pub const CANONICAL_DATA_OFFSET: u64 = CANONICAL_DATA_HEADER_OFFSET + CHUNK_HEADER_LEN as u64;

/// 可流式输出的位深
pub const SUPPORTED_BITS_PER_SAMPLE: [u16; 4] = [8, 16, 24, 32];

/// 4 字节 chunk 标签
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkTag(pub [u8; 4]);

impl ChunkTag {
    pub const RIFF: ChunkTag = ChunkTag(*b"RIFF");
    pub const WAVE: ChunkTag = ChunkTag(*b"WAVE");
    pub const FMT: ChunkTag = ChunkTag(*b"fmt ");
    pub const DATA: ChunkTag = ChunkTag(*b"data");
    pub const LIST: ChunkTag = ChunkTag(*b"LIST");

    /// 已知的非音频元数据 chunk
    pub const METADATA: [ChunkTag; 7] = [
        ChunkTag::LIST,
        ChunkTag(*b"JUNK"),
        ChunkTag(*b"fact"),
        ChunkTag(*b"bext"),
        ChunkTag(*b"id3 "),
        ChunkTag(*b"PEAK"),
        ChunkTag(*b"cue "),
    ];

    #[inline]
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&bytes[..4]);
        ChunkTag(tag)
    }

    pub fn is_metadata(&self) -> bool {
        Self::METADATA.contains(self)
    }
}

impl fmt::Debug for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkTag({:?})", self.to_string())
    }
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 非 ASCII 字节按转义输出，避免日志乱码
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

/// fmt chunk 中 audio format code 的分类
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleEncoding {
    Pcm,
    IeeeFloat,
    ALaw,
    MuLaw,
    Extensible,
    Other(u16),
}

impl From<u16> for SampleEncoding {
    fn from(code: u16) -> Self {
        match code {
            0x0001 => Self::Pcm,
            0x0003 => Self::IeeeFloat,
            0x0006 => Self::ALaw,
            0x0007 => Self::MuLaw,
            0xFFFE => Self::Extensible,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pcm => write!(f, "PCM"),
            Self::IeeeFloat => write!(f, "IEEE float"),
            Self::ALaw => write!(f, "A-law"),
            Self::MuLaw => write!(f, "mu-law"),
            Self::Extensible => write!(f, "extensible"),
            Self::Other(code) => write!(f, "0x{:04x}", code),
        }
    }
}

/// 容器头部
///
/// 解析后不可变；data chunk 的 tag/长度是元数据 chunk 跳过之后的最终值
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerHeader {
    pub container_tag: ChunkTag,
    pub total_size: u32,
    pub form_type_tag: ChunkTag,
    pub format_chunk_tag: ChunkTag,
    pub format_chunk_size: u32,
    pub audio_format_code: u16,
    pub channel_count: u16,
    pub sample_rate_hz: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_chunk_tag: ChunkTag,
    pub data_chunk_length: u32,
}

impl ContainerHeader {
    /// 按位置解释 44 字节前缀
    pub fn parse_prefix(buf: &[u8; CANONICAL_HEADER_LEN]) -> Self {
        Self {
            container_tag: ChunkTag::from_slice(&buf[0..4]),
            total_size: le_u32(&buf[4..8]),
            form_type_tag: ChunkTag::from_slice(&buf[8..12]),
            format_chunk_tag: ChunkTag::from_slice(&buf[12..16]),
            format_chunk_size: le_u32(&buf[16..20]),
            audio_format_code: le_u16(&buf[20..22]),
            channel_count: le_u16(&buf[22..24]),
            sample_rate_hz: le_u32(&buf[24..28]),
            byte_rate: le_u32(&buf[28..32]),
            block_align: le_u16(&buf[32..34]),
            bits_per_sample: le_u16(&buf[34..36]),
            data_chunk_tag: ChunkTag::from_slice(&buf[36..40]),
            data_chunk_length: le_u32(&buf[40..44]),
        }
    }

    /// 用新读到的 8 字节 chunk 头覆盖 data tag/长度
    pub fn set_data_chunk(&mut self, chunk: &[u8; CHUNK_HEADER_LEN]) {
        self.data_chunk_tag = ChunkTag::from_slice(&chunk[0..4]);
        self.data_chunk_length = le_u32(&chunk[4..8]);
    }

    #[inline]
    pub fn encoding(&self) -> SampleEncoding {
        SampleEncoding::from(self.audio_format_code)
    }

    /// 容器声明的结束位置（RIFF size 不含前 8 字节）
    #[inline]
    pub fn declared_end(&self) -> u64 {
        self.total_size as u64 + CHUNK_HEADER_LEN as u64
    }

    /// fmt chunk 结束后下一个 chunk 的偏移（含 RIFF 字对齐填充）
    #[inline]
    pub fn after_format_chunk(&self) -> u64 {
        20 + padded(self.format_chunk_size)
    }
}

/// RIFF chunk 按偶数字节对齐
#[inline]
pub fn padded(len: u32) -> u64 {
    len as u64 + (len as u64 & 1)
}

#[inline]
fn le_u16(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

#[inline]
fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::testutil::WavBuilder;

    #[test]
    fn test_parse_canonical_prefix() {
        let bytes = WavBuilder::new(16000, 1, 16).payload_len(4000).build();
        let mut prefix = [0u8; CANONICAL_HEADER_LEN];
        prefix.copy_from_slice(&bytes[..CANONICAL_HEADER_LEN]);

        let header = ContainerHeader::parse_prefix(&prefix);
        assert_eq!(header.container_tag, ChunkTag::RIFF);
        assert_eq!(header.form_type_tag, ChunkTag::WAVE);
        assert_eq!(header.format_chunk_tag, ChunkTag::FMT);
        assert_eq!(header.format_chunk_size, 16);
        assert_eq!(header.encoding(), SampleEncoding::Pcm);
        assert_eq!(header.channel_count, 1);
        assert_eq!(header.sample_rate_hz, 16000);
        assert_eq!(header.byte_rate, 32000);
        assert_eq!(header.block_align, 2);
        assert_eq!(header.bits_per_sample, 16);
        assert_eq!(header.data_chunk_tag, ChunkTag::DATA);
        assert_eq!(header.data_chunk_length, 4000);
        assert_eq!(header.declared_end(), bytes.len() as u64);
    }

    #[test]
    fn test_set_data_chunk_overwrites() {
        let bytes = WavBuilder::new(8000, 2, 8).payload_len(10).build();
        let mut prefix = [0u8; CANONICAL_HEADER_LEN];
        prefix.copy_from_slice(&bytes[..CANONICAL_HEADER_LEN]);
        let mut header = ContainerHeader::parse_prefix(&prefix);

        let mut chunk = [0u8; CHUNK_HEADER_LEN];
        chunk[..4].copy_from_slice(b"LIST");
        chunk[4..].copy_from_slice(&26u32.to_le_bytes());
        header.set_data_chunk(&chunk);

        assert_eq!(header.data_chunk_tag, ChunkTag::LIST);
        assert!(header.data_chunk_tag.is_metadata());
        assert_eq!(header.data_chunk_length, 26);
    }

    #[test]
    fn test_tag_display_escapes() {
        assert_eq!(ChunkTag::FMT.to_string(), "fmt ");
        assert_eq!(ChunkTag([0, b'a', 0xff, b'b']).to_string(), "\\x00a\\xffb");
    }

    #[test]
    fn test_encoding_codes() {
        assert_eq!(SampleEncoding::from(3), SampleEncoding::IeeeFloat);
        assert_eq!(SampleEncoding::from(0xFFFE), SampleEncoding::Extensible);
        assert_eq!(SampleEncoding::from(0x55), SampleEncoding::Other(0x55));
    }

    #[test]
    fn test_padding() {
        assert_eq!(padded(16), 16);
        assert_eq!(padded(17), 18);
        assert_eq!(padded(0), 0);
    }
}
