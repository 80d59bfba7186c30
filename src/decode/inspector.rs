//! 容器检查器
//!
//! 读取 44 字节固定前缀，跳过 data 之前的元数据 chunk，校验魔数，
//! 得到声道数、采样率、位深以及 PCM 负载的偏移和长度

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::error::{HeaderStage, OpenError};
use super::header::{
    padded, ChunkTag, ContainerHeader, CANONICAL_FMT_LEN, CANONICAL_HEADER_LEN, CHUNK_HEADER_LEN,
    SUPPORTED_BITS_PER_SAMPLE,
};
use super::read_up_to;
use super::streamer::FrameStreamer;
use crate::audio::AudioFormat;

/// data 之前的 chunk 跳过策略
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChunkScan {
    /// 跳过任意非 data chunk，直到容器声明的结尾
    #[default]
    UntilData,
    /// 至多跳过一个已知元数据 chunk（LIST 等）
    SingleMetadata,
}

/// 检查器配置
#[derive(Clone, Debug, Default)]
pub struct InspectOptions {
    pub chunk_scan: ChunkScan,
}

/// PCM 负载布局
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PayloadLayout {
    pub format: AudioFormat,
    /// data chunk 负载在容器中的字节偏移
    pub data_offset: u64,
    /// data chunk 声明的长度
    pub data_len: u64,
}

impl PayloadLayout {
    /// 每次拉取的字节数
    #[inline]
    pub fn frame_bytes(&self) -> usize {
        self.format.quantum_bytes()
    }
}

/// 已通过校验的容器，读位置停在负载起点
#[derive(Debug)]
pub struct OpenedContainer<R> {
    pub header: ContainerHeader,
    pub layout: PayloadLayout,
    reader: R,
}

impl<R: Read + Seek> OpenedContainer<R> {
    pub fn into_streamer(self) -> FrameStreamer<R> {
        FrameStreamer::new(self.header, self.layout, self.reader)
    }

    pub fn into_parts(self) -> (ContainerHeader, PayloadLayout, R) {
        (self.header, self.layout, self.reader)
    }
}

/// 容器检查器
#[derive(Clone, Debug, Default)]
pub struct Inspector {
    options: InspectOptions,
}

impl Inspector {
    pub fn new(options: InspectOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &InspectOptions {
        &self.options
    }

    /// 打开文件并检查
    ///
    /// 文件打不开按前缀截断上报（可用字节为 0）
    pub fn open<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<OpenedContainer<BufReader<File>>, OpenError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            log::warn!("Failed to open {}: {}", path.display(), e);
            OpenError::truncated(HeaderStage::Prefix, CANONICAL_HEADER_LEN as u64, 0)
        })?;

        let opened = self.inspect(BufReader::new(file)).inspect_err(|e| {
            log::warn!("Rejected {}: {}", path.display(), e);
        })?;

        log::info!(
            "Opened {}: {} {}Hz {}ch {}bit | payload {} bytes @ {} | {:.2}s",
            path.display(),
            opened.header.encoding(),
            opened.layout.format.sample_rate,
            opened.layout.format.channels,
            opened.layout.format.bits_per_sample,
            opened.layout.data_len,
            opened.layout.data_offset,
            opened.layout.format.duration_secs(opened.layout.data_len),
        );
        Ok(opened)
    }

    /// 从任意可 seek 的数据源检查容器
    pub fn inspect<R: Read + Seek>(&self, mut reader: R) -> Result<OpenedContainer<R>, OpenError> {
        let mut prefix = [0u8; CANONICAL_HEADER_LEN];
        let got = read_up_to(&mut reader, &mut prefix);
        if got < CANONICAL_HEADER_LEN {
            return Err(OpenError::truncated(
                HeaderStage::Prefix,
                CANONICAL_HEADER_LEN as u64,
                got as u64,
            ));
        }

        let mut header = ContainerHeader::parse_prefix(&prefix);
        // 下一个 chunk 头之后的位置
        let mut position = CANONICAL_HEADER_LEN as u64;

        // 扩展 fmt chunk（18/40 字节）：位置 36 处并非 chunk 头，需要重新定位
        if header.format_chunk_tag == ChunkTag::FMT && header.format_chunk_size > CANONICAL_FMT_LEN
        {
            let chunk_start = header.after_format_chunk();
            log::debug!(
                "Extended fmt chunk ({} bytes), next chunk at {}",
                header.format_chunk_size,
                chunk_start
            );
            seek_to(&mut reader, chunk_start)?;
            read_chunk_header(&mut reader, &mut header)?;
            position = chunk_start + CHUNK_HEADER_LEN as u64;
        }

        let scan_end = self.skip_to_data(&mut reader, &mut header, &mut position)?;

        let layout = PayloadLayout {
            format: AudioFormat::from_header(&header),
            data_offset: position,
            data_len: header.data_chunk_length as u64,
        };
        validate(&header, &layout, scan_end)?;

        Ok(OpenedContainer {
            header,
            layout,
            reader,
        })
    }

    /// 跳过 data 之前的 chunk
    ///
    /// 返回 true 表示扫描到容器声明的结尾仍未找到 data
    fn skip_to_data<R: Read>(
        &self,
        reader: &mut R,
        header: &mut ContainerHeader,
        position: &mut u64,
    ) -> Result<bool, OpenError> {
        let mut skipped = 0usize;

        while header.data_chunk_tag != ChunkTag::DATA {
            let tag = header.data_chunk_tag;
            let body = padded(header.data_chunk_length);

            match self.options.chunk_scan {
                ChunkScan::SingleMetadata => {
                    if skipped > 0 || !tag.is_metadata() {
                        return Ok(false);
                    }
                }
                ChunkScan::UntilData => {
                    // 第一个已知元数据 chunk 总是跳过，不受 RIFF size 约束（流式编码器常写 0）
                    let leading_metadata = skipped == 0 && tag.is_metadata();
                    if !leading_metadata
                        && *position + body + CHUNK_HEADER_LEN as u64 > header.declared_end()
                    {
                        return Ok(true);
                    }
                }
            }

            log::debug!("Skipping {} chunk ({} bytes) at {}", tag, body, *position);
            let consumed = match io::copy(&mut reader.by_ref().take(body), &mut io::sink()) {
                Ok(n) => n,
                Err(e) => {
                    log::warn!("Read failed while skipping {} chunk: {}", tag, e);
                    0
                }
            };
            // 奇数长度 chunk 末尾的填充字节缺失不算截断，交给下一个 chunk 头判断
            if consumed < header.data_chunk_length as u64 {
                return Err(OpenError::truncated(HeaderStage::SkippedChunk, body, consumed));
            }

            read_chunk_header(reader, header)?;
            *position += consumed + CHUNK_HEADER_LEN as u64;
            skipped += 1;
        }

        Ok(false)
    }
}

fn seek_to<R: Seek>(reader: &mut R, offset: u64) -> Result<(), OpenError> {
    reader.seek(SeekFrom::Start(offset)).map(|_| ()).map_err(|e| {
        log::warn!("Seek to {} failed: {}", offset, e);
        OpenError::truncated(HeaderStage::ChunkHeader, CHUNK_HEADER_LEN as u64, 0)
    })
}

fn read_chunk_header<R: Read>(reader: &mut R, header: &mut ContainerHeader) -> Result<(), OpenError> {
    let mut chunk = [0u8; CHUNK_HEADER_LEN];
    let got = read_up_to(reader, &mut chunk);
    if got < CHUNK_HEADER_LEN {
        return Err(OpenError::truncated(
            HeaderStage::ChunkHeader,
            CHUNK_HEADER_LEN as u64,
            got as u64,
        ));
    }
    header.set_data_chunk(&chunk);
    Ok(())
}

fn validate(header: &ContainerHeader, layout: &PayloadLayout, scan_end: bool) -> Result<(), OpenError> {
    let reason = if header.container_tag != ChunkTag::RIFF {
        format!("container tag {:?}, expected \"RIFF\"", header.container_tag.to_string())
    } else if header.form_type_tag != ChunkTag::WAVE {
        format!("form type {:?}, expected \"WAVE\"", header.form_type_tag.to_string())
    } else if header.format_chunk_tag != ChunkTag::FMT {
        format!("format chunk {:?}, expected \"fmt \"", header.format_chunk_tag.to_string())
    } else if scan_end {
        format!(
            "no data chunk before container end ({} bytes), last chunk {:?}",
            header.declared_end(),
            header.data_chunk_tag.to_string()
        )
    } else if header.data_chunk_tag != ChunkTag::DATA {
        format!("chunk {:?} where \"data\" was expected", header.data_chunk_tag.to_string())
    } else if header.format_chunk_size < CANONICAL_FMT_LEN {
        format!("format chunk too small ({} bytes)", header.format_chunk_size)
    } else if header.channel_count == 0 || header.sample_rate_hz == 0 {
        format!(
            "{} channels at {} Hz",
            header.channel_count, header.sample_rate_hz
        )
    } else if !SUPPORTED_BITS_PER_SAMPLE.contains(&header.bits_per_sample) {
        format!("{} bits per sample", header.bits_per_sample)
    } else if layout.frame_bytes() == 0 {
        format!(
            "{}Hz {}ch {}bit yields an empty 10ms frame",
            header.sample_rate_hz, header.channel_count, header.bits_per_sample
        )
    } else {
        return Ok(());
    };

    Err(OpenError::UnsupportedFormat {
        reason,
        header: *header,
    })
}
