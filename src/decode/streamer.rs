//! PCM 帧流
//!
//! 每次拉取一个 10ms quantum 的交错 PCM 字节，最多预读一帧。
//! 游标状态由调用方持有，同一个 `StreamCursor` 在 reset 之后可以继续使用。

use std::io::{self, Read, Seek, SeekFrom};

use super::header::ContainerHeader;
use super::inspector::PayloadLayout;
use crate::audio::AudioFormat;

/// 流游标
///
/// - `bytes_consumed`: 本轮已读负载字节数，reset 清零
/// - `end_of_payload`: 出现短读后锁存，只有 reset 能清除
/// - `pending`: 已读出、尚未取走的一帧，按实际读到的字节增长
#[derive(Debug, Clone, Default)]
pub struct StreamCursor {
    bytes_consumed: u64,
    end_of_payload: bool,
    pending: Vec<u8>,
}

impl StreamCursor {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    #[inline]
    pub fn is_end_of_payload(&self) -> bool {
        self.end_of_payload
    }

    /// 待取帧的长度（0 = 没有待取帧）
    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// 回到负载起点
    pub fn rewind(&mut self) {
        self.bytes_consumed = 0;
        self.end_of_payload = false;
        self.pending.clear();
    }
}

/// 帧流
///
/// 只为校验通过的容器构造，无效头部在 Inspector 阶段就被拒绝
#[derive(Debug)]
pub struct FrameStreamer<R> {
    reader: R,
    header: ContainerHeader,
    layout: PayloadLayout,
    frame_bytes: usize,
    /// reader 当前的绝对偏移，None = seek 失败后未知
    position: Option<u64>,
}

impl<R: Read + Seek> FrameStreamer<R> {
    /// `reader` 必须停在 `layout.data_offset`
    pub fn new(header: ContainerHeader, layout: PayloadLayout, reader: R) -> Self {
        Self {
            reader,
            header,
            layout,
            frame_bytes: layout.frame_bytes(),
            position: Some(layout.data_offset),
        }
    }

    #[inline]
    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    #[inline]
    pub fn layout(&self) -> &PayloadLayout {
        &self.layout
    }

    #[inline]
    pub fn format(&self) -> &AudioFormat {
        &self.layout.format
    }

    /// 一个完整 quantum 的字节数
    #[inline]
    pub fn frame_bytes(&self) -> usize {
        self.frame_bytes
    }

    /// data chunk 声明的负载长度
    #[inline]
    pub fn payload_len(&self) -> u64 {
        self.layout.data_len
    }

    /// 创建一个从负载起点开始的游标
    pub fn new_cursor(&self) -> StreamCursor {
        StreamCursor::new()
    }

    /// 是否还有下一帧
    ///
    /// 有副作用：没有待取帧时会读取下一帧。每次 `get_next` 之前必须调用
    pub fn has_next(&mut self, cursor: &mut StreamCursor) -> bool {
        self.fill(cursor);
        !cursor.pending.is_empty()
    }

    /// 取走待取帧，返回复制到 `buffer` 的字节数
    ///
    /// 没有先调用 `has_next` 时返回 0
    pub fn get_next(&mut self, cursor: &mut StreamCursor, buffer: &mut [u8]) -> usize {
        let len = cursor.pending.len().min(buffer.len());
        if len < cursor.pending.len() {
            log::warn!(
                "Frame buffer too small: {} < {}, dropping {} bytes",
                buffer.len(),
                cursor.pending.len(),
                cursor.pending.len() - len
            );
        }
        buffer[..len].copy_from_slice(&cursor.pending[..len]);
        cursor.pending.clear();
        len
    }

    /// 回到负载起点
    ///
    /// seek 失败时游标保持不变
    pub fn reset(&mut self, cursor: &mut StreamCursor) -> io::Result<()> {
        if let Err(e) = self.reader.seek(SeekFrom::Start(self.layout.data_offset)) {
            self.position = None;
            return Err(e);
        }
        self.position = Some(self.layout.data_offset);
        cursor.rewind();
        log::debug!("Stream rewound to payload start @ {}", self.layout.data_offset);
        Ok(())
    }

    /// 回到负载起点，seek 失败也清空游标
    ///
    /// 之后的拉取会从负载起点重新定位；再次失败则锁存 EOF
    pub fn rewind(&mut self, cursor: &mut StreamCursor) {
        if let Err(e) = self.reset(cursor) {
            log::warn!("Rewind to {} failed: {}", self.layout.data_offset, e);
            cursor.rewind();
        }
    }

    /// 按需读取一帧
    ///
    /// 已有待取帧、已锁存 EOF 或已读满声明长度时不读
    fn fill(&mut self, cursor: &mut StreamCursor) {
        if !cursor.pending.is_empty()
            || cursor.end_of_payload
            || cursor.bytes_consumed >= self.layout.data_len
        {
            return;
        }

        // 游标与 reader 位置不一致（例如换了游标）时以游标为准
        let target = self.layout.data_offset + cursor.bytes_consumed;
        if self.position != Some(target) {
            if let Err(e) = self.reader.seek(SeekFrom::Start(target)) {
                log::warn!("Seek to {} failed: {}", target, e);
                self.position = None;
                cursor.end_of_payload = true;
                return;
            }
            self.position = Some(target);
        }

        let remaining = self.layout.data_len - cursor.bytes_consumed;
        let wanted = (self.frame_bytes as u64).min(remaining);
        // 缓冲按实际读到的字节增长，头部声明的超大 quantum 不会预分配
        let read = self.reader.by_ref().take(wanted).read_to_end(&mut cursor.pending);
        let got = cursor.pending.len() as u64;
        cursor.bytes_consumed += got;
        self.position = match read {
            Ok(_) => Some(target + got),
            Err(e) => {
                log::warn!("Read failed after {} bytes: {}", got, e);
                None
            }
        };

        if got < wanted {
            cursor.end_of_payload = true;
            log::debug!(
                "Payload ended early: {} of {} bytes",
                cursor.bytes_consumed,
                self.layout.data_len
            );
        }
    }
}
