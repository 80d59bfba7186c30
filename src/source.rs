//! 文件音频源适配器
//!
//! 媒体引擎期望的窄接口：按路径创建，`open` 返回 bool，
//! 数值结果全部带内返回（0 表示不可用）。

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::audio::AudioFormat;
use crate::decode::{
    ContainerHeader, FrameStreamer, InspectOptions, Inspector, OpenError, SampleEncoding,
    StreamCursor,
};

/// 引擎侧使用的 PCM 帧源
pub trait PcmFrameSource {
    /// 打开并校验，失败返回 false
    fn open(&mut self) -> bool;

    /// 是否还有下一帧（会读取下一帧）
    fn has_next(&mut self) -> bool;

    /// 取走待取帧，返回写入 `buffer` 的字节数
    fn get_next(&mut self, buffer: &mut [u8]) -> usize;

    /// 回到负载起点，0 = 成功
    fn reset(&mut self) -> i32;

    fn number_of_channels(&self) -> u32;

    fn sample_rate(&self) -> u32;

    fn bits_per_sample(&self) -> u32;
}

/// 打开状态
enum SourceState {
    Unopened,
    Ready {
        streamer: FrameStreamer<BufReader<File>>,
        cursor: StreamCursor,
    },
    /// 打开失败；这里不会再转出到 Ready，除非重新 open
    Failed(OpenError),
}

/// 基于 WAV 文件的 PCM 帧源
pub struct PcmFileSource {
    path: PathBuf,
    inspector: Inspector,
    state: SourceState,
}

impl PcmFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_options(path, InspectOptions::default())
    }

    pub fn with_options<P: AsRef<Path>>(path: P, options: InspectOptions) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            inspector: Inspector::new(options),
            state: SourceState::Unopened,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 打开并返回具体错误
    ///
    /// 重复调用会重新打开文件，旧句柄随旧状态释放
    pub fn try_open(&mut self) -> Result<(), OpenError> {
        match self.inspector.open(&self.path) {
            Ok(opened) => {
                let streamer = opened.into_streamer();
                let cursor = streamer.new_cursor();
                self.state = SourceState::Ready { streamer, cursor };
                Ok(())
            }
            Err(e) => {
                self.state = SourceState::Failed(e.clone());
                Err(e)
            }
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self.state, SourceState::Ready { .. })
    }

    /// 最近一次打开失败的原因
    pub fn open_error(&self) -> Option<&OpenError> {
        match &self.state {
            SourceState::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// 已解析的头部（格式不支持时也可用，用于诊断）
    pub fn header(&self) -> Option<&ContainerHeader> {
        match &self.state {
            SourceState::Ready { streamer, .. } => Some(streamer.header()),
            SourceState::Failed(e) => e.header(),
            SourceState::Unopened => None,
        }
    }

    /// 同 `sample_rate`
    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate()
    }

    /// 已校验的格式
    pub fn format(&self) -> Option<AudioFormat> {
        self.streamer().map(|s| *s.format())
    }

    /// 负载编码
    pub fn codec_type(&self) -> Option<SampleEncoding> {
        self.streamer().map(|s| s.format().encoding)
    }

    /// 一个完整帧的字节数，未打开时为 0
    pub fn frame_bytes(&self) -> usize {
        self.streamer().map_or(0, |s| s.frame_bytes())
    }

    /// 单次 `get_next` 最多返回的字节数（一帧与整个负载取小），未打开时为 0
    pub fn max_frame_len(&self) -> usize {
        self.streamer()
            .map_or(0, |s| (s.frame_bytes() as u64).min(s.payload_len()) as usize)
    }

    /// 负载时长（秒）
    pub fn duration_secs(&self) -> Option<f64> {
        self.streamer()
            .map(|s| s.format().duration_secs(s.payload_len()))
    }

    /// 本轮已读负载字节数
    pub fn bytes_consumed(&self) -> u64 {
        match &self.state {
            SourceState::Ready { cursor, .. } => cursor.bytes_consumed(),
            _ => 0,
        }
    }

    /// 回到负载起点，未打开时返回 `NotOpened`
    pub fn try_reset(&mut self) -> Result<(), OpenError> {
        match &mut self.state {
            SourceState::Ready { streamer, cursor } => {
                // seek 失败也会清空游标，之后的拉取从负载起点重新定位
                streamer.rewind(cursor);
                Ok(())
            }
            _ => Err(OpenError::NotOpened),
        }
    }

    fn streamer(&self) -> Option<&FrameStreamer<BufReader<File>>> {
        match &self.state {
            SourceState::Ready { streamer, .. } => Some(streamer),
            _ => None,
        }
    }
}

impl PcmFrameSource for PcmFileSource {
    fn open(&mut self) -> bool {
        self.try_open().is_ok()
    }

    fn has_next(&mut self) -> bool {
        match &mut self.state {
            SourceState::Ready { streamer, cursor } => streamer.has_next(cursor),
            _ => false,
        }
    }

    fn get_next(&mut self, buffer: &mut [u8]) -> usize {
        match &mut self.state {
            SourceState::Ready { streamer, cursor } => streamer.get_next(cursor, buffer),
            _ => 0,
        }
    }

    fn reset(&mut self) -> i32 {
        match self.try_reset() {
            Ok(()) => 0,
            Err(e) => {
                log::debug!("Reset of {} ignored: {}", self.path.display(), e);
                -1
            }
        }
    }

    fn number_of_channels(&self) -> u32 {
        self.streamer().map_or(0, |s| s.format().channels as u32)
    }

    fn sample_rate(&self) -> u32 {
        self.streamer().map_or(0, |s| s.format().sample_rate)
    }

    fn bits_per_sample(&self) -> u32 {
        self.streamer()
            .map_or(0, |s| s.format().bits_per_sample as u32)
    }
}
