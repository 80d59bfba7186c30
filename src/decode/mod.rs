//! WAV 容器解析与 PCM 帧流
//!
//! 两个阶段顺序组合：
//! - Inspector: 打开时运行一次，校验头部并定位 data chunk
//! - FrameStreamer: 按需拉取 10ms 的 PCM 帧

pub mod error;
pub mod header;
pub mod inspector;
pub mod streamer;

#[cfg(test)]
pub(crate) mod testutil;

use std::io::{ErrorKind, Read};

pub use error::{HeaderStage, OpenError};
pub use header::{ChunkTag, ContainerHeader, SampleEncoding};
pub use inspector::{ChunkScan, InspectOptions, Inspector, OpenedContainer, PayloadLayout};
pub use streamer::{FrameStreamer, StreamCursor};

/// 尽量读满 `buf`，返回实际读到的字节数
///
/// 只在 EOF 时短读；I/O 错误记录日志后按短读处理
pub(crate) fn read_up_to<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> usize {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!("Read failed after {} bytes: {}", filled, e);
                break;
            }
        }
    }
    filled
}
