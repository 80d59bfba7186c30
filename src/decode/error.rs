//! 打开/解析错误

use std::fmt;

use thiserror::Error;

use super::header::ContainerHeader;

/// 截断发生的阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderStage {
    /// 44 字节固定前缀（文件打不开也归到这里）
    Prefix,
    /// 被跳过的元数据 chunk 负载
    SkippedChunk,
    /// 跳过之后的 8 字节 chunk 头
    ChunkHeader,
}

impl fmt::Display for HeaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix => write!(f, "header prefix"),
            Self::SkippedChunk => write!(f, "skipped chunk"),
            Self::ChunkHeader => write!(f, "chunk header"),
        }
    }
}

/// 容器打开错误
#[derive(Error, Debug, Clone)]
pub enum OpenError {
    /// 可用字节少于正在解析的结构
    #[error("Truncated header at {stage}: expected {expected} bytes, got {available}")]
    TruncatedHeader {
        stage: HeaderStage,
        expected: u64,
        available: u64,
    },

    /// 魔数不匹配或布局无法流式输出
    #[error("Unsupported audio format: {reason}")]
    UnsupportedFormat {
        reason: String,
        header: ContainerHeader,
    },

    /// 尚未成功打开
    #[error("Stream not opened")]
    NotOpened,
}

impl OpenError {
    pub(crate) fn truncated(stage: HeaderStage, expected: u64, available: u64) -> Self {
        Self::TruncatedHeader {
            stage,
            expected,
            available,
        }
    }

    /// 解析出的头部（仅 UnsupportedFormat 携带）
    pub fn header(&self) -> Option<&ContainerHeader> {
        match self {
            Self::UnsupportedFormat { header, .. } => Some(header),
            _ => None,
        }
    }
}
