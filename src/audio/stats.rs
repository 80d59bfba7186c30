//! 流式拉取统计
//!
//! 每轮（reset 之间）统计帧数、字节数、短帧数和峰值电平

use super::format::AudioFormat;

/// 单轮拉取统计
pub struct StreamStats {
    format: AudioFormat,
    frames: u64,
    bytes: u64,
    short_frames: u64,
    /// 左对齐 i32 样本的最大绝对值
    peak: u32,
    /// 解码暂存，按实际帧长增长
    scratch: Vec<i32>,
}

impl StreamStats {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            frames: 0,
            bytes: 0,
            short_frames: 0,
            peak: 0,
            scratch: Vec::new(),
        }
    }

    /// 记录一帧
    pub fn record_frame(&mut self, frame: &[u8]) {
        self.frames += 1;
        self.bytes += frame.len() as u64;
        if frame.len() < self.format.quantum_bytes() {
            self.short_frames += 1;
        }

        let needed = frame.len() / self.format.bytes_per_sample().max(1);
        if self.scratch.len() < needed {
            self.scratch.resize(needed, 0);
        }
        let count = self.format.bytes_to_samples(frame, &mut self.scratch);
        for &sample in &self.scratch[..count] {
            self.peak = self.peak.max(sample.unsigned_abs());
        }
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[inline]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// 生成报告
    pub fn report(&self) -> StatsReport {
        let peak_dbfs = if self.peak == 0 {
            None
        } else {
            Some(20.0 * (self.peak as f64 / i32::MAX as f64).log10())
        };

        StatsReport {
            frames: self.frames,
            bytes: self.bytes,
            short_frames: self.short_frames,
            duration_secs: self.format.duration_secs(self.bytes),
            peak_dbfs,
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        self.frames = 0;
        self.bytes = 0;
        self.short_frames = 0;
        self.peak = 0;
    }
}

/// 统计报告
#[derive(Debug, Clone, PartialEq)]
pub struct StatsReport {
    pub frames: u64,
    pub bytes: u64,
    pub short_frames: u64,
    pub duration_secs: f64,
    /// 全静音时为 None
    pub peak_dbfs: Option<f64>,
}

impl std::fmt::Display for StatsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Frames: {} ({} short)", self.frames, self.short_frames)?;
        writeln!(f, "Bytes: {}", self.bytes)?;
        writeln!(f, "Duration: {:.2} s", self.duration_secs)?;
        match self.peak_dbfs {
            Some(db) => writeln!(f, "Peak: {:.1} dBFS", db)?,
            None => writeln!(f, "Peak: silent")?,
        }
        Ok(())
    }
}
