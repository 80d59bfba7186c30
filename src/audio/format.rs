//! 音频格式和样本解码
//!
//! 内部表示：所有位深统一左对齐到 i32 的高位
//! - 8-bit:  无符号，先减 128 再占据 bit[31:24]
//! - 16-bit: 占据 bit[31:16]，bit[15:0] = 0
//! - 24-bit: 占据 bit[31:8]，bit[7:0] = 0
//! - 32-bit: 占据 bit[31:0]（IEEE float 按 [-1, 1] 缩放）

use crate::decode::{ContainerHeader, SampleEncoding};

/// 每次拉取的时长（毫秒）
pub const QUANTUM_MS: u32 = 10;

/// 一秒内的 quantum 数
pub const QUANTA_PER_SECOND: u32 = 1000 / QUANTUM_MS;

/// 已校验的音频格式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub encoding: SampleEncoding,
}

impl AudioFormat {
    /// 创建新的 PCM 音频格式
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
            encoding: SampleEncoding::Pcm,
        }
    }

    /// 头部投影
    pub fn from_header(header: &ContainerHeader) -> Self {
        Self {
            sample_rate: header.sample_rate_hz,
            channels: header.channel_count,
            bits_per_sample: header.bits_per_sample,
            encoding: header.encoding(),
        }
    }

    /// 每帧的样本数（= 声道数）
    #[inline]
    pub fn samples_per_frame(&self) -> usize {
        self.channels as usize
    }

    /// 每帧的字节数
    #[inline]
    pub fn bytes_per_frame(&self) -> usize {
        (self.bits_per_sample as usize / 8) * self.channels as usize
    }

    /// 每样本的字节数
    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample as usize / 8
    }

    /// 一个 quantum（10ms）的字节数
    ///
    /// 按 `rate / 100 * channels * bits / 8` 的整数顺序计算，
    /// 非 100 整数倍的采样率会截断
    #[inline]
    pub fn quantum_bytes(&self) -> usize {
        (self.sample_rate / QUANTA_PER_SECOND) as usize
            * self.channels as usize
            * self.bits_per_sample as usize
            / 8
    }

    /// 输出 `payload_len` 字节需要的拉取次数（向上取整）
    pub fn quanta_for(&self, payload_len: u64) -> u64 {
        let q = self.quantum_bytes() as u64;
        if q == 0 {
            return 0;
        }
        payload_len.div_ceil(q)
    }

    /// 字节数对应的时长（秒）
    pub fn duration_secs(&self, bytes: u64) -> f64 {
        let bytes_per_second = self.sample_rate as u64 * self.bytes_per_frame() as u64;
        if bytes_per_second == 0 {
            return 0.0;
        }
        bytes as f64 / bytes_per_second as f64
    }

    /// 将原始字节解码为 i32 样本（左对齐到 32-bit）
    ///
    /// 只处理线性 PCM 与 32-bit float；压扩编码返回 0
    pub fn bytes_to_samples(&self, bytes: &[u8], output: &mut [i32]) -> usize {
        match self.encoding {
            SampleEncoding::Pcm | SampleEncoding::Extensible => {}
            SampleEncoding::IeeeFloat if self.bits_per_sample == 32 => {
                for (i, chunk) in bytes.chunks_exact(4).enumerate() {
                    if i >= output.len() {
                        break;
                    }
                    let sample = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                    let clamped = sample.clamp(-1.0, 1.0);
                    output[i] = (clamped * i32::MAX as f32) as i32;
                }
                return (bytes.len() / 4).min(output.len());
            }
            _ => return 0,
        }

        match self.bits_per_sample {
            8 => {
                for (i, &byte) in bytes.iter().enumerate() {
                    if i >= output.len() {
                        break;
                    }
                    // u8 [0, 255] → 有符号 [-128, 127] → i32 左对齐
                    output[i] = (byte as i32 - 128) << 24;
                }
                bytes.len().min(output.len())
            }
            16 => {
                for (i, chunk) in bytes.chunks_exact(2).enumerate() {
                    if i >= output.len() {
                        break;
                    }
                    let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
                    output[i] = (sample as i32) << 16;
                }
                (bytes.len() / 2).min(output.len())
            }
            24 => {
                for (i, chunk) in bytes.chunks_exact(3).enumerate() {
                    if i >= output.len() {
                        break;
                    }

                    // chunk[0] = LSB, chunk[2] = MSB (含符号位)
                    let raw = (chunk[0] as i32)
                        | ((chunk[1] as i32) << 8)
                        | ((chunk[2] as i32) << 16);

                    // 先左移把符号位移到 bit31，即完成符号扩展 + 左对齐
                    output[i] = raw << 8;
                }
                (bytes.len() / 3).min(output.len())
            }
            32 => {
                for (i, chunk) in bytes.chunks_exact(4).enumerate() {
                    if i >= output.len() {
                        break;
                    }
                    output[i] = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                }
                (bytes.len() / 4).min(output.len())
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantum_bytes() {
        assert_eq!(AudioFormat::new(16000, 1, 16).quantum_bytes(), 320);
        assert_eq!(AudioFormat::new(48000, 2, 16).quantum_bytes(), 1920);
        assert_eq!(AudioFormat::new(44100, 2, 24).quantum_bytes(), 2646);
        // 22050 / 100 = 220（截断）
        assert_eq!(AudioFormat::new(22050, 1, 8).quantum_bytes(), 220);
        assert_eq!(AudioFormat::new(50, 1, 16).quantum_bytes(), 0);
    }

    #[test]
    fn test_quanta_for() {
        let format = AudioFormat::new(16000, 1, 16);
        assert_eq!(format.quanta_for(4000), 13);
        assert_eq!(format.quanta_for(3840), 12);
        assert_eq!(format.quanta_for(0), 0);
        assert_eq!(AudioFormat::new(50, 1, 16).quanta_for(100), 0);
    }

    #[test]
    fn test_duration() {
        let format = AudioFormat::new(16000, 1, 16);
        assert!((format.duration_secs(32000) - 1.0).abs() < 1e-9);
        assert!((format.duration_secs(320) - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_8bit_unsigned() {
        let format = AudioFormat::new(8000, 1, 8);
        let mut samples = [0i32; 3];
        assert_eq!(format.bytes_to_samples(&[0x80, 0xFF, 0x00], &mut samples), 3);
        assert_eq!(samples[0], 0);
        assert_eq!(samples[1], 127 << 24);
        assert_eq!(samples[2], i32::MIN);
    }

    #[test]
    fn test_16bit_sign() {
        let format = AudioFormat::new(48000, 1, 16);
        let mut samples = [0i32; 2];
        format.bytes_to_samples(&[0x00, 0x40, 0x00, 0xC0], &mut samples);
        assert_eq!(samples[0], 16384 << 16);
        assert!(samples[1] < 0, "negative sample should be negative after decode");
    }

    #[test]
    fn test_24bit_sign_extend() {
        let format = AudioFormat::new(96000, 1, 24);
        let mut samples = [0i32; 1];

        format.bytes_to_samples(&[0xFF, 0xFF, 0x7F], &mut samples);
        assert_eq!(samples[0], 0x7FFFFF << 8);

        format.bytes_to_samples(&[0x00, 0x00, 0x80], &mut samples);
        assert_eq!(samples[0], (-8388608i32) << 8);

        format.bytes_to_samples(&[0xFF, 0xFF, 0xFF], &mut samples);
        assert_eq!(samples[0], (-1i32) << 8);
    }

    #[test]
    fn test_32bit_float_and_int() {
        let mut float = AudioFormat::new(48000, 1, 32);
        float.encoding = SampleEncoding::IeeeFloat;
        let mut samples = [0i32; 1];
        float.bytes_to_samples(&(-2.0f32).to_le_bytes(), &mut samples);
        assert_eq!(samples[0], i32::MIN);

        let int = AudioFormat::new(48000, 1, 32);
        int.bytes_to_samples(&(-5i32).to_le_bytes(), &mut samples);
        assert_eq!(samples[0], -5);
    }

    #[test]
    fn test_companded_not_decoded() {
        let mut format = AudioFormat::new(8000, 1, 8);
        format.encoding = SampleEncoding::MuLaw;
        let mut samples = [0i32; 4];
        assert_eq!(format.bytes_to_samples(&[1, 2, 3, 4], &mut samples), 0);
    }

    #[test]
    fn test_output_shorter_than_input() {
        let format = AudioFormat::new(48000, 2, 16);
        let mut samples = [0i32; 1];
        assert_eq!(format.bytes_to_samples(&[0, 1, 0, 2], &mut samples), 1);
    }
}
