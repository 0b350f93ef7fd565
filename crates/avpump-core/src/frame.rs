//! Raw units: uncompressed sample/pixel buffers with per-plane storage.
//!
//! A [`RawUnit`] is the decode-side output and encode-side input of the
//! pump. Plane storage is reference-counted with copy-on-write
//! semantics: cloning a unit shares the planes, and the first mutation
//! through [`RawUnit::plane_mut`] or [`RawUnit::make_writable`] forces
//! a private copy, so a caller holding an old clone never observes the
//! next cycle's contents.

use std::fmt;
use std::sync::Arc;

/// Audio sample layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Unsigned 8-bit, packed.
    U8,
    /// Signed 16-bit, packed.
    S16,
    /// Signed 32-bit, packed.
    S32,
    /// 32-bit float, packed.
    F32,
    /// 64-bit float, packed.
    F64,
    /// Unsigned 8-bit, one plane per channel.
    U8p,
    /// Signed 16-bit, one plane per channel.
    S16p,
    /// Signed 32-bit, one plane per channel.
    S32p,
    /// 32-bit float, one plane per channel.
    F32p,
    /// 64-bit float, one plane per channel.
    F64p,
}

impl SampleFormat {
    /// Size of one sample of one channel, in bytes.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 | Self::U8p => 1,
            Self::S16 | Self::S16p => 2,
            Self::S32 | Self::S32p | Self::F32 | Self::F32p => 4,
            Self::F64 | Self::F64p => 8,
        }
    }

    /// Whether each channel lives in its own plane.
    pub fn is_planar(self) -> bool {
        matches!(
            self,
            Self::U8p | Self::S16p | Self::S32p | Self::F32p | Self::F64p
        )
    }

    /// The packed counterpart of this format.
    pub fn packed(self) -> SampleFormat {
        match self {
            Self::U8p => Self::U8,
            Self::S16p => Self::S16,
            Self::S32p => Self::S32,
            Self::F32p => Self::F32,
            Self::F64p => Self::F64,
            other => other,
        }
    }

    /// Short format name.
    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::F32 => "flt",
            Self::F64 => "dbl",
            Self::U8p => "u8p",
            Self::S16p => "s16p",
            Self::S32p => "s32p",
            Self::F32p => "fltp",
            Self::F64p => "dblp",
        }
    }

    /// Raw-format name understood by `ffplay -f`, for the packed
    /// counterpart of this format on the host's endianness.
    pub fn ffplay_name(self) -> &'static str {
        let le = cfg!(target_endian = "little");
        match self.packed() {
            Self::U8 => "u8",
            Self::S16 => {
                if le {
                    "s16le"
                } else {
                    "s16be"
                }
            }
            Self::S32 => {
                if le {
                    "s32le"
                } else {
                    "s32be"
                }
            }
            Self::F32 => {
                if le {
                    "f32le"
                } else {
                    "f32be"
                }
            }
            Self::F64 => {
                if le {
                    "f64le"
                } else {
                    "f64be"
                }
            }
            _ => unreachable!("packed() never returns a planar format"),
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Video pixel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Planar YUV, chroma subsampled 2x2.
    Yuv420p,
    /// Planar YUV, chroma subsampled 2x1.
    Yuv422p,
    /// Planar YUV, full-resolution chroma.
    Yuv444p,
    /// Luma plane plus one interleaved chroma plane.
    Nv12,
    /// Packed 8-bit RGB.
    Rgb24,
    /// Single 8-bit luma plane.
    Gray8,
}

impl PixelFormat {
    /// Number of planes.
    pub fn plane_count(self) -> usize {
        match self {
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p => 3,
            Self::Nv12 => 2,
            Self::Rgb24 | Self::Gray8 => 1,
        }
    }

    /// Whether the format stores components in more than one plane.
    pub fn is_planar(self) -> bool {
        self.plane_count() > 1
    }

    /// Logical size of plane `index` for a `width x height` frame, as
    /// `(row_bytes, rows)`. Odd dimensions round the chroma planes up.
    pub fn plane_size(self, index: usize, width: u32, height: u32) -> (usize, usize) {
        let w = width as usize;
        let h = height as usize;
        let cw = w.div_ceil(2);
        let ch = h.div_ceil(2);
        match (self, index) {
            (Self::Yuv420p, 0) => (w, h),
            (Self::Yuv420p, 1 | 2) => (cw, ch),
            (Self::Yuv422p, 0) => (w, h),
            (Self::Yuv422p, 1 | 2) => (cw, h),
            (Self::Yuv444p, 0..=2) => (w, h),
            (Self::Nv12, 0) => (w, h),
            (Self::Nv12, 1) => (cw * 2, ch),
            (Self::Rgb24, 0) => (w * 3, h),
            (Self::Gray8, 0) => (w, h),
            _ => (0, 0),
        }
    }

    /// Short format name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
            Self::Nv12 => "nv12",
            Self::Rgb24 => "rgb24",
            Self::Gray8 => "gray8",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output shape of a raw unit. Decode pumps lock the shape of the
/// first unit and treat any later change as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Audio {
        format: SampleFormat,
        channels: u16,
        sample_rate: u32,
    },
    Video {
        format: PixelFormat,
        width: u32,
        height: u32,
    },
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio {
                format,
                channels,
                sample_rate,
            } => write!(f, "{format}, {channels} ch, {sample_rate} Hz"),
            Self::Video {
                format,
                width,
                height,
            } => write!(f, "{format} {width}x{height}"),
        }
    }
}

/// One plane of a raw unit.
#[derive(Debug, Clone)]
pub struct Plane {
    data: Arc<Vec<u8>>,
    stride: usize,
}

impl Plane {
    /// Plane bytes, including any stride padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Distance in bytes between consecutive rows (video) or between
    /// consecutive samples of one channel (audio).
    pub fn stride(&self) -> usize {
        self.stride
    }
}

/// One decoded or to-be-encoded chunk of uncompressed data.
#[derive(Debug, Clone)]
pub struct RawUnit {
    shape: Shape,
    planes: Vec<Plane>,
    /// Samples per channel for audio; 1 for video.
    samples: usize,
    pts: Option<i64>,
}

impl RawUnit {
    /// Allocate a zeroed audio unit of `nb_samples` samples per channel.
    pub fn alloc_audio(
        format: SampleFormat,
        channels: u16,
        sample_rate: u32,
        nb_samples: usize,
    ) -> Self {
        let bps = format.bytes_per_sample();
        let planes = if format.is_planar() {
            (0..channels)
                .map(|_| Plane {
                    data: Arc::new(vec![0u8; nb_samples * bps]),
                    stride: bps,
                })
                .collect()
        } else {
            vec![Plane {
                data: Arc::new(vec![0u8; nb_samples * bps * channels as usize]),
                stride: bps * channels as usize,
            }]
        };
        Self {
            shape: Shape::Audio {
                format,
                channels,
                sample_rate,
            },
            planes,
            samples: nb_samples,
            pts: None,
        }
    }

    /// Allocate a zeroed video frame. Strides equal the logical row
    /// width; engines that pad rows may rebuild planes themselves.
    pub fn alloc_video(format: PixelFormat, width: u32, height: u32) -> Self {
        let planes = (0..format.plane_count())
            .map(|i| {
                let (row_bytes, rows) = format.plane_size(i, width, height);
                Plane {
                    data: Arc::new(vec![0u8; row_bytes * rows]),
                    stride: row_bytes,
                }
            })
            .collect();
        Self {
            shape: Shape::Video {
                format,
                width,
                height,
            },
            planes,
            samples: 1,
            pts: None,
        }
    }

    /// Output shape of this unit.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Samples per channel (audio); 1 for video.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Number of planes.
    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Borrow plane `index`.
    pub fn plane(&self, index: usize) -> &Plane {
        &self.planes[index]
    }

    /// Read-only bytes of plane `index`.
    pub fn plane_data(&self, index: usize) -> &[u8] {
        self.planes[index].data()
    }

    /// Mutable bytes of plane `index`, forcing a private copy if the
    /// storage is shared.
    pub fn plane_mut(&mut self, index: usize) -> &mut [u8] {
        Arc::make_mut(&mut self.planes[index].data).as_mut_slice()
    }

    /// Force exclusive ownership of every plane, copying shared storage.
    pub fn make_writable(&mut self) {
        for plane in &mut self.planes {
            Arc::make_mut(&mut plane.data);
        }
    }

    /// Whether every plane is exclusively owned by this unit.
    pub fn is_writable(&self) -> bool {
        self.planes
            .iter()
            .all(|p| Arc::strong_count(&p.data) == 1)
    }

    /// Presentation timestamp, if known.
    pub fn pts(&self) -> Option<i64> {
        self.pts
    }

    /// Set or clear the presentation timestamp.
    pub fn set_pts(&mut self, pts: Option<i64>) {
        self.pts = pts;
    }

    /// All payload bytes in packed order: channel-interleaved for
    /// audio, stride padding stripped and planes concatenated for
    /// video.
    pub fn packed_bytes(&self) -> Vec<u8> {
        match self.shape {
            Shape::Audio { format, .. } => {
                if !format.is_planar() {
                    return self.plane_data(0).to_vec();
                }
                let bps = format.bytes_per_sample();
                let mut out = Vec::with_capacity(self.samples * bps * self.planes.len());
                for i in 0..self.samples {
                    for plane in &self.planes {
                        out.extend_from_slice(&plane.data()[i * bps..(i + 1) * bps]);
                    }
                }
                out
            }
            Shape::Video {
                format,
                width,
                height,
            } => {
                let mut out = Vec::new();
                for (i, plane) in self.planes.iter().enumerate() {
                    let (row_bytes, rows) = format.plane_size(i, width, height);
                    let stride = plane.stride();
                    for row in 0..rows {
                        out.extend_from_slice(&plane.data()[row * stride..row * stride + row_bytes]);
                    }
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_format_queries() {
        assert_eq!(SampleFormat::S16.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::F64p.bytes_per_sample(), 8);
        assert!(SampleFormat::S16p.is_planar());
        assert!(!SampleFormat::S16.is_planar());
        assert_eq!(SampleFormat::S16p.packed(), SampleFormat::S16);
        assert_eq!(SampleFormat::F32.packed(), SampleFormat::F32);
        assert_eq!(SampleFormat::F32p.name(), "fltp");
        #[cfg(target_endian = "little")]
        assert_eq!(SampleFormat::S16p.ffplay_name(), "s16le");
    }

    #[test]
    fn test_yuv420p_plane_sizes_round_up() {
        // 5x3 frame: chroma planes cover 3x2.
        assert_eq!(PixelFormat::Yuv420p.plane_size(0, 5, 3), (5, 3));
        assert_eq!(PixelFormat::Yuv420p.plane_size(1, 5, 3), (3, 2));
        assert_eq!(PixelFormat::Yuv420p.plane_size(2, 5, 3), (3, 2));
        assert_eq!(PixelFormat::Nv12.plane_size(1, 5, 3), (6, 2));
        assert_eq!(PixelFormat::Rgb24.plane_size(0, 5, 3), (15, 3));
    }

    #[test]
    fn test_shape_display() {
        let audio = Shape::Audio {
            format: SampleFormat::S16p,
            channels: 2,
            sample_rate: 44100,
        };
        assert_eq!(audio.to_string(), "s16p, 2 ch, 44100 Hz");

        let video = Shape::Video {
            format: PixelFormat::Yuv420p,
            width: 640,
            height: 480,
        };
        assert_eq!(video.to_string(), "yuv420p 640x480");
    }

    #[test]
    fn test_copy_on_write_planes() {
        let mut unit = RawUnit::alloc_audio(SampleFormat::S16, 1, 8000, 4);
        assert!(unit.is_writable());

        let snapshot = unit.clone();
        assert!(!unit.is_writable());

        // Mutation forces a private copy; the clone keeps the old bytes.
        unit.plane_mut(0)[0] = 0xAB;
        assert!(unit.is_writable());
        assert_eq!(snapshot.plane_data(0)[0], 0);
        assert_eq!(unit.plane_data(0)[0], 0xAB);
    }

    #[test]
    fn test_packed_bytes_interleaves_planar_audio() {
        let mut unit = RawUnit::alloc_audio(SampleFormat::U8p, 2, 8000, 3);
        unit.plane_mut(0).copy_from_slice(&[1, 2, 3]);
        unit.plane_mut(1).copy_from_slice(&[4, 5, 6]);
        assert_eq!(unit.packed_bytes(), vec![1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn test_packed_bytes_concatenates_video_planes() {
        let mut unit = RawUnit::alloc_video(PixelFormat::Yuv420p, 2, 2);
        unit.plane_mut(0).copy_from_slice(&[10, 11, 12, 13]);
        unit.plane_mut(1).copy_from_slice(&[20]);
        unit.plane_mut(2).copy_from_slice(&[30]);
        assert_eq!(unit.packed_bytes(), vec![10, 11, 12, 13, 20, 30]);
    }
}
