// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 像素格式转换: FFmpeg 帧平面 → 紧凑 RGBA

/// FFmpeg `AVPixelFormat` 编号 (只列出需要处理的几种)
pub const PIX_FMT_YUV420P: i32 = 0;
pub const PIX_FMT_YUVJ420P: i32 = 12;
pub const PIX_FMT_RGBA: i32 = 26;

/// 单边最大分辨率, 超出视为损坏帧
pub const MAX_DIMENSION: u32 = 4096;

/// 帧分辨率是否合法
pub fn valid_dimensions(width: u32, height: u32) -> bool {
    width > 0 && height > 0 && width <= MAX_DIMENSION && height <= MAX_DIMENSION
}

/// 带行步长的 RGBA 数据 → 紧凑 RGBA
///
/// `src` 至少包含 `stride * (height - 1) + width * 4` 字节
pub fn rgba_from_packed(src: &[u8], stride: usize, width: usize, height: usize) -> Option<Vec<u8>> {
    let row_bytes = width * 4;
    if stride < row_bytes || height == 0 {
        return None;
    }
    if src.len() < stride * (height - 1) + row_bytes {
        return None;
    }

    let mut out = Vec::with_capacity(row_bytes * height);
    for row in src.chunks(stride).take(height) {
        out.extend_from_slice(&row[..row_bytes]);
    }
    Some(out)
}

/// YUV420P → RGBA (BT.601, 定点系数 ×128)
pub fn rgba_from_yuv420p(
    y_plane: &[u8],
    u_plane: &[u8],
    v_plane: &[u8],
    y_stride: usize,
    uv_stride: usize,
    width: usize,
    height: usize,
) -> Option<Vec<u8>> {
    if y_stride < width || uv_stride < width.div_ceil(2) || height == 0 {
        return None;
    }
    let chroma_rows = height.div_ceil(2);
    if y_plane.len() < y_stride * (height - 1) + width
        || u_plane.len() < uv_stride * (chroma_rows - 1) + width.div_ceil(2)
        || v_plane.len() < uv_stride * (chroma_rows - 1) + width.div_ceil(2)
    {
        return None;
    }

    let mut buffer = vec![255u8; width * height * 4];
    let mut out_idx = 0;
    for y in 0..height {
        let y_row = y * y_stride;
        let uv_row = (y >> 1) * uv_stride;

        for x in 0..width {
            let y_val = y_plane[y_row + x] as i32;
            let u_val = u_plane[uv_row + (x >> 1)] as i32 - 128;
            let v_val = v_plane[uv_row + (x >> 1)] as i32 - 128;

            buffer[out_idx] = (y_val + ((v_val * 179) >> 7)).clamp(0, 255) as u8;
            buffer[out_idx + 1] =
                (y_val - ((u_val * 44) >> 7) - ((v_val * 91) >> 7)).clamp(0, 255) as u8;
            buffer[out_idx + 2] = (y_val + ((u_val * 227) >> 7)).clamp(0, 255) as u8;
            out_idx += 4;
        }
    }
    Some(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_strips_padding() {
        // 2x2, 每行 8 字节有效数据 + 4 字节填充
        let mut src = Vec::new();
        src.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0, 0]);
        src.extend_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
        let out = rgba_from_packed(&src, 12, 2, 2).unwrap();
        assert_eq!(out, (1..=16).collect::<Vec<u8>>());
    }

    #[test]
    fn test_packed_rejects_short_stride() {
        assert!(rgba_from_packed(&[0; 16], 4, 2, 2).is_none());
        assert!(rgba_from_packed(&[0; 10], 8, 2, 2).is_none());
    }

    #[test]
    fn test_yuv_gray_is_gray() {
        let (w, h) = (4, 2);
        let y = vec![128u8; w * h];
        let u = vec![128u8; 2];
        let v = vec![128u8; 2];
        let out = rgba_from_yuv420p(&y, &u, &v, w, 2, w, h).unwrap();
        assert_eq!(out.len(), w * h * 4);
        for px in out.chunks(4) {
            assert_eq!(px, &[128, 128, 128, 255]);
        }
    }

    #[test]
    fn test_yuv_red_chroma() {
        // V 偏高 → 红色分量大于蓝色
        let out = rgba_from_yuv420p(&[100; 4], &[128], &[200], 2, 1, 2, 2).unwrap();
        assert!(out[0] > out[2]);
        assert_eq!(out[3], 255);
    }

    #[test]
    fn test_dimensions() {
        assert!(valid_dimensions(1280, 720));
        assert!(!valid_dimensions(0, 720));
        assert!(!valid_dimensions(8192, 720));
    }
}
