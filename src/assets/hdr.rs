use image::ImageFormat;
use tracing::debug;

use crate::error::Result;
use crate::model::EnvironmentMap;

/// Decodes a Radiance `.hdr` file into an RGBA16F equirectangular map.
pub fn decode_environment(bytes: &[u8]) -> Result<EnvironmentMap> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Hdr)?;
    let width = img.width();
    let height = img.height();
    let rgb = img.into_rgb32f();

    let mut texels = Vec::with_capacity((width * height * 4) as usize);
    for pixel in rgb.pixels() {
        texels.extend([
            half::f16::from_f32(pixel[0]),
            half::f16::from_f32(pixel[1]),
            half::f16::from_f32(pixel[2]),
            half::f16::ONE,
        ]);
    }
    debug!(width, height, "decoded environment map");

    Ok(EnvironmentMap { width, height, texels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewerError;

    #[test]
    fn garbage_is_an_image_error() {
        let err = decode_environment(b"definitely not radiance").unwrap_err();
        assert!(matches!(err, ViewerError::Image(_)));
    }

    #[test]
    fn decodes_tiny_uncompressed_file() {
        // 2x1 flat RGBE scanline: (1,1,1) and (0.5,0.5,0.5).
        let mut bytes = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 1 +X 2\n".to_vec();
        bytes.extend([128, 128, 128, 129, 128, 128, 128, 128]);

        let env = decode_environment(&bytes).unwrap();
        assert_eq!((env.width, env.height), (2, 1));
        assert_eq!(env.texels.len(), 8);
        assert_eq!(env.texels[0].to_f32(), 1.0);
        assert_eq!(env.texels[4].to_f32(), 0.5);
        assert_eq!(env.texels[7], half::f16::ONE);
    }
}
