//! Raster encoding with print resolution metadata.
//!
//! PNG output carries a `pHYs` chunk and JPEG output a JFIF density so that
//! print layouts place the artifact at the intended physical size.

use std::{fmt, io::Cursor, str::FromStr};

use image::{
    RgbImage,
    codecs::jpeg::{JpegEncoder, PixelDensity},
};

use crate::RasterError;

/// Inches per meter, used to convert DPI into PNG pixels-per-meter.
const INCHES_PER_METER: f64 = 39.370_078_740_157_48;

/// Output format of the compositor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    #[default]
    Png,
    Jpeg,
}

impl RasterFormat {
    /// Returns the MIME type of the encoded output.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Returns the conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png => f.write_str("png"),
            Self::Jpeg => f.write_str("jpeg"),
        }
    }
}

impl FromStr for RasterFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            _ => Err(format!("unsupported raster format `{s}`, valid values: png, jpeg")),
        }
    }
}

/// Converts dots per inch to PNG pixels per meter.
///
/// # Examples
///
/// ```
/// # use callout_raster::encode::dpi_to_pixels_per_meter;
/// assert_eq!(dpi_to_pixels_per_meter(300), 11811);
/// assert_eq!(dpi_to_pixels_per_meter(72), 2835);
/// ```
pub fn dpi_to_pixels_per_meter(dpi: u32) -> u32 {
    (f64::from(dpi) * INCHES_PER_METER).round() as u32
}

/// Encodes `image` as PNG with a `pHYs` chunk for `dpi`.
pub fn encode_png(image: &RgbImage, dpi: u32) -> Result<Vec<u8>, RasterError> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let ppm = dpi_to_pixels_per_meter(dpi);
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: png::Unit::Meter,
        }));

        let mut writer = encoder.write_header()?;
        writer.write_image_data(image.as_raw())?;
        writer.finish()?;
    }
    Ok(out)
}

/// Encodes `image` as baseline JPEG with a JFIF density of `dpi`.
pub fn encode_jpeg(image: &RgbImage, dpi: u32, quality: u8) -> Result<Vec<u8>, RasterError> {
    let mut out = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    let density = u16::try_from(dpi).unwrap_or(u16::MAX);
    encoder.set_pixel_density(PixelDensity::dpi(density));
    encoder
        .encode_image(image)
        .map_err(|err| RasterError::Encode(err.to_string()))?;
    Ok(out.into_inner())
}

/// Encodes `image` in `format`.
pub fn encode(
    image: &RgbImage,
    format: RasterFormat,
    dpi: u32,
    jpeg_quality: u8,
) -> Result<Vec<u8>, RasterError> {
    match format {
        RasterFormat::Png => encode_png(image, dpi),
        RasterFormat::Jpeg => encode_jpeg(image, dpi, jpeg_quality),
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    fn read_phys(png_bytes: &[u8]) -> Option<png::PixelDimensions> {
        let decoder = png::Decoder::new(png_bytes);
        let reader = decoder.read_info().ok()?;
        reader.info().pixel_dims
    }

    #[test]
    fn test_png_carries_dpi() {
        let img = RgbImage::from_pixel(4, 3, Rgb([255, 0, 0]));
        let bytes = encode_png(&img, 300).unwrap();

        let dims = read_phys(&bytes).unwrap();
        assert_eq!(dims.xppu, 11811);
        assert_eq!(dims.yppu, 11811);
        assert_eq!(dims.unit, png::Unit::Meter);

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_jpeg_carries_density() {
        let img = RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]));
        let bytes = encode_jpeg(&img, 300, 90).unwrap();

        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        // JFIF APP0: "JFIF\0", version (2), units (1 = dots per inch), x/y density.
        let jfif = bytes
            .windows(5)
            .position(|w| w == b"JFIF\0")
            .unwrap();
        let units = bytes[jfif + 7];
        let x_density = u16::from_be_bytes([bytes[jfif + 8], bytes[jfif + 9]]);
        assert_eq!(units, 1);
        assert_eq!(x_density, 300);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("png".parse::<RasterFormat>(), Ok(RasterFormat::Png));
        assert_eq!("JPG".parse::<RasterFormat>(), Ok(RasterFormat::Jpeg));
        assert_eq!("jpeg".parse::<RasterFormat>(), Ok(RasterFormat::Jpeg));
        assert!("gif".parse::<RasterFormat>().is_err());
    }

    #[test]
    fn test_format_mime() {
        assert_eq!(RasterFormat::Png.mime(), "image/png");
        assert_eq!(RasterFormat::Jpeg.extension(), "jpg");
    }
}
