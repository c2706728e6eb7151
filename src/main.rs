use std::env;
use std::path::PathBuf;

use skyforest_geotiff::{
    ByteOrder, DecodedImage, Error, GeoTiffSession, Result, SessionOptions,
};

const USAGE: &str = "usage: skyforest-geotiff <input.jpg> <output.tif> <origin_x> <origin_y> <scale_x> <scale_y> [--big-endian]";

#[derive(Debug, PartialEq)]
struct Args {
    input: PathBuf,
    output: PathBuf,
    origin: (f64, f64),
    scale: (f64, f64),
    byte_order: ByteOrder,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut byte_order = ByteOrder::LittleEndian;
    let mut positional = Vec::new();

    for arg in args {
        match arg.as_str() {
            "--big-endian" => byte_order = ByteOrder::BigEndian,
            "--little-endian" => byte_order = ByteOrder::LittleEndian,
            flag if flag.starts_with("--") => {
                return Err(Error::InvalidArgument(format!("unknown option {}\n{}", flag, USAGE)));
            }
            _ => positional.push(arg),
        }
    }

    if positional.len() != 6 {
        return Err(Error::InvalidArgument(USAGE.to_string()));
    }

    let number = |index: usize, name: &str| -> Result<f64> {
        positional[index]
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| Error::InvalidArgument(format!("{} must be a number, got {:?}", name, positional[index])))
    };

    Ok(Args {
        input: PathBuf::from(&positional[0]),
        output: PathBuf::from(&positional[1]),
        origin: (number(2, "origin_x")?, number(3, "origin_y")?),
        scale: (number(4, "scale_x")?, number(5, "scale_y")?),
        byte_order,
    })
}

fn main() -> Result<()> {
    env_logger::init();

    let args = parse_args(env::args().skip(1))?;

    println!("skyforest-geotiff - JPEG to GeoTIFF\n");

    let image = DecodedImage::from_jpeg_file(&args.input)?.into_byte_order(args.byte_order);
    println!("Input: {}", args.input.display());
    println!("  Size: {} x {}", image.width, image.height);
    println!("  Channels: {} ({})", image.channels, image.data_type.name());

    let options = SessionOptions { byte_order: args.byte_order, ..SessionOptions::default() };
    let mut session = GeoTiffSession::create_with_options(&args.output, options)?;
    session.set_origin(0.0, 0.0, args.origin.0, args.origin.1)?;
    session.set_pixel_scale(args.scale.0, args.scale.1)?;
    session.write_image(&image.to_spec())?;

    if let Some(transform) = session.georeference() {
        println!("\n{}", transform);
        let (min_x, min_y, max_x, max_y) = transform.bounding_box(image.width, image.height);
        println!("  Bounding Box:");
        println!("    Min: ({}, {})", min_x, min_y);
        println!("    Max: ({}, {})", max_x, max_y);
        println!("    Extent: {} x {}", max_x - min_x, max_y - min_y);
    }

    let bytes = session.close()?;
    println!("\nWrote {} bytes to {}", bytes.len(), args.output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let parsed = parse_args(args(&["in.jpg", "out.tif", "10", "50", "0.5", "0.25"])).unwrap();
        assert_eq!(parsed.input, PathBuf::from("in.jpg"));
        assert_eq!(parsed.origin, (10.0, 50.0));
        assert_eq!(parsed.scale, (0.5, 0.25));
        assert_eq!(parsed.byte_order, ByteOrder::LittleEndian);
    }

    #[test]
    fn test_parse_big_endian_flag() {
        let parsed = parse_args(args(&["--big-endian", "in.jpg", "out.tif", "-113.5", "53.5", "1", "1"])).unwrap();
        assert_eq!(parsed.byte_order, ByteOrder::BigEndian);
        assert_eq!(parsed.origin, (-113.5, 53.5));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(args(&["in.jpg"])).is_err());
        assert!(parse_args(args(&["in.jpg", "out.tif", "x", "50", "1", "1"])).is_err());
        assert!(parse_args(args(&["--verbose", "in.jpg", "out.tif", "0", "0", "1", "1"])).is_err());
    }
}
