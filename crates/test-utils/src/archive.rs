//! Zip archives built in memory, shaped like the service's download bundles.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

/// Build a zip archive holding `members` (name, contents) in order.
pub fn zip_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, contents) in members {
        zip.start_file(*name, options).expect("start zip member");
        zip.write_all(contents).expect("write zip member");
    }

    zip.finish().expect("finish zip").into_inner()
}

/// A typical `gs:Download` result: one GeoTIFF plus its SLD style.
pub fn raster_bundle(layer_stub: &str) -> Vec<u8> {
    let tif = format!("{}.tif", layer_stub);
    let sld = format!("{}.sld", layer_stub);
    zip_bytes(&[
        (tif.as_str(), b"II*\0fake-geotiff".as_slice()),
        (sld.as_str(), b"<StyledLayerDescriptor/>".as_slice()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_members() {
        let bytes = raster_bundle("S2A_stub");
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert_eq!(archive.len(), 2);
        assert!(names.contains(&"S2A_stub.tif"));
        assert!(names.contains(&"S2A_stub.sld"));
    }
}
