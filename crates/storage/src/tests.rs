#[cfg(test)]
mod tests {
    use crate::{LocalSink, StorageConfig, StorageError, StorageType, VariantSink};
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;
    use tempfile::tempdir;

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn local_sink_stores_and_derives_metadata() {
        let temp_dir = tempdir().unwrap();
        let sink = LocalSink::new(
            temp_dir.path().to_path_buf(),
            "http://localhost:8090".to_string(),
        );

        let data = jpeg_bytes(320, 240);
        let stored = sink.store("abc123.jpeg", &data).await.unwrap();

        assert_eq!(stored.url, "http://localhost:8090/abc123.jpeg");
        assert_eq!(stored.width, 320);
        assert_eq!(stored.height, 240);
        assert_eq!(stored.format, "jpeg");
        assert!(temp_dir.path().join("abc123.jpeg").exists());
    }

    #[tokio::test]
    async fn local_sink_creates_nested_directories() {
        let temp_dir = tempdir().unwrap();
        let sink = LocalSink::new(
            temp_dir.path().to_path_buf(),
            "http://localhost:8090".to_string(),
        );

        let data = png_bytes(10, 10);
        let stored = sink.store("thumbs/small/abc123.png", &data).await.unwrap();

        assert_eq!(stored.url, "http://localhost:8090/thumbs/small/abc123.png");
        assert!(temp_dir.path().join("thumbs/small/abc123.png").exists());
    }

    #[tokio::test]
    async fn local_sink_rejects_traversal_filenames() {
        let temp_dir = tempdir().unwrap();
        let sink = LocalSink::new(
            temp_dir.path().to_path_buf(),
            "http://localhost:8090".to_string(),
        );

        let data = png_bytes(10, 10);

        let result = sink.store("../outside.png", &data).await;
        assert!(matches!(result, Err(StorageError::InvalidFilename(_))));

        let result = sink.store("./thumbs/../outside.png", &data).await;
        assert!(matches!(result, Err(StorageError::InvalidFilename(_))));

        let result = sink.store("", &data).await;
        assert!(matches!(result, Err(StorageError::InvalidFilename(_))));
    }

    #[tokio::test]
    async fn local_sink_overwrites_colliding_filenames() {
        // Filename collisions silently overwrite; the last write wins.
        let temp_dir = tempdir().unwrap();
        let sink = LocalSink::new(
            temp_dir.path().to_path_buf(),
            "http://localhost:8090".to_string(),
        );

        let first = sink.store("abc123.png", &png_bytes(10, 10)).await.unwrap();
        let second = sink.store("abc123.png", &png_bytes(20, 20)).await.unwrap();

        assert_eq!(first.url, second.url);
        assert_eq!(second.width, 20);
        assert_eq!(second.height, 20);
    }

    #[tokio::test]
    async fn local_sink_rejects_non_image_payload() {
        let temp_dir = tempdir().unwrap();
        let sink = LocalSink::new(
            temp_dir.path().to_path_buf(),
            "http://localhost:8090".to_string(),
        );

        let result = sink.store("abc123.png", b"not an image").await;
        assert!(matches!(result, Err(StorageError::Metadata(_))));
    }

    #[tokio::test]
    async fn local_sink_concurrent_stores() {
        let temp_dir = tempdir().unwrap();
        let sink = std::sync::Arc::new(LocalSink::new(
            temp_dir.path().to_path_buf(),
            "http://localhost:8090".to_string(),
        ));

        let mut handles = vec![];

        for i in 0..10 {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                let data = png_bytes(10 + i, 10 + i);
                let stored = sink
                    .store(&format!("concurrent_{}.png", i), &data)
                    .await
                    .unwrap();
                assert_eq!(stored.width, 10 + i);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn storage_config_creates_local_sink() {
        let temp_dir = tempdir().unwrap();
        let config = StorageConfig {
            storage_type: StorageType::Local {
                path: temp_dir.path().join("variants"),
            },
            public_domain: "http://localhost:8090".to_string(),
        };

        let sink = config.create_sink().await.unwrap();

        // The configured base directory is created on demand.
        assert!(temp_dir.path().join("variants").exists());

        let stored = sink.store("abc123.png", &png_bytes(10, 10)).await.unwrap();
        assert_eq!(stored.format, "png");
    }
}
