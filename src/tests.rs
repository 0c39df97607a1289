#[cfg(test)]
mod integration_tests {
    use crate::{
        load_config, Cli, CliRunner, Config, ImageFormat, MockRenderer, ScreenshotError,
        ScreenshotOptions, ScreenshotService, Size, SizePreset,
    };
    use clap::error::ErrorKind;
    use clap::Parser;
    use std::io::Cursor;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut data = Vec::new();
        img.write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)
            .unwrap();
        data
    }

    fn write_page(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, "<html><body><h1>Hello</h1></body></html>").unwrap();
        path
    }

    fn service_with(renderer: MockRenderer) -> ScreenshotService {
        ScreenshotService::with_renderer(Config::default(), Arc::new(renderer))
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    #[tokio::test]
    async fn test_generate_writes_default_name_into_outdir() {
        let dir = TempDir::new().unwrap();
        let page = write_page(&dir, "card.html");
        let outdir = dir.path().join("shots");

        let mut renderer = MockRenderer::new();
        let expected_page = page.clone();
        renderer
            .expect_render()
            .withf(move |job| {
                job.html_path == expected_page
                    && job.file_url.scheme() == "file"
                    && job.resolved.viewport == Size::new(1200, 630)
                    && job.resolved.format == ImageFormat::Png
                    && job.resolved.device_scale_factor == 2.0
            })
            .times(1)
            .returning(|_| Ok(png_bytes(2400, 1260)));

        let options = ScreenshotOptions {
            size: Some(SizePreset::Og),
            outdir: Some(outdir.clone()),
            ..Default::default()
        };
        let result = service_with(renderer)
            .generate(&page, None, &options)
            .await
            .unwrap();

        assert_eq!(result.output_path, outdir.join("card.png"));
        assert!(result.output_path.exists());
        assert_eq!(result.pixel_size, Some(Size::new(2400, 1260)));
        assert_eq!(result.file_size, std::fs::metadata(&result.output_path).unwrap().len() as usize);
    }

    #[tokio::test]
    async fn test_missing_html_file_is_reported_before_rendering() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.html");

        let mut renderer = MockRenderer::new();
        renderer.expect_render().times(0);

        let err = service_with(renderer)
            .generate(&missing, None, &ScreenshotOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ScreenshotError::HtmlFileNotFound(ref path) if path == &missing));
        assert_eq!(err.to_string(), format!("HTML file not found: {}", missing.display()));
    }

    #[tokio::test]
    async fn test_format_inferred_from_output_file() {
        let dir = TempDir::new().unwrap();
        let page = write_page(&dir, "page.html");
        let output = dir.path().join("out.jpg");

        let mut renderer = MockRenderer::new();
        renderer
            .expect_render()
            .withf(|job| {
                job.resolved.format == ImageFormat::Jpg && job.resolved.capture_quality() == Some(85)
            })
            .times(1)
            .returning(|_| Ok(vec![0xFF, 0xD8, 0xFF]));

        let result = service_with(renderer)
            .generate(&page, Some(&output), &ScreenshotOptions::default())
            .await
            .unwrap();

        assert_eq!(result.output_path, output);
        assert_eq!(result.format, ImageFormat::Jpg);
        // Truncated JPEG header: written as-is, dimensions unknown
        assert_eq!(result.pixel_size, None);
    }

    #[tokio::test]
    async fn test_explicit_format_wins_over_output_extension() {
        let dir = TempDir::new().unwrap();
        let page = write_page(&dir, "page.html");
        let output = dir.path().join("out.jpg");

        let mut renderer = MockRenderer::new();
        renderer
            .expect_render()
            .withf(|job| job.resolved.format == ImageFormat::Png && job.resolved.capture_quality().is_none())
            .times(1)
            .returning(|_| Ok(png_bytes(4, 4)));

        let options = ScreenshotOptions {
            format: Some(ImageFormat::Png),
            ..Default::default()
        };
        service_with(renderer)
            .generate(&page, Some(&output), &options)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_render_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let page = write_page(&dir, "page.html");
        let outdir = dir.path().join("out");

        let mut renderer = MockRenderer::new();
        renderer
            .expect_render()
            .times(1)
            .returning(|_| Err(ScreenshotError::Timeout(Duration::from_secs(30))));

        let options = ScreenshotOptions {
            outdir: Some(outdir.clone()),
            ..Default::default()
        };
        let err = service_with(renderer)
            .generate(&page, None, &options)
            .await
            .unwrap_err();

        assert!(matches!(err, ScreenshotError::Timeout(_)));
        assert!(!outdir.join("page.png").exists());
    }

    #[tokio::test]
    async fn test_empty_capture_is_an_error() {
        let dir = TempDir::new().unwrap();
        let page = write_page(&dir, "page.html");

        let mut renderer = MockRenderer::new();
        renderer.expect_render().times(1).returning(|_| Ok(Vec::new()));

        let options = ScreenshotOptions {
            outdir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let err = service_with(renderer)
            .generate(&page, None, &options)
            .await
            .unwrap_err();

        assert!(matches!(err, ScreenshotError::CaptureFailed(_)));
    }

    #[tokio::test]
    async fn test_invalid_dimensions_fail_before_rendering() {
        let dir = TempDir::new().unwrap();
        let page = write_page(&dir, "page.html");

        let mut renderer = MockRenderer::new();
        renderer.expect_render().times(0);

        let options = ScreenshotOptions {
            width: Some(0),
            ..Default::default()
        };
        let err = service_with(renderer)
            .generate(&page, None, &options)
            .await
            .unwrap_err();

        assert!(err.is_usage_error());
    }

    #[test]
    fn test_cli_parses_positionals_and_options() {
        let cli = Cli::try_parse_from([
            "html-shot",
            "page.html",
            "shot.jpeg",
            "--size",
            "og",
            "--format",
            "JPEG",
            "--height",
            "800",
            "--outdir",
            "./screenshots",
            "--wait",
            "250",
        ])
        .unwrap();

        assert_eq!(cli.html_file, PathBuf::from("page.html"));
        assert_eq!(cli.out_file.as_deref(), Some(Path::new("shot.jpeg")));

        let options = cli.screenshot_options();
        assert_eq!(options.size, Some(SizePreset::Og));
        assert_eq!(options.format, Some(ImageFormat::Jpeg));
        assert_eq!(options.height, Some(800));
        assert_eq!(options.width, None);
        assert_eq!(options.outdir, Some(PathBuf::from("./screenshots")));
        assert_eq!(options.wait, Some(Duration::from_millis(250)));
        assert!(!options.full_page);
    }

    #[test]
    fn test_cli_options_before_input() {
        let cli = Cli::try_parse_from(["html-shot", "--size", "github", "page.html"]).unwrap();
        assert_eq!(cli.size, Some(SizePreset::Github));
        assert!(cli.out_file.is_none());
    }

    #[test]
    fn test_cli_rejects_unknown_preset() {
        let err = Cli::try_parse_from(["html-shot", "page.html", "--size", "poster"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.to_string().contains("Invalid size preset: poster"));
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        let err = Cli::try_parse_from(["html-shot", "page.html", "--format", "gif"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.to_string().contains("Use png, jpg, or jpeg."));
    }

    #[test]
    fn test_cli_rejects_zero_width_and_bad_quality() {
        assert!(Cli::try_parse_from(["html-shot", "page.html", "--width", "0"]).is_err());
        assert!(Cli::try_parse_from(["html-shot", "page.html", "--quality", "101"]).is_err());
    }

    #[test]
    fn test_cli_without_arguments_shows_help() {
        let err = Cli::try_parse_from(["html-shot"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand);
    }

    #[test]
    fn test_help_lists_presets() {
        let err = Cli::try_parse_from(["html-shot", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        let help = err.to_string();
        assert!(help.contains("Size Presets:"));
        assert!(help.contains("github     1280x640"));
        assert!(help.contains("--width and --height override --size preset values"));
    }

    #[tokio::test]
    async fn test_load_config_file_with_overrides() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("html-shot.json");
        std::fs::write(&config_path, r#"{"default_width": 800, "device_scale_factor": 1.0}"#).unwrap();

        let args = Cli::try_parse_from([
            "html-shot",
            "page.html",
            "--config",
            config_path.to_str().unwrap(),
            "--timeout",
            "5",
            "--chrome-path",
            "/usr/bin/chromium",
        ])
        .unwrap();

        let config = load_config(&args).await.unwrap();
        assert_eq!(config.default_width, 800);
        assert_eq!(config.default_height, 720);
        assert_eq!(config.device_scale_factor, 1.0);
        assert_eq!(config.render_timeout, Duration::from_secs(5));
        assert_eq!(config.chrome_path.as_deref(), Some("/usr/bin/chromium"));
    }

    #[tokio::test]
    async fn test_load_config_rejects_zero_timeout() {
        let args = Cli::try_parse_from(["html-shot", "page.html", "--timeout", "0"]).unwrap();
        let err = load_config(&args).await.unwrap_err();
        assert!(err
            .downcast_ref::<ScreenshotError>()
            .is_some_and(ScreenshotError::is_usage_error));
    }

    #[tokio::test]
    async fn test_cli_runner_uses_service() {
        let dir = TempDir::new().unwrap();
        let page = write_page(&dir, "report.html");

        let mut renderer = MockRenderer::new();
        renderer
            .expect_render()
            .withf(|job| job.resolved.viewport == Size::new(375, 667) && job.resolved.full_page)
            .times(1)
            .returning(|_| Ok(png_bytes(750, 1334)));

        let args = Cli::try_parse_from([
            "html-shot",
            page.to_str().unwrap(),
            "--size",
            "mobile",
            "--full-page",
            "--outdir",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();

        let runner = CliRunner::with_service(service_with(renderer));
        let result = runner.run(&args).await.unwrap();
        assert_eq!(result.output_path, dir.path().join("report.png"));
        assert_eq!(result.pixel_size, Some(Size::new(750, 1334)));
    }

    #[tokio::test]
    async fn test_generate_logs_absolute_output_path() {
        let dir = TempDir::new().unwrap();
        let page = write_page(&dir, "landing.html");

        let mut renderer = MockRenderer::new();
        renderer
            .expect_render()
            .times(1)
            .returning(|_| Ok(png_bytes(2560, 1440)));

        let (logs, _guard) = capture_logs();
        let options = ScreenshotOptions {
            outdir: Some(dir.path().join("out").join("..").join("shots")),
            ..Default::default()
        };
        let result = service_with(renderer)
            .generate(&page, None, &options)
            .await
            .unwrap();

        let expected = dir.path().join("shots").join("landing.png");
        assert_eq!(result.output_path, expected);
        let logs = logs.contents();
        assert!(logs.contains(&format!("Generated: {}", expected.display())), "{logs}");
        assert!(!logs.contains("expected"), "{logs}");
    }

    #[tokio::test]
    async fn test_generate_warns_when_image_size_differs_from_viewport() {
        let dir = TempDir::new().unwrap();
        let page = write_page(&dir, "small.html");

        let mut renderer = MockRenderer::new();
        renderer
            .expect_render()
            .times(1)
            .returning(|_| Ok(png_bytes(100, 100)));

        let (logs, _guard) = capture_logs();
        let options = ScreenshotOptions {
            outdir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let result = service_with(renderer)
            .generate(&page, None, &options)
            .await
            .unwrap();

        assert_eq!(result.pixel_size, Some(Size::new(100, 100)));
        let logs = logs.contents();
        assert!(
            logs.contains("Captured image is 100x100 px, expected 2560x1440 px"),
            "{logs}"
        );
    }

    // Needs a local Chrome/Chromium: cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_real_browser_capture() {
        let dir = TempDir::new().unwrap();
        let page = write_page(&dir, "hello.html");

        let service = ScreenshotService::new(Config::default()).unwrap();
        let options = ScreenshotOptions {
            width: Some(320),
            height: Some(200),
            outdir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let result = service.generate(&page, None, &options).await.unwrap();

        assert_eq!(result.pixel_size, Some(Size::new(640, 400)));
    }

    // Needs a local Chrome/Chromium: cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_real_browser_full_page_keeps_scale_factor() {
        let dir = TempDir::new().unwrap();
        let page = dir.path().join("tall.html");
        std::fs::write(
            &page,
            "<html><body style=\"margin:0\"><div style=\"height:1000px\">Tall</div></body></html>",
        )
        .unwrap();

        let service = ScreenshotService::new(Config::default()).unwrap();
        let options = ScreenshotOptions {
            width: Some(320),
            height: Some(200),
            full_page: true,
            outdir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let result = service.generate(&page, None, &options).await.unwrap();

        let pixels = result.pixel_size.unwrap();
        assert_eq!(pixels.width, 320 * 2);
        assert_eq!(pixels.height, 1000 * 2);
    }
}
