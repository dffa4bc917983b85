// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the render contract, statistics, and parameters

use std::sync::Arc;
use std::time::Duration;

use prism::{
    Engine, FilterType, FrameBuffer, FrameFormat, InputField, ParamValue, PixelEncoding,
    QueryRequest, QueryValue, RenderError,
};

fn uniform_frame(width: u32, height: u32, px: [u8; 4]) -> FrameBuffer {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..width * height {
        data.extend_from_slice(&px);
    }
    FrameBuffer::from_rgba(width, height, data).unwrap()
}

#[test]
fn test_grayscale_full_hd_mid_gray() {
    // 1920x1080 packed color, hint 3: output has identical dimensions and
    // every pixel's channels equal
    let engine = Engine::with_memory_settings();
    let filter = engine.create_filter(FilterType::Grayscale).unwrap();
    let format = FrameFormat::new(1920, 1080, PixelEncoding::Rgba8);
    filter.initialize(&format, 3).unwrap();
    assert!(filter.initialized());

    let frame = uniform_frame(1920, 1080, [128, 128, 128, 255]);
    let out = filter.render_frame(&frame).unwrap();
    assert_eq!(out.width(), 1920);
    assert_eq!(out.height(), 1080);
    for px in out.data().chunks_exact(4) {
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }
}

#[test]
fn test_every_image_filter_preserves_dimensions() {
    let engine = Engine::with_memory_settings();
    let format = FrameFormat::new(32, 24, PixelEncoding::Rgba8);
    let frame = uniform_frame(32, 24, [90, 140, 200, 255]);

    for descriptor in engine.registry().descriptors() {
        let filter = engine.create_filter(descriptor.filter_type).unwrap();
        filter.initialize(&format, 2).unwrap();
        let out = filter
            .render_frame(&frame)
            .unwrap_or_else(|e| panic!("{} failed: {}", descriptor.title, e));
        assert_eq!(out.width(), 32, "{}", descriptor.title);
        assert_eq!(out.height(), 24, "{}", descriptor.title);
    }
}

#[test]
fn test_reset_is_idempotent() {
    let engine = Engine::with_memory_settings();
    let filter = engine.create_filter(FilterType::Sepia).unwrap();
    filter
        .initialize(&FrameFormat::new(8, 8, PixelEncoding::Rgba8), 2)
        .unwrap();
    assert!(filter.initialized());

    filter.reset("test");
    assert!(!filter.initialized());
    filter.reset("test");
    assert!(!filter.initialized());
}

#[test]
fn test_initialize_failure_leaves_uninitialized() {
    let engine = Engine::with_memory_settings();
    let filter = engine.create_filter(FilterType::Noir).unwrap();
    let bad = FrameFormat::new(0, 1080, PixelEncoding::Rgba8);
    let err = filter.initialize(&bad, 3).err().unwrap();
    assert!(matches!(err, RenderError::Allocation(_)));
    assert!(!filter.initialized());
}

#[test]
fn test_reinitialize_after_format_change() {
    let engine = Engine::with_memory_settings();
    let filter = engine.create_filter(FilterType::Pixellate).unwrap();

    filter
        .initialize(&FrameFormat::new(16, 16, PixelEncoding::Rgba8), 2)
        .unwrap();
    let out = filter
        .render_frame(&uniform_frame(16, 16, [50, 50, 50, 255]))
        .unwrap();
    assert_eq!(out.width(), 16);

    filter
        .initialize(&FrameFormat::new(64, 32, PixelEncoding::Rgba8), 2)
        .unwrap();
    let out = filter
        .render_frame(&uniform_frame(64, 32, [50, 50, 50, 255]))
        .unwrap();
    assert_eq!(out.width(), 64);
    assert_eq!(out.height(), 32);
}

#[test]
fn test_mismatched_frame_is_conversion_error() {
    let engine = Engine::with_memory_settings();
    let filter = engine.create_filter(FilterType::Sepia).unwrap();
    filter
        .initialize(&FrameFormat::new(8, 8, PixelEncoding::Rgba8), 1)
        .unwrap();
    let wrong = uniform_frame(4, 4, [0, 0, 0, 255]);
    assert!(matches!(
        filter.render_frame(&wrong),
        Err(RenderError::Conversion(_))
    ));
}

#[test]
fn test_non_canonical_input_is_normalized() {
    let engine = Engine::with_memory_settings();
    let filter = engine.create_filter(FilterType::PassThrough).unwrap();
    let format = FrameFormat::new(4, 4, PixelEncoding::Gray8);
    filter.initialize(&format, 1).unwrap();

    let frame = FrameBuffer::new(format.clone(), vec![70u8; 16]).unwrap();
    let out = filter.render_frame(&frame).unwrap();
    assert_eq!(out.format().encoding, PixelEncoding::Rgba8);
    assert_eq!(&out.data()[..4], &[70, 70, 70, 255]);
}

#[test]
fn test_parameter_round_trip_every_type() {
    let engine = Engine::with_memory_settings();
    let params = engine.params();
    let id = engine.registry().descriptor(FilterType::Grayscale).unwrap().id;

    params.set_field(&id, InputField::RAdjustment, ParamValue::Double(0.77));
    assert_eq!(params.get_double(&id, InputField::RAdjustment, 0.0), 0.77);

    params.set_field(&id, InputField::Command, ParamValue::Int(2));
    assert_eq!(params.get_int(&id, InputField::Command, 0), 2);

    params.set_field(&id, InputField::InvertRed, ParamValue::Bool(false));
    assert!(!params.get_bool(&id, InputField::InvertRed, true));

    params.set_field(&id, InputField::Center, ParamValue::Point(0.25, 0.75));
    assert_eq!(
        params.get_point(&id, InputField::Center, (0.0, 0.0)),
        (0.25, 0.75)
    );

    params.set_field(
        &id,
        InputField::GridColor,
        ParamValue::Color([0.5, 0.25, 0.125, 1.0]),
    );
    assert_eq!(
        params.get_color(&id, InputField::GridColor, [0.0; 4]),
        [0.5, 0.25, 0.125, 1.0]
    );

    params.set_field(
        &id,
        InputField::Color0,
        ParamValue::Vector(vec![1.0, 2.0, 3.0]),
    );
    assert_eq!(
        params.get_vector(&id, InputField::Color0, &[]),
        vec![1.0, 2.0, 3.0]
    );

    params.set_field(
        &id,
        InputField::Width,
        ParamValue::Str("landscape".to_string()),
    );
    assert_eq!(params.get_string(&id, InputField::Width, ""), "landscape");
}

#[test]
fn test_get_default_never_persists() {
    let engine = Engine::with_memory_settings();
    let params = engine.params();
    let id = engine.registry().descriptor(FilterType::Median).unwrap().id;

    assert_eq!(params.get_int(&id, InputField::WindowSize, 7), 7);
    assert_eq!(params.get_double(&id, InputField::Radius, 1.5), 1.5);
    assert!(!params.has_field(&id, InputField::WindowSize));
    assert!(!params.has_field(&id, InputField::Radius));
}

#[test]
fn test_statistics_monotonic_and_resettable() {
    let engine = Engine::with_memory_settings();
    let filter = engine.create_filter(FilterType::Solarize).unwrap();
    let id = filter.id();
    filter
        .initialize(&FrameFormat::new(16, 16, PixelEncoding::Rgba8), 2)
        .unwrap();

    let frame = uniform_frame(16, 16, [30, 60, 90, 255]);
    let n = 5;
    for _ in 0..n {
        filter.render_frame(&frame).unwrap();
    }

    let live = engine.params().render_statistics(&id, false);
    assert_eq!(live.count, n);
    assert!(live.cumulative > Duration::ZERO);

    // the still accumulator is untouched by live renders
    assert_eq!(engine.params().render_statistics(&id, true).count, 0);

    engine.params().reset_accumulator(&id, false);
    let after = engine.params().render_statistics(&id, false);
    assert_eq!(after.count, 0);
    assert_eq!(after.cumulative, Duration::ZERO);
}

#[test]
fn test_still_render_deterministic() {
    let engine = Engine::with_memory_settings();
    let filter = engine.create_filter(FilterType::Grayscale).unwrap();
    filter.initialize_for_image().unwrap();

    let mut data = Vec::new();
    for i in 0..32 * 32 {
        data.extend_from_slice(&[(i % 251) as u8, (i % 127) as u8, (i % 83) as u8, 255]);
    }
    let image = image::DynamicImage::ImageRgba8(
        image::RgbaImage::from_raw(32, 32, data).unwrap(),
    );

    let first = filter.render_image(&image).unwrap();
    let second = filter.render_image(&image).unwrap();
    assert_eq!(first.to_rgba8().as_raw(), second.to_rgba8().as_raw());
}

#[test]
fn test_still_and_live_paths_are_independent() {
    let engine = Engine::with_memory_settings();
    let filter = engine.create_filter(FilterType::ColorInverter).unwrap();

    // image path works without live initialization
    filter.initialize_for_image().unwrap();
    assert!(filter.initialized_for_image());
    assert!(!filter.initialized());

    let image = image::DynamicImage::ImageRgba8(
        image::RgbaImage::from_pixel(8, 8, image::Rgba([10, 20, 30, 255])),
    );
    let out = filter.render_image(&image).unwrap().to_rgba8();
    assert_eq!(out.get_pixel(0, 0).0, [245, 235, 225, 255]);
}

#[test]
fn test_block_mean_query_grid() {
    // 64x64 uniform input queried with 32x32 blocks: exactly 4 records,
    // each the input color
    let engine = Engine::with_memory_settings();
    let filter = engine.create_filter(FilterType::BlockMean).unwrap();
    filter
        .initialize(&FrameFormat::new(64, 64, PixelEncoding::Rgba8), 2)
        .unwrap();

    let frame = uniform_frame(64, 64, [102, 51, 204, 255]);
    let request = QueryRequest::new()
        .with("Width", QueryValue::Int(32))
        .with("Height", QueryValue::Int(32))
        .with("CalculateMean", QueryValue::Bool(true));
    let results = filter.query(&frame, &request).unwrap();

    assert_eq!(results.get("HorizontalBlocks"), Some(&QueryValue::Int(2)));
    assert_eq!(results.get("VerticalBlocks"), Some(&QueryValue::Int(2)));
    let Some(QueryValue::ColorList(records)) = results.get("BlockMeans") else {
        panic!("missing block records");
    };
    assert_eq!(records.len(), 4);
    for record in records {
        assert!((record[0] - 102.0 / 255.0).abs() < 1e-6);
        assert!((record[1] - 51.0 / 255.0).abs() < 1e-6);
        assert!((record[2] - 204.0 / 255.0).abs() < 1e-6);
    }
}

#[test]
fn test_port_gating_for_generate_and_query() {
    let engine = Engine::with_memory_settings();
    let frame = uniform_frame(8, 8, [1, 2, 3, 255]);

    // input-bearing filter never generates
    let sepia = engine.create_filter(FilterType::Sepia).unwrap();
    assert!(sepia.generate().is_none());

    // output-bearing filter never answers queries
    sepia
        .initialize(&FrameFormat::new(8, 8, PixelEncoding::Rgba8), 1)
        .unwrap();
    assert!(sepia.query(&frame, &QueryRequest::new()).is_none());

    // generator produces an image with no input
    let board = engine.create_filter(FilterType::Checkerboard).unwrap();
    assert!(board.generate().is_some());
}

#[test]
fn test_distinct_instances_render_concurrently() {
    let engine = Engine::with_memory_settings();
    let live = engine.create_filter(FilterType::Grayscale).unwrap();
    let preview = engine.create_filter(FilterType::Sepia).unwrap();
    let format = FrameFormat::new(64, 64, PixelEncoding::Rgba8);
    live.initialize(&format, 3).unwrap();
    preview.initialize(&format, 3).unwrap();

    let frame = uniform_frame(64, 64, [120, 130, 140, 255]);
    let frame2 = frame.clone();

    let live_thread = std::thread::spawn(move || {
        for _ in 0..50 {
            live.render_frame(&frame).unwrap();
        }
        live
    });
    let preview_thread = std::thread::spawn(move || {
        for _ in 0..50 {
            preview.render_frame(&frame2).unwrap();
        }
        preview
    });

    let live = live_thread.join().unwrap();
    let preview = preview_thread.join().unwrap();
    assert_eq!(
        engine.params().render_statistics(&live.id(), false).count,
        50
    );
    assert_eq!(
        engine
            .params()
            .render_statistics(&preview.id(), false)
            .count,
        50
    );
}

#[test]
fn test_shared_instance_serialized_across_threads() {
    let engine = Engine::with_memory_settings();
    let filter = engine.create_filter(FilterType::Vignette).unwrap();
    filter
        .initialize(&FrameFormat::new(32, 32, PixelEncoding::Rgba8), 3)
        .unwrap();

    let frame = uniform_frame(32, 32, [200, 200, 200, 255]);
    let mut handles = Vec::new();
    for _ in 0..4 {
        let filter = Arc::clone(&filter);
        let frame = frame.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..25 {
                filter.render_frame(&frame).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(
        engine.params().render_statistics(&filter.id(), false).count,
        100
    );
}

#[test]
fn test_export_hooks_carry_provenance() {
    let engine = Engine::with_memory_settings();
    let filter = engine.create_filter(FilterType::Grayscale).unwrap();

    let keywords = filter.export_keywords();
    assert!(keywords.iter().any(|k| k == "Grayscale"));

    engine.params().set_field(
        &filter.id(),
        InputField::RAdjustment,
        ParamValue::Double(0.9),
    );
    let fields = filter.export_fields();
    assert!(fields
        .iter()
        .any(|(name, value)| name == "RAdjustment" && value == "0.9"));
    // unset fields export their declared defaults
    assert!(fields
        .iter()
        .any(|(name, value)| name == "GAdjustment" && value == "0.5"));

    let json: serde_json::Value =
        serde_json::from_str(&filter.export_provenance_json()).unwrap();
    assert_eq!(json["filter"], "Grayscale");
    assert_eq!(json["fields"]["RAdjustment"], "0.9");
}

#[test]
fn test_is_slow_hint() {
    let engine = Engine::with_memory_settings();
    assert!(engine
        .create_filter(FilterType::Median)
        .unwrap()
        .is_slow());
    assert!(!engine
        .create_filter(FilterType::PassThrough)
        .unwrap()
        .is_slow());
}
