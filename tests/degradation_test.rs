#[path = "common/mod.rs"]
mod common;

use common::*;
use tempfile::TempDir;
use vmdl_porter::descriptor::MaterialParams;
use vmdl_porter::geometry::NoGeometry;
use vmdl_porter::locator::{FsListing, TextureLocator, TextureRole};
use vmdl_porter::pipeline::ModelConverter;
use vmdl_porter::texture_pipeline::decode::ImageFileDecoder;
use vmdl_porter::texture_pipeline::{OutputDirs, TextureProcessor, DETAIL_FINAL, NORMAL};

#[test]
fn test_dds_wins_resolution_but_fails_decode() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(tmp.path(), 8);
    let dir = config.paths.input.clone();
    write_bytes(&dir.join("wall01.bin"), &descriptor_bytes(&[], &[]));
    write_bytes(&dir.join("wall01_bump.dds"), b"DDS \x7c\x00\x00\x00");
    write_gray_png(&dir.join("wall01_bump.png"), 8, 200);

    let locator = TextureLocator::new(&FsListing, None, &config.textures.patterns);
    let textures = locator.resolve_roles(&dir.join("wall01.bin"));
    assert_eq!(
        textures.get(TextureRole::Bump),
        Some(dir.join("wall01_bump.dds").as_path())
    );

    let dirs = OutputDirs::under(&config.paths.output);
    let processor = TextureProcessor::new(&config.textures, &ImageFileDecoder);
    let derived = processor.process_all(&textures, &MaterialParams::default(), &dirs);

    // the PNG fallback is never consulted
    assert!(derived.attempted(NORMAL));
    assert_eq!(derived.get(NORMAL), None);
    assert!(!dirs.textures.join("wall01_bump_normal.png").exists());
}

#[test]
fn test_detail_without_bump_uses_placeholder_mask() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(tmp.path(), 8);
    let dir = config.paths.input.clone();
    write_bytes(&dir.join("rock.bin"), &descriptor_bytes(&["rock_det.png"], &[]));
    write_rgb_png(&dir.join("rock_det.png"), 4, [10, 90, 0]);

    let locator = TextureLocator::new(&FsListing, None, &config.textures.patterns);
    let textures = locator.resolve_roles(&dir.join("rock.bin"));
    assert_eq!(textures.get(TextureRole::Bump), None);

    let dirs = OutputDirs::under(&config.paths.output);
    let processor = TextureProcessor::new(&config.textures, &ImageFileDecoder);
    let derived = processor.process_all(&textures, &MaterialParams::default(), &dirs);

    assert!(!derived.attempted(NORMAL));
    let baked = derived.get(DETAIL_FINAL).expect("baked detail produced");
    assert_eq!(baked, dirs.details_baked.join("rock_det_final.png"));
    // placeholder 127 puts no weight on the red split; 0.996 * 90 truncates
    assert_solid_gray(baked, 89);
}

#[test]
fn test_corrupt_inputs_do_not_abort_model() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(tmp.path(), 8);
    let dir = config.paths.input.clone();
    let model = write_bytes(&dir.join("barrel.fbx"), b"fbx");
    write_bytes(&dir.join("barrel.bin"), b"");
    write_bytes(&dir.join("barrel_bump.png"), b"not a png");
    write_bytes(&dir.join("barrel_detail.png"), b"\x89PNG truncated");
    write_rgb_png(&dir.join("barrel_spec.png"), 4, [1, 2, 3]);

    let converter = ModelConverter::new(&config, &FsListing, &ImageFileDecoder, &NoGeometry);
    let report = converter.process_single_model(&model).unwrap();

    assert_eq!(report.descriptor.magic, None);
    assert_eq!(report.descriptor.material_params, MaterialParams::default());
    assert_eq!(report.derived.get(NORMAL), None);
    assert_eq!(report.derived.get(DETAIL_FINAL), None);
    assert_eq!(
        report.derived.get("specular"),
        Some(config.paths.output.join("textures/barrel_spec.png").as_path())
    );
    assert!(report.vmat.is_some());
}
