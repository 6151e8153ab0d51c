use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

use starfighter::sprites::{load_sprites, sprite_path, SpriteError, SpriteKind};

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("starfighter-{tag}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(dir: &Path, kind: SpriteKind, w: u32, h: u32) {
    RgbaImage::from_pixel(w, h, Rgba([200, 40, 40, 255]))
        .save(sprite_path(dir, kind))
        .unwrap();
}

#[test]
fn sprite_path_follows_the_fixed_convention() {
    let base = PathBuf::from("images");
    assert_eq!(
        sprite_path(&base, SpriteKind::Xwing),
        PathBuf::from("images/xwing.png")
    );
    assert_eq!(
        sprite_path(&base, SpriteKind::TieFighter),
        PathBuf::from("images/tieFighter.png")
    );
    assert_eq!(
        sprite_path(&base, SpriteKind::Plasma),
        PathBuf::from("images/plasma.png")
    );
}

#[test]
fn load_sprites_decodes_all_three() {
    let dir = temp_dir("load-ok");
    write_png(&dir, SpriteKind::Xwing, 50, 33);
    write_png(&dir, SpriteKind::TieFighter, 30, 30);
    write_png(&dir, SpriteKind::Plasma, 30, 30);

    let store = load_sprites(&dir).unwrap();
    let xwing = store.get(SpriteKind::Xwing);
    assert_eq!((xwing.width(), xwing.height()), (50.0, 33.0));
    assert_eq!(xwing.kind(), SpriteKind::Xwing);
    let tie = store.get(SpriteKind::TieFighter);
    assert_eq!((tie.width(), tie.height()), (30.0, 30.0));
    let plasma = store.get(SpriteKind::Plasma);
    assert_eq!((plasma.width(), plasma.height()), (30.0, 30.0));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn store_shares_one_sprite_per_kind() {
    let dir = temp_dir("load-shared");
    write_png(&dir, SpriteKind::Xwing, 50, 33);
    write_png(&dir, SpriteKind::TieFighter, 30, 30);
    write_png(&dir, SpriteKind::Plasma, 30, 30);

    let store = load_sprites(&dir).unwrap();
    // every get() hands out the same shared decode, not a copy
    assert!(std::sync::Arc::ptr_eq(
        &store.get(SpriteKind::Plasma),
        &store.get(SpriteKind::Plasma)
    ));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn load_sprites_names_the_missing_file() {
    let dir = temp_dir("load-missing");
    // tieFighter.png deliberately absent
    write_png(&dir, SpriteKind::Xwing, 50, 33);
    write_png(&dir, SpriteKind::Plasma, 30, 30);

    let err = load_sprites(&dir).unwrap_err();
    match err {
        SpriteError::Load { name, .. } => assert_eq!(name, "tieFighter"),
        other => panic!("unexpected error: {other}"),
    }

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn load_sprites_rejects_garbage_bytes() {
    let dir = temp_dir("load-garbage");
    write_png(&dir, SpriteKind::Xwing, 50, 33);
    write_png(&dir, SpriteKind::TieFighter, 30, 30);
    fs::write(sprite_path(&dir, SpriteKind::Plasma), b"not a png").unwrap();

    let err = load_sprites(&dir).unwrap_err();
    match err {
        SpriteError::Load { name, .. } => assert_eq!(name, "plasma"),
        other => panic!("unexpected error: {other}"),
    }

    fs::remove_dir_all(&dir).ok();
}
