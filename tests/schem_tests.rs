use quartz_nbt::io::Flavor;
use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use schemgen::formats::schem::{from_schem, is_schem, to_schem, SchemFields};
use schemgen::{
    read_schem_file, write_schem_file, BlockGrid, BlockIdentifier, Dimensions, SchemError,
    Schematic, VersionInfo,
};

fn nbt_bytes(root: &NbtCompound) -> Vec<u8> {
    let mut buf = Vec::new();
    quartz_nbt::io::write_nbt(&mut buf, None, root, Flavor::GzCompressed).unwrap();
    buf
}

/// Minimal hand-written root: 2x1x1, palette and data supplied by the caller.
fn raw_root(palette: &[(&str, i32)], data: &[u8]) -> NbtCompound {
    let mut root = NbtCompound::new();
    root.insert("Version", NbtTag::Int(2));
    root.insert("DataVersion", NbtTag::Int(3700));
    root.insert("Width", NbtTag::Short(2));
    root.insert("Height", NbtTag::Short(1));
    root.insert("Length", NbtTag::Short(1));
    let mut p = NbtCompound::new();
    for (name, id) in palette {
        p.insert(*name, NbtTag::Int(*id));
    }
    root.insert("Palette", NbtTag::Compound(p));
    root.insert(
        "BlockData",
        NbtTag::ByteArray(data.iter().map(|&b| b as i8).collect()),
    );
    root.insert("BlockEntities", NbtTag::List(NbtList::new()));
    root
}

/// The 2x1x2 example: air, glass, stone, air in linear order.
#[test]
fn encode_small_grid_end_to_end() {
    let dims = Dimensions::new(2, 1, 2).unwrap();
    let grid = BlockGrid::from_fn(dims, |x, _, z| match (x, z) {
        (1, 0) => "minecraft:glass".into(),
        (0, 1) => "minecraft:stone".into(),
        _ => BlockIdentifier::air(),
    });
    let schematic = Schematic::from_grid(&grid, [0, 0, 0], VersionInfo::default());
    let fields = schematic.to_fields();

    assert_eq!((fields.width, fields.height, fields.length), (2, 1, 2));
    assert_eq!(
        fields.palette,
        vec![
            ("minecraft:air".to_string(), 0),
            ("minecraft:glass".to_string(), 1),
            ("minecraft:stone".to_string(), 2),
        ]
    );
    assert_eq!(fields.palette_max, 3);
    assert_eq!(fields.block_data, vec![0, 1, 2, 0]);
    assert_eq!(fields.offset, [0, 0, 0]);

    let bytes = to_schem(&schematic).unwrap();
    assert!(is_schem(&bytes));
    let decoded = from_schem(&bytes).unwrap();
    assert_eq!(decoded, schematic);
}

#[test]
fn palette_is_independent_of_cell_order() {
    let dims = Dimensions::new(3, 1, 1).unwrap();
    let forward = BlockGrid::from_linear(
        dims,
        vec!["minecraft:stone".into(), "minecraft:dirt".into(), "minecraft:air".into()],
    )
    .unwrap();
    let backward = BlockGrid::from_linear(
        dims,
        vec!["minecraft:air".into(), "minecraft:dirt".into(), "minecraft:stone".into()],
    )
    .unwrap();

    let a = Schematic::from_grid(&forward, [0, 0, 0], VersionInfo::default());
    let b = Schematic::from_grid(&backward, [0, 0, 0], VersionInfo::default());
    assert_eq!(a.palette, b.palette);
    assert_eq!(a.block_data(), vec![2, 1, 0]);
    assert_eq!(b.block_data(), vec![0, 1, 2]);
}

#[test]
fn large_palette_uses_multibyte_varints() {
    let dims = Dimensions::new(200, 1, 1).unwrap();
    let grid = BlockGrid::from_fn(dims, |x, _, _| {
        BlockIdentifier::new(format!("minecraft:b{:03}", x))
    });
    let schematic = Schematic::from_grid(&grid, [0, 0, 0], VersionInfo::default());
    let data = schematic.block_data();
    // ids 0..=127 take one byte, 128..=199 take two
    assert_eq!(data.len(), 128 + 72 * 2);

    let decoded = from_schem(&to_schem(&schematic).unwrap()).unwrap();
    assert_eq!(
        decoded.get_block(150, 0, 0).unwrap().as_str(),
        "minecraft:b150"
    );
}

#[test]
fn decode_foreign_file_with_sparse_ids() {
    let root = raw_root(&[("minecraft:stone", 5), ("minecraft:air", 9)], &[9, 5]);
    let schematic = from_schem(&nbt_bytes(&root)).unwrap();

    assert_eq!(schematic.offset, [0, 0, 0]);
    assert_eq!(schematic.version.data_version, 3700);
    let placed = schematic.placed_cells();
    assert_eq!(placed.len(), 1);
    assert_eq!((placed[0].x, placed[0].y, placed[0].z), (1, 0, 0));
    assert_eq!(placed[0].block.as_str(), "minecraft:stone");
}

#[test]
fn duplicate_palette_id_is_rejected() {
    let root = raw_root(&[("minecraft:stone", 0), ("minecraft:dirt", 0)], &[0, 0]);
    let err = from_schem(&nbt_bytes(&root)).unwrap_err();
    assert!(
        matches!(err, SchemError::DuplicatePaletteId { id: 0, .. }),
        "{:?}",
        err
    );
}

#[test]
fn block_count_must_match_volume() {
    let short = raw_root(&[("minecraft:stone", 0)], &[0]);
    assert!(matches!(
        from_schem(&nbt_bytes(&short)).unwrap_err(),
        SchemError::BlockCountMismatch { expected: 2, found: 1, .. }
    ));

    let long = raw_root(&[("minecraft:stone", 0)], &[0, 0, 0]);
    assert!(matches!(
        from_schem(&nbt_bytes(&long)).unwrap_err(),
        SchemError::BlockCountMismatch { trailing: 1, .. }
    ));
}

#[test]
fn oversized_header_with_tiny_payload_is_rejected() {
    let mut root = raw_root(&[("minecraft:stone", 0)], &[0, 0, 0, 0]);
    for key in ["Width", "Height", "Length"] {
        root.insert(key, NbtTag::Short(i16::MAX));
    }
    let bytes = nbt_bytes(&root);
    assert!(bytes.len() < 200);

    let err = from_schem(&bytes).unwrap_err();
    let volume = (i16::MAX as usize).pow(3);
    assert!(
        matches!(
            err,
            SchemError::BlockCountMismatch { expected, found: 4, .. } if expected == volume
        ),
        "{:?}",
        err
    );
}

#[test]
fn truncated_varint_is_malformed() {
    let root = raw_root(&[("minecraft:stone", 0)], &[0, 0x80]);
    assert!(matches!(
        from_schem(&nbt_bytes(&root)).unwrap_err(),
        SchemError::MalformedVarint { offset: 1 }
    ));
}

#[test]
fn unknown_id_decodes_to_air() {
    let root = raw_root(&[("minecraft:stone", 0)], &[0, 7]);
    let schematic = from_schem(&nbt_bytes(&root)).unwrap();
    assert_eq!(schematic.unknown_id_count(), 1);
    assert_eq!(schematic.get_block(1, 0, 0), Some(BlockIdentifier::air()));
    assert_eq!(schematic.count_non_empty(), 1);
}

#[test]
fn fields_survive_nbt() {
    let root = raw_root(&[("minecraft:stone", 0)], &[0, 0]);
    let fields = SchemFields::from_nbt(&root).unwrap();
    assert_eq!(fields.offset, [0, 0, 0]);
    assert_eq!(SchemFields::from_nbt(&fields.to_nbt()).unwrap().palette, fields.palette);
}

#[test]
fn file_write_and_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("test.schem");

    let dims = Dimensions::new(4, 3, 2).unwrap();
    let grid = BlockGrid::from_fn(dims, |x, y, z| {
        if y == 0 || (x + z) % 3 == 0 {
            "minecraft:stone".into()
        } else {
            BlockIdentifier::air()
        }
    });
    let schematic = Schematic::from_grid(&grid, [5, 64, -5], VersionInfo::default());
    write_schem_file(&path, &schematic, flate2::Compression::best()).unwrap();

    let restored = read_schem_file(&path).unwrap();
    assert_eq!(restored, schematic);
    assert_eq!(restored.to_grid(), grid);

    // bottom-up: every y=0 cell precedes every y>0 cell
    let ys: Vec<i32> = restored.placed_cells().iter().map(|c| c.y).collect();
    assert!(ys.windows(2).all(|w| w[0] <= w[1]));
}
